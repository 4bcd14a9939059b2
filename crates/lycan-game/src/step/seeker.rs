//! The Seeker looks into one player's soul each night.

use super::{CommandSpec, Ctx, Invocation, Phase, StepState};
use crate::{CommandError, RoleKind, RoleTag};

pub(crate) struct SeekerPhase {
    state: StepState,
}

impl SeekerPhase {
    pub(crate) fn new() -> Self {
        Self {
            state: StepState::new(
                &[RoleTag::Seeker],
                "Learn the role of one player with *see <nickname>. *seen lists what you already know.",
                "The seeker is gazing into the crystal ball.",
            ),
        }
    }

    fn see(&mut self, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
        let nickname = inv.one_arg()?;
        let target = ctx.registry.check_has_player(nickname, false)?;
        let (target_id, target_nick, tag) = (target.participant, target.nickname.clone(), target.tag());
        if target_id == inv.actor {
            return Err(CommandError::GameRule(ctx.line(
                "seeker",
                "try_to_see_herself",
                &[],
            )?));
        }

        if let Some(seeker) = ctx.registry.by_participant_mut(inv.actor) {
            if let RoleKind::Seeker { seen } = &mut seeker.kind {
                seen.push((target_nick.clone(), tag));
            }
        }
        let role = tag.to_string();
        ctx.narrate_to(
            inv.actor,
            "seeker",
            "see_role",
            &[("target", target_nick.as_str()), ("role", role.as_str())],
        );
        self.finish(ctx);
        Ok(())
    }

    fn seen(&mut self, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
        inv.no_args()?;
        let Some(RoleKind::Seeker { seen }) = ctx.registry.by_participant(inv.actor).map(|r| &r.kind)
        else {
            return Err(CommandError::Belonging("only the seeker has visions".into()));
        };
        let text = if seen.is_empty() {
            "You have not seen anyone yet.".to_string()
        } else {
            let mut lines = vec!["Your visions so far:".to_string()];
            lines.extend(seen.iter().map(|(nick, tag)| format!("- {nick}: {tag}")));
            lines.join("\n")
        };
        ctx.listing(inv.actor, text);
        Ok(())
    }
}

impl Phase for SeekerPhase {
    const NAME: &'static str = "seeker";
    const COMMANDS: &'static [CommandSpec<Self>] = &[
        CommandSpec {
            name: "see",
            usage: "see <nickname>",
            summary: "learn the role of a player",
            run: Self::see,
        },
        CommandSpec {
            name: "seen",
            usage: "seen",
            summary: "list the roles you already discovered",
            run: Self::seen,
        },
    ];

    fn state(&self) -> &StepState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut StepState {
        &mut self.state
    }

    fn start(&mut self, ctx: &mut Ctx<'_>) {
        let Some(seeker) = ctx.registry.alive_with_tag(RoleTag::Seeker) else {
            self.state.close();
            return;
        };
        let id = seeker.participant;
        let everyone = ctx.registry.everyone();
        ctx.narrate(&everyone, "seeker", "wakes_up", &[]);
        ctx.narrate_to(id, "seeker", "turn", &[]);
    }

    fn finish(&mut self, ctx: &mut Ctx<'_>) {
        let mut others = ctx.registry.everyone();
        if let Some(seeker) = ctx.registry.find_by_tag(RoleTag::Seeker) {
            let id = seeker.participant;
            others = others.exclude(id);
            ctx.narrate_to(id, "seeker", "done", &[]);
        }
        ctx.narrate(&others, "seeker", "go_to_sleep", &[]);
        self.state.close();
    }

    fn on_player_quit(&mut self, ctx: &mut Ctx<'_>) {
        if ctx.registry.alive_with_tag(RoleTag::Seeker).is_none() {
            self.state.close();
        }
    }
}
