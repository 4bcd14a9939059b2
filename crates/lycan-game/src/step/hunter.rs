//! The Hunter's last shot.
//!
//! Runs twice per cycle (after the night deaths and after the vote). It
//! only wakes a hunter who was just struck down and has not fired yet.
//! The hunter is dead by then, so this phase lets him act anyway.

use super::{CommandSpec, Ctx, Invocation, Phase, StepState};
use crate::{CommandError, Role, RoleKind, RoleTag};

pub(crate) struct HunterPhase {
    state: StepState,
}

impl HunterPhase {
    pub(crate) fn new() -> Self {
        Self {
            state: StepState::new(
                &[RoleTag::Hunter],
                "With your last breath, take someone with you: *kill <nickname>, or *pass.",
                "The hunter is taking aim with his last breath.",
            ),
        }
    }

    /// The hunter, if he is down and still has his bullet.
    fn shooter<'a>(ctx: &'a Ctx<'_>) -> Option<&'a Role> {
        ctx.registry.find_by_tag(RoleTag::Hunter).filter(|r| {
            r.injured && matches!(r.kind, RoleKind::Hunter { fired: false })
        })
    }

    fn mark_fired(ctx: &mut Ctx<'_>) {
        if let Some(role) = ctx.registry.find_by_tag_mut(RoleTag::Hunter) {
            role.kind = RoleKind::Hunter { fired: true };
        }
    }

    fn kill(&mut self, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
        let nickname = inv.one_arg()?;
        let hunter = ctx.nickname(inv.actor);
        if nickname == hunter {
            return Err(CommandError::GameRule(ctx.line(
                "hunter",
                "try_to_kill_himself",
                &[],
            )?));
        }
        let target = ctx.registry.check_has_player(nickname, false)?;
        let (target_nick, role) = (target.nickname.clone(), target.tag().to_string());

        Self::mark_fired(ctx);
        ctx.kill(&target_nick);
        tracing::info!(%hunter, target = %target_nick, "hunter fired");

        let others = ctx.registry.everyone().exclude(inv.actor);
        ctx.narrate_to(
            inv.actor,
            "hunter",
            "kill",
            &[("target", target_nick.as_str()), ("role", role.as_str())],
        );
        ctx.narrate(
            &others,
            "hunter",
            "die",
            &[
                ("hunter", hunter.as_str()),
                ("target", target_nick.as_str()),
                ("role", role.as_str()),
            ],
        );
        self.finish(ctx);
        Ok(())
    }

    fn pass(&mut self, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
        inv.no_args()?;
        Self::mark_fired(ctx);
        let hunter = ctx.nickname(inv.actor);
        let others = ctx.registry.everyone().exclude(inv.actor);
        ctx.narrate_to(inv.actor, "hunter", "pass", &[]);
        ctx.narrate(&others, "hunter", "passed", &[("hunter", hunter.as_str())]);
        self.finish(ctx);
        Ok(())
    }
}

impl Phase for HunterPhase {
    const NAME: &'static str = "hunter";
    const COMMANDS: &'static [CommandSpec<Self>] = &[
        CommandSpec {
            name: "kill",
            usage: "kill <nickname>",
            summary: "shoot a player before you die",
            run: Self::kill,
        },
        CommandSpec {
            name: "pass",
            usage: "pass",
            summary: "die without shooting",
            run: Self::pass,
        },
    ];

    fn state(&self) -> &StepState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut StepState {
        &mut self.state
    }

    fn start(&mut self, ctx: &mut Ctx<'_>) {
        let Some(hunter) = Self::shooter(ctx) else {
            self.state.close();
            return;
        };
        let (id, nickname) = (hunter.participant, hunter.nickname.clone());
        let everyone = ctx.registry.everyone();
        ctx.narrate(&everyone, "hunter", "injured", &[("hunter", nickname.as_str())]);
        ctx.narrate_to(id, "hunter", "turn", &[]);
    }

    fn on_player_quit(&mut self, ctx: &mut Ctx<'_>) {
        if Self::shooter(ctx).is_none() {
            self.state.close();
        }
    }

    fn bypasses_gates(&self, actor: &Role) -> bool {
        actor.tag() == RoleTag::Hunter
    }
}
