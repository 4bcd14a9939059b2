//! The Guard shields one player from the werewolves for a night.

use lycan_protocol::ParticipantId;

use super::{CommandSpec, Ctx, Invocation, Phase, StepState};
use crate::{CommandError, RoleKind, RoleTag};

pub(crate) struct GuardPhase {
    state: StepState,
}

impl GuardPhase {
    pub(crate) fn new() -> Self {
        Self {
            state: StepState::new(
                &[RoleTag::Guard],
                "Protect one player from the werewolves with *protect <nickname>, or *pass. \
                 You cannot protect the same player two nights in a row.",
                "The guard is watching over the village.",
            ),
        }
    }

    fn set_memory(ctx: &mut Ctx<'_>, guard: ParticipantId, target: Option<ParticipantId>) {
        if let Some(role) = ctx.registry.by_participant_mut(guard) {
            if let RoleKind::Guard { protecting } = &mut role.kind {
                *protecting = target;
            }
        }
    }

    fn protect(&mut self, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
        let nickname = inv.one_arg()?;
        let target = ctx.registry.check_has_player(nickname, false)?;
        let (target_id, target_nick) = (target.participant, target.nickname.clone());
        if target_id == inv.actor {
            return Err(CommandError::GameRule(ctx.line(
                "guard",
                "try_to_protect_himself",
                &[],
            )?));
        }
        let last = match ctx.registry.by_participant(inv.actor).map(|r| &r.kind) {
            Some(RoleKind::Guard { protecting }) => *protecting,
            _ => None,
        };
        if last == Some(target_id) {
            return Err(CommandError::GameRule(ctx.line(
                "guard",
                "same_target",
                &[("target", target_nick.as_str())],
            )?));
        }

        ctx.registry.protect(&target_nick);
        Self::set_memory(ctx, inv.actor, Some(target_id));
        ctx.narrate_to(inv.actor, "guard", "done", &[("target", target_nick.as_str())]);
        self.finish(ctx);
        Ok(())
    }

    fn pass(&mut self, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
        inv.no_args()?;
        Self::set_memory(ctx, inv.actor, None);
        ctx.narrate_to(inv.actor, "guard", "do_nothing", &[]);
        self.finish(ctx);
        Ok(())
    }
}

impl Phase for GuardPhase {
    const NAME: &'static str = "guard";
    const COMMANDS: &'static [CommandSpec<Self>] = &[
        CommandSpec {
            name: "protect",
            usage: "protect <nickname>",
            summary: "shield a player for this night",
            run: Self::protect,
        },
        CommandSpec {
            name: "pass",
            usage: "pass",
            summary: "protect nobody tonight",
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
        let Some(guard) = ctx.registry.alive_with_tag(RoleTag::Guard) else {
            self.state.close();
            return;
        };
        let id = guard.participant;
        let everyone = ctx.registry.everyone();
        ctx.narrate(&everyone, "guard", "wakes_up", &[]);
        ctx.narrate_to(id, "guard", "turn", &[]);
    }

    fn finish(&mut self, ctx: &mut Ctx<'_>) {
        let everyone = ctx.registry.everyone();
        ctx.narrate(&everyone, "guard", "go_to_sleep", &[]);
        self.state.close();
    }

    fn on_player_quit(&mut self, ctx: &mut Ctx<'_>) {
        if ctx.registry.alive_with_tag(RoleTag::Guard).is_none() {
            self.state.close();
        }
    }
}
