//! The LoveMaker's single night: binding two players for life.

use super::{CommandSpec, Ctx, Invocation, Phase, StepState};
use crate::{CommandError, RoleTag};

pub(crate) struct LoveMakerPhase {
    state: StepState,
}

impl LoveMakerPhase {
    pub(crate) fn new() -> Self {
        Self {
            state: StepState::new(
                &[RoleTag::LoveMaker],
                "Choose two players who will fall in love with *love <nickname> <nickname>.",
                "The love maker is choosing two lovers.",
            ),
        }
    }

    fn love(&mut self, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
        let (first, second) = inv.two_args()?;
        let first = ctx.registry.check_has_player(first, false)?;
        let (first_id, first_nick, first_tag) =
            (first.participant, first.nickname.clone(), first.tag());
        let second = ctx.registry.check_has_player(second, false)?;
        let (second_id, second_nick, second_tag) =
            (second.participant, second.nickname.clone(), second.tag());

        if first_id == inv.actor || second_id == inv.actor {
            return Err(CommandError::GameRule(ctx.line(
                "lovemaker",
                "try_to_involve_himself",
                &[],
            )?));
        }
        if first_id == second_id {
            return Err(CommandError::GameRule(ctx.line(
                "lovemaker",
                "same_target",
                &[],
            )?));
        }

        ctx.registry.bind_lovers(first_id, second_id);
        tracing::info!(first = %first_nick, second = %second_nick, "lovers bound");

        let (first_role, second_role) = (first_tag.to_string(), second_tag.to_string());
        ctx.narrate_to(
            first_id,
            "lovemaker",
            "in_love",
            &[("lover", second_nick.as_str()), ("role", second_role.as_str())],
        );
        ctx.narrate_to(
            second_id,
            "lovemaker",
            "in_love",
            &[("lover", first_nick.as_str()), ("role", first_role.as_str())],
        );
        if first_tag.faction() != second_tag.faction() {
            ctx.narrate_to(first_id, "lovemaker", "new_goal", &[("lover", second_nick.as_str())]);
            ctx.narrate_to(second_id, "lovemaker", "new_goal", &[("lover", first_nick.as_str())]);
        }
        ctx.narrate_to(
            inv.actor,
            "lovemaker",
            "done",
            &[("lover1", first_nick.as_str()), ("lover2", second_nick.as_str())],
        );
        self.finish(ctx);
        Ok(())
    }
}

impl Phase for LoveMakerPhase {
    const NAME: &'static str = "lovemaker";
    const COMMANDS: &'static [CommandSpec<Self>] = &[CommandSpec {
        name: "love",
        usage: "love <nickname> <nickname>",
        summary: "make two players fall in love",
        run: Self::love,
    }];

    fn state(&self) -> &StepState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut StepState {
        &mut self.state
    }

    fn start(&mut self, ctx: &mut Ctx<'_>) {
        let Some(lovemaker) = ctx.registry.alive_with_tag(RoleTag::LoveMaker) else {
            self.state.close();
            return;
        };
        let id = lovemaker.participant;
        let everyone = ctx.registry.everyone();
        ctx.narrate(&everyone, "lovemaker", "wakes_up", &[]);
        ctx.narrate_to(id, "lovemaker", "turn", &[]);
    }

    fn finish(&mut self, ctx: &mut Ctx<'_>) {
        let mut others = ctx.registry.everyone();
        if let Some(lovemaker) = ctx.registry.find_by_tag(RoleTag::LoveMaker) {
            others = others.exclude(lovemaker.participant);
        }
        ctx.narrate(&others, "lovemaker", "go_to_sleep", &[]);
        self.state.close();
    }

    fn on_player_quit(&mut self, ctx: &mut Ctx<'_>) {
        if ctx.registry.alive_with_tag(RoleTag::LoveMaker).is_none() {
            self.state.close();
        }
    }
}
