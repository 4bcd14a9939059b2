//! Game over: announce the winners, reveal every role, offer a rematch.
//!
//! This phase never ends on its own. It stays current until the admin
//! relaunches with `again` or the session is dropped.

use super::{CommandSpec, Ctx, Invocation, Phase, SessionRequest, StepState};
use crate::{CommandError, Outcome};

pub(crate) struct EndPhase {
    state: StepState,
}

impl EndPhase {
    pub(crate) fn new() -> Self {
        Self {
            state: StepState::new(
                &[],
                "The game is over. The admin can start a new one with the same players with *again.",
                "The game is over. The admin can start a new one with the same players with *again.",
            ),
        }
    }

    fn again(&mut self, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
        inv.no_args()?;
        ctx.registry.check_is_admin(inv.actor)?;
        let need = ctx.rules.min_players;
        if ctx.roster.len() < need {
            return Err(CommandError::GameRule(format!(
                "{} players are left, at least {need} are needed",
                ctx.roster.len()
            )));
        }

        let everyone = ctx.registry.everyone();
        ctx.narrate(&everyone, "everyone", "game_restarted", &[]);
        ctx.requests.push(SessionRequest::Relaunch);
        Ok(())
    }
}

impl Phase for EndPhase {
    const NAME: &'static str = "end";
    const COMMANDS: &'static [CommandSpec<Self>] = &[CommandSpec {
        name: "again",
        usage: "again",
        summary: "play again with the same players (admin)",
        run: Self::again,
    }];
    const SKIPPABLE: bool = false;

    fn state(&self) -> &StepState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut StepState {
        &mut self.state
    }

    fn start(&mut self, ctx: &mut Ctx<'_>) {
        let roles = ctx.registry.summary();
        let everyone = ctx.registry.everyone();
        let (page, lovers) = match ctx.registry.outcome() {
            Some(Outcome::Lovers { first, second }) => ("lovers_won", Some((first, second))),
            Some(Outcome::Villagers) => ("villagers_won", None),
            Some(Outcome::Werewolves) => ("werewolves_won", None),
            Some(Outcome::Draw) | None => ("nobody_won", None),
        };
        tracing::info!(outcome = page, game = ctx.registry.game_name(), "game over");

        let mut values = vec![("roles", roles.as_str())];
        if let Some((first, second)) = &lovers {
            values.push(("lover1", first.as_str()));
            values.push(("lover2", second.as_str()));
        }
        ctx.narrate(&everyone, "everyone", page, &values);
        ctx.narrate_home("everyone", page, &values);
        ctx.narrate(&everyone, "everyone", "game_ended", &[]);
    }

    /// Nothing left to wait for.
    fn on_player_quit(&mut self, _ctx: &mut Ctx<'_>) {}
}
