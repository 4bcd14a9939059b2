//! The opening narration: night falls and everyone learns their role.

use super::{CommandSpec, Ctx, Phase, StepState};

pub(crate) struct BeginPhase {
    state: StepState,
}

impl BeginPhase {
    pub(crate) fn new() -> Self {
        Self {
            state: StepState::new(&[], "", ""),
        }
    }
}

impl Phase for BeginPhase {
    const NAME: &'static str = "begin";
    const COMMANDS: &'static [CommandSpec<Self>] = &[];

    fn state(&self) -> &StepState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut StepState {
        &mut self.state
    }

    fn start(&mut self, ctx: &mut Ctx<'_>) {
        let everyone = ctx.registry.everyone();
        ctx.narrate(&everyone, "everyone", "game_begins", &[]);
        ctx.narrate_home("everyone", "game_begins", &[]);
        ctx.narrate(&everyone, "everyone", "first_sleep", &[]);

        let seats: Vec<_> = ctx
            .registry
            .iter()
            .map(|r| (r.participant, r.tag()))
            .collect();
        for (participant, tag) in seats {
            ctx.narrate_to(participant, tag.chapter(), "tell_role", &[]);
        }
        self.state.close();
    }
}
