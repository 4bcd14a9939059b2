//! Nightfall after the vote.

use super::{CommandSpec, Ctx, Phase, StepState};

pub(crate) struct DuskPhase {
    state: StepState,
}

impl DuskPhase {
    pub(crate) fn new() -> Self {
        Self {
            state: StepState::new(&[], "", ""),
        }
    }
}

impl Phase for DuskPhase {
    const NAME: &'static str = "dusk";
    const COMMANDS: &'static [CommandSpec<Self>] = &[];

    fn state(&self) -> &StepState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut StepState {
        &mut self.state
    }

    fn start(&mut self, ctx: &mut Ctx<'_>) {
        let everyone = ctx.registry.everyone();
        ctx.narrate(&everyone, "everyone", "sleep", &[]);
        self.state.close();
    }
}
