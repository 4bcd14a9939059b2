//! The order phases run in.
//!
//! A game opens with a setup block played once, then repeats the cycle
//! block (one night and one day) for as long as needed. Every time the
//! current phase ends, the win condition is checked before moving on;
//! once it holds, the terminal [`EndPhase`] replaces whatever comes next.

use crate::step::{
    BeginPhase, Ctx, DeathSummaryPhase, DuskPhase, EndPhase, GuardPhase, HunterPhase,
    LoveMakerPhase, NicknamesPhase, SeekerPhase, Step, VotePhase, WerewolvesPhase, WitchPhase,
};

fn setup() -> Vec<Box<dyn Step>> {
    vec![
        Box::new(NicknamesPhase::new()),
        Box::new(BeginPhase::new()),
        Box::new(LoveMakerPhase::new()),
    ]
}

/// One night then one day. The Hunter gets a chance after each wave of deaths.
fn cycle() -> Vec<Box<dyn Step>> {
    vec![
        Box::new(SeekerPhase::new()),
        Box::new(GuardPhase::new()),
        Box::new(WerewolvesPhase::new()),
        Box::new(WitchPhase::new()),
        Box::new(DeathSummaryPhase::new()),
        Box::new(HunterPhase::new()),
        Box::new(VotePhase::new()),
        Box::new(HunterPhase::new()),
        Box::new(DuskPhase::new()),
    ]
}

pub(crate) struct StepSequence {
    steps: Vec<Box<dyn Step>>,
    cursor: usize,
    end: EndPhase,
    /// Set once the win condition held: `end` is current from then on.
    over: bool,
}

impl StepSequence {
    pub(crate) fn new() -> Self {
        Self {
            steps: setup(),
            cursor: 0,
            end: EndPhase::new(),
            over: false,
        }
    }

    pub(crate) fn current(&mut self) -> &mut dyn Step {
        if self.over {
            return &mut self.end;
        }
        // `advance` appends a cycle before the cursor can run past the end.
        self.steps[self.cursor].as_mut()
    }

    pub(crate) fn current_name(&self) -> &'static str {
        if self.over {
            self.end.name()
        } else {
            self.steps[self.cursor].name()
        }
    }

    /// Whether the terminal phase has been entered.
    pub(crate) fn is_over(&self) -> bool {
        self.over
    }

    /// Enters the first phase.
    pub(crate) fn start(&mut self, ctx: &mut Ctx<'_>) {
        tracing::info!(phase = self.current_name(), "entering phase");
        self.current().enter(ctx);
    }

    /// Moves past the current phase and enters the next one.
    ///
    /// Does nothing once the terminal phase is current.
    pub(crate) fn advance(&mut self, ctx: &mut Ctx<'_>) {
        if self.over {
            return;
        }
        if ctx.registry.outcome().is_some() {
            self.over = true;
        } else {
            self.cursor += 1;
            if self.cursor == self.steps.len() {
                self.steps.extend(cycle());
            }
        }
        tracing::info!(phase = self.current_name(), "entering phase");
        self.current().enter(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RoleTag;
    use crate::step::ctx::fixture::Table;

    fn seats() -> Table {
        Table::with_roles(&[
            ("Alice", RoleTag::Werewolf),
            ("Bob", RoleTag::Villager),
            ("Carol", RoleTag::Seeker),
            ("Dave", RoleTag::Villager),
        ])
    }

    /// Skips every phase until `name` is current.
    fn skip_to(sequence: &mut StepSequence, table: &mut Table, name: &str) {
        for _ in 0..40 {
            if sequence.current_name() == name {
                return;
            }
            sequence.current().close();
            sequence.advance(&mut table.ctx());
        }
        panic!("never reached {name}");
    }

    #[test]
    fn test_setup_runs_before_the_cycle() {
        let mut table = seats();
        let mut sequence = StepSequence::new();
        sequence.start(&mut table.ctx());
        assert_eq!(sequence.current_name(), "nicknames");

        let mut seen = Vec::new();
        for _ in 0..12 {
            sequence.current().close();
            sequence.advance(&mut table.ctx());
            seen.push(sequence.current_name());
        }
        assert_eq!(
            seen,
            vec![
                "begin",
                "lovemaker",
                "seeker",
                "guard",
                "werewolves",
                "witch",
                "death_summary",
                "hunter",
                "vote",
                "hunter",
                "dusk",
                "seeker",
            ]
        );
        assert!(!sequence.is_over());
    }

    #[test]
    fn test_outcome_switches_to_end() {
        let mut table = seats();
        let mut sequence = StepSequence::new();
        sequence.start(&mut table.ctx());
        skip_to(&mut sequence, &mut table, "vote");

        table.registry.kill("Alice");
        sequence.current().close();
        sequence.advance(&mut table.ctx());

        assert!(sequence.is_over());
        assert_eq!(sequence.current_name(), "end");
        assert!(!sequence.current().is_ended());

        // Advancing again keeps the terminal phase.
        sequence.advance(&mut table.ctx());
        assert_eq!(sequence.current_name(), "end");
    }

    #[test]
    fn test_phases_without_their_role_end_at_once() {
        let mut table = seats();
        let mut sequence = StepSequence::new();
        sequence.start(&mut table.ctx());
        skip_to(&mut sequence, &mut table, "lovemaker");

        // Nobody holds the love maker role at this table.
        assert!(sequence.current().is_ended());
        sequence.advance(&mut table.ctx());
        assert_eq!(sequence.current_name(), "seeker");
        assert!(!sequence.current().is_ended());
    }
}
