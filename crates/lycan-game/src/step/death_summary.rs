//! Dawn: the night's injuries become deaths and are announced.

use super::{CommandSpec, Ctx, Phase, StepState};
use crate::RoleGroup;

pub(crate) struct DeathSummaryPhase {
    state: StepState,
}

impl DeathSummaryPhase {
    pub(crate) fn new() -> Self {
        Self {
            state: StepState::new(&[], "", ""),
        }
    }
}

impl Phase for DeathSummaryPhase {
    const NAME: &'static str = "death_summary";
    const COMMANDS: &'static [CommandSpec<Self>] = &[];

    fn state(&self) -> &StepState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut StepState {
        &mut self.state
    }

    fn start(&mut self, ctx: &mut Ctx<'_>) {
        let villagers = ctx.registry.villagers();
        let werewolves = ctx.registry.werewolves();
        let everyone = ctx.registry.everyone();
        ctx.narrate(&villagers, "everyone", "villagers_dead_summary", &[]);
        ctx.narrate(&werewolves, "everyone", "werewolves_dead_summary", &[]);

        let victims: Vec<_> = ctx
            .registry
            .iter()
            .filter(|r| r.alive && r.injured)
            .map(|r| (r.participant, r.nickname.clone(), r.tag(), r.is_werewolf()))
            .collect();
        if victims.is_empty() {
            ctx.narrate(&everyone, "everyone", "nobody_is_dead", &[]);
        }

        for (id, nickname, tag, is_werewolf) in &victims {
            ctx.narrate_to(*id, "everyone", "killed_by_night", &[]);
            let player = nickname.as_str();
            let to_villagers: RoleGroup = villagers.clone().exclude(*id);
            let to_werewolves: RoleGroup = werewolves.clone().exclude(*id);
            if *is_werewolf {
                ctx.narrate(
                    &to_villagers,
                    "everyone",
                    "werewolf_death_seen_by_villager",
                    &[("player", player)],
                );
                ctx.narrate(
                    &to_werewolves,
                    "everyone",
                    "werewolf_death_seen_by_werewolf",
                    &[("player", player)],
                );
            } else {
                let role = tag.to_string();
                ctx.narrate(
                    &to_villagers,
                    "everyone",
                    "villager_death_seen_by_villager",
                    &[("player", player), ("role", role.as_str())],
                );
                ctx.narrate(
                    &to_werewolves,
                    "everyone",
                    "villager_death_seen_by_werewolf",
                    &[("player", player)],
                );
            }
        }

        ctx.registry.clear_protection();
        let deaths = ctx.kill_injured();
        tracing::info!(deaths = deaths.len(), "night resolved");
        self.state.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RoleTag;
    use crate::step::Step;
    use crate::step::ctx::fixture::Table;

    fn seats() -> Table {
        Table::with_roles(&[
            ("Alice", RoleTag::Werewolf),
            ("Bob", RoleTag::Seeker),
            ("Carol", RoleTag::Villager),
            ("Dave", RoleTag::Villager),
        ])
    }

    #[test]
    fn test_injured_players_die_and_protection_is_cleared() {
        let mut table = seats();
        table.registry.wound("Bob");
        table.registry.protect("Carol");

        let mut phase = DeathSummaryPhase::new();
        phase.enter(&mut table.ctx());

        assert!(phase.is_ended());
        assert!(!table.registry.get("Bob").unwrap().alive);
        assert!(!table.registry.get("Carol").unwrap().protected);
    }

    #[test]
    fn test_villager_role_is_revealed_to_villagers_only() {
        let mut table = seats();
        table.registry.wound("Bob");

        let mut phase = DeathSummaryPhase::new();
        phase.enter(&mut table.ctx());

        let to_carol = table.drain("Carol");
        assert!(to_carol.iter().any(|m| m.text.contains("Bob") && m.text.contains("seeker")));
        let to_alice = table.drain("Alice");
        assert!(to_alice.iter().any(|m| m.text.contains("Bob")));
        assert!(!to_alice.iter().any(|m| m.text.contains("seeker")));
    }

    #[test]
    fn test_quiet_night() {
        let mut table = seats();
        let mut phase = DeathSummaryPhase::new();
        phase.enter(&mut table.ctx());

        assert!(phase.is_ended());
        // summary header + nobody_is_dead
        assert_eq!(table.drain("Carol").len(), 2);
        assert!(table.registry.iter().all(|r| r.alive));
    }

    #[test]
    fn test_grieving_lover_dies_too() {
        let mut table = seats();
        let (bob, dave) = (table.id("Bob"), table.id("Dave"));
        table.registry.bind_lovers(bob, dave);
        table.registry.wound("Bob");

        let mut phase = DeathSummaryPhase::new();
        phase.enter(&mut table.ctx());

        assert!(!table.registry.get("Dave").unwrap().alive);
    }
}
