//! The Witch's night: one death potion and one resurrection potion per
//! game, at most one of them per night.

use lycan_protocol::ParticipantId;

use super::{CommandSpec, Ctx, Invocation, Phase, StepState, join_names};
use crate::{CommandError, RoleKind, RoleTag};

pub(crate) struct WitchPhase {
    state: StepState,
}

/// Which potion to take from the shelf.
#[derive(Clone, Copy)]
enum Potion {
    Death,
    Resurrect,
}

impl WitchPhase {
    pub(crate) fn new() -> Self {
        Self {
            state: StepState::new(
                &[RoleTag::Witch],
                "Brew your potions: *kill <nickname> poisons someone, *resurrect <nickname> saves \
                 a dying player (or yourself with a bare *resurrect), *pass does nothing.",
                "The witch is stirring her cauldron.",
            ),
        }
    }

    fn potions(ctx: &Ctx<'_>, witch: ParticipantId) -> (u8, u8) {
        match ctx.registry.by_participant(witch).map(|r| &r.kind) {
            Some(RoleKind::Witch {
                death_potions,
                resurrect_potions,
            }) => (*death_potions, *resurrect_potions),
            _ => (0, 0),
        }
    }

    fn use_potion(ctx: &mut Ctx<'_>, witch: ParticipantId, potion: Potion) {
        if let Some(RoleKind::Witch {
            death_potions,
            resurrect_potions,
        }) = ctx.registry.by_participant_mut(witch).map(|r| &mut r.kind)
        {
            let shelf = match potion {
                Potion::Death => death_potions,
                Potion::Resurrect => resurrect_potions,
            };
            *shelf = shelf.saturating_sub(1);
        }
    }

    fn pass(&mut self, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
        inv.no_args()?;
        ctx.narrate_to(inv.actor, "witch", "do_nothing", &[]);
        self.finish(ctx);
        Ok(())
    }

    fn kill(&mut self, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
        let nickname = inv.one_arg()?;
        let target = ctx.registry.check_has_player(nickname, false)?;
        let (target_id, target_nick) = (target.participant, target.nickname.clone());
        if Self::potions(ctx, inv.actor).0 == 0 {
            return Err(CommandError::Availability(ctx.line(
                "witch",
                "empty_death_potion",
                &[],
            )?));
        }
        if target_id == inv.actor {
            return Err(CommandError::GameRule(ctx.line(
                "witch",
                "try_to_kill_herself",
                &[],
            )?));
        }

        Self::use_potion(ctx, inv.actor, Potion::Death);
        ctx.registry.wound(&target_nick);
        ctx.narrate_to(inv.actor, "witch", "kill", &[("target", target_nick.as_str())]);
        self.finish(ctx);
        Ok(())
    }

    fn resurrect(&mut self, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
        let witch = ctx
            .registry
            .by_participant(inv.actor)
            .ok_or_else(|| CommandError::Belonging("you are not playing in this game".into()))?;
        let (witch_nick, witch_injured) = (witch.nickname.clone(), witch.injured);

        let target = match inv.optional_arg()? {
            None => {
                if !witch_injured {
                    return Err(CommandError::GameRule(ctx.line(
                        "witch",
                        "try_to_resurrect_herself",
                        &[],
                    )?));
                }
                witch_nick
            }
            Some(nickname) => {
                if nickname == witch_nick && !witch_injured {
                    return Err(CommandError::GameRule(ctx.line(
                        "witch",
                        "try_to_resurrect_herself",
                        &[],
                    )?));
                }
                ctx.registry.check_has_player(nickname, true)?.nickname.clone()
            }
        };
        if Self::potions(ctx, inv.actor).1 == 0 {
            return Err(CommandError::Availability(ctx.line(
                "witch",
                "empty_resurrect_potion",
                &[],
            )?));
        }

        Self::use_potion(ctx, inv.actor, Potion::Resurrect);
        ctx.registry.heal(&target);
        if target == ctx.nickname(inv.actor) {
            ctx.narrate_to(inv.actor, "witch", "resurrect_herself", &[]);
        } else {
            ctx.narrate_to(inv.actor, "witch", "resurrect", &[("target", target.as_str())]);
        }
        self.finish(ctx);
        Ok(())
    }
}

impl Phase for WitchPhase {
    const NAME: &'static str = "witch";
    const COMMANDS: &'static [CommandSpec<Self>] = &[
        CommandSpec {
            name: "kill",
            usage: "kill <nickname>",
            summary: "poison a player with your death potion",
            run: Self::kill,
        },
        CommandSpec {
            name: "resurrect",
            usage: "resurrect [nickname]",
            summary: "save a dying player, or yourself",
            run: Self::resurrect,
        },
        CommandSpec {
            name: "pass",
            usage: "pass",
            summary: "keep your potions for later",
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
        let Some(witch) = ctx.registry.alive_with_tag(RoleTag::Witch) else {
            self.state.close();
            return;
        };
        let (id, injured) = (witch.participant, witch.injured);
        let (death, resurrect) = Self::potions(ctx, id);
        let (death, resurrect) = (death.to_string(), resurrect.to_string());

        let victims: Vec<String> = ctx
            .registry
            .injured_players()
            .iter()
            .filter(|victim| *victim != id)
            .map(|victim| ctx.nickname(victim))
            .collect();
        let victims = if victims.is_empty() {
            "nobody".to_string()
        } else {
            join_names(&victims)
        };

        let everyone = ctx.registry.everyone();
        ctx.narrate(&everyone, "witch", "wakes_up", &[]);
        let page = if injured { "is_dying" } else { "turn" };
        ctx.narrate_to(
            id,
            "witch",
            page,
            &[
                ("killed_players", victims.as_str()),
                ("death_potions", death.as_str()),
                ("resurrect_potions", resurrect.as_str()),
            ],
        );
    }

    fn finish(&mut self, ctx: &mut Ctx<'_>) {
        let mut others = ctx.registry.everyone();
        if let Some(witch) = ctx.registry.find_by_tag(RoleTag::Witch) {
            others = others.exclude(witch.participant);
        }
        ctx.narrate(&others, "witch", "go_to_sleep", &[]);
        self.state.close();
    }

    fn on_player_quit(&mut self, ctx: &mut Ctx<'_>) {
        if ctx.registry.alive_with_tag(RoleTag::Witch).is_none() {
            self.state.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::Step;
    use crate::step::ctx::fixture::Table;
    use lycan_protocol::Tone;

    fn seats() -> Table {
        Table::with_roles(&[
            ("Alice", RoleTag::Werewolf),
            ("Bob", RoleTag::Witch),
            ("Carol", RoleTag::Villager),
            ("Dave", RoleTag::Villager),
        ])
    }

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resurrect_heals_the_victim_and_spends_the_potion() {
        let mut table = seats();
        table.registry.wound("Carol");
        let mut phase = WitchPhase::new();
        phase.enter(&mut table.ctx());
        let bob = table.id("Bob");

        phase.handle(bob, "resurrect", &args(&["Carol"]), &mut table.ctx());

        assert!(phase.is_ended());
        assert!(!table.registry.get("Carol").unwrap().injured);
        assert_eq!(WitchPhase::potions(&table.ctx(), bob), (1, 0));
    }

    #[test]
    fn test_resurrect_needs_an_injured_target() {
        let mut table = seats();
        let mut phase = WitchPhase::new();
        phase.enter(&mut table.ctx());
        let bob = table.id("Bob");
        table.drain_all();

        phase.handle(bob, "resurrect", &args(&["Carol"]), &mut table.ctx());
        assert!(!phase.is_ended());
        assert_eq!(table.drain("Bob")[0].text, "Carol is not injured");
    }

    #[test]
    fn test_witch_can_save_herself_only_when_dying() {
        let mut table = seats();
        let mut phase = WitchPhase::new();
        phase.enter(&mut table.ctx());
        let bob = table.id("Bob");

        phase.handle(bob, "resurrect", &[], &mut table.ctx());
        assert!(!phase.is_ended());

        table.registry.wound("Bob");
        phase.handle(bob, "resurrect", &[], &mut table.ctx());
        assert!(phase.is_ended());
        assert!(!table.registry.get("Bob").unwrap().injured);
    }

    #[test]
    fn test_death_potion_wounds_and_runs_out() {
        let mut table = seats();
        let bob = table.id("Bob");

        let mut night = WitchPhase::new();
        night.enter(&mut table.ctx());
        night.handle(bob, "kill", &args(&["Alice"]), &mut table.ctx());
        assert!(night.is_ended());
        assert!(table.registry.get("Alice").unwrap().injured);

        let mut night = WitchPhase::new();
        night.enter(&mut table.ctx());
        table.drain_all();
        night.handle(bob, "kill", &args(&["Dave"]), &mut table.ctx());
        assert!(!night.is_ended());
        assert!(!table.registry.get("Dave").unwrap().injured);
        assert_eq!(table.drain("Bob")[0].tone, Tone::Rejection);
    }

    #[test]
    fn test_witch_cannot_poison_herself() {
        let mut table = seats();
        let mut phase = WitchPhase::new();
        phase.enter(&mut table.ctx());
        let bob = table.id("Bob");

        phase.handle(bob, "kill", &args(&["Bob"]), &mut table.ctx());
        assert!(!phase.is_ended());
        assert_eq!(WitchPhase::potions(&table.ctx(), bob), (1, 1));
    }

    #[test]
    fn test_pass_ends_the_phase() {
        let mut table = seats();
        let mut phase = WitchPhase::new();
        phase.enter(&mut table.ctx());
        let bob = table.id("Bob");

        phase.handle(bob, "pass", &[], &mut table.ctx());
        assert!(phase.is_ended());
    }

    #[test]
    fn test_no_witch_no_phase() {
        let mut table = seats();
        table.registry.kill("Bob");
        let mut phase = WitchPhase::new();
        phase.enter(&mut table.ctx());
        assert!(phase.is_ended());
    }

    #[test]
    fn test_witch_turn_lists_victims_and_potions() {
        let mut table = seats();
        table.registry.wound("Carol");
        table.registry.wound("Dave");
        let mut phase = WitchPhase::new();
        phase.enter(&mut table.ctx());

        let out = table.drain("Bob");
        let turn = out
            .iter()
            .find(|m| m.text.starts_with("Tonight"))
            .expect("turn prompt");
        assert_eq!(turn.tone, Tone::Narration);
        assert!(turn.text.contains("Carol"));
        assert!(turn.text.contains("Dave"));
        assert!(turn.text.contains("Death potions: 1"));
        assert!(turn.text.contains("resurrection potions: 1"));
        assert!(turn.text.contains("$resurrect"));
    }

    #[test]
    fn test_dying_witch_is_not_listed_among_victims() {
        let mut table = seats();
        table.registry.wound("Bob");
        table.registry.wound("Carol");
        let mut phase = WitchPhase::new();
        phase.enter(&mut table.ctx());

        let out = table.drain("Bob");
        let turn = out
            .iter()
            .find(|m| m.text.starts_with("You are dying"))
            .expect("dying prompt");
        assert!(turn.text.contains("victims are: Carol."));
        assert!(!turn.text.contains("Bob"));
    }

    #[test]
    fn test_quiet_night_names_nobody() {
        let mut table = seats();
        let mut phase = WitchPhase::new();
        phase.enter(&mut table.ctx());

        let out = table.drain("Bob");
        assert!(out.iter().any(|m| m.text.contains("victims are: nobody.")));
    }
}
