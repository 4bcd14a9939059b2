//! The werewolves' night: agreeing on one victim.
//!
//! The first `kill` sets the target and counts its author as agreeing.
//! Proposing the same target (or `confirm`) adds agreement; proposing a
//! different one resets agreement to the new proposer alone. The phase
//! ends once every alive werewolf agrees.
//!
//! The Little Girl is awake too. Each `spy` has a growing chance of being
//! caught: caught, she becomes the victim at once; unseen, she learns the
//! nickname of one werewolf.

use lycan_protocol::ParticipantId;
use rand::Rng;
use rand::seq::IndexedRandom;

use super::{CommandSpec, Ctx, Invocation, Phase, StepState, join_names};
use crate::{CommandError, Role, RoleGroup, RoleKind, RoleTag};

pub(crate) struct WerewolvesPhase {
    state: StepState,
    target: Option<String>,
    agreeing: Vec<ParticipantId>,
    spied: bool,
}

impl WerewolvesPhase {
    pub(crate) fn new() -> Self {
        Self {
            state: StepState::new(
                &[RoleTag::Werewolf, RoleTag::LittleGirl],
                "Werewolves: propose a victim with *kill <nickname> and agree with *confirm; \
                 *werewolves shows where the pack stands. Little girl: *spy on the pack, if you dare.",
                "The werewolves are hunting. Stay in bed.",
            ),
            target: None,
            agreeing: Vec::new(),
            spied: false,
        }
    }

    fn alive_werewolves(ctx: &Ctx<'_>) -> RoleGroup {
        ctx.registry.only_alive(&ctx.registry.werewolves())
    }

    fn require_werewolf(ctx: &Ctx<'_>, actor: ParticipantId) -> Result<(), CommandError> {
        if ctx.registry.by_participant(actor).is_some_and(Role::is_werewolf) {
            Ok(())
        } else {
            Err(CommandError::Belonging(
                "only werewolves choose the victim".into(),
            ))
        }
    }

    fn check_consensus(&mut self, ctx: &mut Ctx<'_>) {
        let agreeing: RoleGroup = self.agreeing.iter().copied().collect();
        if self.target.is_some() && agreeing == Self::alive_werewolves(ctx) {
            self.finish(ctx);
        }
    }

    fn kill(&mut self, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
        Self::require_werewolf(ctx, inv.actor)?;
        let nickname = inv.one_arg()?;
        let target = ctx.registry.check_has_player(nickname, false)?;
        let (target_nick, target_is_werewolf) = (target.nickname.clone(), target.is_werewolf());
        if target_is_werewolf {
            return Err(CommandError::GameRule(ctx.line(
                "werewolf",
                "try_to_kill_werewolf",
                &[],
            )?));
        }

        let proposer = ctx.nickname(inv.actor);
        let others = Self::alive_werewolves(ctx).exclude(inv.actor);
        match self.target.take() {
            Some(old) if old != target_nick => {
                self.agreeing = vec![inv.actor];
                ctx.narrate_to(
                    inv.actor,
                    "werewolf",
                    "not_agree",
                    &[("old_target", old.as_str()), ("target", target_nick.as_str())],
                );
                ctx.narrate(
                    &others,
                    "werewolf",
                    "someone_doesnt_agree",
                    &[
                        ("werewolf", proposer.as_str()),
                        ("old_target", old.as_str()),
                        ("target", target_nick.as_str()),
                    ],
                );
            }
            _ => {
                if !self.agreeing.contains(&inv.actor) {
                    self.agreeing.push(inv.actor);
                }
                ctx.narrate_to(
                    inv.actor,
                    "werewolf",
                    "propose_target",
                    &[("target", target_nick.as_str())],
                );
                ctx.narrate(
                    &others,
                    "werewolf",
                    "get_target_proposition",
                    &[("werewolf", proposer.as_str()), ("target", target_nick.as_str())],
                );
            }
        }
        self.target = Some(target_nick);
        self.check_consensus(ctx);
        Ok(())
    }

    fn confirm(&mut self, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
        Self::require_werewolf(ctx, inv.actor)?;
        inv.no_args()?;
        let Some(target) = self.target.clone() else {
            return Err(CommandError::GameRule(ctx.line("werewolf", "no_target", &[])?));
        };
        if self.agreeing.contains(&inv.actor) {
            return Err(CommandError::Availability(format!(
                "you already agreed to kill {target}"
            )));
        }

        self.agreeing.push(inv.actor);
        let werewolf = ctx.nickname(inv.actor);
        let others = Self::alive_werewolves(ctx).exclude(inv.actor);
        ctx.narrate_to(inv.actor, "werewolf", "agree", &[("target", target.as_str())]);
        ctx.narrate(
            &others,
            "werewolf",
            "someone_agree",
            &[("werewolf", werewolf.as_str()), ("target", target.as_str())],
        );
        self.check_consensus(ctx);
        Ok(())
    }

    fn werewolves(&mut self, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
        Self::require_werewolf(ctx, inv.actor)?;
        inv.no_args()?;
        let pack: Vec<String> = Self::alive_werewolves(ctx)
            .iter()
            .map(|id| ctx.nickname(id))
            .collect();
        let agreeing: Vec<String> = self.agreeing.iter().map(|id| ctx.nickname(*id)).collect();
        let text = format!(
            "Alive werewolves: {}\nTarget: {}\nAgreeing: {}",
            join_names(&pack),
            self.target.as_deref().unwrap_or("none yet"),
            if agreeing.is_empty() {
                "nobody".to_string()
            } else {
                join_names(&agreeing)
            }
        );
        ctx.listing(inv.actor, text);
        Ok(())
    }

    fn spy(&mut self, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
        inv.no_args()?;
        let Some(RoleKind::LittleGirl { spy_attempts }) =
            ctx.registry.by_participant(inv.actor).map(|r| &r.kind)
        else {
            return Err(CommandError::Belonging("only the little girl can spy".into()));
        };
        if self.spied {
            return Err(CommandError::Availability(
                "you already peeked tonight".into(),
            ));
        }
        let attempts = spy_attempts + 1;

        self.spied = true;
        if let Some(RoleKind::LittleGirl { spy_attempts }) = ctx
            .registry
            .by_participant_mut(inv.actor)
            .map(|r| &mut r.kind)
        {
            *spy_attempts = attempts;
        }

        let odds = (ctx.rules.spy_discovery_step * f64::from(attempts)).clamp(0.0, 1.0);
        let caught = odds > 0.0 && ctx.rng.random_bool(odds);
        let girl = ctx.nickname(inv.actor);
        tracing::debug!(attempts, odds, caught, "little girl spied");

        if caught {
            let pack = Self::alive_werewolves(ctx);
            ctx.narrate(&pack, "werewolf", "little_girl_caught", &[("little_girl", girl.as_str())]);
            ctx.narrate_to(inv.actor, "little_girl", "spy_caught", &[]);
            self.target = Some(girl);
            self.agreeing = pack.iter().collect();
            self.finish(ctx);
        } else {
            let pack: Vec<ParticipantId> = Self::alive_werewolves(ctx).iter().collect();
            let seen = pack.choose(&mut *ctx.rng).map(|id| ctx.nickname(*id));
            if let Some(seen) = seen {
                ctx.narrate_to(
                    inv.actor,
                    "little_girl",
                    "spy_success",
                    &[("werewolf", seen.as_str())],
                );
            }
        }
        Ok(())
    }
}

impl Phase for WerewolvesPhase {
    const NAME: &'static str = "werewolves";
    const COMMANDS: &'static [CommandSpec<Self>] = &[
        CommandSpec {
            name: "kill",
            usage: "kill <nickname>",
            summary: "propose a victim (werewolves)",
            run: Self::kill,
        },
        CommandSpec {
            name: "propose",
            usage: "propose <nickname>",
            summary: "same as kill",
            run: Self::kill,
        },
        CommandSpec {
            name: "confirm",
            usage: "confirm",
            summary: "agree with the proposed victim (werewolves)",
            run: Self::confirm,
        },
        CommandSpec {
            name: "werewolves",
            usage: "werewolves",
            summary: "show the pack, the target and who agrees (werewolves)",
            run: Self::werewolves,
        },
        CommandSpec {
            name: "spy",
            usage: "spy",
            summary: "peek at the werewolves, at the risk of being seen (little girl)",
            run: Self::spy,
        },
    ];

    fn state(&self) -> &StepState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut StepState {
        &mut self.state
    }

    fn start(&mut self, ctx: &mut Ctx<'_>) {
        let pack = Self::alive_werewolves(ctx);
        if pack.is_empty() {
            self.state.close();
            return;
        }
        let names: Vec<String> = pack.iter().map(|id| ctx.nickname(id)).collect();
        let names = join_names(&names);
        let everyone = ctx.registry.everyone();
        ctx.narrate(&everyone, "werewolf", "wakes_up", &[]);
        ctx.narrate(&pack, "werewolf", "turn", &[("werewolves", names.as_str())]);
        if let Some(girl) = ctx.registry.alive_with_tag(RoleTag::LittleGirl) {
            let id = girl.participant;
            ctx.narrate_to(id, "little_girl", "turn", &[]);
        }
    }

    fn finish(&mut self, ctx: &mut Ctx<'_>) {
        if let Some(target) = self.target.clone() {
            let protected = ctx.registry.get(&target).is_some_and(|r| r.protected);
            if protected {
                tracing::debug!(%target, "victim was protected");
            } else {
                ctx.registry.wound(&target);
            }
            let pack = Self::alive_werewolves(ctx);
            ctx.narrate(&pack, "werewolf", "done", &[("target", target.as_str())]);
        }
        let everyone = ctx.registry.everyone();
        ctx.narrate(&everyone, "werewolf", "go_to_sleep", &[]);
        self.state.close();
    }

    /// Werewolf talk stays within the pack at night.
    fn relay(&mut self, from: ParticipantId, text: &str, ctx: &mut Ctx<'_>) {
        let to = if ctx.registry.by_participant(from).is_some_and(Role::is_werewolf) {
            Self::alive_werewolves(ctx).exclude(from)
        } else {
            ctx.registry.everyone().exclude(from)
        };
        ctx.relay(from, &to, text);
    }

    fn before_quit(&mut self, leaving: ParticipantId, _ctx: &mut Ctx<'_>) {
        self.agreeing.retain(|id| *id != leaving);
    }

    fn on_player_quit(&mut self, ctx: &mut Ctx<'_>) {
        if Self::alive_werewolves(ctx).is_empty() {
            self.state.close();
        } else {
            self.check_consensus(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::Step;
    use crate::step::ctx::fixture::Table;
    use lycan_protocol::{Outbound, Tone};

    fn seats() -> Table {
        Table::with_roles(&[
            ("Alice", RoleTag::Werewolf),
            ("Bob", RoleTag::Werewolf),
            ("Carol", RoleTag::Villager),
            ("Dave", RoleTag::Villager),
            ("Eve", RoleTag::LittleGirl),
        ])
    }

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    // =====================================================================
    // Consensus
    // =====================================================================

    #[test]
    fn test_consensus_wounds_the_target() {
        let mut table = seats();
        let mut phase = WerewolvesPhase::new();
        phase.enter(&mut table.ctx());
        let (alice, bob) = (table.id("Alice"), table.id("Bob"));

        phase.handle(alice, "kill", &args(&["Carol"]), &mut table.ctx());
        assert!(!phase.is_ended());
        phase.handle(bob, "confirm", &[], &mut table.ctx());

        assert!(phase.is_ended());
        let carol = table.registry.get("Carol").unwrap();
        assert!(carol.injured && carol.alive);
    }

    #[test]
    fn test_disagreement_resets_agreement() {
        let mut table = seats();
        let mut phase = WerewolvesPhase::new();
        phase.enter(&mut table.ctx());
        let (alice, bob) = (table.id("Alice"), table.id("Bob"));

        phase.handle(alice, "kill", &args(&["Carol"]), &mut table.ctx());
        phase.handle(bob, "kill", &args(&["Dave"]), &mut table.ctx());
        assert!(!phase.is_ended());
        assert_eq!(phase.agreeing, vec![bob]);
        assert_eq!(phase.target.as_deref(), Some("Dave"));

        phase.handle(alice, "kill", &args(&["Dave"]), &mut table.ctx());
        assert!(phase.is_ended());
        assert!(table.registry.get("Dave").unwrap().injured);
        assert!(!table.registry.get("Carol").unwrap().injured);
    }

    #[test]
    fn test_werewolves_cannot_target_each_other() {
        let mut table = seats();
        let mut phase = WerewolvesPhase::new();
        phase.enter(&mut table.ctx());
        let alice = table.id("Alice");

        phase.handle(alice, "kill", &args(&["Bob"]), &mut table.ctx());
        assert!(phase.target.is_none());
    }

    #[test]
    fn test_confirm_needs_a_target() {
        let mut table = seats();
        let mut phase = WerewolvesPhase::new();
        phase.enter(&mut table.ctx());
        let alice = table.id("Alice");
        table.drain_all();

        phase.handle(alice, "confirm", &[], &mut table.ctx());
        let out = table.drain("Alice");
        assert_eq!(out[0].tone, Tone::Rejection);
        assert!(out[0].text.contains("Use $kill followed by a nickname first"));
    }

    #[test]
    fn test_protected_victim_survives() {
        let mut table = seats();
        table.registry.protect("Carol");
        let mut phase = WerewolvesPhase::new();
        phase.enter(&mut table.ctx());
        let (alice, bob) = (table.id("Alice"), table.id("Bob"));

        phase.handle(alice, "kill", &args(&["Carol"]), &mut table.ctx());
        phase.handle(bob, "kill", &args(&["Carol"]), &mut table.ctx());

        assert!(phase.is_ended());
        assert!(!table.registry.get("Carol").unwrap().injured);
    }

    #[test]
    fn test_dead_werewolf_is_not_waited_for() {
        let mut table = seats();
        table.registry.kill("Bob");
        let mut phase = WerewolvesPhase::new();
        phase.enter(&mut table.ctx());
        let alice = table.id("Alice");

        phase.handle(alice, "kill", &args(&["Carol"]), &mut table.ctx());
        assert!(phase.is_ended());
    }

    #[test]
    fn test_pack_leaving_rechecks_consensus() {
        let mut table = seats();
        let mut phase = WerewolvesPhase::new();
        phase.enter(&mut table.ctx());
        let (alice, bob) = (table.id("Alice"), table.id("Bob"));

        phase.handle(alice, "kill", &args(&["Carol"]), &mut table.ctx());
        phase.remove_player(bob, &mut table.ctx());
        assert!(phase.is_ended());
        assert!(table.registry.get("Carol").unwrap().injured);
    }

    #[test]
    fn test_villagers_cannot_kill() {
        let mut table = seats();
        let mut phase = WerewolvesPhase::new();
        phase.enter(&mut table.ctx());
        let eve = table.id("Eve");

        phase.handle(eve, "kill", &args(&["Carol"]), &mut table.ctx());
        assert!(phase.target.is_none());
    }

    // =====================================================================
    // Night talk
    // =====================================================================

    #[test]
    fn test_werewolf_chat_stays_in_the_pack() {
        let mut table = seats();
        let mut phase = WerewolvesPhase::new();
        phase.enter(&mut table.ctx());
        let alice = table.id("Alice");
        table.drain_all();

        phase.chat(alice, "Carol looks tasty", &mut table.ctx());

        assert_eq!(
            table.drain("Bob"),
            vec![Outbound::relay("Alice", "Carol looks tasty")]
        );
        assert!(table.drain("Carol").is_empty());
    }

    // =====================================================================
    // Little girl
    // =====================================================================

    #[test]
    fn test_spy_unseen_reveals_a_werewolf() {
        let mut table = seats();
        table.rules.spy_discovery_step = 0.0;
        let mut phase = WerewolvesPhase::new();
        phase.enter(&mut table.ctx());
        let eve = table.id("Eve");
        table.drain_all();

        phase.handle(eve, "spy", &[], &mut table.ctx());

        assert!(!phase.is_ended());
        let out = table.drain("Eve");
        assert!(out[0].text.contains("Alice") || out[0].text.contains("Bob"));

        phase.handle(eve, "spy", &[], &mut table.ctx());
        assert_eq!(table.drain("Eve")[0].tone, Tone::Rejection);
    }

    #[test]
    fn test_spy_caught_becomes_the_victim() {
        let mut table = seats();
        table.rules.spy_discovery_step = 1.0;
        let mut phase = WerewolvesPhase::new();
        phase.enter(&mut table.ctx());
        let eve = table.id("Eve");

        phase.handle(eve, "spy", &[], &mut table.ctx());

        assert!(phase.is_ended());
        assert!(table.registry.get("Eve").unwrap().injured);
        match table.registry.get("Eve").unwrap().kind {
            RoleKind::LittleGirl { spy_attempts } => assert_eq!(spy_attempts, 1),
            ref other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_only_the_little_girl_spies() {
        let mut table = seats();
        let mut phase = WerewolvesPhase::new();
        phase.enter(&mut table.ctx());
        let alice = table.id("Alice");
        table.drain_all();

        phase.handle(alice, "spy", &[], &mut table.ctx());
        assert_eq!(table.drain("Alice")[0].tone, Tone::Rejection);
    }

    #[test]
    fn test_pack_and_little_girl_get_their_turn() {
        let mut table = seats();
        let mut phase = WerewolvesPhase::new();
        phase.enter(&mut table.ctx());

        for wolf in ["Alice", "Bob"] {
            let out = table.drain(wolf);
            let turn = out
                .iter()
                .find(|m| m.text.starts_with("Your pack tonight"))
                .expect("pack prompt");
            assert!(turn.text.contains("Alice") && turn.text.contains("Bob"));
            assert!(turn.text.contains("$kill") && turn.text.contains("$confirm"));
        }
        assert!(table.drain("Eve").iter().any(|m| m.text.contains("$spy")));
        assert!(table.drain("Carol").iter().all(|m| !m.text.contains("Your pack")));
    }
}
