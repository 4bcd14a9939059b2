//! Nickname selection, before the first night.

use lycan_protocol::ParticipantId;

use super::{CommandSpec, Ctx, Invocation, Phase, StepState};
use crate::registry::is_valid_nickname;
use crate::{CommandError, RoleGroup};

pub(crate) struct NicknamesPhase {
    state: StepState,
    /// Players whose display name is not a valid nickname.
    waiting: Vec<ParticipantId>,
    confirmed: Vec<ParticipantId>,
}

impl NicknamesPhase {
    pub(crate) fn new() -> Self {
        Self {
            state: StepState::new(
                &[],
                "Pick the name the others will know you by with *nickname <name>, then lock it with *confirm.",
                "Pick the name the others will know you by with *nickname <name>, then lock it with *confirm.",
            ),
            waiting: Vec::new(),
            confirmed: Vec::new(),
        }
    }

    fn check_all_confirmed(&mut self, ctx: &mut Ctx<'_>) {
        let confirmed: RoleGroup = self.confirmed.iter().copied().collect();
        if confirmed == ctx.registry.alive_players() {
            self.finish(ctx);
        }
    }

    fn nickname(&mut self, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
        let new = inv.one_arg()?;
        if self.confirmed.contains(&inv.actor) {
            return Err(CommandError::Availability(
                "your nickname is already confirmed".into(),
            ));
        }
        ctx.registry
            .change_nickname(inv.actor, new, ctx.rules.nickname_max_len)?;

        self.waiting.retain(|id| *id != inv.actor);
        ctx.info(
            inv.actor,
            format!(
                "Your nickname is now {new}. Type {}confirm to lock it.",
                ctx.prefix()
            ),
        );
        Ok(())
    }

    fn confirm(&mut self, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
        inv.no_args()?;
        if self.confirmed.contains(&inv.actor) {
            return Err(CommandError::Availability(
                "your nickname is already confirmed".into(),
            ));
        }
        if self.waiting.contains(&inv.actor) {
            return Err(CommandError::GameRule(format!(
                "choose a valid nickname first with {}nickname <name>",
                ctx.prefix()
            )));
        }

        self.confirmed.push(inv.actor);
        let nickname = ctx.nickname(inv.actor);
        let everyone = ctx.registry.everyone();
        ctx.info_all(
            &everyone,
            format!(
                "{} will be known as {nickname}.",
                ctx.display_name(inv.actor)
            ),
        );
        self.check_all_confirmed(ctx);
        Ok(())
    }

    fn confirm_all(&mut self, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
        inv.no_args()?;
        ctx.registry.check_is_admin(inv.actor)?;
        if let Some(stuck) = self.waiting.first() {
            return Err(CommandError::GameRule(format!(
                "{} still has no valid nickname",
                ctx.display_name(*stuck)
            )));
        }
        self.finish(ctx);
        Ok(())
    }
}

impl Phase for NicknamesPhase {
    const NAME: &'static str = "nicknames";
    const COMMANDS: &'static [CommandSpec<Self>] = &[
        CommandSpec {
            name: "nickname",
            usage: "nickname <name>",
            summary: "choose your nickname for this game",
            run: Self::nickname,
        },
        CommandSpec {
            name: "confirm",
            usage: "confirm",
            summary: "lock your nickname",
            run: Self::confirm,
        },
        CommandSpec {
            name: "confirmall",
            usage: "confirmall",
            summary: "lock everyone's nickname (admin)",
            run: Self::confirm_all,
        },
    ];

    fn state(&self) -> &StepState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut StepState {
        &mut self.state
    }

    fn start(&mut self, ctx: &mut Ctx<'_>) {
        let prefix = ctx.prefix();
        let max_len = ctx.rules.nickname_max_len;
        let seats: Vec<(ParticipantId, String)> = ctx
            .registry
            .iter()
            .map(|r| (r.participant, r.nickname.clone()))
            .collect();

        for (participant, nickname) in seats {
            if is_valid_nickname(&nickname, max_len) {
                ctx.info(
                    participant,
                    format!(
                        "In this game you are called {nickname}. Change it with {prefix}nickname <name>, \
                         keep it with {prefix}confirm."
                    ),
                );
            } else {
                self.waiting.push(participant);
                ctx.info(
                    participant,
                    format!(
                        "{nickname} cannot be used as a nickname: use at most {max_len} letters or digits. \
                         Choose one with {prefix}nickname <name>."
                    ),
                );
            }
        }
    }

    fn finish(&mut self, ctx: &mut Ctx<'_>) {
        let mut lines = vec!["Nicknames for this game:".to_string()];
        for role in ctx.registry.iter() {
            lines.push(format!(
                "- {} → {}",
                ctx.display_name(role.participant),
                role.nickname
            ));
        }
        let everyone = ctx.registry.everyone();
        everyone.send(ctx.messenger, &lycan_protocol::Outbound::listing(lines.join("\n")));
        self.state.close();
    }

    fn before_quit(&mut self, leaving: ParticipantId, _ctx: &mut Ctx<'_>) {
        self.waiting.retain(|id| *id != leaving);
        self.confirmed.retain(|id| *id != leaving);
    }

    fn on_player_quit(&mut self, ctx: &mut Ctx<'_>) {
        if ctx.registry.is_empty() {
            self.state.close();
        } else {
            self.check_all_confirmed(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RoleTag;
    use crate::step::Step;
    use crate::step::ctx::fixture::Table;
    use lycan_protocol::Tone;

    fn seats() -> Table {
        Table::with_roles(&[
            ("Alice", RoleTag::Werewolf),
            ("Bob", RoleTag::Villager),
            ("Carol", RoleTag::Villager),
        ])
    }

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_everyone_confirming_ends_with_a_listing() {
        let mut table = seats();
        let mut phase = NicknamesPhase::new();
        phase.enter(&mut table.ctx());

        for name in ["Alice", "Bob", "Carol"] {
            let id = table.id(name);
            phase.handle(id, "confirm", &[], &mut table.ctx());
        }

        assert!(phase.is_ended());
        let out = table.drain("Bob");
        let listing = out.iter().find(|m| m.tone == Tone::Listing).unwrap();
        assert!(listing.text.contains("- Carol → Carol"));
    }

    #[test]
    fn test_nickname_change_then_confirm() {
        let mut table = seats();
        let mut phase = NicknamesPhase::new();
        phase.enter(&mut table.ctx());
        let bob = table.id("Bob");

        phase.handle(bob, "nickname", &args(&["Bobby"]), &mut table.ctx());
        assert_eq!(table.registry.nickname_of(bob), Some("Bobby"));

        phase.handle(bob, "confirm", &[], &mut table.ctx());
        table.drain("Bobby");
        phase.handle(bob, "nickname", &args(&["Robert"]), &mut table.ctx());
        assert_eq!(table.registry.nickname_of(bob), Some("Bobby"));
        assert_eq!(table.drain("Bobby")[0].tone, Tone::Rejection);
    }

    #[test]
    fn test_taken_or_invalid_nicknames_are_refused() {
        let mut table = seats();
        let mut phase = NicknamesPhase::new();
        phase.enter(&mut table.ctx());
        let bob = table.id("Bob");
        table.drain("Bob");

        phase.handle(bob, "nickname", &args(&["Carol"]), &mut table.ctx());
        phase.handle(bob, "nickname", &args(&["no-dashes"]), &mut table.ctx());

        assert_eq!(table.registry.nickname_of(bob), Some("Bob"));
        let out = table.drain("Bob");
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|m| m.tone == Tone::Rejection));
    }

    #[test]
    fn test_invalid_display_name_must_be_replaced_before_confirming() {
        let mut table = Table::with_roles(&[
            ("Alice", RoleTag::Werewolf),
            ("Bob the Bold", RoleTag::Villager),
            ("Carol", RoleTag::Villager),
        ]);
        let mut phase = NicknamesPhase::new();
        phase.enter(&mut table.ctx());
        let bob = table.id("Bob the Bold");

        phase.handle(bob, "confirm", &[], &mut table.ctx());
        assert!(!phase.confirmed.contains(&bob));

        phase.handle(bob, "nickname", &args(&["Bold"]), &mut table.ctx());
        phase.handle(bob, "confirm", &[], &mut table.ctx());
        assert!(phase.confirmed.contains(&bob));
    }

    #[test]
    fn test_confirmall_is_admin_only() {
        let mut table = seats();
        let mut phase = NicknamesPhase::new();
        phase.enter(&mut table.ctx());
        let (alice, bob) = (table.id("Alice"), table.id("Bob"));

        phase.handle(bob, "confirmall", &[], &mut table.ctx());
        assert!(!phase.is_ended());

        phase.handle(alice, "confirmall", &[], &mut table.ctx());
        assert!(phase.is_ended());
    }

    #[test]
    fn test_leaving_unconfirmed_player_no_longer_blocks() {
        let mut table = seats();
        let mut phase = NicknamesPhase::new();
        phase.enter(&mut table.ctx());
        let (alice, bob, carol) = (table.id("Alice"), table.id("Bob"), table.id("Carol"));

        phase.handle(alice, "confirm", &[], &mut table.ctx());
        phase.handle(bob, "confirm", &[], &mut table.ctx());
        assert!(!phase.is_ended());

        phase.remove_player(carol, &mut table.ctx());
        assert!(phase.is_ended());
    }
}
