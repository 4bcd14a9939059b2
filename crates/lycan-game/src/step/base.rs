//! Commands every phase understands.

use lycan_protocol::ParticipantId;

use super::{
    ALWAYS_ALLOWED, CommandSpec, Ctx, Handler, Invocation, Phase, SessionRequest, with_prefix,
};
use crate::{CommandError, RoleGroup};

const RULES: &str = "\
Werewolves hide among the villagers. Each night the werewolves agree on a victim, \
while a few villagers with special powers act in secret. Each morning the dead are \
revealed and the village votes to lynch a suspect.
The villagers win when every werewolf is dead. The werewolves win when only \
werewolves remain. Two lovers from opposite sides win together if they are the \
last ones standing.
Type *commands to see what you can do right now, *players to see who is still alive \
and *role to be reminded of your role.";

/// Names of the base commands, in the order `commands` lists them.
const BASE: &[&str] = &[
    "help", "commands", "role", "players", "public", "private", "quit", "admin", "kick", "skip",
];

/// Finds a base command for phase `P`.
pub(super) fn lookup<P: Phase>(name: &str) -> Option<CommandSpec<P>> {
    let (usage, summary, run): (&'static str, &'static str, Handler<P>) = match name {
        "help" => ("help [full]", "explain what to do now, or the whole game", help::<P>),
        "commands" => ("commands", "list the commands you can use now", commands::<P>),
        "role" => ("role", "remind you of your role", role::<P>),
        "players" => ("players", "list the players and their state", players::<P>),
        "public" => ("public <message>", "talk to everyone", public::<P>),
        "private" => ("private <nickname> <message>", "talk to one player", private::<P>),
        "quit" => ("quit", "leave the game", quit::<P>),
        "admin" => ("admin <nickname>", "hand the admin role over (admin)", admin::<P>),
        "kick" => ("kick <nickname>", "remove a player (admin)", kick::<P>),
        "skip" => ("skip", "end the current phase at once (admin)", skip::<P>),
        _ => return None,
    };
    let name = BASE.iter().copied().find(|n| *n == name)?;
    Some(CommandSpec {
        name,
        usage,
        summary,
        run,
    })
}

// ---------------------------------------------------------------------------
// Information
// ---------------------------------------------------------------------------

fn help<P: Phase>(step: &mut P, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
    let prefix = ctx.prefix();
    match inv.optional_arg()? {
        Some("full") => {
            ctx.listing(inv.actor, with_prefix(RULES, prefix));
            return Ok(());
        }
        Some(_) => return Err(CommandError::syntax("help [full]", prefix)),
        None => {}
    }

    let acting = ctx
        .registry
        .by_participant(inv.actor)
        .is_some_and(|r| (r.alive && step.state().is_active(r.tag())) || step.bypasses_gates(r));
    let text = if acting {
        step.state().active_help
    } else {
        step.state().waiting_help
    };
    if text.is_empty() {
        ctx.info(
            inv.actor,
            format!("Nothing to do right now. Type {prefix}commands to see what you can use."),
        );
    } else {
        ctx.info(inv.actor, with_prefix(text, prefix));
    }
    Ok(())
}

fn commands<P: Phase>(
    step: &mut P,
    inv: &Invocation<'_>,
    ctx: &mut Ctx<'_>,
) -> Result<(), CommandError> {
    inv.no_args()?;
    let prefix = ctx.prefix();
    let acting = ctx
        .registry
        .by_participant(inv.actor)
        .is_some_and(|r| (r.alive && step.state().is_active(r.tag())) || step.bypasses_gates(r));

    let mut lines = vec!["Commands you can use now:".to_string()];
    if acting {
        for command in P::COMMANDS {
            lines.push(format!("- {prefix}{}: {}", command.usage, command.summary));
        }
    } else {
        for command in P::COMMANDS.iter().filter(|c| ALWAYS_ALLOWED.contains(&c.name)) {
            lines.push(format!("- {prefix}{}: {}", command.usage, command.summary));
        }
    }
    for name in BASE {
        if let Some(command) = lookup::<P>(name) {
            lines.push(format!("- {prefix}{}: {}", command.usage, command.summary));
        }
    }
    ctx.listing(inv.actor, lines.join("\n"));
    Ok(())
}

fn role<P: Phase>(_step: &mut P, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
    inv.no_args()?;
    let role = ctx
        .registry
        .by_participant(inv.actor)
        .ok_or_else(|| CommandError::Belonging("you are not playing in this game".into()))?;
    let mut text = format!("You are {}, a {}.", role.nickname, role.tag());
    if let Some(lover) = role.loving {
        text.push_str(&format!(" You are in love with {}.", ctx.nickname(lover)));
    }
    ctx.info(inv.actor, text);
    Ok(())
}

fn players<P: Phase>(
    _step: &mut P,
    inv: &Invocation<'_>,
    ctx: &mut Ctx<'_>,
) -> Result<(), CommandError> {
    inv.no_args()?;
    let mut lines = vec![format!("Players of {}:", ctx.registry.game_name())];
    for role in ctx.registry.iter() {
        let admin = if ctx.registry.is_admin(role.participant) {
            " [admin]"
        } else {
            ""
        };
        lines.push(format!(
            "- {} → {} ({}){admin}",
            ctx.display_name(role.participant),
            role.nickname,
            role.status()
        ));
    }
    ctx.listing(inv.actor, lines.join("\n"));
    Ok(())
}

// ---------------------------------------------------------------------------
// Talking
// ---------------------------------------------------------------------------

fn public<P: Phase>(_step: &mut P, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
    let words = inv.at_least(1)?;
    let to = ctx.registry.everyone().exclude(inv.actor);
    ctx.relay(inv.actor, &to, &words.join(" "));
    Ok(())
}

fn private<P: Phase>(
    _step: &mut P,
    inv: &Invocation<'_>,
    ctx: &mut Ctx<'_>,
) -> Result<(), CommandError> {
    let words = inv.at_least(2)?;
    let target = ctx
        .registry
        .get(&words[0])
        .ok_or_else(|| CommandError::NoSuchPlayer(words[0].clone()))?
        .participant;
    if target == inv.actor {
        return Err(CommandError::GameRule("talking to yourself helps nobody".into()));
    }
    ctx.relay(inv.actor, &RoleGroup::new([target]), &words[1..].join(" "));
    Ok(())
}

// ---------------------------------------------------------------------------
// Leaving & admin
// ---------------------------------------------------------------------------

fn quit<P: Phase>(step: &mut P, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
    inv.no_args()?;
    depart(step, inv.actor, None, ctx);
    Ok(())
}

fn kick<P: Phase>(step: &mut P, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
    let nickname = inv.one_arg()?;
    ctx.registry.check_is_admin(inv.actor)?;
    let target = ctx
        .registry
        .get(nickname)
        .ok_or_else(|| CommandError::NoSuchPlayer(nickname.to_string()))?
        .participant;
    if target == inv.actor {
        return Err(CommandError::GameRule(format!(
            "use {}quit to leave the game",
            ctx.prefix()
        )));
    }
    depart(step, target, Some(inv.actor), ctx);
    Ok(())
}

fn admin<P: Phase>(_step: &mut P, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
    let nickname = inv.one_arg()?;
    ctx.registry.check_is_admin(inv.actor)?;
    let target = ctx
        .registry
        .get(nickname)
        .ok_or_else(|| CommandError::NoSuchPlayer(nickname.to_string()))?
        .participant;
    ctx.registry.set_admin(target)?;
    ctx.requests.push(SessionRequest::SetAdmin(target));
    let everyone = ctx.registry.everyone();
    ctx.info_all(
        &everyone,
        format!("{nickname} is now the admin of {}.", ctx.registry.game_name()),
    );
    Ok(())
}

fn skip<P: Phase>(step: &mut P, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
    inv.no_args()?;
    ctx.registry.check_is_admin(inv.actor)?;
    if !P::SKIPPABLE {
        return Err(CommandError::Availability(format!(
            "the {} phase cannot be skipped",
            P::NAME
        )));
    }
    tracing::info!(phase = P::NAME, admin = %inv.actor, "phase skipped");
    step.state_mut().close();
    let everyone = ctx.registry.everyone();
    ctx.info_all(&everyone, "The admin skipped this phase.");
    Ok(())
}

/// Removes `leaving` from the game in the middle of `step`.
///
/// The admin role moves to the first remaining player when needed; the
/// departure is announced with the role revealed; the role dies (so a
/// lover grieves), is removed, and the phase re-checks whether it can
/// end now.
pub(super) fn depart<P: Phase>(
    step: &mut P,
    leaving: ParticipantId,
    kicked_by: Option<ParticipantId>,
    ctx: &mut Ctx<'_>,
) {
    let Some(role) = ctx.registry.by_participant(leaving) else {
        return;
    };
    let (nickname, tag) = (role.nickname.clone(), role.tag());

    step.before_quit(leaving, ctx);

    if ctx.registry.is_admin(leaving) {
        let heir = ctx
            .registry
            .iter()
            .map(|r| r.participant)
            .find(|id| *id != leaving);
        if let Some(heir) = heir {
            // set_admin only fails for unknown participants; heir has a role.
            if ctx.registry.set_admin(heir).is_ok() {
                ctx.requests.push(SessionRequest::SetAdmin(heir));
                let heir_name = ctx.nickname(heir);
                ctx.info(heir, format!("{nickname} left, you are now the admin."));
                tracing::info!(from = %leaving, to = %heir, nickname = %heir_name, "admin transferred");
            }
        }
    }

    let everyone = ctx.registry.everyone();
    let text = match kicked_by {
        None => format!("{nickname} left the game. They were a {tag}."),
        Some(admin) => format!(
            "{nickname} was kicked out by {}. They were a {tag}.",
            ctx.nickname(admin)
        ),
    };
    ctx.info_all(&everyone, text);

    ctx.kill(&nickname);
    ctx.registry.remove(leaving);
    ctx.requests.push(SessionRequest::RemovePlayer(leaving));
    tracing::info!(participant = %leaving, %nickname, phase = P::NAME, "player left the game");

    step.on_player_quit(ctx);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RoleTag;
    use crate::step::ctx::fixture::Table;
    use crate::step::{Step, StepState};
    use lycan_protocol::Tone;

    struct Idle {
        state: StepState,
    }

    impl Phase for Idle {
        const NAME: &'static str = "idle";
        const COMMANDS: &'static [CommandSpec<Self>] = &[];

        fn state(&self) -> &StepState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut StepState {
            &mut self.state
        }
    }

    fn idle() -> Idle {
        Idle {
            state: StepState::new(&[], "Wait a moment.", "Wait a moment."),
        }
    }

    fn seats() -> Table {
        Table::with_roles(&[
            ("Alice", RoleTag::Werewolf),
            ("Bob", RoleTag::Villager),
            ("Carol", RoleTag::Seeker),
            ("Dave", RoleTag::Villager),
        ])
    }

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    // =====================================================================
    // quit & kick
    // =====================================================================

    #[test]
    fn test_quit_transfers_admin_and_reveals_role() {
        let mut table = seats();
        let mut phase = idle();
        let alice = table.id("Alice");
        assert!(table.registry.is_admin(alice));

        phase.handle(alice, "quit", &[], &mut table.ctx());

        assert!(table.registry.get("Alice").is_none());
        let heir = table.registry.admin().unwrap();
        assert_ne!(heir, alice);
        assert!(table.requests.contains(&SessionRequest::SetAdmin(heir)));
        assert!(table.requests.contains(&SessionRequest::RemovePlayer(alice)));

        let out = table.drain("Carol");
        assert!(out.iter().any(|m| m.text == "Alice left the game. They were a werewolf."));
    }

    #[test]
    fn test_quit_kills_the_lover_of_grief() {
        let mut table = seats();
        let mut phase = idle();
        let (bob, carol) = (table.id("Bob"), table.id("Carol"));
        table.registry.bind_lovers(bob, carol);

        phase.handle(bob, "quit", &[], &mut table.ctx());

        assert!(!table.registry.get("Carol").unwrap().alive);
        let out = table.drain("Dave");
        assert!(out.iter().any(|m| m.tone == Tone::Narration && m.text.contains("Carol")));
    }

    #[test]
    fn test_kick_requires_admin_and_another_player() {
        let mut table = seats();
        let mut phase = idle();
        let (alice, bob) = (table.id("Alice"), table.id("Bob"));

        phase.handle(bob, "kick", &args(&["Dave"]), &mut table.ctx());
        assert!(table.registry.get("Dave").is_some());
        assert_eq!(table.drain("Bob")[0].tone, Tone::Rejection);

        phase.handle(alice, "kick", &args(&["Alice"]), &mut table.ctx());
        assert!(table.registry.get("Alice").is_some());

        phase.handle(alice, "kick", &args(&["Dave"]), &mut table.ctx());
        assert!(table.registry.get("Dave").is_none());
        let out = table.drain("Bob");
        assert!(out.iter().any(|m| m.text.contains("kicked out by Alice")));
    }

    #[test]
    fn test_last_player_leaving_ends_the_phase() {
        let mut table = Table::with_roles(&[("Alice", RoleTag::Villager)]);
        let mut phase = idle();
        let alice = table.id("Alice");

        phase.handle(alice, "quit", &[], &mut table.ctx());
        assert!(phase.is_ended());
    }

    // =====================================================================
    // admin & skip
    // =====================================================================

    #[test]
    fn test_skip_is_admin_only_and_closes_without_payoff() {
        let mut table = seats();
        let mut phase = idle();
        let (alice, bob) = (table.id("Alice"), table.id("Bob"));

        phase.handle(bob, "skip", &[], &mut table.ctx());
        assert!(!phase.is_ended());

        phase.handle(alice, "skip", &[], &mut table.ctx());
        assert!(phase.is_ended());
    }

    #[test]
    fn test_admin_handover() {
        let mut table = seats();
        let mut phase = idle();
        let (alice, carol) = (table.id("Alice"), table.id("Carol"));

        phase.handle(alice, "admin", &args(&["Carol"]), &mut table.ctx());

        assert!(table.registry.is_admin(carol));
        assert_eq!(table.requests, vec![SessionRequest::SetAdmin(carol)]);
    }

    // =====================================================================
    // Information & talking
    // =====================================================================

    #[test]
    fn test_private_reaches_only_the_target() {
        let mut table = seats();
        let mut phase = idle();
        let bob = table.id("Bob");

        phase.handle(bob, "private", &args(&["Carol", "meet", "me"]), &mut table.ctx());

        assert_eq!(
            table.drain("Carol"),
            vec![lycan_protocol::Outbound::relay("Bob", "meet me")]
        );
        assert!(table.drain("Dave").is_empty());
    }

    #[test]
    fn test_private_to_unknown_player() {
        let mut table = seats();
        let mut phase = idle();
        let bob = table.id("Bob");

        phase.handle(bob, "private", &args(&["Zed", "hi"]), &mut table.ctx());
        let out = table.drain("Bob");
        assert_eq!(out[0].text, "there is no player called Zed in this game");
    }

    #[test]
    fn test_players_listing_shows_admin_and_state() {
        let mut table = seats();
        let mut phase = idle();
        table.registry.kill("Dave");
        let bob = table.id("Bob");

        phase.handle(bob, "players", &[], &mut table.ctx());
        let out = table.drain("Bob");
        assert_eq!(out[0].tone, Tone::Listing);
        assert!(out[0].text.contains("- Alice → Alice (alive) [admin]"));
        assert!(out[0].text.contains("- Dave → Dave (dead, was villager)"));
    }

    #[test]
    fn test_wrong_arity_reports_usage() {
        let mut table = seats();
        let mut phase = idle();
        let bob = table.id("Bob");

        phase.handle(bob, "role", &args(&["now"]), &mut table.ctx());
        let out = table.drain("Bob");
        assert_eq!(out[0].text, "usage: $role");
    }

    #[test]
    fn test_help_full_uses_configured_prefix() {
        let mut table = seats();
        table.rules.command_prefix = '!';
        let mut phase = idle();
        let bob = table.id("Bob");

        phase.handle(bob, "help", &args(&["full"]), &mut table.ctx());
        let out = table.drain("Bob");
        assert!(out[0].text.contains("!commands"));
        assert!(!out[0].text.contains('*'));
    }
}
