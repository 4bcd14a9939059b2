//! Phases and the command dispatch they share.
//!
//! A game is a sequence of phases. Each phase implements [`Phase`]: a
//! static command table plus a few hooks (start, finish, relay, quit
//! handling). The blanket [`Step`] impl turns any phase into an object
//! the session can drive, and owns the dispatch rules every phase obeys:
//!
//! 1. the invoker must be alive, unless the command is always allowed
//!    (or the phase lets the dead act, like the Hunter's);
//! 2. the invoker must hold the phase's active role, same exception;
//! 3. the phase table is searched first, then the base commands.
//!
//! A handler validates everything before it mutates anything, and
//! returns a [`CommandError`] that is sent back to the invoker alone.

use std::panic::{self, AssertUnwindSafe};

use lycan_protocol::ParticipantId;

use crate::{CommandError, Role, RoleTag};

mod base;
mod begin;
pub(crate) mod ctx;
mod death_summary;
mod dusk;
mod end;
mod guard;
mod hunter;
mod lovemaker;
mod nicknames;
mod seeker;
mod vote;
mod werewolves;
mod witch;

pub(crate) use begin::BeginPhase;
pub(crate) use ctx::{Ctx, SessionRequest};
pub(crate) use death_summary::DeathSummaryPhase;
pub(crate) use dusk::DuskPhase;
pub(crate) use end::EndPhase;
pub(crate) use guard::GuardPhase;
pub(crate) use hunter::HunterPhase;
pub(crate) use lovemaker::LoveMakerPhase;
pub(crate) use nicknames::NicknamesPhase;
pub(crate) use seeker::SeekerPhase;
pub(crate) use vote::VotePhase;
pub(crate) use werewolves::WerewolvesPhase;
pub(crate) use witch::WitchPhase;

/// Commands usable by anyone, dead or alive, in any phase.
pub(crate) const ALWAYS_ALLOWED: &[&str] = &[
    "admin", "players", "private", "public", "quit", "commands", "help", "role", "votes", "again",
    "kick", "skip",
];

// ---------------------------------------------------------------------------
// Command tables
// ---------------------------------------------------------------------------

/// One parsed command, as seen by a handler.
pub(crate) struct Invocation<'a> {
    pub(crate) actor: ParticipantId,
    pub(crate) args: &'a [String],
    usage: &'static str,
    prefix: char,
}

impl<'a> Invocation<'a> {
    fn syntax(&self) -> CommandError {
        CommandError::syntax(self.usage, self.prefix)
    }

    pub(crate) fn no_args(&self) -> Result<(), CommandError> {
        if self.args.is_empty() {
            Ok(())
        } else {
            Err(self.syntax())
        }
    }

    pub(crate) fn one_arg(&self) -> Result<&'a str, CommandError> {
        match self.args {
            [only] => Ok(only),
            _ => Err(self.syntax()),
        }
    }

    pub(crate) fn two_args(&self) -> Result<(&'a str, &'a str), CommandError> {
        match self.args {
            [first, second] => Ok((first, second)),
            _ => Err(self.syntax()),
        }
    }

    /// Zero or one argument.
    pub(crate) fn optional_arg(&self) -> Result<Option<&'a str>, CommandError> {
        match self.args {
            [] => Ok(None),
            [only] => Ok(Some(only)),
            _ => Err(self.syntax()),
        }
    }

    /// At least `min` arguments.
    pub(crate) fn at_least(&self, min: usize) -> Result<&'a [String], CommandError> {
        if self.args.len() >= min {
            Ok(self.args)
        } else {
            Err(self.syntax())
        }
    }
}

pub(crate) type Handler<P> =
    fn(&mut P, &Invocation<'_>, &mut Ctx<'_>) -> Result<(), CommandError>;

/// An entry of a phase's command table.
pub(crate) struct CommandSpec<P> {
    pub(crate) name: &'static str,
    /// Usage line without the prefix, e.g. `vote <nickname>`.
    pub(crate) usage: &'static str,
    pub(crate) summary: &'static str,
    pub(crate) run: Handler<P>,
}

/// Bookkeeping shared by every phase.
#[derive(Debug)]
pub(crate) struct StepState {
    pub(crate) ended: bool,
    /// Roles allowed to use the phase's commands. Empty means everyone.
    pub(crate) active: &'static [RoleTag],
    /// Help for the active roles. `*` stands for the command prefix.
    pub(crate) active_help: &'static str,
    /// Help for everyone else.
    pub(crate) waiting_help: &'static str,
}

impl StepState {
    pub(crate) fn new(
        active: &'static [RoleTag],
        active_help: &'static str,
        waiting_help: &'static str,
    ) -> Self {
        Self {
            ended: false,
            active,
            active_help,
            waiting_help,
        }
    }

    pub(crate) fn close(&mut self) {
        self.ended = true;
    }

    pub(crate) fn is_active(&self, tag: RoleTag) -> bool {
        self.active.is_empty() || self.active.contains(&tag)
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// One phase of a game.
///
/// Implementors only describe what is specific to them. Hooks have
/// defaults matching the most common phase: a broadcast relay, no quit
/// bookkeeping, and a finish that simply ends the phase.
pub(crate) trait Phase: Sized + Send + 'static {
    const NAME: &'static str;
    const COMMANDS: &'static [CommandSpec<Self>];
    /// Whether the admin's `skip` may end this phase.
    const SKIPPABLE: bool = true;

    fn state(&self) -> &StepState;
    fn state_mut(&mut self) -> &mut StepState;

    /// Runs once when the phase becomes current. May end the phase at once.
    fn start(&mut self, _ctx: &mut Ctx<'_>) {}

    /// The phase's payoff. Must end the phase unless it restarts itself.
    fn finish(&mut self, _ctx: &mut Ctx<'_>) {
        self.state_mut().close();
    }

    /// Delivers free text. Defaults to everyone but the author.
    fn relay(&mut self, from: ParticipantId, text: &str, ctx: &mut Ctx<'_>) {
        let to = ctx.registry.everyone().exclude(from);
        ctx.relay(from, &to, text);
    }

    /// Called before a leaving player's role is removed.
    fn before_quit(&mut self, _leaving: ParticipantId, _ctx: &mut Ctx<'_>) {}

    /// Called after a player left, to re-check the end condition.
    fn on_player_quit(&mut self, ctx: &mut Ctx<'_>) {
        if ctx.registry.is_empty() {
            self.state_mut().close();
        }
    }

    /// Lets `actor` act although dead or not active.
    fn bypasses_gates(&self, _actor: &Role) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Step: the object-safe face of a phase
// ---------------------------------------------------------------------------

/// What the session drives. Implemented for every [`Phase`].
pub(crate) trait Step: Send {
    fn name(&self) -> &'static str;
    fn is_ended(&self) -> bool;
    /// Ends the phase without its payoff.
    fn close(&mut self);
    fn enter(&mut self, ctx: &mut Ctx<'_>);
    fn handle(&mut self, actor: ParticipantId, name: &str, args: &[String], ctx: &mut Ctx<'_>);
    fn chat(&mut self, from: ParticipantId, text: &str, ctx: &mut Ctx<'_>);
    /// Runs the full quit flow for `leaving`.
    fn remove_player(&mut self, leaving: ParticipantId, ctx: &mut Ctx<'_>);
}

impl<P: Phase> Step for P {
    fn name(&self) -> &'static str {
        P::NAME
    }

    fn is_ended(&self) -> bool {
        self.state().ended
    }

    fn close(&mut self) {
        self.state_mut().close();
    }

    fn enter(&mut self, ctx: &mut Ctx<'_>) {
        tracing::debug!(phase = P::NAME, "phase started");
        self.start(ctx);
    }

    fn handle(&mut self, actor: ParticipantId, name: &str, args: &[String], ctx: &mut Ctx<'_>) {
        let Some(role) = ctx.registry.by_participant(actor) else {
            ctx.reject(
                actor,
                &CommandError::Belonging("you are not playing in this game".into()),
            );
            return;
        };
        let (alive, tag) = (role.alive, role.tag());
        let bypass = self.bypasses_gates(role);
        let always = ALWAYS_ALLOWED.contains(&name);
        let prefix = ctx.prefix();

        if !bypass && !always {
            if !alive {
                ctx.reject(
                    actor,
                    &CommandError::Availability(format!("dead players cannot use {prefix}{name}")),
                );
                return;
            }
            if !self.state().is_active(tag) {
                ctx.reject(
                    actor,
                    &CommandError::Belonging(format!("{prefix}{name} is not for you right now")),
                );
                return;
            }
        }

        let command = P::COMMANDS
            .iter()
            .find(|c| c.name == name)
            .map(|c| (c.usage, c.run))
            .or_else(|| base::lookup::<P>(name).map(|c| (c.usage, c.run)));
        let Some((usage, run)) = command else {
            ctx.reject(
                actor,
                &CommandError::GameRule(format!(
                    "{prefix}{name} is not recognized now, try {prefix}commands"
                )),
            );
            return;
        };

        let invocation = Invocation {
            actor,
            args,
            usage,
            prefix,
        };
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| run(self, &invocation, ctx)));
        match outcome {
            Ok(Ok(())) => tracing::debug!(phase = P::NAME, command = name, %actor, "command handled"),
            Ok(Err(e)) => {
                if let CommandError::Story(story) = &e {
                    tracing::error!(phase = P::NAME, command = name, error = %story, "story page missing");
                } else {
                    tracing::debug!(phase = P::NAME, command = name, %actor, error = %e, "command rejected");
                }
                ctx.reject(actor, &e);
            }
            Err(_) => {
                tracing::error!(phase = P::NAME, command = name, %actor, "command handler panicked");
                ctx.reject(
                    actor,
                    &CommandError::GameRule(format!("{prefix}{name}: this command failed")),
                );
            }
        }
    }

    fn chat(&mut self, from: ParticipantId, text: &str, ctx: &mut Ctx<'_>) {
        let Some(role) = ctx.registry.by_participant(from) else {
            return;
        };
        let tag = role.tag();
        let first_word = text.split_whitespace().next().map(str::to_lowercase);
        let forgot_prefix = !self.state().active.is_empty()
            && self.state().is_active(tag)
            && first_word.is_some_and(|word| P::COMMANDS.iter().any(|c| c.name == word));
        if forgot_prefix {
            let prefix = ctx.prefix();
            ctx.reject(
                from,
                &CommandError::Syntax(format!(
                    "commands start with {prefix}, your message was not sent"
                )),
            );
            return;
        }
        self.relay(from, text, ctx);
    }

    fn remove_player(&mut self, leaving: ParticipantId, ctx: &mut Ctx<'_>) {
        base::depart(self, leaving, None, ctx);
    }
}

/// Help text with `*` replaced by the prefix.
pub(crate) fn with_prefix(text: &str, prefix: char) -> String {
    text.replace('*', &prefix.to_string())
}

/// `"A"`, `"A and B"`, `"A, B and C"`.
pub(crate) fn join_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}
