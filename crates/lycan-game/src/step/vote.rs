//! The daily lynch vote.
//!
//! Every alive player votes for someone or casts a blank vote. Once all
//! votes are in: all blank cancels the lynch; a single leader is lynched;
//! a tie restarts the vote restricted to the tied players, up to
//! `max_vote_rounds` rounds in total, after which the lynch is cancelled.
//!
//! A village idiot voted out is revealed and spared, but never votes
//! again.

use lycan_protocol::ParticipantId;

use super::{CommandSpec, Ctx, Invocation, Phase, StepState, join_names};
use crate::{CommandError, Role, RoleGroup, RoleKind};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Ballot {
    Against(String),
    Blank,
}

pub(crate) struct VotePhase {
    state: StepState,
    /// Voter → ballot, in casting order.
    votes: Vec<(ParticipantId, Ballot)>,
    /// Non-empty during a tie-break: the only valid targets.
    forced: Vec<String>,
    round: u32,
}

impl VotePhase {
    pub(crate) fn new() -> Self {
        Self {
            state: StepState::new(
                &[],
                "Vote for the player to lynch with *vote <nickname>, or cast a blank vote with *pass. \
                 *votes shows the ballots so far.",
                "The village is voting.",
            ),
            votes: Vec::new(),
            forced: Vec::new(),
            round: 1,
        }
    }

    fn is_voter(role: &Role) -> bool {
        role.alive && !matches!(role.kind, RoleKind::Idiot { revealed: true })
    }

    fn voters(ctx: &Ctx<'_>) -> RoleGroup {
        ctx.registry
            .iter()
            .filter(|r| Self::is_voter(r))
            .map(|r| r.participant)
            .collect()
    }

    fn has_voted(&self, voter: ParticipantId) -> bool {
        self.votes.iter().any(|(id, _)| *id == voter)
    }

    fn check_voter(&self, actor: ParticipantId, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
        if !ctx.registry.by_participant(actor).is_some_and(Self::is_voter) {
            return Err(CommandError::GameRule(
                "a revealed idiot no longer has a say".into(),
            ));
        }
        if self.has_voted(actor) {
            return Err(CommandError::Availability(ctx.line(
                "everyone",
                "has_already_voted",
                &[],
            )?));
        }
        Ok(())
    }

    fn check_all_voted(&mut self, ctx: &mut Ctx<'_>) {
        let voted: RoleGroup = self.votes.iter().map(|(id, _)| *id).collect();
        if voted == Self::voters(ctx) {
            self.finish(ctx);
        }
    }

    fn vote(&mut self, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
        let nickname = inv.one_arg()?;
        self.check_voter(inv.actor, ctx)?;
        let target = ctx.registry.check_has_player(nickname, false)?.nickname.clone();
        if !self.forced.is_empty() && !self.forced.contains(&target) {
            let targets = join_names(&self.forced);
            return Err(CommandError::GameRule(ctx.line(
                "everyone",
                "invalid_vote_target",
                &[("targets", targets.as_str())],
            )?));
        }

        self.votes.push((inv.actor, Ballot::Against(target.clone())));
        let player = ctx.nickname(inv.actor);
        let everyone = ctx.registry.everyone();
        ctx.narrate(
            &everyone,
            "everyone",
            "has_voted",
            &[("player", player.as_str()), ("target", target.as_str())],
        );
        self.check_all_voted(ctx);
        Ok(())
    }

    fn pass(&mut self, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
        inv.no_args()?;
        self.check_voter(inv.actor, ctx)?;

        self.votes.push((inv.actor, Ballot::Blank));
        let player = ctx.nickname(inv.actor);
        let everyone = ctx.registry.everyone();
        ctx.narrate(&everyone, "everyone", "white_vote", &[("player", player.as_str())]);
        self.check_all_voted(ctx);
        Ok(())
    }

    fn list_votes(&mut self, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
        inv.no_args()?;
        let mut lines = vec![format!("Votes, round {}:", self.round)];
        for role in ctx.registry.iter() {
            let ballot = if !Self::is_voter(role) {
                let reason = if role.alive { "cannot vote" } else { "dead" };
                reason.to_string()
            } else {
                match self.votes.iter().find(|(id, _)| *id == role.participant) {
                    Some((_, Ballot::Against(target))) => target.clone(),
                    Some((_, Ballot::Blank)) => "blank".to_string(),
                    None => "?".to_string(),
                }
            };
            lines.push(format!("- {} → {ballot}", role.nickname));
        }
        ctx.listing(inv.actor, lines.join("\n"));
        Ok(())
    }

    fn vote_for_all(&mut self, inv: &Invocation<'_>, ctx: &mut Ctx<'_>) -> Result<(), CommandError> {
        let nickname = inv.one_arg()?;
        ctx.registry.check_is_admin(inv.actor)?;
        let target = ctx.registry.check_has_player(nickname, false)?.nickname.clone();

        self.votes = Self::voters(ctx)
            .iter()
            .map(|id| (id, Ballot::Against(target.clone())))
            .collect();
        tracing::info!(admin = %inv.actor, %target, "vote forced by admin");
        self.finish(ctx);
        Ok(())
    }

    /// Counts the ballots. Returns the leaders in first-vote order.
    fn leaders(&self) -> Vec<String> {
        let mut tally: Vec<(String, usize)> = Vec::new();
        for (_, ballot) in &self.votes {
            let Ballot::Against(target) = ballot else {
                continue;
            };
            match tally.iter_mut().find(|(name, _)| name == target) {
                Some((_, count)) => *count += 1,
                None => tally.push((target.clone(), 1)),
            }
        }
        let top = tally.iter().map(|(_, count)| *count).max().unwrap_or(0);
        tally
            .into_iter()
            .filter(|(_, count)| *count == top)
            .map(|(name, _)| name)
            .collect()
    }
}

impl Phase for VotePhase {
    const NAME: &'static str = "vote";
    const COMMANDS: &'static [CommandSpec<Self>] = &[
        CommandSpec {
            name: "vote",
            usage: "vote <nickname>",
            summary: "vote to lynch a player",
            run: Self::vote,
        },
        CommandSpec {
            name: "pass",
            usage: "pass",
            summary: "cast a blank vote",
            run: Self::pass,
        },
        CommandSpec {
            name: "votes",
            usage: "votes",
            summary: "show the ballots so far",
            run: Self::list_votes,
        },
        CommandSpec {
            name: "voteforall",
            usage: "voteforall <nickname>",
            summary: "cast every vote against a player (admin)",
            run: Self::vote_for_all,
        },
    ];

    fn state(&self) -> &StepState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut StepState {
        &mut self.state
    }

    fn start(&mut self, ctx: &mut Ctx<'_>) {
        let everyone = ctx.registry.everyone();
        ctx.narrate(&everyone, "everyone", "vote_begins", &[]);
        if Self::voters(ctx).is_empty() {
            self.state.close();
        }
    }

    fn finish(&mut self, ctx: &mut Ctx<'_>) {
        let everyone = ctx.registry.everyone();
        let leaders = self.leaders();

        if leaders.is_empty() {
            ctx.narrate(&everyone, "everyone", "canceled_vote_by_white_votes", &[]);
            self.state.close();
            return;
        }

        if leaders.len() > 1 {
            let players = join_names(&leaders);
            if self.round < ctx.rules.max_vote_rounds {
                self.round += 1;
                self.forced = leaders;
                self.votes.clear();
                let round = self.round.to_string();
                ctx.narrate(
                    &everyone,
                    "everyone",
                    "equality",
                    &[("players", players.as_str()), ("round", round.as_str())],
                );
            } else {
                ctx.narrate(
                    &everyone,
                    "everyone",
                    "canceled_vote_by_equality",
                    &[("players", players.as_str())],
                );
                self.state.close();
            }
            return;
        }

        let lynched = &leaders[0];
        let idiot = ctx
            .registry
            .get_mut(lynched)
            .filter(|r| matches!(r.kind, RoleKind::Idiot { revealed: false }));
        if let Some(idiot) = idiot {
            idiot.kind = RoleKind::Idiot { revealed: true };
            ctx.narrate(&everyone, "idiot", "revealed", &[("player", lynched.as_str())]);
            tracing::info!(player = %lynched, "village idiot revealed");
        } else {
            let role = ctx
                .registry
                .get(lynched)
                .map(|r| r.tag().to_string())
                .unwrap_or_default();
            ctx.narrate(
                &everyone,
                "everyone",
                "player_was_killed_by_vote",
                &[("player", lynched.as_str()), ("role", role.as_str())],
            );
            ctx.kill(lynched);
            tracing::info!(player = %lynched, "player lynched");
        }
        self.state.close();
    }

    fn before_quit(&mut self, leaving: ParticipantId, ctx: &mut Ctx<'_>) {
        self.votes.retain(|(id, _)| *id != leaving);
        // A ballot against the leaver no longer means anything.
        if let Some(nickname) = ctx.registry.nickname_of(leaving) {
            let nickname = nickname.to_string();
            self.votes
                .retain(|(_, ballot)| *ballot != Ballot::Against(nickname.clone()));
            self.forced.retain(|name| *name != nickname);
        }
    }

    fn on_player_quit(&mut self, ctx: &mut Ctx<'_>) {
        if Self::voters(ctx).is_empty() {
            self.state.close();
        } else {
            self.check_all_voted(ctx);
        }
    }
}
