//! Ruleset configuration and the session lifecycle state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::RoleTag;

// ---------------------------------------------------------------------------
// RulesConfig
// ---------------------------------------------------------------------------

/// The ruleset a session is played with.
///
/// One ruleset per process: the directory hands the same config to every
/// session it creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Players needed before a game may start (and restart).
    pub min_players: usize,

    /// `players / werewolf_divisor + 1` werewolves are dealt.
    pub werewolf_divisor: usize,

    /// Single-instance roles, dealt in this order after the werewolves
    /// while players remain.
    pub special_roles: Vec<RoleTag>,

    /// Longest nickname accepted (alphanumeric, no spaces).
    pub nickname_max_len: usize,

    /// A tie in the village vote re-runs the vote until this many rounds
    /// have been played, then the vote is cancelled.
    pub max_vote_rounds: u32,

    /// Prefix that turns a chat line into a command.
    pub command_prefix: char,

    /// Minimum delay between two automatic phase advances.
    pub advance_interval: Duration,

    /// Each spy attempt of the little girl raises the chance of being
    /// caught by this much.
    pub spy_discovery_step: f64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            min_players: 4,
            werewolf_divisor: 5,
            special_roles: vec![
                RoleTag::Seeker,
                RoleTag::Witch,
                RoleTag::LoveMaker,
                RoleTag::Hunter,
                RoleTag::Guard,
                RoleTag::LittleGirl,
                RoleTag::Idiot,
            ],
            nickname_max_len: 15,
            max_vote_rounds: 3,
            command_prefix: lycan_protocol::DEFAULT_PREFIX,
            advance_interval: Duration::from_secs(1),
            spy_discovery_step: 0.2,
        }
    }
}

impl RulesConfig {
    /// Fixes out-of-range values so the config is safe to play with.
    ///
    /// - `werewolf_divisor`, `nickname_max_len` and `max_vote_rounds` are at least 1.
    /// - `min_players` is at least 2.
    /// - `special_roles` keeps the first occurrence of each role and never
    ///   contains `Villager` or `Werewolf`.
    /// - `spy_discovery_step` is clamped to `0.0..=1.0`.
    pub fn validated(mut self) -> Self {
        if self.werewolf_divisor == 0 {
            tracing::warn!("werewolf_divisor is 0, using 1");
            self.werewolf_divisor = 1;
        }
        self.min_players = self.min_players.max(2);
        self.nickname_max_len = self.nickname_max_len.max(1);
        self.max_vote_rounds = self.max_vote_rounds.max(1);

        let mut seen = Vec::with_capacity(self.special_roles.len());
        self.special_roles.retain(|tag| {
            let keep = tag.is_special() && !seen.contains(tag);
            seen.push(*tag);
            keep
        });

        self.spy_discovery_step = if self.spy_discovery_step.is_nan() {
            0.0
        } else {
            self.spy_discovery_step.clamp(0.0, 1.0)
        };
        self
    }

    /// Number of werewolves dealt for `players` players.
    pub fn werewolf_count(&self, players: usize) -> usize {
        players / self.werewolf_divisor.max(1) + 1
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The lifecycle state of a session.
///
/// ```text
/// Pending → Active → Ended
///              ↑       │
///              └───────┘  (play again)
/// ```
///
/// - **Pending**: lobby, players come and go freely.
/// - **Active**: roles are dealt, phases are running.
/// - **Ended**: the terminal phase was entered. Players may still chat,
///   quit, or let the admin relaunch with the same roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Pending,
    Active,
    Ended,
}

impl SessionState {
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns `true` once roles have been dealt (running or finished).
    pub fn is_launched(&self) -> bool {
        matches!(self, Self::Active | Self::Ended)
    }

    pub fn next(self) -> Self {
        match self {
            Self::Pending | Self::Ended => Self::Active,
            Self::Active => Self::Ended,
        }
    }

    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == target
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Active => write!(f, "Active"),
            Self::Ended => write!(f, "Ended"),
        }
    }
}
