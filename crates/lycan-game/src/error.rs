//! Error types for the game layer.
//!
//! [`CommandError`] is the recoverable family: every command handler
//! returns it, the dispatch boundary renders it privately to the player
//! who typed the command, and the phase carries on. The other enums
//! describe session and directory operations requested by the glue.

use lycan_protocol::ParticipantId;

/// A command was refused. Nothing was mutated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// Wrong number or shape of arguments. Carries the usage line.
    #[error("usage: {0}")]
    Syntax(String),

    /// Actor or target is not part of this game or this faction.
    #[error("{0}")]
    Belonging(String),

    /// The actor lacks the admin role.
    #[error("{0}")]
    Permission(String),

    /// The actor already has a pending exclusive action (double vote).
    #[error("{0}")]
    Availability(String),

    /// Any other rule violation (self-targeting, empty potion, bad nickname).
    #[error("{0}")]
    GameRule(String),

    #[error("there is no player called {0} in this game")]
    NoSuchPlayer(String),

    #[error("{0} is already dead")]
    DeadPlayer(String),

    #[error("{0} is not injured")]
    AlivePlayer(String),

    #[error("{0} is already injured")]
    WoundedPlayer(String),

    /// The narrator could not find a line. Rendered generically.
    #[error("this command failed")]
    Story(#[from] StoryError),
}

impl CommandError {
    pub(crate) fn syntax(usage: &str, prefix: char) -> Self {
        Self::Syntax(format!("{prefix}{usage}"))
    }
}

/// Looking up or filling a story line failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoryError {
    #[error("no page {page} in chapter {chapter}")]
    UnknownPage { chapter: String, page: String },

    #[error("line {chapter}.{page} needs <{key}> but it was not provided")]
    MissingPlaceholder {
        chapter: String,
        page: String,
        key: String,
    },

    #[error("story file is malformed: {0}")]
    Parse(String),
}

/// Errors of session-level operations.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("{have} players joined, at least {need} are needed")]
    NotEnoughPlayers { have: usize, need: usize },

    #[error("participant {0} already joined this game")]
    AlreadyJoined(ParticipantId),

    #[error("participant {0} is not part of this game")]
    UnknownParticipant(ParticipantId),

    #[error("invalid session state for this operation: {0}")]
    InvalidState(String),

    /// The session actor stopped or its channel is full.
    #[error("game {0} is unavailable")]
    Unavailable(String),
}

/// Errors of the game directory (lobby layer).
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("no game called {0}")]
    NotFound(String),

    #[error("a game called {0} already exists")]
    NameTaken(String),

    #[error("participant {0} is already in game {1}")]
    AlreadyInGame(ParticipantId, String),

    #[error("participant {0} is not in any game")]
    NotInGame(ParticipantId),

    #[error("only the admin of {0} can do that")]
    NotAdmin(String),

    #[error("game {0} has already started")]
    NotJoinable(String),

    #[error("use leave to quit your own game")]
    CannotKickSelf,

    #[error(transparent)]
    Game(#[from] GameError),
}

/// A message could not be handed to a participant or channel.
///
/// Logged at the fan-out site and never propagated further.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("{0} cannot be reached")]
    Unreachable(String),
}
