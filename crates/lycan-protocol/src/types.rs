//! Core protocol types.
//!
//! Identities, the outbound message model the narrator speaks in, and the
//! frames that travel between a network client and the server glue.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Opaque, comparable handle for one participant.
///
/// The game core never looks inside it: the transport that created it
/// decides what it means (a socket, a chat account, a console user).
/// Nicknames are a separate, per-game concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// Opaque handle for a public channel (the place a game was created in).
///
/// The core only hands it back to the messenger for narration routing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Outbound: what the narrator says
// ---------------------------------------------------------------------------

/// How a piece of outbound text should be presented.
///
/// Transports pick the rendering (bold, italics, embeds); the core only
/// states the intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tone")]
pub enum Tone {
    /// Story text from the narrator.
    Narration,
    /// Neutral system information ("your nickname is now ...").
    Info,
    /// A command was refused; only ever sent to the invoking participant.
    Rejection,
    /// Chat relayed from another player, `from` is their nickname.
    Relay { from: String },
    /// A multi-line listing (players, votes, commands).
    Listing,
}

/// One message from the core to a participant or channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outbound {
    #[serde(flatten)]
    pub tone: Tone,
    pub text: String,
}

impl Outbound {
    /// Narrator story text.
    pub fn narration(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Narration,
            text: text.into(),
        }
    }

    /// Neutral information.
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Info,
            text: text.into(),
        }
    }

    /// A refused command.
    pub fn rejection(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Rejection,
            text: text.into(),
        }
    }

    /// Chat relayed from the player called `from`.
    pub fn relay(from: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Relay { from: from.into() },
            text: text.into(),
        }
    }

    /// A multi-line listing.
    pub fn listing(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Listing,
            text: text.into(),
        }
    }
}

impl fmt::Display for Outbound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tone {
            Tone::Relay { from } => write!(f, "{from} : {}", self.text),
            Tone::Rejection => write!(f, "!! {}", self.text),
            _ => f.write_str(&self.text),
        }
    }
}

// ---------------------------------------------------------------------------
// Lobby: game management requests of the network glue
// ---------------------------------------------------------------------------

/// A request against the game directory, sent outside of any game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LobbyRequest {
    /// Create a game and become its admin.
    Create { name: String },
    /// Join a game that has not started yet.
    Join { name: String },
    /// Leave the current game (deletes it when the admin leaves a lobby).
    Leave,
    /// List games that can still be joined.
    List,
    /// List the members of a game.
    Members { name: String },
    /// Start the current game (admin only).
    Start,
    /// Hand the admin role of the current game to someone else.
    Admin { participant: ParticipantId },
    /// Remove someone from the current game (admin only).
    Kick { participant: ParticipantId },
}

/// A summary of a joinable game returned in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameListing {
    pub name: String,
    pub player_count: usize,
    pub min_players: usize,
}

/// The directory's answer to a [`LobbyRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LobbyReply {
    Created { name: String },
    Joined { name: String },
    Left { name: String },
    Games { games: Vec<GameListing> },
    Members { name: String, members: Vec<String> },
    Started { name: String },
    AdminChanged { name: String, participant: ParticipantId },
    Kicked { name: String, participant: ParticipantId },
}

// ---------------------------------------------------------------------------
// Frames: the network envelope
// ---------------------------------------------------------------------------

/// Everything a network client can send.
///
/// Adjacently tagged so a client can dispatch on `type` alone:
/// `{ "type": "Say", "data": { "text": "$vote Alice" } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientFrame {
    /// First frame of every connection: who is sitting down.
    Hello { name: String },
    /// A chat line or a prefixed command for the participant's game.
    Say { text: String },
    /// Game directory management.
    Lobby(LobbyRequest),
    /// The client is leaving.
    Bye,
}

/// Everything the server can send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerFrame {
    /// Answer to `Hello`.
    Welcome { participant: ParticipantId },
    /// Narration, relayed chat, rejections.
    Message(Outbound),
    /// Answer to a lobby request.
    Lobby(LobbyReply),
    /// A request could not be served. `code` follows HTTP conventions.
    Error { code: u16, message: String },
}
