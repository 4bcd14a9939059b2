//! Shared vocabulary for Lycan.
//!
//! This crate defines what every other layer talks about:
//!
//! - **Identities** ([`ParticipantId`], [`ChannelId`]): opaque handles
//!   for the people at the table and the place the game was created in.
//! - **Outbound messages** ([`Outbound`], [`Tone`]): everything the
//!   narrator says, to one participant or to a channel.
//! - **Inbound classification** ([`Inbound`]): splitting a raw chat line
//!   into a command invocation or free text.
//! - **Wire frames** ([`ClientFrame`], [`ServerFrame`]) and the
//!   [`Codec`] that turns them into bytes for the network glue.
//!
//! ```text
//! Transport (bytes) → Protocol (frames, Inbound) → Game (sessions)
//! ```
//!
//! It knows nothing about roles or phases.

mod codec;
mod command;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use command::{DEFAULT_PREFIX, Inbound};
pub use error::ProtocolError;
pub use types::{
    ChannelId, ClientFrame, GameListing, LobbyReply, LobbyRequest, Outbound,
    ParticipantId, ServerFrame, Tone,
};
