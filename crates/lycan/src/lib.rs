//! # Lycan
//!
//! A moderator-less Werewolf game server.
//!
//! The narrator runs every phase of the game by itself: it deals the
//! secret roles, wakes each role at night, counts the village vote and
//! announces the winners. Players only chat and type `$commands`.
//!
//! This crate glues the layers together:
//!
//! ```text
//! WebSocket (lycan-transport) → frames (lycan-protocol) → GameDirectory (lycan-game)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lycan::prelude::*;
//!
//! # async fn serve() -> Result<(), LycanError> {
//! lycan::init_logging("info");
//! let server = LycanServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::LycanError;
pub use server::{IDLE_TIMEOUT, LycanServer, LycanServerBuilder};

/// Installs a `tracing` subscriber reading `RUST_LOG`, falling back to
/// `default` (e.g. `"info"`, `"lycan_game=debug"`).
///
/// Does nothing if a global subscriber is already set.
pub fn init_logging(default: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub mod prelude {
    pub use crate::{IDLE_TIMEOUT, LycanError, LycanServer, LycanServerBuilder};

    pub use lycan_game::{
        ChannelMessenger, GameDirectory, Messenger, Outcome, Player, RoleTag, RulesConfig,
        Session, SessionOptions, SessionState, StoryBook,
    };
    pub use lycan_protocol::{
        ChannelId, ClientFrame, Codec, GameListing, Inbound, JsonCodec, LobbyReply, LobbyRequest,
        Outbound, ParticipantId, ServerFrame, Tone,
    };
}
