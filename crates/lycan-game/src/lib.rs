//! The Werewolf game core.
//!
//! A session is a small state machine: a [`RoleRegistry`] holding each
//! player's secret role, and a sequence of phases (nicknames, the first
//! night, then night/day cycles) that decide who may act and who hears
//! what, until one side wins.
//!
//! # Key types
//!
//! - [`Session`]: one game, driven one message at a time
//! - [`SessionHandle`]: talk to a session running in its own task
//! - [`GameDirectory`]: every game of the process, one game per participant
//! - [`RoleRegistry`]: roles, nicknames, admin, deaths and the win check
//! - [`Messenger`]: where the narration goes (see [`ChannelMessenger`])
//! - [`StoryBook`]: the narrator's lines
//! - [`RulesConfig`]: player counts, role set, pacing

mod actor;
mod config;
mod directory;
mod error;
mod group;
mod messenger;
mod registry;
mod role;
mod sequence;
mod session;
mod step;
mod story;
mod throttle;

pub use actor::{SessionHandle, SessionInfo, spawn_session};
pub use config::{RulesConfig, SessionState};
pub use directory::GameDirectory;
pub use error::{CommandError, DeliveryError, DirectoryError, GameError, StoryError};
pub use group::RoleGroup;
pub use messenger::{ChannelMessenger, Messenger, Outbox};
pub use registry::{Death, Outcome, Player, RoleRegistry};
pub use role::{Faction, Role, RoleKind, RoleTag};
pub use session::{Session, SessionOptions};
pub use story::StoryBook;
