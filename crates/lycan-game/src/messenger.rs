//! Outbound delivery seam.
//!
//! The core never touches a socket. Everything it says goes through a
//! [`Messenger`], and delivery is fire-and-forget from its point of view:
//! a failure is logged by the caller and the broadcast moves on.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use lycan_protocol::{ChannelId, Outbound, ParticipantId};
use tokio::sync::mpsc;

use crate::DeliveryError;

/// Delivers narration to participants and channels.
///
/// Object safe and synchronous: sessions call it from inside their actor
/// task without awaiting, so one slow client never stalls a game.
pub trait Messenger: Send + Sync {
    fn send_direct(&self, to: ParticipantId, message: Outbound) -> Result<(), DeliveryError>;

    fn send_to_channel(&self, channel: &ChannelId, message: Outbound)
    -> Result<(), DeliveryError>;
}

/// Per-participant (and per-channel) outbox.
pub type Outbox = mpsc::UnboundedSender<Outbound>;

/// A [`Messenger`] over unbounded mpsc outboxes.
///
/// The network glue registers one outbox per connection and forwards
/// whatever arrives to the socket. Tests register a receiver per player
/// and read it like an inbox.
#[derive(Debug, Default)]
pub struct ChannelMessenger {
    participants: RwLock<HashMap<ParticipantId, Outbox>>,
    channels: RwLock<HashMap<ChannelId, Outbox>>,
}

impl ChannelMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes messages for `participant` into `outbox`, replacing any
    /// previous registration.
    pub fn register(&self, participant: ParticipantId, outbox: Outbox) {
        self.participants
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(participant, outbox);
    }

    /// Creates and registers a fresh inbox for `participant`.
    pub fn inbox(&self, participant: ParticipantId) -> mpsc::UnboundedReceiver<Outbound> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.register(participant, tx);
        rx
    }

    pub fn unregister(&self, participant: ParticipantId) {
        self.participants
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&participant);
    }

    pub fn register_channel(&self, channel: ChannelId, outbox: Outbox) {
        self.channels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(channel, outbox);
    }

    pub fn unregister_channel(&self, channel: &ChannelId) {
        self.channels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(channel);
    }
}

impl Messenger for ChannelMessenger {
    fn send_direct(&self, to: ParticipantId, message: Outbound) -> Result<(), DeliveryError> {
        let participants = self
            .participants
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        participants
            .get(&to)
            .ok_or_else(|| DeliveryError::Unreachable(to.to_string()))?
            .send(message)
            .map_err(|_| DeliveryError::Unreachable(to.to_string()))
    }

    fn send_to_channel(
        &self,
        channel: &ChannelId,
        message: Outbound,
    ) -> Result<(), DeliveryError> {
        let channels = self.channels.read().unwrap_or_else(PoisonError::into_inner);
        channels
            .get(channel)
            .ok_or_else(|| DeliveryError::Unreachable(channel.to_string()))?
            .send(message)
            .map_err(|_| DeliveryError::Unreachable(channel.to_string()))
    }
}
