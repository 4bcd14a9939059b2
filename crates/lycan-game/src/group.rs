//! Addressable sets of players, the unit of message fan-out.

use lycan_protocol::{Outbound, ParticipantId};

use crate::Messenger;

/// A set of participants.
///
/// Built from registry views (`everyone`, `werewolves`, ...) and narrowed
/// with [`exclude`](Self::exclude). Equality is set equality, which the
/// win checks rely on ("the alive players are exactly the werewolves").
#[derive(Debug, Clone, Default)]
pub struct RoleGroup {
    members: Vec<ParticipantId>,
}

impl RoleGroup {
    pub fn new(members: impl IntoIterator<Item = ParticipantId>) -> Self {
        let mut group = Self::default();
        for id in members {
            if !group.members.contains(&id) {
                group.members.push(id);
            }
        }
        group
    }

    /// The same group without `participant`.
    pub fn exclude(mut self, participant: ParticipantId) -> Self {
        self.members.retain(|id| *id != participant);
        self
    }

    pub fn contains(&self, participant: ParticipantId) -> bool {
        self.members.contains(&participant)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.members.iter().copied()
    }

    /// Delivers `message` to every member.
    ///
    /// A member who cannot be reached is logged and skipped; the rest of
    /// the group still gets the message.
    pub fn send(&self, messenger: &dyn Messenger, message: &Outbound) {
        for id in &self.members {
            if let Err(e) = messenger.send_direct(*id, message.clone()) {
                tracing::warn!(participant = %id, error = %e, "delivery failed");
            }
        }
    }
}

impl PartialEq for RoleGroup {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|id| other.contains(id))
    }
}

impl Eq for RoleGroup {}

impl FromIterator<ParticipantId> for RoleGroup {
    fn from_iter<I: IntoIterator<Item = ParticipantId>>(iter: I) -> Self {
        Self::new(iter)
    }
}
