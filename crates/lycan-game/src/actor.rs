//! Session actor: one Tokio task per game.
//!
//! The task owns its [`Session`] and drains a bounded command channel,
//! one command at a time. A reaction, including every phase it makes
//! end, is finished before the next command is even read, which is what
//! keeps a game single-threaded without a lock.

use lycan_protocol::ParticipantId;
use tokio::sync::{mpsc, oneshot};

use crate::{GameError, Player, Session, SessionState};

/// Commands sent to a session actor.
///
/// Variants carrying a `oneshot::Sender` expect an answer; the rest are
/// fire-and-forget.
pub(crate) enum SessionCommand {
    Join {
        player: Player,
        reply: oneshot::Sender<Result<(), GameError>>,
    },
    Leave {
        participant: ParticipantId,
        reply: oneshot::Sender<Result<(), GameError>>,
    },
    SetAdmin {
        participant: ParticipantId,
        reply: oneshot::Sender<Result<(), GameError>>,
    },
    Launch {
        reply: oneshot::Sender<Result<(), GameError>>,
    },
    /// A line of chat or a command from a player.
    Message {
        participant: ParticipantId,
        content: String,
        reply: oneshot::Sender<SessionInfo>,
    },
    GetInfo {
        reply: oneshot::Sender<SessionInfo>,
    },
    Shutdown,
}

/// A snapshot of a session's lobby data.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub name: String,
    pub state: SessionState,
    pub admin: ParticipantId,
    pub players: Vec<Player>,
    /// Current phase, once launched.
    pub phase: Option<&'static str>,
}

impl SessionInfo {
    pub fn has_player(&self, participant: ParticipantId) -> bool {
        self.players.iter().any(|p| p.id == participant)
    }
}

/// Handle to a running session actor. Cheap to clone.
#[derive(Clone)]
pub struct SessionHandle {
    name: String,
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn unavailable(&self) -> GameError {
        GameError::Unavailable(self.name.clone())
    }

    /// Sends `command` built around a fresh reply channel and awaits the answer.
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, GameError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    pub async fn join(&self, player: Player) -> Result<(), GameError> {
        self.request(|reply| SessionCommand::Join { player, reply })
            .await?
    }

    pub async fn leave(&self, participant: ParticipantId) -> Result<(), GameError> {
        self.request(|reply| SessionCommand::Leave { participant, reply })
            .await?
    }

    pub async fn set_admin(&self, participant: ParticipantId) -> Result<(), GameError> {
        self.request(|reply| SessionCommand::SetAdmin { participant, reply })
            .await?
    }

    pub async fn launch(&self) -> Result<(), GameError> {
        self.request(|reply| SessionCommand::Launch { reply }).await?
    }

    /// Delivers a line and returns the session as it stands afterwards.
    pub async fn send_message(
        &self,
        participant: ParticipantId,
        content: impl Into<String>,
    ) -> Result<SessionInfo, GameError> {
        let content = content.into();
        self.request(|reply| SessionCommand::Message {
            participant,
            content,
            reply,
        })
        .await
    }

    pub async fn get_info(&self) -> Result<SessionInfo, GameError> {
        self.request(|reply| SessionCommand::GetInfo { reply }).await
    }

    pub async fn shutdown(&self) -> Result<(), GameError> {
        self.sender
            .send(SessionCommand::Shutdown)
            .await
            .map_err(|_| self.unavailable())
    }
}

struct SessionActor {
    session: Session,
    receiver: mpsc::Receiver<SessionCommand>,
}

impl SessionActor {
    async fn run(mut self) {
        let name = self.session.name().to_string();
        tracing::info!(game = %name, "session actor started");

        while let Some(command) = self.receiver.recv().await {
            match command {
                SessionCommand::Join { player, reply } => {
                    let _ = reply.send(self.session.add_player(player));
                }
                SessionCommand::Leave { participant, reply } => {
                    let _ = reply.send(self.session.remove_player(participant).await);
                }
                SessionCommand::SetAdmin { participant, reply } => {
                    let _ = reply.send(self.session.set_admin(participant));
                }
                SessionCommand::Launch { reply } => {
                    let _ = reply.send(self.session.launch().await);
                }
                SessionCommand::Message {
                    participant,
                    content,
                    reply,
                } => {
                    if let Err(e) = self.session.react(participant, &content).await {
                        tracing::debug!(game = %name, %participant, error = %e, "message ignored");
                    }
                    let _ = reply.send(self.info());
                }
                SessionCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                SessionCommand::Shutdown => {
                    tracing::info!(game = %name, "session shutting down");
                    break;
                }
            }
        }

        tracing::info!(game = %name, "session actor stopped");
    }

    fn info(&self) -> SessionInfo {
        SessionInfo {
            name: self.session.name().to_string(),
            state: self.session.state(),
            admin: self.session.admin(),
            players: self.session.players().to_vec(),
            phase: self.session.current_phase(),
        }
    }
}

/// Moves `session` into its own task and returns a handle to it.
///
/// `channel_size` bounds the command queue: senders wait when it is full.
pub fn spawn_session(session: Session, channel_size: usize) -> SessionHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let name = session.name().to_string();
    let actor = SessionActor {
        session,
        receiver: rx,
    };
    tokio::spawn(actor.run());
    SessionHandle { name, sender: tx }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{ChannelMessenger, SessionOptions};

    fn handle(messenger: Arc<ChannelMessenger>) -> SessionHandle {
        let options = SessionOptions {
            seed: Some(1),
            ..SessionOptions::default()
        };
        let session = Session::new(
            "moonlit",
            Player::new(ParticipantId(1), "Alice"),
            messenger,
            options,
        );
        spawn_session(session, 16)
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_launch_and_talk_through_the_handle() {
        let messenger = Arc::new(ChannelMessenger::new());
        let mut bob_inbox = messenger.inbox(ParticipantId(2));
        let session = handle(messenger);

        for (id, name) in [(2, "Bob"), (3, "Carol"), (4, "Dave")] {
            session.join(Player::new(ParticipantId(id), name)).await.unwrap();
        }
        assert!(matches!(
            session.join(Player::new(ParticipantId(2), "Bob")).await,
            Err(GameError::AlreadyJoined(_))
        ));

        session.launch().await.unwrap();
        let info = session.send_message(ParticipantId(1), "good evening").await.unwrap();
        assert_eq!(info.state, SessionState::Active);
        assert_eq!(info.phase, Some("nicknames"));

        let mut heard = Vec::new();
        while let Ok(message) = bob_inbox.try_recv() {
            heard.push(message);
        }
        assert!(heard.contains(&lycan_protocol::Outbound::relay("Alice", "good evening")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_makes_the_handle_unavailable() {
        let session = handle(Arc::new(ChannelMessenger::new()));
        session.shutdown().await.unwrap();
        tokio::task::yield_now().await;

        assert!(matches!(
            session.get_info().await,
            Err(GameError::Unavailable(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_leave_reports_unknown_participants() {
        let session = handle(Arc::new(ChannelMessenger::new()));
        assert!(matches!(
            session.leave(ParticipantId(9)).await,
            Err(GameError::UnknownParticipant(_))
        ));
        let info = session.get_info().await.unwrap();
        assert_eq!(info.players.len(), 1);
        assert!(info.has_player(ParticipantId(1)));
    }
}
