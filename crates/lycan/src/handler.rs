//! Per-connection handler: greeting, lobby requests and chat routing.
//!
//! Each accepted connection gets its own Tokio task running this handler:
//!   1. Receive `Hello` → assign a participant id → send `Welcome`
//!   2. Register an outbox and spawn a writer forwarding narration
//!   3. Loop: `Say` goes to the participant's game, `Lobby` to the directory
//!
//! Leaving the loop for any reason makes the participant leave their game.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use lycan_game::{DirectoryError, Player};
use lycan_protocol::{
    ClientFrame, Codec, LobbyReply, LobbyRequest, ParticipantId, ProtocolError, ServerFrame,
};
use lycan_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::LycanError;
use crate::server::ServerState;

const HELLO_TIMEOUT: Duration = Duration::from_secs(10);

/// Cleans up after a participant when the handler exits, panics included.
///
/// `Drop` is synchronous, so the directory work runs in a spawned task.
struct ParticipantGuard<C: Codec> {
    participant: ParticipantId,
    writer: JoinHandle<()>,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for ParticipantGuard<C> {
    fn drop(&mut self) {
        self.writer.abort();
        let participant = self.participant;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.messenger.unregister(participant);
            match state.directory.leave_game(participant).await {
                Ok(game) => tracing::info!(%participant, %game, "left game on disconnect"),
                Err(DirectoryError::NotInGame(_)) => {}
                Err(e) => tracing::debug!(%participant, error = %e, "leave on disconnect failed"),
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), LycanError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (participant, name) = greet(&conn, &state).await?;
    tracing::info!(%conn_id, %participant, %name, "participant connected");

    let (outbox, inbox) = mpsc::unbounded_channel();
    state.messenger.register(participant, outbox);
    let writer = tokio::spawn(forward(Arc::clone(&conn), Arc::clone(&state), inbox));
    let _guard = ParticipantGuard {
        participant,
        writer,
        state: Arc::clone(&state),
    };

    loop {
        let data = match tokio::time::timeout(state.idle_timeout, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%participant, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%participant, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%participant, "connection idle, dropping it");
                break;
            }
        };

        let frame: ClientFrame = match state.codec.decode(&data) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(%participant, error = %e, "failed to decode frame");
                send_error(&conn, &state.codec, 400, &e.to_string()).await?;
                continue;
            }
        };

        match frame {
            ClientFrame::Say { text } => {
                if let Err(e) = say(&state, participant, &text).await {
                    send_error(&conn, &state.codec, e.code(), &e.to_string()).await?;
                }
            }
            ClientFrame::Lobby(request) => {
                let frame = match lobby(&state, participant, &name, request).await {
                    Ok(reply) => ServerFrame::Lobby(reply),
                    Err(e) => ServerFrame::Error {
                        code: e.code(),
                        message: e.to_string(),
                    },
                };
                send_frame(&conn, &state.codec, &frame).await?;
            }
            ClientFrame::Bye => {
                tracing::info!(%participant, "participant said goodbye");
                break;
            }
            ClientFrame::Hello { .. } => {
                send_error(&conn, &state.codec, 400, "already greeted").await?;
            }
        }
    }

    let _ = conn.close().await;
    // _guard drops here → the participant leaves their game.
    Ok(())
}

/// Waits for `Hello`, assigns a participant id and answers `Welcome`.
async fn greet<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
) -> Result<(ParticipantId, String), LycanError> {
    let data = match tokio::time::timeout(HELLO_TIMEOUT, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ProtocolError::InvalidMessage("connection closed before hello".into()).into());
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => return Err(ProtocolError::InvalidMessage("hello timed out".into()).into()),
    };

    let name = match state.codec.decode::<ClientFrame>(&data)? {
        ClientFrame::Hello { name } if !name.trim().is_empty() => name.trim().to_string(),
        ClientFrame::Hello { .. } => {
            send_error(conn, &state.codec, 400, "a name is required").await?;
            return Err(ProtocolError::InvalidMessage("empty name".into()).into());
        }
        _ => {
            send_error(conn, &state.codec, 400, "expected Hello").await?;
            return Err(ProtocolError::InvalidMessage("first frame must be Hello".into()).into());
        }
    };

    let participant = ParticipantId(state.next_participant.fetch_add(1, Ordering::Relaxed));
    send_frame(conn, &state.codec, &ServerFrame::Welcome { participant }).await?;
    Ok((participant, name))
}

/// Pushes everything the games say to this participant onto the socket.
async fn forward<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    mut inbox: mpsc::UnboundedReceiver<lycan_protocol::Outbound>,
) {
    while let Some(message) = inbox.recv().await {
        if let Err(e) = send_frame(&conn, &state.codec, &ServerFrame::Message(message)).await {
            tracing::debug!(conn_id = %conn.id(), error = %e, "writer stopped");
            break;
        }
    }
}

/// Routes a chat line to the participant's game.
async fn say<C: Codec>(
    state: &ServerState<C>,
    participant: ParticipantId,
    text: &str,
) -> Result<(), LycanError> {
    state.directory.route_message(participant, text).await?;
    Ok(())
}

async fn lobby<C: Codec>(
    state: &ServerState<C>,
    participant: ParticipantId,
    name: &str,
    request: LobbyRequest,
) -> Result<LobbyReply, LycanError> {
    tracing::debug!(%participant, ?request, "lobby request");
    let directory = &state.directory;

    let reply = match request {
        LobbyRequest::Create { name: game } => {
            let game = game.trim().to_string();
            if game.is_empty() {
                return Err(ProtocolError::InvalidMessage("a game needs a name".into()).into());
            }
            directory.create_game(&game, Player::new(participant, name), None)?;
            LobbyReply::Created { name: game }
        }
        LobbyRequest::Join { name: game } => {
            directory.join_game(&game, Player::new(participant, name)).await?;
            LobbyReply::Joined { name: game }
        }
        LobbyRequest::Leave => LobbyReply::Left {
            name: directory.leave_game(participant).await?,
        },
        LobbyRequest::List => LobbyReply::Games {
            games: directory.list_open_games().await,
        },
        LobbyRequest::Members { name: game } => {
            let members = directory
                .members(&game)
                .await?
                .into_iter()
                .map(|player| player.name)
                .collect();
            LobbyReply::Members {
                name: game,
                members,
            }
        }
        LobbyRequest::Start => LobbyReply::Started {
            name: directory.start_game(participant).await?,
        },
        LobbyRequest::Admin { participant: next } => {
            directory.set_admin(participant, next).await?;
            LobbyReply::AdminChanged {
                name: current_game(directory, participant)?,
                participant: next,
            }
        }
        LobbyRequest::Kick { participant: target } => {
            directory.kick(participant, target).await?;
            LobbyReply::Kicked {
                name: current_game(directory, participant)?,
                participant: target,
            }
        }
    };
    Ok(reply)
}

fn current_game(
    directory: &lycan_game::GameDirectory,
    participant: ParticipantId,
) -> Result<String, DirectoryError> {
    directory
        .game_of(participant)
        .ok_or(DirectoryError::NotInGame(participant))
}

async fn send_frame(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    frame: &ServerFrame,
) -> Result<(), LycanError> {
    let bytes = codec.encode(frame)?;
    conn.send(&bytes).await?;
    Ok(())
}

async fn send_error(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    code: u16,
    message: &str,
) -> Result<(), LycanError> {
    let frame = ServerFrame::Error {
        code,
        message: message.to_string(),
    };
    send_frame(conn, codec, &frame).await
}
