//! `LycanServer` builder and accept loop.
//!
//! The entry point of a networked game: one [`GameDirectory`] for the
//! whole process, one [`ChannelMessenger`] every session speaks through,
//! and one handler task per WebSocket client.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Duration;

use lycan_game::{ChannelMessenger, GameDirectory, RulesConfig, StoryBook};
use lycan_protocol::{Codec, JsonCodec};
use lycan_transport::{Transport, WebSocketTransport};

use crate::LycanError;
use crate::handler::handle_connection;

/// A connection that sends nothing for this long is dropped, which makes
/// its participant leave their game.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// State shared by every connection task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) directory: GameDirectory,
    pub(crate) messenger: Arc<ChannelMessenger>,
    pub(crate) codec: C,
    pub(crate) next_participant: AtomicU64,
    pub(crate) idle_timeout: Duration,
}

/// Builder for configuring and starting a Lycan server.
///
/// ```rust,ignore
/// let server = LycanServer::builder()
///     .bind("0.0.0.0:8080")
///     .rules(RulesConfig { min_players: 5, ..RulesConfig::default() })
///     .build()
///     .await?;
/// ```
pub struct LycanServerBuilder {
    bind_addr: String,
    rules: RulesConfig,
    story: Option<StoryBook>,
    seed: Option<u64>,
    idle_timeout: Duration,
}

impl LycanServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            rules: RulesConfig::default(),
            story: None,
            seed: None,
            idle_timeout: IDLE_TIMEOUT,
        }
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Rules applied to every game created on this server.
    pub fn rules(mut self, rules: RulesConfig) -> Self {
        self.rules = rules;
        self
    }

    /// Replaces the bundled English story.
    pub fn story(mut self, story: StoryBook) -> Self {
        self.story = Some(story);
        self
    }

    /// Makes role deals and narration reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Binds the listener. Frames are JSON text.
    pub async fn build(self) -> Result<LycanServer<JsonCodec>, LycanError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let story = match self.story {
            Some(story) => story,
            None => StoryBook::bundled()?,
        };
        let messenger = Arc::new(ChannelMessenger::new());
        let mut directory = GameDirectory::new(messenger.clone(), self.rules, Arc::new(story));
        if let Some(seed) = self.seed {
            directory = directory.with_seed(seed);
        }

        let state = Arc::new(ServerState {
            directory,
            messenger,
            codec: JsonCodec,
            next_participant: AtomicU64::new(1),
            idle_timeout: self.idle_timeout,
        });

        Ok(LycanServer { transport, state })
    }
}

impl Default for LycanServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Lycan server. Call [`run()`](Self::run) to start serving.
pub struct LycanServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl LycanServer<JsonCodec> {
    pub fn builder() -> LycanServerBuilder {
        LycanServerBuilder::new()
    }
}

impl<C: Codec> LycanServer<C> {
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, LycanError> {
        Ok(self.transport.local_addr()?)
    }

    /// Accepts clients until the process ends, one handler task each.
    pub async fn run(mut self) -> Result<(), LycanError> {
        tracing::info!("Lycan server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
