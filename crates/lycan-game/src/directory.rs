//! The game directory: every game of the process and who sits where.
//!
//! Owned by the process entry point and shared by every connection. Keeps
//! one [`SessionHandle`] per game name and the "one game per participant"
//! index. Players also leave from inside a game (`quit`, `kick`), so the
//! index is reconciled with the session roster after each routed line.
//!
//! The index sits behind a short-lived lock that is never held while a
//! session is awaited: a session pacing its phase advances only holds up
//! its own players.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lycan_protocol::{ChannelId, GameListing, Outbound, ParticipantId};

use crate::{
    DirectoryError, Messenger, Player, RulesConfig, Session, SessionHandle, SessionInfo,
    SessionOptions, StoryBook, spawn_session,
};

/// Command queue size of each session actor.
const DEFAULT_CHANNEL_SIZE: usize = 64;

#[derive(Default)]
struct Lobby {
    games: HashMap<String, SessionHandle>,
    /// The game each participant is in. At most one.
    memberships: HashMap<ParticipantId, String>,
    /// Games created so far, deleted ones included.
    created: u64,
}

impl Lobby {
    fn handle(&self, name: &str) -> Result<SessionHandle, DirectoryError> {
        self.games
            .get(name)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(name.to_string()))
    }

    fn ensure_free(&self, participant: ParticipantId) -> Result<(), DirectoryError> {
        match self.memberships.get(&participant) {
            Some(game) => Err(DirectoryError::AlreadyInGame(participant, game.clone())),
            None => Ok(()),
        }
    }

    /// Forgets `participant` if they are still recorded in `game`.
    fn forget(&mut self, participant: ParticipantId, game: &str) {
        if self.memberships.get(&participant).is_some_and(|g| g == game) {
            self.memberships.remove(&participant);
        }
    }
}

pub struct GameDirectory {
    lobby: Mutex<Lobby>,
    messenger: Arc<dyn Messenger>,
    rules: RulesConfig,
    story: Arc<StoryBook>,
    /// Base seed for new sessions, for reproducible games.
    seed: Option<u64>,
}

impl GameDirectory {
    pub fn new(messenger: Arc<dyn Messenger>, rules: RulesConfig, story: Arc<StoryBook>) -> Self {
        Self {
            lobby: Mutex::new(Lobby::default()),
            messenger,
            rules: rules.validated(),
            story,
            seed: None,
        }
    }

    /// Seeds every session created from now on (`seed`, `seed + 1`, ...,
    /// wrapping around).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    fn lobby(&self) -> MutexGuard<'_, Lobby> {
        self.lobby.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn game_count(&self) -> usize {
        self.lobby().games.len()
    }

    /// The game `participant` is in, if any.
    pub fn game_of(&self, participant: ParticipantId) -> Option<String> {
        self.lobby().memberships.get(&participant).cloned()
    }

    /// The session `participant` is in.
    pub fn handle_for(&self, participant: ParticipantId) -> Option<SessionHandle> {
        let lobby = self.lobby();
        lobby
            .memberships
            .get(&participant)
            .and_then(|name| lobby.games.get(name))
            .cloned()
    }

    fn current(&self, participant: ParticipantId) -> Result<(String, SessionHandle), DirectoryError> {
        let lobby = self.lobby();
        let name = lobby
            .memberships
            .get(&participant)
            .ok_or(DirectoryError::NotInGame(participant))?
            .clone();
        let handle = lobby.handle(&name)?;
        Ok((name, handle))
    }

    /// Seed of the next session. Never reused, even after a deletion.
    fn next_seed(&self, lobby: &mut Lobby) -> Option<u64> {
        let seed = self.seed.map(|base| base.wrapping_add(lobby.created));
        lobby.created = lobby.created.wrapping_add(1);
        seed
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Creates a game with `admin` as its first player.
    pub fn create_game(
        &self,
        name: &str,
        admin: Player,
        home_channel: Option<ChannelId>,
    ) -> Result<(), DirectoryError> {
        let mut lobby = self.lobby();
        if lobby.games.contains_key(name) {
            return Err(DirectoryError::NameTaken(name.to_string()));
        }
        lobby.ensure_free(admin.id)?;

        let options = SessionOptions {
            rules: self.rules.clone(),
            story: Arc::clone(&self.story),
            seed: self.next_seed(&mut lobby),
            home_channel,
        };
        let admin_id = admin.id;
        let session = Session::new(name, admin, Arc::clone(&self.messenger), options);
        lobby
            .games
            .insert(name.to_string(), spawn_session(session, DEFAULT_CHANNEL_SIZE));
        lobby.memberships.insert(admin_id, name.to_string());
        tracing::info!(game = %name, admin = %admin_id, "game created");
        Ok(())
    }

    /// Joins a game still in its lobby.
    ///
    /// The seat is reserved in the index before the session is asked, so
    /// a participant racing two joins only gets one.
    pub async fn join_game(&self, name: &str, player: Player) -> Result<(), DirectoryError> {
        let id = player.id;
        let handle = {
            let mut lobby = self.lobby();
            lobby.ensure_free(id)?;
            let handle = lobby.handle(name)?;
            lobby.memberships.insert(id, name.to_string());
            handle
        };

        if let Err(e) = Self::seat(&handle, name, player).await {
            self.lobby().forget(id, name);
            return Err(e);
        }
        tracing::info!(game = %name, participant = %id, "joined game");
        Ok(())
    }

    async fn seat(handle: &SessionHandle, name: &str, player: Player) -> Result<(), DirectoryError> {
        if !handle.get_info().await?.state.is_joinable() {
            return Err(DirectoryError::NotJoinable(name.to_string()));
        }
        handle.join(player).await?;
        Ok(())
    }

    /// Leaves the current game. Returns its name.
    ///
    /// The admin leaving a game that has not started deletes it.
    pub async fn leave_game(&self, participant: ParticipantId) -> Result<String, DirectoryError> {
        let (name, handle) = self.current(participant)?;
        let info = handle.get_info().await?;

        if info.state.is_joinable() && info.admin == participant {
            self.notify(&info, participant, format!("The admin left, {name} is cancelled."));
            self.delete_game(&name).await?;
            return Ok(name);
        }

        handle.leave(participant).await?;
        self.lobby().forget(participant, &name);
        let info = handle.get_info().await?;
        self.reconcile(&info).await;
        Ok(name)
    }

    /// Removes `participant` from the game `admin` runs.
    pub async fn kick(
        &self,
        admin: ParticipantId,
        participant: ParticipantId,
    ) -> Result<(), DirectoryError> {
        let (name, handle) = self.current(admin)?;
        if admin == participant {
            return Err(DirectoryError::CannotKickSelf);
        }
        if self.game_of(participant).as_deref() != Some(name.as_str()) {
            return Err(DirectoryError::NotInGame(participant));
        }
        let info = handle.get_info().await?;
        if info.admin != admin {
            return Err(DirectoryError::NotAdmin(name));
        }

        handle.leave(participant).await?;
        self.lobby().forget(participant, &name);
        self.tell(participant, format!("You were kicked out of {name}."));
        tracing::info!(game = %name, %admin, %participant, "player kicked");

        let info = handle.get_info().await?;
        self.reconcile(&info).await;
        Ok(())
    }

    pub async fn set_admin(
        &self,
        admin: ParticipantId,
        participant: ParticipantId,
    ) -> Result<(), DirectoryError> {
        let (name, handle) = self.current(admin)?;
        let info = handle.get_info().await?;
        if info.admin != admin {
            return Err(DirectoryError::NotAdmin(name));
        }
        handle.set_admin(participant).await?;
        self.tell(participant, format!("You are now the admin of {name}."));
        Ok(())
    }

    /// Launches the game `admin` runs.
    pub async fn start_game(&self, admin: ParticipantId) -> Result<String, DirectoryError> {
        let (name, handle) = self.current(admin)?;
        let info = handle.get_info().await?;
        if info.admin != admin {
            return Err(DirectoryError::NotAdmin(name));
        }
        handle.launch().await?;
        tracing::info!(game = %name, "game started");
        Ok(name)
    }

    /// Shuts a game down and forgets its members.
    pub async fn delete_game(&self, name: &str) -> Result<(), DirectoryError> {
        let handle = {
            let mut lobby = self.lobby();
            let handle = lobby
                .games
                .remove(name)
                .ok_or_else(|| DirectoryError::NotFound(name.to_string()))?;
            lobby.memberships.retain(|_, game| game != name);
            handle
        };
        let _ = handle.shutdown().await;
        tracing::info!(game = %name, "game deleted");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Routing
    // -----------------------------------------------------------------------

    /// Hands a chat line to the participant's game.
    pub async fn route_message(
        &self,
        participant: ParticipantId,
        content: &str,
    ) -> Result<(), DirectoryError> {
        let (_, handle) = self.current(participant)?;
        let info = handle.send_message(participant, content).await?;
        self.reconcile(&info).await;
        Ok(())
    }

    /// Brings the membership index in line with a session snapshot.
    ///
    /// Members gone from the roster are forgotten. An empty game is deleted.
    pub async fn reconcile(&self, info: &SessionInfo) {
        let emptied = {
            let mut lobby = self.lobby();
            lobby
                .memberships
                .retain(|id, game| *game != info.name || info.has_player(*id));
            info.players.is_empty() && lobby.games.contains_key(&info.name)
        };
        if emptied {
            tracing::debug!(game = %info.name, "last player gone");
            let _ = self.delete_game(&info.name).await;
        }
    }

    // -----------------------------------------------------------------------
    // Listings
    // -----------------------------------------------------------------------

    /// Games that can still be joined. Unresponsive sessions are skipped.
    pub async fn list_open_games(&self) -> Vec<GameListing> {
        let handles: Vec<SessionHandle> = self.lobby().games.values().cloned().collect();
        let mut listings = Vec::new();
        for handle in handles {
            if let Ok(info) = handle.get_info().await {
                if info.state.is_joinable() {
                    listings.push(GameListing {
                        name: info.name,
                        player_count: info.players.len(),
                        min_players: self.rules.min_players,
                    });
                }
            }
        }
        listings.sort_by(|a, b| a.name.cmp(&b.name));
        listings
    }

    pub async fn members(&self, name: &str) -> Result<Vec<Player>, DirectoryError> {
        let handle = self.lobby().handle(name)?;
        Ok(handle.get_info().await?.players)
    }

    // -----------------------------------------------------------------------
    // Notices
    // -----------------------------------------------------------------------

    fn tell(&self, participant: ParticipantId, text: String) {
        if let Err(e) = self.messenger.send_direct(participant, Outbound::info(text)) {
            tracing::warn!(%participant, error = %e, "delivery failed");
        }
    }

    fn notify(&self, info: &SessionInfo, except: ParticipantId, text: String) {
        for player in info.players.iter().filter(|p| p.id != except) {
            self.tell(player.id, text.clone());
        }
    }
}
