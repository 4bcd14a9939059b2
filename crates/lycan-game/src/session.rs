//! One game: its roster, its roles and the phases that drive it.
//!
//! A [`Session`] is plain data with async methods. It is not shared: the
//! session actor (see [`spawn_session`](crate::spawn_session)) owns it and
//! feeds it one message at a time, so every reaction (including the chain
//! of phases that end on their own) completes before the next one starts.

use std::sync::Arc;

use lycan_protocol::{ChannelId, Inbound, ParticipantId};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::sequence::StepSequence;
use crate::step::{Ctx, SessionRequest};
use crate::throttle::Throttle;
use crate::{GameError, Messenger, Player, RoleRegistry, RulesConfig, SessionState, StoryBook};

/// Everything a session is created with besides its name and admin.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub rules: RulesConfig,
    pub story: Arc<StoryBook>,
    /// Fixed seed for role deals and narration picks. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Where the game was created. Start and outcome are also posted there.
    pub home_channel: Option<ChannelId>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            rules: RulesConfig::default(),
            story: Arc::new(StoryBook::default()),
            seed: None,
            home_channel: None,
        }
    }
}

pub struct Session {
    name: String,
    /// Lobby view of the players. Outlives a single game.
    roster: Vec<Player>,
    admin: ParticipantId,
    state: SessionState,
    registry: RoleRegistry,
    steps: StepSequence,
    rng: StdRng,
    throttle: Throttle,
    messenger: Arc<dyn Messenger>,
    story: Arc<StoryBook>,
    rules: RulesConfig,
    home_channel: Option<ChannelId>,
}

impl Session {
    pub fn new(
        name: impl Into<String>,
        admin: Player,
        messenger: Arc<dyn Messenger>,
        options: SessionOptions,
    ) -> Self {
        let name = name.into();
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let rules = options.rules.validated();
        Self {
            registry: RoleRegistry::new(name.clone()),
            name,
            admin: admin.id,
            roster: vec![admin],
            state: SessionState::Pending,
            steps: StepSequence::new(),
            rng,
            throttle: Throttle::new(rules.advance_interval),
            messenger,
            story: options.story,
            rules,
            home_channel: options.home_channel,
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn players(&self) -> &[Player] {
        &self.roster
    }

    pub fn admin(&self) -> ParticipantId {
        self.admin
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn is_ended(&self) -> bool {
        self.state == SessionState::Ended
    }

    /// Name of the current phase, once the game is launched.
    pub fn current_phase(&self) -> Option<&'static str> {
        self.state
            .is_launched()
            .then(|| self.steps.current_name())
    }

    fn has_player(&self, participant: ParticipantId) -> bool {
        self.roster.iter().any(|p| p.id == participant)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Deals roles to the roster and runs the first phases.
    ///
    /// Works from `Pending` and, to play again, from `Ended`.
    pub async fn launch(&mut self) -> Result<(), GameError> {
        if !self.state.can_transition_to(SessionState::Active) {
            return Err(GameError::InvalidState(format!(
                "{} is already running",
                self.name
            )));
        }
        let need = self.rules.min_players;
        if self.roster.len() < need {
            return Err(GameError::NotEnoughPlayers {
                have: self.roster.len(),
                need,
            });
        }

        let mut registry = RoleRegistry::new(self.name.clone());
        registry.build(&self.roster, self.admin, &self.rules, &mut self.rng);
        self.registry = registry;
        self.steps = StepSequence::new();
        self.state = SessionState::Active;
        tracing::info!(game = %self.name, players = self.roster.len(), "session launched");

        let ((), requests) = self.with_ctx(|steps, ctx| steps.start(ctx));
        self.apply(requests);
        self.drain().await;
        Ok(())
    }

    /// Handles one line from `participant`: a command or chat.
    pub async fn react(&mut self, participant: ParticipantId, content: &str) -> Result<(), GameError> {
        if !self.state.is_launched() {
            return Err(GameError::InvalidState(format!(
                "{} has not started yet",
                self.name
            )));
        }
        if self.registry.by_participant(participant).is_none() {
            return Err(GameError::UnknownParticipant(participant));
        }

        let inbound = Inbound::parse(content, self.rules.command_prefix);
        let ((), requests) = self.with_ctx(|steps, ctx| match &inbound {
            Inbound::Command { name, args } => steps.current().handle(participant, name, args, ctx),
            Inbound::Chat(text) => steps.current().chat(participant, text, ctx),
        });
        self.settle(requests).await
    }

    /// Adds someone to the roster.
    ///
    /// In a running game every role is dealt again, nicknames kept, and
    /// everyone is told their (possibly new) role.
    pub fn add_player(&mut self, player: Player) -> Result<(), GameError> {
        if self.has_player(player.id) {
            return Err(GameError::AlreadyJoined(player.id));
        }
        tracing::info!(game = %self.name, participant = %player.id, name = %player.name, "player joined");
        self.roster.push(player.clone());
        if !self.state.is_launched() {
            return Ok(());
        }

        self.registry.add_player(player.clone(), &self.rules, &mut self.rng);
        let ((), requests) = self.with_ctx(|_, ctx| {
            let everyone = ctx.registry.everyone();
            let nickname = ctx.nickname(player.id);
            ctx.info_all(
                &everyone,
                format!("{nickname} joins the game. The roles have been dealt again."),
            );
            let seats: Vec<_> = ctx
                .registry
                .iter()
                .map(|r| (r.participant, r.tag()))
                .collect();
            for (participant, tag) in seats {
                ctx.narrate_to(participant, tag.chapter(), "tell_role", &[]);
            }
        });
        self.apply(requests);
        Ok(())
    }

    /// Removes someone, as if they had typed `quit`.
    pub async fn remove_player(&mut self, participant: ParticipantId) -> Result<(), GameError> {
        if !self.has_player(participant) {
            return Err(GameError::UnknownParticipant(participant));
        }
        if !self.state.is_launched() || self.registry.by_participant(participant).is_none() {
            self.forget(participant);
            return Ok(());
        }

        let ((), requests) =
            self.with_ctx(|steps, ctx| steps.current().remove_player(participant, ctx));
        self.settle(requests).await
    }

    pub fn set_admin(&mut self, participant: ParticipantId) -> Result<(), GameError> {
        if !self.has_player(participant) {
            return Err(GameError::UnknownParticipant(participant));
        }
        if self.state.is_launched() {
            self.registry
                .set_admin(participant)
                .map_err(|_| GameError::UnknownParticipant(participant))?;
        }
        self.admin = participant;
        tracing::info!(game = %self.name, %participant, "admin changed");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Runs `f` with a phase context over this session.
    fn with_ctx<T>(
        &mut self,
        f: impl FnOnce(&mut StepSequence, &mut Ctx<'_>) -> T,
    ) -> (T, Vec<SessionRequest>) {
        let mut requests = Vec::new();
        let Self {
            registry,
            steps,
            story,
            messenger,
            rules,
            rng,
            roster,
            home_channel,
            ..
        } = self;
        let out = {
            let mut ctx = Ctx {
                registry,
                story: story.as_ref(),
                messenger: messenger.as_ref(),
                rules,
                rng,
                requests: &mut requests,
                roster: roster.as_slice(),
                home_channel: home_channel.as_ref(),
            };
            f(steps, &mut ctx)
        };
        (out, requests)
    }

    /// Applies what the phase asked for. Returns `true` on a relaunch request.
    fn apply(&mut self, requests: Vec<SessionRequest>) -> bool {
        let mut relaunch = false;
        let mut removed = false;
        for request in requests {
            match request {
                SessionRequest::RemovePlayer(participant) => {
                    self.roster.retain(|p| p.id != participant);
                    removed = true;
                }
                SessionRequest::SetAdmin(participant) => self.admin = participant,
                SessionRequest::Relaunch => relaunch = true,
            }
        }

        // Someone leaving may have decided the game.
        if removed && !self.steps.is_over() && self.registry.outcome().is_some() {
            self.steps.current().close();
        }
        relaunch
    }

    async fn settle(&mut self, requests: Vec<SessionRequest>) -> Result<(), GameError> {
        if self.apply(requests) {
            return self.launch().await;
        }
        self.drain().await;
        Ok(())
    }

    /// Pre-launch removal: the roster only.
    fn forget(&mut self, participant: ParticipantId) {
        self.roster.retain(|p| p.id != participant);
        if self.admin == participant {
            if let Some(heir) = self.roster.first() {
                self.admin = heir.id;
            }
        }
        tracing::info!(game = %self.name, %participant, "player left");
    }

    /// Advances past every ended phase, pacing each step.
    async fn drain(&mut self) {
        loop {
            if self.steps.is_over() {
                if self.state == SessionState::Active {
                    self.state = SessionState::Ended;
                    tracing::info!(game = %self.name, "session ended");
                }
                break;
            }
            if !self.steps.current().is_ended() {
                break;
            }
            self.throttle.pace().await;
            let ((), requests) = self.with_ctx(|steps, ctx| steps.advance(ctx));
            self.apply(requests);
        }
    }
}
