//! Everything a phase can touch while it runs.

use lycan_protocol::{ChannelId, Outbound, ParticipantId};
use rand::rngs::StdRng;

use super::with_prefix;
use crate::{
    CommandError, Death, Messenger, Player, RoleGroup, RoleRegistry, RulesConfig, StoryBook,
    StoryError,
};

/// Something only the session can do, queued by a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionRequest {
    /// Drop a participant from the roster after a quit or kick.
    RemovePlayer(ParticipantId),
    /// Mirror an admin change made inside the game.
    SetAdmin(ParticipantId),
    /// Deal new roles and start again from the first phase.
    Relaunch,
}

/// Borrowed view of one session, handed to phases.
pub(crate) struct Ctx<'a> {
    pub(crate) registry: &'a mut RoleRegistry,
    pub(crate) story: &'a StoryBook,
    pub(crate) messenger: &'a dyn Messenger,
    pub(crate) rules: &'a RulesConfig,
    pub(crate) rng: &'a mut StdRng,
    pub(crate) requests: &'a mut Vec<SessionRequest>,
    pub(crate) roster: &'a [Player],
    pub(crate) home_channel: Option<&'a ChannelId>,
}

impl Ctx<'_> {
    pub(crate) fn prefix(&self) -> char {
        self.rules.command_prefix
    }

    /// Display name of `participant` as the lobby knows it.
    pub(crate) fn display_name(&self, participant: ParticipantId) -> String {
        self.roster
            .iter()
            .find(|p| p.id == participant)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| participant.to_string())
    }

    /// Nickname of `participant`, or its id once the role is gone.
    pub(crate) fn nickname(&self, participant: ParticipantId) -> String {
        self.registry
            .nickname_of(participant)
            .map(str::to_string)
            .unwrap_or_else(|| participant.to_string())
    }

    // -----------------------------------------------------------------------
    // Narration
    // -----------------------------------------------------------------------

    /// Renders one story line, with `*` turned into the command prefix.
    pub(crate) fn line(
        &mut self,
        chapter: &str,
        page: &str,
        values: &[(&str, &str)],
    ) -> Result<String, StoryError> {
        let prefix = self.prefix();
        self.story
            .render(&mut *self.rng, chapter, page, values)
            .map(|text| with_prefix(&text, prefix))
    }

    /// Renders one line and sends the same text to every member of `to`.
    ///
    /// A broken story page is logged and skipped; the game goes on.
    pub(crate) fn narrate(
        &mut self,
        to: &RoleGroup,
        chapter: &str,
        page: &str,
        values: &[(&str, &str)],
    ) {
        match self.line(chapter, page, values) {
            Ok(text) => to.send(self.messenger, &Outbound::narration(text)),
            Err(e) => tracing::error!(error = %e, "narration skipped"),
        }
    }

    pub(crate) fn narrate_to(
        &mut self,
        to: ParticipantId,
        chapter: &str,
        page: &str,
        values: &[(&str, &str)],
    ) {
        self.narrate(&RoleGroup::new([to]), chapter, page, values);
    }

    /// Narrates to the channel the game was created in, if any.
    pub(crate) fn narrate_home(&mut self, chapter: &str, page: &str, values: &[(&str, &str)]) {
        let Some(channel) = self.home_channel else {
            return;
        };
        match self.line(chapter, page, values) {
            Ok(text) => {
                if let Err(e) = self
                    .messenger
                    .send_to_channel(channel, Outbound::narration(text))
                {
                    tracing::warn!(channel = %channel, error = %e, "home channel unreachable");
                }
            }
            Err(e) => tracing::error!(error = %e, "narration skipped"),
        }
    }

    // -----------------------------------------------------------------------
    // Plain messages
    // -----------------------------------------------------------------------

    pub(crate) fn tell(&self, to: ParticipantId, message: Outbound) {
        if let Err(e) = self.messenger.send_direct(to, message) {
            tracing::warn!(participant = %to, error = %e, "delivery failed");
        }
    }

    pub(crate) fn info(&self, to: ParticipantId, text: impl Into<String>) {
        self.tell(to, Outbound::info(text));
    }

    pub(crate) fn info_all(&self, to: &RoleGroup, text: impl Into<String>) {
        to.send(self.messenger, &Outbound::info(text));
    }

    pub(crate) fn listing(&self, to: ParticipantId, text: impl Into<String>) {
        self.tell(to, Outbound::listing(text));
    }

    pub(crate) fn reject(&self, to: ParticipantId, error: &CommandError) {
        self.tell(to, Outbound::rejection(error.to_string()));
    }

    /// Relays chat from `from` to `to`, signed with the author's nickname.
    pub(crate) fn relay(&self, from: ParticipantId, to: &RoleGroup, text: &str) {
        to.send(self.messenger, &Outbound::relay(self.nickname(from), text));
    }

    // -----------------------------------------------------------------------
    // Deaths
    // -----------------------------------------------------------------------

    /// Kills `nickname` and narrates any lover dying of grief.
    pub(crate) fn kill(&mut self, nickname: &str) -> Vec<Death> {
        let deaths = self.registry.kill(nickname);
        self.mourn(&deaths);
        deaths
    }

    /// Turns every injury into a death, narrating grief deaths.
    pub(crate) fn kill_injured(&mut self) -> Vec<Death> {
        let deaths = self.registry.kill_injured();
        self.mourn(&deaths);
        deaths
    }

    fn mourn(&mut self, deaths: &[Death]) {
        let everyone = self.registry.everyone();
        for death in deaths {
            let Some(lover) = &death.grief_for else {
                continue;
            };
            let role = death.tag.to_string();
            self.narrate(
                &everyone,
                "lovemaker",
                "death_by_love",
                &[
                    ("lover", lover.as_str()),
                    ("player", death.nickname.as_str()),
                    ("role", role.as_str()),
                ],
            );
        }
    }
}
