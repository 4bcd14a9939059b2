//! The role registry: every role of one session.
//!
//! Owns role assignment, the nickname ↔ participant mapping, the admin,
//! the love-pact death cascade and the pure win-condition check. It never
//! sends anything: operations with narrative consequences (like
//! [`kill`](RoleRegistry::kill)) return what happened and the caller
//! narrates it.

use std::collections::HashMap;

use lycan_protocol::ParticipantId;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::{CommandError, Faction, Role, RoleGroup, RoleTag, RulesConfig};

/// A participant as the lobby knows them: identity plus display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: ParticipantId,
    pub name: String,
}

impl Player {
    pub fn new(id: ParticipantId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Someone who just died.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Death {
    pub participant: ParticipantId,
    pub nickname: String,
    pub tag: RoleTag,
    /// Set when this death is the grief of the named lover.
    pub grief_for: Option<String>,
}

/// How a game ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The two last players are lovers from opposite factions.
    Lovers { first: String, second: String },
    Villagers,
    Werewolves,
    /// Nobody is left alive.
    Draw,
}

/// All roles of one session, keyed by nickname.
#[derive(Debug, Clone)]
pub struct RoleRegistry {
    game_name: String,
    admin: Option<ParticipantId>,
    /// Deal order. Nicknames are unique.
    roles: Vec<Role>,
}

impl RoleRegistry {
    pub fn new(game_name: impl Into<String>) -> Self {
        Self {
            game_name: game_name.into(),
            admin: None,
            roles: Vec::new(),
        }
    }

    pub fn game_name(&self) -> &str {
        &self.game_name
    }

    // -----------------------------------------------------------------------
    // Building
    // -----------------------------------------------------------------------

    /// Shuffles `players` and deals a fresh role to each one.
    ///
    /// The first `players / werewolf_divisor + 1` become werewolves, then
    /// each special role of the ruleset is dealt once, in priority order,
    /// while players remain. Everyone else is a villager. Nicknames start
    /// as display names; two players sharing a display name get the fuller
    /// `name#id` form.
    pub fn build<R: Rng + ?Sized>(
        &mut self,
        players: &[Player],
        admin: ParticipantId,
        rules: &RulesConfig,
        rng: &mut R,
    ) {
        self.deal(players.to_vec(), admin, rules, rng, &HashMap::new());
    }

    /// Adds a player to a running game.
    ///
    /// Nicknames are kept, but the whole role set is dealt again, so
    /// everyone may end up with a different role (and fresh resources).
    pub fn add_player<R: Rng + ?Sized>(&mut self, player: Player, rules: &RulesConfig, rng: &mut R) {
        let nicknames: HashMap<ParticipantId, String> = self
            .roles
            .iter()
            .map(|r| (r.participant, r.nickname.clone()))
            .collect();
        let mut players: Vec<Player> = self
            .roles
            .iter()
            .map(|r| Player::new(r.participant, r.nickname.clone()))
            .collect();
        players.push(player);

        let admin = self.admin.unwrap_or(players[0].id);
        self.deal(players, admin, rules, rng, &nicknames);
    }

    fn deal<R: Rng + ?Sized>(
        &mut self,
        mut players: Vec<Player>,
        admin: ParticipantId,
        rules: &RulesConfig,
        rng: &mut R,
        nicknames: &HashMap<ParticipantId, String>,
    ) {
        players.shuffle(rng);

        let werewolves = rules.werewolf_count(players.len());
        let tags = std::iter::repeat_n(RoleTag::Werewolf, werewolves)
            .chain(rules.special_roles.iter().copied())
            .chain(std::iter::repeat(RoleTag::Villager));

        self.roles.clear();
        self.admin = Some(admin);

        // Kept nicknames are reserved before anyone falls back to a display name.
        let mut taken: Vec<String> = players
            .iter()
            .filter_map(|p| nicknames.get(&p.id).cloned())
            .collect();

        for (player, tag) in players.iter().zip(tags) {
            let nickname = match nicknames.get(&player.id) {
                Some(kept) => kept.clone(),
                None => {
                    let nickname = unique_nickname(player, &taken);
                    taken.push(nickname.clone());
                    nickname
                }
            };
            self.roles.push(Role::new(player.id, nickname, tag));
        }

        tracing::debug!(
            game = %self.game_name,
            players = self.roles.len(),
            werewolves,
            "roles dealt"
        );
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Role> {
        self.roles.iter()
    }

    pub fn get(&self, nickname: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.nickname == nickname)
    }

    pub fn get_mut(&mut self, nickname: &str) -> Option<&mut Role> {
        self.roles.iter_mut().find(|r| r.nickname == nickname)
    }

    pub fn by_participant(&self, participant: ParticipantId) -> Option<&Role> {
        self.roles.iter().find(|r| r.participant == participant)
    }

    pub fn by_participant_mut(&mut self, participant: ParticipantId) -> Option<&mut Role> {
        self.roles.iter_mut().find(|r| r.participant == participant)
    }

    pub fn nickname_of(&self, participant: ParticipantId) -> Option<&str> {
        self.by_participant(participant).map(|r| r.nickname.as_str())
    }

    /// The first role of kind `tag`, dead or alive.
    pub fn find_by_tag(&self, tag: RoleTag) -> Option<&Role> {
        self.roles.iter().find(|r| r.tag() == tag)
    }

    pub fn find_by_tag_mut(&mut self, tag: RoleTag) -> Option<&mut Role> {
        self.roles.iter_mut().find(|r| r.tag() == tag)
    }

    /// The role of kind `tag` if it exists and is alive.
    pub fn alive_with_tag(&self, tag: RoleTag) -> Option<&Role> {
        self.find_by_tag(tag).filter(|r| r.alive)
    }

    pub fn has_role(&self, tag: RoleTag) -> bool {
        self.find_by_tag(tag).is_some()
    }

    /// Validates a command target.
    ///
    /// With `require_injured` false the target must be alive and unhurt;
    /// with it true the target must be alive and injured.
    pub fn check_has_player(
        &self,
        nickname: &str,
        require_injured: bool,
    ) -> Result<&Role, CommandError> {
        let role = self
            .get(nickname)
            .ok_or_else(|| CommandError::NoSuchPlayer(nickname.to_string()))?;
        if !role.alive {
            return Err(CommandError::DeadPlayer(nickname.to_string()));
        }
        match (require_injured, role.injured) {
            (true, false) => Err(CommandError::AlivePlayer(nickname.to_string())),
            (false, true) => Err(CommandError::WoundedPlayer(nickname.to_string())),
            _ => Ok(role),
        }
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    fn group_where(&self, keep: impl Fn(&Role) -> bool) -> RoleGroup {
        self.roles
            .iter()
            .filter(|r| keep(r))
            .map(|r| r.participant)
            .collect()
    }

    pub fn everyone(&self) -> RoleGroup {
        self.group_where(|_| true)
    }

    /// Players not yet dead. Injured players still count.
    pub fn alive_players(&self) -> RoleGroup {
        self.group_where(|r| r.alive)
    }

    pub fn dead_players(&self) -> RoleGroup {
        self.group_where(|r| !r.alive)
    }

    /// Alive players marked to die at the next resolution.
    pub fn injured_players(&self) -> RoleGroup {
        self.group_where(|r| r.alive && r.injured)
    }

    /// Every non-werewolf, dead or alive.
    pub fn villagers(&self) -> RoleGroup {
        self.group_where(|r| r.faction() == Faction::Village)
    }

    /// Every werewolf, dead or alive.
    pub fn werewolves(&self) -> RoleGroup {
        self.group_where(|r| r.faction() == Faction::Werewolves)
    }

    /// `group` narrowed to its alive members.
    pub fn only_alive(&self, group: &RoleGroup) -> RoleGroup {
        group
            .iter()
            .filter(|id| self.by_participant(*id).is_some_and(|r| r.alive))
            .collect()
    }

    /// Alive player count per faction.
    pub fn alive_by_faction(&self) -> HashMap<Faction, usize> {
        let mut counts = HashMap::new();
        for role in self.roles.iter().filter(|r| r.alive) {
            *counts.entry(role.faction()).or_insert(0) += 1;
        }
        counts
    }

    /// `- nickname: role` lines for the final reveal.
    pub fn summary(&self) -> String {
        self.roles
            .iter()
            .map(|r| format!("- {}: {}", r.nickname, r.tag()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    // -----------------------------------------------------------------------
    // Admin & nicknames
    // -----------------------------------------------------------------------

    pub fn admin(&self) -> Option<ParticipantId> {
        self.admin
    }

    pub fn is_admin(&self, participant: ParticipantId) -> bool {
        self.admin == Some(participant)
    }

    pub fn check_is_admin(&self, participant: ParticipantId) -> Result<(), CommandError> {
        if self.is_admin(participant) {
            Ok(())
        } else {
            Err(CommandError::Permission(format!(
                "only the admin of {} can do that",
                self.game_name
            )))
        }
    }

    /// Hands the admin role to `participant`, who must own a role.
    pub fn set_admin(&mut self, participant: ParticipantId) -> Result<(), CommandError> {
        if self.by_participant(participant).is_none() {
            return Err(CommandError::Belonging(format!(
                "{participant} is not playing in {}",
                self.game_name
            )));
        }
        self.admin = Some(participant);
        Ok(())
    }

    /// Checks that `nickname` is usable: alphanumeric, no longer than
    /// `max_len` characters, and not already taken.
    pub fn validate_nickname(&self, nickname: &str, max_len: usize) -> Result<(), CommandError> {
        if !is_valid_nickname(nickname, max_len) {
            return Err(CommandError::GameRule(format!(
                "{nickname} is not a valid nickname: use at most {max_len} letters or digits, no spaces"
            )));
        }
        if self.get(nickname).is_some() {
            return Err(CommandError::Availability(format!(
                "the nickname {nickname} is already taken"
            )));
        }
        Ok(())
    }

    pub fn change_nickname(
        &mut self,
        participant: ParticipantId,
        new: &str,
        max_len: usize,
    ) -> Result<(), CommandError> {
        let keeps_own = self.get(new).is_some_and(|r| r.participant == participant);
        if !keeps_own {
            self.validate_nickname(new, max_len)?;
        }
        let role = self.by_participant_mut(participant).ok_or_else(|| {
            CommandError::Belonging(format!("{participant} is not playing in this game"))
        })?;
        role.nickname = new.to_string();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Life and death
    // -----------------------------------------------------------------------

    pub fn wound(&mut self, nickname: &str) {
        if let Some(role) = self.get_mut(nickname) {
            role.injured = true;
        }
    }

    pub fn heal(&mut self, nickname: &str) {
        if let Some(role) = self.get_mut(nickname) {
            role.injured = false;
        }
    }

    pub fn protect(&mut self, nickname: &str) {
        if let Some(role) = self.get_mut(nickname) {
            role.protected = true;
        }
    }

    pub fn clear_protection(&mut self) {
        for role in &mut self.roles {
            role.protected = false;
        }
    }

    /// Makes two players love each other, breaking any previous pacts.
    pub fn bind_lovers(&mut self, first: ParticipantId, second: ParticipantId) {
        for role in &mut self.roles {
            if role.participant == first {
                role.loving = Some(second);
            } else if role.participant == second {
                role.loving = Some(first);
            } else if role.loving == Some(first) || role.loving == Some(second) {
                role.loving = None;
            }
        }
    }

    /// Kills `nickname` now.
    ///
    /// If the victim loved someone who is alive and not already injured,
    /// the lover dies of grief right after. The cascade stops there: a
    /// grief death never triggers another. Killing a dead or unknown
    /// player does nothing.
    pub fn kill(&mut self, nickname: &str) -> Vec<Death> {
        let mut deaths = Vec::new();
        self.kill_cascading(nickname, None, &mut deaths);
        deaths
    }

    fn kill_cascading(&mut self, nickname: &str, from_lover: Option<&str>, deaths: &mut Vec<Death>) {
        let Some(role) = self.get_mut(nickname).filter(|r| r.alive) else {
            return;
        };
        role.alive = false;
        role.injured = true;
        let lover = role.loving;
        deaths.push(Death {
            participant: role.participant,
            nickname: role.nickname.clone(),
            tag: role.tag(),
            grief_for: from_lover.map(str::to_string),
        });

        if from_lover.is_some() {
            return;
        }
        let grieving = lover
            .and_then(|id| self.by_participant(id))
            .filter(|l| l.alive && !l.injured)
            .map(|l| l.nickname.clone());
        if let Some(grieving) = grieving {
            self.kill_cascading(&grieving, Some(nickname), deaths);
        }
    }

    /// Turns every injury into a death.
    pub fn kill_injured(&mut self) -> Vec<Death> {
        let injured: Vec<String> = self
            .roles
            .iter()
            .filter(|r| r.alive && r.injured)
            .map(|r| r.nickname.clone())
            .collect();
        injured.iter().flat_map(|nick| self.kill(nick)).collect()
    }

    /// Removes a player's role entirely (quit or kick).
    ///
    /// A lover left behind is no longer bound to anyone.
    pub fn remove(&mut self, participant: ParticipantId) -> Option<Role> {
        let index = self.roles.iter().position(|r| r.participant == participant)?;
        let role = self.roles.remove(index);
        for other in &mut self.roles {
            if other.loving == Some(participant) {
                other.loving = None;
            }
        }
        Some(role)
    }

    // -----------------------------------------------------------------------
    // Win condition
    // -----------------------------------------------------------------------

    /// Returns how the game ended, or `None` while it goes on.
    ///
    /// Pure: takes one snapshot of the alive set and compares it, in
    /// order, against nobody, a pair of opposite-faction lovers, the alive
    /// villagers and the alive werewolves.
    pub fn outcome(&self) -> Option<Outcome> {
        let alive: Vec<&Role> = self.roles.iter().filter(|r| r.alive).collect();
        if alive.is_empty() {
            return Some(Outcome::Draw);
        }

        if let [first, second] = alive.as_slice() {
            if first.loving == Some(second.participant)
                && second.loving == Some(first.participant)
                && first.faction() != second.faction()
            {
                return Some(Outcome::Lovers {
                    first: first.nickname.clone(),
                    second: second.nickname.clone(),
                });
            }
        }

        let alive = self.alive_players();
        if alive == self.only_alive(&self.villagers()) {
            Some(Outcome::Villagers)
        } else if alive == self.only_alive(&self.werewolves()) {
            Some(Outcome::Werewolves)
        } else {
            None
        }
    }
}

pub(crate) fn is_valid_nickname(nickname: &str, max_len: usize) -> bool {
    !nickname.is_empty()
        && nickname.chars().count() <= max_len
        && nickname.chars().all(char::is_alphanumeric)
}

fn unique_nickname(player: &Player, taken: &[String]) -> String {
    if !taken.contains(&player.name) {
        return player.name.clone();
    }
    let fuller = format!("{}#{}", player.name, player.id.0);
    let mut candidate = fuller.clone();
    let mut n = 2;
    while taken.contains(&candidate) {
        candidate = format!("{fuller}-{n}");
        n += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RoleKind;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn players(names: &[&str]) -> Vec<Player> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| Player::new(ParticipantId(i as u64 + 1), *name))
            .collect()
    }

    fn registry(names: &[&str]) -> RoleRegistry {
        let mut registry = RoleRegistry::new("moonlit");
        let mut rng = StdRng::seed_from_u64(3);
        registry.build(&players(names), ParticipantId(1), &RulesConfig::default(), &mut rng);
        registry
    }

    fn count(registry: &RoleRegistry, tag: RoleTag) -> usize {
        registry.iter().filter(|r| r.tag() == tag).count()
    }

    /// Forces a role kind, for tests that need a precise table.
    fn set_tag(registry: &mut RoleRegistry, nickname: &str, tag: RoleTag) {
        registry.get_mut(nickname).unwrap().kind = RoleKind::new(tag);
    }

    // =======================================================================
    // build
    // =======================================================================

    #[test]
    fn test_build_deals_one_role_per_player() {
        for n in 4..=16 {
            let names: Vec<String> = (0..n).map(|i| format!("P{i}")).collect();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let registry = registry(&refs);

            assert_eq!(registry.len(), n);
            let werewolves = n / 5 + 1;
            assert_eq!(count(&registry, RoleTag::Werewolf), werewolves, "n = {n}");

            let specials = RulesConfig::default().special_roles;
            let dealt = specials.len().min(n - werewolves);
            for tag in &specials[..dealt] {
                assert_eq!(count(&registry, *tag), 1, "{tag} with n = {n}");
            }
            for tag in &specials[dealt..] {
                assert_eq!(count(&registry, *tag), 0, "{tag} with n = {n}");
            }
            assert_eq!(count(&registry, RoleTag::Villager), n - werewolves - dealt);
        }
    }

    #[test]
    fn test_build_four_players_gets_priority_specials() {
        let registry = registry(&["Alice", "Bob", "Carol", "Dave"]);
        assert_eq!(count(&registry, RoleTag::Werewolf), 1);
        assert!(registry.has_role(RoleTag::Seeker));
        assert!(registry.has_role(RoleTag::Witch));
        assert!(registry.has_role(RoleTag::LoveMaker));
        assert!(!registry.has_role(RoleTag::Hunter));
    }

    #[test]
    fn test_build_sets_admin_and_uses_display_names() {
        let registry = registry(&["Alice", "Bob", "Carol", "Dave"]);
        assert_eq!(registry.admin(), Some(ParticipantId(1)));
        assert_eq!(registry.nickname_of(ParticipantId(2)), Some("Bob"));
    }

    #[test]
    fn test_build_resolves_display_name_collisions() {
        let registry = registry(&["Sam", "Sam", "Carol", "Dave"]);
        let mut nicknames: Vec<&str> = registry.iter().map(|r| r.nickname.as_str()).collect();
        nicknames.sort();
        assert!(nicknames.contains(&"Sam"));
        assert!(nicknames.contains(&"Sam#1") || nicknames.contains(&"Sam#2"));
    }

    #[test]
    fn test_add_player_keeps_nicknames() {
        let mut registry = registry(&["Alice", "Bob", "Carol", "Dave"]);
        registry
            .change_nickname(ParticipantId(2), "Robert", 15)
            .unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        registry.add_player(
            Player::new(ParticipantId(5), "Eve"),
            &RulesConfig::default(),
            &mut rng,
        );

        assert_eq!(registry.len(), 5);
        assert_eq!(registry.nickname_of(ParticipantId(2)), Some("Robert"));
        assert_eq!(registry.nickname_of(ParticipantId(5)), Some("Eve"));
        assert_eq!(registry.admin(), Some(ParticipantId(1)));
        assert_eq!(count(&registry, RoleTag::Werewolf), 2);
    }

    // =======================================================================
    // check_has_player
    // =======================================================================

    #[test]
    fn test_check_has_player_four_way_classification() {
        let mut registry = registry(&["Alice", "Bob", "Carol", "Dave"]);
        registry.wound("Bob");
        registry.kill("Carol");

        assert!(matches!(
            registry.check_has_player("Zoe", false),
            Err(CommandError::NoSuchPlayer(_))
        ));
        assert!(matches!(
            registry.check_has_player("Carol", false),
            Err(CommandError::DeadPlayer(_))
        ));
        assert!(matches!(
            registry.check_has_player("Alice", true),
            Err(CommandError::AlivePlayer(_))
        ));
        assert!(matches!(
            registry.check_has_player("Bob", false),
            Err(CommandError::WoundedPlayer(_))
        ));
        assert!(registry.check_has_player("Alice", false).is_ok());
        assert!(registry.check_has_player("Bob", true).is_ok());
    }

    // =======================================================================
    // kill
    // =======================================================================

    #[test]
    fn test_kill_cascades_to_lover_once() {
        let mut registry = registry(&["Alice", "Bob", "Carol", "Dave"]);
        registry.bind_lovers(ParticipantId(1), ParticipantId(2));

        let deaths = registry.kill("Alice");

        assert_eq!(deaths.len(), 2);
        assert_eq!(deaths[0].nickname, "Alice");
        assert_eq!(deaths[0].grief_for, None);
        assert_eq!(deaths[1].nickname, "Bob");
        assert_eq!(deaths[1].grief_for.as_deref(), Some("Alice"));
        assert!(!registry.get("Bob").unwrap().alive);
    }

    #[test]
    fn test_kill_does_not_cascade_to_injured_lover() {
        let mut registry = registry(&["Alice", "Bob", "Carol", "Dave"]);
        registry.bind_lovers(ParticipantId(1), ParticipantId(2));
        registry.wound("Bob");

        let deaths = registry.kill("Alice");
        assert_eq!(deaths.len(), 1);
        assert!(registry.get("Bob").unwrap().alive);

        // Both injured lovers die at resolution, none of them of grief.
        let deaths = registry.kill_injured();
        assert_eq!(deaths.len(), 1);
        assert_eq!(deaths[0].grief_for, None);
    }

    #[test]
    fn test_kill_dead_or_unknown_player_is_a_no_op() {
        let mut registry = registry(&["Alice", "Bob", "Carol", "Dave"]);
        assert_eq!(registry.kill("Alice").len(), 1);
        assert!(registry.kill("Alice").is_empty());
        assert!(registry.kill("Nobody").is_empty());
    }

    #[test]
    fn test_remove_unbinds_the_lover() {
        let mut registry = registry(&["Alice", "Bob", "Carol", "Dave"]);
        registry.bind_lovers(ParticipantId(1), ParticipantId(2));
        registry.remove(ParticipantId(1));
        assert_eq!(registry.get("Bob").unwrap().loving, None);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_bind_lovers_breaks_previous_pacts() {
        let mut registry = registry(&["Alice", "Bob", "Carol", "Dave"]);
        registry.bind_lovers(ParticipantId(1), ParticipantId(2));
        registry.bind_lovers(ParticipantId(2), ParticipantId(3));
        assert_eq!(registry.get("Alice").unwrap().loving, None);
        assert_eq!(registry.get("Bob").unwrap().loving, Some(ParticipantId(3)));
        assert_eq!(registry.get("Carol").unwrap().loving, Some(ParticipantId(2)));
    }

    // =======================================================================
    // nicknames
    // =======================================================================

    #[test]
    fn test_nickname_validation() {
        let registry = registry(&["Alice", "Bob", "Carol", "Dave"]);
        assert!(registry.validate_nickname("Al1", 15).is_ok());
        assert!(registry.validate_nickname("a b", 15).is_err());
        assert!(registry.validate_nickname("abcdefghijklmnop", 15).is_err());
        assert!(registry.validate_nickname("abcdefghijklmno", 15).is_ok());
        assert!(registry.validate_nickname("", 15).is_err());
        assert!(matches!(
            registry.validate_nickname("Bob", 15),
            Err(CommandError::Availability(_))
        ));
    }

    #[test]
    fn test_keeping_your_own_nickname_is_allowed() {
        let mut registry = registry(&["Alice", "Bob", "Carol", "Dave"]);
        registry.change_nickname(ParticipantId(2), "Bob", 15).unwrap();
        assert_eq!(registry.nickname_of(ParticipantId(2)), Some("Bob"));

        assert!(matches!(
            registry.change_nickname(ParticipantId(2), "Carol", 15),
            Err(CommandError::Availability(_))
        ));
    }

    #[test]
    fn test_set_admin_requires_a_player() {
        let mut registry = registry(&["Alice", "Bob", "Carol", "Dave"]);
        assert!(registry.set_admin(ParticipantId(42)).is_err());
        registry.set_admin(ParticipantId(3)).unwrap();
        assert!(registry.check_is_admin(ParticipantId(3)).is_ok());
        assert!(matches!(
            registry.check_is_admin(ParticipantId(1)),
            Err(CommandError::Permission(_))
        ));
    }

    // =======================================================================
    // outcome
    // =======================================================================

    fn table() -> RoleRegistry {
        let mut registry = registry(&["Alice", "Bob", "Carol", "Dave"]);
        set_tag(&mut registry, "Alice", RoleTag::Werewolf);
        set_tag(&mut registry, "Bob", RoleTag::Villager);
        set_tag(&mut registry, "Carol", RoleTag::Seeker);
        set_tag(&mut registry, "Dave", RoleTag::Werewolf);
        registry
    }

    #[test]
    fn test_outcome_none_while_both_factions_live() {
        assert_eq!(table().outcome(), None);
    }

    #[test]
    fn test_outcome_villagers() {
        let mut registry = table();
        registry.kill("Alice");
        registry.kill("Dave");
        assert_eq!(registry.outcome(), Some(Outcome::Villagers));
    }

    #[test]
    fn test_outcome_werewolves() {
        let mut registry = table();
        registry.kill("Bob");
        registry.kill("Carol");
        assert_eq!(registry.outcome(), Some(Outcome::Werewolves));
    }

    #[test]
    fn test_outcome_lovers_of_opposite_factions() {
        let mut registry = table();
        registry.bind_lovers(ParticipantId(1), ParticipantId(2));
        registry.kill("Carol");
        registry.kill("Dave");
        assert_eq!(
            registry.outcome(),
            Some(Outcome::Lovers {
                first: "Alice".into(),
                second: "Bob".into()
            })
        );
    }

    #[test]
    fn test_outcome_draw_when_nobody_is_left() {
        let mut registry = table();
        for nick in ["Alice", "Bob", "Carol", "Dave"] {
            registry.kill(nick);
        }
        assert_eq!(registry.outcome(), Some(Outcome::Draw));
    }

    #[test]
    fn test_alive_by_faction() {
        let mut registry = table();
        registry.kill("Dave");
        let counts = registry.alive_by_faction();
        assert_eq!(counts[&Faction::Village], 2);
        assert_eq!(counts[&Faction::Werewolves], 1);
    }
}
