//! A player's secret game identity.
//!
//! [`RoleTag`] is the plain kind (what the seeker sees, what a phase
//! filters on). [`RoleKind`] is the same set carrying the per-role
//! resources: potions, the seeker's notebook, the hunter's shot.

use std::fmt;

use lycan_protocol::ParticipantId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoleTag / Faction
// ---------------------------------------------------------------------------

/// Which side a role wins with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    Village,
    Werewolves,
}

/// The kind of a role, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleTag {
    Villager,
    Werewolf,
    Seeker,
    Witch,
    Hunter,
    LoveMaker,
    Guard,
    Idiot,
    LittleGirl,
}

impl RoleTag {
    pub fn faction(self) -> Faction {
        match self {
            Self::Werewolf => Faction::Werewolves,
            _ => Faction::Village,
        }
    }

    /// Single-instance roles, the ones a ruleset can list.
    pub fn is_special(self) -> bool {
        !matches!(self, Self::Villager | Self::Werewolf)
    }

    /// Story chapter holding this role's lines.
    pub fn chapter(self) -> &'static str {
        match self {
            Self::Villager => "villager",
            Self::Werewolf => "werewolf",
            Self::Seeker => "seeker",
            Self::Witch => "witch",
            Self::Hunter => "hunter",
            Self::LoveMaker => "lovemaker",
            Self::Guard => "guard",
            Self::Idiot => "idiot",
            Self::LittleGirl => "little_girl",
        }
    }
}

impl fmt::Display for RoleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Villager => "villager",
            Self::Werewolf => "werewolf",
            Self::Seeker => "seeker",
            Self::Witch => "witch",
            Self::Hunter => "hunter",
            Self::LoveMaker => "love maker",
            Self::Guard => "guard",
            Self::Idiot => "village idiot",
            Self::LittleGirl => "little girl",
        })
    }
}

// ---------------------------------------------------------------------------
// RoleKind
// ---------------------------------------------------------------------------

/// A role kind together with its resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleKind {
    Villager,
    Werewolf,
    /// `seen` remembers every inspection, in order.
    Seeker { seen: Vec<(String, RoleTag)> },
    Witch {
        death_potions: u8,
        resurrect_potions: u8,
    },
    /// `fired` once the last shot was taken or declined.
    Hunter { fired: bool },
    LoveMaker,
    /// The player protected last night, who cannot be protected tonight.
    Guard { protecting: Option<ParticipantId> },
    /// A revealed idiot survived a vote and lost the right to vote.
    Idiot { revealed: bool },
    /// Spy attempts made so far this game.
    LittleGirl { spy_attempts: u32 },
}

impl RoleKind {
    /// A fresh role of kind `tag` with full resources.
    pub fn new(tag: RoleTag) -> Self {
        match tag {
            RoleTag::Villager => Self::Villager,
            RoleTag::Werewolf => Self::Werewolf,
            RoleTag::Seeker => Self::Seeker { seen: Vec::new() },
            RoleTag::Witch => Self::Witch {
                death_potions: 1,
                resurrect_potions: 1,
            },
            RoleTag::Hunter => Self::Hunter { fired: false },
            RoleTag::LoveMaker => Self::LoveMaker,
            RoleTag::Guard => Self::Guard { protecting: None },
            RoleTag::Idiot => Self::Idiot { revealed: false },
            RoleTag::LittleGirl => Self::LittleGirl { spy_attempts: 0 },
        }
    }

    pub fn tag(&self) -> RoleTag {
        match self {
            Self::Villager => RoleTag::Villager,
            Self::Werewolf => RoleTag::Werewolf,
            Self::Seeker { .. } => RoleTag::Seeker,
            Self::Witch { .. } => RoleTag::Witch,
            Self::Hunter { .. } => RoleTag::Hunter,
            Self::LoveMaker => RoleTag::LoveMaker,
            Self::Guard { .. } => RoleTag::Guard,
            Self::Idiot { .. } => RoleTag::Idiot,
            Self::LittleGirl { .. } => RoleTag::LittleGirl,
        }
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// One participant's place in a running game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub participant: ParticipantId,
    /// Unique within the registry. Targeting commands use it.
    pub nickname: String,
    pub kind: RoleKind,
    pub alive: bool,
    /// Marked to die at the next death resolution.
    pub injured: bool,
    /// Shielded by the guard for the current night.
    pub protected: bool,
    /// Always mutual: if A loves B then B loves A.
    pub loving: Option<ParticipantId>,
}

impl Role {
    pub fn new(participant: ParticipantId, nickname: String, tag: RoleTag) -> Self {
        Self {
            participant,
            nickname,
            kind: RoleKind::new(tag),
            alive: true,
            injured: false,
            protected: false,
            loving: None,
        }
    }

    pub fn tag(&self) -> RoleTag {
        self.kind.tag()
    }

    pub fn faction(&self) -> Faction {
        self.tag().faction()
    }

    pub fn is_werewolf(&self) -> bool {
        self.tag() == RoleTag::Werewolf
    }

    /// Short status used in player listings.
    pub fn status(&self) -> String {
        if !self.alive {
            format!("dead, was {}", self.tag())
        } else if self.injured {
            "dying".to_string()
        } else {
            "alive".to_string()
        }
    }
}
