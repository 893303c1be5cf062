use crate::config::ChannelSection;

/// Session security levels ordered by privilege.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum SecurityLevel {
    #[default]
    Player = 0,
    Moderator = 1,
    GameMaster = 2,
    Administrator = 3,
}

impl SecurityLevel {
    pub fn parse(s: &str) -> Self {
        match s {
            "administrator" => Self::Administrator,
            "gamemaster" => Self::GameMaster,
            "moderator" => Self::Moderator,
            _ => Self::Player,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Administrator => "administrator",
            Self::GameMaster => "gamemaster",
            Self::Moderator => "moderator",
            Self::Player => "player",
        }
    }
}

/// Capability checks derived from configuration. Channel operations go
/// through this single policy object instead of comparing raw security
/// levels inline.
#[derive(Debug, Clone)]
pub struct Privilege {
    allow_cross_faction: bool,
    silent_gm_join: bool,
    gm_level_in_list: u8,
}

impl Privilege {
    pub fn new(cfg: &ChannelSection) -> Self {
        Self {
            allow_cross_faction: cfg.allow_cross_faction,
            silent_gm_join: cfg.silent_gm_join,
            gm_level_in_list: cfg.gm_level_in_list,
        }
    }

    /// Elevated sessions bypass moderator checks and rank gates.
    pub fn is_elevated(&self, level: SecurityLevel) -> bool {
        level >= SecurityLevel::GameMaster
    }

    /// Whether a joiner of this level skips the "joined" broadcast.
    pub fn joins_silently(&self, level: SecurityLevel) -> bool {
        self.silent_gm_join && self.is_elevated(level)
    }

    /// Whether a member of this level appears in channel member lists
    /// shown to ordinary players.
    pub fn listed_in_roster(&self, level: SecurityLevel) -> bool {
        level as u8 <= self.gm_level_in_list
    }

    pub fn cross_faction_allowed(&self) -> bool {
        self.allow_cross_faction
    }
}
