use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, bail};
use serde::Deserialize;
use tracing::info;

/// Top-level chat configuration, loaded from palaver.toml.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ChatConfig {
    pub channel: ChannelSection,
    pub reserved: ReservedSection,
    /// Server-defined constant channels, seeded into the directory at startup.
    pub constant: Vec<ConstantChannel>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChannelSection {
    /// Allow cross-faction channel interaction (invites, mode changes,
    /// moderator-speech ignore override).
    pub allow_cross_faction: bool,
    /// Suppress the "joined" broadcast when an elevated player joins.
    pub silent_gm_join: bool,
    /// Highest security level still shown in channel member lists
    /// requested by ordinary players.
    pub gm_level_in_list: u8,
}

impl Default for ChannelSection {
    fn default() -> Self {
        Self {
            allow_cross_faction: false,
            silent_gm_join: false,
            gm_level_in_list: 1,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReservedSection {
    /// Custom channel name whose announcements default to off.
    pub world_channel: String,
    /// First rank-gated channel and its speaking threshold.
    pub defense_channel: String,
    pub defense_speak_rank: u8,
    /// Second rank-gated channel and its speaking threshold.
    pub warfront_channel: String,
    pub warfront_speak_rank: u8,
}

impl Default for ReservedSection {
    fn default() -> Self {
        Self {
            world_channel: "world".into(),
            defense_channel: "localdefense".into(),
            defense_speak_rank: 2,
            warfront_channel: "warfront".into(),
            warfront_speak_rank: 10,
        }
    }
}

impl ReservedSection {
    /// Speaking rank threshold for the named channel, if it is one of the
    /// two rank-gated reserved channels.
    pub fn min_speak_rank(&self, name: &str) -> Option<u8> {
        if name.eq_ignore_ascii_case(&self.defense_channel) {
            Some(self.defense_speak_rank)
        } else if name.eq_ignore_ascii_case(&self.warfront_channel) {
            Some(self.warfront_speak_rank)
        } else {
            None
        }
    }
}

/// One server-defined channel from the channel catalog.
#[derive(Debug, Deserialize, Clone)]
pub struct ConstantChannel {
    /// Nonzero server-assigned channel id.
    pub id: u32,
    pub name: String,
    /// Flag names as spelled in `ChannelFlags` (e.g. "GENERAL", "CITY_ONLY").
    #[serde(default)]
    pub flags: Vec<String>,
}

impl ChatConfig {
    /// Load config from a TOML file. Falls back to defaults if the file
    /// doesn't exist. Environment variables override TOML values.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let mut config: Self = if Path::new(path).exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {path}"))?;
            toml::from_str(&contents)
                .with_context(|| format!("failed to parse config file {path}"))?
        } else {
            info!("No config file found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("PALAVER_ALLOW_CROSS_FACTION")
            && let Ok(flag) = v.parse()
        {
            self.channel.allow_cross_faction = flag;
        }
        if let Ok(v) = std::env::var("PALAVER_SILENT_GM_JOIN")
            && let Ok(flag) = v.parse()
        {
            self.channel.silent_gm_join = flag;
        }
        if let Ok(v) = std::env::var("PALAVER_GM_LEVEL_IN_LIST")
            && let Ok(level) = v.parse()
        {
            self.channel.gm_level_in_list = level;
        }
        if let Ok(v) = std::env::var("PALAVER_WORLD_CHANNEL") {
            self.reserved.world_channel = v;
        }
    }

    /// Reject catalogs that would corrupt the directory: zero ids and
    /// duplicate names (channel names are a case-insensitive keyspace).
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut seen = HashSet::new();
        for ch in &self.constant {
            if ch.id == 0 {
                bail!("constant channel {:?} has id 0 (reserved for custom channels)", ch.name);
            }
            if ch.name.trim().is_empty() {
                bail!("constant channel {} has an empty name", ch.id);
            }
            if !seen.insert(ch.name.to_lowercase()) {
                bail!("duplicate constant channel name {:?}", ch.name);
            }
        }
        Ok(())
    }
}
