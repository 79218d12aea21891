//! Daemon configuration
//!
//! Layered with figment: built-in defaults, then an optional TOML file,
//! then `ARENAD_`-prefixed environment variables. CLI flags are applied
//! on top by the binary.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Config file read when no explicit path is given (optional)
pub const DEFAULT_CONFIG_FILE: &str = "arenad.toml";

/// Prefix for environment overrides, e.g. `ARENAD_BIND_ADDR`
pub const ENV_PREFIX: &str = "ARENAD_";

/// Largest fixed attack bonus a configured item may carry
pub const MAX_ATTACK_BONUS: u32 = 1000;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("room name must not be empty")]
    EmptyRoom,

    #[error("bot name must not be empty")]
    EmptyBotName,

    #[error("item #{0} has an empty name")]
    EmptyItemName(usize),

    #[error("item #{index} attack bonus {bonus} exceeds {max}", max = MAX_ATTACK_BONUS)]
    BonusOutOfRange { index: usize, bonus: u32 },

    #[error("invalid configuration: {0}")]
    Figment(#[from] figment::Error),
}

/// An item placed in the arena pool at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSeed {
    pub name: String,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Fixed bonus; rolled in `1..=3` when absent
    #[serde(default)]
    pub attack_bonus: Option<u32>,
}

impl ItemSeed {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: default_prefix(),
            attack_bonus: None,
        }
    }

    pub fn with_bonus(mut self, attack_bonus: u32) -> Self {
        self.attack_bonus = Some(attack_bonus);
        self
    }
}

fn default_prefix() -> String {
    "a".to_string()
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// Name of the shared room every reply goes to
    pub room: String,
    /// Name the arena speaks as
    pub bot_name: String,
    /// Fixed RNG seed (None = seed from the OS)
    pub seed: Option<u64>,
    /// Emit JSON log lines
    pub log_json: bool,
    pub items: Vec<ItemSeed>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            room: "#mutant3s".to_string(),
            bot_name: "RPGMutantes".to_string(),
            seed: None,
            log_json: false,
            items: ["banana", "sword", "pineapple", "katana"]
                .into_iter()
                .map(ItemSeed::new)
                .collect(),
        }
    }
}

impl Config {
    /// Build the provider stack. With no explicit path, `arenad.toml` in
    /// the working directory is merged if it exists.
    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load and validate configuration
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::Missing(path.to_path_buf()));
            }
        }
        let config: Config = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.room.trim().is_empty() {
            return Err(ConfigError::EmptyRoom);
        }
        if self.bot_name.trim().is_empty() {
            return Err(ConfigError::EmptyBotName);
        }
        if let Some(index) = self.items.iter().position(|i| i.name.trim().is_empty()) {
            return Err(ConfigError::EmptyItemName(index));
        }
        for (index, item) in self.items.iter().enumerate() {
            if let Some(bonus) = item.attack_bonus.filter(|b| *b > MAX_ATTACK_BONUS) {
                return Err(ConfigError::BonusOutOfRange { index, bonus });
            }
        }
        Ok(())
    }
}
