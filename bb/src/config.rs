//! BoardBot configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::palette::Palette;
use crate::rendezvous::RendezvousConfig;

/// Main BoardBot configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chat server and identity
    pub irc: IrcConfig,

    /// Number collection defaults
    pub rendezvous: RendezvousConfig,

    /// Reconnect backoff
    pub reconnect: ReconnectConfig,

    /// Shared map artifact locations
    pub artifact: ArtifactConfig,

    /// External rendering command
    pub render: RenderConfig,

    /// Dice settings
    pub dice: DiceConfig,

    /// Owner colours per category
    pub palette: Palette,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if self.rendezvous.participants.is_empty() {
            return Err(eyre::eyre!("rendezvous.participants must not be empty"));
        }
        if self.rendezvous.min_value > self.rendezvous.max_value {
            return Err(eyre::eyre!(
                "rendezvous.min-value ({}) is greater than max-value ({})",
                self.rendezvous.min_value,
                self.rendezvous.max_value
            ));
        }
        if self.reconnect.base_wait_secs == 0 || self.reconnect.max_wait_secs == 0 {
            return Err(eyre::eyre!("reconnect waits must be greater than zero"));
        }
        if self.dice.num_players == 0 {
            return Err(eyre::eyre!("dice.num-players must be at least 1"));
        }
        if self.render.program.trim().is_empty() {
            return Err(eyre::eyre!("render.program must not be empty"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::default_paths() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let path = match config_path {
            Some(path) => path.clone(),
            None => Self::default_paths().into_iter().find(|p| p.exists())?,
        };
        let content = fs::read_to_string(path).ok()?;
        let config: Self = serde_yaml::from_str(&content).ok()?;
        config.log_level
    }

    /// Project-local `./boardbot.yml`, then `~/.config/boardbot/boardbot.yml`
    fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("boardbot.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("boardbot").join("boardbot.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Chat server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IrcConfig {
    /// Server host name
    pub server: String,

    /// Server port
    pub port: u16,

    /// Channel the bot lives in
    pub channel: String,

    /// Fixed identity used for every connect, no alternates
    pub nickname: String,
}

impl Default for IrcConfig {
    fn default() -> Self {
        Self {
            server: "irc.ipv6.libera.chat".to_string(),
            port: 6667,
            channel: "##rento".to_string(),
            nickname: "diceman".to_string(),
        }
    }
}

/// Reconnect backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Wait after the first failed attempt; grows linearly per attempt
    #[serde(rename = "base-wait-secs")]
    pub base_wait_secs: u64,

    /// Upper bound on the wait between attempts
    #[serde(rename = "max-wait-secs")]
    pub max_wait_secs: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_wait_secs: 60,
            max_wait_secs: 300,
        }
    }
}

impl ReconnectConfig {
    pub fn base_wait(&self) -> Duration {
        Duration::from_secs(self.base_wait_secs)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}

/// Shared artifact configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// The live map image
    pub path: PathBuf,

    /// Blank map copied in on refresh
    pub template: PathBuf,

    /// Base name for staged refresh copies, each gets a unique suffix; keep it on the same filesystem as `path`
    pub staging: PathBuf,

    /// Bot told about every successful draw
    pub companion: String,

    /// Message sent to the companion bot
    #[serde(rename = "companion-message")]
    pub companion_message: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("map.webp"),
            template: PathBuf::from("cb2.webp"),
            staging: PathBuf::from("map_temp.webp"),
            companion: "rentobot".to_string(),
            companion_message: "!up".to_string(),
        }
    }
}

/// External rendering command configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Program to run for each draw
    pub program: String,

    /// Argument templates; `{attribute}`, `{target}`, `{artifact}` are substituted
    pub args: Vec<String>,

    /// Per-draw timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            program: "mogrify".to_string(),
            args: [
                "-fill",
                "{attribute}",
                "-stroke",
                "black",
                "-strokewidth",
                "3",
                "-draw",
                "circle {target}",
                "{artifact}",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            timeout_ms: 30_000,
        }
    }
}

impl RenderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Dice configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiceConfig {
    /// Players allowed to roll, numbered from 1
    #[serde(rename = "num-players")]
    pub num_players: u8,
}

impl Default for DiceConfig {
    fn default() -> Self {
        Self { num_players: 4 }
    }
}
