//! Rendezvous configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Rendezvous configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendezvousConfig {
    /// Participants asked for a number when no explicit list is given
    #[serde(default = "default_participants")]
    pub participants: Vec<String>,

    /// Default session timeout in seconds
    #[serde(rename = "default-timeout-secs", default = "default_timeout_secs")]
    pub default_timeout_secs: u64,

    /// Smallest accepted value (inclusive)
    #[serde(rename = "min-value", default = "default_min_value")]
    pub min_value: u8,

    /// Largest accepted value (inclusive)
    #[serde(rename = "max-value", default = "default_max_value")]
    pub max_value: u8,
}

fn default_participants() -> Vec<String> {
    debug!("default_participants: called");
    vec!["player1bot".to_string(), "player2bot".to_string()]
}

fn default_timeout_secs() -> u64 {
    debug!("default_timeout_secs: called");
    60
}

fn default_min_value() -> u8 {
    0
}

fn default_max_value() -> u8 {
    7
}

impl Default for RendezvousConfig {
    fn default() -> Self {
        debug!("RendezvousConfig::default: called");
        Self {
            participants: default_participants(),
            default_timeout_secs: default_timeout_secs(),
            min_value: default_min_value(),
            max_value: default_max_value(),
        }
    }
}

impl RendezvousConfig {
    /// Get the default timeout as a Duration
    pub fn default_timeout(&self) -> Duration {
        debug!(default_timeout_secs = %self.default_timeout_secs, "RendezvousConfig::default_timeout: called");
        Duration::from_secs(self.default_timeout_secs)
    }

    /// Whether a value falls inside the accepted range
    pub fn accepts(&self, value: u64) -> bool {
        value >= u64::from(self.min_value) && value <= u64::from(self.max_value)
    }
}
