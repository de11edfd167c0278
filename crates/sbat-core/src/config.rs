//! Configuration types for the watcher
//!
//! This module defines the watcher-level configuration. Daemon-level settings
//! (log level, credential file path) live in the binary crate.

use serde::{Deserialize, Serialize};

use crate::cadence::CadenceConfig;
use crate::types::{Center, QueryTemplate};

/// Main watcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Exam centers to query, in fixed order
    #[serde(default = "Center::registry")]
    pub centers: Vec<Center>,

    /// Shared availability query template
    #[serde(default)]
    pub query: QueryTemplate,

    /// Sleep schedule between cycles
    #[serde(default)]
    pub cadence: CadenceConfig,

    /// Pause after a successful mid-cycle re-authentication, before resuming
    /// polling (seconds). Avoids hammering the API right after a 401.
    #[serde(default = "default_reauth_pause_secs")]
    pub reauth_pause_secs: u64,

    /// Capacity of the outbound event channel
    ///
    /// When full, new events are dropped with a warning log. This prevents
    /// unbounded memory growth when no shell is draining the channel.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl WatcherConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.centers.is_empty() {
            return Err(crate::Error::config("no exam centers configured"));
        }
        if self.query.license_type.is_empty() {
            return Err(crate::Error::config("license type cannot be empty"));
        }
        if self.query.exam_type.is_empty() {
            return Err(crate::Error::config("exam type cannot be empty"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("event channel capacity must be > 0"));
        }
        self.cadence.validate()?;
        Ok(())
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            centers: Center::registry(),
            query: QueryTemplate::default(),
            cadence: CadenceConfig::default(),
            reauth_pause_secs: default_reauth_pause_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_reauth_pause_secs() -> u64 {
    3
}

fn default_event_channel_capacity() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(WatcherConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_empty_center_list() {
        let config = WatcherConfig {
            centers: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn deserializes_with_all_defaults() {
        let config: WatcherConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.centers.len(), 5);
        assert_eq!(config.cadence.burst_secs, 30);
        assert_eq!(config.cadence.idle_secs, 120);
        assert_eq!(config.query.license_type, "B");
    }
}
