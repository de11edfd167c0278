//! Poll cadence policy
//!
//! New slots historically appear around 07:00 and 16:00 Brussels civil time,
//! so the watcher polls faster during those hours. This is a coarse heuristic,
//! not a rate-limit contract: the tiers are configurable but the two-tier
//! structure and the civil-timezone basis stay.

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Two-tier sleep schedule between poll cycles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CadenceConfig {
    /// Sleep during burst hours (seconds)
    #[serde(default = "default_burst_secs")]
    pub burst_secs: u64,

    /// Sleep outside burst hours (seconds)
    #[serde(default = "default_idle_secs")]
    pub idle_secs: u64,

    /// Civil hours (0-23) during which the burst tier applies
    #[serde(default = "default_burst_hours")]
    pub burst_hours: Vec<u32>,

    /// Civil timezone of the exam authority's jurisdiction
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
}

impl CadenceConfig {
    /// Sleep duration for the cycle ending at `now`.
    pub fn sleep_duration(&self, now: DateTime<Utc>) -> Duration {
        let hour = now.with_timezone(&self.timezone).hour();
        if self.burst_hours.contains(&hour) {
            Duration::from_secs(self.burst_secs)
        } else {
            Duration::from_secs(self.idle_secs)
        }
    }

    pub fn validate(&self) -> Result<(), crate::Error> {
        if let Some(hour) = self.burst_hours.iter().find(|h| **h > 23) {
            return Err(crate::Error::config(format!(
                "burst hour {} is out of range (0-23)",
                hour
            )));
        }
        Ok(())
    }
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            burst_secs: default_burst_secs(),
            idle_secs: default_idle_secs(),
            burst_hours: default_burst_hours(),
            timezone: default_timezone(),
        }
    }
}

fn default_burst_secs() -> u64 {
    30
}

fn default_idle_secs() -> u64 {
    120
}

fn default_burst_hours() -> Vec<u32> {
    vec![7, 16]
}

fn default_timezone() -> Tz {
    chrono_tz::Europe::Brussels
}
