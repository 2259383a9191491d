use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ElectionError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElectionConfig {
    pub tick_interval_ms: u64,       // in milliseconds
    pub heartbeat_interval_ms: u64,  // in milliseconds
    pub election_timeout_ms: u64,    // in milliseconds
    pub deliberation_min_ms: u64,    // inclusive
    pub deliberation_max_ms: u64,    // exclusive
    pub vote_collection_ms: u64,     // in milliseconds
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            heartbeat_interval_ms: 500,
            election_timeout_ms: 1000,
            deliberation_min_ms: 1000,
            deliberation_max_ms: 3000,
            vote_collection_ms: 2000,
        }
    }
}

impl ElectionConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn election_timeout(&self) -> Duration {
        Duration::from_millis(self.election_timeout_ms)
    }

    pub fn vote_collection(&self) -> Duration {
        Duration::from_millis(self.vote_collection_ms)
    }

    pub fn validate(&self) -> Result<(), ElectionError> {
        let intervals = [
            ("tick_interval_ms", self.tick_interval_ms),
            ("heartbeat_interval_ms", self.heartbeat_interval_ms),
            ("election_timeout_ms", self.election_timeout_ms),
            ("vote_collection_ms", self.vote_collection_ms),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(ElectionError::InvalidConfig(format!("{name} must be > 0")));
            }
        }

        if self.deliberation_min_ms >= self.deliberation_max_ms {
            return Err(ElectionError::InvalidConfig(format!(
                "deliberation range [{}, {}) is empty",
                self.deliberation_min_ms, self.deliberation_max_ms
            )));
        }

        Ok(())
    }
}
