use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::election::{ElectionConfig, ElectionError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub nodes: usize,
    /// Base seed for per-node randomness. Drawn from the OS when absent.
    pub seed: Option<u64>,
    pub election: ElectionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nodes: 3,
            seed: None,
            election: ElectionConfig::default(),
        }
    }
}

impl Config {
    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ElectionError> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| ElectionError::SerializationError(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ElectionError> {
        if self.nodes == 0 {
            return Err(ElectionError::InvalidConfig(
                "cluster needs at least one node".to_string(),
            ));
        }
        self.election.validate()
    }

    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| rand::rng().random())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_default_values_are_sensible() {
        let cfg = Config::default();
        assert_eq!(cfg.nodes, 3);
        assert!(cfg.seed.is_none());
        assert_eq!(cfg.election, ElectionConfig::default());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn load_fills_missing_fields_with_defaults() {
        let mut file = NamedTempFile::new().expect("tempfile");
        write!(
            file,
            r#"{{ "nodes": 5, "seed": 11, "election": {{ "heartbeat_interval_ms": 250 }} }}"#
        )
        .expect("write config");

        let cfg = Config::load(file.path()).expect("load");
        assert_eq!(cfg.nodes, 5);
        assert_eq!(cfg.seed, Some(11));
        assert_eq!(cfg.resolve_seed(), 11);
        assert_eq!(cfg.election.heartbeat_interval_ms, 250);
        assert_eq!(cfg.election.election_timeout_ms, 1000);
    }

    #[test]
    fn load_reports_malformed_json() {
        let mut file = NamedTempFile::new().expect("tempfile");
        write!(file, "{{ nodes: ").expect("write config");

        match Config::load(file.path()) {
            Err(ElectionError::SerializationError(_)) => {}
            other => panic!("expected SerializationError, got {other:?}"),
        }
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        match Config::load(dir.path().join("absent.json")) {
            Err(ElectionError::IoError(_)) => {}
            other => panic!("expected IoError, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_empty_cluster() {
        let cfg = Config {
            nodes: 0,
            ..Config::default()
        };
        assert!(matches!(cfg.validate(), Err(ElectionError::InvalidConfig(_))));
    }
}
