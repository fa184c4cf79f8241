//! Session configuration.

use std::path::Path;

use fanon_error::{AnonError, Result};
use fanon_lattice::{LossRange, Monotonicity};
use fanon_types::NULL_VALUE;
use serde::{Deserialize, Serialize};

/// Rows between interrupt checks during row scans.
pub const DEFAULT_INTERRUPT_POLL_INTERVAL: usize = 1024;

/// Knobs of one anonymization session. Every field has a default, so a
/// JSON document only needs to name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Loss never decreases with generalization among anonymous nodes.
    pub monotonic_anonymous: bool,
    /// Loss never decreases with generalization among non-anonymous nodes.
    pub monotonic_non_anonymous: bool,
    /// Global extrema of the loss metric.
    pub loss_range: LossRange,
    /// Token stored for missing cells.
    pub null_token: String,
    pub interrupt_poll_interval: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            monotonic_anonymous: true,
            monotonic_non_anonymous: false,
            loss_range: LossRange::default(),
            null_token: NULL_VALUE.to_owned(),
            interrupt_poll_interval: DEFAULT_INTERRUPT_POLL_INTERVAL,
        }
    }
}

impl SessionConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| AnonError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.loss_range.is_valid() {
            return Err(AnonError::config(format!(
                "loss range minimum {} exceeds maximum {}",
                self.loss_range.minimum, self.loss_range.maximum
            )));
        }
        if self.interrupt_poll_interval == 0 {
            return Err(AnonError::config("interrupt_poll_interval must be positive"));
        }
        if self.null_token.is_empty() {
            return Err(AnonError::config("null_token must not be empty"));
        }
        Ok(())
    }

    pub const fn monotonicity(&self) -> Monotonicity {
        Monotonicity {
            anonymous: self.monotonic_anonymous,
            non_anonymous: self.monotonic_non_anonymous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = SessionConfig::default();
        assert!(config.monotonic_anonymous);
        assert!(!config.monotonic_non_anonymous);
        assert_eq!(config.null_token, "NULL");
        assert_eq!(config.interrupt_poll_interval, 1024);
        config.validate().expect("defaults are valid");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = SessionConfig::from_json_str(
            r#"{"monotonic_non_anonymous": true, "loss_range": {"minimum": 0.0, "maximum": 8.0}}"#,
        )
        .expect("config parses");
        assert!(config.monotonic_anonymous);
        assert!(config.monotonic_non_anonymous);
        assert_eq!(config.loss_range.maximum, 8.0);
        assert_eq!(config.interrupt_poll_interval, DEFAULT_INTERRUPT_POLL_INTERVAL);
    }

    #[test]
    fn invalid_values_rejected() {
        for json in [
            r#"{"loss_range": {"minimum": 2.0, "maximum": 1.0}}"#,
            r#"{"interrupt_poll_interval": 0}"#,
            r#"{"null_token": ""}"#,
            r#"{"monotonic_anonymous": "yes"}"#,
        ] {
            assert!(matches!(
                SessionConfig::from_json_str(json),
                Err(AnonError::Config { .. })
            ));
        }
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"null_token": "?", "interrupt_poll_interval": 16}}"#).expect("write");
        let config = SessionConfig::from_json_file(file.path()).expect("config loads");
        assert_eq!(config.null_token, "?");
        assert_eq!(config.interrupt_poll_interval, 16);

        let dir = tempfile::tempdir().expect("temp dir");
        assert!(matches!(
            SessionConfig::from_json_file(&dir.path().join("missing.json")),
            Err(AnonError::Io(_))
        ));
    }
}
