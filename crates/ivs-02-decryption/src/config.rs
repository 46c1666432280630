//! Relay configuration with validation.

use crate::domain::registry::DEFAULT_UNCLAIMED_CAPACITY;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Decryption relay configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecryptionConfig {
    /// How long a session waits for its completion notification.
    /// Relayer latency of ~150 s has been observed in practice.
    #[serde(with = "duration_serde")]
    pub deadline: Duration,
    /// Period of the background expiry sweep
    #[serde(with = "duration_serde")]
    pub cleanup_interval: Duration,
    /// Retention of early-arrival notifications and retired request ids
    #[serde(with = "duration_serde")]
    pub unclaimed_ttl: Duration,
    /// Most unknown-id notifications held at once; later ones are discarded
    pub unclaimed_capacity: usize,
    /// Check that a ciphertext exists before submitting
    pub preflight_ciphertext_check: bool,
}

impl Default for DecryptionConfig {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(180),
            cleanup_interval: Duration::from_secs(5),
            unclaimed_ttl: Duration::from_secs(300),
            unclaimed_capacity: DEFAULT_UNCLAIMED_CAPACITY,
            preflight_ciphertext_check: true,
        }
    }
}

impl DecryptionConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deadline.is_zero() {
            return Err(ConfigError::InvalidTimeout("deadline cannot be 0".into()));
        }
        if self.cleanup_interval.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "cleanup_interval cannot be 0".into(),
            ));
        }
        if self.unclaimed_ttl.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "unclaimed_ttl cannot be 0".into(),
            ));
        }
        if self.unclaimed_capacity == 0 {
            return Err(ConfigError::Invalid(
                "unclaimed_capacity cannot be 0".into(),
            ));
        }
        Ok(())
    }
}

/// Duration (de)serialization as `"180s"`, `"500ms"`, `"3m"` or plain seconds
pub mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        // "ms" before "s": both end in 's'
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            let mins = mins.trim().parse::<u64>().map_err(|_| "invalid minutes")?;
            mins.checked_mul(60)
                .map(Duration::from_secs)
                .ok_or("minutes out of range")
        } else {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}
