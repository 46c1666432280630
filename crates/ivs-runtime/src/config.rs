//! # Runtime Configuration
//!
//! Unified configuration for the relay, the engine connection and the score
//! model.
//!
//! ## Load Order
//!
//! 1. Defaults
//! 2. Optional TOML file (`--config`)
//! 3. Environment overrides (`IVS_CONTRACT_ADDRESS`, `IVS_DECRYPT_TIMEOUT_SECS`,
//!    `IVS_DMAX`, `IVS_ADMIN`)
//! 4. `validate()`

use anyhow::{Context, Result};
use ivs_01_score_model::{ScoreParams, SelfScorePolicy};
use ivs_02_decryption::config::duration_serde;
use ivs_02_decryption::{ConfigError, DecryptionConfig, SimulatedEngineConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Request registry and session settings.
    pub decryption: DecryptionConfig,
    /// Engine connection and simulated relayer behaviour.
    pub engine: EngineConfig,
    /// Score model parameters.
    pub score: ScoreConfig,
}

/// Engine connection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Address of the deployed IVS contract.
    pub contract_address: String,
    /// Account holding the admin role.
    pub admin: String,
    /// Lower bound of the simulated relayer latency.
    #[serde(with = "duration_serde")]
    pub min_latency: Duration,
    /// Upper bound of the simulated relayer latency.
    #[serde(with = "duration_serde")]
    pub max_latency: Duration,
    /// Deliver every completion twice.
    pub duplicate_deliveries: bool,
    /// Never deliver completions.
    pub drop_notifications: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let simulated = SimulatedEngineConfig::default();
        Self {
            contract_address: "0x0000000000000000000000000000000000000000".to_string(),
            admin: simulated.admin,
            min_latency: simulated.min_latency,
            max_latency: simulated.max_latency,
            duplicate_deliveries: simulated.duplicate_deliveries,
            drop_notifications: simulated.drop_notifications,
        }
    }
}

impl EngineConfig {
    pub fn simulated(&self) -> SimulatedEngineConfig {
        SimulatedEngineConfig {
            admin: self.admin.clone(),
            min_latency: self.min_latency,
            max_latency: self.max_latency,
            duplicate_deliveries: self.duplicate_deliveries,
            drop_notifications: self.drop_notifications,
        }
    }
}

/// Score model configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    /// Maximum hop distance that contributes to a score.
    pub d_max: u32,
    /// Own score of an infected user: `zero`, `excluded` or a fraction.
    /// Defaults to `excluded`, which publishes no value for infected users.
    pub self_score: String,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            d_max: 2,
            self_score: "excluded".to_string(),
        }
    }
}

impl ScoreConfig {
    pub fn params(&self) -> Result<ScoreParams, ConfigError> {
        let policy = self
            .self_score
            .parse::<SelfScorePolicy>()
            .map_err(|err| ConfigError::Invalid(format!("score.self_score: {err}")))?;
        Ok(ScoreParams::new(self.d_max, policy))
    }
}

impl RuntimeConfig {
    /// Load from an optional TOML file, apply environment overrides, validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                let config = Self::from_toml(&raw)
                    .with_context(|| format!("Failed to parse config file {}", path.display()))?;
                info!(path = %path.display(), "Loaded configuration file");
                config
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply `IVS_*` overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(address) = lookup("IVS_CONTRACT_ADDRESS") {
            self.engine.contract_address = address;
        }
        if let Some(admin) = lookup("IVS_ADMIN") {
            self.engine.admin = admin;
        }
        if let Some(secs) = lookup("IVS_DECRYPT_TIMEOUT_SECS") {
            let secs = secs.trim().parse::<u64>().map_err(|_| {
                ConfigError::InvalidTimeout(format!("IVS_DECRYPT_TIMEOUT_SECS={secs}"))
            })?;
            self.decryption.deadline = Duration::from_secs(secs);
        }
        if let Some(d_max) = lookup("IVS_DMAX") {
            self.score.d_max = d_max
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("IVS_DMAX={d_max}")))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.decryption.validate()?;

        if self.engine.contract_address.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "engine.contract_address cannot be empty".into(),
            ));
        }
        if self.engine.admin.trim().is_empty() {
            return Err(ConfigError::Invalid("engine.admin cannot be empty".into()));
        }
        if self.engine.min_latency > self.engine.max_latency {
            return Err(ConfigError::Invalid(
                "engine.min_latency exceeds engine.max_latency".into(),
            ));
        }

        self.score.params()?;
        Ok(())
    }
}
