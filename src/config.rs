//! Configuration management for Turnstile.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, TurnstileError};

/// Configuration for a [`Limiter`](crate::admission::Limiter).
///
/// The admission interval does triple duty: it is the minimum spacing
/// between admitted requests per client, the reclamation period, and the
/// staleness threshold for evicting idle clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnstileConfig {
    /// Admission interval in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for TurnstileConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

fn default_interval_ms() -> u64 {
    1000
}

impl TurnstileConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: TurnstileConfig = serde_yaml::from_str(yaml)
            .map_err(|e| TurnstileError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// The admission interval must be greater than zero; a zero period
    /// would admit every request and stall the reclamation ticker.
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(TurnstileError::Config(
                "admission interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the admission interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}
