//! Coordinator configuration.
//!
//! Hosts typically keep these values in their own settings store and hand
//! them over as JSON.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::types::{DesiredAccuracy, QualityPreference};

/// Default freshness window for the provider's last-known reading.
pub const DEFAULT_CACHE_INTERVAL_SECS: i64 = 60;

/// Settings for a [`LocationCoordinator`](super::LocationCoordinator).
///
/// Every field can be changed later through the coordinator's setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Tie-break used when a batch holds several readings.
    pub preference: QualityPreference,

    /// Accuracy forwarded to the provider.
    pub desired_accuracy: DesiredAccuracy,

    /// How old (in seconds) a last-known reading may be and still be served.
    /// Zero or negative disables the cache.
    pub cache_interval_secs: i64,

    /// Optional deadline (in seconds) after which a running acquisition is
    /// rejected with a timeout. `None` waits for the provider indefinitely.
    pub acquisition_timeout_secs: Option<u64>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            preference: QualityPreference::default(),
            desired_accuracy: DesiredAccuracy::default(),
            cache_interval_secs: DEFAULT_CACHE_INTERVAL_SECS,
            acquisition_timeout_secs: None,
        }
    }
}

impl CoordinatorConfig {
    /// Cache window as a signed duration, saturating at chrono's range.
    #[must_use]
    pub fn cache_interval(&self) -> chrono::Duration {
        chrono::Duration::try_seconds(self.cache_interval_secs).unwrap_or(
            if self.cache_interval_secs < 0 {
                chrono::Duration::MIN
            } else {
                chrono::Duration::MAX
            },
        )
    }

    /// Acquisition deadline, if one is configured.
    #[must_use]
    pub fn acquisition_timeout(&self) -> Option<Duration> {
        self.acquisition_timeout_secs.map(Duration::from_secs)
    }

    /// Checks that every field holds a usable value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the desired accuracy is not a
    /// finite number or the acquisition timeout is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.desired_accuracy.meters().is_finite() {
            return Err(ConfigError::Invalid(
                "desired_accuracy must be a finite number".to_string(),
            ));
        }
        if self.acquisition_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "acquisition_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Parses and validates a configuration from JSON.
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is invalid.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Converts this configuration to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (extremely rare).
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }
}
