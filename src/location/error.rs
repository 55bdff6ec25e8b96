//! Error types for location acquisition.
//!
//! This module defines errors that can reach a caller of
//! `current_location`, plus the provider-side causes they wrap.

use std::time::Duration;

use thiserror::Error;

/// Failure reported by the underlying location provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The provider could not determine a position right now.
    #[error("Location is currently unknown")]
    LocationUnknown,

    /// The provider refused access.
    #[error("Access to location was denied")]
    Denied,

    /// Network-assisted positioning failed.
    #[error("Network unavailable for positioning")]
    Network,

    /// Any other provider failure.
    #[error("{0}")]
    Other(String),
}

/// Errors returned from a location request.
///
/// Cloneable so a single outcome can be handed to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// Location services were disabled when the request was made.
    #[error("Location services are disabled")]
    ServicesDisabled,

    /// The provider failed while an acquisition was active.
    #[error("Location provider failed: {0}")]
    Provider(#[from] ProviderError),

    /// The acquisition deadline elapsed without a delivery.
    #[error("Location acquisition timed out after {0:?}")]
    Timeout(Duration),

    /// A deadline was configured but the tokio runtime has no timer to
    /// enforce it.
    #[error("Location acquisition deadline could not be armed: runtime timers are disabled")]
    TimerUnavailable,

    /// The coordinator was dropped before the request resolved.
    #[error("Location coordinator dropped before the request resolved")]
    Abandoned,
}

/// Result type for location requests.
pub type LocationResult<T> = Result<T, LocationError>;

/// Errors from loading coordinator configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration JSON could not be parsed.
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A field held an unusable value.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
