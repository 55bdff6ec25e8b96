//! Location module for Fixpoint.
//!
//! Answers "where am I now?" on top of a platform location provider that
//! reports asynchronously and intermittently:
//! - Concurrent requests are coalesced into a single provider acquisition
//! - The best reading of a batch is picked by accuracy or recency
//! - A fresh last-known reading is served without touching the provider
//! - Every waiter receives exactly one outcome, success or error
//!
//! # Architecture
//!
//! ```text
//! LocationCoordinator (state machine, waiters, cache check)
//!     ├── select_best_reading (pure selection)
//!     └── ProviderAdapter (weak link, provider -> coordinator)
//!             ▲
//!             │ ProviderEvent
//!     LocationProvider (platform, external)
//! ```
//!
//! # Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use fixpoint_core::location::mock::MockLocationProvider;
//! use fixpoint_core::location::{AcquisitionState, LocationCoordinator};
//!
//! let provider = Arc::new(MockLocationProvider::new());
//! let coordinator = LocationCoordinator::new(provider.clone());
//!
//! // Two callers, one acquisition
//! let first = coordinator.current_location();
//! let second = coordinator.current_location();
//! assert_eq!(provider.start_count(), 1);
//! assert_eq!(coordinator.state(), AcquisitionState::InProgress);
//! # drop((first, second));
//! ```

mod adapter;
mod config;
mod coordinator;
mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
mod provider;
pub mod selector;
pub mod types;

pub use adapter::ProviderAdapter;
pub use config::{CoordinatorConfig, DEFAULT_CACHE_INTERVAL_SECS};
pub use coordinator::{LocationCoordinator, PendingLocation};
pub use error::{ConfigError, LocationError, LocationResult, ProviderError};
pub use provider::{LocationProvider, ProviderEvent};
pub use selector::select_best_reading;
pub use types::{
    AcquisitionState, AcquisitionStats, AuthorizationStatus, DesiredAccuracy, QualityPreference,
    Reading,
};
