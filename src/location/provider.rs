//! Interface to the platform location provider.
//!
//! The provider is an external collaborator (Core Location, Android fused
//! location, gpsd, ...). The coordinator only needs the narrow surface
//! below. Implementations are expected to use interior mutability, since the
//! coordinator holds the provider behind an `Arc` and calls it from whatever
//! task issued the request.

use super::adapter::ProviderAdapter;
use super::error::ProviderError;
use super::types::{AuthorizationStatus, DesiredAccuracy, Reading};

/// Something delivered by the provider to its registered handler.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    /// A batch of new readings. Expected to be non-empty.
    Readings(Vec<Reading>),
    /// The provider failed.
    Failed(ProviderError),
}

/// Platform location provider.
///
/// A provider keeps its registered handler for as long as it likes; the
/// handler is a [`ProviderAdapter`] that does not keep the coordinator
/// alive.
pub trait LocationProvider: Send + Sync {
    /// Whether location capability is enabled on the device.
    fn is_enabled(&self) -> bool;

    /// Current authorization state.
    fn authorization_status(&self) -> AuthorizationStatus;

    /// Configures the accuracy the provider should aim for.
    fn set_desired_accuracy(&self, accuracy: DesiredAccuracy);

    /// The most recent reading the provider still holds, if any.
    fn last_known_reading(&self) -> Option<Reading>;

    /// Begins delivering readings to the registered handler.
    ///
    /// May deliver synchronously before returning. The coordinator never has
    /// more than one `start_updates`/`stop_updates` call in flight.
    fn start_updates(&self);

    /// Stops delivering readings.
    fn stop_updates(&self);

    /// Registers the handler that receives [`ProviderEvent`]s.
    ///
    /// Replaces any previously registered handler.
    fn set_event_handler(&self, handler: ProviderAdapter);
}
