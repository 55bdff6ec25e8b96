//! Bridge from provider callbacks into the coordinator.
//!
//! The provider keeps its handler for as long as updates are running, and
//! possibly longer. The adapter therefore only holds a [`Weak`] link to the
//! coordinator core: once the coordinator is dropped, callbacks become
//! no-ops.

use std::sync::{Arc, Weak};

use log::{debug, warn};

use super::coordinator::CoordinatorCore;
use super::error::{LocationError, ProviderError};
use super::provider::ProviderEvent;
use super::types::Reading;

/// Handler registered with a [`LocationProvider`](super::LocationProvider).
///
/// Cheap to clone; every clone points at the same coordinator.
#[derive(Clone)]
pub struct ProviderAdapter {
    core: Weak<CoordinatorCore>,
}

impl ProviderAdapter {
    pub(crate) fn new(core: &Arc<CoordinatorCore>) -> Self {
        Self {
            core: Arc::downgrade(core),
        }
    }

    /// Returns true while the coordinator this adapter feeds still exists.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.core.strong_count() > 0
    }

    /// Dispatches a provider event.
    pub fn handle_event(&self, event: ProviderEvent) {
        match event {
            ProviderEvent::Readings(readings) => self.readings_delivered(&readings),
            ProviderEvent::Failed(error) => self.failed(error),
        }
    }

    /// Forwards a batch of readings.
    pub fn readings_delivered(&self, readings: &[Reading]) {
        let Some(core) = self.core.upgrade() else {
            debug!("Dropping {} reading(s): coordinator is gone", readings.len());
            return;
        };
        if readings.is_empty() {
            warn!("Provider delivered an empty reading batch, ignoring");
            return;
        }
        core.handle_readings(readings);
    }

    /// Forwards a provider failure.
    pub fn failed(&self, error: ProviderError) {
        let Some(core) = self.core.upgrade() else {
            debug!("Dropping provider error ({error}): coordinator is gone");
            return;
        };
        core.handle_error(LocationError::Provider(error));
    }
}

impl std::fmt::Debug for ProviderAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderAdapter")
            .field("attached", &self.is_attached())
            .finish()
    }
}
