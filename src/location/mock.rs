//! Scriptable in-memory provider for tests.
//!
//! Only compiled for tests or with the `test-utils` feature. It records
//! every start/stop call and lets a test fire readings or errors through
//! whatever handler the coordinator registered, exactly as a platform
//! provider would.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::adapter::ProviderAdapter;
use super::error::ProviderError;
use super::provider::{LocationProvider, ProviderEvent};
use super::types::{AuthorizationStatus, DesiredAccuracy, Reading};

#[derive(Debug)]
struct MockState {
    enabled: bool,
    authorization: AuthorizationStatus,
    desired_accuracy: Option<DesiredAccuracy>,
    last_known: Option<Reading>,
    updating: bool,
    start_count: usize,
    stop_count: usize,
    handler: Option<ProviderAdapter>,
    on_start: Option<Vec<Reading>>,
}

/// In-memory [`LocationProvider`] with call counters.
#[derive(Debug)]
pub struct MockLocationProvider {
    state: Mutex<MockState>,
}

impl Default for MockLocationProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLocationProvider {
    /// Creates an enabled, authorized provider with no last-known reading.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                enabled: true,
                authorization: AuthorizationStatus::AuthorizedWhenInUse,
                desired_accuracy: None,
                last_known: None,
                updating: false,
                start_count: 0,
                stop_count: 0,
                handler: None,
                on_start: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets whether location services report as enabled.
    pub fn set_enabled(&self, enabled: bool) {
        self.lock().enabled = enabled;
    }

    /// Sets the reported authorization state.
    pub fn set_authorization(&self, status: AuthorizationStatus) {
        self.lock().authorization = status;
    }

    /// Sets the reading returned by `last_known_reading`.
    pub fn set_last_known(&self, reading: Option<Reading>) {
        self.lock().last_known = reading;
    }

    /// Delivers `readings` synchronously from inside the next `start_updates`.
    pub fn deliver_on_start(&self, readings: Vec<Reading>) {
        self.lock().on_start = Some(readings);
    }

    /// Number of `start_updates` calls so far.
    #[must_use]
    pub fn start_count(&self) -> usize {
        self.lock().start_count
    }

    /// Number of `stop_updates` calls so far.
    #[must_use]
    pub fn stop_count(&self) -> usize {
        self.lock().stop_count
    }

    /// Whether updates are currently running.
    #[must_use]
    pub fn is_updating(&self) -> bool {
        self.lock().updating
    }

    /// The last accuracy the coordinator configured.
    #[must_use]
    pub fn desired_accuracy(&self) -> Option<DesiredAccuracy> {
        self.lock().desired_accuracy
    }

    /// Whether a handler has been registered.
    #[must_use]
    pub fn has_handler(&self) -> bool {
        self.lock().handler.is_some()
    }

    /// Fires a batch of readings through the registered handler.
    ///
    /// Does nothing if no handler is registered.
    pub fn deliver(&self, readings: Vec<Reading>) {
        self.emit(ProviderEvent::Readings(readings));
    }

    /// Fires an error through the registered handler.
    pub fn fail(&self, error: ProviderError) {
        self.emit(ProviderEvent::Failed(error));
    }

    /// Fires an arbitrary event through the registered handler.
    pub fn emit(&self, event: ProviderEvent) {
        // The handler calls back into stop_updates, so release the lock first.
        let handler = self.lock().handler.clone();
        if let Some(handler) = handler {
            handler.handle_event(event);
        }
    }
}

impl LocationProvider for MockLocationProvider {
    fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    fn authorization_status(&self) -> AuthorizationStatus {
        self.lock().authorization
    }

    fn set_desired_accuracy(&self, accuracy: DesiredAccuracy) {
        self.lock().desired_accuracy = Some(accuracy);
    }

    fn last_known_reading(&self) -> Option<Reading> {
        self.lock().last_known.clone()
    }

    fn start_updates(&self) {
        let scripted = {
            let mut state = self.lock();
            state.start_count += 1;
            state.updating = true;
            state.on_start.take()
        };
        if let Some(readings) = scripted {
            self.deliver(readings);
        }
    }

    fn stop_updates(&self) {
        let mut state = self.lock();
        state.stop_count += 1;
        state.updating = false;
    }

    fn set_event_handler(&self, handler: ProviderAdapter) {
        self.lock().handler = Some(handler);
    }
}
