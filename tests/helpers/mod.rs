//! Reusable test helpers for coordinator integration tests.
//!
//! These helpers wire a real `LocationCoordinator` to the in-memory
//! `MockLocationProvider`. Readings are built relative to "now" so cache
//! window checks behave as they would on a device.

#![allow(dead_code)]

use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use fixpoint_core::location::mock::MockLocationProvider;
use fixpoint_core::location::{
    AuthorizationStatus, CoordinatorConfig, DesiredAccuracy, LocationCoordinator,
    LocationProvider, ProviderAdapter, Reading,
};

/// San Francisco, used as the base position for all helper readings.
pub const BASE_LATITUDE: f64 = 37.774_929_5;
pub const BASE_LONGITUDE: f64 = -122.419_415_5;

/// Creates a provider and a coordinator with default configuration.
pub fn coordinator() -> (Arc<MockLocationProvider>, LocationCoordinator) {
    coordinator_with(&CoordinatorConfig::default())
}

/// Creates a provider and a coordinator with the given configuration.
pub fn coordinator_with(
    config: &CoordinatorConfig,
) -> (Arc<MockLocationProvider>, LocationCoordinator) {
    let provider = Arc::new(MockLocationProvider::new());
    let coordinator = LocationCoordinator::with_config(provider.clone(), config);
    (provider, coordinator)
}

/// A reading taken `age_secs` seconds ago with the given accuracies.
pub fn reading_aged(age_secs: i64, horizontal: f64, vertical: f64) -> Reading {
    Reading::new(
        BASE_LATITUDE,
        BASE_LONGITUDE,
        horizontal,
        vertical,
        Utc::now() - Duration::seconds(age_secs),
    )
}

/// A reading taken just now.
pub fn fresh_reading(horizontal: f64, vertical: f64) -> Reading {
    reading_aged(0, horizontal, vertical)
}

/// Provider lifecycle call that a [`GatedProvider`] holds open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Start,
    Stop,
}

/// Mock provider whose first gated call blocks until the test releases it.
///
/// Lets a test park one thread inside `start_updates` or `stop_updates`
/// while another thread drives the coordinator.
pub struct GatedProvider {
    pub inner: MockLocationProvider,
    gate: Gate,
    armed: Mutex<Option<(mpsc::Sender<()>, mpsc::Receiver<()>)>>,
}

/// Test side of a [`GatedProvider`]: learns when the call is entered and
/// lets it continue.
pub struct GateControl {
    entered: mpsc::Receiver<()>,
    release: mpsc::Sender<()>,
}

impl GateControl {
    /// Blocks until a thread is parked inside the gated call.
    pub fn wait_entered(&self) {
        self.entered
            .recv_timeout(StdDuration::from_secs(5))
            .expect("gated call was never entered");
    }

    /// Lets the parked call continue.
    pub fn release(&self) {
        self.release.send(()).expect("gated call is gone");
    }
}

impl GatedProvider {
    pub fn new(gate: Gate) -> (Arc<Self>, GateControl) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let provider = Arc::new(Self {
            inner: MockLocationProvider::new(),
            gate,
            armed: Mutex::new(Some((entered_tx, release_rx))),
        });
        let control = GateControl {
            entered: entered_rx,
            release: release_tx,
        };
        (provider, control)
    }

    fn pass(&self, call: Gate) {
        if call != self.gate {
            return;
        }
        let armed = self.armed.lock().unwrap().take();
        if let Some((entered, release)) = armed {
            entered.send(()).unwrap();
            release.recv().unwrap();
        }
    }
}

impl LocationProvider for GatedProvider {
    fn is_enabled(&self) -> bool {
        self.inner.is_enabled()
    }

    fn authorization_status(&self) -> AuthorizationStatus {
        self.inner.authorization_status()
    }

    fn set_desired_accuracy(&self, accuracy: DesiredAccuracy) {
        self.inner.set_desired_accuracy(accuracy);
    }

    fn last_known_reading(&self) -> Option<Reading> {
        self.inner.last_known_reading()
    }

    fn start_updates(&self) {
        self.pass(Gate::Start);
        self.inner.start_updates();
    }

    fn stop_updates(&self) {
        self.pass(Gate::Stop);
        self.inner.stop_updates();
    }

    fn set_event_handler(&self, handler: ProviderAdapter) {
        self.inner.set_event_handler(handler);
    }
}
