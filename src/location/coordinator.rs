//! Coalescing "where am I now?" requests into one provider acquisition.
//!
//! # Architecture
//!
//! ```text
//! caller A ─┐
//!           │                                     LocationProvider
//! caller B ─┼──► LocationCoordinator ──start──►        │
//!           │        │   ▲                             │
//! caller C ─┘        │   └──── ProviderAdapter ◄───────┘
//!                    ▼        (weak, readings/error)
//!              [A, B, C all receive the
//!               same reading or error]
//! ```
//!
//! A request is answered in one of three ways:
//! - From the provider's last-known reading, when it is inside the cache window
//! - Immediately with [`LocationError::ServicesDisabled`]
//! - By joining the waiter list of the current acquisition (starting one if
//!   the coordinator is idle)
//!
//! When the provider reports back, the waiter list is drained in one critical
//! section, updates are stopped, and every waiter gets the same outcome.
//!
//! Provider `start_updates`/`stop_updates` calls are made outside the lock,
//! but only ever by one thread at a time: whichever thread finds the provider
//! out of step with the acquisition state drives it until the two agree.
//! A start or stop therefore never lands out of order with the transition
//! that asked for it.

use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::task::{Context, Poll};
use std::time::Duration;

use chrono::Utc;
use log::{debug, info, warn};
use tokio::sync::oneshot;

use super::adapter::ProviderAdapter;
use super::config::CoordinatorConfig;
use super::error::{LocationError, LocationResult};
use super::provider::LocationProvider;
use super::selector::select_best_reading;
use super::types::{
    AcquisitionState, AcquisitionStats, AuthorizationStatus, DesiredAccuracy, QualityPreference,
    Reading,
};

type Waiter = oneshot::Sender<LocationResult<Reading>>;

/// Runtime-adjustable settings.
#[derive(Debug, Clone, Copy)]
struct Settings {
    preference: QualityPreference,
    desired_accuracy: DesiredAccuracy,
    cache_interval: chrono::Duration,
    acquisition_timeout: Option<Duration>,
}

impl From<&CoordinatorConfig> for Settings {
    fn from(config: &CoordinatorConfig) -> Self {
        Self {
            preference: config.preference,
            desired_accuracy: config.desired_accuracy,
            cache_interval: config.cache_interval(),
            acquisition_timeout: config.acquisition_timeout(),
        }
    }
}

/// State and waiters, always mutated together.
#[derive(Default)]
struct Acquisition {
    state: AcquisitionState,
    waiters: Vec<Waiter>,
    /// Bumped on every Idle -> `InProgress` transition.
    generation: u64,
    /// Whether the last start/stop issued to the provider was a start.
    updating: bool,
    /// Set while some thread is issuing start/stop calls.
    syncing: bool,
}

/// Shared core referenced strongly by the coordinator and weakly by the
/// provider adapter and deadline tasks.
pub(crate) struct CoordinatorCore {
    provider: Arc<dyn LocationProvider>,
    acquisition: Mutex<Acquisition>,
    settings: RwLock<Settings>,
    stats: Mutex<AcquisitionStats>,
}

impl CoordinatorCore {
    fn lock_acquisition(&self) -> MutexGuard<'_, Acquisition> {
        self.acquisition
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn settings(&self) -> Settings {
        *self.settings.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn update_settings(&self, update: impl FnOnce(&mut Settings)) {
        update(&mut *self.settings.write().unwrap_or_else(PoisonError::into_inner));
    }

    fn record(&self, update: impl FnOnce(&mut AcquisitionStats)) {
        update(&mut *self.stats.lock().unwrap_or_else(PoisonError::into_inner));
    }

    fn request(self: &Arc<Self>) -> PendingLocation {
        self.record(|s| s.total_requests += 1);
        let settings = self.settings();

        if let Some(reading) = self.provider.last_known_reading() {
            if reading.is_fresh(settings.cache_interval, Utc::now()) {
                debug!(
                    "Serving cached reading ({}s old)",
                    reading.age_at(Utc::now()).num_seconds()
                );
                self.record(|s| s.cache_hits += 1);
                return PendingLocation::ready(Ok(reading));
            }
        }

        if !self.provider.is_enabled() {
            debug!("Location services disabled, rejecting request");
            self.record(|s| s.disabled_rejections += 1);
            return PendingLocation::ready(Err(LocationError::ServicesDisabled));
        }

        let (tx, rx) = oneshot::channel();
        let started = {
            let mut acquisition = self.lock_acquisition();
            acquisition.waiters.push(tx);
            match acquisition.state {
                AcquisitionState::Idle => {
                    acquisition.state = AcquisitionState::InProgress;
                    acquisition.generation += 1;
                    Some(acquisition.generation)
                }
                AcquisitionState::InProgress => {
                    debug!(
                        "Coalescing request - {} waiter(s) on in-flight acquisition",
                        acquisition.waiters.len()
                    );
                    None
                }
            }
        };

        if let Some(generation) = started {
            debug!("Starting acquisition #{generation}");
            self.record(|s| s.acquisitions_started += 1);
            self.sync_provider();
            self.arm_deadline(generation, settings.acquisition_timeout);
        } else {
            self.record(|s| s.coalesced_requests += 1);
        }

        PendingLocation::waiting(rx)
    }

    /// Drains the waiter list, returns to Idle and stops the provider, but
    /// only if acquisition `generation` is still the one in progress.
    fn finish(&self, generation: u64) -> Option<Vec<Waiter>> {
        let waiters = {
            let mut acquisition = self.lock_acquisition();
            if acquisition.state != AcquisitionState::InProgress
                || acquisition.generation != generation
            {
                return None;
            }
            acquisition.state = AcquisitionState::Idle;
            mem::take(&mut acquisition.waiters)
        };
        self.sync_provider();
        Some(waiters)
    }

    /// Finishes after the provider reported back.
    ///
    /// A provider that reports is running, so it gets a stop even when the
    /// coordinator was already idle.
    fn finish_reported(&self) -> Vec<Waiter> {
        let waiters = {
            let mut acquisition = self.lock_acquisition();
            acquisition.state = AcquisitionState::Idle;
            acquisition.updating = true;
            mem::take(&mut acquisition.waiters)
        };
        self.sync_provider();
        waiters
    }

    /// Issues start/stop calls until the provider matches the acquisition
    /// state.
    ///
    /// Only one thread drives the provider at a time. Any other thread that
    /// changes the state while a call is in flight just returns; the driving
    /// thread sees the change on its next pass. Calls are made outside the
    /// lock because a provider may deliver synchronously from inside
    /// `start_updates`.
    fn sync_provider(&self) {
        {
            let mut acquisition = self.lock_acquisition();
            if acquisition.syncing {
                return;
            }
            acquisition.syncing = true;
        }

        loop {
            let start = {
                let mut acquisition = self.lock_acquisition();
                let wanted = acquisition.state == AcquisitionState::InProgress;
                if wanted == acquisition.updating {
                    acquisition.syncing = false;
                    return;
                }
                acquisition.updating = wanted;
                wanted
            };

            if start {
                self.provider.start_updates();
            } else {
                debug!("Stopping provider updates");
                self.provider.stop_updates();
            }
        }
    }

    pub(crate) fn handle_readings(&self, readings: &[Reading]) {
        let preference = self.settings().preference;
        let Some(best) = select_best_reading(readings, preference).cloned() else {
            warn!("No reading could be selected from the batch, ignoring");
            return;
        };

        let waiters = self.finish_reported();

        if waiters.is_empty() {
            warn!("Provider delivered readings with nobody waiting");
            self.record(|s| s.spurious_events += 1);
            return;
        }

        info!(
            "Resolving {} waiter(s) with reading (±{}m) from a batch of {}",
            waiters.len(),
            best.horizontal_accuracy,
            readings.len()
        );
        self.record(|s| s.deliveries += 1);
        fan_out(waiters, &Ok(best));
    }

    pub(crate) fn handle_error(&self, error: LocationError) {
        let waiters = self.finish_reported();

        if waiters.is_empty() {
            warn!("Provider reported an error with nobody waiting: {error}");
            self.record(|s| s.spurious_events += 1);
            return;
        }

        info!("Rejecting {} waiter(s): {error}", waiters.len());
        self.record(|s| s.failures += 1);
        fan_out(waiters, &Err(error));
    }

    fn arm_deadline(self: &Arc<Self>, generation: u64, timeout: Option<Duration>) {
        let Some(timeout) = timeout else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No tokio runtime available, acquisition #{generation} has no deadline");
            return;
        };

        let core = Arc::downgrade(self);
        let timer = runtime.spawn({
            let core = core.clone();
            async move {
                tokio::time::sleep(timeout).await;
                if let Some(core) = core.upgrade() {
                    core.expire(generation, LocationError::Timeout(timeout));
                }
            }
        });

        // A runtime built without its time driver panics inside the timer
        // task; the acquisition must not be left pending on a dead deadline.
        runtime.spawn(async move {
            let Err(err) = timer.await else {
                return;
            };
            if err.is_panic() {
                warn!("Deadline timer for acquisition #{generation} failed: {err}");
                if let Some(core) = core.upgrade() {
                    core.expire(generation, LocationError::TimerUnavailable);
                }
            }
        });
    }

    fn expire(&self, generation: u64, error: LocationError) {
        let Some(waiters) = self.finish(generation) else {
            return;
        };

        warn!(
            "Acquisition #{generation} ended without a reading ({error}), rejecting {} waiter(s)",
            waiters.len()
        );
        self.record(|s| s.failures += 1);
        fan_out(waiters, &Err(error));
    }
}

fn fan_out(waiters: Vec<Waiter>, outcome: &LocationResult<Reading>) {
    for waiter in waiters {
        if waiter.send(outcome.clone()).is_err() {
            debug!("Waiter went away before its request resolved");
        }
    }
}

/// Single entry point for "current best position" queries.
///
/// Concurrent callers share one provider acquisition. The coordinator owns
/// the provider's start/stop lifecycle; dropping it stops a running
/// acquisition and rejects outstanding requests with
/// [`LocationError::Abandoned`].
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use fixpoint_core::location::LocationCoordinator;
///
/// let coordinator = LocationCoordinator::new(Arc::new(platform_provider));
///
/// // Both calls share one acquisition
/// let (a, b) = tokio::join!(coordinator.current_location(), coordinator.current_location());
/// assert_eq!(a?, b?);
/// ```
pub struct LocationCoordinator {
    core: Arc<CoordinatorCore>,
}

impl LocationCoordinator {
    /// Creates a coordinator with default configuration.
    ///
    /// Configures the provider's desired accuracy and registers the
    /// adapter as its event handler.
    #[must_use]
    pub fn new(provider: Arc<dyn LocationProvider>) -> Self {
        Self::with_config(provider, &CoordinatorConfig::default())
    }

    /// Creates a coordinator with the given configuration.
    #[must_use]
    pub fn with_config(provider: Arc<dyn LocationProvider>, config: &CoordinatorConfig) -> Self {
        let settings = Settings::from(config);
        provider.set_desired_accuracy(settings.desired_accuracy);

        let core = Arc::new(CoordinatorCore {
            provider,
            acquisition: Mutex::new(Acquisition::default()),
            settings: RwLock::new(settings),
            stats: Mutex::new(AcquisitionStats::default()),
        });
        core.provider.set_event_handler(ProviderAdapter::new(&core));

        Self { core }
    }

    /// Requests the current best position.
    ///
    /// Registration happens when this method is called; the returned future
    /// only waits for the outcome and does not borrow the coordinator.
    pub fn current_location(&self) -> PendingLocation {
        self.core.request()
    }

    /// Returns a new handle to the adapter registered with the provider.
    #[must_use]
    pub fn adapter(&self) -> ProviderAdapter {
        ProviderAdapter::new(&self.core)
    }

    /// Current acquisition state.
    #[must_use]
    pub fn state(&self) -> AcquisitionState {
        self.core.lock_acquisition().state
    }

    /// Number of callers waiting on the current acquisition.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.core.lock_acquisition().waiters.len()
    }

    /// Snapshot of request counters.
    #[must_use]
    pub fn stats(&self) -> AcquisitionStats {
        *self.core.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Tie-break used for future selections.
    #[must_use]
    pub fn preference(&self) -> QualityPreference {
        self.core.settings().preference
    }

    /// Changes the tie-break. Affects only selections made after this call.
    pub fn set_preference(&self, preference: QualityPreference) {
        self.core.update_settings(|s| s.preference = preference);
    }

    /// Freshness window for the provider's last-known reading.
    #[must_use]
    pub fn cache_interval(&self) -> chrono::Duration {
        self.core.settings().cache_interval
    }

    /// Changes the freshness window. Zero or negative disables the cache.
    pub fn set_cache_interval(&self, interval: chrono::Duration) {
        self.core.update_settings(|s| s.cache_interval = interval);
    }

    /// Accuracy currently forwarded to the provider.
    #[must_use]
    pub fn desired_accuracy(&self) -> DesiredAccuracy {
        self.core.settings().desired_accuracy
    }

    /// Changes the desired accuracy and forwards it to the provider.
    pub fn set_desired_accuracy(&self, accuracy: DesiredAccuracy) {
        self.core.update_settings(|s| s.desired_accuracy = accuracy);
        self.core.provider.set_desired_accuracy(accuracy);
    }

    /// Deadline applied to acquisitions started from now on.
    #[must_use]
    pub fn acquisition_timeout(&self) -> Option<Duration> {
        self.core.settings().acquisition_timeout
    }

    /// Changes the acquisition deadline. A running acquisition keeps the
    /// deadline it started with.
    pub fn set_acquisition_timeout(&self, timeout: Option<Duration>) {
        self.core.update_settings(|s| s.acquisition_timeout = timeout);
    }

    /// Authorization state as reported by the provider.
    #[must_use]
    pub fn authorization_status(&self) -> AuthorizationStatus {
        self.core.provider.authorization_status()
    }

    /// Whether the provider reports location services as enabled.
    #[must_use]
    pub fn is_location_enabled(&self) -> bool {
        self.core.provider.is_enabled()
    }
}

impl Drop for LocationCoordinator {
    fn drop(&mut self) {
        let abandoned = {
            let mut acquisition = self.core.lock_acquisition();
            if acquisition.state == AcquisitionState::InProgress {
                debug!(
                    "Coordinator dropped with {} waiter(s), stopping provider updates",
                    acquisition.waiters.len()
                );
            }
            acquisition.state = AcquisitionState::Idle;
            mem::take(&mut acquisition.waiters)
        };
        self.core.sync_provider();
        // Closing the channels resolves the futures to `Abandoned`.
        drop(abandoned);
    }
}

impl std::fmt::Debug for LocationCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationCoordinator")
            .field("state", &self.state())
            .field("pending_requests", &self.pending_requests())
            .finish_non_exhaustive()
    }
}

/// Outcome of a [`LocationCoordinator::current_location`] call.
///
/// Resolves immediately for cache hits and disabled services, otherwise when
/// the shared acquisition finishes.
#[must_use = "futures do nothing unless polled"]
#[derive(Debug)]
pub struct PendingLocation {
    inner: Pending,
}

#[derive(Debug)]
enum Pending {
    Ready(Option<LocationResult<Reading>>),
    Waiting(oneshot::Receiver<LocationResult<Reading>>),
}

impl PendingLocation {
    const fn ready(outcome: LocationResult<Reading>) -> Self {
        Self {
            inner: Pending::Ready(Some(outcome)),
        }
    }

    const fn waiting(rx: oneshot::Receiver<LocationResult<Reading>>) -> Self {
        Self {
            inner: Pending::Waiting(rx),
        }
    }

    /// Returns true if this request joined an acquisition rather than being
    /// answered on the spot.
    #[must_use]
    pub const fn is_waiting(&self) -> bool {
        matches!(self.inner, Pending::Waiting(_))
    }
}

impl Future for PendingLocation {
    type Output = LocationResult<Reading>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().inner {
            Pending::Ready(outcome) => {
                Poll::Ready(outcome.take().unwrap_or(Err(LocationError::Abandoned)))
            }
            Pending::Waiting(rx) => Pin::new(rx)
                .poll(cx)
                .map(|received| received.unwrap_or(Err(LocationError::Abandoned))),
        }
    }
}
