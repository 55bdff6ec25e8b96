//! Location data types.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Which quality a caller prefers when several readings arrive together.
///
/// Only affects the tie-break inside
/// [`select_best_reading`](crate::location::select_best_reading).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreference {
    /// Keep the incumbent unless a candidate is better on both accuracy axes.
    #[default]
    MostAccurate,
    /// A strictly newer reading wins even when its accuracy is worse.
    MostRecent,
}

/// A single position sample reported by the location provider.
///
/// Accuracy values are radii in meters; smaller is better. The coordinator
/// never mutates a reading, it only compares them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Latitude in degrees.
    pub latitude: f64,

    /// Longitude in degrees.
    pub longitude: f64,

    /// Altitude in meters, when the provider reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,

    /// Horizontal accuracy radius in meters.
    pub horizontal_accuracy: f64,

    /// Vertical accuracy in meters.
    pub vertical_accuracy: f64,

    /// When the provider took the sample (UTC).
    pub timestamp: DateTime<Utc>,
}

impl Reading {
    /// Creates a reading without altitude.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use fixpoint_core::location::Reading;
    ///
    /// let reading = Reading::new(37.7749, -122.4194, 5.0, 8.0, Utc::now());
    /// assert_eq!(reading.horizontal_accuracy, 5.0);
    /// assert!(reading.altitude.is_none());
    /// ```
    #[must_use]
    pub const fn new(
        latitude: f64,
        longitude: f64,
        horizontal_accuracy: f64,
        vertical_accuracy: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            horizontal_accuracy,
            vertical_accuracy,
            timestamp,
        }
    }

    /// Returns this reading with an altitude attached.
    #[must_use]
    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    /// Age of the reading relative to `now`.
    ///
    /// Negative when the timestamp lies in the future.
    #[must_use]
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now - self.timestamp
    }

    /// Returns true if this reading may be served from cache at `now`.
    ///
    /// A window of zero or less never matches.
    #[must_use]
    pub fn is_fresh(&self, window: Duration, now: DateTime<Utc>) -> bool {
        window > Duration::zero() && self.age_at(now) <= window
    }

    /// Returns true if `self` is strictly better than `other` on both the
    /// horizontal and the vertical axis.
    #[must_use]
    pub fn is_strictly_more_accurate_than(&self, other: &Self) -> bool {
        self.horizontal_accuracy < other.horizontal_accuracy
            && self.vertical_accuracy < other.vertical_accuracy
    }
}

/// Accuracy the provider should aim for, in meters.
///
/// The coordinator forwards this value to the provider untouched.
///
/// | Preset | Meters |
/// |--------|--------|
/// | `BEST_FOR_NAVIGATION` | -2 |
/// | `BEST` | -1 |
/// | `NEAREST_TEN_METERS` | 10 |
/// | `HUNDRED_METERS` | 100 |
/// | `KILOMETER` | 1000 |
/// | `THREE_KILOMETERS` | 3000 |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesiredAccuracy(pub f64);

impl DesiredAccuracy {
    /// Highest precision plus additional sensor data, for navigation use.
    pub const BEST_FOR_NAVIGATION: Self = Self(-2.0);

    /// Highest precision the hardware can provide.
    pub const BEST: Self = Self(-1.0);

    /// Within ten meters.
    pub const NEAREST_TEN_METERS: Self = Self(10.0);

    /// Within one hundred meters.
    pub const HUNDRED_METERS: Self = Self(100.0);

    /// Within one kilometer.
    pub const KILOMETER: Self = Self(1_000.0);

    /// Within three kilometers.
    pub const THREE_KILOMETERS: Self = Self(3_000.0);

    /// Returns the raw value in meters.
    #[must_use]
    pub const fn meters(self) -> f64 {
        self.0
    }
}

impl Default for DesiredAccuracy {
    fn default() -> Self {
        Self::BEST
    }
}

/// Authorization state as reported by the provider.
///
/// Passed through to callers; the coordinator does not act on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AuthorizationStatus {
    /// The user has not been asked yet.
    #[default]
    NotDetermined,
    /// Access is restricted by policy (parental controls etc).
    Restricted,
    /// The user declined access.
    Denied,
    /// Access granted at all times.
    AuthorizedAlways,
    /// Access granted while the app is in use.
    AuthorizedWhenInUse,
}

/// Whether an acquisition is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcquisitionState {
    /// No provider updates requested.
    #[default]
    Idle,
    /// Provider updates are running and callers may be waiting.
    InProgress,
}

/// Counters describing how requests were served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcquisitionStats {
    /// Every call to `current_location`.
    pub total_requests: u64,
    /// Calls answered from the provider's last-known reading.
    pub cache_hits: u64,
    /// Calls rejected because location services were off.
    pub disabled_rejections: u64,
    /// Calls that started a new acquisition.
    pub acquisitions_started: u64,
    /// Calls that joined an acquisition already in progress.
    pub coalesced_requests: u64,
    /// Acquisitions resolved with a reading.
    pub deliveries: u64,
    /// Acquisitions rejected with an error (provider or timeout).
    pub failures: u64,
    /// Provider events that arrived with nobody waiting.
    pub spurious_events: u64,
}

impl AcquisitionStats {
    /// Share of acquisition-bound requests that were coalesced (0.0 to 1.0).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn coalescing_ratio(&self) -> f64 {
        let waited = self.acquisitions_started + self.coalesced_requests;
        if waited == 0 {
            0.0
        } else {
            self.coalesced_requests as f64 / waited as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(h: f64, v: f64) -> Reading {
        Reading::new(37.7749, -122.4194, h, v, Utc::now())
    }

    #[test]
    fn quality_preference_default_is_most_accurate() {
        assert_eq!(QualityPreference::default(), QualityPreference::MostAccurate);
    }

    #[test]
    fn reading_with_altitude() {
        let r = reading(5.0, 5.0).with_altitude(120.5);
        assert_eq!(r.altitude, Some(120.5));
    }

    #[test]
    fn reading_fresh_inside_window() {
        let now = Utc::now();
        let mut r = reading(5.0, 5.0);
        r.timestamp = now - Duration::seconds(10);

        assert!(r.is_fresh(Duration::seconds(60), now));
    }

    #[test]
    fn reading_stale_outside_window() {
        let now = Utc::now();
        let mut r = reading(5.0, 5.0);
        r.timestamp = now - Duration::seconds(120);

        assert!(!r.is_fresh(Duration::seconds(60), now));
    }

    #[test]
    fn reading_fresh_at_exact_window_boundary() {
        let now = Utc::now();
        let mut r = reading(5.0, 5.0);
        r.timestamp = now - Duration::seconds(60);

        assert!(r.is_fresh(Duration::seconds(60), now));
    }

    #[test]
    fn zero_or_negative_window_never_fresh() {
        let now = Utc::now();
        let mut r = reading(5.0, 5.0);
        r.timestamp = now;

        assert!(!r.is_fresh(Duration::zero(), now));
        assert!(!r.is_fresh(Duration::seconds(-30), now));
    }

    #[test]
    fn future_timestamp_counts_as_fresh() {
        let now = Utc::now();
        let mut r = reading(5.0, 5.0);
        r.timestamp = now + Duration::seconds(5);

        assert!(r.age_at(now) < Duration::zero());
        assert!(r.is_fresh(Duration::seconds(1), now));
    }

    #[test]
    fn strictly_more_accurate_requires_both_axes() {
        let a = reading(10.0, 10.0);

        assert!(reading(5.0, 5.0).is_strictly_more_accurate_than(&a));
        assert!(!reading(5.0, 20.0).is_strictly_more_accurate_than(&a));
        assert!(!reading(10.0, 5.0).is_strictly_more_accurate_than(&a));
        assert!(!reading(10.0, 10.0).is_strictly_more_accurate_than(&a));
    }

    #[test]
    fn desired_accuracy_default_is_best() {
        assert_eq!(DesiredAccuracy::default(), DesiredAccuracy::BEST);
        assert_eq!(DesiredAccuracy::KILOMETER.meters(), 1_000.0);
    }

    #[test]
    fn acquisition_state_default_is_idle() {
        assert_eq!(AcquisitionState::default(), AcquisitionState::Idle);
    }

    #[test]
    fn coalescing_ratio_empty_is_zero() {
        assert_eq!(AcquisitionStats::default().coalescing_ratio(), 0.0);
    }

    #[test]
    fn coalescing_ratio_counts_joined_requests() {
        let stats = AcquisitionStats {
            acquisitions_started: 1,
            coalesced_requests: 3,
            ..AcquisitionStats::default()
        };
        assert!((stats.coalescing_ratio() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn reading_json_omits_missing_altitude() {
        let json = serde_json::to_string(&reading(5.0, 5.0)).unwrap();

        assert!(!json.contains("altitude"));
        assert!(json.contains("horizontal_accuracy"));
        assert!(json.contains("timestamp"));
    }
}
