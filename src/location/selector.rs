//! Best-reading selection.
//!
//! Providers often report several samples in one batch. The selector folds
//! over the batch keeping a running best:
//!
//! 1. The first reading becomes the incumbent
//! 2. Under [`QualityPreference::MostRecent`], a strictly newer reading wins
//! 3. Otherwise a candidate only wins if it is strictly better on both the
//!    horizontal and the vertical accuracy axis
//!
//! Ties and mixed comparisons keep the incumbent.

use super::types::{QualityPreference, Reading};

/// Picks the best reading from a batch.
///
/// Returns `None` only for an empty batch.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use fixpoint_core::location::{select_best_reading, QualityPreference, Reading};
///
/// let now = Utc::now();
/// let readings = [
///     Reading::new(37.77, -122.41, 10.0, 10.0, now),
///     Reading::new(37.78, -122.42, 5.0, 20.0, now),
/// ];
///
/// // The second reading is better horizontally but worse vertically.
/// let best = select_best_reading(&readings, QualityPreference::MostAccurate).unwrap();
/// assert_eq!(best.horizontal_accuracy, 10.0);
/// ```
#[must_use]
pub fn select_best_reading(
    readings: &[Reading],
    preference: QualityPreference,
) -> Option<&Reading> {
    readings.iter().fold(None, |best, candidate| match best {
        None => Some(candidate),
        Some(current) if replaces(current, candidate, preference) => Some(candidate),
        Some(current) => Some(current),
    })
}

fn replaces(current: &Reading, candidate: &Reading, preference: QualityPreference) -> bool {
    if preference == QualityPreference::MostRecent && candidate.timestamp > current.timestamp {
        return true;
    }
    candidate.is_strictly_more_accurate_than(current)
}
