//! Domain Services
//!
//! Pure submission-rate logic. No I/O.

use crate::domain::value_objects::FailureTimestampSeries;

const MILLISECONDS_PER_SECOND: f64 = 1000.0;

/// Submissions per second implied by the gap between the two most recent
/// failures. `None` when the gap is not positive.
pub fn submission_rate(series: &FailureTimestampSeries) -> Option<f64> {
    let interval_ms = series.interval_ms();
    if interval_ms <= 0 {
        return None;
    }
    Some(MILLISECONDS_PER_SECOND / interval_ms as f64)
}

/// Configured threshold expressed as submissions per second
pub fn threshold_rate(failure_threshold: u32, failure_range_secs: u64) -> f64 {
    f64::from(failure_threshold) / failure_range_secs as f64
}

/// Whether the failure pair is faster than the threshold allows.
/// A non-positive gap never throttles.
pub fn exceeds_threshold(series: &FailureTimestampSeries, threshold_rate: f64) -> bool {
    submission_rate(series).is_some_and(|rate| rate > threshold_rate)
}
