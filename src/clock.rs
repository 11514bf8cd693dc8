//! Wall-clock timestamps.
//!
//! Log entries, health checks and failure injections are stamped in seconds since
//! the Unix epoch as `f64`, so switchover arithmetic is a plain subtraction.

use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch.
pub type Timestamp = f64;

/// Current wall-clock time.
pub fn unix_now() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Round `value` to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
