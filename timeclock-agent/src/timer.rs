//! Elapsed-time display for the active session.
//!
//! Purely derived from the snapshot and a `now` value: no side effects, safe
//! to recompute at any tick rate.

use chrono::{Duration, NaiveDateTime};

use crate::session::LocalSessionSnapshot;

/// Elapsed working time for an active session.
///
/// Prefers `local_start_time` - the client's own capture at clock-in - so
/// the display is immune to clock skew against the server. Falls back to the
/// server `start_time` for adopted sessions. Never negative.
pub fn elapsed(snapshot: &LocalSessionSnapshot, now: NaiveDateTime) -> Duration {
    let base = snapshot.local_start_time.unwrap_or(snapshot.start_time);
    let elapsed = now - base;
    if elapsed < Duration::zero() {
        Duration::zero()
    } else {
        elapsed
    }
}

/// Renders a duration as `HH:MM:SS`; hours grow past two digits rather than
/// wrapping.
pub fn format_hms(duration: Duration) -> String {
    let total = duration.num_seconds();
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}
