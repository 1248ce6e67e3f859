//! Time source abstraction.
//!
//! Every timestamp the agent captures goes through [`Clock`], so duration
//! arithmetic and reconciliation can be tested against a fixed time.

use chrono::{NaiveDateTime, Utc};

pub trait Clock {
    /// Current time in UTC.
    fn now(&self) -> NaiveDateTime;
}

/// Production clock backed by the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }
}
