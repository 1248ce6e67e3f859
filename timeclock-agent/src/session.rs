//! Client-side session domain types.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reference to a session as the client knows it.
///
/// `Confirmed` carries the ledger-assigned id. `Placeholder` is a locally
/// generated token for a session whose start never reached the ledger; the
/// sync engine upgrades it to `Confirmed` once the ledger assigns identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SessionRef {
    Confirmed(i32),
    Placeholder(String),
}

impl SessionRef {
    /// Fresh placeholder token for an offline-started session.
    pub fn new_placeholder() -> Self {
        SessionRef::Placeholder(Uuid::new_v4().to_string())
    }

    pub fn confirmed_id(&self) -> Option<i32> {
        match self {
            SessionRef::Confirmed(id) => Some(*id),
            SessionRef::Placeholder(_) => None,
        }
    }
}

impl fmt::Display for SessionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionRef::Confirmed(id) => write!(f, "#{id}"),
            SessionRef::Placeholder(token) => write!(f, "local:{token}"),
        }
    }
}

/// Cached employee identity, resolved from the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeIdentity {
    pub user_id: String,
    pub employee_code: String,
    pub full_name: String,
    pub role: String,
}

/// The client's cached belief about its at-most-one active session.
///
/// Advisory, never authoritative: it must always be reconcilable against the
/// ledger. `local_start_time` is the client's own capture at clock-in and is
/// preferred for duration arithmetic so display never jitters with clock
/// skew against the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalSessionSnapshot {
    pub session_ref: SessionRef,
    pub user_id: String,
    pub employee_code: String,
    pub start_time: NaiveDateTime,
    pub local_start_time: Option<NaiveDateTime>,
}

/// A completed session the ledger has not yet confirmed.
///
/// Queued FIFO by `enqueued_at` and removed only on ledger confirmation;
/// a completed work interval is never silently dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSyncEntry {
    pub session_ref: SessionRef,
    pub user_id: String,
    pub employee_code: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub duration_seconds: i32,
    pub enqueued_at: NaiveDateTime,
}
