//! Error taxonomy for the agent.
//!
//! The split matters for recovery: `Conflict`, `AlreadyCompleted`,
//! `NotFound` and `InvalidDuration` are terminal outcomes handled by
//! reconciliation logic, while transport failures are the only class that
//! feeds the offline sync queue.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Failures at the network boundary. Always transient from the caller's
/// point of view: queue and retry, never drop a completed interval.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
}

/// Failures of the durable local store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("agent state I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt agent state: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Failures while resolving an employee code against the directory.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    #[error("employee code '{0}' is not a valid code")]
    InvalidCode(String),
    #[error("no employee found for code '{0}'")]
    NotFound(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Outcomes of a ledger start request that are not a new record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StartError {
    #[error("an active session already exists (session {existing_session_id})")]
    Conflict { existing_session_id: i32 },
    #[error("employee code not known to the ledger")]
    UnknownEmployee,
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Outcomes of a ledger end request that are not a completion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EndError {
    #[error("session not found on the ledger")]
    NotFound,
    #[error("session already completed at {previous_end_time}")]
    AlreadyCompleted { previous_end_time: NaiveDateTime },
    #[error("ledger rejected the duration (end precedes start)")]
    InvalidDuration,
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Top-level agent failures surfaced to the CLI.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("no employee identity cached; verify an employee code first")]
    NoIdentity,
    #[error("no active session to end")]
    NoActiveSession,
    #[error("a session is already active (started {0})")]
    AlreadyActive(NaiveDateTime),
    #[error("the ledger reported a conflict but its active session vanished; try again")]
    AdoptionRaced,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}
