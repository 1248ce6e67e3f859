//! Client-side engine for the timeclock ledger.
//!
//! This crate owns the parts of clock in / clock out that have to survive an
//! unreliable network: the durable local session cache, the reconciliation
//! protocol that aligns cached belief with ledger truth on every activation,
//! and the offline sync engine that replays completed-but-unconfirmed
//! sessions. The binary in `main.rs` is a thin CLI over
//! [`workday::WorkdayController`].

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod ledger;
pub mod reconcile;
pub mod session;
pub mod store;
pub mod sync;
pub mod testing;
pub mod timer;
pub mod workday;
