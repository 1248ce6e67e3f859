//! Startup reconciliation between the local cache and ledger truth.
//!
//! Runs once per activation, before any start/end command is allowed. The
//! outcome is total (every server-state x local-state pair has a defined
//! result) and idempotent (a second run with no intervening events reaches
//! the same state).

use tracing::{debug, info, warn};

use crate::cache::SessionCache;
use crate::error::StoreError;
use crate::ledger::{Ledger, SessionRecord};
use crate::session::{LocalSessionSnapshot, SessionRef};
use crate::store::KeyValueStore;

/// The well-defined state the agent is left in after reconciliation. There
/// is no third value: every path resolves to idle or active.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Active(LocalSessionSnapshot),
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active(_))
    }
}

/// Builds a snapshot from a ledger record adopted during reconciliation.
///
/// `local_start_time` stays empty: the client did not witness this start,
/// so durations must derive from the server's `start_time`.
fn adopt(record: &SessionRecord) -> LocalSessionSnapshot {
    LocalSessionSnapshot {
        session_ref: SessionRef::Confirmed(record.id),
        user_id: record.user_id.clone(),
        employee_code: record.employee_code.clone(),
        start_time: record.start_time,
        local_start_time: None,
    }
}

/// Aligns the cached snapshot with the ledger's active-session truth.
///
/// Ledger truth wins wherever the two disagree, with one exception: a
/// `Placeholder` snapshot never reached the server, so the server's silence
/// about it is not evidence of staleness. A transport failure leaves the
/// cache untouched - the ledger was unreachable, not authoritative.
pub async fn reconcile_on_activate<S: KeyValueStore, L: Ledger>(
    cache: &SessionCache<S>,
    ledger: &L,
) -> Result<SessionState, StoreError> {
    let employee = match cache.employee().await? {
        Some(employee) => employee,
        None => return Ok(SessionState::Idle),
    };

    let local = cache.snapshot().await?;

    let server = match ledger.active_session(&employee.employee_code).await {
        Ok(server) => server,
        Err(e) => {
            warn!("reconcile: ledger unreachable ({e}); keeping cached state");
            return Ok(match local {
                Some(snapshot) => SessionState::Active(snapshot),
                None => SessionState::Idle,
            });
        }
    };

    let state = match (server, local) {
        (Some(record), None) => {
            // Started elsewhere, or the cache was lost; resume from server.
            info!(
                "reconcile: adopting active session {} from the ledger",
                record.id
            );
            let snapshot = adopt(&record);
            cache.put_snapshot(&snapshot).await?;
            SessionState::Active(snapshot)
        }
        (Some(record), Some(snapshot))
            if snapshot.session_ref == SessionRef::Confirmed(record.id) =>
        {
            // Cache and ledger agree; keep the local capture for skew-free
            // duration display.
            debug!("reconcile: session {} confirmed by the ledger", record.id);
            SessionState::Active(snapshot)
        }
        (Some(record), Some(snapshot)) => {
            warn!(
                "reconcile: local session {} does not match ledger session {}; \
                 the ledger wins and the local session is abandoned",
                snapshot.session_ref, record.id
            );
            let snapshot = adopt(&record);
            cache.put_snapshot(&snapshot).await?;
            SessionState::Active(snapshot)
        }
        (None, Some(snapshot)) => match snapshot.session_ref {
            SessionRef::Confirmed(id) => {
                // The ledger no longer has it open: ended elsewhere or never
                // truly started. The cached copy is stale.
                info!("reconcile: discarding stale local session #{id}");
                cache.clear_snapshot().await?;
                SessionState::Idle
            }
            SessionRef::Placeholder(_) => {
                // Offline-started and still in progress; the sync engine
                // will report it once connectivity returns.
                info!(
                    "reconcile: keeping offline-started session {}",
                    snapshot.session_ref
                );
                SessionState::Active(snapshot)
            }
        },
        (None, None) => SessionState::Idle,
    };

    Ok(state)
}
