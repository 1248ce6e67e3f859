//! Offline sync engine: drains the pending-completion queue against the
//! ledger.
//!
//! Entries are processed strictly in enqueue order, one at a time. Within a
//! run, the first failure halts processing so later retries re-attempt
//! earlier failures first and a transient outage never amplifies into one
//! retry per queued entry. A failed entry stays queued; a completed work
//! interval is never dropped.

use tracing::{error, info, warn};

use crate::cache::SessionCache;
use crate::error::{EndError, StartError, StoreError};
use crate::ledger::{EndSessionRequest, Ledger, StartSessionRequest};
use crate::session::{PendingSyncEntry, SessionRef};
use crate::store::KeyValueStore;

/// Why a sync run stopped early.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncHalt {
    /// Ledger unreachable; retry on next connectivity.
    Transport,
    /// The referenced session is unknown to the ledger. Terminal for the
    /// entry; surfaced to the operator, entry kept.
    NotFound,
    /// The ledger rejected the recorded interval. Terminal; surfaced.
    InvalidDuration,
    /// A placeholder entry's synthesized start hit an active session.
    Conflict,
    /// A placeholder entry's employee code is unknown to the ledger.
    UnknownEmployee,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    /// Entries confirmed and removed this run.
    pub synced: usize,
    /// Entries still queued after the run.
    pub remaining: usize,
    /// Set when the run stopped at a failing entry.
    pub halted: Option<SyncHalt>,
}

enum EntryOutcome {
    Synced,
    Halted(SyncHalt),
}

/// Drains the queue front-to-back until it is empty or an entry fails.
pub async fn sync_pending<S: KeyValueStore, L: Ledger>(
    cache: &SessionCache<S>,
    ledger: &L,
) -> Result<SyncReport, StoreError> {
    let mut synced = 0;
    let mut halted = None;

    loop {
        let entries = cache.pending_entries().await?;
        let Some(entry) = entries.into_iter().next() else {
            break;
        };

        match sync_one(cache, ledger, entry).await? {
            EntryOutcome::Synced => synced += 1,
            EntryOutcome::Halted(halt) => {
                halted = Some(halt);
                break;
            }
        }
    }

    let remaining = cache.pending_entries().await?.len();
    if synced > 0 || remaining > 0 {
        info!("sync: {synced} confirmed, {remaining} still queued");
    }
    Ok(SyncReport {
        synced,
        remaining,
        halted,
    })
}

/// Pushes one entry to the ledger, removing it from the queue on
/// confirmation.
async fn sync_one<S: KeyValueStore, L: Ledger>(
    cache: &SessionCache<S>,
    ledger: &L,
    entry: PendingSyncEntry,
) -> Result<EntryOutcome, StoreError> {
    // A placeholder entry's start never reached the ledger: synthesize the
    // record first. The confirmed id is persisted into the queue before the
    // end attempt, so a failure between the two calls cannot create a
    // duplicate record on retry.
    let entry = match &entry.session_ref {
        SessionRef::Confirmed(_) => entry,
        SessionRef::Placeholder(token) => {
            let req = StartSessionRequest {
                user_id: entry.user_id.clone(),
                employee_code: entry.employee_code.clone(),
                start_time: entry.start_time,
            };
            match ledger.start_session(&req).await {
                Ok(record) => {
                    info!(
                        "sync: offline session local:{token} is now ledger session {}",
                        record.id
                    );
                    let upgraded = PendingSyncEntry {
                        session_ref: SessionRef::Confirmed(record.id),
                        ..entry.clone()
                    };
                    cache.replace_pending(&entry, &upgraded).await?;
                    upgraded
                }
                Err(StartError::Conflict {
                    existing_session_id,
                }) => {
                    warn!(
                        "sync: cannot record offline session local:{token}; session \
                         {existing_session_id} is still active on the ledger"
                    );
                    return Ok(EntryOutcome::Halted(SyncHalt::Conflict));
                }
                Err(StartError::UnknownEmployee) => {
                    error!(
                        "sync: offline session local:{token} references employee '{}' \
                         unknown to the ledger",
                        entry.employee_code
                    );
                    return Ok(EntryOutcome::Halted(SyncHalt::UnknownEmployee));
                }
                Err(StartError::Transport(e)) => {
                    warn!("sync: ledger unreachable while recording offline start ({e})");
                    return Ok(EntryOutcome::Halted(SyncHalt::Transport));
                }
            }
        }
    };

    let id = entry
        .session_ref
        .confirmed_id()
        .expect("entry is confirmed after the placeholder upgrade");

    let req = EndSessionRequest {
        end_time: entry.end_time,
        duration_seconds: Some(entry.duration_seconds),
    };
    match ledger.end_session(id, &req).await {
        Ok(_) => {
            cache.remove_pending(&entry).await?;
            Ok(EntryOutcome::Synced)
        }
        Err(EndError::AlreadyCompleted { previous_end_time }) => {
            // Someone else's end won; the interval is recorded. Idempotent
            // success.
            info!("sync: session {id} was already completed at {previous_end_time}");
            cache.remove_pending(&entry).await?;
            Ok(EntryOutcome::Synced)
        }
        Err(EndError::NotFound) => {
            error!("sync: session {id} is unknown to the ledger; entry kept for the operator");
            Ok(EntryOutcome::Halted(SyncHalt::NotFound))
        }
        Err(EndError::InvalidDuration) => {
            error!(
                "sync: ledger rejected the interval for session {id}; entry kept for the operator"
            );
            Ok(EntryOutcome::Halted(SyncHalt::InvalidDuration))
        }
        Err(EndError::Transport(e)) => {
            warn!("sync: ledger unreachable while completing session {id} ({e})");
            Ok(EntryOutcome::Halted(SyncHalt::Transport))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryLedger, MemoryStore};
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 8, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn confirmed_entry(id: i32, minute: u32) -> PendingSyncEntry {
        PendingSyncEntry {
            session_ref: SessionRef::Confirmed(id),
            user_id: "6f1f59ed-5218-46f2-82c2-9b128c48bb5c".to_string(),
            employee_code: "AIP001".to_string(),
            start_time: ts(9, minute),
            end_time: ts(17, minute),
            duration_seconds: 8 * 3600,
            enqueued_at: ts(17, minute),
        }
    }

    fn placeholder_entry() -> PendingSyncEntry {
        PendingSyncEntry {
            session_ref: SessionRef::new_placeholder(),
            user_id: "4977de15-67d8-4fde-8cbb-080ad256b7a3".to_string(),
            employee_code: "AIP001".to_string(),
            start_time: ts(9, 0),
            end_time: ts(12, 0),
            duration_seconds: 3 * 3600,
            enqueued_at: ts(12, 0),
        }
    }

    async fn cache_with(entries: &[PendingSyncEntry]) -> SessionCache<MemoryStore> {
        let cache = SessionCache::new(MemoryStore::new());
        for entry in entries {
            cache.enqueue_pending(entry).await.expect("enqueue");
        }
        cache
    }

    // The fake's seeding backdoor allows several open sessions at once,
    // which keeps these queue-ordering tests independent of end order.
    fn ledger_with_open_sessions(ids: &[i32]) -> InMemoryLedger {
        let ledger = InMemoryLedger::new().with_employee("AIP001", "Dana Whitfield");
        for id in ids {
            let record = ledger.seed_active_session("AIP001", ts(9, 0));
            assert_eq!(record.id, *id);
        }
        ledger
    }

    #[tokio::test]
    async fn test_failing_entry_halts_run_and_preserves_order() {
        // Three completed sessions queued; the ledger fails entry 2 at the
        // transport layer.
        let entries = [
            confirmed_entry(1, 1),
            confirmed_entry(2, 2),
            confirmed_entry(3, 3),
        ];
        let cache = cache_with(&entries).await;
        let ledger = ledger_with_open_sessions(&[1, 2, 3]);
        ledger.fail_end_for(2);

        let report = sync_pending(&cache, &ledger).await.expect("sync");
        assert_eq!(report.synced, 1);
        assert_eq!(report.remaining, 2);
        assert_eq!(report.halted, Some(SyncHalt::Transport));

        // Entries 2..N are still queued, in their original order.
        let remaining = cache.pending_entries().await.expect("pending");
        assert_eq!(
            remaining.iter().map(|e| e.session_ref.clone()).collect::<Vec<_>>(),
            vec![SessionRef::Confirmed(2), SessionRef::Confirmed(3)]
        );

        // A later run picks up where it halted.
        ledger.clear_end_failures();
        let report = sync_pending(&cache, &ledger).await.expect("sync");
        assert_eq!(report.synced, 2);
        assert_eq!(report.remaining, 0);
        assert_eq!(report.halted, None);
        assert_eq!(ledger.session(2).unwrap().end_time, Some(ts(17, 2)));
    }

    #[tokio::test]
    async fn test_already_completed_is_idempotent_success() {
        let entry = confirmed_entry(1, 0);
        let cache = cache_with(&[entry.clone()]).await;
        let ledger = ledger_with_open_sessions(&[1]);

        // Someone already ended session 1 with a different timestamp.
        ledger
            .end_session(
                1,
                &EndSessionRequest {
                    end_time: ts(16, 30),
                    duration_seconds: None,
                },
            )
            .await
            .expect("pre-complete");

        let report = sync_pending(&cache, &ledger).await.expect("sync");
        assert_eq!(report.synced, 1);
        assert_eq!(report.remaining, 0);
        // The first end stands.
        assert_eq!(ledger.session(1).unwrap().end_time, Some(ts(16, 30)));
    }

    #[tokio::test]
    async fn test_not_found_halts_but_keeps_entry() {
        let cache = cache_with(&[confirmed_entry(99, 0)]).await;
        let ledger = InMemoryLedger::new().with_employee("AIP001", "Dana Whitfield");

        let report = sync_pending(&cache, &ledger).await.expect("sync");
        assert_eq!(report.synced, 0);
        assert_eq!(report.remaining, 1);
        assert_eq!(report.halted, Some(SyncHalt::NotFound));
    }

    #[tokio::test]
    async fn test_placeholder_synthesizes_exactly_one_record() {
        let cache = cache_with(&[placeholder_entry()]).await;
        let ledger = InMemoryLedger::new().with_employee("AIP001", "Dana Whitfield");

        let report = sync_pending(&cache, &ledger).await.expect("sync");
        assert_eq!(report.synced, 1);
        assert_eq!(report.remaining, 0);

        let sessions = ledger.sessions_for("AIP001");
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].start_time, ts(9, 0));
        assert_eq!(sessions[0].end_time, Some(ts(12, 0)));
        assert_eq!(sessions[0].duration_seconds, Some(3 * 3600));
    }

    #[tokio::test]
    async fn test_placeholder_partial_failure_does_not_duplicate() {
        let cache = cache_with(&[placeholder_entry()]).await;
        let ledger = InMemoryLedger::new().with_employee("AIP001", "Dana Whitfield");
        // The synthesized start will get id 1; fail its end.
        ledger.fail_end_for(1);

        let report = sync_pending(&cache, &ledger).await.expect("sync");
        assert_eq!(report.synced, 0);
        assert_eq!(report.remaining, 1);
        assert_eq!(report.halted, Some(SyncHalt::Transport));

        // The queued entry now carries the confirmed id.
        let remaining = cache.pending_entries().await.expect("pending");
        assert_eq!(remaining[0].session_ref, SessionRef::Confirmed(1));

        // Retry completes the same record; no second start is issued.
        ledger.clear_end_failures();
        let starts_before_retry = ledger.start_calls();
        let report = sync_pending(&cache, &ledger).await.expect("sync");
        assert_eq!(report.synced, 1);
        assert_eq!(ledger.start_calls(), starts_before_retry);
        assert_eq!(ledger.sessions_for("AIP001").len(), 1);
        assert_eq!(ledger.session(1).unwrap().end_time, Some(ts(12, 0)));
    }

    #[tokio::test]
    async fn test_placeholder_start_conflict_halts_without_loss() {
        let cache = cache_with(&[placeholder_entry()]).await;
        let ledger = InMemoryLedger::new().with_employee("AIP001", "Dana Whitfield");
        ledger.seed_active_session("AIP001", ts(8, 0));

        let report = sync_pending(&cache, &ledger).await.expect("sync");
        assert_eq!(report.synced, 0);
        assert_eq!(report.remaining, 1);
        assert_eq!(report.halted, Some(SyncHalt::Conflict));

        // The entry is untouched and still a placeholder.
        let remaining = cache.pending_entries().await.expect("pending");
        assert!(matches!(remaining[0].session_ref, SessionRef::Placeholder(_)));
    }

    #[tokio::test]
    async fn test_empty_queue_is_a_clean_noop() {
        let cache = SessionCache::new(MemoryStore::new());
        let ledger = InMemoryLedger::new();

        let report = sync_pending(&cache, &ledger).await.expect("sync");
        assert_eq!(
            report,
            SyncReport {
                synced: 0,
                remaining: 0,
                halted: None
            }
        );
        assert_eq!(ledger.end_calls(), 0);
    }
}
