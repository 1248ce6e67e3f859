//! Orchestration of the clock in / clock out flows.
//!
//! [`WorkdayController`] owns the cache, the ledger transport and the clock,
//! and implements the outward operations the UI (here: the CLI) invokes.
//! Methods take `&mut self`, so a start cannot be re-entered while its
//! asynchronous result is still pending. Every path, including every failure
//! path, leaves the agent in a well-defined idle or active state.

use chrono::NaiveDateTime;
use regex::Regex;
use tracing::{info, warn};

use crate::cache::SessionCache;
use crate::clock::Clock;
use crate::error::{AgentError, EndError, LookupError, StartError};
use crate::ledger::{EndSessionRequest, Ledger, SessionRecord, StartSessionRequest};
use crate::reconcile::{SessionState, reconcile_on_activate};
use crate::session::{EmployeeIdentity, LocalSessionSnapshot, PendingSyncEntry, SessionRef};
use crate::store::KeyValueStore;
use crate::sync::{SyncReport, sync_pending};
use crate::timer;

/// Uppercase code, three to ten characters, letter first: AIP001 and the
/// like.
const EMPLOYEE_CODE_PATTERN: &str = r"^[A-Z][A-Z0-9]{2,9}$";

/// Flag threshold for a session nobody plausibly worked in one sitting.
const IMPLAUSIBLE_DURATION_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq)]
pub enum StartResult {
    /// The ledger opened a new session.
    Started(LocalSessionSnapshot),
    /// The ledger already had an active session (started from another
    /// context); the agent adopted it.
    AdoptedExisting(LocalSessionSnapshot),
    /// The ledger was unreachable; the session is tracked locally under a
    /// placeholder ref until connectivity returns.
    OfflineStarted(LocalSessionSnapshot),
}

impl StartResult {
    pub fn snapshot(&self) -> &LocalSessionSnapshot {
        match self {
            StartResult::Started(s)
            | StartResult::AdoptedExisting(s)
            | StartResult::OfflineStarted(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EndResult {
    /// The ledger confirmed the completion.
    Completed { duration_seconds: i32 },
    /// The ledger had already completed this session; its record stands.
    AlreadyCompleted { previous_end_time: NaiveDateTime },
    /// The completion could not be confirmed; it is durably queued and will
    /// be replayed by the sync engine.
    QueuedOffline { duration_seconds: i32 },
    /// The session no longer exists on the ledger; the local copy was
    /// discarded.
    ClearedStale,
}

/// Current agent state as shown by the `status` command.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentStatus {
    pub employee: Option<EmployeeIdentity>,
    pub state: SessionState,
    pub pending: usize,
}

pub struct WorkdayController<S, L, C> {
    cache: SessionCache<S>,
    ledger: L,
    clock: C,
}

impl<S: KeyValueStore, L: Ledger, C: Clock> WorkdayController<S, L, C> {
    pub fn new(cache: SessionCache<S>, ledger: L, clock: C) -> Self {
        Self {
            cache,
            ledger,
            clock,
        }
    }

    /// Runs the activation sequence: reconcile against ledger truth, then
    /// opportunistically drain the offline queue.
    pub async fn activate(&mut self) -> Result<(SessionState, Option<SyncReport>), AgentError> {
        let state = reconcile_on_activate(&self.cache, &self.ledger).await?;
        let report = if self.cache.pending_entries().await?.is_empty() {
            None
        } else {
            Some(sync_pending(&self.cache, &self.ledger).await?)
        };
        Ok((state, report))
    }

    /// Resolves and caches an employee identity from a human-entered code.
    ///
    /// Codes are normalized to uppercase before validation, the way the
    /// entry field always treated them. Switching to a different employee
    /// discards the previous snapshot - it belongs to the old identity.
    pub async fn verify_employee(&mut self, code: &str) -> Result<EmployeeIdentity, AgentError> {
        let code = code.trim().to_uppercase();
        let pattern = Regex::new(EMPLOYEE_CODE_PATTERN).expect("employee code pattern is valid");
        if !pattern.is_match(&code) {
            return Err(LookupError::InvalidCode(code).into());
        }

        let identity = self.ledger.lookup_employee(&code).await?;

        if let Some(previous) = self.cache.employee().await? {
            if previous.employee_code != identity.employee_code {
                self.cache.clear_snapshot().await?;
            }
        }
        self.cache.set_employee(&identity).await?;
        info!(
            "verified employee {} ({})",
            identity.employee_code, identity.full_name
        );
        Ok(identity)
    }

    /// Clocks in.
    ///
    /// With `code` given, the identity is (re)verified first; otherwise the
    /// cached identity is used. A transport failure falls back to an
    /// offline-started session rather than refusing to track work.
    pub async fn start_work_session(
        &mut self,
        code: Option<&str>,
    ) -> Result<StartResult, AgentError> {
        if let Some(code) = code {
            self.verify_employee(code).await?;
        }
        let employee = self.cache.employee().await?.ok_or(AgentError::NoIdentity)?;

        if let Some(snapshot) = self.cache.snapshot().await? {
            return Err(AgentError::AlreadyActive(snapshot.start_time));
        }

        let now = self.clock.now();
        let req = StartSessionRequest {
            user_id: employee.user_id.clone(),
            employee_code: employee.employee_code.clone(),
            start_time: now,
        };

        match self.ledger.start_session(&req).await {
            Ok(record) => {
                let snapshot = self.confirmed_snapshot(&record, Some(now));
                self.cache.put_snapshot(&snapshot).await?;
                Ok(StartResult::Started(snapshot))
            }
            Err(StartError::Conflict {
                existing_session_id,
            }) => {
                // Another context won the race (or a previous session never
                // got reconciled); adopt the winner.
                info!(
                    "start: ledger already has session {existing_session_id} active; adopting it"
                );
                match self.ledger.active_session(&employee.employee_code).await? {
                    Some(record) => {
                        let snapshot = self.confirmed_snapshot(&record, None);
                        self.cache.put_snapshot(&snapshot).await?;
                        Ok(StartResult::AdoptedExisting(snapshot))
                    }
                    None => Err(AgentError::AdoptionRaced),
                }
            }
            Err(StartError::UnknownEmployee) => {
                Err(LookupError::NotFound(employee.employee_code).into())
            }
            Err(StartError::Transport(e)) => {
                warn!("start: ledger unreachable ({e}); tracking the session offline");
                let snapshot = LocalSessionSnapshot {
                    session_ref: SessionRef::new_placeholder(),
                    user_id: employee.user_id,
                    employee_code: employee.employee_code,
                    start_time: now,
                    local_start_time: Some(now),
                };
                self.cache.put_snapshot(&snapshot).await?;
                Ok(StartResult::OfflineStarted(snapshot))
            }
        }
    }

    /// Clocks out.
    ///
    /// Whatever the ledger answers, the agent ends up idle and the interval
    /// ends up either confirmed or durably queued - a completed interval is
    /// never dropped on the floor.
    pub async fn end_work_session(&mut self) -> Result<EndResult, AgentError> {
        let snapshot = self
            .cache
            .snapshot()
            .await?
            .ok_or(AgentError::NoActiveSession)?;

        let now = self.clock.now();
        let elapsed = timer::elapsed(&snapshot, now);
        let duration_seconds = elapsed.num_seconds() as i32;
        if elapsed.num_seconds() > IMPLAUSIBLE_DURATION_SECS {
            warn!(
                "end: session ran {} - longer than a day; recording it anyway",
                timer::format_hms(elapsed)
            );
        }

        let confirmed_id = match snapshot.session_ref.confirmed_id() {
            Some(id) => id,
            None => {
                // Offline-started: the ledger has never heard of this
                // session, so there is nothing to end remotely. Queue the
                // whole interval.
                self.queue_completion(&snapshot, now, duration_seconds).await?;
                return Ok(EndResult::QueuedOffline { duration_seconds });
            }
        };

        let req = EndSessionRequest {
            end_time: now,
            duration_seconds: Some(duration_seconds),
        };
        match self.ledger.end_session(confirmed_id, &req).await {
            Ok(record) => {
                self.cache.clear_snapshot().await?;
                Ok(EndResult::Completed {
                    duration_seconds: record.duration_seconds.unwrap_or(duration_seconds),
                })
            }
            Err(EndError::AlreadyCompleted { previous_end_time }) => {
                self.cache.clear_snapshot().await?;
                Ok(EndResult::AlreadyCompleted { previous_end_time })
            }
            Err(EndError::NotFound) => {
                warn!("end: session {confirmed_id} vanished from the ledger; discarding it");
                self.cache.clear_snapshot().await?;
                Ok(EndResult::ClearedStale)
            }
            Err(EndError::InvalidDuration) => {
                // Flagged, but the interval is still recorded: payroll
                // accuracy beats tidiness.
                warn!(
                    "end: ledger rejected the interval for session {confirmed_id}; \
                     queueing it for the operator"
                );
                self.queue_completion(&snapshot, now, duration_seconds).await?;
                Ok(EndResult::QueuedOffline { duration_seconds })
            }
            Err(EndError::Transport(e)) => {
                warn!("end: ledger unreachable ({e}); queueing the completion");
                self.queue_completion(&snapshot, now, duration_seconds).await?;
                Ok(EndResult::QueuedOffline { duration_seconds })
            }
        }
    }

    /// Replays queued completions against the ledger.
    pub async fn sync_pending(&mut self) -> Result<SyncReport, AgentError> {
        Ok(sync_pending(&self.cache, &self.ledger).await?)
    }

    /// Forgets the cached identity and any active snapshot. Queued
    /// completions are kept: they are finished work, not identity state.
    pub async fn clear_identity(&mut self) -> Result<(), AgentError> {
        self.cache.clear_snapshot().await?;
        self.cache.clear_employee().await?;
        Ok(())
    }

    /// Reads the current state without touching the network.
    pub async fn status(&self) -> Result<AgentStatus, AgentError> {
        Ok(AgentStatus {
            employee: self.cache.employee().await?,
            state: match self.cache.snapshot().await? {
                Some(snapshot) => SessionState::Active(snapshot),
                None => SessionState::Idle,
            },
            pending: self.cache.pending_entries().await?.len(),
        })
    }

    fn confirmed_snapshot(
        &self,
        record: &SessionRecord,
        local_start_time: Option<NaiveDateTime>,
    ) -> LocalSessionSnapshot {
        LocalSessionSnapshot {
            session_ref: SessionRef::Confirmed(record.id),
            user_id: record.user_id.clone(),
            employee_code: record.employee_code.clone(),
            start_time: record.start_time,
            local_start_time,
        }
    }

    async fn queue_completion(
        &mut self,
        snapshot: &LocalSessionSnapshot,
        end_time: NaiveDateTime,
        duration_seconds: i32,
    ) -> Result<(), AgentError> {
        let entry = PendingSyncEntry {
            session_ref: snapshot.session_ref.clone(),
            user_id: snapshot.user_id.clone(),
            employee_code: snapshot.employee_code.clone(),
            start_time: snapshot.start_time,
            end_time,
            duration_seconds,
            enqueued_at: self.clock.now(),
        };
        self.cache.enqueue_pending(&entry).await?;
        self.cache.clear_snapshot().await?;
        Ok(())
    }
}
