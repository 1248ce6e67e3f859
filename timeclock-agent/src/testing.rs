//! Test support: in-memory store, scriptable ledger, fixed clock.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Mutex;

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::clock::Clock;
use crate::error::{EndError, LookupError, StartError, TransportError};
use crate::ledger::{EndSessionRequest, Ledger, SessionRecord, StartSessionRequest};
use crate::session::EmployeeIdentity;
use crate::store::KeyValueStore;

/// Volatile key-value store with the same contract as the file store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, crate::error::StoreError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), crate::error::StoreError> {
        self.entries.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), crate::error::StoreError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    employees: Vec<EmployeeIdentity>,
    sessions: Vec<SessionRecord>,
    next_id: i32,
    offline: bool,
    /// Session ids whose end requests fail at the transport layer.
    end_failures: HashSet<i32>,
    start_calls: usize,
    end_calls: usize,
}

/// In-memory ledger with the server's actual semantics: single active
/// session per employee, one-shot end, duration validation. Individual
/// failure modes can be scripted on top.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        let ledger = Self::default();
        ledger.state.lock().unwrap().next_id = 1;
        ledger
    }

    pub fn with_employee(self, code: &str, full_name: &str) -> Self {
        self.state.lock().unwrap().employees.push(EmployeeIdentity {
            user_id: uuid::Uuid::new_v4().to_string(),
            employee_code: code.to_string(),
            full_name: full_name.to_string(),
            role: "Dev".to_string(),
        });
        self
    }

    /// Makes every request fail with `NetworkUnavailable` until switched
    /// back.
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().unwrap().offline = offline;
    }

    /// Makes end requests for `id` fail at the transport layer.
    pub fn fail_end_for(&self, id: i32) {
        self.state.lock().unwrap().end_failures.insert(id);
    }

    pub fn clear_end_failures(&self) {
        self.state.lock().unwrap().end_failures.clear();
    }

    /// Inserts an already-open session, as if another device started it.
    pub fn seed_active_session(&self, code: &str, start_time: NaiveDateTime) -> SessionRecord {
        let mut state = self.state.lock().unwrap();
        let record = SessionRecord {
            id: state.next_id,
            user_id: uuid::Uuid::new_v4().to_string(),
            employee_code: code.to_string(),
            start_time,
            end_time: None,
            duration_seconds: None,
        };
        state.next_id += 1;
        state.sessions.push(record.clone());
        record
    }

    pub fn sessions_for(&self, code: &str) -> Vec<SessionRecord> {
        self.state
            .lock()
            .unwrap()
            .sessions
            .iter()
            .filter(|s| s.employee_code == code)
            .cloned()
            .collect()
    }

    pub fn session(&self, id: i32) -> Option<SessionRecord> {
        self.state
            .lock()
            .unwrap()
            .sessions
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    pub fn start_calls(&self) -> usize {
        self.state.lock().unwrap().start_calls
    }

    pub fn end_calls(&self) -> usize {
        self.state.lock().unwrap().end_calls
    }

    fn offline_error() -> TransportError {
        TransportError::NetworkUnavailable("fake ledger is offline".to_string())
    }
}

impl Ledger for InMemoryLedger {
    async fn lookup_employee(&self, code: &str) -> Result<EmployeeIdentity, LookupError> {
        let state = self.state.lock().unwrap();
        if state.offline {
            return Err(Self::offline_error().into());
        }
        state
            .employees
            .iter()
            .find(|e| e.employee_code == code)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(code.to_string()))
    }

    async fn start_session(&self, req: &StartSessionRequest) -> Result<SessionRecord, StartError> {
        let mut state = self.state.lock().unwrap();
        state.start_calls += 1;
        if state.offline {
            return Err(Self::offline_error().into());
        }
        if !state
            .employees
            .iter()
            .any(|e| e.employee_code == req.employee_code)
        {
            return Err(StartError::UnknownEmployee);
        }
        if let Some(existing) = state
            .sessions
            .iter()
            .find(|s| s.employee_code == req.employee_code && s.end_time.is_none())
        {
            return Err(StartError::Conflict {
                existing_session_id: existing.id,
            });
        }

        let record = SessionRecord {
            id: state.next_id,
            user_id: req.user_id.clone(),
            employee_code: req.employee_code.clone(),
            start_time: req.start_time,
            end_time: None,
            duration_seconds: None,
        };
        state.next_id += 1;
        state.sessions.push(record.clone());
        Ok(record)
    }

    async fn end_session(&self, id: i32, req: &EndSessionRequest) -> Result<SessionRecord, EndError> {
        let mut state = self.state.lock().unwrap();
        state.end_calls += 1;
        if state.offline {
            return Err(Self::offline_error().into());
        }
        if state.end_failures.contains(&id) {
            return Err(TransportError::NetworkUnavailable(format!(
                "scripted transport failure for session {id}"
            ))
            .into());
        }

        let session = match state.sessions.iter_mut().find(|s| s.id == id) {
            Some(s) => s,
            None => return Err(EndError::NotFound),
        };
        if let Some(previous_end_time) = session.end_time {
            return Err(EndError::AlreadyCompleted { previous_end_time });
        }
        if req.end_time < session.start_time {
            return Err(EndError::InvalidDuration);
        }

        session.end_time = Some(req.end_time);
        session.duration_seconds = Some(
            req.duration_seconds
                .unwrap_or_else(|| (req.end_time - session.start_time).num_seconds() as i32),
        );
        Ok(session.clone())
    }

    async fn active_session(
        &self,
        employee_code: &str,
    ) -> Result<Option<SessionRecord>, TransportError> {
        let state = self.state.lock().unwrap();
        if state.offline {
            return Err(Self::offline_error());
        }
        Ok(state
            .sessions
            .iter()
            .find(|s| s.employee_code == employee_code && s.end_time.is_none())
            .cloned())
    }
}

/// Clock pinned to a settable instant.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn at(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance_to(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }
}
