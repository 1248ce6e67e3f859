use chrono::NaiveDateTime;
use diesel::{Identifiable, Insertable, Queryable};
use serde::{Deserialize, Serialize};

use crate::schema::work_sessions;

/// One contiguous work interval owned by the ledger.
///
/// A session is created open (`end_time` null) and mutated exactly once, by
/// the end transition. At most one open row may exist per `employee_code`;
/// the partial unique index in the migration enforces that.
#[derive(Queryable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = work_sessions)]
pub struct WorkSession {
    pub id: i32,
    pub user_id: String, // Opaque correlation token supplied by the client
    pub employee_code: String,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    pub duration_seconds: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
}

impl WorkSession {
    /// Status is derived, never stored: a session is active until it has an
    /// `end_time`.
    pub fn status(&self) -> SessionStatus {
        if self.end_time.is_none() {
            SessionStatus::Active
        } else {
            SessionStatus::Completed
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = work_sessions)]
pub struct NewWorkSession {
    pub user_id: String,
    pub employee_code: String,
    pub start_time: NaiveDateTime,
}
