//! Database operations for the session ledger.
//!
//! This module is the authoritative side of the clock in / clock out flow:
//! it creates open sessions, applies the one-shot end transition, and answers
//! active-session lookups. The single-active-session invariant is enforced by
//! the partial unique index on `work_sessions (employee_code) WHERE end_time
//! IS NULL`, so two racing start requests serialize inside SQLite rather than
//! through any application-level lock.

use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use diesel::sql_types::BigInt;

use chrono::{NaiveDateTime, Utc};

use crate::models::{NewWorkSession, WorkSession};
use crate::orm::employee::get_employee_by_code;

#[derive(QueryableByName)]
struct LastInsertRowId {
    #[diesel(sql_type = BigInt)]
    last_insert_rowid: i64,
}

/// Outcome of a start request. `Conflict` is a steady-state signal, not a
/// failure: the caller is expected to adopt the existing record.
#[derive(Debug)]
pub enum StartOutcome {
    Started(WorkSession),
    Conflict { existing: WorkSession },
    UnknownEmployee,
}

/// Outcome of an end request. End is a one-shot transition; every variant
/// other than `Completed` leaves the stored record untouched.
#[derive(Debug)]
pub enum EndOutcome {
    Completed(WorkSession),
    NotFound,
    AlreadyCompleted { end_time: NaiveDateTime },
    InvalidDuration { start_time: NaiveDateTime },
}

/// Opens a new session for an employee.
///
/// The insert itself is the active-session check: if the employee already has
/// an open row, the partial unique index rejects the insert and the currently
/// active record is returned as `Conflict`. Duplicate rapid starts are
/// therefore idempotent - the loser learns the winner's id.
///
/// # Arguments
/// * `conn` - SQLite connection
/// * `new_session` - user id, employee code and start time for the new row
pub fn start_session(
    conn: &mut SqliteConnection,
    new_session: NewWorkSession,
) -> Result<StartOutcome, diesel::result::Error> {
    use crate::schema::work_sessions::dsl::*;

    if get_employee_by_code(conn, &new_session.employee_code)?.is_none() {
        return Ok(StartOutcome::UnknownEmployee);
    }

    let code = new_session.employee_code.clone();
    match diesel::insert_into(work_sessions)
        .values(&new_session)
        .execute(conn)
    {
        Ok(_) => {
            let last_id = diesel::sql_query("SELECT last_insert_rowid() as last_insert_rowid")
                .get_result::<LastInsertRowId>(conn)?
                .last_insert_rowid;

            let record = work_sessions
                .filter(id.eq(last_id as i32))
                .first::<WorkSession>(conn)?;
            Ok(StartOutcome::Started(record))
        }
        Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info)) => {
            match get_active_session_by_code(conn, &code)? {
                Some(existing) => Ok(StartOutcome::Conflict { existing }),
                // The open row vanished between the insert and the lookup;
                // let the caller retry.
                None => Err(diesel::result::Error::DatabaseError(
                    DatabaseErrorKind::UniqueViolation,
                    info,
                )),
            }
        }
        Err(e) => Err(e),
    }
}

/// Applies the end transition to a session.
///
/// The mutation is a single guarded UPDATE (`WHERE id = ? AND end_time IS
/// NULL`), so two racing end requests cannot both win: the loser observes
/// zero affected rows and is answered with `AlreadyCompleted` carrying the
/// first winner's `end_time`.
///
/// # Arguments
/// * `conn` - SQLite connection
/// * `session_id` - ledger id of the session to close
/// * `end` - end timestamp; must not precede the recorded start
/// * `duration` - duration in whole seconds; computed from the record when
///   omitted
pub fn end_session(
    conn: &mut SqliteConnection,
    session_id: i32,
    end: NaiveDateTime,
    duration: Option<i32>,
) -> Result<EndOutcome, diesel::result::Error> {
    use crate::schema::work_sessions::dsl::*;

    let record = work_sessions
        .filter(id.eq(session_id))
        .first::<WorkSession>(conn)
        .optional()?;

    let record = match record {
        Some(r) => r,
        None => return Ok(EndOutcome::NotFound),
    };

    if let Some(prev) = record.end_time {
        return Ok(EndOutcome::AlreadyCompleted { end_time: prev });
    }

    if end < record.start_time {
        return Ok(EndOutcome::InvalidDuration {
            start_time: record.start_time,
        });
    }

    let secs = match duration {
        Some(d) if d < 0 => {
            return Ok(EndOutcome::InvalidDuration {
                start_time: record.start_time,
            });
        }
        Some(d) => d,
        None => (end - record.start_time).num_seconds() as i32,
    };

    let now = Utc::now().naive_utc();
    let updated_rows = diesel::update(
        work_sessions
            .filter(id.eq(session_id))
            .filter(end_time.is_null()),
    )
    .set((
        end_time.eq(Some(end)),
        duration_seconds.eq(Some(secs)),
        updated_at.eq(Some(now)),
    ))
    .execute(conn)?;

    if updated_rows == 0 {
        // Lost a race with a concurrent end; report the winner's timestamp.
        let current = work_sessions
            .filter(id.eq(session_id))
            .first::<WorkSession>(conn)?;
        return Ok(EndOutcome::AlreadyCompleted {
            end_time: current.end_time.expect("guarded update lost to a completed end"),
        });
    }

    let updated = work_sessions
        .filter(id.eq(session_id))
        .first::<WorkSession>(conn)?;
    Ok(EndOutcome::Completed(updated))
}

/// Returns the at-most-one open session for an employee code.
pub fn get_active_session_by_code(
    conn: &mut SqliteConnection,
    code: &str,
) -> Result<Option<WorkSession>, diesel::result::Error> {
    use crate::schema::work_sessions::dsl::*;

    work_sessions
        .filter(employee_code.eq(code))
        .filter(end_time.is_null())
        .first::<WorkSession>(conn)
        .optional()
}

/// Returns the at-most-one open session for an opaque user identifier.
pub fn get_active_session_by_user(
    conn: &mut SqliteConnection,
    user: &str,
) -> Result<Option<WorkSession>, diesel::result::Error> {
    use crate::schema::work_sessions::dsl::*;

    work_sessions
        .filter(user_id.eq(user))
        .filter(end_time.is_null())
        .order(start_time.desc())
        .first::<WorkSession>(conn)
        .optional()
}

/// Returns an employee's session history, newest first.
pub fn list_sessions_by_code(
    conn: &mut SqliteConnection,
    code: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<WorkSession>, diesel::result::Error> {
    use crate::schema::work_sessions::dsl::*;

    work_sessions
        .filter(employee_code.eq(code))
        .order(start_time.desc())
        .limit(limit)
        .offset(offset)
        .load::<WorkSession>(conn)
}
