//! API endpoints for the session ledger.
//!
//! These routes carry the clock in / clock out wire contract: opening a
//! session, applying the one-shot end transition, and the active-session
//! lookup that clients reconcile against on activation.

use chrono::NaiveDateTime;
use rocket::Route;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::{Json, Value, json};
use serde::{Deserialize, Serialize};

use crate::models::{NewWorkSession, WorkSession};
use crate::orm::DbConn;
use crate::orm::work_session::{
    EndOutcome, StartOutcome, end_session, get_active_session_by_code, get_active_session_by_user,
    list_sessions_by_code, start_session,
};

/// Sessions longer than a day are almost certainly a missed clock-out; they
/// are recorded anyway and flagged in the log.
const IMPLAUSIBLE_DURATION_SECS: i32 = 24 * 60 * 60;

#[derive(Deserialize)]
pub struct StartSessionRequest {
    pub user_id: String,
    pub employee_code: String,
    pub start_time: NaiveDateTime,
}

#[derive(Deserialize)]
pub struct EndSessionRequest {
    pub end_time: NaiveDateTime,
    pub duration_seconds: Option<i32>,
}

#[derive(Serialize)]
pub struct ActiveSessionResponse {
    pub active: bool,
    pub session: Option<WorkSession>,
}

/// Start Session endpoint.
///
/// - **URL:** `/api/1/sessions`
/// - **Method:** `POST`
/// - **Purpose:** Opens a new work session for an employee
///
/// # Request Format
///
/// ```json
/// {
///   "user_id": "a4f77fd0-032c-4b3c-8db5-00ef6b39a372",
///   "employee_code": "AIP001",
///   "start_time": "2025-08-01T10:00:00"
/// }
/// ```
///
/// # Response
///
/// **Success (HTTP 201 Created):** the new session record, `end_time` null.
///
/// **Conflict (HTTP 409):** the employee already has an open session; no new
/// record is created and the body names the winner:
/// ```json
/// {
///   "error": "Employee already has an active session",
///   "existing_session_id": 1
/// }
/// ```
///
/// # Returns
/// * `Ok(status::Created<Json<WorkSession>>)` - Session opened
/// * `Err(status::Custom<Json<Value>>)` - 404 unknown employee, 409 conflict,
///   500 database failure
#[post("/1/sessions", data = "<req>")]
pub async fn create_session(
    db: DbConn,
    req: Json<StartSessionRequest>,
) -> Result<status::Created<Json<WorkSession>>, status::Custom<Json<Value>>> {
    let req = req.into_inner();
    db.run(move |conn| {
        let new_session = NewWorkSession {
            user_id: req.user_id,
            employee_code: req.employee_code,
            start_time: req.start_time,
        };
        match start_session(conn, new_session) {
            Ok(StartOutcome::Started(record)) => {
                info!(
                    "Opened session {} for '{}' at {}",
                    record.id, record.employee_code, record.start_time
                );
                Ok(status::Created::new("/").body(Json(record)))
            }
            Ok(StartOutcome::Conflict { existing }) => Err(status::Custom(
                Status::Conflict,
                Json(json!({
                    "error": "Employee already has an active session",
                    "existing_session_id": existing.id
                })),
            )),
            Ok(StartOutcome::UnknownEmployee) => Err(status::Custom(
                Status::NotFound,
                Json(json!({ "error": "Employee code not found" })),
            )),
            Err(e) => {
                error!("Error creating session: {:?}", e);
                Err(status::Custom(
                    Status::InternalServerError,
                    Json(json!({ "error": "Database error while creating session" })),
                ))
            }
        }
    })
    .await
}

/// End Session endpoint.
///
/// - **URL:** `/api/1/sessions/<id>`
/// - **Method:** `PUT`
/// - **Purpose:** Applies the one-shot end transition to a session
///
/// # Request Format
///
/// ```json
/// {
///   "end_time": "2025-08-01T10:30:00",
///   "duration_seconds": 1800
/// }
/// ```
///
/// `duration_seconds` may be omitted; it is then computed from the recorded
/// start time in whole seconds.
///
/// # Response
///
/// **Success (HTTP 200 OK):** the completed record.
///
/// **Already completed (HTTP 409):** end is not a settable field; the body
/// carries the original end time:
/// ```json
/// {
///   "error": "Session already completed",
///   "previous_end_time": "2025-08-01T10:30:00"
/// }
/// ```
///
/// # Returns
/// * `Ok(Json<WorkSession>)` - Session completed
/// * `Err(status::Custom<Json<Value>>)` - 400 end before start, 404 unknown
///   id, 409 already completed, 500 database failure
#[put("/1/sessions/<id>", data = "<req>")]
pub async fn complete_session(
    db: DbConn,
    id: i32,
    req: Json<EndSessionRequest>,
) -> Result<Json<WorkSession>, status::Custom<Json<Value>>> {
    let req = req.into_inner();
    db.run(move |conn| {
        match end_session(conn, id, req.end_time, req.duration_seconds) {
            Ok(EndOutcome::Completed(record)) => {
                if record.duration_seconds.unwrap_or(0) > IMPLAUSIBLE_DURATION_SECS {
                    warn!(
                        "Session {} for '{}' recorded an implausible duration of {}s",
                        record.id,
                        record.employee_code,
                        record.duration_seconds.unwrap_or(0)
                    );
                }
                info!(
                    "Completed session {} for '{}' at {}",
                    record.id, record.employee_code, req.end_time
                );
                Ok(Json(record))
            }
            Ok(EndOutcome::NotFound) => Err(status::Custom(
                Status::NotFound,
                Json(json!({ "error": "Session not found" })),
            )),
            Ok(EndOutcome::AlreadyCompleted { end_time }) => Err(status::Custom(
                Status::Conflict,
                Json(json!({
                    "error": "Session already completed",
                    "previous_end_time": end_time
                })),
            )),
            Ok(EndOutcome::InvalidDuration { start_time }) => Err(status::Custom(
                Status::BadRequest,
                Json(json!({
                    "error": "Invalid duration: end time must not precede start time",
                    "start_time": start_time
                })),
            )),
            Err(e) => {
                error!("Error completing session {}: {:?}", id, e);
                Err(status::Custom(
                    Status::InternalServerError,
                    Json(json!({ "error": "Database error while completing session" })),
                ))
            }
        }
    })
    .await
}

/// Active Session endpoint.
///
/// - **URL:** `/api/1/sessions/active?employee_code=AIP001`
/// - **Method:** `GET`
/// - **Purpose:** Returns the at-most-one open session for an employee
///
/// Either `employee_code` or `user_id` must be supplied; `employee_code` is
/// the stable selector and wins when both are present.
///
/// # Response
///
/// **Success (HTTP 200 OK):**
/// ```json
/// { "active": true, "session": { "id": 1, "...": "..." } }
/// ```
#[get("/1/sessions/active?<employee_code>&<user_id>")]
pub async fn active_session(
    db: DbConn,
    employee_code: Option<String>,
    user_id: Option<String>,
) -> Result<Json<ActiveSessionResponse>, Status> {
    if employee_code.is_none() && user_id.is_none() {
        return Err(Status::BadRequest);
    }
    db.run(move |conn| {
        let session = match (&employee_code, &user_id) {
            (Some(code), _) => get_active_session_by_code(conn, code),
            (None, Some(user)) => get_active_session_by_user(conn, user),
            (None, None) => unreachable!(),
        }
        .map_err(|_| Status::InternalServerError)?;

        Ok(Json(ActiveSessionResponse {
            active: session.is_some(),
            session,
        }))
    })
    .await
}

/// Session History endpoint.
///
/// - **URL:** `/api/1/sessions?employee_code=AIP001&limit=50&offset=0`
/// - **Method:** `GET`
/// - **Purpose:** Lists an employee's sessions, newest first
#[get("/1/sessions?<employee_code>&<limit>&<offset>")]
pub async fn list_sessions(
    db: DbConn,
    employee_code: String,
    limit: Option<i64>,
    offset: Option<i64>,
) -> Result<Json<Vec<WorkSession>>, Status> {
    let limit = limit.unwrap_or(50).clamp(1, 500);
    let offset = offset.unwrap_or(0).max(0);
    db.run(move |conn| {
        list_sessions_by_code(conn, &employee_code, limit, offset)
            .map(Json)
            .map_err(|_| Status::InternalServerError)
    })
    .await
}

/// Returns a vector of all routes defined in this module.
pub fn routes() -> Vec<Route> {
    routes![create_session, complete_session, active_session, list_sessions]
}
