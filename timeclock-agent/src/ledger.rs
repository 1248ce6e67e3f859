//! Transport to the session ledger.
//!
//! [`Ledger`] is the seam between the reconciliation/sync logic and the
//! network; production uses [`HttpLedger`] over reqwest, tests use the
//! in-memory fake in `testing`. Every method maps ledger outcomes onto the
//! agent error taxonomy so callers never look at raw status codes.

use std::future::Future;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{EndError, LookupError, StartError, TransportError};
use crate::session::EmployeeIdentity;

/// A session record as the ledger reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i32,
    pub user_id: String,
    pub employee_code: String,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    pub duration_seconds: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartSessionRequest {
    pub user_id: String,
    pub employee_code: String,
    pub start_time: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndSessionRequest {
    pub end_time: NaiveDateTime,
    pub duration_seconds: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct ActiveSessionResponse {
    active: bool,
    session: Option<SessionRecord>,
}

pub trait Ledger {
    fn lookup_employee(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<EmployeeIdentity, LookupError>>;

    fn start_session(
        &self,
        req: &StartSessionRequest,
    ) -> impl Future<Output = Result<SessionRecord, StartError>>;

    fn end_session(
        &self,
        id: i32,
        req: &EndSessionRequest,
    ) -> impl Future<Output = Result<SessionRecord, EndError>>;

    fn active_session(
        &self,
        employee_code: &str,
    ) -> impl Future<Output = Result<Option<SessionRecord>, TransportError>>;
}

/// HTTP client for the ledger API.
#[derive(Debug, Clone)]
pub struct HttpLedger {
    base_url: String,
    client: reqwest::Client,
}

impl HttpLedger {
    /// `base_url` is the API mount, e.g. `http://localhost:8000/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn connect_error(e: reqwest::Error) -> TransportError {
    TransportError::NetworkUnavailable(e.to_string())
}

/// A response body that fails to parse is a transport fault, not a ledger
/// outcome.
fn body_error(e: reqwest::Error) -> TransportError {
    TransportError::NetworkUnavailable(format!("invalid response body: {e}"))
}

async fn http_status_error(response: reqwest::Response) -> TransportError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    TransportError::HttpStatus { status, body }
}

async fn error_body(response: reqwest::Response) -> serde_json::Value {
    response.json().await.unwrap_or(serde_json::Value::Null)
}

impl Ledger for HttpLedger {
    async fn lookup_employee(&self, code: &str) -> Result<EmployeeIdentity, LookupError> {
        let response = self
            .client
            .get(self.url(&format!("/1/employees/{code}")))
            .send()
            .await
            .map_err(connect_error)?;

        match response.status().as_u16() {
            200 => response.json().await.map_err(|e| body_error(e).into()),
            404 => Err(LookupError::NotFound(code.to_string())),
            _ => Err(http_status_error(response).await.into()),
        }
    }

    async fn start_session(&self, req: &StartSessionRequest) -> Result<SessionRecord, StartError> {
        let response = self
            .client
            .post(self.url("/1/sessions"))
            .json(req)
            .send()
            .await
            .map_err(connect_error)?;

        match response.status().as_u16() {
            201 => response.json().await.map_err(|e| body_error(e).into()),
            404 => Err(StartError::UnknownEmployee),
            409 => {
                let body = error_body(response).await;
                let existing_session_id =
                    body["existing_session_id"].as_i64().unwrap_or_default() as i32;
                Err(StartError::Conflict {
                    existing_session_id,
                })
            }
            _ => Err(http_status_error(response).await.into()),
        }
    }

    async fn end_session(&self, id: i32, req: &EndSessionRequest) -> Result<SessionRecord, EndError> {
        let response = self
            .client
            .put(self.url(&format!("/1/sessions/{id}")))
            .json(req)
            .send()
            .await
            .map_err(connect_error)?;

        match response.status().as_u16() {
            200 => response.json().await.map_err(|e| body_error(e).into()),
            400 => Err(EndError::InvalidDuration),
            404 => Err(EndError::NotFound),
            409 => {
                let body = error_body(response).await;
                let previous_end_time = body["previous_end_time"]
                    .as_str()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_default();
                Err(EndError::AlreadyCompleted { previous_end_time })
            }
            _ => Err(http_status_error(response).await.into()),
        }
    }

    async fn active_session(
        &self,
        employee_code: &str,
    ) -> Result<Option<SessionRecord>, TransportError> {
        let response = self
            .client
            .get(self.url("/1/sessions/active"))
            .query(&[("employee_code", employee_code)])
            .send()
            .await
            .map_err(connect_error)?;

        if response.status().as_u16() != 200 {
            return Err(http_status_error(response).await);
        }

        let body: ActiveSessionResponse = response.json().await.map_err(body_error)?;
        if body.active { Ok(body.session) } else { Ok(None) }
    }
}
