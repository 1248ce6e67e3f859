//! API version 1 - Status endpoints
//!
//! This module provides health check and status endpoints for monitoring
//! the application's operational state and availability.

use rocket::{Route, serde::json::Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthStatus {
    status: &'static str,
    version: &'static str,
}

/// Health Status endpoint.
///
/// - **URL:** `/api/1/status`
/// - **Method:** `GET`
/// - **Purpose:** Returns the health status of the application
///
/// This endpoint provides a simple health check that indicates whether
/// the application is running and responsive. It always returns a "running"
/// status if the application is operational.
///
/// # Response
///
/// **Success (HTTP 200 OK):**
/// ```json
/// {
///   "status": "running",
///   "version": "0.1.0"
/// }
/// ```
#[rocket::get("/1/status")]
pub fn health_status() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "running",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Returns a vector of all routes defined in this module.
pub fn routes() -> Vec<Route> {
    rocket::routes![health_status]
}
