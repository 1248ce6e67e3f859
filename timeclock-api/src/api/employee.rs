//! API endpoints for the employee directory.
//!
//! The directory is read-only through HTTP: clients use it to verify a
//! human-entered employee code before enabling the clock in / clock out
//! controls. Directory maintenance belongs to an external HR system.

use rocket::Route;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use serde::Serialize;

use crate::models::Employee;
use crate::orm::DbConn;
use crate::orm::employee::{get_employee_by_code, list_employees};

/// Error response structure for directory API failures.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Employee Lookup endpoint.
///
/// - **URL:** `/api/1/employees/<code>`
/// - **Method:** `GET`
/// - **Purpose:** Resolves an employee code to a directory entry
///
/// # Response
///
/// **Success (HTTP 200 OK):**
/// ```json
/// {
///   "id": 1,
///   "user_id": "a4f77fd0-032c-4b3c-8db5-00ef6b39a372",
///   "employee_code": "AIP001",
///   "full_name": "Dana Whitfield",
///   "role": "Dev",
///   "created_at": "2025-08-01T08:00:00"
/// }
/// ```
///
/// # Returns
/// * `Ok(Json<Employee>)` - Directory entry for the code
/// * `Err(status::Custom)` - 404 when the code is unknown, 500 on database
///   failure
#[get("/1/employees/<code>")]
pub async fn lookup_employee(
    db: DbConn,
    code: String,
) -> Result<Json<Employee>, status::Custom<Json<ErrorResponse>>> {
    db.run(move |conn| match get_employee_by_code(conn, &code) {
        Ok(Some(employee)) => Ok(Json(employee)),
        Ok(None) => Err(status::Custom(
            Status::NotFound,
            Json(ErrorResponse {
                error: format!("Employee '{code}' not found"),
            }),
        )),
        Err(e) => {
            error!("Error looking up employee '{}': {:?}", code, e);
            Err(status::Custom(
                Status::InternalServerError,
                Json(ErrorResponse {
                    error: "Database error while looking up employee".to_string(),
                }),
            ))
        }
    })
    .await
}

/// List Employees endpoint.
///
/// - **URL:** `/api/1/employees`
/// - **Method:** `GET`
/// - **Purpose:** Returns all directory entries, ordered by id
#[get("/1/employees")]
pub async fn list_directory(db: DbConn) -> Result<Json<Vec<Employee>>, Status> {
    db.run(|conn| list_employees(conn).map_err(|_| Status::InternalServerError))
        .await
        .map(Json)
}

/// Returns a vector of all routes defined in this module.
pub fn routes() -> Vec<Route> {
    routes![lookup_employee, list_directory]
}
