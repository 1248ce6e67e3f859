pub mod employee;
pub mod status;
pub mod work_session;

use rocket::Route;

/// Collects every route in the API for mounting under `/api`.
pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(employee::routes());
    routes.extend(status::routes());
    routes.extend(work_session::routes());
    routes
}
