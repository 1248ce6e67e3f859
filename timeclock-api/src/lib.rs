#[macro_use]
extern crate rocket;

use rocket::figment::{Figment, providers::{Env, Format, Toml}};
use rocket::request::Request;
use rocket::serde::json::{Json, Value, json};
use rocket::{Build, Rocket};

pub mod api;
pub mod directory_init_fairing;
pub mod models;
pub mod orm;
pub use orm::DbConn;
pub mod schema;

#[catch(400)]
fn bad_request(req: &Request) -> Json<Value> {
    Json(json!({
        "error": "Bad Request",
        "path": req.uri().path().to_string(),
        "status": 400
    }))
}

#[catch(404)]
fn not_found(req: &Request) -> Json<Value> {
    Json(json!({
        "error": "Not Found",
        "path": req.uri().path().to_string(),
        "status": 404
    }))
}

#[catch(409)]
fn conflict(req: &Request) -> Json<Value> {
    Json(json!({
        "error": "Conflict",
        "path": req.uri().path().to_string(),
        "status": 409
    }))
}

#[catch(422)]
fn unprocessable_entity(req: &Request) -> Json<Value> {
    Json(json!({
        "error": "Unprocessable Entity",
        "path": req.uri().path().to_string(),
        "status": 422
    }))
}

#[catch(500)]
fn internal_server_error(req: &Request) -> Json<Value> {
    Json(json!({
        "error": "Internal Server Error",
        "path": req.uri().path().to_string(),
        "status": 500
    }))
}

#[catch(default)]
fn default_catcher(status: rocket::http::Status, req: &Request) -> Json<Value> {
    Json(json!({
        "error": status.reason().unwrap_or("Unknown Error"),
        "path": req.uri().path().to_string(),
        "status": status.code
    }))
}

pub fn mount_api_routes(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.mount("/api", api::routes())
}

fn log_rocket_info(rocket: &Rocket<Build>) {
    let figment = rocket.figment();

    if let Ok(address) = figment.extract_inner::<String>("address") {
        info!("Rocket is running at: {}", address);
    }

    if let Ok(port) = figment.extract_inner::<u16>("port") {
        info!("Rocket is listening on port: {}", port);
    }

    if let Ok(url) = figment.extract_inner::<String>("databases.sqlite_db.url") {
        info!("Database URL: {}", url);
    }
}

/// Note that this function doesn't get tested by our tests.  Tests
/// set up the test_rocket in-memory db.  That is defined in testing.rs.
pub fn rocket() -> Rocket<Build> {
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set");

    let figment = Figment::from(rocket::Config::default())
        .merge(Toml::file("Rocket.toml").nested())
        .merge(Env::prefixed("ROCKET_").global())
        .merge(("databases.sqlite_db.url", database_url));

    let rocket = rocket::custom(figment)
        .attach(DbConn::fairing())
        .attach(orm::set_foreign_keys_fairing())
        .attach(orm::run_migrations_fairing())
        .attach(directory_init_fairing::directory_init_fairing())
        .register(
            "/",
            catchers![
                bad_request,
                not_found,
                conflict,
                unprocessable_entity,
                internal_server_error,
                default_catcher
            ],
        );

    log_rocket_info(&rocket);

    mount_api_routes(rocket)
}
