//! Test support: in-memory databases and a fully-wired Rocket instance.

use diesel::connection::SimpleConnection;
use diesel::sqlite::SqliteConnection;
use rocket::figment::{
    util::map,
    value::{Map, Value},
};
use rocket::{Build, Rocket, fairing::AdHoc};

use super::db::{DbConn, run_pending_migrations, set_foreign_keys};

use crate::models::NewEmployee;
use crate::orm::employee::{get_employee_by_code, insert_employee};

/// Configures SQLite with performance-optimized settings for testing.
///
/// Sets the following PRAGMAs:
/// - `synchronous = OFF`: Disables synchronous writes for faster performance
/// - `journal_mode = OFF`: Disables rollback journal
///
/// These settings make SQLite faster but less durable - only use for testing.
///
/// # Arguments
/// * `conn` - A mutable reference to a SQLite database connection
///
/// # Panics
/// Panics if the PRAGMA commands fail to execute
fn set_sqlite_test_pragmas(conn: &mut diesel::SqliteConnection) {
    conn.batch_execute(
        r#"
        PRAGMA synchronous = OFF;
        PRAGMA journal_mode = OFF;
        "#,
    )
    .expect("Failed to set SQLite PRAGMAs");
}

/// Creates a Rocket fairing that sets SQLite testing pragmas.
///
/// This fairing configures SQLite for faster but less durable operation,
/// suitable only for testing environments.
fn set_sqlite_test_pragmas_fairing() -> AdHoc {
    AdHoc::on_ignite("Set SQLite Test Pragmas", |rocket| async {
        let conn = DbConn::get_one(&rocket)
            .await
            .expect("database connection for migration");
        conn.run(|c| {
            set_sqlite_test_pragmas(c);
        })
        .await;
        rocket
    })
}

/// Creates a Rocket fairing that seeds a standard test directory.
///
/// Every test can rely on the employees created here, so API tests never
/// need a directory write path of their own.
fn test_directory_fairing() -> AdHoc {
    AdHoc::on_ignite("Test Directory Initialization", |rocket| async {
        let conn = DbConn::get_one(&rocket)
            .await
            .expect("database connection for test directory initialization");

        conn.run(|c| {
            if let Err(e) = create_test_directory(c) {
                eprintln!("[test-directory] ERROR: Failed to seed directory: {e:?}");
            }
        })
        .await;

        rocket
    })
}

/// Seeds the standard test employees used across the test suite.
pub fn create_test_directory(conn: &mut SqliteConnection) -> Result<(), diesel::result::Error> {
    ensure_employee(conn, "AIP001", "Dana Whitfield", "Dev")?;
    ensure_employee(conn, "AIP002", "Marcus Vo", "Dev")?;
    ensure_employee(conn, "AIP003", "Priya Raman", "Ops")?;
    ensure_employee(conn, "AIP004", "Elena Kovacs", "QA")?;
    Ok(())
}

fn ensure_employee(
    conn: &mut SqliteConnection,
    code: &str,
    name: &str,
    role: &str,
) -> Result<(), diesel::result::Error> {
    if get_employee_by_code(conn, code)?.is_some() {
        return Ok(());
    }
    insert_employee(
        conn,
        NewEmployee {
            user_id: uuid::Uuid::new_v4().to_string(),
            employee_code: code.to_string(),
            full_name: name.to_string(),
            role: role.to_string(),
        },
    )?;
    Ok(())
}

/// Creates and configures a Rocket instance for testing with an in-memory
/// SQLite database.
///
/// The returned Rocket instance will have:
/// - An in-memory SQLite database configured
/// - Database connection pool attached
/// - Foreign keys enabled
/// - Testing pragmas set
/// - All migrations run
/// - The standard test directory seeded
/// - API routes mounted
pub fn test_rocket() -> Rocket<Build> {
    use uuid::Uuid;

    // Generate a unique database name for this test instance
    let unique_db_name = format!("file:test_db_{}?mode=memory&cache=shared", Uuid::new_v4());

    // Configure the in-memory SQLite database
    let db_config: Map<_, Value> = map! {
        "url" => unique_db_name.into(),  // Unique shared in-memory DB per test
        "pool_size" => 5.into(),
        "timeout" => 5.into(),
    };

    let databases = map!["sqlite_db" => db_config];

    // Merge DB config into Rocket's figment
    let figment = rocket::Config::figment().merge(("databases", databases));

    // Build the Rocket instance with the DB fairing attached
    let rocket = rocket::custom(figment)
        .attach(DbConn::fairing())
        .attach(super::db::set_foreign_keys_fairing())
        .attach(set_sqlite_test_pragmas_fairing())
        .attach(super::db::run_migrations_fairing())
        .attach(test_directory_fairing());

    crate::mount_api_routes(rocket)
}

/// Creates a synchronous in-memory SQLite database connection for unit tests.
///
/// This function returns a `diesel::SqliteConnection` connected to an
/// in-memory SQLite database, runs all embedded Diesel migrations, and
/// enables foreign key support. This is ideal for direct Diesel queries in
/// synchronous test code.
///
/// Each call to this function returns a new, independent in-memory database.
pub fn setup_test_db() -> SqliteConnection {
    use diesel::Connection;

    let mut conn = SqliteConnection::establish(":memory:")
        .expect("Failed to create in-memory SQLite database");
    set_foreign_keys(&mut conn);
    run_pending_migrations(&mut conn);
    conn
}
