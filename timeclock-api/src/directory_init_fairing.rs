use dotenvy::dotenv;
use rocket::Rocket;
use rocket::fairing::AdHoc;
use serde::Deserialize;

use crate::models::NewEmployee;
use crate::orm::DbConn;
use crate::orm::employee::{count_employees, insert_employee};

/// One entry of the directory seed file. `user_id` may be omitted, in which
/// case a fresh UUID is assigned.
#[derive(Deserialize)]
struct SeedEmployee {
    employee_code: String,
    full_name: String,
    role: String,
    user_id: Option<String>,
}

/// Seed the employee directory on first boot if needed.
///
/// The directory is owned by an external HR system; in deployments where
/// that system writes to this database directly, the seed file is simply
/// absent. Set TIMECLOCK_DIRECTORY_SEED to a JSON file of entries to
/// populate an empty directory at launch.
pub fn directory_init_fairing() -> AdHoc {
    AdHoc::try_on_ignite("Directory Seed", |rocket| async {
        dotenv().ok();

        let seed_path = match std::env::var("TIMECLOCK_DIRECTORY_SEED") {
            Ok(path) => path,
            Err(_) => {
                info!("[directory-seed] TIMECLOCK_DIRECTORY_SEED not set; skipping seed");
                return Ok(rocket);
            }
        };

        let entries = match load_seed_file(&seed_path) {
            Ok(entries) => entries,
            Err(e) => {
                error!("[directory-seed] ERROR reading '{}': {}", seed_path, e);
                return Err(rocket);
            }
        };

        let conn = match get_db_connection(&rocket).await {
            Some(conn) => conn,
            None => return Err(rocket),
        };

        match conn.run(move |c| seed_directory(c, entries)).await {
            Ok(0) => info!("[directory-seed] Directory already populated; nothing to do"),
            Ok(n) => info!("[directory-seed] Seeded {} employees from '{}'", n, seed_path),
            Err(e) => {
                error!("[directory-seed] ERROR seeding directory: {:?}", e);
                return Err(rocket);
            }
        }

        Ok(rocket)
    })
}

async fn get_db_connection(rocket: &Rocket<rocket::Build>) -> Option<DbConn> {
    match DbConn::get_one(rocket).await {
        Some(conn) => Some(conn),
        None => {
            error!("[directory-seed] ERROR: Could not get DB connection.");
            None
        }
    }
}

fn load_seed_file(path: &str) -> Result<Vec<SeedEmployee>, String> {
    let contents = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&contents).map_err(|e| e.to_string())
}

fn seed_directory(
    c: &mut diesel::SqliteConnection,
    entries: Vec<SeedEmployee>,
) -> Result<usize, diesel::result::Error> {
    if count_employees(c)? > 0 {
        return Ok(0);
    }

    let mut seeded = 0;
    for entry in entries {
        insert_employee(
            c,
            NewEmployee {
                user_id: entry
                    .user_id
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                employee_code: entry.employee_code,
                full_name: entry.full_name,
                role: entry.role,
            },
        )?;
        seeded += 1;
    }
    Ok(seeded)
}
