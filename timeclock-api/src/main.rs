// timeclock-api/src/main.rs

use clap::Parser;
use rocket::info;
use std::env;

#[derive(Parser)]
#[command(name = "timeclock-api")]
#[command(about = "Session ledger for employee clock in / clock out tracking")]
#[command(version)]
struct Cli {}

#[rocket::main]
async fn main() {
    let _cli = Cli::parse();

    if let Ok(path) = env::current_dir() {
        info!("Current directory: {}", path.display());
    }

    info!("timeclock-api v{} starting", env!("CARGO_PKG_VERSION"));

    timeclock_api::rocket()
        .launch()
        .await
        .expect("Rocket server failed to launch");
}
