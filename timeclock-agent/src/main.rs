// timeclock-agent/src/main.rs

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use timeclock_agent::cache::SessionCache;
use timeclock_agent::clock::{Clock, SystemClock};
use timeclock_agent::config::AgentConfig;
use timeclock_agent::error::AgentError;
use timeclock_agent::ledger::HttpLedger;
use timeclock_agent::reconcile::SessionState;
use timeclock_agent::store::JsonFileStore;
use timeclock_agent::sync::SyncReport;
use timeclock_agent::timer;
use timeclock_agent::workday::{EndResult, StartResult, WorkdayController};

#[derive(Parser)]
#[command(name = "timeclock-agent")]
#[command(about = "Clock in / clock out agent for the timeclock ledger")]
#[command(version)]
struct Cli {
    #[arg(long, help = "Ledger API base URL (overrides TIMECLOCK_SERVER_URL)")]
    server: Option<String>,
    #[arg(long, help = "Durable agent state file (overrides TIMECLOCK_AGENT_STATE)")]
    state: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Verify an employee code and clock in")]
    Start {
        #[arg(help = "Employee code, e.g. AIP001 (cached identity is used if omitted)")]
        code: Option<String>,
    },
    #[command(about = "Clock out of the active session")]
    End,
    #[command(about = "Reconcile with the ledger and show the current state")]
    Status,
    #[command(about = "Replay queued session completions against the ledger")]
    Sync,
    #[command(about = "Show a live timer for the active session")]
    Watch,
    #[command(about = "Clear the cached employee identity and session")]
    Clear,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AgentConfig::resolve(cli.server, cli.state);

    let cache = SessionCache::new(JsonFileStore::new(&config.state_path));
    let ledger = HttpLedger::new(config.server_url.as_str());
    let mut controller = WorkdayController::new(cache, ledger, SystemClock);

    if let Err(e) = run(&mut controller, cli.command).await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run(
    controller: &mut WorkdayController<JsonFileStore, HttpLedger, SystemClock>,
    command: Command,
) -> Result<(), AgentError> {
    // Every command begins with the activation sequence, so start/end always
    // operate on reconciled state.
    let (state, report) = controller.activate().await?;
    print_sync_report(report.as_ref());

    match command {
        Command::Start { code } => {
            let result = controller.start_work_session(code.as_deref()).await?;
            let snapshot = result.snapshot();
            match &result {
                StartResult::Started(_) => {
                    println!("Clocked in at {} (session {})", snapshot.start_time, snapshot.session_ref);
                }
                StartResult::AdoptedExisting(_) => {
                    println!(
                        "Already clocked in since {} (session {}, started elsewhere)",
                        snapshot.start_time, snapshot.session_ref
                    );
                }
                StartResult::OfflineStarted(_) => {
                    println!(
                        "Clocked in at {} (offline mode - will sync when the ledger is reachable)",
                        snapshot.start_time
                    );
                }
            }
        }
        Command::End => match controller.end_work_session().await? {
            EndResult::Completed { duration_seconds } => {
                println!(
                    "Clocked out after {}",
                    timer::format_hms(chrono::Duration::seconds(duration_seconds as i64))
                );
            }
            EndResult::AlreadyCompleted { previous_end_time } => {
                println!("Session was already closed at {previous_end_time}");
            }
            EndResult::QueuedOffline { duration_seconds } => {
                println!(
                    "Clocked out after {} (offline - completion queued for sync)",
                    timer::format_hms(chrono::Duration::seconds(duration_seconds as i64))
                );
            }
            EndResult::ClearedStale => {
                println!("Session no longer exists on the ledger; local state cleared");
            }
        },
        Command::Status => {
            let status = controller.status().await?;
            match status.employee {
                Some(employee) => {
                    println!("Employee: {} ({})", employee.full_name, employee.employee_code)
                }
                None => println!("Employee: not verified"),
            }
            match &state {
                SessionState::Active(snapshot) => {
                    let elapsed = timer::elapsed(snapshot, SystemClock.now());
                    println!(
                        "Session:  active since {} ({} elapsed, {})",
                        snapshot.start_time,
                        timer::format_hms(elapsed),
                        snapshot.session_ref
                    );
                }
                SessionState::Idle => println!("Session:  idle"),
            }
            println!("Pending:  {} completion(s) awaiting sync", status.pending);
        }
        Command::Sync => {
            let report = controller.sync_pending().await?;
            println!(
                "Synced {} completion(s); {} still queued",
                report.synced, report.remaining
            );
        }
        Command::Watch => match state {
            SessionState::Active(snapshot) => {
                println!(
                    "Watching session {} (Ctrl-C to stop)",
                    snapshot.session_ref
                );
                let mut ticker = tokio::time::interval(std::time::Duration::from_secs(1));
                loop {
                    ticker.tick().await;
                    let elapsed = timer::elapsed(&snapshot, SystemClock.now());
                    print!("\r{}", timer::format_hms(elapsed));
                    let _ = std::io::stdout().flush();
                }
            }
            SessionState::Idle => println!("No active session to watch"),
        },
        Command::Clear => {
            controller.clear_identity().await?;
            println!("Cleared cached identity and session state");
        }
    }

    Ok(())
}

fn print_sync_report(report: Option<&SyncReport>) {
    if let Some(report) = report {
        if report.synced > 0 {
            println!("Synced {} queued completion(s)", report.synced);
        }
        if report.remaining > 0 {
            println!("{} completion(s) still queued", report.remaining);
        }
    }
}
