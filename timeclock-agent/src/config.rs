//! Agent configuration from environment variables and CLI overrides.

use std::path::PathBuf;

use dotenvy::dotenv;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_STATE_FILE: &str = "timeclock-agent.json";

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Base URL of the ledger API, up to and including the `/api` mount.
    pub server_url: String,
    /// Path of the durable agent state file.
    pub state_path: PathBuf,
}

impl AgentConfig {
    /// Resolves configuration with CLI flags taking precedence over the
    /// TIMECLOCK_SERVER_URL and TIMECLOCK_AGENT_STATE environment variables.
    pub fn resolve(server: Option<String>, state: Option<PathBuf>) -> Self {
        dotenv().ok();

        let server_url = server
            .or_else(|| std::env::var("TIMECLOCK_SERVER_URL").ok())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

        let state_path = state
            .or_else(|| std::env::var("TIMECLOCK_AGENT_STATE").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE));

        Self {
            server_url,
            state_path,
        }
    }
}
