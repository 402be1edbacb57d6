use std::path::PathBuf;

use tracing::{info, warn};

/// Placeholder session secrets that must be replaced outside development.
const PLACEHOLDER_SECRETS: &[&str] = &["dev-secret-change-me", "change-me-to-a-random-string"];

pub struct Config {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub session_secret: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let session_secret = var_or("WARBLER_SESSION_SECRET", "dev-secret-change-me");
        if PLACEHOLDER_SECRETS.contains(&session_secret.as_str()) {
            warn!("WARBLER_SESSION_SECRET is unset or still a placeholder; sessions can be forged");
        }

        Ok(Self {
            db_path: var_or("WARBLER_DB_PATH", "warbler.db").into(),
            host: var_or("WARBLER_HOST", "0.0.0.0"),
            port: var_or("WARBLER_PORT", "5000").parse()?,
            session_secret,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}
