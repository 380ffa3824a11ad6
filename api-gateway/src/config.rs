//! API gateway configuration.
//!
//! This configures the HTTP listen address and the optional address book
//! used to display player names. The ledger itself is configured through
//! `ledger::LedgerConfig::from_env()`.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const ENV_LISTEN_ADDR: &str = "API_LISTEN_ADDR";
pub const ENV_NAMES_FILE: &str = "API_NAMES_FILE";

/// Configuration for the API gateway HTTP server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP server to.
    pub listen_addr: SocketAddr,
    /// JSON object mapping player addresses to display names.
    pub names_path: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        // Bind to all interfaces so the container port mapping (8081→8081) is reachable
        // from the host when running under docker-compose.
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8081)),
            names_path: None,
        }
    }
}

impl ApiConfig {
    /// Defaults overridden by `API_LISTEN_ADDR` and `API_NAMES_FILE`.
    pub fn from_env() -> Result<Self, String> {
        let mut cfg = Self::default();

        if let Ok(raw) = env::var(ENV_LISTEN_ADDR) {
            cfg.listen_addr = raw
                .parse()
                .map_err(|e| format!("invalid {ENV_LISTEN_ADDR} `{raw}`: {e}"))?;
        }
        if let Ok(path) = env::var(ENV_NAMES_FILE) {
            cfg.names_path = Some(PathBuf::from(path));
        }

        Ok(cfg)
    }
}
