use std::{net::SocketAddr, path::PathBuf, time::Duration};

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "sqlrest")]
pub struct Args {
    /// SQLite database file (created if missing). `:memory:` is accepted.
    #[arg(long, env = "SQLREST_DB", default_value = "sqlrest.db")]
    pub db: PathBuf,

    /// Address the HTTP server listens on.
    #[arg(long, env = "SQLREST_LISTEN", default_value = "0.0.0.0:8999")]
    pub listen: SocketAddr,

    /// Logging level (stderr). Also supports RUST_LOG.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// How long a statement waits on a locked database before failing.
    #[arg(long, default_value_t = 2_000)]
    pub busy_timeout_ms: u64,
}

impl Args {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}
