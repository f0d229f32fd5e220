use tracing_subscriber::EnvFilter;

/// Installs the stderr subscriber. `RUST_LOG`, when set, wins over `--log-level`.
pub fn init(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(log_level)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

// Dependencies stay at warn; our crate and the HTTP trace layer follow the flag.
fn default_directives(level: &str) -> String {
    format!("warn,sqlrest={level},tower_http={level}")
}
