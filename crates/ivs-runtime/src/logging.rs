//! Tracing subscriber setup.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Filter from `IVS_LOG_LEVEL`, then `RUST_LOG`, then `info`.
pub fn env_filter() -> Result<EnvFilter> {
    match std::env::var("IVS_LOG_LEVEL") {
        Ok(directives) => Ok(EnvFilter::try_new(directives)?),
        Err(_) => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))),
    }
}

fn json_requested() -> bool {
    std::env::var("IVS_JSON_LOGS")
        .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Install the global subscriber. Logs go to stderr so reports on stdout stay clean.
pub fn init() -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter()?)
        .with_target(true)
        .with_writer(std::io::stderr);

    let installed = if json_requested() {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|err| anyhow!(err))
}
