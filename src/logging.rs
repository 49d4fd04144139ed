use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Routes tracing events to stderr so response output on stdout stays
/// clean. `RUST_LOG` takes precedence over the verbosity flag.
pub fn init_logging(verbose: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("initializing logging: {err}"))?;

    tracing::debug!("logging initialized");
    Ok(())
}

pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "warn,curlhop=debug"
    } else {
        "warn"
    }
}
