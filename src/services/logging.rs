use crate::domain::constants::LOG_ENV;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default directive for the given flags. `-v` counts win over the
/// configured level.
pub fn level_directive(verbose: u8, quiet: bool, configured: Option<&str>) -> String {
    match verbose {
        0 if quiet => "error",
        0 => configured.unwrap_or("warn"),
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
    .to_string()
}

/// Installs the global subscriber. Logs go to stderr; `CALM_LOG` overrides
/// the flags.
pub fn init_logging(verbose: u8, quiet: bool, configured: Option<&str>) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(level_directive(verbose, quiet, configured)))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .try_init();
}
