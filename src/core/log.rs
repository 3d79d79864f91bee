//! Tracing setup for the command line.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

const APP_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Installs the global subscriber on stderr, leaving stdout to the tables and
/// JSON output. `verbose` turns on debug events from this crate; `RUST_LOG`
/// can narrow them further.
pub fn init_logging(verbose: bool) {
    let app_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::OFF
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(app_level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .pretty()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(Targets::new().with_target(APP_TARGET, app_level))
        .with(env_filter)
        .init();
}
