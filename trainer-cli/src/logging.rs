use std::io;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global subscriber. `RUST_LOG` wins over `default_level`.
///
/// Logs go to stderr so command output on stdout stays clean.
pub fn init(default_level: &str) {
    let result = fmt::fmt()
        .with_env_filter(build_env_filter(default_level))
        .with_target(false)
        .with_level(true)
        .with_writer(io::stderr)
        .try_init();
    if let Err(err) = result {
        eprintln!("warning: logging already initialised: {err}");
    }
}

fn build_env_filter(default_level: &str) -> EnvFilter {
    let default_level = default_level.parse::<LevelFilter>().unwrap_or(LevelFilter::INFO);

    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy()
    })
}
