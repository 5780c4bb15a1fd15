//! Logging initialization.
//!
//! Installs a `tracing` subscriber writing either human-readable or JSON
//! lines to stderr.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem.
///
/// `RUST_LOG` overrides the default level when set. Output goes to stderr
/// so `prism render` can write image bytes to stdout.
pub fn init(verbose: bool, json_format: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize logging from the `[logging]` section, with CLI overrides.
pub fn init_from_config(config: &prism_core::Config, verbose_override: bool, json_override: bool) {
    let level = config.logging.level.as_str();
    let verbose = verbose_override || level == "debug" || level == "trace";
    let json_format = json_override || config.logging.format == "json";
    init(verbose, json_format);
}
