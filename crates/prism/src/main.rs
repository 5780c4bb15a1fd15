//! Prism CLI - on-demand image transformation service.
//!
//! Prism serves resized, cropped and re-encoded images addressed by URL
//! path, pulling originals from a remote origin into a local mirror.
//!
//! # Usage
//!
//! ```bash
//! # Run the HTTP service
//! prism serve --bind 0.0.0.0:8080
//!
//! # Render one request path to a file
//! prism render "/uri/rw=480:rh=320/mgid:file:gsp:assets:/a.jpg" -o out.jpg
//!
//! # View configuration
//! prism config show
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Prism - on-demand image transformation service.
#[derive(Parser, Debug)]
#[command(name = "prism")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true, env = "PRISM_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP image service
    Serve(cli::serve::ServeArgs),

    /// Render a single request path without starting the server
    Render(cli::render::RenderArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go to stderr directly.
    let loaded = match &cli.config {
        Some(path) => prism_core::Config::load_from(path),
        None => prism_core::Config::load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `prism config path`."
            );
            prism_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Prism v{}", prism_core::VERSION);

    match cli.command {
        Commands::Serve(args) => cli::serve::execute(args, config).await,
        Commands::Render(args) => cli::render::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, config, cli.config).await,
    }
}
