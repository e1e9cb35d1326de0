//! Mishkat - development host for the product model viewer
//!
//! Serves the viewer bundle, model and HDRI files and per-product viewer
//! configurations from a TOML catalog. `mishkat inspect` runs the viewer's
//! load pipeline natively and prints what it produced.

mod api;
mod config;
mod fetch;
mod inspect;
mod server;
mod state;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mishkat_core::ViewerConfig;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "mishkat")]
#[command(about = "Product 3D model viewer host")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "mishkat.toml")]
    config: PathBuf,

    /// Bind address for web server
    #[arg(short, long)]
    bind: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode and normalize a model file or URL, then print a summary
    Inspect {
        /// Model file path or URL
        model: String,

        /// Declared format; inferred from the file name when omitted
        #[arg(short, long)]
        format: Option<String>,

        /// HDRI path or URL to resolve alongside the model
        #[arg(long)]
        hdri: Option<String>,
    },
}

fn log_level(name: &str) -> Level {
    match name.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(&args.log_level))
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Mishkat v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = config::load_config(&args.config)?;

    // Override bind address if specified
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    match args.command {
        Some(Command::Inspect { model, format, hdri }) => {
            let mut viewer = ViewerConfig::new(model, format.unwrap_or_default());
            viewer.hdri_url = hdri;
            config.viewer.apply(&mut viewer);
            let fetcher = fetch::NativeFetcher::new(".")?;
            inspect::run(&fetcher, &viewer).await?;
        }
        None => {
            info!(
                catalog = %config.catalog.path.display(),
                models = %config.assets.models_dir.display(),
                hdri = %config.assets.hdri_dir.display(),
                "Configuration loaded"
            );
            let bind = config.server.bind.clone();
            let state = state::AppState::new(config)?;
            server::run(state, &bind).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from(["mishkat", "--bind", "127.0.0.1:3000"]);
        assert_eq!(args.bind.as_deref(), Some("127.0.0.1:3000"));
        assert!(args.command.is_none());

        let args = Args::parse_from(["mishkat", "inspect", "lamp.obj", "--format", "obj"]);
        match args.command {
            Some(Command::Inspect { model, format, hdri }) => {
                assert_eq!(model, "lamp.obj");
                assert_eq!(format.as_deref(), Some("obj"));
                assert!(hdri.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_log_level() {
        assert_eq!(log_level("DEBUG"), Level::DEBUG);
        assert_eq!(log_level("nonsense"), Level::INFO);
    }
}
