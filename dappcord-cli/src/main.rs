use anyhow::{Context, Result};
use clap::Parser;
use dappcord_core::config::Config;
use dappcord_core::logging::{init_logging_with_config, LogConfig, LogLevel};
use std::path::PathBuf;
use tracing::{error, info};

mod commands;

use commands::Command;

#[derive(Parser, Debug)]
#[command(name = "dappcord")]
#[command(author, version, about = "Token-gated channel access registry", long_about = None)]
struct Args {
    /// TOML configuration file (environment variables apply on top)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the registry snapshot
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<LogLevel>,

    /// Enable JSON formatted logging
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::from_env().context("loading config from environment")?,
    };

    if let Some(data_dir) = &args.data_dir {
        config.store.data_dir = data_dir.clone();
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if args.json_logs {
        config.logging.json_format = true;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    init_logging_with_config(LogConfig::from(&config.logging))?;
    if config.metrics.enabled {
        dappcord_core::metrics::init_metrics();
    }

    match commands::execute(args.command, &config).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            info!("Dappcord CLI finished");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Command failed");
            Err(e)
        }
    }
}
