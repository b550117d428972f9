use std::path::PathBuf;

use anyhow::Result;
use autofill_cli::cli::{cmd_demo, cmd_serve, init_logging, DemoArgs, LogFormat, ServeArgs};
use autofill_cli::load_config;
use clap::{Parser, Subcommand};
use tracing::{error, info};

/// Reimbursement form autofill service
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable debug mode
    #[arg(short, long)]
    debug: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "human")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the task API over HTTP
    Serve(ServeArgs),

    /// Run one request against the simulated portal and print its progress
    Demo(DemoArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.debug, cli.log_format)?;
    info!("Starting autofill v{}", env!("CARGO_PKG_VERSION"));

    let loaded = load_config(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Serve(args) => cmd_serve(args, loaded.config).await,
        Commands::Demo(args) => cmd_demo(args, loaded.config).await,
    };

    match result {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            std::process::exit(1);
        }
    }
}
