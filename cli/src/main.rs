//! CLI for Warden
//!
//! Operator client for the gateway's admin streams:
//! - logging: tail the live audit log
//! - statistics: print per-interval call counters

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "warden")]
#[command(about = "Warden - gRPC access gateway admin client", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream every call attempt as it reaches the gateway
    Logging(commands::logging::LoggingArgs),

    /// Stream call counters once per interval
    Statistics(commands::statistics::StatisticsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Logging(args) => commands::logging::run(args).await,
        Commands::Statistics(args) => commands::statistics::run(args).await,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
