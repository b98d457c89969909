mod commands;
mod config;
mod driver;
mod error;

use clap::{Parser, Subcommand};
use commands::{RunArgs, RunSummary, print_policy, run_pipeline};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sieve")]
#[command(about = "Parallel packet filter with ordered output")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every packet in INPUT and write verdicts to OUTPUT in input order
    Run(RunArgs),
    /// Print the effective filter policy
    Policy {
        /// JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            let summary = run_pipeline(&args).inspect_err(|e| {
                tracing::error!(error = %e, "Run failed");
            })?;
            print_summary(&summary);
        }
        Commands::Policy { config } => {
            print_policy(config.as_deref())?;
        }
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("Packets read:    {}", summary.feed.enqueued);
    if summary.feed.rejected > 0 {
        println!("Packets dropped: {}", summary.feed.rejected);
    }
    if summary.feed.trailing_bytes > 0 {
        println!("Trailing bytes:  {}", summary.feed.trailing_bytes);
    }
    println!("Verdicts:        {}", summary.pool.committed);
    for (worker, committed) in summary.pool.per_worker.iter().enumerate() {
        println!("  worker {:>3}:    {}", worker, committed);
    }
}
