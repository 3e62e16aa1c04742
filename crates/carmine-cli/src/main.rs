//! Carmine CLI - generates Carton-compatible snapshot files.
//!
//! Resolves module dependencies from the primary mirror and the historical
//! archive, producing `cpanfile.snapshot` files compatible with Carton and
//! Carmel.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod commands;

use clap::{Parser, Subcommand};
use commands::snapshot::SnapshotArgs;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "carmine", version, about = "Snapshot generator for the CPAN ecosystem")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate cpanfile.snapshot from a cpanfile.
    Snapshot(SnapshotArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 if cli.quiet => Level::ERROR,
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to create runtime");

    let result = match cli.command {
        Commands::Snapshot(args) => runtime.block_on(commands::snapshot::run(args)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
