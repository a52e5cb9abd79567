//! shadercompile - inspect and enumerate shader combo command ranges
//!
//! # Commands
//!
//! - `shadercompile describe` - Print every entry with its command range
//! - `shadercompile commands` - Print compiler command lines for a command range
//! - `shadercompile lookup` - Show which entry and combo own a command number
//! - `shadercompile count` - Count valid combos in parallel over split ranges
//!
//! # Usage
//!
//! ```bash
//! # Manifest of all entries
//! shadercompile describe shaders.toml
//!
//! # Command lines for one worker's share of the work
//! shadercompile commands shaders.toml --start 1000 --end 2000
//! ```

mod commands;
mod count;
mod describe;
mod lookup;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shadercompile_core::Configuration;
use std::path::Path;

/// shadercompile - shader combo command-number tool
#[derive(Parser)]
#[command(name = "shadercompile")]
#[command(about = "Inspect and enumerate shader combo command ranges")]
#[command(version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every entry with its combo counts and command range
    Describe(describe::DescribeArgs),

    /// Print compiler command lines for every valid combo in a range
    Commands(commands::CommandsArgs),

    /// Show the entry and combo owning a command number
    Lookup(lookup::LookupArgs),

    /// Count valid combos, splitting the command space across workers
    Count(count::CountArgs),
}

/// Load a configuration file, attaching the path to any error.
pub(crate) fn load_config(path: &Path) -> Result<Configuration> {
    Configuration::read(path)
        .with_context(|| format!("Failed to load configuration {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Describe(args) => describe::execute(args),
        Commands::Commands(args) => commands::execute(args),
        Commands::Lookup(args) => lookup::execute(args),
        Commands::Count(args) => count::execute(args),
    }
}
