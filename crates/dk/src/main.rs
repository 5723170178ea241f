//! dk CLI - Documentation link validator and index generator.
//!
//! Provides commands for:
//! - `validate`: Check links in markdown files under a documentation root
//! - `index`: Write a markdown index of documents and their siblings

mod commands;
mod error;
mod output;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{IndexArgs, Status, ValidateArgs};
use output::Output;

/// dk - Documentation link validator and index generator.
#[derive(Parser)]
#[command(name = "dk", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check links in markdown files.
    Validate(ValidateArgs),
    /// Generate a documentation index.
    Index(IndexArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = match &cli.command {
        Commands::Validate(args) => args.verbose,
        Commands::Index(args) => args.verbose,
    };

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN.
    // Logs go to stderr so stdout carries only report lines.
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Validate(args) => args.execute(),
        Commands::Index(args) => args.execute(),
    };

    match result {
        Ok(status) => status.into(),
        Err(err) => {
            output.error(&format!("Error: {err}"));
            Status::Error.into()
        }
    }
}
