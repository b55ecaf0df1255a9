//! sqlkit - run SQL against a `SQLite` database from the command line.
//!
//! Every command prints a single JSON document on stdout. Logs go to stderr
//! and are controlled with `RUST_LOG` (for example `RUST_LOG=sqlkit_db=trace`).

mod cli;
mod commands;
mod json;

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> eyre::Result<()> {
    // Ignored if a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let cli = cli::Cli::parse();
    let output = commands::run(&cli)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
