// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vigil - a real-time alerting service.
//!
//! Binary entry point.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod serve;
mod shutdown;

/// Vigil - a real-time alerting service.
#[derive(Parser, Debug)]
#[command(name = "vigil", version, about, long_about = None)]
struct Cli {
    /// Path to an explicit config file (otherwise the standard hierarchy).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the alerting service.
    Serve,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => vigil_config::load_config_from_path(path),
        None => vigil_config::load_config(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: failed to load configuration: {err}");
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Serve => {
            if let Err(err) = serve::run_serve(config).await {
                eprintln!("error: {err}");
                std::process::exit(1);
            }
        }
    }
}
