// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Arrivo - appointment no-show prevention service.
//!
//! This is the binary entry point for the Arrivo service.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod serve;

/// Arrivo - appointment no-show prevention service.
#[derive(Parser, Debug)]
#[command(name = "arrivo", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook ingress and escalation pipeline.
    Serve,
    /// Print the resolved configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match arrivo_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            for error in &errors {
                eprintln!("arrivo: {error}");
            }
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.service.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run(config).await {
                tracing::error!(error = %e, "serve failed");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => println!("{rendered}"),
            Err(e) => {
                eprintln!("arrivo: config render failed: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("arrivo: use --help for available commands");
        }
    }
}
