// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! atomic-ltm - inspect and maintain the Atomic long-term memory store.

mod commands;
mod doctor;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use atomic_config::LtmConfig;
use atomic_core::LtmError;

/// atomic-ltm - inspect and maintain the Atomic long-term memory store.
#[derive(Parser, Debug)]
#[command(name = "atomic-ltm", version, about, long_about = None)]
struct Cli {
    /// Config file to load instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run diagnostic checks against the store and embedding provider.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Print the effective configuration as TOML.
    Config,
    /// Retrieve memories relevant to a query.
    Search(commands::SearchArgs),
    /// Consolidate conversation fragments into the knowledge base.
    Remember(commands::RememberArgs),
    /// Delete rows by id.
    Forget {
        /// Logical table: knowledge_base, research_findings, events, training_events.
        #[arg(long, default_value = "knowledge_base", value_parser = commands::parse_table)]
        table: atomic_core::LtmTable,
        /// Row ids to delete.
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => atomic_config::load_and_validate_path(path),
        None => atomic_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            atomic_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);

    if let Err(e) = run(cli, config).await {
        eprintln!("atomic-ltm: {e}");
        std::process::exit(if e.is_fatal() { 2 } else { 1 });
    }
}

async fn run(cli: Cli, config: LtmConfig) -> Result<(), LtmError> {
    match cli.command {
        Some(Commands::Doctor { plain }) => doctor::run_doctor(&config, plain).await,
        Some(Commands::Config) => {
            println!("{}", commands::render_config(&config)?);
            Ok(())
        }
        Some(Commands::Search(args)) => commands::run_search(&config, args).await,
        Some(Commands::Remember(args)) => commands::run_remember(&config, args).await,
        Some(Commands::Forget { table, ids }) => commands::run_forget(&config, table, ids).await,
        None => {
            println!("atomic-ltm: use --help for available commands");
            Ok(())
        }
    }
}

/// Initialize the tracing subscriber with the configured log level.
///
/// `RUST_LOG` takes precedence when set. Logs go to stderr so command
/// output on stdout stays machine-readable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "atomic_ltm={log_level},atomic_memory={log_level},atomic_store={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
