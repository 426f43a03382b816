use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Migrate issues, pull requests and releases between forges", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the migration described by the config file
    Transfer {
        /// Path to forgeferry.toml (defaults to the user config directory)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the starting id offset from the config file
        #[arg(long)]
        offset: Option<u64>,
    },

    /// Load and validate configuration without touching any remote
    Check {
        /// Path to forgeferry.toml (defaults to the user config directory)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Delete staged branches left behind by an aborted run
    Teardown {
        /// Path to forgeferry.toml (defaults to the user config directory)
        #[arg(long)]
        config: Option<PathBuf>,

        /// PR ids whose staged branches should be deleted
        #[arg(required = true)]
        pr_ids: Vec<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Transfer { config, offset } => commands::transfer::run(config, offset),
        Commands::Check { config } => commands::check::run(config),
        Commands::Teardown { config, pr_ids } => commands::teardown::run(config, pr_ids),
    }
}
