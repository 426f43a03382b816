//! `forgeferry transfer` - run the migration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;

use forgeferry::forge;
use forgeferry::{Config, Transfer};

pub fn run(config_path: Option<PathBuf>, offset: Option<u64>) -> Result<()> {
    let mut config =
        Config::load(config_path.as_deref()).context("Failed to load configuration")?;
    if let Some(offset) = offset {
        config.skip_first_ids = offset;
    }

    println!(
        "Migrating {}/{} ({}) -> {}/{} ({})",
        config.source.namespace,
        config.source.repo,
        config.source.provider.name(),
        config.target.namespace,
        config.target.repo,
        config.target.provider.name(),
    );

    let source = forge::reader(&config.source, &config)?;
    let target = forge::writer(&config.target, &config)?;

    let mut transfer = Transfer::new(source.as_ref(), target.as_ref(), &config);
    let stats = transfer.run()?;

    println!(
        "{} Transferred {} issues, {} pull requests, {} releases ({} placeholders)",
        "✓".green(),
        stats.issues,
        stats.pull_requests,
        stats.releases,
        stats.placeholders,
    );

    Ok(())
}
