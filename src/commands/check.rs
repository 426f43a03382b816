//! `forgeferry check` - validate configuration without remote calls.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;

use forgeferry::Config;

pub fn run(config_path: Option<PathBuf>) -> Result<()> {
    let config =
        Config::load(config_path.as_deref()).context("Failed to load configuration")?;

    println!("{} Configuration is valid", "✓".green());
    println!(
        "  source: {}/{} on {}",
        config.source.namespace,
        config.source.repo,
        config.source.provider.name()
    );
    println!(
        "  target: {}/{} on {}",
        config.target.namespace,
        config.target.repo,
        config.target.provider.name()
    );
    println!("  match_ids: {}", config.match_ids);
    println!("  make_diffs: {}", config.make_diffs);
    if config.make_diffs {
        println!("  diff_dir: {}", config.diff_dir);
    }
    println!("  transfer_releases: {}", config.transfer_releases);
    println!("  pr.as_issue: {}", config.pr.as_issue);
    println!("  pr.open_prs_as_issues: {}", config.pr.open_prs_as_issues);
    if config.skip_first_ids > 0 {
        println!("  skip_first_ids: {}", config.skip_first_ids);
    }

    Ok(())
}
