//! `forgeferry teardown` - delete staged branches by hand.
//!
//! Branch names derive from PR ids alone, so a run that died before its own
//! teardown can be cleaned up here with nothing but the ids.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use colored::Colorize;

use forgeferry::staging::{self, BranchStager};
use forgeferry::Config;

pub fn run(config_path: Option<PathBuf>, pr_ids: Vec<u64>) -> Result<()> {
    let config =
        Config::load(config_path.as_deref()).context("Failed to load configuration")?;

    if config.pr.ssh_url.is_empty() {
        bail!("`pr.ssh_url` is not configured; nothing to tear down");
    }

    let branches = staging::branch_names(pr_ids);
    println!("  Deleting staged branches: {}", branches.join(", "));

    let mut stager = BranchStager::new(&config.pr.ssh_url)?;
    stager.teardown(&branches)?;

    println!("{} Deleted {} branches", "✓".green(), branches.len());
    Ok(())
}
