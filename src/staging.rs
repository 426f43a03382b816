//! Temporary branch staging for pull-request diffs.
//!
//! Migrated PRs need their head and base commits reachable on a remote so
//! diffs can be regenerated. The stager clones the repository once into a
//! scratch directory, plants two branches per PR at the recorded commits,
//! and pushes them in a single batch. Branch names derive from the PR id
//! alone, so an operator can reconstruct and delete them by hand if a run
//! dies before teardown.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use crate::error::{Error, Result};

/// Branch exposing a PR's head commit.
pub fn head_branch(pr_id: u64) -> String {
    format!("forgeferry/pr-{pr_id}-head")
}

/// Branch exposing a PR's base commit.
pub fn base_branch(pr_id: u64) -> String {
    format!("forgeferry/pr-{pr_id}-base")
}

/// Both staged branch names for a set of PR ids.
pub fn branch_names(pr_ids: impl IntoIterator<Item = u64>) -> Vec<String> {
    pr_ids
        .into_iter()
        .flat_map(|id| [head_branch(id), base_branch(id)])
        .collect()
}

/// A PR's staging material: id plus the two commits to expose.
#[derive(Debug, Clone)]
pub struct StagedPr {
    pub id: u64,
    pub head_sha: String,
    pub base_sha: String,
}

/// Owns the scratch clone and the staged branches for one run.
pub struct BranchStager {
    ssh_url: String,
    scratch: TempDir,
    clone_dir: Option<PathBuf>,
}

impl BranchStager {
    pub fn new(ssh_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            ssh_url: ssh_url.into(),
            scratch: TempDir::new()?,
            clone_dir: None,
        })
    }

    /// Path of the scratch clone, cloning on first use.
    pub fn repo_dir(&mut self) -> Result<&Path> {
        if self.clone_dir.is_none() {
            let dir = self.scratch.path().join("repo");
            run_git(self.scratch.path(), &["clone", &self.ssh_url, "repo"])?;
            self.clone_dir = Some(dir);
        }
        // populated just above
        Ok(self.clone_dir.as_deref().unwrap_or(self.scratch.path()))
    }

    /// Stage branches for every given PR and push them in one batch.
    ///
    /// Returns the pushed branch names. The intended names are printed
    /// before the push, so a failed batch still leaves a cleanup target.
    pub fn prepare(&mut self, pull_requests: &[StagedPr]) -> Result<Vec<String>> {
        let repo = self.repo_dir()?.to_path_buf();

        let mut branches = Vec::with_capacity(pull_requests.len() * 2);
        for pr in pull_requests {
            let head = head_branch(pr.id);
            let base = base_branch(pr.id);
            run_git(&repo, &["branch", "-f", &head, &pr.head_sha])?;
            run_git(&repo, &["branch", "-f", &base, &pr.base_sha])?;
            branches.push(head);
            branches.push(base);
        }

        println!("  Staging branches: {}", branches.join(", "));

        let mut args = vec!["push", "origin"];
        args.extend(branches.iter().map(String::as_str));
        run_git(&repo, &args)?;

        Ok(branches)
    }

    /// Delete the given branches from the remote.
    pub fn teardown(&mut self, branches: &[String]) -> Result<()> {
        if branches.is_empty() {
            return Ok(());
        }
        let repo = self.repo_dir()?.to_path_buf();

        let mut args = vec!["push", "origin", "--delete"];
        args.extend(branches.iter().map(String::as_str));
        run_git(&repo, &args)
    }
}

/// Run one git invocation inside `dir`, surfacing stderr on failure.
fn run_git(dir: &Path, args: &[&str]) -> Result<()> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| Error::Staging(format!("failed to run git {}: {e}", args[0])))?;

    if !output.status.success() {
        return Err(Error::Staging(format!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_names_derive_from_the_pr_id_alone() {
        assert_eq!(head_branch(3), "forgeferry/pr-3-head");
        assert_eq!(base_branch(3), "forgeferry/pr-3-base");
        // recomputable later for manual cleanup
        assert_eq!(head_branch(3), head_branch(3));
    }

    #[test]
    fn branch_names_cover_every_pr_twice() {
        let names = branch_names([1, 4]);
        assert_eq!(
            names,
            vec![
                "forgeferry/pr-1-head",
                "forgeferry/pr-1-base",
                "forgeferry/pr-4-head",
                "forgeferry/pr-4-base",
            ]
        );
    }
}
