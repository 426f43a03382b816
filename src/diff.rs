//! Unified diff capture between two commits.
//!
//! Runs inside the staging clone, where both commits are guaranteed present.
//! Anything on the tool's stderr is treated as failure; the message travels
//! up inside the error.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};

/// A pending diff between two commits of one repository.
pub struct Diff<'a> {
    repo_dir: &'a Path,
    old_sha: &'a str,
    new_sha: &'a str,
}

impl<'a> Diff<'a> {
    pub fn new(repo_dir: &'a Path, old_sha: &'a str, new_sha: &'a str) -> Self {
        Self {
            repo_dir,
            old_sha,
            new_sha,
        }
    }

    /// Capture the unified diff text.
    pub fn generate(&self) -> Result<String> {
        let output = Command::new("git")
            .args(["diff", self.old_sha, self.new_sha])
            .current_dir(self.repo_dir)
            .output()
            .map_err(|e| Error::DiffGeneration(format!("failed to run git diff: {e}")))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() || !stderr.trim().is_empty() {
            return Err(Error::DiffGeneration(format!(
                "`git diff {} {}` failed: {}",
                self.old_sha,
                self.new_sha,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Write the diff to `{dir}/{pr_id}.patch` and return the path.
    ///
    /// The directory's existence was already enforced by configuration
    /// validation; hitting the error here means a broken invariant, not bad
    /// user input.
    pub fn place_in_directory(&self, dir: &Path, pr_id: u64) -> Result<PathBuf> {
        if !dir.is_dir() {
            return Err(Error::NotADirectory(dir.to_path_buf()));
        }

        let path = dir.join(format!("{pr_id}.patch"));
        fs::write(&path, self.generate()?)?;
        Ok(path)
    }
}
