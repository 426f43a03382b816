//! Run configuration loaded from forgeferry.toml.
//!
//! The file lives wherever `--config` points, or under the user config
//! directory. Cross-field invariants (diff capture vs. storage directory vs.
//! PR comment posting) are enforced once here; the orchestrator trusts them
//! and never re-checks.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::forge::Provider;

/// File names probed in the user config directory when --config is absent.
const DEFAULT_CONFIG_NAMES: &[&str] = &["forgeferry.toml", ".forgeferry.toml"];

/// Complete run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub source: EndpointSection,
    pub target: EndpointSection,

    #[serde(default)]
    pub issue: IssueSection,
    #[serde(default)]
    pub pr: PrSection,

    /// Map of source usernames to target usernames, applied when rendering
    /// provenance headers.
    #[serde(default)]
    pub user_map: BTreeMap<String, String>,

    #[serde(default = "default_true")]
    pub preserve_datetime: bool,
    #[serde(default = "default_true")]
    pub track_urls: bool,
    #[serde(default = "default_true")]
    pub match_ids: bool,
    #[serde(default = "default_true")]
    pub make_diffs: bool,
    /// Directory that receives one `{id}.patch` file per migrated PR.
    #[serde(default)]
    pub diff_dir: String,
    #[serde(default)]
    pub transfer_releases: bool,
    #[serde(default = "default_true")]
    pub post_migration_note: bool,
    /// Starting cursor offset: ids at or below this are never visited.
    #[serde(default)]
    pub skip_first_ids: u64,
}

/// One side of the migration: a project on some provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSection {
    pub provider: Provider,
    pub namespace: String,
    pub repo: String,
    #[serde(default)]
    pub token: String,
    /// Override for self-hosted instances; empty means the public host.
    #[serde(default)]
    pub api_url: String,
}

/// Per-issue transfer knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueSection {
    /// Inline comments into the body instead of replaying them.
    #[serde(default)]
    pub shorten: bool,
    #[serde(default = "default_true")]
    pub assignees: bool,
    #[serde(default = "default_true")]
    pub labels: bool,
}

impl Default for IssueSection {
    fn default() -> Self {
        Self {
            shorten: false,
            assignees: true,
            labels: true,
        }
    }
}

/// Per-PR transfer knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrSection {
    #[serde(default)]
    pub shorten: bool,
    #[serde(default = "default_true")]
    pub assignees: bool,
    #[serde(default = "default_true")]
    pub labels: bool,
    /// Allow commenting on migrated PRs. Diff capture requires this.
    #[serde(default = "default_true")]
    pub post_comments: bool,
    #[serde(default = "default_true")]
    pub track_branches: bool,
    /// Replay PRs through the issue path instead of creating real PRs.
    #[serde(default)]
    pub as_issue: bool,
    /// Replace PRs still open on the source with closed placeholder issues.
    #[serde(default = "default_true")]
    pub open_prs_as_issues: bool,
    /// Push URL of the source repository, used for branch staging.
    #[serde(default)]
    pub ssh_url: String,
}

impl Default for PrSection {
    fn default() -> Self {
        Self {
            shorten: false,
            assignees: true,
            labels: true,
            post_comments: true,
            track_branches: true,
            as_issue: false,
            open_prs_as_issues: true,
            ssh_url: String::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load and validate configuration.
    ///
    /// With no explicit path, probes the default file names under the user
    /// config directory.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => {
                if !p.is_file() {
                    return Err(Error::Config(format!(
                        "config file {} not found",
                        p.display()
                    )));
                }
                p.to_path_buf()
            }
            None => default_config_path()?,
        };

        let contents = fs::read_to_string(&path)?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))?;

        config.validate()?;
        Ok(config)
    }

    /// Parse from a TOML string and validate. Used by tests and `check`.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Cross-field invariants, checked once at load time.
    fn validate(&self) -> Result<()> {
        for endpoint in [&self.source, &self.target] {
            if endpoint.namespace.is_empty() || endpoint.repo.is_empty() {
                return Err(Error::Config(
                    "source and target need both a namespace and a repo".into(),
                ));
            }
        }

        if !self.diff_dir.is_empty() && !Path::new(&self.diff_dir).is_dir() {
            return Err(Error::Config(format!(
                "{} is not a directory",
                self.diff_dir
            )));
        }

        if self.make_diffs && (!self.pr.post_comments || self.diff_dir.is_empty()) {
            return Err(Error::Config(
                "diffs must be stored somewhere: set `diff_dir` and keep \
                 `pr.post_comments` enabled, or disable `make_diffs`"
                    .into(),
            ));
        }

        if self.make_diffs && self.pr.ssh_url.is_empty() {
            return Err(Error::Config(
                "`make_diffs` needs `pr.ssh_url` so branches can be staged \
                 for diffing"
                    .into(),
            ));
        }

        if !self.make_diffs && (self.pr.post_comments || !self.diff_dir.is_empty()) {
            let mut enabled = Vec::new();
            if self.pr.post_comments {
                enabled.push("pr.post_comments");
            }
            if !self.diff_dir.is_empty() {
                enabled.push("diff_dir");
            }
            return Err(Error::Config(format!(
                "{} enabled but `make_diffs` is off: enable `make_diffs` or \
                 disable {}",
                enabled.join(" and "),
                enabled.join(" and "),
            )));
        }

        if self
            .user_map
            .iter()
            .any(|(from, to)| from.is_empty() || to.is_empty())
        {
            return Err(Error::Config("user_map entries must be non-empty".into()));
        }

        Ok(())
    }

    /// Target username for a source author, if the user map covers it.
    pub fn mapped_user<'a>(&'a self, author: &'a str) -> &'a str {
        self.user_map
            .get(author)
            .map(String::as_str)
            .unwrap_or(author)
    }

    /// Diff storage directory, when diff capture is enabled.
    pub fn diff_storage_dir(&self) -> Option<&Path> {
        if self.make_diffs {
            Some(Path::new(&self.diff_dir))
        } else {
            None
        }
    }
}

/// Locate a config file in the default location.
fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| Error::Config("could not determine user config directory".into()))?;

    for name in DEFAULT_CONFIG_NAMES {
        let candidate = config_dir.join(name);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    Err(Error::Config(format!(
        "no forgeferry config file found under {}; create a `forgeferry.toml` \
         there or pass --config",
        config_dir.display()
    )))
}
