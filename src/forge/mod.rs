//! Forge abstraction: one project per provider, read and write capabilities.
//!
//! Adapters are composed from two small traits instead of an inheritance
//! tree: `ProjectReader` lists a project's issues, PRs, releases and
//! comments; `ProjectWriter` posts them. A provider that cannot post (Pagure)
//! implements the writer by refusing every call, so a misconfigured target
//! fails on the first post instead of half way through.

pub mod compose;
pub mod entity;
mod types;

pub mod github;
pub mod gitlab;
pub mod pagure;

pub use types::*;

use std::collections::BTreeMap;

use crate::config::{Config, EndpointSection};
use crate::error::Result;
use crate::projection::FieldMap;

/// Read-only access to one project's collaboration artifacts.
///
/// Issues and PRs come back keyed by number because the two kinds share one
/// id space on the supported providers; the orchestrator walks that space.
pub trait ProjectReader {
    fn provider(&self) -> Provider;

    /// Browse URL of the project, used in the migration note.
    fn project_url(&self) -> String;

    fn list_issues(&self) -> Result<BTreeMap<u64, Issue>>;

    fn list_pull_requests(&self) -> Result<BTreeMap<u64, PullRequest>>;

    fn list_releases(&self) -> Result<Vec<Release>>;

    fn list_issue_comments(&self, number: u64) -> Result<Vec<Comment>>;

    fn list_pr_comments(&self, number: u64) -> Result<Vec<Comment>>;
}

/// Write access to one project.
///
/// `shorten` on [`ProjectWriter::post_issue`] is the effective posting mode
/// for that one call, computed by the caller from configuration and call
/// context. Passing it per call is what lets PR-as-issue posting borrow the
/// issue path with its own flag without touching shared configuration.
pub trait ProjectWriter {
    fn provider(&self) -> Provider;

    /// Create an issue from projected fields; closed source issues are
    /// closed on the target right after creation.
    fn post_issue(&self, fields: &FieldMap, shorten: bool) -> Result<()>;

    /// Create a pull request (or its configured stand-in) from projected
    /// fields. The target copy is historical and is closed immediately.
    fn post_pull_request(&self, fields: &FieldMap) -> Result<()>;

    /// Create a release from projected fields.
    fn post_release(&self, fields: &FieldMap) -> Result<()>;

    /// Create an issue with the given title and body and close it at once.
    /// Used for gap-fill dummies and the migration note.
    fn post_placeholder(&self, title: &str, body: &str) -> Result<()>;
}

/// Build a reader for one side of the migration.
pub fn reader(endpoint: &EndpointSection, config: &Config) -> Result<Box<dyn ProjectReader>> {
    Ok(match endpoint.provider {
        Provider::GitHub => Box::new(github::GitHubProject::new(endpoint, config)?),
        Provider::GitLab => Box::new(gitlab::GitLabProject::new(endpoint, config)?),
        Provider::Pagure => Box::new(pagure::PagureProject::new(endpoint, config)?),
    })
}

/// Build a writer for the target side.
pub fn writer(endpoint: &EndpointSection, config: &Config) -> Result<Box<dyn ProjectWriter>> {
    Ok(match endpoint.provider {
        Provider::GitHub => Box::new(github::GitHubProject::new(endpoint, config)?),
        Provider::GitLab => Box::new(gitlab::GitLabProject::new(endpoint, config)?),
        Provider::Pagure => Box::new(pagure::PagureProject::new(endpoint, config)?),
    })
}
