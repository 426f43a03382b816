//! Pagure adapter: read-only.
//!
//! Pagure works fine as a migration source, but this tool does not post to
//! it. Every write operation refuses immediately so a Pagure target fails on
//! the first post instead of after a partial run.

mod internal;

use std::collections::BTreeMap;

use crate::config::{Config, EndpointSection};
use crate::error::{Error, Result};
use crate::forge::{Comment, Issue, ProjectReader, ProjectWriter, Provider, PullRequest, Release};
use crate::projection::FieldMap;

/// One Pagure project. Reads work; writes refuse.
pub struct PagureProject {
    api: internal::Api,
    repo: String, // namespace/repo
}

impl PagureProject {
    pub fn new(endpoint: &EndpointSection, _config: &Config) -> Result<Self> {
        let repo = format!("{}/{}", endpoint.namespace, endpoint.repo);
        let api = internal::Api::new(&endpoint.api_url, repo.clone(), endpoint.token.clone())?;
        Ok(Self { api, repo })
    }
}

impl ProjectReader for PagureProject {
    fn provider(&self) -> Provider {
        Provider::Pagure
    }

    fn project_url(&self) -> String {
        format!("{}/{}", self.api.host_url(), self.repo)
    }

    fn list_issues(&self) -> Result<BTreeMap<u64, Issue>> {
        let issues = self.api.list_issues()?;
        Ok(issues.into_iter().map(|i| (i.number, i)).collect())
    }

    fn list_pull_requests(&self) -> Result<BTreeMap<u64, PullRequest>> {
        let prs = self.api.list_pull_requests()?;
        Ok(prs.into_iter().map(|pr| (pr.number, pr)).collect())
    }

    fn list_releases(&self) -> Result<Vec<Release>> {
        self.api.list_tags_as_releases()
    }

    fn list_issue_comments(&self, number: u64) -> Result<Vec<Comment>> {
        self.api.issue_comments(number)
    }

    fn list_pr_comments(&self, number: u64) -> Result<Vec<Comment>> {
        self.api.pr_comments(number)
    }
}

impl ProjectWriter for PagureProject {
    fn provider(&self) -> Provider {
        Provider::Pagure
    }

    fn post_issue(&self, _fields: &FieldMap, _shorten: bool) -> Result<()> {
        Err(Error::Unsupported("Pagure"))
    }

    fn post_pull_request(&self, _fields: &FieldMap) -> Result<()> {
        Err(Error::Unsupported("Pagure"))
    }

    fn post_release(&self, _fields: &FieldMap) -> Result<()> {
        Err(Error::Unsupported("Pagure"))
    }

    fn post_placeholder(&self, _title: &str, _body: &str) -> Result<()> {
        Err(Error::Unsupported("Pagure"))
    }
}
