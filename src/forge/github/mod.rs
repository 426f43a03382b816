//! GitHub adapter: full read path plus the posting policy.
//!
//! Posting rules:
//! - issues closed on the source are created, then closed right away;
//! - with `pr.as_issue`, PRs go through the issue path using the PR shorten
//!   flag for that one call;
//! - PRs still open on the source become closed placeholder issues when
//!   `pr.open_prs_as_issues` is set, so the target never gains synthetic PRs
//!   nobody can review;
//! - everything else becomes a real PR, closed immediately after creation.
//!
//! Comment replay for real PRs is a no-op for now; issue comments replay in
//! creation order.

mod internal;

use std::collections::BTreeMap;

use crate::config::{Config, EndpointSection};
use crate::error::{Error, Result};
use crate::forge::{
    compose, Comment, Issue, ItemState, ProjectReader, ProjectWriter, Provider, PullRequest,
    Release,
};
use crate::projection::{Field, FieldMap, FieldMapExt};
use crate::provenance;

/// One GitHub project, readable and writable.
pub struct GitHubProject {
    api: internal::Api,
    repo: String, // owner/repo
    config: Config,
}

impl GitHubProject {
    pub fn new(endpoint: &EndpointSection, config: &Config) -> Result<Self> {
        let repo = format!("{}/{}", endpoint.namespace, endpoint.repo);
        let api = internal::Api::new(&endpoint.api_url, repo.clone(), endpoint.token.clone())?;
        Ok(Self {
            api,
            repo,
            config: config.clone(),
        })
    }
}

impl ProjectReader for GitHubProject {
    fn provider(&self) -> Provider {
        Provider::GitHub
    }

    fn project_url(&self) -> String {
        format!("https://github.com/{}", self.repo)
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
        self.api.list_releases()
    }

    fn list_issue_comments(&self, number: u64) -> Result<Vec<Comment>> {
        self.api.list_comments(number)
    }

    fn list_pr_comments(&self, number: u64) -> Result<Vec<Comment>> {
        // conversation comments share the issues endpoint
        self.api.list_comments(number)
    }
}

impl ProjectWriter for GitHubProject {
    fn provider(&self) -> Provider {
        Provider::GitHub
    }

    fn post_issue(&self, fields: &FieldMap, shorten: bool) -> Result<()> {
        let post = compose::issue_post(fields, shorten)?;
        let number = self.api.create_issue(&post)?;

        if let Some(state) = fields.status() {
            if !state.is_open() {
                self.api.close_issue(number)?;
            }
        }

        for comment in &post.comments {
            self.api
                .comment_on_issue(number, &provenance::render_comment(comment))?;
        }

        Ok(())
    }

    fn post_pull_request(&self, fields: &FieldMap) -> Result<()> {
        if self.config.pr.as_issue {
            // effective shorten mode for this call only
            return self.post_issue(fields, self.config.pr.shorten);
        }

        if fields.status() == Some(ItemState::Open) && self.config.pr.open_prs_as_issues {
            let id = fields.id().ok_or(Error::MissingField(Field::Id))?;
            let author = fields
                .text(Field::Author)
                .ok_or(Error::MissingField(Field::Author))?;
            return self.post_placeholder(
                &provenance::open_pr_placeholder_title(id),
                &provenance::open_pr_placeholder_body(
                    fields.text(Field::Url),
                    fields.text(Field::Created),
                    author,
                ),
            );
        }

        let post = compose::pr_post(fields)?;
        let number = self.api.create_pull_request(&post)?;
        // the target copy is historical, not actionable
        self.api.close_pull_request(number)?;

        Ok(())
    }

    fn post_release(&self, fields: &FieldMap) -> Result<()> {
        let post = compose::release_post(fields)?;
        self.api.create_release(&post)
    }

    fn post_placeholder(&self, title: &str, body: &str) -> Result<()> {
        let post = compose::IssuePost {
            title: title.to_string(),
            body: body.to_string(),
            labels: None,
            assignees: None,
            comments: Vec::new(),
        };
        let number = self.api.create_issue(&post)?;
        self.api.close_issue(number)
    }
}
