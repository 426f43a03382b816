//! GitLab adapter: full read path, write path mirroring the GitHub policy.
//!
//! Merge requests map onto the pull-request model; `iid` is the per-project
//! number that shares a counter with issues on the providers this tool
//! migrates between. The posting rules are the same as the GitHub adapter's,
//! expressed through the shared payload composer.

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

/// One GitLab project, readable and writable.
pub struct GitLabProject {
    api: internal::Api,
    path: String, // namespace/repo
    config: Config,
}

impl GitLabProject {
    pub fn new(endpoint: &EndpointSection, config: &Config) -> Result<Self> {
        let api = internal::Api::new(
            &endpoint.api_url,
            &endpoint.namespace,
            &endpoint.repo,
            endpoint.token.clone(),
        )?;
        Ok(Self {
            api,
            path: format!("{}/{}", endpoint.namespace, endpoint.repo),
            config: config.clone(),
        })
    }
}

impl ProjectReader for GitLabProject {
    fn provider(&self) -> Provider {
        Provider::GitLab
    }

    fn project_url(&self) -> String {
        format!("https://gitlab.com/{}", self.path)
    }

    fn list_issues(&self) -> Result<BTreeMap<u64, Issue>> {
        let issues = self.api.list_issues()?;
        Ok(issues.into_iter().map(|i| (i.number, i)).collect())
    }

    fn list_pull_requests(&self) -> Result<BTreeMap<u64, PullRequest>> {
        let mrs = self.api.list_merge_requests()?;
        Ok(mrs.into_iter().map(|mr| (mr.number, mr)).collect())
    }

    fn list_releases(&self) -> Result<Vec<Release>> {
        self.api.list_releases()
    }

    fn list_issue_comments(&self, number: u64) -> Result<Vec<Comment>> {
        self.api.list_issue_notes(number)
    }

    fn list_pr_comments(&self, number: u64) -> Result<Vec<Comment>> {
        self.api.list_mr_notes(number)
    }
}

impl ProjectWriter for GitLabProject {
    fn provider(&self) -> Provider {
        Provider::GitLab
    }

    fn post_issue(&self, fields: &FieldMap, shorten: bool) -> Result<()> {
        let post = compose::issue_post(fields, shorten)?;
        let iid = self.api.create_issue(&post)?;

        if let Some(state) = fields.status() {
            if !state.is_open() {
                self.api.close_issue(iid)?;
            }
        }

        for comment in &post.comments {
            self.api
                .comment_on_issue(iid, &provenance::render_comment(comment))?;
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
        let iid = self.api.create_merge_request(&post)?;
        // the target copy is historical, not actionable
        self.api.close_merge_request(iid)?;

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
        let iid = self.api.create_issue(&post)?;
        self.api.close_issue(iid)
    }
}
