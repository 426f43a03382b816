//! Internal implementation for the Pagure adapter.
//!
//! Read-only REST calls against the Pagure v0 API. Pagure wraps collections
//! in envelope objects and stamps dates as unix epoch strings; both quirks
//! stay in here.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::forge::{Comment, Issue, IssueState, PrState, PullRequest, Release};

const PER_PAGE: usize = 100;

// ============================================================================
// Wire types (match the Pagure v0 JSON)
// ============================================================================

#[derive(Debug, Deserialize)]
struct PgIssueList {
    issues: Vec<PgIssue>,
}

#[derive(Debug, Deserialize)]
struct PgIssue {
    id: u64,
    title: String,
    content: Option<String>,
    status: String,
    user: PgUser,
    assignee: Option<PgUser>,
    #[serde(default)]
    tags: Vec<String>,
    date_created: String,
    #[serde(default)]
    comments: Vec<PgComment>,
}

#[derive(Debug, Deserialize)]
struct PgPullRequestList {
    requests: Vec<PgPullRequest>,
}

#[derive(Debug, Deserialize)]
struct PgPullRequest {
    id: u64,
    title: String,
    initial_comment: Option<String>,
    status: String,
    user: PgUser,
    #[serde(default)]
    tags: Vec<String>,
    date_created: String,
    /// Source branch of the change.
    branch_from: String,
    /// Branch the change targets.
    branch: String,
    commit_start: Option<String>,
    commit_stop: Option<String>,
    #[serde(default)]
    comments: Vec<PgComment>,
}

#[derive(Debug, Deserialize)]
struct PgTagList {
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PgComment {
    user: PgUser,
    comment: String,
    date_created: String,
}

#[derive(Debug, Deserialize)]
struct PgUser {
    name: String,
}

// ============================================================================
// REST client
// ============================================================================

/// One Pagure project.
pub(crate) struct Api {
    client: reqwest::blocking::Client,
    base: String,
    repo: String, // namespace/repo
    token: String,
}

impl Api {
    pub(crate) fn new(base: &str, repo: String, token: String) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent("forgeferry")
            .build()
            .map_err(|e| Error::api("Pagure", format!("failed to create HTTP client: {e}")))?;

        let base = if base.is_empty() {
            "https://pagure.io/api/0".to_string()
        } else {
            base.trim_end_matches('/').to_string()
        };

        Ok(Self {
            client,
            base,
            repo,
            token,
        })
    }

    pub(crate) fn host_url(&self) -> String {
        // api/0 hangs off the instance root
        self.base
            .trim_end_matches("/api/0")
            .trim_end_matches('/')
            .to_string()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base, self.repo, path)
    }

    fn get<T: serde::de::DeserializeOwned>(&self, url: &str, page: usize) -> Result<T> {
        let mut request = self
            .client
            .get(url)
            .query(&[("per_page", PER_PAGE.to_string()), ("page", page.to_string())]);
        if !self.token.is_empty() {
            request = request.header("Authorization", format!("token {}", self.token));
        }

        let response = request
            .send()
            .map_err(|e| Error::api("Pagure", e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().unwrap_or_default();
            return Err(Error::api("Pagure", format!("{status}: {detail}")));
        }
        response
            .json()
            .map_err(|e| Error::api("Pagure", format!("invalid JSON: {e}")))
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub(crate) fn list_issues(&self) -> Result<Vec<Issue>> {
        let mut collected = Vec::new();
        for page in 1.. {
            let batch: PgIssueList = self.get(&format!("{}?status=all", self.url("issues")), page)?;
            let len = batch.issues.len();
            collected.extend(batch.issues.into_iter().map(|i| self.into_issue(i)));
            if len < PER_PAGE {
                break;
            }
        }
        Ok(collected)
    }

    pub(crate) fn list_pull_requests(&self) -> Result<Vec<PullRequest>> {
        let mut collected = Vec::new();
        for page in 1.. {
            let batch: PgPullRequestList =
                self.get(&format!("{}?status=all", self.url("pull-requests")), page)?;
            let len = batch.requests.len();
            collected.extend(batch.requests.into_iter().map(|pr| self.into_pull_request(pr)));
            if len < PER_PAGE {
                break;
            }
        }
        Ok(collected)
    }

    /// Pagure has no release objects; git tags stand in for them.
    pub(crate) fn list_tags_as_releases(&self) -> Result<Vec<Release>> {
        let batch: PgTagList = self.get(&self.url("git/tags"), 1)?;
        Ok(batch
            .tags
            .into_iter()
            .map(|tag| Release {
                title: tag.clone(),
                url: format!("{}/{}/tree/{}", self.host_url(), self.repo, tag),
                tag,
                body: None,
                created_at: String::new(),
            })
            .collect())
    }

    pub(crate) fn issue_comments(&self, id: u64) -> Result<Vec<Comment>> {
        let issue: PgIssue = self.get(&self.url(&format!("issue/{id}")), 1)?;
        Ok(issue.comments.into_iter().map(into_comment).collect())
    }

    pub(crate) fn pr_comments(&self, id: u64) -> Result<Vec<Comment>> {
        let pr: PgPullRequest = self.get(&self.url(&format!("pull-request/{id}")), 1)?;
        Ok(pr.comments.into_iter().map(into_comment).collect())
    }

    // ------------------------------------------------------------------
    // Conversion
    // ------------------------------------------------------------------

    fn into_issue(&self, pg: PgIssue) -> Issue {
        let url = format!("{}/{}/issue/{}", self.host_url(), self.repo, pg.id);
        Issue {
            number: pg.id,
            title: pg.title,
            body: pg.content,
            state: parse_issue_state(&pg.status),
            author: pg.user.name,
            assignees: pg.assignee.map(|u| vec![u.name]).unwrap_or_default(),
            labels: pg.tags,
            created_at: epoch_to_rfc3339(&pg.date_created),
            url,
        }
    }

    fn into_pull_request(&self, pg: PgPullRequest) -> PullRequest {
        let url = format!("{}/{}/pull-request/{}", self.host_url(), self.repo, pg.id);
        PullRequest {
            number: pg.id,
            title: pg.title,
            body: pg.initial_comment,
            state: parse_pr_state(&pg.status),
            author: pg.user.name,
            labels: pg.tags,
            created_at: epoch_to_rfc3339(&pg.date_created),
            url,
            source_branch: pg.branch_from,
            target_branch: pg.branch,
            head_sha: pg.commit_stop.unwrap_or_default(),
            base_sha: pg.commit_start.unwrap_or_default(),
        }
    }
}

fn into_comment(pg: PgComment) -> Comment {
    Comment {
        author: pg.user.name,
        body: pg.comment,
        created_at: epoch_to_rfc3339(&pg.date_created),
    }
}

/// Pagure stamps dates as stringified unix epochs.
fn epoch_to_rfc3339(epoch: &str) -> String {
    epoch
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| epoch.to_string())
}

fn parse_issue_state(status: &str) -> IssueState {
    match status {
        "Open" => IssueState::Open,
        _ => IssueState::Closed,
    }
}

fn parse_pr_state(status: &str) -> PrState {
    match status {
        "Open" => PrState::Open,
        "Merged" => PrState::Merged,
        _ => PrState::Closed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_dates_become_rfc3339() {
        let converted = epoch_to_rfc3339("1614592800");
        assert!(converted.starts_with("2021-03-01T"));
    }

    #[test]
    fn unparseable_dates_pass_through() {
        assert_eq!(epoch_to_rfc3339("not-a-date"), "not-a-date");
    }

    #[test]
    fn pagure_statuses_map_to_states() {
        assert_eq!(parse_issue_state("Open"), IssueState::Open);
        assert_eq!(parse_issue_state("Closed"), IssueState::Closed);
        assert_eq!(parse_pr_state("Merged"), PrState::Merged);
    }
}
