//! Internal implementation for the GitHub adapter.
//!
//! Contains the REST calls and JSON wire types. Not exposed outside the
//! adapter; the posting policy lives in mod.rs.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::error::{Error, Result};
use crate::forge::compose::{IssuePost, PrPost, ReleasePost};
use crate::forge::{Comment, Issue, IssueState, PrState, PullRequest, Release};

const PER_PAGE: usize = 100;

// ============================================================================
// Wire types (match the GitHub REST v3 JSON)
// ============================================================================

#[derive(Debug, Deserialize)]
struct GhIssue {
    number: u64,
    title: String,
    body: Option<String>,
    state: String,
    user: GhUser,
    #[serde(default)]
    assignees: Vec<GhUser>,
    #[serde(default)]
    labels: Vec<GhLabel>,
    created_at: String,
    html_url: String,
    /// Present when the entry is actually a pull request; the issues listing
    /// returns both kinds.
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GhPullRequest {
    number: u64,
    title: String,
    body: Option<String>,
    state: String,
    merged_at: Option<String>,
    user: GhUser,
    #[serde(default)]
    labels: Vec<GhLabel>,
    created_at: String,
    html_url: String,
    head: GhRef,
    base: GhRef,
}

#[derive(Debug, Deserialize)]
struct GhRef {
    #[serde(rename = "ref")]
    branch: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GhRelease {
    tag_name: String,
    name: Option<String>,
    body: Option<String>,
    created_at: String,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct GhComment {
    user: GhUser,
    body: Option<String>,
    created_at: String,
}

#[derive(Debug, Deserialize)]
struct GhUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GhLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GhNumber {
    number: u64,
}

// ============================================================================
// REST client
// ============================================================================

/// One authenticated GitHub project.
pub(crate) struct Api {
    client: reqwest::blocking::Client,
    base: String,
    repo: String, // owner/repo
    token: String,
}

impl Api {
    pub(crate) fn new(base: &str, repo: String, token: String) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent("forgeferry")
            .build()
            .map_err(|e| Error::api("GitHub", format!("failed to create HTTP client: {e}")))?;

        let base = if base.is_empty() {
            "https://api.github.com".to_string()
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

    fn url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}", self.base, self.repo, path)
    }

    fn get(&self, url: &str, page: usize) -> Result<reqwest::blocking::Response> {
        let response = self
            .client
            .get(url)
            .query(&[("per_page", PER_PAGE.to_string()), ("page", page.to_string())])
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("token {}", self.token))
            .send()
            .map_err(|e| Error::api("GitHub", e.to_string()))?;
        check(response)
    }

    fn post(&self, url: &str, payload: &serde_json::Value) -> Result<reqwest::blocking::Response> {
        let response = self
            .client
            .post(url)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("token {}", self.token))
            .json(payload)
            .send()
            .map_err(|e| Error::api("GitHub", e.to_string()))?;
        check(response)
    }

    fn patch(&self, url: &str, payload: &serde_json::Value) -> Result<()> {
        let response = self
            .client
            .patch(url)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("token {}", self.token))
            .json(payload)
            .send()
            .map_err(|e| Error::api("GitHub", e.to_string()))?;
        check(response).map(drop)
    }

    /// Fetch every page of a collection endpoint.
    fn get_all<T: serde::de::DeserializeOwned>(&self, url: &str, query: &str) -> Result<Vec<T>> {
        let url = if query.is_empty() {
            url.to_string()
        } else {
            format!("{url}?{query}")
        };

        let mut collected = Vec::new();
        for page in 1.. {
            let batch: Vec<T> = self
                .get(&url, page)?
                .json()
                .map_err(|e| Error::api("GitHub", format!("invalid JSON: {e}")))?;
            let len = batch.len();
            collected.extend(batch);
            if len < PER_PAGE {
                break;
            }
        }
        Ok(collected)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub(crate) fn list_issues(&self) -> Result<Vec<Issue>> {
        let raw: Vec<GhIssue> = self.get_all(&self.url("issues"), "state=all")?;
        Ok(raw
            .into_iter()
            .filter(|issue| issue.pull_request.is_none())
            .map(into_issue)
            .collect())
    }

    pub(crate) fn list_pull_requests(&self) -> Result<Vec<PullRequest>> {
        let raw: Vec<GhPullRequest> = self.get_all(&self.url("pulls"), "state=all")?;
        Ok(raw.into_iter().map(into_pull_request).collect())
    }

    pub(crate) fn list_releases(&self) -> Result<Vec<Release>> {
        let raw: Vec<GhRelease> = self.get_all(&self.url("releases"), "")?;
        Ok(raw.into_iter().map(into_release).collect())
    }

    pub(crate) fn list_comments(&self, number: u64) -> Result<Vec<Comment>> {
        // PR conversation comments live on the issues endpoint too
        let raw: Vec<GhComment> =
            self.get_all(&self.url(&format!("issues/{number}/comments")), "")?;
        Ok(raw.into_iter().map(into_comment).collect())
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    pub(crate) fn create_issue(&self, post: &IssuePost) -> Result<u64> {
        let mut payload = json!({
            "title": post.title,
            "body": post.body,
        });
        if let Some(labels) = &post.labels {
            payload["labels"] = json!(labels);
        }
        if let Some(assignees) = &post.assignees {
            payload["assignees"] = json!(assignees);
        }

        let created: GhNumber = self
            .post(&self.url("issues"), &payload)?
            .json()
            .map_err(|e| Error::api("GitHub", format!("invalid JSON: {e}")))?;
        Ok(created.number)
    }

    pub(crate) fn close_issue(&self, number: u64) -> Result<()> {
        self.patch(
            &self.url(&format!("issues/{number}")),
            &json!({ "state": "closed" }),
        )
    }

    pub(crate) fn comment_on_issue(&self, number: u64, body: &str) -> Result<()> {
        self.post(
            &self.url(&format!("issues/{number}/comments")),
            &json!({ "body": body }),
        )
        .map(drop)
    }

    pub(crate) fn create_pull_request(&self, post: &PrPost) -> Result<u64> {
        let payload = json!({
            "title": post.title,
            "body": post.body,
            "head": post.source_branch,
            "base": post.target_branch,
        });
        let created: GhNumber = self
            .post(&self.url("pulls"), &payload)?
            .json()
            .map_err(|e| Error::api("GitHub", format!("invalid JSON: {e}")))?;
        Ok(created.number)
    }

    pub(crate) fn close_pull_request(&self, number: u64) -> Result<()> {
        self.patch(
            &self.url(&format!("pulls/{number}")),
            &json!({ "state": "closed" }),
        )
    }

    pub(crate) fn create_release(&self, post: &ReleasePost) -> Result<()> {
        let payload = json!({
            "tag_name": post.tag,
            "name": post.title,
            "body": post.body,
        });
        self.post(&self.url("releases"), &payload).map(drop)
    }
}

/// Surface API rejections with the response body attached.
fn check(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let detail = response.text().unwrap_or_default();
    Err(Error::api("GitHub", format!("{status}: {detail}")))
}

// ============================================================================
// Conversion functions
// ============================================================================

fn into_issue(gh: GhIssue) -> Issue {
    Issue {
        number: gh.number,
        title: gh.title,
        body: gh.body,
        state: parse_issue_state(&gh.state),
        author: gh.user.login,
        assignees: gh.assignees.into_iter().map(|u| u.login).collect(),
        labels: gh.labels.into_iter().map(|l| l.name).collect(),
        created_at: gh.created_at,
        url: gh.html_url,
    }
}

fn into_pull_request(gh: GhPullRequest) -> PullRequest {
    PullRequest {
        number: gh.number,
        title: gh.title,
        body: gh.body,
        state: parse_pr_state(&gh.state, gh.merged_at.is_some()),
        author: gh.user.login,
        labels: gh.labels.into_iter().map(|l| l.name).collect(),
        created_at: gh.created_at,
        url: gh.html_url,
        source_branch: gh.head.branch,
        target_branch: gh.base.branch,
        head_sha: gh.head.sha,
        base_sha: gh.base.sha,
    }
}

fn into_release(gh: GhRelease) -> Release {
    Release {
        title: gh.name.unwrap_or_else(|| gh.tag_name.clone()),
        tag: gh.tag_name,
        body: gh.body,
        created_at: gh.created_at,
        url: gh.html_url,
    }
}

fn into_comment(gh: GhComment) -> Comment {
    Comment {
        author: gh.user.login,
        body: gh.body.unwrap_or_default(),
        created_at: gh.created_at,
    }
}

fn parse_issue_state(state: &str) -> IssueState {
    match state {
        "open" => IssueState::Open,
        _ => IssueState::Closed,
    }
}

fn parse_pr_state(state: &str, merged: bool) -> PrState {
    if merged {
        PrState::Merged
    } else {
        match state {
            "open" => PrState::Open,
            _ => PrState::Closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_listing_entry_with_pull_request_key_is_a_pr() {
        let raw: GhIssue = serde_json::from_value(serde_json::json!({
            "number": 5,
            "title": "t",
            "state": "open",
            "user": { "login": "a" },
            "created_at": "2020-01-01T00:00:00Z",
            "html_url": "https://github.com/o/r/pull/5",
            "pull_request": { "url": "https://api.github.com/repos/o/r/pulls/5" }
        }))
        .unwrap();
        assert!(raw.pull_request.is_some());
    }

    #[test]
    fn merged_at_wins_over_closed_state() {
        assert_eq!(parse_pr_state("closed", true), PrState::Merged);
        assert_eq!(parse_pr_state("closed", false), PrState::Closed);
        assert_eq!(parse_pr_state("open", false), PrState::Open);
    }
}
