//! Internal implementation for the GitLab adapter.
//!
//! REST calls and JSON wire types. GitLab addresses projects by a
//! URL-encoded `namespace%2Frepo` path and numbers items by `iid`, which is
//! the per-project counter the migration cares about.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::error::{Error, Result};
use crate::forge::compose::{IssuePost, PrPost, ReleasePost};
use crate::forge::{Comment, Issue, IssueState, PrState, PullRequest, Release};

const PER_PAGE: usize = 100;

// ============================================================================
// Wire types (match the GitLab v4 JSON)
// ============================================================================

#[derive(Debug, Deserialize)]
struct GlIssue {
    iid: u64,
    title: String,
    description: Option<String>,
    state: String,
    author: GlUser,
    #[serde(default)]
    assignees: Vec<GlUser>,
    #[serde(default)]
    labels: Vec<String>,
    created_at: String,
    web_url: String,
}

#[derive(Debug, Deserialize)]
struct GlMergeRequest {
    iid: u64,
    title: String,
    description: Option<String>,
    state: String,
    author: GlUser,
    #[serde(default)]
    labels: Vec<String>,
    created_at: String,
    web_url: String,
    source_branch: String,
    target_branch: String,
    #[serde(default)]
    sha: Option<String>,
    #[serde(default)]
    diff_refs: Option<GlDiffRefs>,
}

#[derive(Debug, Deserialize)]
struct GlDiffRefs {
    base_sha: String,
    head_sha: String,
}

#[derive(Debug, Deserialize)]
struct GlRelease {
    tag_name: String,
    name: Option<String>,
    description: Option<String>,
    created_at: String,
    #[serde(default, rename = "_links")]
    links: Option<GlReleaseLinks>,
}

#[derive(Debug, Deserialize)]
struct GlReleaseLinks {
    #[serde(rename = "self", default)]
    self_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GlNote {
    author: GlUser,
    body: String,
    created_at: String,
    #[serde(default)]
    system: bool,
}

#[derive(Debug, Deserialize)]
struct GlUser {
    username: String,
}

#[derive(Debug, Deserialize)]
struct GlIid {
    iid: u64,
}

// ============================================================================
// REST client
// ============================================================================

/// One authenticated GitLab project.
pub(crate) struct Api {
    client: reqwest::blocking::Client,
    base: String,
    project: String, // url-encoded namespace%2Frepo
    token: String,
}

impl Api {
    pub(crate) fn new(base: &str, namespace: &str, repo: &str, token: String) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent("forgeferry")
            .build()
            .map_err(|e| Error::api("GitLab", format!("failed to create HTTP client: {e}")))?;

        let base = if base.is_empty() {
            "https://gitlab.com/api/v4".to_string()
        } else {
            base.trim_end_matches('/').to_string()
        };

        Ok(Self {
            client,
            base,
            project: format!("{namespace}%2F{repo}"),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/projects/{}/{}", self.base, self.project, path)
    }

    fn get(&self, url: &str, page: usize) -> Result<reqwest::blocking::Response> {
        let response = self
            .client
            .get(url)
            .query(&[("per_page", PER_PAGE.to_string()), ("page", page.to_string())])
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .map_err(|e| Error::api("GitLab", e.to_string()))?;
        check(response)
    }

    fn post(&self, url: &str, payload: &serde_json::Value) -> Result<reqwest::blocking::Response> {
        let response = self
            .client
            .post(url)
            .header("PRIVATE-TOKEN", &self.token)
            .json(payload)
            .send()
            .map_err(|e| Error::api("GitLab", e.to_string()))?;
        check(response)
    }

    fn put(&self, url: &str, payload: &serde_json::Value) -> Result<()> {
        let response = self
            .client
            .put(url)
            .header("PRIVATE-TOKEN", &self.token)
            .json(payload)
            .send()
            .map_err(|e| Error::api("GitLab", e.to_string()))?;
        check(response).map(drop)
    }

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
                .map_err(|e| Error::api("GitLab", format!("invalid JSON: {e}")))?;
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
        let raw: Vec<GlIssue> = self.get_all(&self.url("issues"), "scope=all")?;
        Ok(raw.into_iter().map(into_issue).collect())
    }

    pub(crate) fn list_merge_requests(&self) -> Result<Vec<PullRequest>> {
        let raw: Vec<GlMergeRequest> = self.get_all(&self.url("merge_requests"), "scope=all")?;
        // the listing carries no diff_refs; fetch each MR's detail for the
        // base/head shas, one call per item like everything else in a run
        raw.into_iter()
            .map(|mr| {
                let detail: GlMergeRequest = self
                    .get(&self.url(&format!("merge_requests/{}", mr.iid)), 1)?
                    .json()
                    .map_err(|e| Error::api("GitLab", format!("invalid JSON: {e}")))?;
                Ok(into_merge_request(detail))
            })
            .collect()
    }

    pub(crate) fn list_releases(&self) -> Result<Vec<Release>> {
        let raw: Vec<GlRelease> = self.get_all(&self.url("releases"), "")?;
        Ok(raw.into_iter().map(into_release).collect())
    }

    pub(crate) fn list_issue_notes(&self, iid: u64) -> Result<Vec<Comment>> {
        let raw: Vec<GlNote> = self.get_all(&self.url(&format!("issues/{iid}/notes")), "")?;
        Ok(raw
            .into_iter()
            .filter(|note| !note.system)
            .map(into_comment)
            .collect())
    }

    pub(crate) fn list_mr_notes(&self, iid: u64) -> Result<Vec<Comment>> {
        let raw: Vec<GlNote> =
            self.get_all(&self.url(&format!("merge_requests/{iid}/notes")), "")?;
        Ok(raw
            .into_iter()
            .filter(|note| !note.system)
            .map(into_comment)
            .collect())
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    pub(crate) fn create_issue(&self, post: &IssuePost) -> Result<u64> {
        let mut payload = json!({
            "title": post.title,
            "description": post.body,
        });
        if let Some(labels) = &post.labels {
            // GitLab takes labels as one comma-separated string
            payload["labels"] = json!(labels.join(","));
        }
        // assignees need numeric user ids on GitLab; usernames are dropped

        let created: GlIid = self
            .post(&self.url("issues"), &payload)?
            .json()
            .map_err(|e| Error::api("GitLab", format!("invalid JSON: {e}")))?;
        Ok(created.iid)
    }

    pub(crate) fn close_issue(&self, iid: u64) -> Result<()> {
        self.put(
            &self.url(&format!("issues/{iid}")),
            &json!({ "state_event": "close" }),
        )
    }

    pub(crate) fn comment_on_issue(&self, iid: u64, body: &str) -> Result<()> {
        self.post(
            &self.url(&format!("issues/{iid}/notes")),
            &json!({ "body": body }),
        )
        .map(drop)
    }

    pub(crate) fn create_merge_request(&self, post: &PrPost) -> Result<u64> {
        let mut payload = json!({
            "title": post.title,
            "description": post.body,
            "source_branch": post.source_branch,
            "target_branch": post.target_branch,
        });
        if let Some(labels) = &post.labels {
            payload["labels"] = json!(labels.join(","));
        }

        let created: GlIid = self
            .post(&self.url("merge_requests"), &payload)?
            .json()
            .map_err(|e| Error::api("GitLab", format!("invalid JSON: {e}")))?;
        Ok(created.iid)
    }

    pub(crate) fn close_merge_request(&self, iid: u64) -> Result<()> {
        self.put(
            &self.url(&format!("merge_requests/{iid}")),
            &json!({ "state_event": "close" }),
        )
    }

    pub(crate) fn create_release(&self, post: &ReleasePost) -> Result<()> {
        let payload = json!({
            "tag_name": post.tag,
            "name": post.title,
            "description": post.body,
        });
        self.post(&self.url("releases"), &payload).map(drop)
    }
}

fn check(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let detail = response.text().unwrap_or_default();
    Err(Error::api("GitLab", format!("{status}: {detail}")))
}

// ============================================================================
// Conversion functions
// ============================================================================

fn into_issue(gl: GlIssue) -> Issue {
    Issue {
        number: gl.iid,
        title: gl.title,
        body: gl.description,
        state: parse_issue_state(&gl.state),
        author: gl.author.username,
        assignees: gl.assignees.into_iter().map(|u| u.username).collect(),
        labels: gl.labels,
        created_at: gl.created_at,
        url: gl.web_url,
    }
}

fn into_merge_request(gl: GlMergeRequest) -> PullRequest {
    let (base_sha, head_sha) = match gl.diff_refs {
        Some(refs) => (refs.base_sha, refs.head_sha),
        None => (String::new(), gl.sha.unwrap_or_default()),
    };
    PullRequest {
        number: gl.iid,
        title: gl.title,
        body: gl.description,
        state: parse_mr_state(&gl.state),
        author: gl.author.username,
        labels: gl.labels,
        created_at: gl.created_at,
        url: gl.web_url,
        source_branch: gl.source_branch,
        target_branch: gl.target_branch,
        head_sha,
        base_sha,
    }
}

fn into_release(gl: GlRelease) -> Release {
    Release {
        title: gl.name.unwrap_or_else(|| gl.tag_name.clone()),
        tag: gl.tag_name,
        body: gl.description,
        created_at: gl.created_at,
        url: gl
            .links
            .and_then(|links| links.self_url)
            .unwrap_or_default(),
    }
}

fn into_comment(gl: GlNote) -> Comment {
    Comment {
        author: gl.author.username,
        body: gl.body,
        created_at: gl.created_at,
    }
}

fn parse_issue_state(state: &str) -> IssueState {
    match state {
        "opened" => IssueState::Open,
        _ => IssueState::Closed,
    }
}

fn parse_mr_state(state: &str) -> PrState {
    match state {
        "opened" | "locked" => PrState::Open,
        "merged" => PrState::Merged,
        _ => PrState::Closed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mr_states_map_onto_pr_states() {
        assert_eq!(parse_mr_state("opened"), PrState::Open);
        assert_eq!(parse_mr_state("merged"), PrState::Merged);
        assert_eq!(parse_mr_state("closed"), PrState::Closed);
    }

    #[test]
    fn system_notes_are_dropped() {
        let notes: Vec<GlNote> = serde_json::from_value(serde_json::json!([
            { "author": { "username": "a" }, "body": "real", "created_at": "2020-01-01T00:00:00Z" },
            { "author": { "username": "b" }, "body": "changed the description",
              "created_at": "2020-01-02T00:00:00Z", "system": true }
        ]))
        .unwrap();
        let kept: Vec<_> = notes.into_iter().filter(|n| !n.system).collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].body, "real");
    }
}
