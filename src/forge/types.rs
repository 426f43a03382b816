//! Domain types for the forge abstraction.
//!
//! Platform-agnostic value types for issues, pull requests, releases and
//! comments. Adapters convert each provider's wire format into these; nothing
//! downstream ever sees provider-specific JSON.

use serde::{Deserialize, Serialize};

/// Supported hosting providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    GitHub,
    GitLab,
    Pagure,
}

impl Provider {
    pub fn name(self) -> &'static str {
        match self {
            Self::GitHub => "GitHub",
            Self::GitLab => "GitLab",
            Self::Pagure => "Pagure",
        }
    }
}

/// Issue from any provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: IssueState,
    pub author: String,
    pub assignees: Vec<String>,
    pub labels: Vec<String>,
    pub created_at: String,
    pub url: String,
}

/// Pull/Merge Request from any provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: PrState,
    pub author: String,
    pub labels: Vec<String>,
    pub created_at: String,
    pub url: String,
    // Branch material for staging and diffing
    pub source_branch: String,
    pub target_branch: String,
    pub head_sha: String,
    pub base_sha: String,
}

/// Release (or tag, for providers without release objects).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    pub tag: String,
    pub title: String,
    pub body: Option<String>,
    pub created_at: String,
    pub url: String,
}

/// Comment on an issue or PR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub body: String,
    pub created_at: String,
}

/// Issue state (platform-agnostic).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

/// Pull request state (platform-agnostic).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    Open,
    Merged,
    Closed,
}

/// State of either content kind, as carried through a projection.
///
/// Issue posting accepts PR projections when PRs are replayed as issues, so
/// the projected state has to cover both kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    Open,
    Merged,
    Closed,
}

impl ItemState {
    pub fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

impl From<IssueState> for ItemState {
    fn from(state: IssueState) -> Self {
        match state {
            IssueState::Open => Self::Open,
            IssueState::Closed => Self::Closed,
        }
    }
}

impl From<PrState> for ItemState {
    fn from(state: PrState) -> Self {
        match state {
            PrState::Open => Self::Open,
            PrState::Merged => Self::Merged,
            PrState::Closed => Self::Closed,
        }
    }
}
