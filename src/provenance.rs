//! Provenance text prepended to everything posted on the target.
//!
//! Every migrated item carries a header recording where it came from, who
//! opened it, and when, so the migration stays auditable on the target side.
//! Fields the configuration chose not to track render as an explicit marker
//! instead of being silently dropped.

use crate::forge::Comment;

/// Marker shown for fields disabled by configuration.
pub const NOT_TRACKED: &str = "(not tracked)";

/// Content kind named inside the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostKind {
    Issue,
    PullRequest,
    Release,
}

impl PostKind {
    fn label(self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::PullRequest => "PR",
            Self::Release => "release",
        }
    }
}

/// Header block for a migrated item.
pub fn header(kind: PostKind, url: Option<&str>, created: Option<&str>, author: &str) -> String {
    format!(
        "Original {what}: {link}\nOpened: {date}\nOpened by: {user}\n --- \n",
        what = kind.label(),
        link = url.unwrap_or(NOT_TRACKED),
        date = created.unwrap_or(NOT_TRACKED),
        user = author,
    )
}

/// Title of the placeholder issue standing in for a still-open PR.
pub fn open_pr_placeholder_title(pr_id: u64) -> String {
    format!("[forgeferry] Filling in a blank issue for an opened PR#{pr_id}")
}

/// Body of the placeholder issue standing in for a still-open PR.
pub fn open_pr_placeholder_body(
    url: Option<&str>,
    created: Option<&str>,
    author: &str,
) -> String {
    format!(
        "{}This PR was filled with blank issue to preserve ID.",
        header(PostKind::PullRequest, url, created, author)
    )
}

/// Title of a gap-fill dummy issue.
pub const DUMMY_ISSUE_TITLE: &str = "[forgeferry] Dummy issue to fill space between IDs";

/// Body of a gap-fill dummy issue.
pub const DUMMY_ISSUE_BODY: &str = "Dummy issue to fill space between IDs.";

/// A replayed comment, attributed to its original author and time.
pub fn render_comment(comment: &Comment) -> String {
    format!(
        "**{}** commented on {}:\n\n{}",
        comment.author, comment.created_at, comment.body
    )
}

/// Title of the closing migration note.
pub const MIGRATION_NOTE_TITLE: &str = "[forgeferry] Repository migration complete";

/// Body of the closing migration note.
pub fn migration_note_body(source_url: &str, issues: usize, prs: usize, releases: usize) -> String {
    format!(
        "This project was migrated from {source_url}.\n\n\
         Transferred: {issues} issues, {prs} pull requests, {releases} releases.",
    )
}
