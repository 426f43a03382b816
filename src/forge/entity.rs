//! Configuration-gated snapshot views over source artifacts.
//!
//! A snapshot exposes the raw item's fields through accessors that honor the
//! privacy knobs in configuration: a disabled field reads as `None` ("not
//! tracked"), never as an empty stand-in that could pass for real data.
//! Comments are the one field behind a network call; they are fetched at most
//! once per snapshot, and a fetch that returns nothing is remembered too.

use std::cell::OnceCell;

use crate::config::Config;
use crate::error::Result;
use crate::forge::{Comment, Issue, ProjectReader, PullRequest, Release};
use crate::projection::{Field, FieldMap, FieldValue};

/// Issue snapshot with memoized comments.
pub struct SourceIssue {
    raw: Issue,
    comments: OnceCell<Vec<Comment>>,
}

impl SourceIssue {
    pub fn new(raw: Issue) -> Self {
        Self {
            raw,
            comments: OnceCell::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.raw.number
    }

    pub fn created(&self, config: &Config) -> Option<&str> {
        config
            .preserve_datetime
            .then_some(self.raw.created_at.as_str())
    }

    pub fn url(&self, config: &Config) -> Option<&str> {
        config.track_urls.then_some(self.raw.url.as_str())
    }

    pub fn labels(&self, config: &Config) -> Option<&[String]> {
        config.issue.labels.then_some(self.raw.labels.as_slice())
    }

    pub fn assignees(&self, config: &Config) -> Option<&[String]> {
        config
            .issue
            .assignees
            .then_some(self.raw.assignees.as_slice())
    }

    /// Comments in creation order, fetched once.
    pub fn comments(&self, reader: &dyn ProjectReader) -> Result<&[Comment]> {
        if let Some(cached) = self.comments.get() {
            return Ok(cached);
        }
        let mut fetched = reader.list_issue_comments(self.raw.number)?;
        fetched.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(self.comments.get_or_init(|| fetched))
    }

    /// All populated fields, ready for projection.
    pub fn field_map(&self, config: &Config, reader: &dyn ProjectReader) -> Result<FieldMap> {
        let mut map = FieldMap::new();
        map.insert(Field::Id, FieldValue::Id(self.raw.number));
        map.insert(Field::Title, FieldValue::Text(self.raw.title.clone()));
        map.insert(
            Field::Description,
            FieldValue::Text(self.raw.body.clone().unwrap_or_default()),
        );
        map.insert(
            Field::Author,
            FieldValue::Text(config.mapped_user(&self.raw.author).to_string()),
        );
        map.insert(Field::Status, FieldValue::Status(self.raw.state.into()));
        if let Some(created) = self.created(config) {
            map.insert(Field::Created, FieldValue::Text(created.to_string()));
        }
        if let Some(url) = self.url(config) {
            map.insert(Field::Url, FieldValue::Text(url.to_string()));
        }
        if let Some(labels) = self.labels(config) {
            map.insert(Field::Labels, FieldValue::TextList(labels.to_vec()));
        }
        if let Some(assignees) = self.assignees(config) {
            map.insert(Field::Assignees, FieldValue::TextList(assignees.to_vec()));
        }
        map.insert(
            Field::Comments,
            FieldValue::Comments(self.comments(reader)?.to_vec()),
        );
        Ok(map)
    }
}

/// Pull request snapshot with memoized comments.
pub struct SourcePullRequest {
    raw: PullRequest,
    comments: OnceCell<Vec<Comment>>,
}

impl SourcePullRequest {
    pub fn new(raw: PullRequest) -> Self {
        Self {
            raw,
            comments: OnceCell::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.raw.number
    }

    /// Head commit, needed for branch staging regardless of field gating.
    pub fn head_sha(&self) -> &str {
        &self.raw.head_sha
    }

    /// Base commit, needed for branch staging regardless of field gating.
    pub fn base_sha(&self) -> &str {
        &self.raw.base_sha
    }

    pub fn created(&self, config: &Config) -> Option<&str> {
        config
            .preserve_datetime
            .then_some(self.raw.created_at.as_str())
    }

    pub fn url(&self, config: &Config) -> Option<&str> {
        config.track_urls.then_some(self.raw.url.as_str())
    }

    pub fn labels(&self, config: &Config) -> Option<&[String]> {
        config.pr.labels.then_some(self.raw.labels.as_slice())
    }

    pub fn source_branch(&self, config: &Config) -> Option<&str> {
        config
            .pr
            .track_branches
            .then_some(self.raw.source_branch.as_str())
    }

    pub fn target_branch(&self, config: &Config) -> Option<&str> {
        config
            .pr
            .track_branches
            .then_some(self.raw.target_branch.as_str())
    }

    /// Comments in creation order, fetched once.
    pub fn comments(&self, reader: &dyn ProjectReader) -> Result<&[Comment]> {
        if let Some(cached) = self.comments.get() {
            return Ok(cached);
        }
        let mut fetched = reader.list_pr_comments(self.raw.number)?;
        fetched.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(self.comments.get_or_init(|| fetched))
    }

    /// All populated fields, ready for projection.
    pub fn field_map(&self, config: &Config, reader: &dyn ProjectReader) -> Result<FieldMap> {
        let mut map = FieldMap::new();
        map.insert(Field::Id, FieldValue::Id(self.raw.number));
        map.insert(Field::Title, FieldValue::Text(self.raw.title.clone()));
        map.insert(
            Field::Description,
            FieldValue::Text(self.raw.body.clone().unwrap_or_default()),
        );
        map.insert(
            Field::Author,
            FieldValue::Text(config.mapped_user(&self.raw.author).to_string()),
        );
        map.insert(Field::Status, FieldValue::Status(self.raw.state.into()));
        if let Some(created) = self.created(config) {
            map.insert(Field::Created, FieldValue::Text(created.to_string()));
        }
        if let Some(url) = self.url(config) {
            map.insert(Field::Url, FieldValue::Text(url.to_string()));
        }
        if let Some(labels) = self.labels(config) {
            map.insert(Field::Labels, FieldValue::TextList(labels.to_vec()));
        }
        if let Some(branch) = self.source_branch(config) {
            map.insert(Field::SourceBranch, FieldValue::Text(branch.to_string()));
        }
        if let Some(branch) = self.target_branch(config) {
            map.insert(Field::TargetBranch, FieldValue::Text(branch.to_string()));
        }
        map.insert(
            Field::Comments,
            FieldValue::Comments(self.comments(reader)?.to_vec()),
        );
        Ok(map)
    }
}

/// Release snapshot. Releases have no comments.
pub struct SourceRelease {
    raw: Release,
}

impl SourceRelease {
    pub fn new(raw: Release) -> Self {
        Self { raw }
    }

    pub fn tag(&self) -> &str {
        &self.raw.tag
    }

    pub fn field_map(&self, config: &Config) -> FieldMap {
        let mut map = FieldMap::new();
        map.insert(Field::Tag, FieldValue::Text(self.raw.tag.clone()));
        map.insert(Field::Title, FieldValue::Text(self.raw.title.clone()));
        map.insert(
            Field::Description,
            FieldValue::Text(self.raw.body.clone().unwrap_or_default()),
        );
        if config.preserve_datetime {
            map.insert(
                Field::Created,
                FieldValue::Text(self.raw.created_at.clone()),
            );
        }
        if config.track_urls {
            map.insert(Field::Url, FieldValue::Text(self.raw.url.clone()));
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::BTreeMap;

    use super::*;
    use crate::forge::{IssueState, Provider};

    fn test_config() -> Config {
        Config::from_toml(
            r#"
make_diffs = false

[source]
provider = "github"
namespace = "a"
repo = "b"

[target]
provider = "gitlab"
namespace = "c"
repo = "d"

[pr]
post_comments = false
"#,
        )
        .unwrap()
    }

    fn test_issue() -> Issue {
        Issue {
            number: 3,
            title: "broken build".into(),
            body: Some("it fails".into()),
            state: IssueState::Closed,
            author: "alice".into(),
            assignees: vec!["bob".into()],
            labels: vec!["ci".into()],
            created_at: "2022-05-01T12:00:00Z".into(),
            url: "https://example.org/issue/3".into(),
        }
    }

    /// Reader that counts comment fetches.
    struct CountingReader {
        calls: Cell<usize>,
        comments: Vec<Comment>,
    }

    impl ProjectReader for CountingReader {
        fn provider(&self) -> Provider {
            Provider::GitHub
        }
        fn project_url(&self) -> String {
            "https://example.org".into()
        }
        fn list_issues(&self) -> Result<BTreeMap<u64, Issue>> {
            Ok(BTreeMap::new())
        }
        fn list_pull_requests(&self) -> Result<BTreeMap<u64, PullRequest>> {
            Ok(BTreeMap::new())
        }
        fn list_releases(&self) -> Result<Vec<Release>> {
            Ok(Vec::new())
        }
        fn list_issue_comments(&self, _number: u64) -> Result<Vec<Comment>> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.comments.clone())
        }
        fn list_pr_comments(&self, _number: u64) -> Result<Vec<Comment>> {
            self.list_issue_comments(0)
        }
    }

    #[test]
    fn comments_are_fetched_once_and_sorted() {
        let reader = CountingReader {
            calls: Cell::new(0),
            comments: vec![
                Comment {
                    author: "y".into(),
                    body: "second".into(),
                    created_at: "2022-02-01T00:00:00Z".into(),
                },
                Comment {
                    author: "x".into(),
                    body: "first".into(),
                    created_at: "2022-01-01T00:00:00Z".into(),
                },
            ],
        };
        let issue = SourceIssue::new(test_issue());

        let first = issue.comments(&reader).unwrap();
        assert_eq!(first[0].body, "first");
        assert_eq!(first[1].body, "second");

        issue.comments(&reader).unwrap();
        issue.comments(&reader).unwrap();
        assert_eq!(reader.calls.get(), 1);
    }

    #[test]
    fn empty_comment_list_is_not_refetched() {
        let reader = CountingReader {
            calls: Cell::new(0),
            comments: Vec::new(),
        };
        let issue = SourceIssue::new(test_issue());

        assert!(issue.comments(&reader).unwrap().is_empty());
        assert!(issue.comments(&reader).unwrap().is_empty());
        assert_eq!(reader.calls.get(), 1);
    }

    #[test]
    fn disabled_flags_hide_fields() {
        let mut config = test_config();
        config.preserve_datetime = false;
        config.track_urls = false;
        config.issue.labels = false;

        let issue = SourceIssue::new(test_issue());
        assert_eq!(issue.created(&config), None);
        assert_eq!(issue.url(&config), None);
        assert_eq!(issue.labels(&config), None);
        // assignees still enabled
        assert_eq!(issue.assignees(&config), Some(&["bob".to_string()][..]));

        let reader = CountingReader {
            calls: Cell::new(0),
            comments: Vec::new(),
        };
        let map = issue.field_map(&config, &reader).unwrap();
        assert!(!map.contains_key(&Field::Created));
        assert!(!map.contains_key(&Field::Url));
        assert!(!map.contains_key(&Field::Labels));
        assert!(map.contains_key(&Field::Assignees));
    }

    #[test]
    fn author_is_run_through_the_user_map() {
        let mut config = test_config();
        config
            .user_map
            .insert("alice".to_string(), "alice-target".to_string());

        let reader = CountingReader {
            calls: Cell::new(0),
            comments: Vec::new(),
        };
        let map = SourceIssue::new(test_issue())
            .field_map(&config, &reader)
            .unwrap();
        assert_eq!(
            map.get(&Field::Author),
            Some(&FieldValue::Text("alice-target".into()))
        );
    }
}
