//! End-to-end transfer scenarios over in-memory adapters.
//!
//! The recording target captures every post in order, which is what most of
//! the interesting guarantees are about: ascending id replay, gap-filling,
//! and release ordering. The staging scenarios run against a throwaway bare
//! repository on disk.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::Command;

use forgeferry::config::EndpointSection;
use forgeferry::error::{Error, Result};
use forgeferry::forge::pagure::PagureProject;
use forgeferry::forge::{
    Comment, Issue, IssueState, PrState, ProjectReader, ProjectWriter, Provider, PullRequest,
    Release,
};
use forgeferry::projection::{Field, FieldMap, FieldMapExt};
use forgeferry::{Config, Transfer};

// ============================================================================
// Fakes
// ============================================================================

struct FakeSource {
    issues: BTreeMap<u64, Issue>,
    prs: BTreeMap<u64, PullRequest>,
    releases: Vec<Release>,
}

impl FakeSource {
    fn new() -> Self {
        Self {
            issues: BTreeMap::new(),
            prs: BTreeMap::new(),
            releases: Vec::new(),
        }
    }

    fn with_issue(mut self, number: u64) -> Self {
        self.issues.insert(
            number,
            Issue {
                number,
                title: format!("issue {number}"),
                body: Some("body".into()),
                state: IssueState::Closed,
                author: "alice".into(),
                assignees: Vec::new(),
                labels: Vec::new(),
                created_at: "2021-01-01T00:00:00Z".into(),
                url: format!("https://src.example/issue/{number}"),
            },
        );
        self
    }

    fn with_pr(mut self, number: u64, head_sha: &str, base_sha: &str) -> Self {
        self.prs.insert(
            number,
            PullRequest {
                number,
                title: format!("pr {number}"),
                body: Some("change".into()),
                state: PrState::Merged,
                author: "bob".into(),
                labels: Vec::new(),
                created_at: "2021-02-01T00:00:00Z".into(),
                url: format!("https://src.example/pr/{number}"),
                source_branch: "feature".into(),
                target_branch: "main".into(),
                head_sha: head_sha.into(),
                base_sha: base_sha.into(),
            },
        );
        self
    }

    fn with_release(mut self, tag: &str) -> Self {
        self.releases.push(Release {
            tag: tag.into(),
            title: tag.into(),
            body: None,
            created_at: "2021-03-01T00:00:00Z".into(),
            url: String::new(),
        });
        self
    }
}

impl ProjectReader for FakeSource {
    fn provider(&self) -> Provider {
        Provider::Pagure
    }
    fn project_url(&self) -> String {
        "https://src.example/widget".into()
    }
    fn list_issues(&self) -> Result<BTreeMap<u64, Issue>> {
        Ok(self.issues.clone())
    }
    fn list_pull_requests(&self) -> Result<BTreeMap<u64, PullRequest>> {
        Ok(self.prs.clone())
    }
    fn list_releases(&self) -> Result<Vec<Release>> {
        Ok(self.releases.clone())
    }
    fn list_issue_comments(&self, _number: u64) -> Result<Vec<Comment>> {
        Ok(Vec::new())
    }
    fn list_pr_comments(&self, _number: u64) -> Result<Vec<Comment>> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Posted {
    Issue { id: u64 },
    PullRequest { id: u64 },
    Release { tag: String },
    Placeholder { title: String },
}

#[derive(Default)]
struct RecordingTarget {
    posts: RefCell<Vec<Posted>>,
    fail_pull_requests: bool,
}

impl RecordingTarget {
    fn posts(&self) -> Vec<Posted> {
        self.posts.borrow().clone()
    }
}

impl ProjectWriter for RecordingTarget {
    fn provider(&self) -> Provider {
        Provider::GitHub
    }

    fn post_issue(&self, fields: &FieldMap, _shorten: bool) -> Result<()> {
        let id = fields.id().expect("projected issues carry their id");
        self.posts.borrow_mut().push(Posted::Issue { id });
        Ok(())
    }

    fn post_pull_request(&self, fields: &FieldMap) -> Result<()> {
        if self.fail_pull_requests {
            return Err(Error::api("GitHub", "boom"));
        }
        let id = fields.id().expect("projected PRs carry their id");
        self.posts.borrow_mut().push(Posted::PullRequest { id });
        Ok(())
    }

    fn post_release(&self, fields: &FieldMap) -> Result<()> {
        let tag = fields
            .text(Field::Tag)
            .expect("projected releases carry their tag")
            .to_string();
        self.posts.borrow_mut().push(Posted::Release { tag });
        Ok(())
    }

    fn post_placeholder(&self, title: &str, _body: &str) -> Result<()> {
        self.posts.borrow_mut().push(Posted::Placeholder {
            title: title.to_string(),
        });
        Ok(())
    }
}

/// Base config for the scenarios; `extra` lands before the sections, so it
/// can only override top-level settings.
fn test_config(extra: &str) -> Config {
    Config::from_toml(&format!(
        r#"
make_diffs = false
post_migration_note = false
{extra}

[source]
provider = "pagure"
namespace = "fedora"
repo = "widget"

[target]
provider = "github"
namespace = "org"
repo = "widget"

[pr]
post_comments = false
"#
    ))
    .expect("test config is valid")
}

/// Config with diff capture wired to a local bare remote.
fn staging_config(remote: &Path, diff_dir: &Path) -> Config {
    let mut config = test_config("");
    config.make_diffs = true;
    config.diff_dir = diff_dir.display().to_string();
    config.pr.post_comments = true;
    config.pr.ssh_url = remote.display().to_string();
    config
}

// ============================================================================
// Id-walk scenarios
// ============================================================================

#[test]
fn items_replay_in_ascending_id_order() {
    let source = FakeSource::new().with_issue(1).with_issue(2).with_pr(3, "h", "b");
    let target = RecordingTarget::default();
    let config = test_config("");

    let stats = Transfer::new(&source, &target, &config).run().unwrap();

    assert_eq!(
        target.posts(),
        vec![
            Posted::Issue { id: 1 },
            Posted::Issue { id: 2 },
            Posted::PullRequest { id: 3 },
        ]
    );
    assert_eq!(stats.issues, 2);
    assert_eq!(stats.pull_requests, 1);
    assert_eq!(stats.placeholders, 0);
}

#[test]
fn gaps_are_filled_with_exactly_gap_length_placeholders() {
    // ids 1-4 empty, issue at 5
    let source = FakeSource::new().with_issue(5);
    let target = RecordingTarget::default();
    let config = test_config("");

    let stats = Transfer::new(&source, &target, &config).run().unwrap();

    let posts = target.posts();
    assert_eq!(posts.len(), 5);
    assert!(posts[..4]
        .iter()
        .all(|p| matches!(p, Posted::Placeholder { .. })));
    assert_eq!(posts[4], Posted::Issue { id: 5 });
    assert_eq!(stats.placeholders, 4);
}

#[test]
fn posted_ids_have_no_gaps_when_matching_is_enabled() {
    let source = FakeSource::new().with_issue(2).with_pr(5, "h", "b").with_issue(9);
    let target = RecordingTarget::default();
    let config = test_config("");

    Transfer::new(&source, &target, &config).run().unwrap();

    // every id from 1 to 9 is consumed by exactly one post
    assert_eq!(target.posts().len(), 9);
    assert_eq!(
        target
            .posts()
            .iter()
            .filter(|p| matches!(p, Posted::Placeholder { .. }))
            .count(),
        6
    );
}

#[test]
fn disabled_matching_skips_empty_ids_silently() {
    let source = FakeSource::new().with_issue(2).with_issue(7);
    let target = RecordingTarget::default();
    let config = test_config("match_ids = false");

    let stats = Transfer::new(&source, &target, &config).run().unwrap();

    assert_eq!(
        target.posts(),
        vec![Posted::Issue { id: 2 }, Posted::Issue { id: 7 }]
    );
    assert_eq!(stats.placeholders, 0);
}

#[test]
fn walk_terminates_when_the_offset_skips_items() {
    // ids 1 and 2 sit below the starting offset and are unreachable
    let source = FakeSource::new().with_issue(1).with_issue(2).with_issue(5);
    let target = RecordingTarget::default();
    let config = test_config("skip_first_ids = 2");

    let stats = Transfer::new(&source, &target, &config).run().unwrap();

    let posts = target.posts();
    assert_eq!(*posts.last().unwrap(), Posted::Issue { id: 5 });
    assert_eq!(stats.issues, 1);
    assert_eq!(stats.placeholders, 2); // ids 3 and 4
}

#[test]
fn releases_post_in_ascending_tag_order() {
    let source = FakeSource::new()
        .with_release("v2")
        .with_release("v10")
        .with_release("v1");
    let target = RecordingTarget::default();
    let config = test_config("transfer_releases = true");

    let stats = Transfer::new(&source, &target, &config).run().unwrap();

    // lexicographic, so v10 sorts before v2
    assert_eq!(
        target.posts(),
        vec![
            Posted::Release { tag: "v1".into() },
            Posted::Release { tag: "v10".into() },
            Posted::Release { tag: "v2".into() },
        ]
    );
    assert_eq!(stats.releases, 3);
}

#[test]
fn migration_note_is_the_last_post() {
    let source = FakeSource::new().with_issue(1);
    let target = RecordingTarget::default();
    let mut config = test_config("");
    config.post_migration_note = true;

    Transfer::new(&source, &target, &config).run().unwrap();

    let posts = target.posts();
    assert_eq!(posts.len(), 2);
    assert!(matches!(
        &posts[1],
        Posted::Placeholder { title } if title.contains("migration")
    ));
}

#[test]
fn write_unsupported_target_fails_before_posting_anything() {
    let source = FakeSource::new().with_issue(1);
    let config = test_config("");
    let endpoint = EndpointSection {
        provider: Provider::Pagure,
        namespace: "fedora".into(),
        repo: "widget".into(),
        token: String::new(),
        api_url: String::new(),
    };
    let target = PagureProject::new(&endpoint, &config).unwrap();

    let err = Transfer::new(&source, &target, &config).run().unwrap_err();
    assert!(matches!(err, Error::Unsupported("Pagure")));
}

// ============================================================================
// Staging scenarios (throwaway git repositories)
// ============================================================================

fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git runs");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn git_stdout(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git runs");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Bare remote plus two commits; returns (base_sha, head_sha).
fn seeded_remote(remote: &Path, work: &Path) -> (String, String) {
    git(remote, &["init", "--bare", "."]);
    git(remote, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(work, &["init"]);
    fs::write(work.join("file.txt"), "one\n").unwrap();
    git(work, &["add", "."]);
    git(
        work,
        &["-c", "user.name=t", "-c", "user.email=t@t", "commit", "-m", "first"],
    );
    let base = git_stdout(work, &["rev-parse", "HEAD"]);
    fs::write(work.join("file.txt"), "one\ntwo\n").unwrap();
    git(work, &["add", "."]);
    git(
        work,
        &["-c", "user.name=t", "-c", "user.email=t@t", "commit", "-m", "second"],
    );
    let head = git_stdout(work, &["rev-parse", "HEAD"]);
    git(work, &["remote", "add", "origin", remote.to_str().unwrap()]);
    git(work, &["push", "origin", "HEAD:refs/heads/main"]);
    (base, head)
}

fn staged_refs(remote: &Path) -> String {
    git_stdout(remote, &["for-each-ref", "refs/heads/forgeferry"])
}

#[test]
fn pr_transfer_stages_diffs_and_tears_branches_down() {
    let remote = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let (base, head) = seeded_remote(remote.path(), work.path());
    let diff_dir = tempfile::tempdir().unwrap();

    let source = FakeSource::new().with_pr(1, &head, &base);
    let target = RecordingTarget::default();
    let config = staging_config(remote.path(), diff_dir.path());

    let stats = Transfer::new(&source, &target, &config).run().unwrap();

    assert_eq!(stats.pull_requests, 1);
    assert_eq!(target.posts(), vec![Posted::PullRequest { id: 1 }]);

    // diff captured as {id}.patch
    let patch = fs::read_to_string(diff_dir.path().join("1.patch")).unwrap();
    assert!(patch.contains("+two"));

    // staged branches were deleted from the remote again
    assert_eq!(staged_refs(remote.path()), "");
}

#[test]
fn teardown_runs_even_when_posting_aborts() {
    let remote = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let (base, head) = seeded_remote(remote.path(), work.path());
    let diff_dir = tempfile::tempdir().unwrap();

    let source = FakeSource::new().with_pr(1, &head, &base);
    let target = RecordingTarget {
        fail_pull_requests: true,
        ..RecordingTarget::default()
    };
    let config = staging_config(remote.path(), diff_dir.path());

    let err = Transfer::new(&source, &target, &config).run().unwrap_err();
    assert!(matches!(err, Error::RemoteApi { .. }));

    // the walk failed, but no staged branches leaked
    assert_eq!(staged_refs(remote.path()), "");
}
