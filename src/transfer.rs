//! The ID-synchronization transfer run.
//!
//! One pass over the shared numeric id space of the source's issues and pull
//! requests, in increasing order. Each occupied id is reproduced on the
//! target; unoccupied ids are consumed by closed placeholder issues when
//! identifier matching is on, so the target's counter stays aligned with the
//! source's. Alignment assumes the target allocates ids sequentially and
//! nothing else writes to it during the run.
//!
//! Branch staging happens once, on the first PR encountered, over every PR
//! from that id onward; the staged branches are deleted after the walk no
//! matter how it ended. Releases go last, in tag order.

use std::collections::BTreeMap;

use crate::config::Config;
use crate::diff::Diff;
use crate::error::{Error, Result};
use crate::forge::entity::{SourceIssue, SourcePullRequest, SourceRelease};
use crate::forge::{ProjectReader, ProjectWriter};
use crate::projection::{
    project, ISSUE_POST_FIELDS, PR_POST_FIELDS, RELEASE_POST_FIELDS,
};
use crate::provenance;
use crate::staging::{BranchStager, StagedPr};

/// What a run posted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransferStats {
    pub issues: usize,
    pub pull_requests: usize,
    pub releases: usize,
    pub placeholders: usize,
}

/// One migration run between two projects.
pub struct Transfer<'a> {
    source: &'a dyn ProjectReader,
    target: &'a dyn ProjectWriter,
    config: &'a Config,
    stager: Option<BranchStager>,
    staged_branches: Vec<String>,
    staging_attempted: bool,
}

impl<'a> Transfer<'a> {
    pub fn new(
        source: &'a dyn ProjectReader,
        target: &'a dyn ProjectWriter,
        config: &'a Config,
    ) -> Self {
        Self {
            source,
            target,
            config,
            stager: None,
            staged_branches: Vec::new(),
            staging_attempted: false,
        }
    }

    /// Run the migration: walk the id space, then releases.
    pub fn run(&mut self) -> Result<TransferStats> {
        let issues: BTreeMap<u64, SourceIssue> = self
            .source
            .list_issues()?
            .into_iter()
            .map(|(id, issue)| (id, SourceIssue::new(issue)))
            .collect();
        let prs: BTreeMap<u64, SourcePullRequest> = self
            .source
            .list_pull_requests()?
            .into_iter()
            .map(|(id, pr)| (id, SourcePullRequest::new(pr)))
            .collect();

        println!(
            "  Transferring {} issues and {} pull requests",
            issues.len(),
            prs.len()
        );

        let mut stats = TransferStats::default();

        // Branch cleanup must happen whether or not the walk survived, and
        // before the error propagates.
        let walk_result = self.walk(&issues, &prs, &mut stats);
        self.teardown_staged();
        walk_result?;

        if self.config.transfer_releases {
            self.transfer_releases(&mut stats)?;
        }

        if self.config.post_migration_note {
            self.target.post_placeholder(
                provenance::MIGRATION_NOTE_TITLE,
                &provenance::migration_note_body(
                    &self.source.project_url(),
                    stats.issues,
                    stats.pull_requests,
                    stats.releases,
                ),
            )?;
        }

        Ok(stats)
    }

    /// Walk the shared id space in increasing order until every source item
    /// has been posted.
    ///
    /// The cursor can outrun the highest occupied id only when ids at or
    /// below the starting offset were skipped; the guard stops the walk
    /// instead of spinning.
    fn walk(
        &mut self,
        issues: &BTreeMap<u64, SourceIssue>,
        prs: &BTreeMap<u64, SourcePullRequest>,
        stats: &mut TransferStats,
    ) -> Result<()> {
        let total = issues.len() + prs.len();
        let Some(max_id) = issues.keys().chain(prs.keys()).max().copied() else {
            return Ok(());
        };

        let mut posted = 0;
        let mut cursor = self.config.skip_first_ids;

        while posted < total {
            cursor += 1;
            if cursor > max_id {
                break;
            }

            if let Some(issue) = issues.get(&cursor) {
                self.transfer_issue(issue)?;
                posted += 1;
                stats.issues += 1;
                continue;
            }

            if let Some(pr) = prs.get(&cursor) {
                if !self.staging_attempted {
                    self.stage_remaining(cursor, prs)?;
                }
                self.transfer_pull_request(cursor, pr)?;
                posted += 1;
                stats.pull_requests += 1;
                continue;
            }

            if self.config.match_ids {
                cursor = self.fill_gap(cursor, issues, prs, stats)?;
            }
        }

        Ok(())
    }

    fn transfer_issue(&self, issue: &SourceIssue) -> Result<()> {
        let fields = issue.field_map(self.config, self.source)?;
        let projected = project(&fields, ISSUE_POST_FIELDS);
        self.target.post_issue(&projected, self.config.issue.shorten)
    }

    fn transfer_pull_request(&mut self, id: u64, pr: &SourcePullRequest) -> Result<()> {
        if let Some(dir) = self.config.diff_storage_dir() {
            let stager = self
                .stager
                .as_mut()
                .ok_or_else(|| Error::Staging("no staging clone for diff generation".into()))?;
            let repo = stager.repo_dir()?.to_path_buf();
            Diff::new(&repo, pr.base_sha(), pr.head_sha()).place_in_directory(dir, id)?;
        }

        let fields = pr.field_map(self.config, self.source)?;
        let projected = project(&fields, PR_POST_FIELDS);
        self.target.post_pull_request(&projected)
    }

    /// Stage branches for every PR from `from` onward, in one batch.
    ///
    /// Skipped entirely when no push URL is configured; configuration
    /// validation guarantees one exists whenever diff capture is on.
    fn stage_remaining(
        &mut self,
        from: u64,
        prs: &BTreeMap<u64, SourcePullRequest>,
    ) -> Result<()> {
        self.staging_attempted = true;
        if self.config.pr.ssh_url.is_empty() {
            return Ok(());
        }

        let remaining: Vec<StagedPr> = prs
            .range(from..)
            .map(|(id, pr)| StagedPr {
                id: *id,
                head_sha: pr.head_sha().to_string(),
                base_sha: pr.base_sha().to_string(),
            })
            .collect();

        let mut stager = BranchStager::new(&self.config.pr.ssh_url)?;
        self.staged_branches = stager.prepare(&remaining)?;
        self.stager = Some(stager);
        Ok(())
    }

    /// Consume unoccupied ids with closed dummy issues until the next
    /// occupied id; leaves the cursor one before it.
    fn fill_gap(
        &self,
        from: u64,
        issues: &BTreeMap<u64, SourceIssue>,
        prs: &BTreeMap<u64, SourcePullRequest>,
        stats: &mut TransferStats,
    ) -> Result<u64> {
        let mut cursor = from;
        while !issues.contains_key(&cursor) && !prs.contains_key(&cursor) {
            self.target.post_placeholder(
                provenance::DUMMY_ISSUE_TITLE,
                provenance::DUMMY_ISSUE_BODY,
            )?;
            stats.placeholders += 1;
            cursor += 1;
        }
        Ok(cursor - 1)
    }

    /// Delete staged branches from the remote. Best effort: a failure is
    /// reported with the branch names and never replaces the walk's outcome.
    fn teardown_staged(&mut self) {
        let branches = std::mem::take(&mut self.staged_branches);
        if branches.is_empty() {
            return;
        }
        let Some(stager) = self.stager.as_mut() else {
            return;
        };
        if let Err(err) = stager.teardown(&branches) {
            eprintln!(
                "  Warning: could not delete staged branches ({err}); \
                 delete manually: {}",
                branches.join(", ")
            );
        }
    }

    /// Post releases in ascending tag order. Ids are not aligned for
    /// releases; the providers do not expose numeric release ids.
    fn transfer_releases(&self, stats: &mut TransferStats) -> Result<()> {
        let mut releases: Vec<SourceRelease> = self
            .source
            .list_releases()?
            .into_iter()
            .map(SourceRelease::new)
            .collect();
        releases.sort_by(|a, b| a.tag().cmp(b.tag()));

        for release in &releases {
            let fields = release.field_map(self.config);
            let projected = project(&fields, RELEASE_POST_FIELDS);
            self.target.post_release(&projected)?;
            stats.releases += 1;
        }

        Ok(())
    }
}
