//! Approval staleness detection
//!
//! An approval is only trusted when the approval label was applied strictly
//! after the PR's most recent commit.

use crate::error::{Error, Result};
use crate::platform::{PlatformService, fetch_all};
use crate::types::{IssueEvent, LGTM_LABEL, PrCommit};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Latest committer date across `commits`
pub fn last_modified(commits: &[PrCommit]) -> Option<DateTime<Utc>> {
    commits.iter().filter_map(|c| c.committed_at).max()
}

/// Timestamp of the most recent "labeled" event for `label`
///
/// Taking the maximum means a removal followed by re-application counts
/// from the re-application.
pub fn latest_label_time(events: &[IssueEvent], label: &str) -> Option<DateTime<Utc>> {
    events
        .iter()
        .filter(|e| e.event == "labeled" && e.label.as_deref() == Some(label))
        .map(|e| e.created_at)
        .max()
}

/// Whether the approval in `events` was given after `last_commit`
///
/// Equal timestamps are not trusted.
pub fn is_approval_current(
    pr_number: u64,
    events: &[IssueEvent],
    last_commit: DateTime<Utc>,
) -> Result<bool> {
    let approved_at = latest_label_time(events, LGTM_LABEL).ok_or_else(|| Error::MissingApproval {
        pr: pr_number,
        label: LGTM_LABEL.to_string(),
    })?;
    debug!(pr_number, %approved_at, %last_commit, "comparing approval to last commit");
    Ok(last_commit < approved_at)
}

/// Fetch commits and events for a PR and check its approval is current
pub async fn check_approval(platform: &dyn PlatformService, pr_number: u64) -> Result<bool> {
    let commits = platform.list_pr_commits(pr_number).await?;
    let last_commit = last_modified(&commits).ok_or(Error::NoCommits(pr_number))?;

    let events = fetch_all(move |page| platform.list_issue_events(pr_number, page)).await?;
    is_approval_current(pr_number, &events, last_commit)
}
