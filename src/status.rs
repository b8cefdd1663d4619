//! Commit status aggregation
//!
//! Reduces the combined status of every commit in a PR into one
//! [`StatusVerdict`]:
//! - a required context that never reported makes the PR `incomplete`
//! - otherwise any `pending` commit makes it `pending`
//! - otherwise any `error` commit makes it `error`
//! - otherwise any `failure` commit makes it `failure`
//! - otherwise it is `success`

use crate::error::Result;
use crate::platform::PlatformService;
use crate::types::{CommitState, CommitStatusReport, StatusVerdict};
use std::collections::HashSet;
use tracing::{debug, trace};

/// Reduce per-commit reports into a single verdict
pub fn aggregate<S: AsRef<str>>(reports: &[CommitStatusReport], required: &[S]) -> StatusVerdict {
    let mut states = HashSet::new();
    let mut contexts = HashSet::new();
    for report in reports {
        trace!(sha = %report.sha, state = %report.state, "checking commit");
        states.insert(report.state);
        contexts.extend(report.contexts.iter().map(String::as_str));
    }

    if let Some(missing) = required
        .iter()
        .map(AsRef::<str>::as_ref)
        .find(|context| !contexts.contains(context))
    {
        trace!(missing, ?contexts, "required context never reported");
        return StatusVerdict::Incomplete;
    }

    if states.contains(&CommitState::Pending) {
        StatusVerdict::Pending
    } else if states.contains(&CommitState::Error) {
        StatusVerdict::Error
    } else if states.contains(&CommitState::Failure) {
        StatusVerdict::Failure
    } else {
        StatusVerdict::Success
    }
}

/// Fetch the combined status of every commit in a PR
pub async fn fetch_commit_statuses(
    platform: &dyn PlatformService,
    pr_number: u64,
) -> Result<Vec<CommitStatusReport>> {
    let commits = platform.list_pr_commits(pr_number).await?;
    let mut reports = Vec::with_capacity(commits.len());
    for commit in &commits {
        reports.push(platform.get_combined_status(&commit.sha).await?);
    }
    Ok(reports)
}

/// Current verdict for a PR against `required` contexts
pub async fn get_status<S: AsRef<str> + Sync>(
    platform: &dyn PlatformService,
    pr_number: u64,
    required: &[S],
) -> Result<StatusVerdict> {
    let reports = fetch_commit_statuses(platform, pr_number).await?;
    let verdict = aggregate(&reports, required);
    debug!(pr_number, commits = reports.len(), %verdict, "computed status");
    Ok(verdict)
}
