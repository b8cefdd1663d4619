//! Shared fixtures for integration tests

#![allow(dead_code)]

mod mock_platform;

pub use mock_platform::*;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use submit_queue::error::{Error, Result};
use submit_queue::platform::PlatformService;
use submit_queue::queue::CandidateAction;
use submit_queue::types::{
    CLA_YES_LABEL, CommitState, CommitStatusReport, IssueEvent, LGTM_LABEL, Mergeability,
    PlatformConfig, PrCommit, PrIssue, PullRequestDetails, RepoPermissions,
};

/// Config for a repository on github.com
pub fn github_config() -> PlatformConfig {
    PlatformConfig {
        owner: "kubernetes".to_string(),
        repo: "kubernetes".to_string(),
        host: None,
    }
}

/// A fresh mock for the default repository
pub fn mock() -> MockPlatformService {
    MockPlatformService::with_config(github_config())
}

/// Timestamp `secs` after the epoch
pub fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

/// The approval and CLA labels every candidate needs
pub fn required_labels() -> Vec<String> {
    vec![LGTM_LABEL.to_string(), CLA_YES_LABEL.to_string()]
}

/// Convert label literals to owned strings
pub fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

/// Issue-listing entry for a PR
pub fn make_issue(number: u64, author: &str, labels: Vec<String>) -> PrIssue {
    PrIssue {
        number,
        author: Some(author.to_string()),
        labels,
        title: format!("PR {number}"),
        is_pull_request: true,
    }
}

/// Full PR details
pub fn make_pr(
    number: u64,
    author: &str,
    labels: Vec<String>,
    mergeable: Mergeability,
) -> PullRequestDetails {
    PullRequestDetails {
        number,
        title: format!("PR {number}"),
        author: Some(author.to_string()),
        labels,
        mergeable,
        head_sha: format!("sha-{number}"),
        html_url: format!("https://github.com/kubernetes/kubernetes/pull/{number}"),
    }
}

/// Commit with a committer date
pub fn commit(sha: &str, at: DateTime<Utc>) -> PrCommit {
    PrCommit {
        sha: sha.to_string(),
        committed_at: Some(at),
    }
}

/// "labeled" event for `label`
pub fn labeled(label: &str, at: DateTime<Utc>) -> IssueEvent {
    IssueEvent {
        event: "labeled".to_string(),
        label: Some(label.to_string()),
        created_at: at,
    }
}

/// "unlabeled" event for `label`
pub fn unlabeled(label: &str, at: DateTime<Utc>) -> IssueEvent {
    IssueEvent {
        event: "unlabeled".to_string(),
        label: Some(label.to_string()),
        created_at: at,
    }
}

/// Combined status for one commit
pub fn status(sha: &str, state: CommitState, contexts: &[&str]) -> CommitStatusReport {
    CommitStatusReport {
        sha: sha.to_string(),
        state,
        contexts: labels(contexts),
    }
}

/// Push access on the repository
pub const fn push_access() -> Option<RepoPermissions> {
    Some(RepoPermissions {
        admin: false,
        push: true,
        pull: true,
    })
}

/// Read-only access on the repository
pub const fn read_access() -> Option<RepoPermissions> {
    Some(RepoPermissions {
        admin: false,
        push: false,
        pull: true,
    })
}

/// Set up a PR that passes every gate
///
/// Commit at t=100, approval at t=200, mergeable, one commit with a
/// successful status reporting `contexts`.
pub fn setup_ready_pr(mock: &MockPlatformService, number: u64, author: &str, contexts: &[&str]) {
    let sha = format!("sha-{number}");
    mock.add_issue(make_issue(number, author, required_labels()));
    mock.push_pr_response(make_pr(
        number,
        author,
        required_labels(),
        Mergeability::Mergeable,
    ));
    mock.set_commits(number, vec![commit(&sha, ts(100))]);
    mock.set_events(number, vec![labeled(LGTM_LABEL, ts(200))]);
    mock.push_status(status(&sha, CommitState::Success, contexts));
}

/// Action that records the PRs it ran on, optionally failing on one
#[derive(Debug, Default)]
pub struct RecordingAction {
    pub acted: Vec<u64>,
    pub fail_on: Option<u64>,
}

impl RecordingAction {
    pub fn failing_on(pr_number: u64) -> Self {
        Self {
            acted: Vec::new(),
            fail_on: Some(pr_number),
        }
    }
}

#[async_trait]
impl CandidateAction for RecordingAction {
    async fn run(
        &mut self,
        _platform: &dyn PlatformService,
        pr: &PullRequestDetails,
        _issue: &PrIssue,
    ) -> Result<()> {
        if self.fail_on == Some(pr.number) {
            return Err(Error::Platform("action exploded".to_string()));
        }
        self.acted.push(pr.number);
        Ok(())
    }
}
