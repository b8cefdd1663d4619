//! Core types for submit-queue

use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Label that marks a PR as reviewed and approved
pub const LGTM_LABEL: &str = "lgtm";

/// Label that marks the contributor agreement as signed
pub const CLA_YES_LABEL: &str = "cla: yes";

/// Marker label applied when the author needs a manual override
pub const NEEDS_OK_TO_MERGE_LABEL: &str = "needs-ok-to-merge";

/// Labels every candidate must carry
pub const REQUIRED_LABELS: [&str; 2] = [LGTM_LABEL, CLA_YES_LABEL];

/// Check whether `labels` contains `name` (case-sensitive)
pub fn has_label<S: AsRef<str>>(labels: &[S], name: &str) -> bool {
    labels.iter().any(|l| l.as_ref() == name)
}

/// Check whether `labels` contains every one of `names`
pub fn has_labels<S: AsRef<str>>(labels: &[S], names: &[&str]) -> bool {
    names.iter().all(|name| has_label(labels, name))
}

/// Repository coordinates the service operates on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Repository owner (organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Custom host (None for github.com)
    pub host: Option<String>,
}

/// Issue-shaped summary of a pull request, as returned by the label-filtered listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrIssue {
    /// Issue/PR number
    pub number: u64,
    /// Author login, if the platform reported one
    pub author: Option<String>,
    /// Label names in server order
    pub labels: Vec<String>,
    /// Title
    pub title: String,
    /// Whether the issue is actually a pull request
    pub is_pull_request: bool,
}

impl PrIssue {
    /// Check for a label on this issue
    pub fn has_label(&self, name: &str) -> bool {
        has_label(&self.labels, name)
    }
}

/// Tri-state mergeability as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mergeability {
    /// No conflicts with the base branch
    Mergeable,
    /// Conflicts with the base branch
    Conflicting,
    /// The platform hasn't computed it yet
    Unknown,
}

impl From<Option<bool>> for Mergeability {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::Mergeable,
            Some(false) => Self::Conflicting,
            None => Self::Unknown,
        }
    }
}

impl std::fmt::Display for Mergeability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mergeable => write!(f, "mergeable"),
            Self::Conflicting => write!(f, "conflicting"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Freshly fetched pull request details
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullRequestDetails {
    /// PR number
    pub number: u64,
    /// PR title
    pub title: String,
    /// Author login
    pub author: Option<String>,
    /// Current label names
    pub labels: Vec<String>,
    /// Mergeability with the base branch
    pub mergeable: Mergeability,
    /// SHA of the head commit
    pub head_sha: String,
    /// Web URL for the PR
    pub html_url: String,
}

impl PullRequestDetails {
    /// Check for a label on this PR
    pub fn has_label(&self, name: &str) -> bool {
        has_label(&self.labels, name)
    }
}

/// A commit belonging to a pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrCommit {
    /// Commit SHA
    pub sha: String,
    /// Committer timestamp, when reported
    pub committed_at: Option<DateTime<Utc>>,
}

/// Combined state of all checks on one commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitState {
    /// At least one check still running
    Pending,
    /// Every check passed
    Success,
    /// A check errored
    Error,
    /// A check failed
    Failure,
}

impl FromStr for CommitState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            "failure" => Ok(Self::Failure),
            other => Err(Error::UnknownState(other.to_string())),
        }
    }
}

impl std::fmt::Display for CommitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

/// Per-commit aggregation of named status contexts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitStatusReport {
    /// Commit SHA
    pub sha: String,
    /// Combined state for the commit
    pub state: CommitState,
    /// Names of the contexts that reported on this commit
    pub contexts: Vec<String>,
}

/// Single verdict reduced from every commit's status report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusVerdict {
    /// Every commit succeeded and every required context reported
    Success,
    /// Some commit is still running checks
    Pending,
    /// Some commit errored
    Error,
    /// Some commit failed
    Failure,
    /// A required context never reported
    Incomplete,
}

impl std::fmt::Display for StatusVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Pending => write!(f, "pending"),
            Self::Error => write!(f, "error"),
            Self::Failure => write!(f, "failure"),
            Self::Incomplete => write!(f, "incomplete"),
        }
    }
}

/// An entry from a PR's issue timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueEvent {
    /// Event type ("labeled", "unlabeled", ...)
    pub event: String,
    /// Label name for label events
    pub label: Option<String>,
    /// When the event happened
    pub created_at: DateTime<Utc>,
}

/// An organization team
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    /// Numeric team ID
    pub id: u64,
    /// URL slug
    pub slug: String,
}

/// Permissions a team holds on a repository
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct RepoPermissions {
    /// Administer the repository
    pub admin: bool,
    /// Push to the repository
    pub push: bool,
    /// Read the repository
    pub pull: bool,
}

/// One page of a paginated listing
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Number of the last page; 0 when the server reports no further pages
    pub last_page: u32,
}

impl<T> Page<T> {
    /// A single page that is also the last one
    pub const fn single(items: Vec<T>) -> Self {
        Self {
            items,
            last_page: 0,
        }
    }
}

/// Result of a merge operation
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// Whether the merge was successful
    pub merged: bool,
    /// The SHA of the merge commit (if successful)
    pub sha: Option<String>,
    /// Message from the merge operation (especially on failure)
    pub message: Option<String>,
}

/// Merge strategy/method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMethod {
    /// Squash all commits into one
    Squash,
    /// Create a merge commit
    Merge,
    /// Rebase commits onto base branch
    Rebase,
}

impl std::fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Squash => write!(f, "squash"),
            Self::Merge => write!(f, "merge"),
            Self::Rebase => write!(f, "rebase"),
        }
    }
}
