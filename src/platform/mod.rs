//! Platform services for the hosted code-review service
//!
//! Provides the capability surface the queue consumes: paginated listings,
//! PR and status lookups, and the few mutating calls the gates need.

mod github;
pub mod throttle;

pub use github::GitHubService;
pub use throttle::RateLimiter;

use crate::error::Result;
use crate::types::{
    CommitStatusReport, IssueEvent, MergeMethod, MergeResult, Page, PlatformConfig, PrCommit,
    PrIssue, PullRequestDetails, RepoPermissions, Team,
};
use async_trait::async_trait;
use std::future::Future;
use tracing::debug;

/// Page size requested from every paginated listing
pub const PAGE_SIZE: u8 = 100;

/// Platform service trait for PR operations
///
/// Paginated listings take a 1-based page number and return a [`Page`];
/// use [`fetch_all`] to walk every page.
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// List open issues carrying every label in `labels`, restricted to pull requests
    async fn list_open_pr_issues(&self, labels: &[String], page: u32) -> Result<Page<PrIssue>>;

    /// Get full PR details
    async fn get_pr(&self, pr_number: u64) -> Result<PullRequestDetails>;

    /// List the commits of a PR
    async fn list_pr_commits(&self, pr_number: u64) -> Result<Vec<PrCommit>>;

    /// Get the combined status of a commit
    async fn get_combined_status(&self, sha: &str) -> Result<CommitStatusReport>;

    /// List timeline events of a PR's issue
    async fn list_issue_events(&self, pr_number: u64, page: u32) -> Result<Page<IssueEvent>>;

    /// List teams of the repository's organization
    async fn list_org_teams(&self, page: u32) -> Result<Page<Team>>;

    /// Permissions `team` holds on the configured repository
    ///
    /// Returns `None` when the team has no access to the repository.
    async fn team_repo_permissions(&self, team: &Team) -> Result<Option<RepoPermissions>>;

    /// List member logins of a team
    async fn list_team_members(&self, team: &Team, page: u32) -> Result<Page<String>>;

    /// Add labels to a PR
    async fn add_labels(&self, pr_number: u64, labels: &[String]) -> Result<()>;

    /// Remove a label from a PR
    async fn remove_label(&self, pr_number: u64, label: &str) -> Result<()>;

    /// Create a comment on a PR
    async fn create_comment(&self, pr_number: u64, body: &str) -> Result<()>;

    /// Merge a PR with the specified method
    async fn merge_pr(&self, pr_number: u64, method: MergeMethod) -> Result<MergeResult>;

    /// Get the platform configuration
    fn config(&self) -> &PlatformConfig;
}

/// Walk a paginated listing from page 1 until the server reports the last page
///
/// A `last_page` of zero, or one not beyond the current page, ends the walk.
pub async fn fetch_all<T, F, Fut>(mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut page = 1;
    let mut items = Vec::new();
    loop {
        debug!(page, "fetching page");
        let batch = fetch_page(page).await?;
        let last_page = batch.last_page;
        items.extend(batch.items);
        if last_page == 0 || last_page <= page {
            break;
        }
        page += 1;
    }
    Ok(items)
}
