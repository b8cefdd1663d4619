//! Mock platform service for testing
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use submit_queue::error::{Error, Result};
use submit_queue::platform::PlatformService;
use submit_queue::types::{
    CommitStatusReport, IssueEvent, MergeMethod, MergeResult, Page, PlatformConfig, PrCommit,
    PrIssue, PullRequestDetails, RepoPermissions, Team,
};

/// Call record for `add_labels` / `remove_label`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCall {
    pub pr_number: u64,
    pub label: String,
}

/// Call record for `create_comment`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCommentCall {
    pub pr_number: u64,
    pub body: String,
}

/// Call record for `merge_pr`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePrCall {
    pub pr_number: u64,
    pub method: MergeMethod,
}

/// Simple mock platform service for testing
///
/// This manually implements `PlatformService` rather than using mockall,
/// because mockall has issues with methods returning references.
///
/// Features:
/// - Listings paginated with a configurable page size
/// - Response sequences for `get_pr` and `get_combined_status`: each call
///   pops the next response until one remains, which then repeats
/// - Call tracking for verification
/// - Error injection for failure path testing
pub struct MockPlatformService {
    config: PlatformConfig,
    page_size: usize,
    issues: Mutex<Vec<PrIssue>>,
    pr_responses: Mutex<HashMap<u64, VecDeque<PullRequestDetails>>>,
    commit_responses: Mutex<HashMap<u64, Vec<PrCommit>>>,
    status_responses: Mutex<HashMap<String, VecDeque<CommitStatusReport>>>,
    event_responses: Mutex<HashMap<u64, Vec<IssueEvent>>>,
    teams: Mutex<Vec<(Team, Option<RepoPermissions>)>>,
    team_members: Mutex<HashMap<u64, Vec<String>>>,
    merge_responses: Mutex<HashMap<u64, MergeResult>>,
    // Call tracking
    get_pr_calls: Mutex<Vec<u64>>,
    status_calls: Mutex<Vec<String>>,
    list_issue_pages: Mutex<Vec<u32>>,
    list_team_pages: Mutex<Vec<u32>>,
    add_label_calls: Mutex<Vec<LabelCall>>,
    remove_label_calls: Mutex<Vec<LabelCall>>,
    create_comment_calls: Mutex<Vec<CreateCommentCall>>,
    merge_pr_calls: Mutex<Vec<MergePrCall>>,
    // Error injection
    error_on_list_issues: Mutex<Option<String>>,
    error_on_teams: Mutex<Option<String>>,
    error_on_permissions: Mutex<HashSet<u64>>,
    error_on_members: Mutex<HashSet<u64>>,
    error_on_get_pr: Mutex<HashSet<u64>>,
    error_on_commits: Mutex<HashSet<u64>>,
    error_on_events: Mutex<HashSet<u64>>,
    error_on_mutations: Mutex<Option<String>>,
}

impl MockPlatformService {
    /// Create a new mock with the given config
    pub fn with_config(config: PlatformConfig) -> Self {
        Self {
            config,
            page_size: 100,
            issues: Mutex::new(Vec::new()),
            pr_responses: Mutex::new(HashMap::new()),
            commit_responses: Mutex::new(HashMap::new()),
            status_responses: Mutex::new(HashMap::new()),
            event_responses: Mutex::new(HashMap::new()),
            teams: Mutex::new(Vec::new()),
            team_members: Mutex::new(HashMap::new()),
            merge_responses: Mutex::new(HashMap::new()),
            get_pr_calls: Mutex::new(Vec::new()),
            status_calls: Mutex::new(Vec::new()),
            list_issue_pages: Mutex::new(Vec::new()),
            list_team_pages: Mutex::new(Vec::new()),
            add_label_calls: Mutex::new(Vec::new()),
            remove_label_calls: Mutex::new(Vec::new()),
            create_comment_calls: Mutex::new(Vec::new()),
            merge_pr_calls: Mutex::new(Vec::new()),
            error_on_list_issues: Mutex::new(None),
            error_on_teams: Mutex::new(None),
            error_on_permissions: Mutex::new(HashSet::new()),
            error_on_members: Mutex::new(HashSet::new()),
            error_on_get_pr: Mutex::new(HashSet::new()),
            error_on_commits: Mutex::new(HashSet::new()),
            error_on_events: Mutex::new(HashSet::new()),
            error_on_mutations: Mutex::new(None),
        }
    }

    /// Set the page size used by every listing
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    // === Error injection methods ===

    /// Make `list_open_pr_issues` return an error
    pub fn fail_list_issues(&self, msg: &str) {
        *self.error_on_list_issues.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `list_org_teams` return an error
    pub fn fail_teams(&self, msg: &str) {
        *self.error_on_teams.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `team_repo_permissions` fail for one team
    pub fn fail_permissions(&self, team_id: u64) {
        self.error_on_permissions.lock().unwrap().insert(team_id);
    }

    /// Make `list_team_members` fail for one team
    pub fn fail_members(&self, team_id: u64) {
        self.error_on_members.lock().unwrap().insert(team_id);
    }

    /// Make `get_pr` fail for one PR
    pub fn fail_get_pr(&self, pr_number: u64) {
        self.error_on_get_pr.lock().unwrap().insert(pr_number);
    }

    /// Make `list_pr_commits` fail for one PR
    pub fn fail_commits(&self, pr_number: u64) {
        self.error_on_commits.lock().unwrap().insert(pr_number);
    }

    /// Make `list_issue_events` fail for one PR
    pub fn fail_events(&self, pr_number: u64) {
        self.error_on_events.lock().unwrap().insert(pr_number);
    }

    /// Make every label and comment mutation return an error
    pub fn fail_mutations(&self, msg: &str) {
        *self.error_on_mutations.lock().unwrap() = Some(msg.to_string());
    }

    // === Response setup ===

    /// Add an issue to the open listing
    pub fn add_issue(&self, issue: PrIssue) {
        self.issues.lock().unwrap().push(issue);
    }

    /// Queue a `get_pr` response for a PR
    pub fn push_pr_response(&self, details: PullRequestDetails) {
        self.pr_responses
            .lock()
            .unwrap()
            .entry(details.number)
            .or_default()
            .push_back(details);
    }

    /// Set the commits of a PR
    pub fn set_commits(&self, pr_number: u64, commits: Vec<PrCommit>) {
        self.commit_responses
            .lock()
            .unwrap()
            .insert(pr_number, commits);
    }

    /// Queue a combined status response for a commit
    pub fn push_status(&self, report: CommitStatusReport) {
        self.status_responses
            .lock()
            .unwrap()
            .entry(report.sha.clone())
            .or_default()
            .push_back(report);
    }

    /// Set the issue events of a PR
    pub fn set_events(&self, pr_number: u64, events: Vec<IssueEvent>) {
        self.event_responses
            .lock()
            .unwrap()
            .insert(pr_number, events);
    }

    /// Add an organization team with its repository permissions and members
    pub fn add_team(&self, id: u64, slug: &str, permissions: Option<RepoPermissions>, members: &[&str]) {
        self.teams.lock().unwrap().push((
            Team {
                id,
                slug: slug.to_string(),
            },
            permissions,
        ));
        self.team_members
            .lock()
            .unwrap()
            .insert(id, members.iter().map(ToString::to_string).collect());
    }

    /// Set the response for `merge_pr` for a specific PR
    pub fn set_merge_response(&self, pr_number: u64, result: MergeResult) {
        self.merge_responses
            .lock()
            .unwrap()
            .insert(pr_number, result);
    }

    // === Call verification methods ===

    /// Get all `get_pr` calls
    pub fn get_pr_calls(&self) -> Vec<u64> {
        self.get_pr_calls.lock().unwrap().clone()
    }

    /// Get all SHAs `get_combined_status` was called with
    pub fn get_status_calls(&self) -> Vec<String> {
        self.status_calls.lock().unwrap().clone()
    }

    /// Get all pages `list_open_pr_issues` was called with
    pub fn get_list_issue_pages(&self) -> Vec<u32> {
        self.list_issue_pages.lock().unwrap().clone()
    }

    /// Get all pages `list_org_teams` was called with
    pub fn get_list_team_pages(&self) -> Vec<u32> {
        self.list_team_pages.lock().unwrap().clone()
    }

    /// Get all `add_labels` calls, one record per label
    pub fn get_add_label_calls(&self) -> Vec<LabelCall> {
        self.add_label_calls.lock().unwrap().clone()
    }

    /// Get all `remove_label` calls
    pub fn get_remove_label_calls(&self) -> Vec<LabelCall> {
        self.remove_label_calls.lock().unwrap().clone()
    }

    /// Get all `create_comment` calls
    pub fn get_create_comment_calls(&self) -> Vec<CreateCommentCall> {
        self.create_comment_calls.lock().unwrap().clone()
    }

    /// Get all `merge_pr` calls
    pub fn get_merge_pr_calls(&self) -> Vec<MergePrCall> {
        self.merge_pr_calls.lock().unwrap().clone()
    }

    /// Total number of mutating calls made
    pub fn mutation_count(&self) -> usize {
        self.get_add_label_calls().len()
            + self.get_remove_label_calls().len()
            + self.get_create_comment_calls().len()
            + self.get_merge_pr_calls().len()
    }

    /// Assert that no mutating call was made
    pub fn assert_no_mutations(&self) {
        assert_eq!(
            self.mutation_count(),
            0,
            "Expected no mutations but got labels added {:?}, removed {:?}, comments {:?}, merges {:?}",
            self.get_add_label_calls(),
            self.get_remove_label_calls(),
            self.get_create_comment_calls(),
            self.get_merge_pr_calls()
        );
    }

    fn paginate<T: Clone>(&self, items: &[T], page: u32) -> Page<T> {
        let chunks: Vec<&[T]> = items.chunks(self.page_size.max(1)).collect();
        let last_page = u32::try_from(chunks.len()).unwrap();
        let index = usize::try_from(page.saturating_sub(1)).unwrap();
        Page {
            items: chunks.get(index).map(|c| c.to_vec()).unwrap_or_default(),
            last_page,
        }
    }

    fn mutation_error(&self) -> Result<()> {
        match self.error_on_mutations.lock().unwrap().as_ref() {
            Some(msg) => Err(Error::Platform(msg.clone())),
            None => Ok(()),
        }
    }
}

/// Pop the next queued response, repeating the last one forever
fn next_response<K, V>(map: &Mutex<HashMap<K, VecDeque<V>>>, key: &K) -> Option<V>
where
    K: std::hash::Hash + Eq,
    V: Clone,
{
    let mut map = map.lock().unwrap();
    let queue = map.get_mut(key)?;
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    async fn list_open_pr_issues(&self, labels: &[String], page: u32) -> Result<Page<PrIssue>> {
        self.list_issue_pages.lock().unwrap().push(page);
        if let Some(msg) = self.error_on_list_issues.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }
        let matching: Vec<PrIssue> = self
            .issues
            .lock()
            .unwrap()
            .iter()
            .filter(|i| labels.iter().all(|l| i.labels.contains(l)))
            .cloned()
            .collect();
        Ok(self.paginate(&matching, page))
    }

    async fn get_pr(&self, pr_number: u64) -> Result<PullRequestDetails> {
        self.get_pr_calls.lock().unwrap().push(pr_number);
        if self.error_on_get_pr.lock().unwrap().contains(&pr_number) {
            return Err(Error::Platform(format!("get_pr failed for #{pr_number}")));
        }
        next_response(&self.pr_responses, &pr_number)
            .ok_or_else(|| Error::Platform(format!("no PR #{pr_number}")))
    }

    async fn list_pr_commits(&self, pr_number: u64) -> Result<Vec<PrCommit>> {
        if self.error_on_commits.lock().unwrap().contains(&pr_number) {
            return Err(Error::Platform(format!("commits failed for #{pr_number}")));
        }
        Ok(self
            .commit_responses
            .lock()
            .unwrap()
            .get(&pr_number)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_combined_status(&self, sha: &str) -> Result<CommitStatusReport> {
        self.status_calls.lock().unwrap().push(sha.to_string());
        next_response(&self.status_responses, &sha.to_string())
            .ok_or_else(|| Error::Platform(format!("no status for {sha}")))
    }

    async fn list_issue_events(&self, pr_number: u64, page: u32) -> Result<Page<IssueEvent>> {
        if self.error_on_events.lock().unwrap().contains(&pr_number) {
            return Err(Error::Platform(format!("events failed for #{pr_number}")));
        }
        let events = self
            .event_responses
            .lock()
            .unwrap()
            .get(&pr_number)
            .cloned()
            .unwrap_or_default();
        Ok(self.paginate(&events, page))
    }

    async fn list_org_teams(&self, page: u32) -> Result<Page<Team>> {
        self.list_team_pages.lock().unwrap().push(page);
        if let Some(msg) = self.error_on_teams.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }
        let teams: Vec<Team> = self
            .teams
            .lock()
            .unwrap()
            .iter()
            .map(|(t, _)| t.clone())
            .collect();
        Ok(self.paginate(&teams, page))
    }

    async fn team_repo_permissions(&self, team: &Team) -> Result<Option<RepoPermissions>> {
        if self.error_on_permissions.lock().unwrap().contains(&team.id) {
            return Err(Error::Platform(format!("permissions failed for {}", team.slug)));
        }
        Ok(self
            .teams
            .lock()
            .unwrap()
            .iter()
            .find(|(t, _)| t.id == team.id)
            .and_then(|(_, p)| *p))
    }

    async fn list_team_members(&self, team: &Team, page: u32) -> Result<Page<String>> {
        if self.error_on_members.lock().unwrap().contains(&team.id) {
            return Err(Error::Platform(format!("members failed for {}", team.slug)));
        }
        let members = self
            .team_members
            .lock()
            .unwrap()
            .get(&team.id)
            .cloned()
            .unwrap_or_default();
        Ok(self.paginate(&members, page))
    }

    async fn add_labels(&self, pr_number: u64, labels: &[String]) -> Result<()> {
        self.add_label_calls
            .lock()
            .unwrap()
            .extend(labels.iter().map(|label| LabelCall {
                pr_number,
                label: label.clone(),
            }));
        self.mutation_error()
    }

    async fn remove_label(&self, pr_number: u64, label: &str) -> Result<()> {
        self.remove_label_calls.lock().unwrap().push(LabelCall {
            pr_number,
            label: label.to_string(),
        });
        self.mutation_error()
    }

    async fn create_comment(&self, pr_number: u64, body: &str) -> Result<()> {
        self.create_comment_calls
            .lock()
            .unwrap()
            .push(CreateCommentCall {
                pr_number,
                body: body.to_string(),
            });
        self.mutation_error()
    }

    async fn merge_pr(&self, pr_number: u64, method: MergeMethod) -> Result<MergeResult> {
        self.merge_pr_calls
            .lock()
            .unwrap()
            .push(MergePrCall { pr_number, method });
        Ok(self
            .merge_responses
            .lock()
            .unwrap()
            .get(&pr_number)
            .cloned()
            .unwrap_or(MergeResult {
                merged: true,
                sha: Some(format!("merged_sha_{pr_number}")),
                message: None,
            }))
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}
