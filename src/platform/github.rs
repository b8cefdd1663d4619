//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::platform::throttle::RateLimiter;
use crate::platform::{PAGE_SIZE, PlatformService, fetch_all};
use crate::types::{
    CommitStatusReport, IssueEvent, MergeMethod, MergeResult, Page, PlatformConfig, PrCommit,
    PrIssue, PullRequestDetails, RepoPermissions, Team,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use http::StatusCode;
use http::header::{ACCEPT, HeaderMap, HeaderValue};
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Without this media type the team repo check answers 204 with no permissions
const REPOSITORY_MEDIA_TYPE: &str = "application/vnd.github.v3.repository+json";

// Raw REST payloads. Only the fields the queue reads are modelled.

#[derive(Deserialize)]
struct RawUser {
    login: String,
}

#[derive(Deserialize)]
struct RawLabel {
    name: String,
}

#[derive(Deserialize)]
struct RawIssue {
    number: u64,
    #[serde(default)]
    title: String,
    user: Option<RawUser>,
    #[serde(default)]
    labels: Vec<RawLabel>,
    pull_request: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct RawHead {
    sha: String,
}

#[derive(Deserialize)]
struct RawPullRequest {
    number: u64,
    title: Option<String>,
    user: Option<RawUser>,
    #[serde(default)]
    labels: Vec<RawLabel>,
    mergeable: Option<bool>,
    head: RawHead,
    html_url: Option<String>,
}

#[derive(Deserialize)]
struct RawCommitter {
    date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct RawCommitDetail {
    committer: Option<RawCommitter>,
}

#[derive(Deserialize)]
struct RawCommit {
    sha: String,
    commit: RawCommitDetail,
}

#[derive(Deserialize)]
struct RawStatus {
    context: String,
}

#[derive(Deserialize)]
struct RawCombinedStatus {
    sha: String,
    state: String,
    #[serde(default)]
    statuses: Vec<RawStatus>,
}

#[derive(Deserialize)]
struct RawIssueEvent {
    event: String,
    label: Option<RawLabel>,
    created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawTeam {
    id: u64,
    slug: String,
}

#[derive(Deserialize)]
#[allow(clippy::struct_excessive_bools)]
struct RawPermissions {
    #[serde(default)]
    admin: bool,
    #[serde(default)]
    push: bool,
    #[serde(default)]
    pull: bool,
}

#[derive(Deserialize)]
struct RawTeamRepo {
    permissions: Option<RawPermissions>,
}

#[derive(Serialize)]
struct PageParams {
    per_page: u8,
    page: u32,
}

#[derive(Serialize)]
struct IssueListParams<'a> {
    state: &'a str,
    labels: String,
    sort: &'a str,
    per_page: u8,
    page: u32,
}

fn last_page<T>(page: &octocrab::Page<T>) -> u32 {
    page.number_of_pages().unwrap_or(0)
}

fn label_names(labels: Vec<RawLabel>) -> Vec<String> {
    labels.into_iter().map(|l| l.name).collect()
}

impl From<RawIssue> for PrIssue {
    fn from(issue: RawIssue) -> Self {
        Self {
            number: issue.number,
            author: issue.user.map(|u| u.login).filter(|l| !l.is_empty()),
            labels: label_names(issue.labels),
            title: issue.title,
            is_pull_request: issue.pull_request.is_some(),
        }
    }
}

impl From<RawPullRequest> for PullRequestDetails {
    fn from(pr: RawPullRequest) -> Self {
        Self {
            number: pr.number,
            title: pr.title.unwrap_or_default(),
            author: pr.user.map(|u| u.login).filter(|l| !l.is_empty()),
            labels: label_names(pr.labels),
            mergeable: pr.mergeable.into(),
            head_sha: pr.head.sha,
            html_url: pr.html_url.unwrap_or_default(),
        }
    }
}

/// GitHub service using octocrab
///
/// Every outbound request first acquires a token from the shared
/// [`RateLimiter`].
pub struct GitHubService {
    client: Octocrab,
    config: PlatformConfig,
    throttle: Arc<RateLimiter>,
}

impl GitHubService {
    /// Create a new GitHub service
    ///
    /// Without a token the client is anonymous; pair it with a slower throttle.
    pub fn new(
        token: Option<&str>,
        config: PlatformConfig,
        throttle: Arc<RateLimiter>,
    ) -> Result<Self> {
        let mut builder = Octocrab::builder();
        if let Some(token) = token {
            builder = builder.personal_token(token.to_string());
        }

        if let Some(ref h) = config.host {
            let base_url = format!("https://{h}/api/v3");
            builder = builder
                .base_uri(&base_url)
                .map_err(|e| Error::GitHubApi(e.to_string()))?;
        }

        let client = builder
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        Ok(Self {
            client,
            config,
            throttle,
        })
    }

    fn repo_route(&self, rest: &str) -> String {
        format!("/repos/{}/{}{rest}", self.config.owner, self.config.repo)
    }

    async fn get_page<T>(&self, route: &str, page: u32) -> Result<octocrab::Page<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        self.throttle.acquire().await;
        let params = PageParams {
            per_page: PAGE_SIZE,
            page,
        };
        Ok(self.client.get(route, Some(&params)).await?)
    }
}

#[async_trait]
impl PlatformService for GitHubService {
    async fn list_open_pr_issues(&self, labels: &[String], page: u32) -> Result<Page<PrIssue>> {
        debug!(page, ?labels, "listing labelled open issues");
        self.throttle.acquire().await;
        let params = IssueListParams {
            state: "open",
            labels: labels.join(","),
            sort: "created",
            per_page: PAGE_SIZE,
            page,
        };
        let issues: octocrab::Page<RawIssue> = self
            .client
            .get(self.repo_route("/issues"), Some(&params))
            .await?;

        let last_page = last_page(&issues);
        let items = issues
            .items
            .into_iter()
            .filter(|i| i.pull_request.is_some())
            .map(PrIssue::from)
            .collect();
        Ok(Page { items, last_page })
    }

    async fn get_pr(&self, pr_number: u64) -> Result<PullRequestDetails> {
        debug!(pr_number, "getting PR");
        self.throttle.acquire().await;
        let pr: RawPullRequest = self
            .client
            .get(self.repo_route(&format!("/pulls/{pr_number}")), None::<&()>)
            .await?;
        let details = PullRequestDetails::from(pr);
        debug!(pr_number, mergeable = %details.mergeable, "got PR");
        Ok(details)
    }

    async fn list_pr_commits(&self, pr_number: u64) -> Result<Vec<PrCommit>> {
        let route = self.repo_route(&format!("/pulls/{pr_number}/commits"));
        let route = route.as_str();
        let commits = fetch_all(move |page| {
            async move {
                let raw: octocrab::Page<RawCommit> = self.get_page(route, page).await?;
                Ok(Page {
                    last_page: last_page(&raw),
                    items: raw.items,
                })
            }
        })
        .await?;

        debug!(pr_number, count = commits.len(), "listed PR commits");
        Ok(commits
            .into_iter()
            .map(|c| PrCommit {
                sha: c.sha,
                committed_at: c.commit.committer.and_then(|c| c.date),
            })
            .collect())
    }

    async fn get_combined_status(&self, sha: &str) -> Result<CommitStatusReport> {
        self.throttle.acquire().await;
        let params = PageParams {
            per_page: PAGE_SIZE,
            page: 1,
        };
        let status: RawCombinedStatus = self
            .client
            .get(self.repo_route(&format!("/commits/{sha}/status")), Some(&params))
            .await?;

        debug!(sha, state = %status.state, count = status.statuses.len(), "combined status");
        Ok(CommitStatusReport {
            sha: status.sha,
            state: status.state.parse()?,
            contexts: status.statuses.into_iter().map(|s| s.context).collect(),
        })
    }

    async fn list_issue_events(&self, pr_number: u64, page: u32) -> Result<Page<IssueEvent>> {
        let raw: octocrab::Page<RawIssueEvent> = self
            .get_page(&self.repo_route(&format!("/issues/{pr_number}/events")), page)
            .await?;
        let last_page = last_page(&raw);
        let items = raw
            .items
            .into_iter()
            .map(|e| IssueEvent {
                event: e.event,
                label: e.label.map(|l| l.name),
                created_at: e.created_at,
            })
            .collect();
        Ok(Page { items, last_page })
    }

    async fn list_org_teams(&self, page: u32) -> Result<Page<Team>> {
        let raw: octocrab::Page<RawTeam> = self
            .get_page(&format!("/orgs/{}/teams", self.config.owner), page)
            .await?;
        let last_page = last_page(&raw);
        let items = raw
            .items
            .into_iter()
            .map(|t| Team {
                id: t.id,
                slug: t.slug,
            })
            .collect();
        Ok(Page { items, last_page })
    }

    async fn team_repo_permissions(&self, team: &Team) -> Result<Option<RepoPermissions>> {
        let PlatformConfig { owner, repo, .. } = &self.config;
        let route = format!("/orgs/{owner}/teams/{}/repos/{owner}/{repo}", team.slug);
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(REPOSITORY_MEDIA_TYPE));

        self.throttle.acquire().await;
        let response: std::result::Result<RawTeamRepo, octocrab::Error> = self
            .client
            .get_with_headers(&route, None::<&()>, Some(headers))
            .await;

        let permissions = match response {
            Ok(raw) => Some(raw.permissions.map_or_else(RepoPermissions::default, |p| {
                RepoPermissions {
                    admin: p.admin,
                    push: p.push,
                    pull: p.pull,
                }
            })),
            // team has no access to the repository
            Err(octocrab::Error::GitHub { source, .. })
                if source.status_code == StatusCode::NOT_FOUND =>
            {
                None
            }
            Err(e) => return Err(e.into()),
        };
        debug!(team = %team.slug, ?permissions, "team repo permissions");
        Ok(permissions)
    }

    async fn list_team_members(&self, team: &Team, page: u32) -> Result<Page<String>> {
        let raw: octocrab::Page<RawUser> = self
            .get_page(
                &format!("/orgs/{}/teams/{}/members", self.config.owner, team.slug),
                page,
            )
            .await?;
        let last_page = last_page(&raw);
        Ok(Page {
            items: raw.items.into_iter().map(|u| u.login).collect(),
            last_page,
        })
    }

    async fn add_labels(&self, pr_number: u64, labels: &[String]) -> Result<()> {
        debug!(pr_number, ?labels, "adding labels");
        self.throttle.acquire().await;
        self.client
            .issues(&self.config.owner, &self.config.repo)
            .add_labels(pr_number, labels)
            .await?;
        Ok(())
    }

    async fn remove_label(&self, pr_number: u64, label: &str) -> Result<()> {
        debug!(pr_number, label, "removing label");
        self.throttle.acquire().await;
        self.client
            .issues(&self.config.owner, &self.config.repo)
            .remove_label(pr_number, label)
            .await?;
        Ok(())
    }

    async fn create_comment(&self, pr_number: u64, body: &str) -> Result<()> {
        debug!(pr_number, "creating PR comment");
        self.throttle.acquire().await;
        self.client
            .issues(&self.config.owner, &self.config.repo)
            .create_comment(pr_number, body)
            .await?;
        debug!(pr_number, "created PR comment");
        Ok(())
    }

    async fn merge_pr(&self, pr_number: u64, method: MergeMethod) -> Result<MergeResult> {
        debug!(pr_number, %method, "merging PR");

        // Squash commits are titled after the PR
        let details = self.get_pr(pr_number).await?;

        let octocrab_method = match method {
            MergeMethod::Squash => octocrab::params::pulls::MergeMethod::Squash,
            MergeMethod::Merge => octocrab::params::pulls::MergeMethod::Merge,
            MergeMethod::Rebase => octocrab::params::pulls::MergeMethod::Rebase,
        };

        self.throttle.acquire().await;
        let pulls = self.client.pulls(&self.config.owner, &self.config.repo);
        let result = if method == MergeMethod::Squash {
            pulls
                .merge(pr_number)
                .method(octocrab_method)
                .title(format!("{} (#{})", details.title, pr_number))
                .send()
                .await
        } else {
            pulls.merge(pr_number).method(octocrab_method).send().await
        }
        .map_err(|e| Error::GitHubApi(format!("Merge failed: {e}")))?;

        let merge_result = MergeResult {
            merged: result.merged,
            sha: result.sha,
            message: result.message,
        };

        debug!(
            pr_number,
            merged = merge_result.merged,
            sha = ?merge_result.sha,
            "merge complete"
        );
        Ok(merge_result)
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}
