//! Candidate pipeline - effectful pass over open pull requests
//!
//! Fetches the label-filtered candidate list, runs every candidate through
//! the gates in order, applies the side effects failing gates ask for, and
//! invokes the caller's action on the survivors.

use crate::approval::check_approval;
use crate::config::FilterConfig;
use crate::error::{Error, Result};
use crate::platform::{PlatformService, fetch_all};
use crate::poll::{PollOptions, sleep_or_cancel, validate_status};
use crate::queue::gates::{
    GateOutcome, SideEffect, SkipReason, identity_gate, label_gate, marker_cleanup,
    mergeability_gate, min_number_gate, required_contexts, staleness_gate, status_gate,
    whitelist_gate,
};
use crate::types::{Mergeability, PrIssue, PullRequestDetails, REQUIRED_LABELS};
use crate::whitelist::{Whitelist, WhitelistCache};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Action invoked on every candidate that passes all gates
///
/// An error aborts the whole pass.
#[async_trait]
pub trait CandidateAction: Send {
    /// Act on a ready candidate
    async fn run(
        &mut self,
        platform: &dyn PlatformService,
        pr: &PullRequestDetails,
        issue: &PrIssue,
    ) -> Result<()>;
}

/// Options for a pipeline pass
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Stop after the first successful action
    pub once: bool,
    /// Wait before re-fetching a PR whose mergeability is unknown
    pub mergeability_wait: Duration,
    /// Polling and cancellation for status checks
    pub poll: PollOptions,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            once: false,
            mergeability_wait: Duration::from_secs(crate::config::DEFAULT_MERGEABILITY_WAIT_SECS),
            poll: PollOptions::default(),
        }
    }
}

/// What happened to one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateOutcome {
    /// The action ran
    Acted,
    /// A gate skipped it
    Skipped(SkipReason),
}

/// Per-candidate entry of a [`PassReport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateReport {
    /// PR number
    pub number: u64,
    /// Outcome
    pub outcome: CandidateOutcome,
}

/// Result of one pipeline pass
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    /// Candidates in evaluation order
    pub candidates: Vec<CandidateReport>,
}

impl PassReport {
    /// Numbers of the PRs the action ran on
    pub fn acted(&self) -> Vec<u64> {
        self.candidates
            .iter()
            .filter(|c| c.outcome == CandidateOutcome::Acted)
            .map(|c| c.number)
            .collect()
    }

    /// Skip reason recorded for a PR, if it was skipped
    pub fn skip_reason(&self, number: u64) -> Option<&SkipReason> {
        self.candidates.iter().find_map(|c| match &c.outcome {
            CandidateOutcome::Skipped(reason) if c.number == number => Some(reason),
            _ => None,
        })
    }
}

enum Evaluation {
    Ready(PullRequestDetails),
    Skipped(SkipReason),
}

/// Fetch open PR issues carrying every required label
///
/// A listing failure is fatal to the pass.
pub async fn fetch_candidates(platform: &dyn PlatformService) -> Result<Vec<PrIssue>> {
    let labels: Vec<String> = REQUIRED_LABELS.iter().map(ToString::to_string).collect();
    let labels = labels.as_slice();
    let issues = fetch_all(move |page| platform.list_open_pr_issues(labels, page)).await?;
    let candidates: Vec<PrIssue> = issues.into_iter().filter(|i| i.is_pull_request).collect();
    debug!(count = candidates.len(), "fetched candidates");
    Ok(candidates)
}

/// Fetch candidates and run them through the pipeline
pub async fn for_each_candidate(
    platform: &dyn PlatformService,
    config: &FilterConfig,
    whitelist: &mut WhitelistCache,
    action: &mut dyn CandidateAction,
    options: &PipelineOptions,
) -> Result<PassReport> {
    let candidates = fetch_candidates(platform).await?;
    run_pipeline(platform, &candidates, config, whitelist, action, options).await
}

/// Evaluate `candidates` in order and act on those passing every gate
pub async fn run_pipeline(
    platform: &dyn PlatformService,
    candidates: &[PrIssue],
    config: &FilterConfig,
    whitelist: &mut WhitelistCache,
    action: &mut dyn CandidateAction,
    options: &PipelineOptions,
) -> Result<PassReport> {
    let whitelist = whitelist.whitelist(platform).await;
    let mut report = PassReport::default();

    for issue in candidates {
        if options.poll.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let outcome = match evaluate(platform, issue, config, &whitelist, options).await? {
            Evaluation::Skipped(reason) => CandidateOutcome::Skipped(reason),
            Evaluation::Ready(pr) => {
                info!(pr_number = pr.number, title = %pr.title, "running action");
                if let Err(e) = action.run(platform, &pr, issue).await {
                    error!(pr_number = pr.number, error = %e, "action failed");
                    return Err(match e {
                        Error::Action { .. } => e,
                        other => Error::Action {
                            pr: pr.number,
                            message: other.to_string(),
                        },
                    });
                }
                CandidateOutcome::Acted
            }
        };

        let acted = outcome == CandidateOutcome::Acted;
        report.candidates.push(CandidateReport {
            number: issue.number,
            outcome,
        });
        if acted && options.once {
            break;
        }
    }

    Ok(report)
}

/// Resolve a gate outcome, applying its side effects; `Some` means skip
async fn settle(
    platform: &dyn PlatformService,
    pr_number: u64,
    outcome: GateOutcome,
) -> Option<SkipReason> {
    match outcome {
        GateOutcome::Pass => None,
        GateOutcome::Skip(reason) => {
            debug!(pr_number, %reason, "skipping");
            Some(reason)
        }
        GateOutcome::SkipWithEffects(reason, effects) => {
            info!(pr_number, %reason, effects = effects.len(), "skipping with side effects");
            apply_effects(platform, pr_number, &effects).await;
            Some(reason)
        }
    }
}

/// Apply side effects best-effort; failures are logged
async fn apply_effects(platform: &dyn PlatformService, pr_number: u64, effects: &[SideEffect]) {
    for effect in effects {
        let result = match effect {
            SideEffect::AddLabel(label) => {
                platform
                    .add_labels(pr_number, std::slice::from_ref(label))
                    .await
            }
            SideEffect::RemoveLabel(label) => platform.remove_label(pr_number, label).await,
            SideEffect::Comment(body) => platform.create_comment(pr_number, body).await,
        };
        if let Err(e) = result {
            warn!(pr_number, %effect, error = %e, "failed to apply side effect");
        }
    }
}

#[instrument(skip_all, fields(pr_number = issue.number))]
async fn evaluate(
    platform: &dyn PlatformService,
    issue: &PrIssue,
    config: &FilterConfig,
    whitelist: &Whitelist,
    options: &PipelineOptions,
) -> Result<Evaluation> {
    let number = issue.number;

    if let Some(reason) = settle(platform, number, identity_gate(issue)).await {
        return Ok(Evaluation::Skipped(reason));
    }
    if let Some(reason) = settle(platform, number, min_number_gate(number, config)).await {
        return Ok(Evaluation::Skipped(reason));
    }

    // Labels may have changed since the listing; trust only the fresh PR
    let pr = match platform.get_pr(number).await {
        Ok(pr) => pr,
        Err(e) => {
            error!(error = %e, "error getting pull request");
            return Ok(Evaluation::Skipped(SkipReason::FetchFailed(e.to_string())));
        }
    };
    if let Some(reason) = settle(platform, number, label_gate(&pr.labels)).await {
        return Ok(Evaluation::Skipped(reason));
    }

    let Some(author) = pr.author.as_deref().or(issue.author.as_deref()) else {
        return Ok(Evaluation::Skipped(SkipReason::MissingAuthor));
    };
    let outcome = whitelist_gate(author, &pr.labels, whitelist, config);
    if let Some(reason) = settle(platform, number, outcome).await {
        return Ok(Evaluation::Skipped(reason));
    }

    if let Some(effect) = marker_cleanup(&pr.labels, config) {
        apply_effects(platform, number, std::slice::from_ref(&effect)).await;
    }

    let approval_current = match check_approval(platform, number).await {
        Ok(current) => current,
        Err(e) => {
            error!(error = %e, "error validating LGTM");
            return Ok(Evaluation::Skipped(SkipReason::ApprovalUnverified(
                e.to_string(),
            )));
        }
    };
    if let Some(reason) = settle(platform, number, staleness_gate(approval_current, config)).await
    {
        return Ok(Evaluation::Skipped(reason));
    }

    let pr = if pr.mergeable == Mergeability::Unknown {
        info!(title = %pr.title, "waiting for mergeability");
        sleep_or_cancel(options.mergeability_wait, &options.poll.cancel).await?;
        match platform.get_pr(number).await {
            Ok(refreshed) => refreshed,
            Err(e) => {
                error!(error = %e, "error re-fetching pull request");
                return Ok(Evaluation::Skipped(SkipReason::FetchFailed(e.to_string())));
            }
        }
    } else {
        pr
    };
    if let Some(reason) = settle(platform, number, mergeability_gate(pr.mergeable)).await {
        return Ok(Evaluation::Skipped(reason));
    }

    let contexts = required_contexts(config, &pr.labels);
    let status_ok = match validate_status(platform, number, &contexts, false, &options.poll).await {
        Ok(ok) => ok,
        Err(Error::Cancelled) => return Err(Error::Cancelled),
        Err(e) => {
            error!(error = %e, "error validating PR status");
            return Ok(Evaluation::Skipped(SkipReason::StatusUnavailable(
                e.to_string(),
            )));
        }
    };
    if let Some(reason) = settle(platform, number, status_gate(status_ok)).await {
        return Ok(Evaluation::Skipped(reason));
    }

    Ok(Evaluation::Ready(pr))
}
