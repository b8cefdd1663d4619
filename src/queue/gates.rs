//! Gate decisions - pure functions for candidate evaluation
//!
//! Each gate looks at already-fetched data and returns a [`GateOutcome`].
//! No I/O happens here; side effects a failing gate wants are returned as
//! [`SideEffect`] values for the pipeline to apply.

use crate::config::FilterConfig;
use crate::types::{
    LGTM_LABEL, Mergeability, NEEDS_OK_TO_MERGE_LABEL, PrIssue, REQUIRED_LABELS, has_label,
    has_labels,
};
use crate::whitelist::Whitelist;

/// Comment posted when an approval predates the last push
pub const STALE_LGTM_COMMENT: &str = "LGTM was before last commit, removing LGTM";

/// Comment posted when the author needs a manual override
pub fn needs_override_comment(override_label: &str) -> String {
    format!(
        "The author of this PR is not in the whitelist for merge, can one of the admins add the '{override_label}' label?"
    )
}

/// A mutating call a gate asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    /// Add a label to the PR
    AddLabel(String),
    /// Remove a label from the PR
    RemoveLabel(String),
    /// Post a comment on the PR
    Comment(String),
}

impl std::fmt::Display for SideEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AddLabel(label) => write!(f, "add label '{label}'"),
            Self::RemoveLabel(label) => write!(f, "remove label '{label}'"),
            Self::Comment(_) => write!(f, "comment"),
        }
    }
}

/// Why a candidate was skipped this pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The issue has no author
    MissingAuthor,
    /// Numbered below the configured minimum
    BelowMinimum {
        /// Configured minimum
        min: u64,
    },
    /// A required label is missing
    MissingLabels,
    /// Author isn't whitelisted and no override label is present
    NotWhitelisted {
        /// Author login
        author: String,
    },
    /// Approval was given before the last push
    StaleApproval,
    /// Approval freshness couldn't be determined
    ApprovalUnverified(String),
    /// Mergeability still unknown after waiting
    MergeabilityUnknown,
    /// Conflicts with the base branch
    NotMergeable,
    /// Combined status is not success right now
    StatusNotSuccess,
    /// Status couldn't be fetched
    StatusUnavailable(String),
    /// Fetching PR details failed
    FetchFailed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingAuthor => write!(f, "no user info"),
            Self::BelowMinimum { min } => write!(f, "below minimum PR number {min}"),
            Self::MissingLabels => write!(f, "doesn't have requisite labels"),
            Self::NotWhitelisted { author } => write!(f, "{author} isn't in whitelist"),
            Self::StaleApproval => write!(f, "pushed after LGTM"),
            Self::ApprovalUnverified(e) => write!(f, "couldn't validate LGTM: {e}"),
            Self::MergeabilityUnknown => write!(f, "no mergeability information"),
            Self::NotMergeable => write!(f, "not mergeable"),
            Self::StatusNotSuccess => write!(f, "status not success"),
            Self::StatusUnavailable(e) => write!(f, "couldn't validate status: {e}"),
            Self::FetchFailed(e) => write!(f, "fetch failed: {e}"),
        }
    }
}

/// Decision of one gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Continue to the next gate
    Pass,
    /// Skip the candidate
    Skip(SkipReason),
    /// Skip the candidate after applying side effects
    SkipWithEffects(SkipReason, Vec<SideEffect>),
}

impl GateOutcome {
    /// Whether the candidate continues
    pub const fn passed(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Candidate must have an author to be evaluable
pub const fn identity_gate(issue: &PrIssue) -> GateOutcome {
    if issue.author.is_some() {
        GateOutcome::Pass
    } else {
        GateOutcome::Skip(SkipReason::MissingAuthor)
    }
}

/// Candidate number must be at least `min_pr_number`
pub const fn min_number_gate(number: u64, config: &FilterConfig) -> GateOutcome {
    if number < config.min_pr_number {
        GateOutcome::Skip(SkipReason::BelowMinimum {
            min: config.min_pr_number,
        })
    } else {
        GateOutcome::Pass
    }
}

/// Candidate must currently carry every required label
pub fn label_gate(labels: &[String]) -> GateOutcome {
    if has_labels(labels, &REQUIRED_LABELS) {
        GateOutcome::Pass
    } else {
        GateOutcome::Skip(SkipReason::MissingLabels)
    }
}

/// Author must be whitelisted or the PR must carry the override label
///
/// Outside dry-run a failing PR gets the marker label and a comment, once:
/// a PR already carrying the marker is skipped silently.
pub fn whitelist_gate(
    author: &str,
    labels: &[String],
    whitelist: &Whitelist,
    config: &FilterConfig,
) -> GateOutcome {
    if whitelist.contains(author) || has_label(labels, &config.whitelist_override_label) {
        return GateOutcome::Pass;
    }

    let reason = SkipReason::NotWhitelisted {
        author: author.to_string(),
    };
    if config.dry_run || has_label(labels, NEEDS_OK_TO_MERGE_LABEL) {
        return GateOutcome::Skip(reason);
    }
    GateOutcome::SkipWithEffects(
        reason,
        vec![
            SideEffect::AddLabel(NEEDS_OK_TO_MERGE_LABEL.to_string()),
            SideEffect::Comment(needs_override_comment(&config.whitelist_override_label)),
        ],
    )
}

/// Marker label removal for a PR that passed the whitelist gate
pub fn marker_cleanup(labels: &[String], config: &FilterConfig) -> Option<SideEffect> {
    (!config.dry_run && has_label(labels, NEEDS_OK_TO_MERGE_LABEL))
        .then(|| SideEffect::RemoveLabel(NEEDS_OK_TO_MERGE_LABEL.to_string()))
}

/// Approval must postdate the last push
///
/// A stale approval is commented on and its label removed, outside dry-run.
pub fn staleness_gate(approval_current: bool, config: &FilterConfig) -> GateOutcome {
    if approval_current {
        GateOutcome::Pass
    } else if config.dry_run {
        GateOutcome::Skip(SkipReason::StaleApproval)
    } else {
        GateOutcome::SkipWithEffects(
            SkipReason::StaleApproval,
            vec![
                SideEffect::Comment(STALE_LGTM_COMMENT.to_string()),
                SideEffect::RemoveLabel(LGTM_LABEL.to_string()),
            ],
        )
    }
}

/// Candidate must be known to merge cleanly
///
/// Called after the single re-fetch, so `Unknown` is final here.
pub const fn mergeability_gate(mergeable: Mergeability) -> GateOutcome {
    match mergeable {
        Mergeability::Mergeable => GateOutcome::Pass,
        Mergeability::Conflicting => GateOutcome::Skip(SkipReason::NotMergeable),
        Mergeability::Unknown => GateOutcome::Skip(SkipReason::MergeabilityUnknown),
    }
}

/// Status contexts a candidate must report
///
/// The primary context is dropped only when an exemption label is configured
/// and present on the PR.
pub fn required_contexts(config: &FilterConfig, labels: &[String]) -> Vec<String> {
    let mut contexts = config.required_status_contexts.clone();
    let exempt = config
        .exemption_label()
        .is_some_and(|label| has_label(labels, label));
    if !exempt && !config.primary_status_context.is_empty() {
        contexts.push(config.primary_status_context.clone());
    }
    contexts
}

/// Candidate's combined status must be success
pub const fn status_gate(status_ok: bool) -> GateOutcome {
    if status_ok {
        GateOutcome::Pass
    } else {
        GateOutcome::Skip(SkipReason::StatusNotSuccess)
    }
}
