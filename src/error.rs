//! Error types for submit-queue

use thiserror::Error;

/// Errors produced while evaluating candidates or talking to the platform
#[derive(Debug, Error)]
pub enum Error {
    /// GitHub API call failed
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Generic platform failure (used by non-GitHub services and test doubles)
    #[error("platform error: {0}")]
    Platform(String),

    /// Invalid or unreadable configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// No usable credentials
    #[error("authentication error: {0}")]
    Auth(String),

    /// A PR carries the approval label but no event ever applied it
    #[error("couldn't find time for '{label}' label on PR #{pr}, skipping")]
    MissingApproval {
        /// PR number
        pr: u64,
        /// Approval label name
        label: String,
    },

    /// A PR has no commits to derive a last-modified time from
    #[error("PR #{0} has no commits with a committer date")]
    NoCommits(u64),

    /// The platform reported a commit state we don't understand
    #[error("unknown commit state: {0}")]
    UnknownState(String),

    /// A polling loop exhausted its attempt budget
    #[error("gave up waiting on PR #{pr} after {attempts} attempts")]
    PollTimeout {
        /// PR number
        pr: u64,
        /// Attempts made before giving up
        attempts: u32,
    },

    /// A wait was interrupted by cancellation
    #[error("cancelled")]
    Cancelled,

    /// The caller-supplied action failed; aborts the pass
    #[error("action failed for PR #{pr}: {message}")]
    Action {
        /// PR number
        pr: u64,
        /// Failure description
        message: String,
    },

    /// Internal invariant violation
    #[error("internal error: {0}")]
    Internal(String),

    /// IO failure (config files, external commands)
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<octocrab::Error> for Error {
    fn from(err: octocrab::Error) -> Self {
        Self::GitHubApi(err.to_string())
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
