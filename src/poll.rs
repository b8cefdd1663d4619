//! Waiting on commit statuses that haven't settled yet
//!
//! Both loops sleep a fixed interval between attempts, give up after
//! `max_attempts` (when set) and stop early when the cancellation token fires.

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::status::get_status;
use crate::types::StatusVerdict;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Default interval between status polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Default attempt budget for a polling loop
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

/// Polling behaviour shared by the wait helpers
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Sleep between attempts
    pub interval: Duration,
    /// Give up after this many fetches; `None` waits forever
    pub max_attempts: Option<u32>,
    /// Checked between attempts
    pub cancel: CancellationToken,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
            cancel: CancellationToken::new(),
        }
    }
}

/// Sleep for `duration` unless `cancel` fires first
pub async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> Result<()> {
    tokio::select! {
        () = cancel.cancelled() => Err(Error::Cancelled),
        () = tokio::time::sleep(duration) => Ok(()),
    }
}

/// Sleep between attempts, or fail when the budget is spent
async fn next_attempt(pr_number: u64, attempts: u32, options: &PollOptions) -> Result<()> {
    if options.max_attempts.is_some_and(|max| attempts >= max) {
        return Err(Error::PollTimeout {
            pr: pr_number,
            attempts,
        });
    }
    sleep_or_cancel(options.interval, &options.cancel).await
}

/// Whether a PR's combined status is success
///
/// With `wait_on_pending` false a pending verdict returns `false` right away.
/// Otherwise pending verdicts are re-fetched until they settle.
pub async fn validate_status<S: AsRef<str> + Sync>(
    platform: &dyn PlatformService,
    pr_number: u64,
    required: &[S],
    wait_on_pending: bool,
    options: &PollOptions,
) -> Result<bool> {
    let mut attempts = 0;
    loop {
        if options.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let verdict = get_status(platform, pr_number, required).await?;
        attempts += 1;
        match verdict {
            StatusVerdict::Success => return Ok(true),
            StatusVerdict::Error | StatusVerdict::Failure | StatusVerdict::Incomplete => {
                return Ok(false);
            }
            StatusVerdict::Pending if !wait_on_pending => return Ok(false),
            StatusVerdict::Pending => {
                debug!(pr_number, attempts, "PR is pending, waiting");
                next_attempt(pr_number, attempts, options).await?;
            }
        }
    }
}

/// Wait until a PR's status turns pending
///
/// Re-test requests are asynchronous; callers use this to know the new run
/// has started before waiting for it to finish.
pub async fn wait_for_pending(
    platform: &dyn PlatformService,
    pr_number: u64,
    options: &PollOptions,
) -> Result<()> {
    let mut attempts = 0;
    loop {
        if options.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let verdict = get_status::<&str>(platform, pr_number, &[]).await?;
        attempts += 1;
        if verdict == StatusVerdict::Pending {
            return Ok(());
        }
        debug!(pr_number, attempts, %verdict, "PR is not pending, waiting");
        next_attempt(pr_number, attempts, options).await?;
    }
}
