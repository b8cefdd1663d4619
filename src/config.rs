//! Queue configuration loaded from `config.toml`.

use crate::error::{Error, Result};
use crate::platform::throttle::{ANONYMOUS_RATE, AUTHENTICATED_RATE, DEFAULT_BURST};
use crate::poll::{DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL, PollOptions};
use crate::types::PlatformConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Directory name under the user's config dir.
const APP_DIR: &str = "submit-queue";

/// Filename for the configuration.
const CONFIG_FILE: &str = "config.toml";

/// Default label that overrides absence from the whitelist.
pub const DEFAULT_WHITELIST_OVERRIDE: &str = "ok-to-merge";

/// Default seconds to wait for the platform to compute mergeability.
pub const DEFAULT_MERGEABILITY_WAIT_SECS: u64 = 10;

/// Policy applied to every candidate during one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// PRs numbered below this are ignored.
    pub min_pr_number: u64,
    /// Non-committer users believed safe.
    pub additional_user_whitelist: Vec<String>,
    /// Static committers, used when they can't be fetched dynamically.
    pub committers: Vec<String>,
    /// Label that overrides absence from the whitelist.
    pub whitelist_override_label: String,
    /// Make no mutating API calls.
    pub dry_run: bool,
    /// Label exempting a PR from `primary_status_context`; empty for none.
    pub status_exemption_label: String,
    /// Status context required unless the exemption label is present.
    pub primary_status_context: String,
    /// Status contexts always required.
    pub required_status_contexts: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_pr_number: 0,
            additional_user_whitelist: Vec::new(),
            committers: Vec::new(),
            whitelist_override_label: DEFAULT_WHITELIST_OVERRIDE.to_string(),
            dry_run: false,
            status_exemption_label: String::new(),
            primary_status_context: String::new(),
            required_status_contexts: Vec::new(),
        }
    }
}

impl FilterConfig {
    /// The exemption label, if one is configured.
    pub fn exemption_label(&self) -> Option<&str> {
        Some(self.status_exemption_label.as_str()).filter(|l| !l.is_empty())
    }
}

/// `[repository]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Organization owning the repository.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// GitHub Enterprise host.
    pub host: Option<String>,
}

impl RepositoryConfig {
    /// Convert into the platform's coordinates.
    pub fn platform_config(&self) -> PlatformConfig {
        PlatformConfig {
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            host: self.host.clone(),
        }
    }
}

/// `[rate_limit]` section; unset values depend on whether a token is present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Steady refill rate in requests per second.
    pub rate_per_second: Option<f64>,
    /// Burst capacity.
    pub burst: Option<u32>,
}

impl RateLimitConfig {
    /// Effective `(rate, burst)`.
    pub fn resolve(&self, authenticated: bool) -> (f64, u32) {
        let default_rate = if authenticated {
            AUTHENTICATED_RATE
        } else {
            ANONYMOUS_RATE
        };
        (
            self.rate_per_second.unwrap_or(default_rate),
            self.burst.unwrap_or(DEFAULT_BURST),
        )
    }
}

/// `[polling]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Seconds between status polls.
    pub interval_secs: u64,
    /// Attempts before giving up; 0 waits forever.
    pub max_attempts: u32,
    /// Seconds to wait before re-fetching unknown mergeability.
    pub mergeability_wait_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            mergeability_wait_secs: DEFAULT_MERGEABILITY_WAIT_SECS,
        }
    }
}

impl PollingConfig {
    /// Build poll options wired to `cancel`.
    pub fn poll_options(&self, cancel: CancellationToken) -> PollOptions {
        PollOptions {
            interval: Duration::from_secs(self.interval_secs),
            max_attempts: Some(self.max_attempts).filter(|&n| n > 0),
            cancel,
        }
    }

    /// Wait before re-fetching unknown mergeability.
    pub const fn mergeability_wait(&self) -> Duration {
        Duration::from_secs(self.mergeability_wait_secs)
    }
}

/// Full configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Target repository.
    pub repository: RepositoryConfig,
    /// Candidate policy.
    pub filter: FilterConfig,
    /// Outbound call throttle.
    pub rate_limit: RateLimitConfig,
    /// Wait behaviour.
    pub polling: PollingConfig,
}

impl QueueConfig {
    /// Check values the rest of the crate relies on.
    pub fn validate(&self) -> Result<()> {
        if self.repository.owner.is_empty() || self.repository.repo.is_empty() {
            return Err(Error::Config(
                "repository owner and repo must both be set".to_string(),
            ));
        }
        if let Some(rate) = self.rate_limit.rate_per_second
            && !(rate.is_finite() && rate > 0.0)
        {
            return Err(Error::Config(format!(
                "rate_per_second must be positive, got {rate}"
            )));
        }
        if self.rate_limit.burst == Some(0) {
            return Err(Error::Config("burst must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Default config path: `<config_dir>/submit-queue/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE))
}

/// Load configuration from `path`.
///
/// A missing file yields the defaults; callers still need to supply the
/// repository before [`QueueConfig::validate`] passes.
pub fn load_config(path: &Path) -> Result<QueueConfig> {
    if !path.exists() {
        return Ok(QueueConfig::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
}
