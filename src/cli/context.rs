//! Shared command context for CLI commands
//!
//! Loads configuration, resolves credentials and builds the throttled
//! platform service every command talks through.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use submit_queue::auth::get_github_auth;
use submit_queue::config::{QueueConfig, default_config_path, load_config};
use submit_queue::error::{Error, Result};
use submit_queue::platform::{GitHubService, PlatformService, RateLimiter};
use submit_queue::poll::PollOptions;
use submit_queue::queue::PipelineOptions;
use submit_queue::whitelist::WhitelistCache;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Flags shared by every subcommand
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Explicit config file
    pub config: Option<PathBuf>,
    /// Repository owner override
    pub owner: Option<String>,
    /// Repository name override
    pub repo: Option<String>,
    /// Minimum PR number override
    pub min_pr_number: Option<u64>,
    /// Force dry-run regardless of the config file
    pub dry_run: bool,
    /// Stop after the first acted-on candidate
    pub once: bool,
}

impl GlobalOptions {
    /// Apply command-line overrides on top of the loaded config
    pub fn apply(&self, config: &mut QueueConfig) {
        if let Some(ref owner) = self.owner {
            config.repository.owner.clone_from(owner);
        }
        if let Some(ref repo) = self.repo {
            config.repository.repo.clone_from(repo);
        }
        if let Some(min) = self.min_pr_number {
            config.filter.min_pr_number = min;
        }
        if self.dry_run {
            config.filter.dry_run = true;
        }
    }
}

/// Shared context for CLI commands that interact with the platform
pub struct CommandContext {
    /// Loaded and validated configuration
    pub config: QueueConfig,
    /// Platform service (GitHub)
    pub platform: Box<dyn PlatformService>,
    /// Whitelist, computed on first use
    pub whitelist: WhitelistCache,
    /// Fired on Ctrl-C
    pub cancel: CancellationToken,
    /// Stop after the first acted-on candidate
    pub once: bool,
}

impl CommandContext {
    /// Create a new command context
    ///
    /// - Load config from `--config` or the default path
    /// - Apply command-line overrides
    /// - Resolve a token, falling back to anonymous access
    /// - Build the rate limiter and platform service
    pub async fn new(options: &GlobalOptions, cancel: CancellationToken) -> Result<Self> {
        let path = resolve_config_path(options.config.as_deref())?;
        debug!(path = %path.display(), "loading config");
        let mut config = load_config(&path)?;
        options.apply(&mut config);
        config.validate()?;

        let auth = get_github_auth().await;
        let (rate, burst) = config.rate_limit.resolve(auth.is_some());
        if auth.is_none() {
            info!(rate, "no GitHub token found, using anonymous rate limit");
        }
        let throttle = Arc::new(RateLimiter::new(rate, burst)?);

        let platform = GitHubService::new(
            auth.as_ref().map(|a| a.token.as_str()),
            config.repository.platform_config(),
            throttle,
        )?;

        let whitelist = WhitelistCache::new(
            config.filter.additional_user_whitelist.clone(),
            config.filter.committers.clone(),
        );

        Ok(Self {
            config,
            platform: Box::new(platform),
            whitelist,
            cancel,
            once: options.once,
        })
    }

    /// Poll options wired to this context's cancellation token
    pub fn poll_options(&self) -> PollOptions {
        self.config.polling.poll_options(self.cancel.clone())
    }

    /// Pipeline options for one pass
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            once: self.once,
            mergeability_wait: self.config.polling.mergeability_wait(),
            poll: self.poll_options(),
        }
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return Ok(path.to_path_buf());
    }
    default_config_path()
        .ok_or_else(|| Error::Config("could not determine config directory".to_string()))
}
