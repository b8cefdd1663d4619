//! Authentication for GitHub
//!
//! Supports environment variables and the `gh` CLI. Without either the
//! queue runs anonymously under the much lower anonymous rate limit.

use tokio::process::Command;
use tracing::debug;

/// Environment variables checked for a token, in order
pub const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// Source of authentication token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// Token from CLI tool (gh)
    Cli,
    /// Token from environment variable
    EnvVar,
}

/// GitHub authentication configuration
#[derive(Debug, Clone)]
pub struct GitHubAuthConfig {
    /// Authentication token
    pub token: String,
    /// Where the token came from
    pub source: AuthSource,
}

/// Find a token with `lookup`, trying each of [`TOKEN_ENV_VARS`]
///
/// Empty values are ignored.
pub fn token_from_env(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    TOKEN_ENV_VARS
        .iter()
        .filter_map(|&name| lookup(name))
        .map(|token| token.trim().to_string())
        .find(|token| !token.is_empty())
}

/// Get GitHub authentication
///
/// Priority:
/// 1. `GITHUB_TOKEN` or `GH_TOKEN` environment variable
/// 2. `gh auth token`
///
/// Returns `None` when neither yields a token.
pub async fn get_github_auth() -> Option<GitHubAuthConfig> {
    if let Some(token) = token_from_env(|name| std::env::var(name).ok()) {
        debug!("using GitHub token from environment");
        return Some(GitHubAuthConfig {
            token,
            source: AuthSource::EnvVar,
        });
    }

    if let Some(token) = get_gh_cli_token().await {
        debug!("using GitHub token from gh CLI");
        return Some(GitHubAuthConfig {
            token,
            source: AuthSource::Cli,
        });
    }

    debug!("no GitHub token found, running anonymously");
    None
}

async fn get_gh_cli_token() -> Option<String> {
    let output = Command::new("gh")
        .args(["auth", "token"])
        .output()
        .await
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let token = String::from_utf8(output.stdout).ok()?.trim().to_string();
    (!token.is_empty()).then_some(token)
}
