//! Author whitelist
//!
//! The whitelist is the union of the configured extra users and everyone
//! with push access through an organization team. When the team lookup
//! fails the static committer list stands in for the dynamic one.

use crate::error::Result;
use crate::platform::{PlatformService, fetch_all};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Set of authors allowed to merge without an override label
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Whitelist(BTreeSet<String>);

impl Whitelist {
    /// Whether `login` is whitelisted
    pub fn contains(&self, login: &str) -> bool {
        self.0.contains(login)
    }

    /// Number of whitelisted authors
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nobody is whitelisted
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate logins in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Whitelist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Logins of every member of a team with push access to the repository
///
/// Teams whose permissions or members can't be read are skipped; only a
/// failure to list the teams themselves is an error.
pub async fn users_with_commit(platform: &dyn PlatformService) -> Result<BTreeSet<String>> {
    let teams = fetch_all(move |page| platform.list_org_teams(page)).await.inspect_err(|e| {
        error!(error = %e, "failed to list organization teams");
    })?;

    let mut pushers = Vec::new();
    for team in teams {
        match platform.team_repo_permissions(&team).await {
            Ok(Some(perms)) if perms.push => pushers.push(team),
            Ok(_) => debug!(team = %team.slug, "team has no push access"),
            Err(e) => debug!(team = %team.slug, error = %e, "skipping team"),
        }
    }

    let mut users = BTreeSet::new();
    for team in &pushers {
        match fetch_all(move |page| platform.list_team_members(team, page)).await {
            Ok(members) => users.extend(members),
            Err(e) => error!(team = %team.slug, error = %e, "failed to list team members"),
        }
    }
    Ok(users)
}

/// Lazily computed whitelist, reused until explicitly refreshed or invalidated
#[derive(Debug, Clone, Default)]
pub struct WhitelistCache {
    additional: Vec<String>,
    committers: Vec<String>,
    cached: Option<Arc<Whitelist>>,
}

impl WhitelistCache {
    /// Create an empty cache
    ///
    /// `additional` is always whitelisted; `committers` is the fallback when
    /// team membership can't be fetched.
    pub const fn new(additional: Vec<String>, committers: Vec<String>) -> Self {
        Self {
            additional,
            committers,
            cached: None,
        }
    }

    /// Recompute the whitelist from the platform and cache it
    pub async fn refresh(&mut self, platform: &dyn PlatformService) -> Arc<Whitelist> {
        let mut users: BTreeSet<String> = self.additional.iter().cloned().collect();
        match users_with_commit(platform).await {
            Ok(dynamic) => users.extend(dynamic),
            Err(_) => {
                info!("falling back to static committers list");
                users.extend(self.committers.iter().cloned());
            }
        }

        let whitelist = Arc::new(Whitelist(users));
        debug!(count = whitelist.len(), "refreshed whitelist");
        self.cached = Some(Arc::clone(&whitelist));
        whitelist
    }

    /// Cached whitelist, computing it on first use
    pub async fn whitelist(&mut self, platform: &dyn PlatformService) -> Arc<Whitelist> {
        if let Some(ref cached) = self.cached {
            return Arc::clone(cached);
        }
        self.refresh(platform).await
    }

    /// Drop the cached whitelist so the next use recomputes it
    pub fn invalidate(&mut self) {
        if self.cached.take().is_some() {
            debug!("whitelist invalidated");
        }
    }

    /// Cached whitelist without fetching
    pub fn cached(&self) -> Option<&Whitelist> {
        self.cached.as_deref()
    }
}
