//! Three-tier user identity resolution.
//!
//! Lookups walk an ordered chain of [`IdentityLookup`] tiers (directory, then
//! persistent cache) and stop at the first hit. Only when every tier misses
//! does the resolver call the network through a [`UserFetcher`]; that step is
//! the one with a side effect, writing the fetched user back into the
//! [`IdentityCache`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::identity::cache::IdentityCache;
use crate::identity::directory::DirectoryIndex;
use crate::models::user::{DirectoryUser, UNKNOWN_USER};
use crate::slack::api::UserInfo;
use crate::slack::gateway::ApiGateway;
use crate::{AppError, Result};

/// Method fetching a single user.
pub const USERS_INFO_METHOD: &str = "users.info";

/// A side-effect-free identity source.
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    /// Tier name for diagnostics.
    fn tier(&self) -> &'static str;

    /// The user with `id`, if this tier knows it.
    async fn lookup(&self, id: &str) -> Option<DirectoryUser>;
}

/// Fetches one user over the network.
#[async_trait]
pub trait UserFetcher: Send + Sync {
    /// Fetch the user with `id`.
    ///
    /// # Errors
    ///
    /// Returns the transport or API error that prevented the fetch.
    async fn fetch_user(&self, id: &str) -> Result<DirectoryUser>;
}

#[async_trait]
impl UserFetcher for ApiGateway {
    async fn fetch_user(&self, id: &str) -> Result<DirectoryUser> {
        let info: UserInfo = self
            .call_platform(USERS_INFO_METHOD, &[("user", id)])
            .await?;
        Ok(info.user.into())
    }
}

/// Tier 1: the workspace directory.
pub struct DirectoryTier(pub Arc<DirectoryIndex>);

#[async_trait]
impl IdentityLookup for DirectoryTier {
    fn tier(&self) -> &'static str {
        "directory"
    }

    async fn lookup(&self, id: &str) -> Option<DirectoryUser> {
        self.0.get(id).cloned()
    }
}

/// Tier 2: users fetched in this or an earlier run.
pub struct CacheTier(pub Arc<IdentityCache>);

#[async_trait]
impl IdentityLookup for CacheTier {
    fn tier(&self) -> &'static str {
        "cache"
    }

    async fn lookup(&self, id: &str) -> Option<DirectoryUser> {
        self.0.get(id).await.map(|entry| entry.user)
    }
}

/// Resolves user IDs to display names, minimizing network calls.
pub struct IdentityResolver {
    tiers: Vec<Box<dyn IdentityLookup>>,
    cache: Arc<IdentityCache>,
    fetcher: Option<Arc<dyn UserFetcher>>,
}

impl IdentityResolver {
    /// Resolver over `directory` and `cache`, without network access.
    #[must_use]
    pub fn new(directory: Arc<DirectoryIndex>, cache: Arc<IdentityCache>) -> Self {
        Self {
            tiers: vec![
                Box::new(DirectoryTier(directory)),
                Box::new(CacheTier(Arc::clone(&cache))),
            ],
            cache,
            fetcher: None,
        }
    }

    /// Enable the network tier.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn UserFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// The shared cache, for saving at the end of a run.
    #[must_use]
    pub fn cache(&self) -> &Arc<IdentityCache> {
        &self.cache
    }

    /// Resolve the full user record for `id`.
    ///
    /// Returns `Ok(None)` when every local tier misses and no fetcher is
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Identity` if the network fetch fails.
    pub async fn resolve_user(&self, id: &str) -> Result<Option<DirectoryUser>> {
        for tier in &self.tiers {
            if let Some(user) = tier.lookup(id).await {
                debug!(user_id = id, tier = tier.tier(), "identity resolved");
                return Ok(Some(user));
            }
        }

        match &self.fetcher {
            Some(fetcher) => self.fetch_and_remember(fetcher.as_ref(), id).await.map(Some),
            None => Ok(None),
        }
    }

    /// Preferred display name for `id`.
    ///
    /// An empty ID yields `"unknown"`; an unresolvable ID without a fetcher
    /// yields the ID itself.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Identity` if the network fetch fails.
    pub async fn resolve(&self, id: &str) -> Result<String> {
        if id.is_empty() {
            return Ok(UNKNOWN_USER.to_owned());
        }
        Ok(self
            .resolve_user(id)
            .await?
            .map_or_else(|| id.to_owned(), |user| user.preferred_name()))
    }

    /// Canonical `dm_<username>` label for a DM with `id`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Identity` if the network fetch fails.
    pub async fn resolve_dm_name(&self, id: &str) -> Result<String> {
        if id.is_empty() {
            return Ok(format!("dm_{UNKNOWN_USER}"));
        }
        Ok(self
            .resolve_user(id)
            .await?
            .map_or_else(|| format!("dm_{id}"), |user| user.dm_name()))
    }

    /// Like [`IdentityResolver::resolve`], degrading fetch failures to the
    /// raw ID.
    pub async fn resolve_or_raw(&self, id: &str) -> String {
        match self.resolve(id).await {
            Ok(name) => name,
            Err(err) => {
                warn!(user_id = id, %err, "identity lookup failed, using raw id");
                id.to_owned()
            }
        }
    }

    async fn fetch_and_remember(&self, fetcher: &dyn UserFetcher, id: &str) -> Result<DirectoryUser> {
        let user = fetcher
            .fetch_user(id)
            .await
            .map_err(|err| AppError::Identity(format!("cannot fetch user {id}: {err}")))?;
        self.cache.set(id, user.clone()).await;
        debug!(user_id = id, tier = "network", "identity fetched and cached");
        Ok(user)
    }
}
