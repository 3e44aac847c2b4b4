//! End-to-end discovery: credentials, activity, identities, export window.

use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use crate::activity::ActivityAggregator;
use crate::config::EngineConfig;
use crate::credentials::{self, CredentialVault};
use crate::identity::{DirectoryIndex, IdentityCache, IdentityResolver, UserFetcher};
use crate::models::conversation::Conversation;
use crate::models::export::ExportRequest;
use crate::models::window::DateWindow;
use crate::slack::gateway::ApiGateway;
use crate::Result;

/// Everything the archiver hand-off needs for one export day.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityReport {
    /// Team ID confirmed by `auth.test`.
    pub team_id: String,
    /// Authenticated user ID.
    pub self_user_id: String,
    /// UTC window of the export day.
    pub window: DateWindow,
    /// Active conversations with resolved names, most recent first.
    pub conversations: Vec<Conversation>,
}

impl ActivityReport {
    /// Build the archiver request for every reported conversation.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if no conversation was active.
    pub fn export_request(&self) -> Result<ExportRequest> {
        ExportRequest::new(
            self.conversations.iter().map(|c| c.id.clone()).collect(),
            self.window,
        )
    }
}

/// Discover conversations active since the start of `date` (local to the
/// configured timezone).
///
/// # Errors
///
/// Fails on invalid dates or zones, credential problems, and transport or
/// API errors. Identity lookups degrade to raw IDs; an unreadable identity
/// cache is replaced by an empty one and failing to save it is logged and
/// ignored.
pub async fn discover(
    config: &EngineConfig,
    date: &str,
    cancel: CancellationToken,
) -> Result<ActivityReport> {
    let window = config.window_calculator()?.window(date, &config.timezone)?;

    let vault = match &config.credential_cache_dir {
        Some(dir) => CredentialVault::at(dir),
        None => CredentialVault::discover()?,
    };
    let creds = vault.load()?;
    credentials::validate(&creds)?;

    let gateway = ApiGateway::new(creds, cancel)?;
    discover_with_gateway(config, window, gateway).await
}

/// Run discovery over an unverified gateway.
///
/// # Errors
///
/// See [`discover`].
pub async fn discover_with_gateway(
    config: &EngineConfig,
    window: DateWindow,
    mut gateway: ApiGateway,
) -> Result<ActivityReport> {
    let span = info_span!("discover", start = %window.start_utc, end = %window.end_utc);
    async move {
        let identity = gateway.verify().await?;
        let gateway = Arc::new(gateway);

        let active = ActivityAggregator::new(&gateway)
            .active_conversations(Some(window.start_utc))
            .await?;

        let conversations = if active.conversations.iter().any(|c| c.is_direct_message) {
            let directory = Arc::new(DirectoryIndex::fetch(&gateway).await?);
            let cache_path = config.identity_cache_path();
            let cache = match IdentityCache::load(cache_path.clone()) {
                Ok(cache) => cache,
                Err(err) => {
                    warn!(%err, "identity cache unusable, starting empty");
                    IdentityCache::new(cache_path)
                }
            };
            let cache = Arc::new(cache);
            let fetcher: Arc<dyn UserFetcher> = gateway.clone();
            let resolver = IdentityResolver::new(directory, cache).with_fetcher(fetcher);

            let named = name_direct_messages(&resolver, active.conversations).await;
            if let Err(err) = resolver.cache().save().await {
                warn!(%err, "failed to save identity cache");
            }
            named
        } else {
            active.conversations
        };

        let conversations = config.filter()?.apply(conversations);
        info!(count = conversations.len(), "active conversations discovered");

        Ok(ActivityReport {
            team_id: gateway.credentials().team_id.clone(),
            self_user_id: if active.self_user.id.is_empty() {
                identity.user_id
            } else {
                active.self_user.id
            },
            window,
            conversations,
        })
    }
    .instrument(span)
    .await
}

/// Replace each DM's placeholder name with `dm_<username>`, resolving
/// counterparts concurrently. Failed lookups keep the raw user ID.
pub async fn name_direct_messages(
    resolver: &IdentityResolver,
    conversations: Vec<Conversation>,
) -> Vec<Conversation> {
    join_all(conversations.into_iter().map(|mut conv| async move {
        if let Some(user_id) = conv.dm_user_id.clone() {
            conv.name = match resolver.resolve_dm_name(&user_id).await {
                Ok(name) => name,
                Err(err) => {
                    warn!(conversation = %conv.id, user_id = %user_id, %err, "dm name unresolved");
                    user_id
                }
            };
        }
        conv
    }))
    .await
}
