//! Joins the `client.userBoot` roster with `client.counts` activity.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::conversation::{Conversation, ConversationSnapshot};
use crate::slack::api::{BootSelf, CountsPage, RosterChannel, RosterIm, UserBoot};
use crate::slack::gateway::{ApiGateway, ApiScope};
use crate::slack::parse_slack_ts;
use crate::{AppError, Result};

/// Roster method (self info plus every channel, group, and DM).
pub const ROSTER_METHOD: &str = "client.userBoot";

/// Recency method (latest activity per conversation).
pub const RECENCY_METHOD: &str = "client.counts";

/// Result of one aggregation pass.
#[derive(Debug, Clone)]
pub struct ActiveConversations {
    /// The authenticated user.
    pub self_user: BootSelf,
    /// Conversations that passed the recency filter, most recent first.
    pub conversations: Vec<Conversation>,
}

/// Fetches both snapshots and merges them.
pub struct ActivityAggregator<'a> {
    gateway: &'a ApiGateway,
}

impl<'a> ActivityAggregator<'a> {
    /// Aggregator over a verified gateway.
    #[must_use]
    pub fn new(gateway: &'a ApiGateway) -> Self {
        Self { gateway }
    }

    /// Fetch the roster.
    ///
    /// # Errors
    ///
    /// Returns the gateway error, prefixed with the failing call.
    pub async fn fetch_roster(&self) -> Result<UserBoot> {
        self.gateway
            .call_workspace(ROSTER_METHOD, &[("only_self_subteams", "true")])
            .await
            .map_err(in_call("roster"))
    }

    /// Fetch every page of the recency snapshot.
    ///
    /// # Errors
    ///
    /// Returns the gateway error, prefixed with the failing call.
    pub async fn fetch_recency(&self) -> Result<Vec<ConversationSnapshot>> {
        self.gateway
            .paginate::<CountsPage>(
                ApiScope::Workspace,
                RECENCY_METHOD,
                &[("thread_counts_by_channel", "true")],
            )
            .await
            .map_err(in_call("recency"))
    }

    /// Fetch roster and recency concurrently and merge them.
    ///
    /// A `since` of `None` or the Unix epoch includes every conversation.
    ///
    /// # Errors
    ///
    /// Fails if either fetch fails or a timestamp is malformed.
    pub async fn active_conversations(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<ActiveConversations> {
        let (boot, snapshots) = tokio::try_join!(self.fetch_roster(), self.fetch_recency())?;
        let self_user = boot.self_user.clone();
        let conversations = aggregate(boot, &snapshots, since)?;
        debug!(
            count = conversations.len(),
            since = ?since,
            "aggregated active conversations"
        );
        Ok(ActiveConversations {
            self_user,
            conversations,
        })
    }
}

/// Map conversation ID to latest activity, skipping conversations without
/// any. Duplicate IDs keep the most recent instant.
///
/// # Errors
///
/// Returns `AppError::Transport` if a timestamp is malformed.
pub fn build_activity_index(
    snapshots: &[ConversationSnapshot],
) -> Result<HashMap<String, DateTime<Utc>>> {
    let mut index: HashMap<String, DateTime<Utc>> = HashMap::with_capacity(snapshots.len());
    for snapshot in snapshots {
        let Some(latest) = parse_slack_ts(&snapshot.latest)? else {
            continue;
        };
        index
            .entry(snapshot.id.clone())
            .and_modify(|existing| *existing = (*existing).max(latest))
            .or_insert(latest);
    }
    Ok(index)
}

/// Merge a roster with recency snapshots, applying the `since` threshold.
///
/// # Errors
///
/// Returns `AppError::Transport` if a timestamp is malformed.
pub fn aggregate(
    boot: UserBoot,
    snapshots: &[ConversationSnapshot],
    since: Option<DateTime<Utc>>,
) -> Result<Vec<Conversation>> {
    let activity = build_activity_index(snapshots)?;
    let threshold = since.filter(|t| t.timestamp() != 0 || t.timestamp_subsec_nanos() != 0);

    let mut seen = HashSet::new();
    let mut conversations: Vec<Conversation> = boot
        .channels
        .into_iter()
        .map(from_channel)
        .chain(boot.ims.into_iter().map(from_im))
        .filter(|conv| seen.insert(conv.id.clone()))
        .filter_map(|mut conv| {
            conv.last_message_time = activity.get(&conv.id).copied();
            match (threshold, conv.last_message_time) {
                (None, _) => Some(conv),
                (Some(t), Some(last)) if last >= t => Some(conv),
                (Some(_), _) => None,
            }
        })
        .collect();

    conversations.sort_by(|a, b| {
        b.last_message_time
            .cmp(&a.last_message_time)
            .then_with(|| a.id.cmp(&b.id))
    });
    Ok(conversations)
}

fn from_channel(channel: RosterChannel) -> Conversation {
    let is_mpim = channel.is_mpim;
    let is_private = !is_mpim && (channel.is_private || channel.is_group);
    Conversation {
        name: channel.name,
        id: channel.id,
        is_public_channel: channel.is_channel && !is_private && !is_mpim,
        is_private_channel: is_private,
        is_direct_message: channel.is_im,
        is_multi_party_dm: is_mpim,
        is_archived: channel.is_archived,
        is_member: channel.is_member,
        dm_user_id: None,
        last_message_time: None,
    }
}

fn from_im(im: RosterIm) -> Conversation {
    let dm_user_id = Some(im.user.clone()).filter(|user| !user.is_empty());
    Conversation {
        name: im.user,
        id: im.id,
        is_public_channel: false,
        is_private_channel: false,
        is_direct_message: true,
        is_multi_party_dm: false,
        is_archived: false,
        is_member: true,
        dm_user_id,
        last_message_time: None,
    }
}

/// Prefix string-carrying errors with the call that produced them.
fn in_call(call: &'static str) -> impl FnOnce(AppError) -> AppError {
    move |err| match err {
        AppError::Transport(msg) => AppError::Transport(format!("{call} fetch: {msg}")),
        AppError::Config(msg) => AppError::Config(format!("{call} fetch: {msg}")),
        AppError::Cancelled(msg) => AppError::Cancelled(format!("{call} fetch: {msg}")),
        other => other,
    }
}
