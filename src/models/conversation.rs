//! Conversation entities produced by activity aggregation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw per-conversation record from the recency endpoint.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ConversationSnapshot {
    /// Conversation ID.
    pub id: String,
    /// Latest activity in Slack's `"<secs>.<micros>"` format; empty when the
    /// conversation has never had activity.
    #[serde(default)]
    pub latest: String,
}

/// An active conversation, recomputed on every run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Conversation {
    /// Conversation ID.
    pub id: String,
    /// Channel name, or the resolved DM label once identities are known.
    pub name: String,
    /// Public channel.
    pub is_public_channel: bool,
    /// Private channel or legacy group.
    pub is_private_channel: bool,
    /// One-to-one direct message.
    pub is_direct_message: bool,
    /// Multi-party direct message.
    pub is_multi_party_dm: bool,
    /// Archived channel.
    pub is_archived: bool,
    /// The authenticated user is a member.
    pub is_member: bool,
    /// Counterpart user for one-to-one DMs.
    pub dm_user_id: Option<String>,
    /// Latest recorded activity, if any.
    pub last_message_time: Option<DateTime<Utc>>,
}

impl Conversation {
    /// Short kind label used in listings.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        if self.is_direct_message {
            "dm"
        } else if self.is_multi_party_dm {
            "mpim"
        } else if self.is_private_channel {
            "private"
        } else {
            "public"
        }
    }
}
