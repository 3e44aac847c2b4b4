//! Response payloads for the Slack methods the engine consumes.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::models::conversation::ConversationSnapshot;
use crate::models::user::DirectoryUser;

/// A paginated list response.
pub trait Page: DeserializeOwned {
    /// Element accumulated across pages.
    type Item;

    /// Cursor for the next page; `None` or empty when this is the last page.
    fn next_cursor(&self) -> Option<&str>;

    /// Consume the page into its elements.
    fn into_items(self) -> Vec<Self::Item>;
}

/// `response_metadata` block carried by cursor-paginated methods.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMetadata {
    /// Opaque cursor; empty on the last page.
    #[serde(default)]
    pub next_cursor: String,
}

fn cursor_of(meta: Option<&ResponseMetadata>) -> Option<&str> {
    meta.map(|m| m.next_cursor.as_str())
        .filter(|cursor| !cursor.is_empty())
}

/// `auth.test` result.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AuthIdentity {
    /// Workspace base URL (e.g. `https://acme.slack.com/`).
    pub url: String,
    /// Workspace display name.
    #[serde(default)]
    pub team: String,
    /// Authenticated username.
    #[serde(default)]
    pub user: String,
    /// Team ID.
    pub team_id: String,
    /// Authenticated user ID.
    #[serde(default)]
    pub user_id: String,
}

/// The authenticated user as reported by `client.userBoot`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootSelf {
    /// User ID.
    pub id: String,
    /// Username.
    #[serde(default)]
    pub name: String,
}

/// Channel, group, or MPIM entry from the roster.
#[derive(Debug, Clone, Default, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct RosterChannel {
    /// Conversation ID.
    pub id: String,
    /// Channel name (MPIMs use `mpdm-a--b--c-1`).
    #[serde(default)]
    pub name: String,
    /// Public or private channel.
    #[serde(default)]
    pub is_channel: bool,
    /// Legacy private group.
    #[serde(default)]
    pub is_group: bool,
    /// One-to-one direct message.
    #[serde(default)]
    pub is_im: bool,
    /// Multi-party direct message.
    #[serde(default)]
    pub is_mpim: bool,
    /// Private channel.
    #[serde(default)]
    pub is_private: bool,
    /// Archived.
    #[serde(default)]
    pub is_archived: bool,
    /// Caller is a member.
    #[serde(default)]
    pub is_member: bool,
}

/// Direct-message entry from the roster; carries only the counterpart.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RosterIm {
    /// Conversation ID.
    pub id: String,
    /// Counterpart user ID.
    #[serde(default)]
    pub user: String,
}

/// `client.userBoot` result.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserBoot {
    /// The authenticated user.
    #[serde(rename = "self", default)]
    pub self_user: BootSelf,
    /// Channels, groups, and MPIMs.
    #[serde(default)]
    pub channels: Vec<RosterChannel>,
    /// Direct messages.
    #[serde(default)]
    pub ims: Vec<RosterIm>,
}

/// `client.counts` result.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CountsPage {
    /// Channels and groups.
    #[serde(default)]
    pub channels: Vec<ConversationSnapshot>,
    /// Multi-party DMs.
    #[serde(default)]
    pub mpims: Vec<ConversationSnapshot>,
    /// Direct messages.
    #[serde(default)]
    pub ims: Vec<ConversationSnapshot>,
    /// Pagination cursor.
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

impl Page for CountsPage {
    type Item = ConversationSnapshot;

    fn next_cursor(&self) -> Option<&str> {
        cursor_of(self.response_metadata.as_ref())
    }

    fn into_items(self) -> Vec<ConversationSnapshot> {
        self.channels
            .into_iter()
            .chain(self.mpims)
            .chain(self.ims)
            .collect()
    }
}

/// User profile subset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiProfile {
    /// Display name.
    #[serde(default)]
    pub display_name: String,
    /// Full name.
    #[serde(default)]
    pub real_name: String,
}

/// A user object from `users.list` or `users.info`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiUser {
    /// User ID.
    pub id: String,
    /// Username.
    #[serde(default)]
    pub name: String,
    /// Full name at the top level (not always present).
    #[serde(default)]
    pub real_name: Option<String>,
    /// Profile block.
    #[serde(default)]
    pub profile: Option<ApiProfile>,
}

impl From<ApiUser> for DirectoryUser {
    fn from(user: ApiUser) -> Self {
        let profile = user.profile.unwrap_or_default();
        let real_name = user
            .real_name
            .filter(|name| !name.is_empty())
            .unwrap_or(profile.real_name);
        Self {
            id: user.id,
            username: user.name,
            real_name,
            display_name: profile.display_name,
        }
    }
}

/// `users.list` page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsersPage {
    /// Members on this page.
    #[serde(default)]
    pub members: Vec<ApiUser>,
    /// Pagination cursor.
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

impl Page for UsersPage {
    type Item = ApiUser;

    fn next_cursor(&self) -> Option<&str> {
        cursor_of(self.response_metadata.as_ref())
    }

    fn into_items(self) -> Vec<ApiUser> {
        self.members
    }
}

/// `users.info` result.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    /// The requested user.
    pub user: ApiUser,
}
