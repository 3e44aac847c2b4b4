//! Directory users and cached identities.

use serde::{Deserialize, Serialize};

/// Placeholder returned when a lookup is attempted with an empty ID.
pub const UNKNOWN_USER: &str = "unknown";

/// A workspace user as returned by `users.list` / `users.info`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectoryUser {
    /// Slack user ID (e.g. `U024BE7LH`).
    pub id: String,
    /// Account handle.
    #[serde(default)]
    pub username: String,
    /// Full name from the profile.
    #[serde(default)]
    pub real_name: String,
    /// Display name chosen by the user; often empty.
    #[serde(default)]
    pub display_name: String,
}

impl DirectoryUser {
    /// Best human-readable name: display name, then real name, then
    /// username, then an `unknown:<id>` placeholder.
    #[must_use]
    pub fn preferred_name(&self) -> String {
        [&self.display_name, &self.real_name, &self.username]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .map_or_else(|| format!("{UNKNOWN_USER}:{}", self.id), str::to_owned)
    }

    /// Canonical DM label, `dm_<username>` with the username lowercased.
    ///
    /// Users without a username fall back to their preferred name.
    #[must_use]
    pub fn dm_name(&self) -> String {
        let username = self.username.trim();
        if username.is_empty() {
            format!("dm_{}", self.preferred_name())
        } else {
            format!("dm_{}", username.to_lowercase())
        }
    }
}

/// A network-fetched user persisted between runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachedIdentity {
    /// The fetched user record.
    pub user: DirectoryUser,
    /// Unix seconds when the record was fetched.
    pub fetched_at_epoch_seconds: i64,
}
