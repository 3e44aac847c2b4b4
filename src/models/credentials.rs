//! Workspace authentication material recovered from the credential cache.

use serde::{Deserialize, Serialize};

/// A single browser session cookie attached to every API request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionCookie {
    /// Cookie name (e.g. `d`).
    pub name: String,
    /// Cookie value, sent verbatim.
    pub value: String,
    /// Cookie domain as recorded by the authenticating browser.
    pub domain: String,
}

/// Authentication material for one workspace.
///
/// Built once per run by [`crate::credentials::CredentialVault::load`] and
/// read-only afterwards. The only sanctioned change is
/// [`Credentials::with_team_id`], used when a live `auth.test` response
/// reports a more authoritative team identifier.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Client token (`xoxc-…`).
    pub token: String,
    /// Team identifier derived from the token or the verification call.
    pub team_id: String,
    /// Workspace name as selected in the credential cache.
    pub workspace: String,
    /// Session cookies in the order they were stored.
    pub cookies: Vec<SessionCookie>,
}

impl Credentials {
    /// Replace the team identifier with one reported by the server.
    #[must_use]
    pub fn with_team_id(mut self, team_id: impl Into<String>) -> Self {
        let team_id = team_id.into();
        if !team_id.is_empty() {
            self.team_id = team_id;
        }
        self
    }

    /// Render all cookies as a single `Cookie` header value.
    #[must_use]
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("team_id", &self.team_id)
            .field("workspace", &self.workspace)
            .field("cookies", &self.cookies.len())
            .finish()
    }
}
