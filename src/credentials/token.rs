//! Credential payload parsing and validation.

use serde::Deserialize;

use super::error::{CredentialError, CredentialErrorCode};
use crate::models::credentials::{Credentials, SessionCookie};

/// Prefix of browser session ("client") tokens.
pub const TOKEN_PREFIX: &str = "xoxc-";

/// Characters of the token shown in validation errors.
const TOKEN_PREVIEW_CHARS: usize = 8;

#[derive(Debug, Deserialize)]
struct StoredCredentials {
    #[serde(rename = "Token", default)]
    token: String,
    #[serde(rename = "Cookie", default)]
    cookies: Option<Vec<StoredCookie>>,
}

#[derive(Debug, Deserialize)]
struct StoredCookie {
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Value", default)]
    value: String,
    #[serde(rename = "Domain", default)]
    domain: String,
}

/// Parse the decrypted credential document for `workspace`.
///
/// # Errors
///
/// Returns [`CredentialErrorCode::ParseFailed`] if the JSON is malformed or
/// the token is empty. A wrong decryption key surfaces here too.
pub fn parse_credentials(plaintext: &[u8], workspace: &str) -> Result<Credentials, CredentialError> {
    let stored: StoredCredentials = serde_json::from_slice(plaintext).map_err(|err| {
        CredentialError::new(
            CredentialErrorCode::ParseFailed,
            format!("credentials for workspace {workspace} are not valid JSON"),
        )
        .with_cause(err)
    })?;

    if stored.token.is_empty() {
        return Err(CredentialError::new(
            CredentialErrorCode::ParseFailed,
            format!("credentials for workspace {workspace} have no token"),
        ));
    }

    let cookies = stored
        .cookies
        .unwrap_or_default()
        .into_iter()
        .map(|c| SessionCookie {
            name: c.name,
            value: c.value,
            domain: c.domain,
        })
        .collect();

    Ok(Credentials {
        team_id: extract_team_id(&stored.token),
        token: stored.token,
        workspace: workspace.to_owned(),
        cookies,
    })
}

/// Team ID encoded as the second hyphen-delimited segment of an `xoxc-`
/// token; empty for any other token shape.
#[must_use]
pub fn extract_team_id(token: &str) -> String {
    if !token.starts_with(TOKEN_PREFIX) {
        return String::new();
    }
    token.split('-').nth(1).unwrap_or_default().to_owned()
}

/// Check token presence, token prefix, and team ID, in that order.
///
/// # Errors
///
/// Returns the first violated rule as [`CredentialErrorCode::EmptyToken`],
/// [`CredentialErrorCode::MalformedToken`], or
/// [`CredentialErrorCode::MissingTeamId`].
pub fn validate(creds: &Credentials) -> Result<(), CredentialError> {
    if creds.token.is_empty() {
        return Err(CredentialError::new(
            CredentialErrorCode::EmptyToken,
            "token is empty",
        ));
    }
    if !creds.token.starts_with(TOKEN_PREFIX) {
        return Err(CredentialError::new(
            CredentialErrorCode::MalformedToken,
            format!(
                "token does not start with {TOKEN_PREFIX}: {}",
                token_preview(&creds.token)
            ),
        ));
    }
    if creds.team_id.is_empty() {
        return Err(CredentialError::new(
            CredentialErrorCode::MissingTeamId,
            "team id is empty",
        ));
    }
    Ok(())
}

/// Non-sensitive preview of a token: at most its first few characters and
/// never more than half of it.
#[must_use]
pub fn token_preview(token: &str) -> String {
    let shown = TOKEN_PREVIEW_CHARS.min(token.chars().count() / 2);
    let preview: String = token.chars().take(shown).collect();
    format!("{preview}...")
}
