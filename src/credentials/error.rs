//! Structured credential failures with separate terse and remediation text.

use std::fmt::{Display, Formatter};

/// Command that recreates the credential cache from scratch.
pub const REAUTH_COMMAND: &str = "slackdump workspace new";

/// Command that marks an existing workspace as active.
pub const SELECT_COMMAND: &str = "slackdump workspace select";

/// Machine-checkable credential failure code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialErrorCode {
    /// The cache directory does not exist (never authenticated).
    CacheNotFound,
    /// The active-workspace marker file is missing.
    NoWorkspaceSelected,
    /// The active-workspace marker file is blank.
    EmptyWorkspace,
    /// No `<workspace>.bin` file exists for the active workspace.
    CredentialsNotFound,
    /// The hardware identifier used for key derivation is unavailable.
    MachineIdUnavailable,
    /// The encrypted file is shorter than one IV.
    CiphertextTooShort,
    /// The cipher could not be initialized or the file could not be read.
    DecryptFailed,
    /// The decrypted payload is not the expected JSON document.
    ParseFailed,
    /// Token is empty.
    EmptyToken,
    /// Token lacks the `xoxc-` prefix.
    MalformedToken,
    /// No team identifier could be derived.
    MissingTeamId,
}

impl CredentialErrorCode {
    /// Stable snake-case identifier.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CacheNotFound => "cache_not_found",
            Self::NoWorkspaceSelected => "no_workspace_selected",
            Self::EmptyWorkspace => "empty_workspace",
            Self::CredentialsNotFound => "credentials_not_found",
            Self::MachineIdUnavailable => "machine_id_unavailable",
            Self::CiphertextTooShort => "ciphertext_too_short",
            Self::DecryptFailed => "decrypt_failed",
            Self::ParseFailed => "parse_failed",
            Self::EmptyToken => "empty_token",
            Self::MalformedToken => "malformed_token",
            Self::MissingTeamId => "missing_team_id",
        }
    }
}

impl Display for CredentialErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A credential failure: code, terse message, optional underlying cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialError {
    code: CredentialErrorCode,
    message: String,
    cause: Option<String>,
}

impl CredentialError {
    /// Create an error with a terse message.
    pub fn new(code: CredentialErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            cause: None,
        }
    }

    /// Attach the underlying cause.
    #[must_use]
    pub fn with_cause(mut self, cause: impl Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    /// Failure code callers can branch on.
    #[must_use]
    pub fn code(&self) -> CredentialErrorCode {
        self.code
    }

    /// Terse programmatic message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Underlying cause, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }

    /// Verbose, human-facing guidance for fixing the problem.
    #[must_use]
    pub fn remediation(&self) -> String {
        match self.code {
            CredentialErrorCode::CacheNotFound => format!(
                "No slackdump credential cache was found on this machine. \
                 Authenticate first by running `{REAUTH_COMMAND}`."
            ),
            CredentialErrorCode::NoWorkspaceSelected | CredentialErrorCode::EmptyWorkspace => {
                format!(
                    "slackdump has no active workspace. Run `{SELECT_COMMAND}` to pick one, \
                     or `{REAUTH_COMMAND}` to add a workspace."
                )
            }
            CredentialErrorCode::CredentialsNotFound => format!(
                "The active workspace has no stored credentials. \
                 Run `{REAUTH_COMMAND}` to log in again."
            ),
            CredentialErrorCode::MachineIdUnavailable => format!(
                "The machine identifier used to unlock the slackdump cache could not be read. \
                 Check that this machine exposes a stable ID, then run `{REAUTH_COMMAND}`."
            ),
            CredentialErrorCode::CiphertextTooShort
            | CredentialErrorCode::DecryptFailed
            | CredentialErrorCode::ParseFailed => format!(
                "The stored credentials could not be decrypted. They may be corrupt or were \
                 created on a different machine. Run `{REAUTH_COMMAND}` to log in again."
            ),
            CredentialErrorCode::EmptyToken
            | CredentialErrorCode::MalformedToken
            | CredentialErrorCode::MissingTeamId => format!(
                "The stored credentials are not a browser session token (xoxc-). \
                 Run `{REAUTH_COMMAND}` and log in through the browser."
            ),
        }
    }
}

impl Display for CredentialError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, " ({cause})")?;
        }
        Ok(())
    }
}

impl std::error::Error for CredentialError {}
