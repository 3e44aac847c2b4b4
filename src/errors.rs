//! Error types shared across the application.

use std::fmt::{Display, Formatter};

use crate::credentials::CredentialError;

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Credential cache absent, corrupt, or invalid.
    Credential(CredentialError),
    /// Slack responded with a non-2xx HTTP status.
    Http {
        /// API method that was called (e.g. `users.list`).
        endpoint: String,
        /// HTTP status code returned by the server.
        status: u16,
        /// Raw response body, kept for diagnosis.
        body: String,
    },
    /// Slack responded with `ok: false` in the response envelope.
    Api {
        /// API method that was called.
        endpoint: String,
        /// Slack error code (e.g. `invalid_auth`).
        code: String,
    },
    /// Network failure or undecodable response body.
    Transport(String),
    /// The caller cancelled the operation before it completed.
    Cancelled(String),
    /// Unrecognized IANA timezone name.
    InvalidTimezone(String),
    /// Malformed or impossible calendar date.
    InvalidDate(String),
    /// A user identity could not be resolved over the network.
    Identity(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Credential(err) => write!(f, "credentials: {err}"),
            Self::Http {
                endpoint,
                status,
                body,
            } => write!(f, "http: {endpoint} returned status {status}: {body}"),
            Self::Api { endpoint, code } => write!(f, "api: {endpoint} failed: {code}"),
            Self::Transport(msg) => write!(f, "transport: {msg}"),
            Self::Cancelled(msg) => write!(f, "cancelled: {msg}"),
            Self::InvalidTimezone(msg) => write!(f, "invalid timezone: {msg}"),
            Self::InvalidDate(msg) => write!(f, "invalid date: {msg}"),
            Self::Identity(msg) => write!(f, "identity: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Credential(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CredentialError> for AppError {
    fn from(err: CredentialError) -> Self {
        Self::Credential(err)
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}
