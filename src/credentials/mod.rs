//! Recovery of workspace credentials from the slackdump on-disk cache.
//!
//! The cache directory holds a `workspace.txt` marker naming the active
//! workspace and one `<workspace>.bin` file per workspace containing
//! `IV || AES-256-CFB(JSON)`. See [`crypto`] for the key schedule.

pub mod crypto;
pub mod error;
pub mod machine;
pub mod token;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

pub use error::{CredentialError, CredentialErrorCode};
pub use token::{extract_team_id, parse_credentials, validate};

use crate::models::credentials::Credentials;

/// Directory name of the cache under the user's cache directory.
pub const CACHE_DIR_NAME: &str = "slackdump";

/// Marker file naming the active workspace.
pub const WORKSPACE_FILE: &str = "workspace.txt";

/// Extension of per-workspace credential files.
pub const CREDENTIALS_EXT: &str = "bin";

/// Locate the slackdump cache under the platform cache directory.
///
/// # Errors
///
/// Returns [`CredentialErrorCode::CacheNotFound`] when the platform has no
/// cache directory or the slackdump cache has never been created.
pub fn locate_cache_directory() -> Result<PathBuf, CredentialError> {
    let base = dirs::cache_dir().ok_or_else(|| {
        CredentialError::new(
            CredentialErrorCode::CacheNotFound,
            "no user cache directory on this platform",
        )
    })?;
    locate_cache_directory_in(&base)
}

/// Locate the slackdump cache under `base`.
///
/// # Errors
///
/// Returns [`CredentialErrorCode::CacheNotFound`] if the directory is absent.
pub fn locate_cache_directory_in(base: &Path) -> Result<PathBuf, CredentialError> {
    let dir = base.join(CACHE_DIR_NAME);
    if dir.is_dir() {
        Ok(dir)
    } else {
        Err(CredentialError::new(
            CredentialErrorCode::CacheNotFound,
            format!("credential cache not found at {}", dir.display()),
        ))
    }
}

/// Read the active workspace name from `cache_dir`.
///
/// # Errors
///
/// Returns [`CredentialErrorCode::NoWorkspaceSelected`] if the marker file is
/// missing and [`CredentialErrorCode::EmptyWorkspace`] if it is blank.
pub fn read_active_workspace(cache_dir: &Path) -> Result<String, CredentialError> {
    let path = cache_dir.join(WORKSPACE_FILE);
    let raw = fs::read_to_string(&path).map_err(|err| {
        CredentialError::new(
            CredentialErrorCode::NoWorkspaceSelected,
            format!("cannot read {}", path.display()),
        )
        .with_cause(err)
    })?;

    let workspace = raw.trim();
    if workspace.is_empty() {
        return Err(CredentialError::new(
            CredentialErrorCode::EmptyWorkspace,
            format!("{} is empty", path.display()),
        ));
    }
    Ok(workspace.to_owned())
}

/// Reads and decrypts credentials from one cache directory.
pub struct CredentialVault {
    cache_dir: PathBuf,
    machine_id: Option<String>,
}

impl CredentialVault {
    /// Vault over the platform's default cache location.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialErrorCode::CacheNotFound`] if no cache exists.
    pub fn discover() -> Result<Self, CredentialError> {
        Ok(Self::at(locate_cache_directory()?))
    }

    /// Vault over an explicit cache directory.
    #[must_use]
    pub fn at(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            machine_id: None,
        }
    }

    /// Use `machine_id` instead of reading the hardware identifier.
    #[must_use]
    pub fn with_machine_id(mut self, machine_id: impl Into<String>) -> Self {
        self.machine_id = Some(machine_id.into());
        self
    }

    /// Cache directory this vault reads from.
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Load credentials for the active workspace.
    ///
    /// # Errors
    ///
    /// Returns a [`CredentialError`] for any missing, unreadable, or corrupt
    /// piece of the cache.
    pub fn load(&self) -> Result<Credentials, CredentialError> {
        if !self.cache_dir.is_dir() {
            return Err(CredentialError::new(
                CredentialErrorCode::CacheNotFound,
                format!("credential cache not found at {}", self.cache_dir.display()),
            ));
        }
        let workspace = read_active_workspace(&self.cache_dir)?;
        self.load_workspace(&workspace)
    }

    /// Load credentials for a named workspace.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialErrorCode::CredentialsNotFound`] if the workspace
    /// has no credential file, or any decryption/parse failure.
    pub fn load_workspace(&self, workspace: &str) -> Result<Credentials, CredentialError> {
        let path = self
            .cache_dir
            .join(format!("{workspace}.{CREDENTIALS_EXT}"));
        let data = fs::read(&path).map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                CredentialError::new(
                    CredentialErrorCode::CredentialsNotFound,
                    format!("no credentials stored for workspace {workspace}"),
                )
            } else {
                CredentialError::new(
                    CredentialErrorCode::DecryptFailed,
                    format!("cannot read {}", path.display()),
                )
                .with_cause(err)
            }
        })?;

        let machine_id = match &self.machine_id {
            Some(id) => id.clone(),
            None => machine::machine_id()?,
        };
        let key = crypto::derive_key(&machine_id)?;
        let plaintext = crypto::decrypt(&data, &key)?;
        let creds = parse_credentials(&plaintext, workspace)?;

        debug!(
            workspace,
            team_id = %creds.team_id,
            cookies = creds.cookies.len(),
            "loaded workspace credentials"
        );
        Ok(creds)
    }
}
