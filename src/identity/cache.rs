//! Persistent cache of users fetched over the network.
//!
//! The backing file is a JSON document
//! `{"version": 1, "users": {"<id>": {"user": {...}, "fetched_at_epoch_seconds": n}}}`.
//! The in-memory map sits behind a read/write lock and is only reachable
//! through [`IdentityCache::get`], [`IdentityCache::set`], and the load/save
//! pair.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::models::user::{CachedIdentity, DirectoryUser};
use crate::{AppError, Result};

/// Current on-disk document version.
pub const CACHE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CacheDocument {
    version: u32,
    #[serde(default)]
    users: BTreeMap<String, CachedIdentity>,
}

/// Shared identity cache backed by a JSON file.
#[derive(Debug)]
pub struct IdentityCache {
    path: PathBuf,
    entries: RwLock<HashMap<String, CachedIdentity>>,
}

impl IdentityCache {
    /// Empty cache that will save to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Load the cache from `path`; a missing file yields an empty cache.
    ///
    /// Documents written by a different format version are ignored.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the file exists but cannot be read or parsed.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no identity cache yet");
                return Ok(Self::new(path));
            }
            Err(err) => {
                return Err(AppError::Io(format!(
                    "cannot read identity cache {}: {err}",
                    path.display()
                )))
            }
        };

        let doc: CacheDocument = serde_json::from_str(&raw).map_err(|err| {
            AppError::Io(format!(
                "identity cache {} is corrupt: {err}",
                path.display()
            ))
        })?;

        if doc.version != CACHE_VERSION {
            warn!(
                path = %path.display(),
                version = doc.version,
                "ignoring identity cache with unsupported version"
            );
            return Ok(Self::new(path));
        }

        debug!(path = %path.display(), users = doc.users.len(), "loaded identity cache");
        Ok(Self {
            path,
            entries: RwLock::new(doc.users.into_iter().collect()),
        })
    }

    /// Backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached entry for `id`.
    pub async fn get(&self, id: &str) -> Option<CachedIdentity> {
        self.entries.read().await.get(id).cloned()
    }

    /// Record `user` under the lookup key `id`, stamped as fetched now.
    ///
    /// The key is the ID callers look up, which may differ from the
    /// canonical ID the server reports in `user.id`.
    pub async fn set(&self, id: &str, user: DirectoryUser) {
        let entry = CachedIdentity {
            user,
            fetched_at_epoch_seconds: Utc::now().timestamp(),
        };
        self.entries.write().await.insert(id.to_owned(), entry);
    }

    /// Number of cached users.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds no users.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Write the cache to its backing file, creating parent directories.
    ///
    /// The document goes to a sibling temporary file that is renamed over
    /// the target, so an interrupted save leaves the previous file intact.
    /// The temporary file is created owner-readable only on Unix.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the directory or file cannot be written.
    pub async fn save(&self) -> Result<()> {
        let doc = CacheDocument {
            version: CACHE_VERSION,
            users: self
                .entries
                .read()
                .await
                .iter()
                .map(|(id, entry)| (id.clone(), entry.clone()))
                .collect(),
        };
        let json = serde_json::to_vec_pretty(&doc)
            .map_err(|err| AppError::Io(format!("cannot encode identity cache: {err}")))?;

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|err| {
            AppError::Io(format!(
                "cannot create identity cache directory {}: {err}",
                parent.display()
            ))
        })?;

        let mut tmp = NamedTempFile::new_in(parent)
            .map_err(|err| AppError::Io(format!("cannot create temporary cache file: {err}")))?;
        tmp.write_all(&json)
            .map_err(|err| AppError::Io(format!("cannot write temporary cache file: {err}")))?;
        tmp.persist(&self.path).map_err(|err| {
            AppError::Io(format!(
                "cannot replace identity cache {}: {err}",
                self.path.display()
            ))
        })?;

        debug!(path = %self.path.display(), users = doc.users.len(), "saved identity cache");
        Ok(())
    }
}
