//! Unit tests for the directory/cache/network identity tiers and the
//! persistent identity cache.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use slack_activity::identity::{DirectoryIndex, IdentityCache, IdentityResolver, UserFetcher};
use slack_activity::models::user::DirectoryUser;
use slack_activity::{AppError, Result};

fn user(id: &str, username: &str, real: &str, display: &str) -> DirectoryUser {
    DirectoryUser {
        id: id.into(),
        username: username.into(),
        real_name: real.into(),
        display_name: display.into(),
    }
}

/// Fetcher that counts calls and serves a fixed user, or fails.
#[derive(Default)]
struct CountingFetcher {
    calls: AtomicUsize,
    fail: bool,
}

impl CountingFetcher {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserFetcher for CountingFetcher {
    async fn fetch_user(&self, id: &str) -> Result<DirectoryUser> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::Api {
                endpoint: "users.info".into(),
                code: "user_not_found".into(),
            });
        }
        Ok(user(id, "Guest.User", "Guest User", ""))
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    cache: Arc<IdentityCache>,
    fetcher: Arc<CountingFetcher>,
    resolver: IdentityResolver,
}

async fn fixture(fail: bool) -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let directory = Arc::new(DirectoryIndex::from_users([
        user("U1", "alice", "Alice Liddell", "ali"),
        user("U2", "Bob", "Bob Builder", ""),
    ]));
    let cache = Arc::new(IdentityCache::new(dir.path().join("identities.json")));
    cache.set("W9", user("W9", "carol", "Carol Danvers", "")).await;

    let fetcher = Arc::new(CountingFetcher {
        calls: AtomicUsize::new(0),
        fail,
    });
    let dyn_fetcher: Arc<dyn UserFetcher> = fetcher.clone();
    let resolver =
        IdentityResolver::new(directory, Arc::clone(&cache)).with_fetcher(dyn_fetcher);
    Fixture {
        _dir: dir,
        cache,
        fetcher,
        resolver,
    }
}

// ─── Preferred names ──────────────────────────────────────────────────

#[test]
fn preferred_name_order() {
    assert_eq!(user("U", "u", "Real", "Disp").preferred_name(), "Disp");
    assert_eq!(user("U", "u", "Real", "").preferred_name(), "Real");
    assert_eq!(user("U", "u", "", " ").preferred_name(), "u");
    assert_eq!(user("U7", "", "", "").preferred_name(), "unknown:U7");
}

#[test]
fn dm_name_lowercases_username() {
    assert_eq!(user("U", "Bob.Smith", "", "").dm_name(), "dm_bob.smith");
    assert_eq!(user("U", "", "Real Name", "").dm_name(), "dm_Real Name");
}

// ─── Tiering ──────────────────────────────────────────────────────────

#[tokio::test]
async fn directory_hit_never_fetches() {
    let f = fixture(false).await;
    assert_eq!(f.resolver.resolve("U1").await.unwrap(), "ali");
    assert_eq!(f.resolver.resolve("U2").await.unwrap(), "Bob Builder");
    assert_eq!(f.fetcher.calls(), 0);
    assert!(f.cache.get("U1").await.is_none());
}

#[tokio::test]
async fn cache_hit_never_fetches() {
    let f = fixture(false).await;
    assert_eq!(f.resolver.resolve("W9").await.unwrap(), "Carol Danvers");
    assert_eq!(f.fetcher.calls(), 0);
}

#[tokio::test]
async fn miss_fetches_once_then_hits_cache() {
    let f = fixture(false).await;
    assert_eq!(f.resolver.resolve("W42").await.unwrap(), "Guest User");
    assert_eq!(f.fetcher.calls(), 1);
    assert!(f.cache.get("W42").await.is_some());

    assert_eq!(f.resolver.resolve("W42").await.unwrap(), "Guest User");
    assert_eq!(f.resolver.resolve_dm_name("W42").await.unwrap(), "dm_guest.user");
    assert_eq!(f.fetcher.calls(), 1);
}

/// Fetcher whose server reports a canonical ID different from the one asked for.
struct RenamingFetcher {
    calls: AtomicUsize,
}

#[async_trait]
impl UserFetcher for RenamingFetcher {
    async fn fetch_user(&self, _id: &str) -> Result<DirectoryUser> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(user("U777", "migrated", "Migrated User", ""))
    }
}

#[tokio::test]
async fn fetched_user_is_cached_under_requested_id() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache = Arc::new(IdentityCache::new(dir.path().join("identities.json")));
    let fetcher = Arc::new(RenamingFetcher {
        calls: AtomicUsize::new(0),
    });
    let dyn_fetcher: Arc<dyn UserFetcher> = fetcher.clone();
    let resolver = IdentityResolver::new(Arc::new(DirectoryIndex::default()), Arc::clone(&cache))
        .with_fetcher(dyn_fetcher);

    assert_eq!(resolver.resolve("W1").await.unwrap(), "Migrated User");
    assert_eq!(resolver.resolve("W1").await.unwrap(), "Migrated User");
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.get("W1").await.unwrap().user.id, "U777");
}

#[tokio::test]
async fn empty_id_is_unknown_without_lookup() {
    let f = fixture(false).await;
    assert_eq!(f.resolver.resolve("").await.unwrap(), "unknown");
    assert_eq!(f.fetcher.calls(), 0);
}

#[tokio::test]
async fn fetch_failure_propagates() {
    let f = fixture(true).await;
    let err = f.resolver.resolve("W42").await.unwrap_err();
    assert!(matches!(err, AppError::Identity(_)), "{err}");
    assert!(err.to_string().contains("user_not_found"));
    assert!(f.cache.get("W42").await.is_none());
}

#[tokio::test]
async fn best_effort_falls_back_to_raw_id() {
    let f = fixture(true).await;
    assert_eq!(f.resolver.resolve_or_raw("W42").await, "W42");
    assert_eq!(f.resolver.resolve_or_raw("U1").await, "ali");
}

#[tokio::test]
async fn without_fetcher_unknown_ids_stay_raw() {
    let dir = tempfile::tempdir().expect("tempdir");
    let resolver = IdentityResolver::new(
        Arc::new(DirectoryIndex::default()),
        Arc::new(IdentityCache::new(dir.path().join("c.json"))),
    );
    assert_eq!(resolver.resolve("W42").await.unwrap(), "W42");
    assert_eq!(resolver.resolve_dm_name("W42").await.unwrap(), "dm_W42");
    assert!(resolver.resolve_user("W42").await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_lookups_share_cache() {
    let f = fixture(false).await;
    let ids = ["U1", "W9", "W50", "W51", "U2"];
    let names = futures_util::future::try_join_all(ids.iter().map(|id| f.resolver.resolve(id)))
        .await
        .unwrap();
    assert_eq!(names[0], "ali");
    assert_eq!(names[2], "Guest User");
    assert_eq!(f.fetcher.calls(), 2);
    assert_eq!(f.cache.len().await, 3);
}

// ─── Persistence ──────────────────────────────────────────────────────

#[tokio::test]
async fn missing_cache_file_loads_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache = IdentityCache::load(dir.path().join("absent.json")).unwrap();
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn save_creates_parents_and_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("deeper").join("identities.json");
    let cache = IdentityCache::new(&path);
    cache.set("W1", user("W1", "ext", "External Person", "")).await;
    cache.save().await.unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc["version"], 1);
    assert_eq!(doc["users"]["W1"]["user"]["real_name"], "External Person");
    assert!(doc["users"]["W1"]["fetched_at_epoch_seconds"].as_i64().unwrap() > 0);

    let reloaded = IdentityCache::load(&path).unwrap();
    let entry = reloaded.get("W1").await.unwrap();
    assert_eq!(entry.user.username, "ext");
}

#[cfg(unix)]
#[tokio::test]
async fn saved_cache_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("identities.json");
    let cache = IdentityCache::new(&path);
    cache.save().await.unwrap();
    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[tokio::test]
async fn save_overwrites_previous_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("identities.json");
    let first = IdentityCache::new(&path);
    first.set("W1", user("W1", "a", "", "")).await;
    first.set("W2", user("W2", "b", "", "")).await;
    first.save().await.unwrap();

    let second = IdentityCache::new(&path);
    second.set("W3", user("W3", "c", "", "")).await;
    second.save().await.unwrap();

    let reloaded = IdentityCache::load(&path).unwrap();
    assert_eq!(reloaded.len().await, 1);
    assert!(reloaded.get("W3").await.is_some());
}

#[tokio::test]
async fn save_leaves_no_temporary_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("identities.json");
    std::fs::write(&path, "{truncated").unwrap();

    let cache = IdentityCache::new(&path);
    cache.set("W5", user("W5", "e", "", "")).await;
    cache.save().await.unwrap();

    let names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["identities.json"]);
    assert!(IdentityCache::load(&path).unwrap().get("W5").await.is_some());
}

#[test]
fn corrupt_cache_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("identities.json");
    std::fs::write(&path, "{oops").unwrap();
    let err = IdentityCache::load(&path).unwrap_err();
    assert!(matches!(err, AppError::Io(_)));
}

#[tokio::test]
async fn unsupported_version_is_ignored() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("identities.json");
    std::fs::write(&path, r#"{"version": 99, "users": {}}"#).unwrap();
    let cache = IdentityCache::load(&path).unwrap();
    assert!(cache.is_empty().await);
}
