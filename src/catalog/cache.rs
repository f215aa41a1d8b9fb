use std::{
    collections::HashMap,
    future::Future,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::catalog::{CatalogError, CatalogSnapshot};

/// Fetches the catalog for one connection.
pub trait CatalogLoader {
    fn load(&self, key: &str) -> impl Future<Output = Result<CatalogSnapshot, CatalogError>> + Send;
}

/// Loads a snapshot previously written with [`CatalogSnapshot::save_to_file`].
#[derive(Debug, Clone)]
pub struct JsonFileLoader {
    pub path: PathBuf,
}

impl JsonFileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogLoader for JsonFileLoader {
    fn load(&self, _key: &str) -> impl Future<Output = Result<CatalogSnapshot, CatalogError>> + Send {
        CatalogSnapshot::load_from_file(self.path.clone())
    }
}

#[derive(Default)]
struct CacheEntries {
    snapshots: HashMap<String, Arc<CatalogSnapshot>>,
    /// Migration directory fingerprint seen when the snapshot was stored.
    fingerprints: HashMap<String, Vec<(String, u128)>>,
}

/// Catalog snapshots keyed by connection string.
///
/// Entries are only ever replaced whole, so readers holding an `Arc` never
/// observe a half-updated catalog.
#[derive(Clone)]
pub struct CatalogCache {
    entries: Arc<RwLock<CacheEntries>>,
    timeout: Duration,
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl CatalogCache {
    pub fn new(timeout: Duration) -> Self {
        Self { entries: Arc::new(RwLock::new(CacheEntries::default())), timeout }
    }

    pub async fn get(&self, key: &str) -> Option<Arc<CatalogSnapshot>> {
        self.entries.read().await.snapshots.get(key).map(Arc::clone)
    }

    pub async fn insert(&self, key: &str, snapshot: CatalogSnapshot) -> Arc<CatalogSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.entries.write().await.snapshots.insert(key.to_string(), Arc::clone(&snapshot));
        snapshot
    }

    pub async fn get_or_load<L>(&self, key: &str, loader: &L) -> Result<Arc<CatalogSnapshot>, CatalogError>
    where
        L: CatalogLoader + Sync,
    {
        if let Some(snapshot) = self.get(key).await {
            debug!(key, "catalog cache hit");
            return Ok(snapshot);
        }

        debug!(key, "catalog cache miss");
        let snapshot = match tokio::time::timeout(self.timeout, loader.load(key)).await {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(err)) => {
                warn!(key, error = %err, "catalog load failed");
                return Err(err);
            }
            Err(_) => {
                warn!(key, "catalog load timed out");
                return Err(CatalogError::Timeout { key: key.to_string(), millis: self.timeout.as_millis() });
            }
        };

        // A concurrent load may have finished first; keep whichever landed.
        let mut entries = self.entries.write().await;
        let stored = entries.snapshots.entry(key.to_string()).or_insert_with(|| Arc::new(snapshot));
        Ok(Arc::clone(stored))
    }

    pub async fn invalidate(&self, key: &str) -> bool {
        let mut entries = self.entries.write().await;
        entries.fingerprints.remove(key);
        let removed = entries.snapshots.remove(key).is_some();
        debug!(key, removed, "catalog cache invalidated");
        removed
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.snapshots.clear();
        entries.fingerprints.clear();
    }

    /// Drops the entry for `key` when the migration files under `directory`
    /// changed since the last call. Returns whether it was dropped.
    pub async fn invalidate_if_migrations_changed(
        &self,
        key: &str,
        directory: impl AsRef<Path>,
    ) -> Result<bool, CatalogError> {
        let fingerprint = migrations_fingerprint(directory.as_ref()).await?;

        let mut entries = self.entries.write().await;
        let changed = entries.fingerprints.get(key).is_some_and(|previous| *previous != fingerprint);
        entries.fingerprints.insert(key.to_string(), fingerprint);
        if changed {
            entries.snapshots.remove(key);
            debug!(key, "migrations changed, catalog cache invalidated");
        }
        Ok(changed)
    }
}

/// Sorted `(file name, modified millis)` of every `.sql` file in the directory.
async fn migrations_fingerprint(directory: &Path) -> Result<Vec<(String, u128)>, CatalogError> {
    let migration_error = |file: &str, message: String| CatalogError::Migration {
        directory: directory.display().to_string(),
        file: file.to_string(),
        message,
    };

    let mut reader = tokio::fs::read_dir(directory).await.map_err(|err| migration_error("", err.to_string()))?;
    let mut fingerprint = Vec::new();

    while let Some(entry) = reader.next_entry().await.map_err(|err| migration_error("", err.to_string()))? {
        let file = entry.file_name().to_string_lossy().into_owned();
        if !file.ends_with(".sql") {
            continue;
        }
        let metadata = entry.metadata().await.map_err(|err| migration_error(&file, err.to_string()))?;
        let modified = metadata
            .modified()
            .ok()
            .and_then(|time| time.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|since| since.as_millis())
            .unwrap_or_default();
        fingerprint.push((file, modified));
    }

    fingerprint.sort();
    Ok(fingerprint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingLoader {
        calls: AtomicUsize,
    }

    impl CatalogLoader for CountingLoader {
        fn load(&self, _key: &str) -> impl Future<Output = Result<CatalogSnapshot, CatalogError>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(CatalogSnapshot::with_builtin_types()) }
        }
    }

    struct SlowLoader;

    impl CatalogLoader for SlowLoader {
        fn load(&self, _key: &str) -> impl Future<Output = Result<CatalogSnapshot, CatalogError>> + Send {
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(CatalogSnapshot::new())
            }
        }
    }

    struct FailingLoader;

    impl CatalogLoader for FailingLoader {
        fn load(&self, key: &str) -> impl Future<Output = Result<CatalogSnapshot, CatalogError>> + Send {
            let key = key.to_string();
            async move { Err(CatalogError::Connection { key, message: "connection refused".into() }) }
        }
    }

    #[tokio::test]
    async fn second_lookup_reuses_the_snapshot() {
        let cache = CatalogCache::default();
        let loader = CountingLoader { calls: AtomicUsize::new(0) };

        let first = cache.get_or_load("postgres://a", &loader).await.unwrap();
        let second = cache.get_or_load("postgres://a", &loader).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);

        cache.get_or_load("postgres://b", &loader).await.unwrap();
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_a_reload() {
        let cache = CatalogCache::default();
        let loader = CountingLoader { calls: AtomicUsize::new(0) };

        cache.get_or_load("k", &loader).await.unwrap();
        assert!(cache.invalidate("k").await);
        assert!(!cache.invalidate("k").await);
        cache.get_or_load("k", &loader).await.unwrap();
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);

        cache.clear().await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn slow_loads_time_out() {
        let cache = CatalogCache::new(Duration::from_millis(20));
        let err = cache.get_or_load("k", &SlowLoader).await.unwrap_err();
        assert_eq!(err, CatalogError::Timeout { key: "k".into(), millis: 20 });
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn loader_errors_propagate_and_are_not_cached() {
        let cache = CatalogCache::default();
        let err = cache.get_or_load("k", &FailingLoader).await.unwrap_err();
        assert!(matches!(err, CatalogError::Connection { .. }));
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn json_file_loader_reads_saved_snapshots() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("catalog.json");
        CatalogSnapshot::with_builtin_types().save_to_file(&path).await.unwrap();

        let cache = CatalogCache::default();
        let snapshot = cache.get_or_load("file", &JsonFileLoader::new(&path)).await.unwrap();
        assert_eq!(snapshot.type_name(23), Some("int4"));
    }

    #[tokio::test]
    async fn new_migration_files_invalidate() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("001_init.sql"), "create table t (id int);").await.unwrap();

        let cache = CatalogCache::default();
        cache.insert("k", CatalogSnapshot::new()).await;
        assert!(!cache.invalidate_if_migrations_changed("k", tmp.path()).await.unwrap());
        assert!(cache.get("k").await.is_some());

        tokio::fs::write(tmp.path().join("002_more.sql"), "alter table t add c text;").await.unwrap();
        assert!(cache.invalidate_if_migrations_changed("k", tmp.path()).await.unwrap());
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn missing_migration_directory_is_a_migration_error() {
        let tmp = TempDir::new().unwrap();
        let cache = CatalogCache::default();
        let err = cache.invalidate_if_migrations_changed("k", tmp.path().join("missing")).await.unwrap_err();
        assert!(matches!(err, CatalogError::Migration { .. }));
    }
}
