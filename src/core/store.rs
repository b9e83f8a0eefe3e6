//! Flat JSON record store.
//!
//! Each logical store is one JSON document on disk. Loading fails soft: a missing,
//! unreadable or corrupt file yields the type's default value and a warning. Writes
//! to the same path are serialized through an async mutex keyed by the path, and
//! [`RecordStore::update`] holds that lock across the whole load-mutate-save cycle.

use crate::errors::Result;
use serde::{Serialize, de::DeserializeOwned};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::Mutex;

/// Process-wide handle to the JSON documents, one lock per file path.
#[derive(Debug, Default, Clone)]
pub struct RecordStore {
    locks: Arc<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>>,
}

impl RecordStore {
    /// Creates a store with no locks taken yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(locks.entry(path.to_path_buf()).or_default())
    }

    /// Loads a document, returning `T::default()` if the file is missing or unreadable.
    pub async fn load<T>(&self, path: impl AsRef<Path>) -> T
    where
        T: DeserializeOwned + Default,
    {
        load_document(path.as_ref()).await
    }

    /// Overwrites the document at `path` with pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if serialization fails or the file cannot be written.
    pub async fn save<T>(&self, path: impl AsRef<Path>, document: &T) -> Result<()>
    where
        T: Serialize + Sync,
    {
        let path = path.as_ref();
        let lock = self.lock_for(path).await;
        let _guard = lock.lock().await;
        save_document(path, document).await
    }

    /// Runs a read-modify-write cycle on one document while holding its path lock.
    ///
    /// Returns whatever `mutate` returns after the new document has been saved.
    pub async fn update<T, R, F>(&self, path: impl AsRef<Path>, mutate: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned + Default + Sync,
        F: FnOnce(&mut T) -> R + Send,
    {
        let path = path.as_ref();
        let lock = self.lock_for(path).await;
        let _guard = lock.lock().await;

        let mut document: T = load_document(path).await;
        let result = mutate(&mut document);
        save_document(path, &document).await?;
        Ok(result)
    }
}

async fn load_document<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("{} does not exist yet, using an empty document", path.display());
            return T::default();
        }
        Err(e) => {
            tracing::warn!("Failed to read {}: {e}", path.display());
            return T::default();
        }
    };

    if contents.trim().is_empty() {
        return T::default();
    }

    serde_json::from_str(&contents).unwrap_or_else(|e| {
        tracing::warn!("Failed to parse {}: {e}", path.display());
        T::default()
    })
}

async fn save_document<T: Serialize>(path: &Path, document: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(document)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    type Points = BTreeMap<String, i64>;

    #[tokio::test]
    async fn test_save_then_load_is_equal() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("userPoints.json");
        let store = RecordStore::new();

        let points: Points = [("A".to_string(), 1000), ("B".to_string(), 0)].into();
        store.save(&path, &points).await?;

        let loaded: Points = store.load(&path).await;
        assert_eq!(loaded, points);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_twice_without_save_is_equal() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("cooldowns.json");
        let store = RecordStore::new();
        store
            .save(&path, &Points::from([("A".to_string(), 5)]))
            .await?;

        let first: Points = store.load(&path).await;
        let second: Points = store.load(&path).await;
        assert_eq!(first, second);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_fails_soft() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = RecordStore::new();

        let missing: Points = store.load(dir.path().join("missing.json")).await;
        assert!(missing.is_empty());

        let corrupt_path = dir.path().join("corrupt.json");
        tokio::fs::write(&corrupt_path, "{ not json").await?;
        let corrupt: Points = store.load(&corrupt_path).await;
        assert!(corrupt.is_empty());

        let list: Vec<String> = store.load(&corrupt_path).await;
        assert!(list.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_updates_do_not_lose_writes() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("counter.json");
        let store = RecordStore::new();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = store.clone();
            let path = path.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update(&path, |points: &mut Points| {
                        *points.entry("A".to_string()).or_default() += 1;
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.map_err(|e| std::io::Error::other(e.to_string()))??;
        }

        let points: Points = store.load(&path).await;
        assert_eq!(points.get("A"), Some(&20));
        Ok(())
    }
}
