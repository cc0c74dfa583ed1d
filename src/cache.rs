//! Key-value cache store with store-managed expiry
//!
//! The store only deals in bytes; callers own the encoding of their values.

use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use fjall::Keyspace;
use serde::{Deserialize, Serialize};
use tokio::task;

use crate::{BikecastError, Result};

/// Outcome of a cache read. A miss is an expected answer, not an error.
#[derive(Debug)]
pub enum CacheLookup {
    Hit(Vec<u8>),
    Miss,
    Failure(BikecastError),
}

/// A shared get/set store whose entries expire on their own after a TTL.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn read(&self, key: &str) -> CacheLookup;

    async fn write(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;
}

#[async_trait]
impl<T: CacheStore + ?Sized> CacheStore for Arc<T> {
    async fn read(&self, key: &str) -> CacheLookup {
        (**self).read(key).await
    }

    async fn write(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        (**self).write(key, value, ttl).await
    }
}

#[derive(Serialize, Deserialize)]
struct StoredEntry {
    value: Vec<u8>,
    expires_at: u64, // Unix timestamp (seconds)
}

/// On-disk cache backed by a `fjall` keyspace
pub struct PersistentCache {
    store: Keyspace,
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> Result<Option<Vec<u8>>> {
    let value = store
        .get(key)
        .map_err(|e| BikecastError::cache_read(e.to_string()))?;
    Ok(value.map(|v| v.to_vec()))
}

fn unix_now() -> Result<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| BikecastError::cache_read(format!("System clock before epoch: {e}")))
}

impl PersistentCache {
    /// Opens (or creates) the cache database under `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(path.as_ref())
            .open()
            .map_err(|e| BikecastError::cache_read(format!("Failed to open cache database: {e}")))?;
        let items = db
            .keyspace("cache", fjall::KeyspaceCreateOptions::default)
            .map_err(|e| BikecastError::cache_read(format!("Failed to open cache keyspace: {e}")))?;
        Ok(PersistentCache { store: items })
    }

    async fn lookup(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let store = self.store.clone();
        let key_bytes = key.as_bytes().to_vec();

        let maybe_bytes = task::spawn_blocking(move || get_from_store(store, key_bytes))
            .await
            .map_err(|e| BikecastError::cache_read(e.to_string()))??;

        let Some(bytes) = maybe_bytes else {
            tracing::debug!("Key not found");
            return Ok(None);
        };

        let entry: StoredEntry = postcard::from_bytes(&bytes)
            .map_err(|e| BikecastError::cache_read(format!("Corrupt entry for '{key}': {e}")))?;

        if unix_now()? < entry.expires_at {
            tracing::debug!("Key found and still fresh");
            Ok(Some(entry.value))
        } else {
            // Left in place; the next write overwrites it.
            tracing::debug!("Key found but expired");
            Ok(None)
        }
    }
}

#[async_trait]
impl CacheStore for PersistentCache {
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    async fn read(&self, key: &str) -> CacheLookup {
        match self.lookup(key).await {
            Ok(Some(bytes)) => CacheLookup::Hit(bytes),
            Ok(None) => CacheLookup::Miss,
            Err(err) => CacheLookup::Failure(err),
        }
    }

    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    async fn write(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        let expires_at = SystemTime::now()
            .checked_add(ttl)
            .ok_or_else(|| BikecastError::cache_write("TTL overflow"))?
            .duration_since(UNIX_EPOCH)
            .map_err(|e| BikecastError::cache_write(e.to_string()))?
            .as_secs();
        let entry = StoredEntry { value, expires_at };
        let bytes =
            postcard::to_stdvec(&entry).map_err(|e| BikecastError::cache_write(e.to_string()))?;

        task::spawn_blocking(move || store.insert(key, bytes))
            .await
            .map_err(|e| BikecastError::cache_write(e.to_string()))?
            .map_err(|e| BikecastError::cache_write(e.to_string()))?;
        Ok(())
    }
}

impl Debug for PersistentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentCache").finish_non_exhaustive()
    }
}
