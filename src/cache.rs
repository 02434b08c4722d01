use anyhow::{Result, anyhow};
use fjall::Keyspace;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task;

use crate::FoodieTourError;

// `expires_at` leads so the header decodes without knowing `T`
#[derive(Serialize, Deserialize)]
struct StoredEntry<T> {
    expires_at: u64, // Unix timestamp (seconds)
    value: T,
}

type MemoryMap = HashMap<String, Vec<u8>>;

enum Store {
    Memory(Mutex<MemoryMap>),
    Disk(Keyspace),
}

/// TTL cache shared by the lookup clients.
///
/// Entries are postcard-encoded so one store can hold weather, coordinates and
/// image URLs side by side. Cloning is cheap and clones share the same store.
#[derive(Clone)]
pub struct Cache {
    store: Arc<Store>,
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> anyhow::Result<Option<Vec<u8>>> {
    Ok(store.get(key)?.map(|v| v.to_vec()))
}

fn lock_memory(map: &Mutex<MemoryMap>) -> Result<MutexGuard<'_, MemoryMap>> {
    Ok(map
        .lock()
        .map_err(|_| FoodieTourError::cache("Cache lock poisoned"))?)
}

fn get_from_memory(map: &Mutex<MemoryMap>, key: &str) -> Result<Option<Vec<u8>>> {
    Ok(lock_memory(map)?.get(key).cloned())
}

fn unix_now() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

/// Unreadable headers count as expired
fn is_expired(bytes: &[u8], now: u64) -> bool {
    !postcard::take_from_bytes::<u64>(bytes).is_ok_and(|(expires_at, _)| now < expires_at)
}

impl Cache {
    /// Cache that lives as long as the process
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(Store::Memory(Mutex::new(HashMap::new()))),
        }
    }

    /// Cache backed by an on-disk keyspace at `path`
    pub fn persistent(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(&path).open()?;
        let items = db.keyspace("cache", fjall::KeyspaceCreateOptions::default)?;
        Ok(Self {
            store: Arc::new(Store::Disk(items)),
        })
    }

    /// Builds the cache described by `location`, in memory when it is empty.
    pub fn from_location(location: &str) -> Result<Self> {
        if location.trim().is_empty() {
            Ok(Self::in_memory())
        } else {
            Self::persistent(location)
        }
    }

    /// Stores a serializable value with a time-to-live (TTL).
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self))]
    pub async fn put<T: Serialize + Send + Debug + 'static>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> Result<()> {
        let expires_at = SystemTime::now()
            .checked_add(ttl)
            .ok_or(anyhow!("TTL overflow"))?
            .duration_since(UNIX_EPOCH)?
            .as_secs();
        let entry = StoredEntry { expires_at, value };
        let bytes = postcard::to_stdvec(&entry)?;

        match self.store.as_ref() {
            Store::Memory(map) => {
                let now = unix_now()?;
                let mut map = lock_memory(map)?;
                let before = map.len();
                map.retain(|_, stored| !is_expired(stored, now));
                if map.len() < before {
                    tracing::debug!("Swept {} expired entries", before - map.len());
                }
                map.insert(key.to_string(), bytes);
            }
            Store::Disk(store) => {
                let store = store.clone();
                let key = key.as_bytes().to_vec();
                task::spawn_blocking(move || store.insert(key, bytes)).await??;
            }
        }
        Ok(())
    }

    /// Retrieves a value if it exists and has not expired.
    /// Returns `None` for cache misses or expired entries.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub async fn get<T: DeserializeOwned + Send + 'static>(&self, key: &str) -> Result<Option<T>> {
        let maybe_bytes: Option<Vec<u8>> = match self.store.as_ref() {
            Store::Memory(map) => get_from_memory(map, key)?,
            Store::Disk(store) => {
                let store = store.clone();
                let key_bytes = key.as_bytes().to_vec();
                task::spawn_blocking(move || get_from_store(store, key_bytes)).await??
            }
        };

        if let Some(bytes) = maybe_bytes {
            let entry: StoredEntry<T> = postcard::from_bytes(&bytes)?;
            let now = unix_now()?;

            if now < entry.expires_at {
                tracing::debug!("Key found and still fresh");
                Ok(Some(entry.value))
            } else {
                tracing::debug!("Key found but expired");
                self.remove(key).await?;
                Ok(None)
            }
        } else {
            tracing::debug!("Key not found");
            Ok(None)
        }
    }

    /// Manually removes a key from the cache.
    pub async fn remove(&self, key: &str) -> Result<()> {
        match self.store.as_ref() {
            Store::Memory(map) => {
                lock_memory(map)?.remove(key);
            }
            Store::Disk(store) => {
                let key = key.as_bytes().to_vec();
                let store = store.clone();
                task::spawn_blocking(move || store.remove(key)).await??;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_put_and_get() {
        let cache = Cache::in_memory();
        cache
            .put("weather:paris", (18.0_f64, "Partly cloudy".to_string()), Duration::from_secs(60))
            .await
            .unwrap();

        let hit: Option<(f64, String)> = cache.get("weather:paris").await.unwrap();
        assert_eq!(hit, Some((18.0, "Partly cloudy".to_string())));

        let miss: Option<(f64, String)> = cache.get("weather:tokyo").await.unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_dropped() {
        let cache = Cache::in_memory();
        cache
            .put("image:croissant", Some("https://img".to_string()), Duration::ZERO)
            .await
            .unwrap();

        let value: Option<Option<String>> = cache.get("image:croissant").await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_clones_share_store() {
        let cache = Cache::in_memory();
        let other = cache.clone();
        cache.put("k", 7_u32, Duration::from_secs(60)).await.unwrap();
        assert_eq!(other.get::<u32>("k").await.unwrap(), Some(7));

        other.remove("k").await.unwrap();
        assert_eq!(cache.get::<u32>("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_persistent_backend() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::persistent(dir.path()).unwrap();
        cache
            .put("geocode:louvre|paris", Some((48.86_f64, 2.33_f64)), Duration::from_secs(60))
            .await
            .unwrap();

        let value: Option<Option<(f64, f64)>> = cache.get("geocode:louvre|paris").await.unwrap();
        assert_eq!(value, Some(Some((48.86, 2.33))));
    }

    fn memory_keys(cache: &Cache) -> Vec<String> {
        match cache.store.as_ref() {
            Store::Memory(map) => {
                let mut keys: Vec<String> = map.lock().unwrap().keys().cloned().collect();
                keys.sort();
                keys
            }
            Store::Disk(_) => panic!("expected an in-memory cache"),
        }
    }

    #[tokio::test]
    async fn test_put_sweeps_expired_entries_never_read() {
        let cache = Cache::in_memory();
        cache.put("stale:a", 1_u32, Duration::ZERO).await.unwrap();
        cache.put("stale:b", "old".to_string(), Duration::ZERO).await.unwrap();
        assert_eq!(memory_keys(&cache), vec!["stale:b"]);

        cache.put("fresh", 2_u32, Duration::from_secs(60)).await.unwrap();
        assert_eq!(memory_keys(&cache), vec!["fresh"]);
        assert_eq!(cache.get::<u32>("fresh").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_poisoned_lock_is_a_cache_error() {
        let cache = Cache::in_memory();
        if let Store::Memory(map) = cache.store.as_ref() {
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                let _guard = map.lock().unwrap();
                panic!("poison the cache lock");
            }));
        }

        let err = cache.get::<u32>("k").await.unwrap_err();
        let typed = err.downcast::<FoodieTourError>().unwrap();
        assert!(matches!(typed, FoodieTourError::Cache { .. }));
        assert!(cache.put("k", 1_u32, Duration::from_secs(60)).await.is_err());
    }

    #[test]
    fn test_from_location_defaults_to_memory() {
        let cache = Cache::from_location("  ").unwrap();
        assert!(matches!(cache.store.as_ref(), Store::Memory(_)));
    }
}
