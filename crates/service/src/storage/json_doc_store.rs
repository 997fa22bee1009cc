use std::{collections::HashMap, hash::Hash, path::PathBuf, sync::Arc, time::Duration};
use tokio::{fs, sync::RwLock, time::timeout};
use tracing::warn;

use crate::errors::ServiceError;

/// Upper bound on a single persistence round trip.
const PERSIST_TIMEOUT: Duration = Duration::from_secs(5);

/// Generic JSON file-backed document store.
///
/// Persists a `HashMap<K, V>` to a single JSON file and provides lookup and
/// upsert helpers. Upserts persist while the write lock is still held, so
/// concurrent mutations of the same key are serialized and none are lost.
#[derive(Clone)]
pub struct JsonDocStore<K, V> {
    inner: Arc<RwLock<HashMap<K, V>>>,
    file_path: PathBuf,
}

impl<K, V> JsonDocStore<K, V>
where
    K: Eq + Hash + serde::Serialize + serde::de::DeserializeOwned + Clone,
    V: serde::Serialize + serde::de::DeserializeOwned + Clone,
{
    /// Initialize the store from a path. Creates the file with an empty map if
    /// missing; an unreadable or corrupt file starts the store empty.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.ok();
        }

        let map: HashMap<K, V> = match fs::read(&file_path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %file_path.display(), error = %e, "store file unreadable, starting empty");
                    HashMap::new()
                }
            },
            Err(_) => {
                let empty: HashMap<K, V> = HashMap::new();
                fs::write(
                    &file_path,
                    serde_json::to_vec(&empty).map_err(|e| ServiceError::storage(e.to_string()))?,
                )
                .await
                .map_err(|e| ServiceError::storage(e.to_string()))?;
                empty
            }
        };

        Ok(Arc::new(Self {
            inner: Arc::new(RwLock::new(map)),
            file_path,
        }))
    }

    async fn persist(&self, map: &HashMap<K, V>) -> Result<(), ServiceError> {
        let data = serde_json::to_vec(map).map_err(|e| ServiceError::storage(e.to_string()))?;
        match timeout(PERSIST_TIMEOUT, fs::write(&self.file_path, data)).await {
            Ok(res) => res.map_err(|e| ServiceError::storage(e.to_string())),
            Err(_) => Err(ServiceError::storage(format!(
                "timed out writing {}",
                self.file_path.display()
            ))),
        }
    }

    /// Get the document stored under `key`.
    pub async fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read().await;
        map.get(key).cloned()
    }

    /// Whether a document exists for `key`, even an empty one.
    pub async fn contains_key(&self, key: &K) -> bool {
        let map = self.inner.read().await;
        map.contains_key(key)
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        let map = self.inner.read().await;
        map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Insert or update the document for `key` and persist.
    ///
    /// The closure receives the current document (`None` when absent) and
    /// returns the document to store. Persistence happens before the write
    /// lock is released: a second upsert for the same key cannot start until
    /// this one has reached disk, so racing updates are applied one after the
    /// other instead of overwriting each other.
    pub async fn upsert<F>(&self, key: K, f: F) -> Result<V, ServiceError>
    where
        F: FnOnce(Option<V>) -> V,
    {
        let mut map = self.inner.write().await;
        let current = map.remove(&key);
        let value = f(current);
        map.insert(key, value.clone());
        self.persist(&map).await?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn json_doc_store_upsert_persists() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("json_doc_store_{}.json", uuid::Uuid::new_v4()));
        let store = JsonDocStore::<String, Vec<String>>::new(&tmp).await?;

        // initially empty
        assert!(store.is_empty().await);
        assert_eq!(store.get(&"a".to_string()).await, None);

        // upsert creates the document
        let v = store
            .upsert("a".to_string(), |cur| {
                let mut v = cur.unwrap_or_default();
                v.push("1".to_string());
                v
            })
            .await?;
        assert_eq!(v, vec!["1".to_string()]);

        // upsert extends the existing document
        let v = store
            .upsert("a".to_string(), |cur| {
                let mut v = cur.unwrap_or_default();
                v.push("2".to_string());
                v
            })
            .await?;
        assert_eq!(v, vec!["1".to_string(), "2".to_string()]);
        assert_eq!(store.len().await, 1);
        assert!(store.contains_key(&"a".to_string()).await);

        // reload from disk to ensure persistence
        let reloaded = JsonDocStore::<String, Vec<String>>::new(&tmp).await?;
        assert_eq!(
            reloaded.get(&"a".to_string()).await,
            Some(vec!["1".to_string(), "2".to_string()])
        );

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("json_doc_store_{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, b"{not json").await?;

        let store = JsonDocStore::<String, Vec<String>>::new(&tmp).await?;
        assert!(store.is_empty().await);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_upserts_on_one_key_both_apply() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("json_doc_store_{}.json", uuid::Uuid::new_v4()));
        let store = JsonDocStore::<String, Vec<String>>::new(&tmp).await?;

        let push = |coin: &'static str| {
            let store = store.clone();
            async move {
                store
                    .upsert("k".to_string(), |cur| {
                        let mut v = cur.unwrap_or_default();
                        v.push(coin.to_string());
                        v
                    })
                    .await
            }
        };

        let (a, b) = tokio::join!(push("x"), push("y"));
        a?;
        b?;

        let v = store.get(&"k".to_string()).await.unwrap_or_default();
        assert_eq!(v.len(), 2);
        assert!(v.contains(&"x".to_string()));
        assert!(v.contains(&"y".to_string()));

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }
}
