use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::collections::CollectionStore;
use crate::errors::ServiceError;
use crate::storage::json_doc_store::JsonDocStore;

/// One persisted record per user: the user id and its ordered coin sequence.
/// `coins` is never null in a stored record; a user without a record simply
/// reads as an empty sequence until the first write materializes one.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserCollection {
    pub user_id: String,
    pub coins: Vec<String>,
}

impl UserCollection {
    fn empty(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            coins: Vec::new(),
        }
    }
}

/// File-backed store of per-user coin collections.
/// Keeps a map of `user_id -> UserCollection` persisted as JSON.
#[derive(Clone)]
pub struct FileCollectionStore {
    store: Arc<JsonDocStore<String, UserCollection>>,
}

impl FileCollectionStore {
    /// Initialize the store from the given file path. Creates the file if missing.
    pub async fn new<P: Into<std::path::PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let store = JsonDocStore::<String, UserCollection>::new(path).await?;
        Ok(Arc::new(Self { store }))
    }

    /// Whether a record has been materialized for the user, even an empty one.
    pub async fn has_record(&self, user_id: &str) -> bool {
        self.store.contains_key(&user_id.to_string()).await
    }
}

#[async_trait::async_trait]
impl CollectionStore for FileCollectionStore {
    async fn get(&self, user_id: &str) -> Result<Vec<String>, ServiceError> {
        Ok(self
            .store
            .get(&user_id.to_string())
            .await
            .map(|rec| rec.coins)
            .unwrap_or_default())
    }

    async fn append(&self, user_id: &str, coin: String) -> Result<Vec<String>, ServiceError> {
        if coin.is_empty() {
            return Err(ServiceError::validation("coin must be a non-empty string"));
        }
        let rec = self
            .store
            .upsert(user_id.to_string(), |cur| {
                let mut rec = cur.unwrap_or_else(|| UserCollection::empty(user_id));
                rec.coins.push(coin);
                rec
            })
            .await?;
        Ok(rec.coins)
    }

    async fn replace(&self, user_id: &str, coins: Vec<String>) -> Result<Vec<String>, ServiceError> {
        let rec = self
            .store
            .upsert(user_id.to_string(), |_| UserCollection {
                user_id: user_id.to_string(),
                coins,
            })
            .await?;
        Ok(rec.coins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    async fn temp_store() -> (Arc<FileCollectionStore>, std::path::PathBuf) {
        let tmp = std::env::temp_dir().join(format!("coin_store_{}.json", Uuid::new_v4()));
        let store = FileCollectionStore::new(&tmp).await.expect("store init");
        (store, tmp)
    }

    #[tokio::test]
    async fn unknown_user_reads_empty() -> Result<(), anyhow::Error> {
        let (store, tmp) = temp_store().await;
        assert_eq!(store.get("bob").await?, Vec::<String>::new());
        assert!(!store.has_record("bob").await);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn append_keeps_insertion_order() -> Result<(), anyhow::Error> {
        let (store, tmp) = temp_store().await;

        let coins = store.append("alice", "gold".into()).await?;
        assert_eq!(coins, vec!["gold".to_string()]);

        let coins = store.append("alice", "silver".into()).await?;
        assert_eq!(coins, vec!["gold".to_string(), "silver".to_string()]);

        // last element is the most recent append
        let coins = store.get("alice").await?;
        assert_eq!(coins.last().map(String::as_str), Some("silver"));

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn empty_coin_is_rejected_and_state_untouched() -> Result<(), anyhow::Error> {
        let (store, tmp) = temp_store().await;

        let err = store.append("alice", String::new()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(store.get("alice").await?, Vec::<String>::new());
        assert!(!store.has_record("alice").await);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn replace_overwrites_exactly() -> Result<(), anyhow::Error> {
        let (store, tmp) = temp_store().await;

        store.append("alice", "gold".into()).await?;
        let coins = store
            .replace("alice", vec!["silver".into(), "bronze".into()])
            .await?;
        assert_eq!(coins, vec!["silver".to_string(), "bronze".to_string()]);
        assert_eq!(store.get("alice").await?, coins);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn replace_with_empty_keeps_the_record() -> Result<(), anyhow::Error> {
        let (store, tmp) = temp_store().await;

        store.append("alice", "gold".into()).await?;
        let coins = store.replace("alice", Vec::new()).await?;
        assert_eq!(coins, Vec::<String>::new());
        assert_eq!(store.get("alice").await?, Vec::<String>::new());
        assert!(store.has_record("alice").await);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn replace_creates_the_record_when_absent() -> Result<(), anyhow::Error> {
        let (store, tmp) = temp_store().await;

        let coins = store.replace("carol", vec!["gold".into()]).await?;
        assert_eq!(coins, vec!["gold".to_string()]);
        assert!(store.has_record("carol").await);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_appends_both_survive() -> Result<(), anyhow::Error> {
        let (store, tmp) = temp_store().await;

        let (a, b) = tokio::join!(
            store.append("alice", "x".into()),
            store.append("alice", "y".into())
        );
        a?;
        b?;

        let coins = store.get("alice").await?;
        assert_eq!(coins.len(), 2);
        assert!(coins.contains(&"x".to_string()));
        assert!(coins.contains(&"y".to_string()));

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn reopened_store_sees_prior_writes() -> Result<(), anyhow::Error> {
        let (store, tmp) = temp_store().await;

        store.append("alice", "gold".into()).await?;
        store.replace("bob", vec!["silver".into()]).await?;

        let reopened = FileCollectionStore::new(&tmp).await?;
        assert_eq!(reopened.get("alice").await?, vec!["gold".to_string()]);
        assert_eq!(reopened.get("bob").await?, vec!["silver".to_string()]);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }
}
