use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::persist_json;
use crate::error::StoreError;
use crate::models::UserAccount;

/// All user records, keyed by Telegram id, backed by one JSON document.
#[derive(Clone)]
pub struct UserStore {
    path: PathBuf,
    inner: Arc<RwLock<HashMap<i64, UserAccount>>>,
}

impl UserStore {
    /// Missing file means an empty store; anything unreadable is an error
    /// rather than a silent wipe.
    pub async fn load(path: PathBuf) -> Result<Self> {
        let map = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<HashMap<i64, UserAccount>>(&bytes)
                .with_context(|| format!("Failed to parse {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };
        debug!("Loaded {} user records from {}", map.len(), path.display());
        Ok(Self {
            path,
            inner: Arc::new(RwLock::new(map)),
        })
    }

    /// Read one record, applying lazy expiry. A record changed by
    /// normalization is written back so the invariant holds on disk too.
    pub async fn get(&self, tg_id: i64) -> Option<UserAccount> {
        let now = Utc::now();
        let mut map = self.inner.write().await;
        let user = map.get_mut(&tg_id)?;
        if user.normalize(now) {
            let snapshot = user.clone();
            if let Err(e) = persist_json(&self.path, &*map).await {
                warn!("Failed to persist normalized user {}: {}", tg_id, e);
            }
            return Some(snapshot);
        }
        Some(user.clone())
    }

    /// Create on first contact, refresh the profile fields otherwise.
    pub async fn upsert(
        &self,
        tg_id: i64,
        username: Option<&str>,
        full_name: Option<&str>,
    ) -> Result<UserAccount, StoreError> {
        let now = Utc::now();
        let mut map = self.inner.write().await;
        let user = map
            .entry(tg_id)
            .or_insert_with(|| UserAccount::new(tg_id, username, full_name, now));
        if username.is_some() {
            user.username = username.map(str::to_string);
        }
        if full_name.is_some() {
            user.full_name = full_name.map(str::to_string);
        }
        user.normalize(now);
        let snapshot = user.clone();
        persist_json(&self.path, &*map).await?;
        Ok(snapshot)
    }

    /// Atomic read-modify-write: the closure runs on a scratch copy under
    /// the write lock, so an `Err` leaves both memory and disk untouched,
    /// and no concurrent update can interleave.
    pub async fn update<T>(
        &self,
        tg_id: i64,
        f: impl FnOnce(&mut UserAccount) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let now = Utc::now();
        let mut map = self.inner.write().await;
        let user = map
            .get_mut(&tg_id)
            .ok_or_else(|| StoreError::not_found(format!("user {}", tg_id)))?;
        user.normalize(now);

        let mut scratch = user.clone();
        let out = f(&mut scratch)?;
        *user = scratch;
        persist_json(&self.path, &*map).await?;
        Ok(out)
    }

    /// Snapshot of every record, normalized but not written back.
    pub async fn all(&self) -> Vec<UserAccount> {
        let now = Utc::now();
        let map = self.inner.read().await;
        let mut users: Vec<UserAccount> = map
            .values()
            .map(|u| {
                let mut u = u.clone();
                u.normalize(now);
                u
            })
            .collect();
        users.sort_by_key(|u| u.created_at);
        users
    }

    pub async fn count(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn delete_all(&self) -> Result<usize, StoreError> {
        let mut map = self.inner.write().await;
        let removed = map.len();
        map.clear();
        persist_json(&self.path, &*map).await?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn store_in(dir: &tempfile::TempDir) -> UserStore {
        UserStore::load(dir.path().join("users.json")).await.unwrap()
    }

    #[tokio::test]
    async fn upsert_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        store.upsert(1, Some("alice"), Some("Alice")).await.unwrap();
        let user = store.get(1).await.unwrap();
        assert_eq!(user.username.as_deref(), Some("alice"));
        assert_eq!(store.count().await, 1);
        assert!(store.get(2).await.is_none());
    }

    #[tokio::test]
    async fn committed_updates_survive_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");

        let store = UserStore::load(path.clone()).await.unwrap();
        store.upsert(7, None, None).await.unwrap();
        store
            .update(7, |u| {
                u.points = 350;
                Ok(())
            })
            .await
            .unwrap();

        let reloaded = UserStore::load(path).await.unwrap();
        assert_eq!(reloaded.get(7).await.unwrap().points, 350);
    }

    #[tokio::test]
    async fn failed_update_leaves_memory_and_disk_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");

        let store = UserStore::load(path.clone()).await.unwrap();
        store.upsert(7, None, None).await.unwrap();
        store.update(7, |u| { u.points = 100; Ok(()) }).await.unwrap();

        let res: Result<(), StoreError> = store
            .update(7, |u| {
                u.points = 0;
                Err(StoreError::validation("nope"))
            })
            .await;
        assert!(res.is_err());
        assert_eq!(store.get(7).await.unwrap().points, 100);

        let reloaded = UserStore::load(path).await.unwrap();
        assert_eq!(reloaded.get(7).await.unwrap().points, 100);
    }

    #[tokio::test]
    async fn update_of_unknown_user_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;
        let res = store.update(99, |_| Ok(())).await;
        assert!(matches!(res, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn normalization_on_read_persists_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");

        let store = UserStore::load(path.clone()).await.unwrap();
        store.upsert(5, None, None).await.unwrap();
        store
            .update(5, |u| {
                u.vip_tier = crate::models::VipTier::Bronze;
                u.vip_until = Some(Utc::now() - Duration::seconds(1));
                Ok(())
            })
            .await
            .unwrap();

        let user = store.get(5).await.unwrap();
        assert_eq!(user.vip_tier, crate::models::VipTier::None);

        let reloaded = UserStore::load(path).await.unwrap();
        assert_eq!(
            reloaded.get(5).await.unwrap().vip_tier,
            crate::models::VipTier::None
        );
    }

    #[tokio::test]
    async fn delete_all_empties_store_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");

        let store = UserStore::load(path.clone()).await.unwrap();
        store.upsert(1, None, None).await.unwrap();
        store.upsert(2, None, None).await.unwrap();
        assert_eq!(store.delete_all().await.unwrap(), 2);
        assert_eq!(store.count().await, 0);

        let reloaded = UserStore::load(path).await.unwrap();
        assert_eq!(reloaded.count().await, 0);
    }
}
