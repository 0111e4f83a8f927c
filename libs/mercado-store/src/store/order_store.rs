use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use super::persist_json;
use crate::error::StoreError;
use crate::models::{Order, OrderStatus};

/// Append-only order list with in-place status mutation by id lookup.
#[derive(Clone)]
pub struct OrderStore {
    path: PathBuf,
    inner: Arc<RwLock<Vec<Order>>>,
}

impl OrderStore {
    pub async fn load(path: PathBuf) -> Result<Self> {
        let orders = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Vec<Order>>(&bytes)
                .with_context(|| format!("Failed to parse {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };
        debug!("Loaded {} orders from {}", orders.len(), path.display());
        Ok(Self {
            path,
            inner: Arc::new(RwLock::new(orders)),
        })
    }

    pub async fn create(
        &self,
        user_id: i64,
        amount: f64,
        note: Option<String>,
    ) -> Result<Order, StoreError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(StoreError::validation("order amount must be positive"));
        }
        let order = Order::new(user_id, amount, note, Utc::now());
        let mut orders = self.inner.write().await;
        orders.push(order.clone());
        persist_json(&self.path, &*orders).await?;
        Ok(order)
    }

    pub async fn get(&self, id: &str) -> Option<Order> {
        let orders = self.inner.read().await;
        orders.iter().find(|o| o.id.eq_ignore_ascii_case(id)).cloned()
    }

    pub async fn all(&self) -> Vec<Order> {
        self.inner.read().await.clone()
    }

    pub async fn for_user(&self, user_id: i64) -> Vec<Order> {
        self.inner
            .read()
            .await
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn count(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn count_with_status(&self, status: OrderStatus) -> usize {
        self.inner
            .read()
            .await
            .iter()
            .filter(|o| o.status == status)
            .count()
    }

    /// Same atomic read-modify-write contract as the user store.
    pub async fn update<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Order) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut orders = self.inner.write().await;
        let order = orders
            .iter_mut()
            .find(|o| o.id.eq_ignore_ascii_case(id))
            .ok_or_else(|| StoreError::not_found(format!("order {}", id)))?;

        let mut scratch = order.clone();
        let out = f(&mut scratch)?;
        *order = scratch;
        persist_json(&self.path, &*orders).await?;
        Ok(out)
    }
}
