pub mod error;
pub mod export;
pub mod loyalty;
pub mod models;
pub mod store;

pub use error::StoreError;
pub use store::{OrderStore, UserStore};

use std::path::Path;

use anyhow::{Context, Result};

/// Open (or create) the data directory and both stores.
pub async fn open(data_dir: &Path) -> Result<(UserStore, OrderStore)> {
    tokio::fs::create_dir_all(data_dir)
        .await
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let users = UserStore::load(data_dir.join("users.json"))
        .await
        .context("Failed to load user store")?;
    let orders = OrderStore::load(data_dir.join("orders.json"))
        .await
        .context("Failed to load order store")?;

    Ok((users, orders))
}
