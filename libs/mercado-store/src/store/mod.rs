//! Flat-file JSON persistence with the lost-update race closed: every
//! read-modify-write runs under the store's write lock, and every commit
//! lands on disk via write-to-temp-then-rename.

mod order_store;
mod user_store;

pub use order_store::OrderStore;
pub use user_store::UserStore;

use std::path::Path;

/// Serialize to a sibling `.tmp` file, then atomically rename over the
/// target so a crash mid-write never leaves a torn store file.
pub(crate) async fn persist_json<T: serde::Serialize>(
    path: &Path,
    value: &T,
) -> Result<(), crate::StoreError> {
    let data = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &data).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
