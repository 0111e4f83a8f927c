use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// Multi-step admin flows, keyed by the admin's Telegram id. Held in memory
/// only; a restart drops any in-progress flow. Entries expire so an admin
/// who wandered off does not have a stale broadcast armed days later.
#[derive(Debug, Clone)]
pub enum AdminFlow {
    /// `/broadcast` was issued; the next message is the draft text.
    BroadcastCompose,
    /// Draft captured, awaiting the confirm/cancel button.
    BroadcastConfirm { text: String },
}

#[derive(Clone)]
pub struct AdminFlows {
    inner: Arc<RwLock<HashMap<i64, (AdminFlow, Instant)>>>,
    ttl: Duration,
}

impl AdminFlows {
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(600))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn set(&self, admin_id: i64, flow: AdminFlow) {
        let mut map = self.inner.write().await;
        map.insert(admin_id, (flow, Instant::now()));
    }

    /// Remove and return the pending flow, unless it has expired.
    pub async fn take(&self, admin_id: i64) -> Option<AdminFlow> {
        let mut map = self.inner.write().await;
        let (flow, started) = map.remove(&admin_id)?;
        if started.elapsed() > self.ttl {
            return None;
        }
        Some(flow)
    }

    pub async fn clear(&self, admin_id: i64) {
        self.inner.write().await.remove(&admin_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_take_consumes_the_flow() {
        let flows = AdminFlows::new();
        flows.set(1, AdminFlow::BroadcastCompose).await;
        assert!(matches!(
            flows.take(1).await,
            Some(AdminFlow::BroadcastCompose)
        ));
        assert!(flows.take(1).await.is_none());
    }

    #[tokio::test]
    async fn expired_flows_are_dropped() {
        let flows = AdminFlows::with_ttl(Duration::from_millis(10));
        flows.set(1, AdminFlow::BroadcastCompose).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(flows.take(1).await.is_none());
    }

    #[tokio::test]
    async fn flows_are_per_admin() {
        let flows = AdminFlows::new();
        flows
            .set(1, AdminFlow::BroadcastConfirm { text: "hello".into() })
            .await;
        assert!(flows.take(2).await.is_none());
        assert!(flows.take(1).await.is_some());
    }
}
