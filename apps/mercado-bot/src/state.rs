use mercado_store::{OrderStore, UserStore};

use crate::services::admin_flows::AdminFlows;
use crate::services::rate_limit::RateLimiter;

/// External links shown on the main menu; unset ones are simply omitted.
#[derive(Clone, Default)]
pub struct Links {
    pub shop: Option<String>,
    pub channel: Option<String>,
    pub support: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub users: UserStore,
    pub orders: OrderStore,
    pub admin_id: Option<i64>,
    pub welcome_image: Option<String>,
    pub links: Links,
    pub flows: AdminFlows,
    pub limiter: RateLimiter,
}

impl AppState {
    /// All privileged operations gate on exact match against the single
    /// configured admin identifier.
    pub fn is_admin(&self, tg_id: i64) -> bool {
        self.admin_id == Some(tg_id)
    }
}
