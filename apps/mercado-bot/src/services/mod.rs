pub mod admin_flows;
pub mod broadcast;
pub mod orders;
pub mod rate_limit;
