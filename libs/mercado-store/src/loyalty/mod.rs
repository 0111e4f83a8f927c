//! The scratch-ticket reward engine and the loyalty point exchange.
//!
//! Everything here is pure over its inputs: the caller supplies the clock
//! value and the random source, so the whole engine is deterministic under
//! test. The bot runs these functions inside a store `update` closure so the
//! read-check-mutate sequence is atomic per user.

pub mod applicator;
pub mod catalog;
pub mod cooldown;
pub mod exchange;
pub mod selector;
pub mod vip;

pub use applicator::{apply_reward, scratch_ticket, AppliedReward, TicketOutcome};
pub use catalog::{catalog_for, CatalogEntry, RewardKind};
pub use cooldown::{time_until_next_draw, TICKET_COOLDOWN_DAYS};
pub use exchange::{redeem_points, REDEEM_COST_LARGE, REDEEM_COST_SMALL};
pub use vip::{benefits_for, VipBenefits};
