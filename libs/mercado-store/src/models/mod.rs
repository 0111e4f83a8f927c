pub mod discount;
pub mod order;
pub mod user;

pub use discount::{DiscountGrant, DiscountKind, GrantSource};
pub use order::{Order, OrderStatus};
pub use user::{TicketRecord, UserAccount, VipTier};
