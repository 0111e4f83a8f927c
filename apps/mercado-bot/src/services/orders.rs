use chrono::Utc;
use teloxide::prelude::*;
use tracing::info;

use mercado_store::loyalty::vip::points_for_order;
use mercado_store::models::{Order, OrderStatus};
use mercado_store::StoreError;

use crate::services::broadcast::notify_user;
use crate::state::AppState;

/// Set an order's status. Transitions are admin-driven and deliberately
/// unconstrained; any status may replace any other. The first transition
/// into `Delivered` credits loyalty points (base + VIP bonus) and notifies
/// the customer fire-and-forget.
pub async fn set_status(
    bot: &Bot,
    state: &AppState,
    order_id: &str,
    status: OrderStatus,
) -> Result<Order, StoreError> {
    let (order, credit) = state
        .orders
        .update(order_id, |order| {
            order.status = status;
            order.updated_at = Utc::now();
            let credit = status == OrderStatus::Delivered && !order.points_credited;
            if credit {
                order.points_credited = true;
            }
            Ok((order.clone(), credit))
        })
        .await?;

    if credit {
        let earned = state
            .users
            .update(order.user_id, |user| {
                let earned = points_for_order(order.amount, user.vip_tier);
                user.points += earned;
                Ok(earned)
            })
            .await;

        match earned {
            Ok(earned) if earned > 0 => {
                info!(
                    "Order {} delivered, credited {} points to {}",
                    order.id, earned, order.user_id
                );
                notify_user(
                    bot,
                    order.user_id,
                    &format!(
                        "📦 Your order <code>{}</code> was delivered!\n⭐ You earned <b>{} points</b> — check your account to redeem them.",
                        order.id, earned
                    ),
                )
                .await;
            }
            Ok(_) => {}
            // The order record is already committed; a missing user record
            // only costs the bonus points.
            Err(e) => info!("Could not credit points for order {}: {}", order.id, e),
        }
    }

    Ok(order)
}

/// Render one order as a status line for chat.
pub fn status_line(order: &Order) -> String {
    let icon = match order.status {
        OrderStatus::Pending => "⏳",
        OrderStatus::Confirmed => "✅",
        OrderStatus::Preparing => "👨‍🍳",
        OrderStatus::OutForDelivery => "🚚",
        OrderStatus::Delivered => "📦",
        OrderStatus::Canceled => "❌",
    };
    format!(
        "{} <code>{}</code> — ${:.2} — {} ({})",
        icon,
        order.id,
        order.amount,
        order.status,
        order.updated_at.format("%Y-%m-%d %H:%M")
    )
}
