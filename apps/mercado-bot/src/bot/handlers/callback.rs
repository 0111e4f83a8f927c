use chrono::Utc;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, ChatId, ParseMode};
use tracing::{error, info};

use mercado_store::loyalty::{
    benefits_for, redeem_points, time_until_next_draw, REDEEM_COST_LARGE, REDEEM_COST_SMALL,
};
use mercado_store::models::{OrderStatus, UserAccount};
use mercado_store::StoreError;

use crate::bot::handlers::command::WELCOME_TEXT;
use crate::bot::handlers::ticket;
use crate::bot::keyboards::{account_keyboard, info_keyboard, main_menu, rewards_keyboard};
use crate::bot::utils::{escape_html, format_wait};
use crate::services::admin_flows::AdminFlow;
use crate::services::broadcast::broadcast_to_all;
use crate::services::orders::{set_status, status_line};
use crate::state::AppState;

const INFO_TEXT: &str = "ℹ️ <b>Shop info</b>\n\nPick a topic below.";

const DELIVERY_TEXT: &str = "🚚 <b>Delivery</b>\n\n\
    We deliver across the whole region.\n\
    ⚠️ A minimum order is required for delivery; details in the shop.";

const MEETUP_TEXT: &str = "🏠 <b>Meetup</b>\n\n\
    Pickup is available in the local area only — arrange a slot through \
    the shop before heading out.";

pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    state: AppState,
) -> Result<(), teloxide::RequestError> {
    let callback_id = q.id.clone();
    let tg_id = q.from.id.0 as i64;

    // The coarse per-user guard runs before anything else.
    if !state.limiter.check(tg_id).await {
        let _ = bot
            .answer_callback_query(callback_id)
            .text("⏳ Too fast — give it a second.")
            .await;
        return Ok(());
    }

    let Some(data) = q.data.clone() else {
        let _ = bot.answer_callback_query(callback_id).await;
        return Ok(());
    };
    info!("Received callback: {}", data);

    let chat_id = q
        .message
        .as_ref()
        .map(|m| m.chat().id)
        .unwrap_or(ChatId(tg_id));

    match data.as_str() {
        "info" => {
            let _ = bot.answer_callback_query(callback_id).await;
            edit_panel(&bot, &q, INFO_TEXT, info_keyboard()).await;
        }

        "back_home" => {
            let _ = bot.answer_callback_query(callback_id).await;
            edit_panel(&bot, &q, WELCOME_TEXT, main_menu(&state.links)).await;
        }

        "info_delivery" => {
            let _ = bot.answer_callback_query(callback_id).await;
            let _ = bot
                .send_message(chat_id, DELIVERY_TEXT)
                .parse_mode(ParseMode::Html)
                .await;
        }

        "info_meetup" => {
            let _ = bot.answer_callback_query(callback_id).await;
            let _ = bot
                .send_message(chat_id, MEETUP_TEXT)
                .parse_mode(ParseMode::Html)
                .await;
        }

        "share" => {
            let _ = bot.answer_callback_query(callback_id).await;
            let mut text = String::from("🔗 <b>Share our official links</b>\n");
            if let Some(channel) = &state.links.channel {
                text.push_str(&format!("\n📣 Channel:\n{}", escape_html(channel)));
            }
            if let Some(shop) = &state.links.shop {
                text.push_str(&format!("\n\n🛒 Shop:\n{}", escape_html(shop)));
            }
            let _ = bot
                .send_message(chat_id, text)
                .parse_mode(ParseMode::Html)
                .await;
        }

        "account" => {
            let _ = bot.answer_callback_query(callback_id).await;
            match state.users.get(tg_id).await {
                Some(user) => {
                    let _ = bot
                        .send_message(chat_id, render_account(&user))
                        .parse_mode(ParseMode::Html)
                        .reply_markup(account_keyboard())
                        .await;
                }
                None => {
                    let _ = bot
                        .send_message(chat_id, "Please hit /start first so I know who you are.")
                        .await;
                }
            }
        }

        "rewards" => {
            let _ = bot.answer_callback_query(callback_id).await;
            let points = state
                .users
                .get(tg_id)
                .await
                .map(|u| u.points)
                .unwrap_or_default();
            let text = format!(
                "⭐ <b>Rewards</b>\n\nYour balance: <b>{} points</b>\n\n\
                Every order earns points — more with a VIP tier. Trade them \
                for discount codes, or scratch a free ticket every 14 days.",
                points
            );
            let _ = bot
                .send_message(chat_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(rewards_keyboard())
                .await;
        }

        "points_redeem_200" | "points_redeem_500" => {
            let cost = if data.ends_with("500") {
                REDEEM_COST_LARGE
            } else {
                REDEEM_COST_SMALL
            };
            let res = state
                .users
                .update(tg_id, move |user| redeem_points(user, cost, Utc::now()))
                .await;
            match res {
                Ok(grant) => {
                    let _ = bot.answer_callback_query(callback_id).await;
                    let _ = bot
                        .send_message(
                            chat_id,
                            format!(
                                "✅ <b>Redeemed {} points!</b>\n\n🏷 {} code: <code>{}</code>\n📅 Valid until {}",
                                cost,
                                grant.label(),
                                grant.code,
                                grant.expires_at.format("%Y-%m-%d"),
                            ),
                        )
                        .parse_mode(ParseMode::Html)
                        .await;
                }
                Err(StoreError::InsufficientPoints { have, need }) => {
                    let _ = bot
                        .answer_callback_query(callback_id)
                        .text(format!(
                            "Not enough points: you have {}, need {} more.",
                            have,
                            need - have
                        ))
                        .show_alert(true)
                        .await;
                }
                Err(StoreError::NotFound(_)) => {
                    let _ = bot
                        .answer_callback_query(callback_id)
                        .text("Please hit /start first.")
                        .show_alert(true)
                        .await;
                }
                Err(e) => {
                    error!("Redemption failed for {}: {}", tg_id, e);
                    let _ = bot
                        .answer_callback_query(callback_id)
                        .text("Something went wrong, try again later.")
                        .show_alert(true)
                        .await;
                }
            }
        }

        "ticket_scratch" => {
            let _ = bot.answer_callback_query(callback_id).await;
            ticket::run_scratch_flow(&bot, chat_id, &state, tg_id).await;
        }

        "orders_mine" => {
            let _ = bot.answer_callback_query(callback_id).await;
            let orders = state.orders.for_user(tg_id).await;
            if orders.is_empty() {
                let _ = bot
                    .send_message(chat_id, "📦 No orders on file yet.")
                    .await;
            } else {
                let mut text = String::from("📦 <b>Your orders</b>\n\n");
                for order in orders.iter().rev().take(10) {
                    text.push_str(&status_line(order));
                    text.push('\n');
                }
                let _ = bot
                    .send_message(chat_id, text)
                    .parse_mode(ParseMode::Html)
                    .await;
            }
        }

        "broadcast_send" if state.is_admin(tg_id) => {
            match state.flows.take(tg_id).await {
                Some(AdminFlow::BroadcastConfirm { text }) => {
                    let _ = bot.answer_callback_query(callback_id).await;
                    let users = state.users.all().await;
                    let (sent, failed) =
                        broadcast_to_all(&bot, &users, &escape_html(&text)).await;
                    let _ = bot
                        .send_message(
                            chat_id,
                            format!("📣 Broadcast done: {} sent, {} failed.", sent, failed),
                        )
                        .await;
                }
                _ => {
                    let _ = bot
                        .answer_callback_query(callback_id)
                        .text("No broadcast pending (it may have expired).")
                        .show_alert(true)
                        .await;
                }
            }
        }

        "broadcast_cancel" if state.is_admin(tg_id) => {
            state.flows.clear(tg_id).await;
            let _ = bot
                .answer_callback_query(callback_id)
                .text("Broadcast canceled.")
                .await;
        }

        ost if ost.starts_with("ost_") && state.is_admin(tg_id) => {
            let Some((status_str, order_id)) = ost
                .strip_prefix("ost_")
                .and_then(|rest| rest.rsplit_once('_'))
            else {
                let _ = bot.answer_callback_query(callback_id).await;
                return Ok(());
            };
            let Ok(status) = status_str.parse::<OrderStatus>() else {
                let _ = bot.answer_callback_query(callback_id).await;
                return Ok(());
            };
            match set_status(&bot, &state, order_id, status).await {
                Ok(order) => {
                    let _ = bot
                        .answer_callback_query(callback_id)
                        .text(format!("Order {} → {}", order.id, order.status))
                        .await;
                }
                Err(StoreError::NotFound(_)) => {
                    let _ = bot
                        .answer_callback_query(callback_id)
                        .text("Order not found.")
                        .show_alert(true)
                        .await;
                }
                Err(e) => {
                    error!("Order status change failed: {}", e);
                    let _ = bot
                        .answer_callback_query(callback_id)
                        .text("Update failed, see logs.")
                        .show_alert(true)
                        .await;
                }
            }
        }

        _ => {
            let _ = bot.answer_callback_query(callback_id).await;
        }
    }

    Ok(())
}

/// Edit the message the button lives on, caption or text depending on
/// whether the welcome came through as a photo.
async fn edit_panel(
    bot: &Bot,
    q: &CallbackQuery,
    text: &str,
    keyboard: teloxide::types::InlineKeyboardMarkup,
) {
    let Some(msg) = q.message.as_ref() else {
        return;
    };
    let has_photo = msg
        .regular_message()
        .map(|m| m.photo().is_some())
        .unwrap_or(false);

    if has_photo {
        let _ = bot
            .edit_message_caption(msg.chat().id, msg.id())
            .caption(text.to_string())
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard)
            .await
            .map_err(|e| error!("Failed to edit caption: {}", e));
    } else {
        let _ = bot
            .edit_message_text(msg.chat().id, msg.id(), text.to_string())
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard)
            .await
            .map_err(|e| error!("Failed to edit message: {}", e));
    }
}

fn render_account(user: &UserAccount) -> String {
    let now = Utc::now();
    let mut text = format!(
        "👤 <b>My Account</b>\n\n🆔 <code>{}</code>\n⭐ Points: <b>{}</b>\n",
        user.tg_id, user.points
    );

    if user.vip_active(now) {
        let benefits = benefits_for(user.vip_tier);
        text.push_str(&format!(
            "👑 VIP: <b>{}</b> until {} — {}% off every order, +{}% points\n",
            user.vip_tier,
            user.vip_until.unwrap_or(now).format("%Y-%m-%d"),
            benefits.permanent_discount_percent,
            benefits.points_bonus_percent,
        ));
    } else {
        text.push_str("👑 VIP: none — scratch tickets can win you a tier!\n");
    }

    let wait = time_until_next_draw(user, now);
    if wait.is_zero() {
        text.push_str("🎟 Scratch ticket: <b>ready!</b>\n");
    } else {
        text.push_str(&format!("🎟 Next scratch ticket in {}\n", format_wait(wait)));
    }

    if user.active_discounts.is_empty() {
        text.push_str("\n🎁 No active discount codes.\n");
    } else {
        text.push_str("\n🎁 <b>Active codes</b>\n");
        for grant in &user.active_discounts {
            text.push_str(&format!(
                "• <code>{}</code> — {} — until {}\n",
                grant.code,
                grant.label(),
                grant.expires_at.format("%Y-%m-%d"),
            ));
        }
    }

    if !user.used_discounts.is_empty() {
        text.push_str(&format!(
            "\n🗂 {} expired/used codes in history.\n",
            user.used_discounts.len()
        ));
    }

    if !user.ticket_history.is_empty() {
        text.push_str("\n🕑 <b>Recent draws</b>\n");
        for record in user.ticket_history.iter().rev().take(5) {
            text.push_str(&format!(
                "• {} — {}\n",
                record.at.format("%Y-%m-%d"),
                escape_html(&record.summary),
            ));
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use mercado_store::models::{DiscountGrant, GrantSource};

    #[test]
    fn account_panel_mentions_points_and_codes() {
        let now = Utc::now();
        let mut user = UserAccount::new(77, Some("buyer"), None, now);
        user.points = 420;
        user.active_discounts.push(DiscountGrant::percent_off(
            77,
            10,
            7,
            GrantSource::Scratch,
            now,
        ));
        user.push_ticket_record("+80 points".into(), now);

        let text = render_account(&user);
        assert!(text.contains("420"));
        assert!(text.contains("10% off"));
        assert!(text.contains("Recent draws"));
        assert!(text.contains("ready!"));
    }

    #[test]
    fn account_panel_shows_cooldown_wait() {
        let now = Utc::now();
        let mut user = UserAccount::new(77, None, None, now);
        user.last_ticket_at = Some(now - Duration::days(1));
        let text = render_account(&user);
        assert!(text.contains("Next scratch ticket in 13d"));
    }
}
