use chrono::Utc;
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode};
use tracing::{error, info};

use mercado_store::export;
use mercado_store::models::{GrantSource, OrderStatus, VipTier};
use mercado_store::models::discount::DiscountGrant;
use mercado_store::StoreError;

use crate::bot::handlers::ticket;
use crate::bot::keyboards::{broadcast_confirm_keyboard, main_menu, order_status_keyboard};
use crate::bot::utils::{escape_html, format_wait};
use crate::services::admin_flows::AdminFlow;
use crate::services::broadcast::notify_user;
use crate::services::orders::{set_status, status_line};
use crate::state::AppState;

pub const WELCOME_TEXT: &str = "💚 <b>Welcome to the Mercado shop!</b>\n\n\
    ⚠️ Bots and channels can get taken down at any time — follow our backup \
    channel so you never lose us.\n\n\
    🎟 Scratch a loyalty ticket every two weeks, collect points with every \
    order and trade them for discount codes.\n\n\
    🔗 All official links and services are behind the buttons below.";

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    state: AppState,
) -> Result<(), teloxide::RequestError> {
    let Some(text) = msg.text().map(str::to_string) else {
        return Ok(());
    };
    let tg_id = msg.chat.id.0;

    // A pending admin flow consumes the next message before anything else.
    if state.is_admin(tg_id) {
        match state.flows.take(tg_id).await {
            Some(AdminFlow::BroadcastCompose) => {
                if text == "/cancel" {
                    bot.send_message(msg.chat.id, "Broadcast canceled.").await?;
                    return Ok(());
                }
                state
                    .flows
                    .set(tg_id, AdminFlow::BroadcastConfirm { text: text.clone() })
                    .await;
                bot.send_message(
                    msg.chat.id,
                    format!(
                        "📣 <b>Broadcast preview</b>\n\n{}\n\nSend this to every user?",
                        escape_html(&text)
                    ),
                )
                .parse_mode(ParseMode::Html)
                .reply_markup(broadcast_confirm_keyboard())
                .await?;
                return Ok(());
            }
            // Button-driven flows go back untouched.
            Some(other) => state.flows.set(tg_id, other).await,
            None => {}
        }
    }

    if text.starts_with("/start") {
        let user = state
            .users
            .upsert(
                tg_id,
                msg.from.as_ref().and_then(|u| u.username.as_deref()),
                msg.from.as_ref().map(|u| u.full_name()).as_deref(),
            )
            .await;
        if let Err(e) = user {
            error!("Failed to upsert user {} on /start: {}", tg_id, e);
        }
        send_welcome(&bot, &msg, &state).await;
        return Ok(());
    }

    match text.as_str() {
        "/help" => {
            let mut help = String::from(
                "🤖 <b>Commands</b>\n\
                /start — main menu\n\
                /ticket — scratch your loyalty ticket\n\
                /help — this message",
            );
            if state.is_admin(tg_id) {
                help.push_str(
                    "\n\n🛠 <b>Admin</b>\n\
                    /stats — store totals\n\
                    /broadcast — message every user\n\
                    /user &lt;tg_id&gt; — inspect a user\n\
                    /grant &lt;tg_id&gt; &lt;percent&gt; &lt;days&gt; — issue a discount\n\
                    /setvip &lt;tg_id&gt; &lt;tier&gt; &lt;days&gt; — set a VIP tier\n\
                    /resetticket &lt;tg_id&gt; — unlock a scratch ticket\n\
                    /neworder &lt;tg_id&gt; &lt;amount&gt; [note] — record an order\n\
                    /order &lt;id&gt; &lt;status&gt; — move an order\n\
                    /orders — recent orders\n\
                    /export_users — JSON backup\n\
                    /export_orders — CSV report\n\
                    /wipe confirm — delete all user records",
                );
            }
            bot.send_message(msg.chat.id, help)
                .parse_mode(ParseMode::Html)
                .await?;
        }
        "/ticket" => {
            ticket::run_scratch_flow(&bot, msg.chat.id, &state, tg_id).await;
        }
        _ if state.is_admin(tg_id) && text.starts_with('/') => {
            admin_command(&bot, &msg, &state, &text).await?;
        }
        _ => {
            // Anything else is ignored, same as unknown commands.
        }
    }

    Ok(())
}

async fn send_welcome(bot: &Bot, msg: &Message, state: &AppState) {
    let keyboard = main_menu(&state.links);

    if let Some(path) = &state.welcome_image {
        let photo = InputFile::file(std::path::PathBuf::from(path));
        match bot
            .send_photo(msg.chat.id, photo)
            .caption(WELCOME_TEXT)
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard.clone())
            .await
        {
            Ok(_) => return,
            Err(e) => error!("Failed to send welcome image: {}", e),
        }
    }

    let _ = bot
        .send_message(msg.chat.id, WELCOME_TEXT)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await
        .map_err(|e| error!("Failed to send welcome: {}", e));
}

/// The admin console. Malformed arguments get a corrective usage line and
/// change nothing.
async fn admin_command(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    text: &str,
) -> Result<(), teloxide::RequestError> {
    let mut parts = text.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    match command {
        "/stats" => {
            let users = state.users.count().await;
            let orders = state.orders.count().await;
            let delivered = state.orders.count_with_status(OrderStatus::Delivered).await;
            let pending = state.orders.count_with_status(OrderStatus::Pending).await;
            bot.send_message(
                msg.chat.id,
                format!(
                    "📊 <b>Store stats</b>\n👥 Users: {}\n📦 Orders: {} ({} pending, {} delivered)",
                    users, orders, pending, delivered
                ),
            )
            .parse_mode(ParseMode::Html)
            .await?;
        }

        "/broadcast" => {
            state
                .flows
                .set(msg.chat.id.0, AdminFlow::BroadcastCompose)
                .await;
            bot.send_message(
                msg.chat.id,
                "📣 Send me the broadcast text (or /cancel).",
            )
            .await?;
        }

        "/user" => {
            let Some(target) = args.first().and_then(|s| s.parse::<i64>().ok()) else {
                bot.send_message(msg.chat.id, "Usage: /user <tg_id>").await?;
                return Ok(());
            };
            match state.users.get(target).await {
                Some(user) => {
                    let now = Utc::now();
                    let vip = if user.vip_active(now) {
                        format!(
                            "{} until {}",
                            user.vip_tier,
                            user.vip_until.unwrap_or(now).format("%Y-%m-%d")
                        )
                    } else {
                        "none".to_string()
                    };
                    let next_ticket = format_wait(
                        mercado_store::loyalty::time_until_next_draw(&user, now),
                    );
                    bot.send_message(
                        msg.chat.id,
                        format!(
                            "👤 <b>{}</b> (<code>{}</code>)\n\
                            ⭐ Points: {}\n👑 VIP: {}\n🎁 Active codes: {}\n\
                            🎟 Draws recorded: {}\n⏳ Next ticket in: {}",
                            escape_html(&user.display_name()),
                            user.tg_id,
                            user.points,
                            vip,
                            user.active_discounts.len(),
                            user.ticket_history.len(),
                            next_ticket,
                        ),
                    )
                    .parse_mode(ParseMode::Html)
                    .await?;
                }
                None => {
                    bot.send_message(msg.chat.id, format!("❌ User {} not found.", target))
                        .await?;
                }
            }
        }

        "/grant" => {
            let parsed = match args.as_slice() {
                [id, pct, days] => {
                    match (id.parse::<i64>(), pct.parse::<u8>(), days.parse::<i64>()) {
                        (Ok(id), Ok(pct), Ok(days))
                            if (1..=100).contains(&pct) && (1..=365).contains(&days) =>
                        {
                            Some((id, pct, days))
                        }
                        _ => None,
                    }
                }
                _ => None,
            };
            let Some((target, percent, days)) = parsed else {
                bot.send_message(
                    msg.chat.id,
                    "Usage: /grant <tg_id> <percent 1-100> <days 1-365>",
                )
                .await?;
                return Ok(());
            };

            let granted = state
                .users
                .update(target, move |user| {
                    let grant = DiscountGrant::percent_off(
                        user.tg_id,
                        percent,
                        days,
                        GrantSource::Admin,
                        Utc::now(),
                    );
                    user.active_discounts.push(grant.clone());
                    Ok(grant)
                })
                .await;

            match granted {
                Ok(grant) => {
                    notify_user(
                        bot,
                        target,
                        &format!(
                            "🎁 You received a <b>{}</b> code: <code>{}</code> (valid until {}).",
                            grant.label(),
                            grant.code,
                            grant.expires_at.format("%Y-%m-%d"),
                        ),
                    )
                    .await;
                    bot.send_message(
                        msg.chat.id,
                        format!("✅ Granted {} to {}: {}", grant.label(), target, grant.code),
                    )
                    .await?;
                }
                Err(StoreError::NotFound(_)) => {
                    bot.send_message(msg.chat.id, format!("❌ User {} not found.", target))
                        .await?;
                }
                Err(e) => {
                    error!("Grant failed: {}", e);
                    bot.send_message(msg.chat.id, "❌ Grant failed, see logs.").await?;
                }
            }
        }

        "/setvip" => {
            let parsed = match args.as_slice() {
                [id, tier, days] => match (
                    id.parse::<i64>(),
                    tier.parse::<VipTier>(),
                    days.parse::<i64>(),
                ) {
                    (Ok(id), Ok(tier), Ok(days)) if days >= 1 && tier != VipTier::None => {
                        Some((id, tier, days))
                    }
                    _ => None,
                },
                _ => None,
            };
            let Some((target, tier, days)) = parsed else {
                bot.send_message(
                    msg.chat.id,
                    "Usage: /setvip <tg_id> <bronze|silver|gold> <days>",
                )
                .await?;
                return Ok(());
            };

            let res = state
                .users
                .update(target, move |user| {
                    user.vip_tier = tier;
                    user.vip_until = Some(Utc::now() + chrono::Duration::days(days));
                    Ok(user.vip_until)
                })
                .await;

            match res {
                Ok(until) => {
                    notify_user(
                        bot,
                        target,
                        &format!(
                            "👑 You are now <b>{}</b> VIP until {}!",
                            tier,
                            until.unwrap_or_else(Utc::now).format("%Y-%m-%d"),
                        ),
                    )
                    .await;
                    bot.send_message(msg.chat.id, format!("✅ {} is now {} VIP.", target, tier))
                        .await?;
                }
                Err(StoreError::NotFound(_)) => {
                    bot.send_message(msg.chat.id, format!("❌ User {} not found.", target))
                        .await?;
                }
                Err(e) => {
                    error!("setvip failed: {}", e);
                    bot.send_message(msg.chat.id, "❌ Update failed, see logs.").await?;
                }
            }
        }

        "/resetticket" => {
            let Some(target) = args.first().and_then(|s| s.parse::<i64>().ok()) else {
                bot.send_message(msg.chat.id, "Usage: /resetticket <tg_id>").await?;
                return Ok(());
            };
            let res = state
                .users
                .update(target, |user| {
                    user.last_ticket_at = None;
                    Ok(())
                })
                .await;
            match res {
                Ok(()) => {
                    info!("Admin reset ticket cooldown for {}", target);
                    bot.send_message(
                        msg.chat.id,
                        format!("✅ Ticket cooldown cleared for {}.", target),
                    )
                    .await?;
                }
                Err(StoreError::NotFound(_)) => {
                    bot.send_message(msg.chat.id, format!("❌ User {} not found.", target))
                        .await?;
                }
                Err(e) => {
                    error!("resetticket failed: {}", e);
                    bot.send_message(msg.chat.id, "❌ Update failed, see logs.").await?;
                }
            }
        }

        "/neworder" => {
            let (target, amount) = match args.as_slice() {
                [id, amount, ..] => match (id.parse::<i64>(), amount.parse::<f64>()) {
                    (Ok(id), Ok(amount)) => (Some(id), amount),
                    _ => (None, 0.0),
                },
                _ => (None, 0.0),
            };
            let Some(target) = target else {
                bot.send_message(msg.chat.id, "Usage: /neworder <tg_id> <amount> [note]")
                    .await?;
                return Ok(());
            };
            let note = if args.len() > 2 {
                Some(args[2..].join(" "))
            } else {
                None
            };

            match state.orders.create(target, amount, note).await {
                Ok(order) => {
                    notify_user(
                        bot,
                        target,
                        &format!(
                            "🧾 Order <code>{}</code> for ${:.2} was recorded. We'll keep you posted!",
                            order.id, order.amount
                        ),
                    )
                    .await;
                    bot.send_message(msg.chat.id, status_line(&order))
                        .parse_mode(ParseMode::Html)
                        .reply_markup(order_status_keyboard(&order))
                        .await?;
                }
                Err(StoreError::Validation(reason)) => {
                    bot.send_message(msg.chat.id, format!("❌ {}", reason)).await?;
                }
                Err(e) => {
                    error!("neworder failed: {}", e);
                    bot.send_message(msg.chat.id, "❌ Could not record the order.").await?;
                }
            }
        }

        "/order" => {
            let parsed = match args.as_slice() {
                [id, status] => status.parse::<OrderStatus>().ok().map(|s| (*id, s)),
                _ => None,
            };
            let Some((order_id, status)) = parsed else {
                bot.send_message(
                    msg.chat.id,
                    "Usage: /order <id> <pending|confirmed|preparing|out_for_delivery|delivered|canceled>",
                )
                .await?;
                return Ok(());
            };

            match set_status(bot, state, order_id, status).await {
                Ok(order) => {
                    bot.send_message(msg.chat.id, status_line(&order))
                        .parse_mode(ParseMode::Html)
                        .await?;
                }
                Err(StoreError::NotFound(_)) => {
                    bot.send_message(msg.chat.id, format!("❌ Order {} not found.", order_id))
                        .await?;
                }
                Err(e) => {
                    error!("order update failed: {}", e);
                    bot.send_message(msg.chat.id, "❌ Update failed, see logs.").await?;
                }
            }
        }

        "/orders" => {
            let mut orders = state.orders.all().await;
            if orders.is_empty() {
                bot.send_message(msg.chat.id, "No orders yet.").await?;
                return Ok(());
            }
            orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            for order in orders.iter().take(10) {
                bot.send_message(
                    msg.chat.id,
                    format!("{} (user {})", status_line(order), order.user_id),
                )
                .parse_mode(ParseMode::Html)
                .reply_markup(order_status_keyboard(order))
                .await?;
            }
        }

        "/export_users" => {
            let users = state.users.all().await;
            match export::users_json(&users) {
                Ok(doc) => {
                    let file = InputFile::memory(doc.into_bytes()).file_name("users.json");
                    bot.send_document(msg.chat.id, file)
                        .caption(format!("{} user records", users.len()))
                        .await?;
                }
                Err(e) => {
                    error!("users export failed: {}", e);
                    bot.send_message(msg.chat.id, "❌ Export failed, see logs.").await?;
                }
            }
        }

        "/export_orders" => {
            let orders = state.orders.all().await;
            let csv = export::orders_csv(&orders);
            let file = InputFile::memory(csv.into_bytes()).file_name("orders.csv");
            bot.send_document(msg.chat.id, file)
                .caption(format!("{} orders", orders.len()))
                .await?;
        }

        "/wipe" => {
            if args.first() != Some(&"confirm") {
                bot.send_message(
                    msg.chat.id,
                    "⚠️ This deletes every user record. Run /wipe confirm if you mean it.",
                )
                .await?;
                return Ok(());
            }
            match state.users.delete_all().await {
                Ok(removed) => {
                    info!("Admin wiped {} user records", removed);
                    bot.send_message(msg.chat.id, format!("🗑 Deleted {} user records.", removed))
                        .await?;
                }
                Err(e) => {
                    error!("wipe failed: {}", e);
                    bot.send_message(msg.chat.id, "❌ Wipe failed, see logs.").await?;
                }
            }
        }

        _ => {
            // Unknown admin command: stay quiet, same as for regular users.
        }
    }

    Ok(())
}
