use chrono::Utc;
use rand::SeedableRng;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::error;

use mercado_store::loyalty::{scratch_ticket, AppliedReward};
use mercado_store::StoreError;

use crate::bot::utils::format_wait;
use crate::state::AppState;

/// The scratch-ticket flow: one atomic draw against the user record, then
/// the little reveal animation. The sleeps suspend only this handler; other
/// users' events keep being serviced.
pub async fn run_scratch_flow(bot: &Bot, chat_id: ChatId, state: &AppState, tg_id: i64) {
    let mut rng = rand::rngs::StdRng::from_os_rng();
    let outcome = state
        .users
        .update(tg_id, move |user| scratch_ticket(user, &mut rng, Utc::now()))
        .await;

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(StoreError::CooldownActive { remaining }) => {
            let _ = bot
                .send_message(
                    chat_id,
                    format!(
                        "⏳ <b>Not yet!</b>\nYour next scratch ticket unlocks in <b>{}</b>.",
                        format_wait(remaining)
                    ),
                )
                .parse_mode(ParseMode::Html)
                .await;
            return;
        }
        Err(StoreError::NotFound(_)) => {
            let _ = bot
                .send_message(chat_id, "Please hit /start first so I know who you are.")
                .await;
            return;
        }
        Err(e) => {
            error!("Scratch draw failed for {}: {}", tg_id, e);
            let _ = bot
                .send_message(chat_id, "❌ Something went wrong, please try again later.")
                .await;
            return;
        }
    };

    // Reveal animation. Failures here only cost the show, never the reward.
    let teaser = bot
        .send_message(chat_id, "🎟 Scratching your ticket...")
        .await;

    let reveal = match outcome.applied {
        AppliedReward::Discount(grant) => format!(
            "🎉 <b>You won {}!</b>\n\n🏷 Code: <code>{}</code>\n📅 Valid until {}\n\nShow the code at checkout to apply it.",
            grant.label(),
            grant.code,
            grant.expires_at.format("%Y-%m-%d"),
        ),
        AppliedReward::Points { added, total } => format!(
            "🎉 <b>You won {} points!</b>\n\n⭐ New balance: <b>{}</b>\nRedeem them under ⭐ Rewards.",
            added, total
        ),
        AppliedReward::Vip { tier, until } => format!(
            "👑 <b>VIP!</b>\n\nYou now hold <b>{}</b> status until {}.\nEnjoy your permanent discount and bonus points.",
            tier,
            until.format("%Y-%m-%d"),
        ),
    };

    match teaser {
        Ok(msg) => {
            tokio::time::sleep(std::time::Duration::from_millis(1200)).await;
            let _ = bot
                .edit_message_text(chat_id, msg.id, "✨ Almost there...")
                .await;
            tokio::time::sleep(std::time::Duration::from_millis(1200)).await;
            let _ = bot
                .edit_message_text(chat_id, msg.id, reveal)
                .parse_mode(ParseMode::Html)
                .await;
        }
        Err(_) => {
            // Could not even send the teaser; deliver the result plainly.
            let _ = bot
                .send_message(chat_id, reveal)
                .parse_mode(ParseMode::Html)
                .await;
        }
    }
}
