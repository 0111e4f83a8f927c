use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{info, warn};

use mercado_store::models::UserAccount;

/// Fire-and-forget single-user notification. Delivery failures (blocked
/// bot, deleted account) are logged and swallowed; the state change that
/// triggered the notification stays committed.
pub async fn notify_user(bot: &Bot, tg_id: i64, text: &str) {
    if let Err(e) = bot
        .send_message(ChatId(tg_id), text)
        .parse_mode(ParseMode::Html)
        .await
    {
        warn!("Failed to notify user {}: {}", tg_id, e);
    }
}

/// Send a text to every known user with a small pacing delay. Returns
/// (sent, failed); failures are never retried.
pub async fn broadcast_to_all(bot: &Bot, users: &[UserAccount], text: &str) -> (usize, usize) {
    let mut sent = 0usize;
    let mut failed = 0usize;

    for user in users {
        match bot
            .send_message(ChatId(user.tg_id), text)
            .parse_mode(ParseMode::Html)
            .await
        {
            Ok(_) => sent += 1,
            Err(e) => {
                failed += 1;
                warn!("Broadcast to {} failed: {}", user.tg_id, e);
            }
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    }

    info!("Broadcast complete: {}/{} sent, {} failed", sent, users.len(), failed);
    (sent, failed)
}
