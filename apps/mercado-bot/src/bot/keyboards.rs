use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use mercado_store::models::{Order, OrderStatus};

use crate::state::Links;

fn url_button(text: &str, url: &str) -> Option<InlineKeyboardButton> {
    url.parse()
        .ok()
        .map(|u| InlineKeyboardButton::url(text.to_string(), u))
}

pub fn main_menu(links: &Links) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();

    if let Some(btn) = links.shop.as_deref().and_then(|u| url_button("🛒 Shop", u)) {
        rows.push(vec![btn]);
    }
    if let Some(btn) = links
        .channel
        .as_deref()
        .and_then(|u| url_button("📣 Channel", u))
    {
        rows.push(vec![btn]);
    }

    let mut info_row = vec![InlineKeyboardButton::callback("ℹ️ Info", "info")];
    if let Some(btn) = links
        .support
        .as_deref()
        .and_then(|u| url_button("📞 Contact", u))
    {
        info_row.push(btn);
    }
    rows.push(info_row);

    rows.push(vec![
        InlineKeyboardButton::callback("🎟 Scratch Ticket", "ticket_scratch"),
        InlineKeyboardButton::callback("⭐ Rewards", "rewards"),
    ]);
    rows.push(vec![
        InlineKeyboardButton::callback("🔗 Share", "share"),
        InlineKeyboardButton::callback("👤 My Account", "account"),
    ]);
    rows.push(vec![InlineKeyboardButton::callback(
        "📦 My Orders",
        "orders_mine",
    )]);

    InlineKeyboardMarkup::new(rows)
}

pub fn info_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("🚚 Delivery", "info_delivery"),
            InlineKeyboardButton::callback("🏠 Meetup", "info_meetup"),
        ],
        vec![InlineKeyboardButton::callback("⬅️ Back", "back_home")],
    ])
}

pub fn rewards_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "🎟 200 pts → 10% code",
            "points_redeem_200",
        )],
        vec![InlineKeyboardButton::callback(
            "💎 500 pts → 20% code",
            "points_redeem_500",
        )],
        vec![
            InlineKeyboardButton::callback("🎟 Scratch Ticket", "ticket_scratch"),
            InlineKeyboardButton::callback("👤 My Account", "account"),
        ],
    ])
}

pub fn account_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("⭐ Rewards", "rewards"),
        InlineKeyboardButton::callback("📦 My Orders", "orders_mine"),
    ]])
}

pub fn broadcast_confirm_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("✅ Send", "broadcast_send"),
        InlineKeyboardButton::callback("❌ Cancel", "broadcast_cancel"),
    ]])
}

/// One row of status buttons for an order in the admin listing.
pub fn order_status_keyboard(order: &Order) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = OrderStatus::ALL
        .chunks(3)
        .map(|chunk| {
            chunk
                .iter()
                .map(|status| {
                    InlineKeyboardButton::callback(
                        status.as_str().to_string(),
                        format!("ost_{}_{}", status.as_str(), order.id),
                    )
                })
                .collect()
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}
