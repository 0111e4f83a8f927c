use dotenvy::dotenv;
use std::env;
use std::path::Path;
use teloxide::prelude::*;

mod bot;
mod services;
mod state;

use crate::services::admin_flows::AdminFlows;
use crate::services::rate_limit::RateLimiter;
use crate::state::{AppState, Links};

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    log::info!("Starting Mercado Bot...");

    let token = env::var("BOT_TOKEN").expect("BOT_TOKEN is not set");
    let admin_id = env::var("ADMIN_ID").ok().and_then(|s| s.parse::<i64>().ok());
    if admin_id.is_none() {
        log::warn!("ADMIN_ID is not set, admin console disabled");
    }
    let data_dir = env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

    let (users, orders) = mercado_store::open(Path::new(&data_dir))
        .await
        .expect("Failed to open data stores");

    let state = AppState {
        users,
        orders,
        admin_id,
        welcome_image: env::var("WELCOME_IMAGE").ok(),
        links: Links {
            shop: env::var("SHOP_URL").ok(),
            channel: env::var("CHANNEL_URL").ok(),
            support: env::var("SUPPORT_URL").ok(),
        },
        flows: AdminFlows::new(),
        limiter: RateLimiter::new(20, std::time::Duration::from_secs(10)),
    };

    let bot = Bot::new(token);

    let (tx, rx) = tokio::sync::broadcast::channel(1);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = tx.send(());
    });

    bot::run_bot(bot, rx, state).await;
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = sigterm.recv() => log::info!("SIGTERM received, shutting down..."),
            _ = tokio::signal::ctrl_c() => log::info!("Ctrl-C received, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        log::info!("Ctrl-C received, shutting down...");
    }
}
