//! Chat platform webhooks
//!
//! | 路径 | 平台 |
//! |------|------|
//! | POST /bot/telegram | Telegram Bot API webhook |
//! | POST /bot/vk | VK Callback API |

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/bot/telegram", post(handler::telegram))
        .route("/bot/vk", post(handler::vk))
}
