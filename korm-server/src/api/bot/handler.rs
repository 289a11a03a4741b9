//! Webhook Handlers
//!
//! 平台要求快速应答，命令在后台任务中处理。

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};

use crate::bot::telegram::TelegramUpdate;
use crate::bot::vk::{VkCallback, VkEvent};
use crate::bot::IncomingMessage;
use crate::core::ServerState;
use crate::security_log;
use crate::utils::{AppError, AppResult};

/// Telegram 在每次推送中回传 setWebhook 时设置的 secret_token
const TELEGRAM_SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

fn dispatch(state: &ServerState, msg: IncomingMessage) {
    let bots = state.bots.clone();
    tokio::spawn(async move {
        let platform = msg.platform;
        if let Err(e) = bots.handle(msg).await {
            tracing::error!(%platform, error = %e, "Failed to deliver bot reply");
        }
    });
}

/// POST /bot/telegram
///
/// 配置了 `TELEGRAM_SECRET` 时，密钥头不匹配的请求返回 400。
pub async fn telegram(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(update): Json<TelegramUpdate>,
) -> AppResult<StatusCode> {
    if let Some(expected) = state.config.telegram_secret.as_deref() {
        let given = headers
            .get(TELEGRAM_SECRET_HEADER)
            .and_then(|v| v.to_str().ok());
        if given != Some(expected) {
            security_log!("WARN", "telegram_secret_mismatch", update_id = update.update_id);
            return Err(AppError::invalid_request("bad secret"));
        }
    }

    let update_id = update.update_id;
    match update.into_incoming() {
        Some(msg) => dispatch(&state, msg),
        None => tracing::debug!(update_id, "Ignoring non-text Telegram update"),
    }
    Ok(StatusCode::OK)
}

/// POST /bot/vk
///
/// `confirmation` 返回确认串，其余事件返回 `ok`。
pub async fn vk(
    State(state): State<ServerState>,
    Json(callback): Json<VkCallback>,
) -> AppResult<String> {
    if !callback.secret_matches(state.config.vk_secret.as_deref()) {
        security_log!("WARN", "vk_secret_mismatch", group_id = ?callback.group_id);
        return Err(AppError::invalid_request("bad secret"));
    }

    let event = callback
        .into_event()
        .map_err(|e| AppError::invalid_request(format!("Malformed VK callback: {e}")))?;

    match event {
        VkEvent::Confirmation => state.config.vk_confirmation.clone().ok_or_else(|| {
            tracing::error!("VK confirmation requested but VK_CONFIRMATION is not set");
            AppError::new(crate::utils::ErrorCode::ConfigError)
        }),
        VkEvent::Message(msg) => {
            dispatch(&state, msg);
            Ok("ok".to_string())
        }
        VkEvent::Ignored(kind) => {
            tracing::debug!(kind = %kind, "Ignoring VK event");
            Ok("ok".to_string())
        }
    }
}
