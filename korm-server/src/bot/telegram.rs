//! Telegram Bot API
//!
//! 发送走 `sendMessage`；接收走 webhook，更新体经 [`TelegramUpdate`] 归一化。

use async_trait::async_trait;
use serde::Deserialize;
use shared::models::{ChatUser, Platform};

use super::{BotError, BotHandle, IncomingMessage};

const API_BASE: &str = "https://api.telegram.org";

pub struct TelegramBot {
    client: reqwest::Client,
    token: String,
    api_base: String,
}

impl TelegramBot {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            api_base: API_BASE.to_string(),
        }
    }

    /// 指向其他 API 地址 (本地 Bot API 服务器)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }
}

#[derive(Debug, Deserialize)]
struct ApiReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[async_trait]
impl BotHandle for TelegramBot {
    fn platform(&self) -> Platform {
        Platform::Telegram
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), BotError> {
        let reply: ApiReply = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&serde_json::json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await?
            .json()
            .await?;

        if reply.ok {
            tracing::debug!(chat_id, "Telegram message sent");
            Ok(())
        } else {
            Err(BotError::Api {
                platform: Platform::Telegram,
                message: reply.description.unwrap_or_else(|| "unknown error".into()),
            })
        }
    }
}

/// Webhook 更新体 (只解析用到的字段)
#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TgMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TgMessage {
    pub chat: TgChat,
    #[serde(default)]
    pub from: Option<TgUser>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TgChat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct TgUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl TelegramUpdate {
    /// 非文本消息 (贴纸、编辑、频道消息等) 返回 `None`
    pub fn into_incoming(self) -> Option<IncomingMessage> {
        let message = self.message?;
        let text = message.text?;
        let from = message.from?;
        Some(IncomingMessage {
            platform: Platform::Telegram,
            chat_id: message.chat.id,
            user: ChatUser {
                external_id: from.id,
                first_name: from.first_name,
                last_name: from.last_name,
            },
            text,
        })
    }
}
