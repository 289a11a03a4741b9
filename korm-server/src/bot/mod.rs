//! 聊天机器人
//!
//! 平台无关的命令处理 ([`BotDispatcher`]) 通过 [`BotHandle`] 能力接口回复用户；
//! 具体平台 ([`TelegramBot`], [`VkBot`]) 在启动时按配置注册。
//!
//! ```text
//! webhook ──► IncomingMessage ──► BotDispatcher ──► Command
//!                                      │
//!                                      ├──► catalog / user repository
//!                                      ├──► OrderSerializer
//!                                      └──► BotHandle::send_text
//! ```

pub mod command;
pub mod dispatcher;
pub mod messages;
pub mod telegram;
pub mod vk;

pub use command::Command;
pub use dispatcher::BotDispatcher;
pub use messages::Messages;
pub use telegram::TelegramBot;
pub use vk::VkBot;

use async_trait::async_trait;
use shared::models::{ChatUser, Platform};
use thiserror::Error;

/// 机器人错误
#[derive(Debug, Error)]
pub enum BotError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{platform} API error: {message}")]
    Api { platform: Platform, message: String },

    #[error("cannot read message templates: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid message templates: {0}")]
    Parse(#[from] serde_json::Error),
}

/// 一条来自聊天平台的文本消息 (已与平台格式解耦)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub platform: Platform,
    /// 回复目标 (对话 id)
    pub chat_id: i64,
    pub user: ChatUser,
    pub text: String,
}

/// 聊天平台能力接口
#[async_trait]
pub trait BotHandle: Send + Sync {
    fn platform(&self) -> Platform;

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), BotError>;

    /// 查询平台上的用户资料；消息本身不带姓名的平台实现此方法
    async fn user_profile(&self, _external_id: i64) -> Result<Option<ChatUser>, BotError> {
        Ok(None)
    }
}
