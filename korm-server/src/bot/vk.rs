//! VK Callback API / 方法调用

use async_trait::async_trait;
use rand::Rng;
use serde::Deserialize;
use serde_json::Value;
use shared::models::{ChatUser, Platform};

use super::{BotError, BotHandle, IncomingMessage};

const API_BASE: &str = "https://api.vk.com/method";
const API_VERSION: &str = "5.131";

pub struct VkBot {
    client: reqwest::Client,
    token: String,
    api_base: String,
}

impl VkBot {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            api_base: API_BASE.to_string(),
        }
    }

    async fn call(&self, method: &str, params: &[(&str, String)]) -> Result<Value, BotError> {
        let mut form: Vec<(&str, String)> = params.to_vec();
        form.push(("access_token", self.token.clone()));
        form.push(("v", API_VERSION.to_string()));

        let body: Value = self
            .client
            .post(format!("{}/{}", self.api_base, method))
            .form(&form)
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = body.get("error") {
            let message = error
                .get("error_msg")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            return Err(BotError::Api {
                platform: Platform::Vk,
                message,
            });
        }
        Ok(body.get("response").cloned().unwrap_or(Value::Null))
    }
}

#[derive(Debug, Deserialize)]
struct VkProfile {
    id: i64,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
}

#[async_trait]
impl BotHandle for VkBot {
    fn platform(&self) -> Platform {
        Platform::Vk
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), BotError> {
        // random_id 用于 VK 端去重
        let random_id: u32 = rand::thread_rng().r#gen();
        self.call(
            "messages.send",
            &[
                ("peer_id", chat_id.to_string()),
                ("random_id", random_id.to_string()),
                ("message", text.to_string()),
            ],
        )
        .await?;
        tracing::debug!(chat_id, "VK message sent");
        Ok(())
    }

    async fn user_profile(&self, external_id: i64) -> Result<Option<ChatUser>, BotError> {
        let response = self
            .call(
                "users.get",
                &[
                    ("user_ids", external_id.to_string()),
                    ("name_case", "nom".to_string()),
                ],
            )
            .await?;
        let profiles: Vec<VkProfile> = serde_json::from_value(response)?;
        Ok(profiles.into_iter().next().map(|p| ChatUser {
            external_id: p.id,
            first_name: p.first_name,
            last_name: p.last_name,
        }))
    }
}

/// Callback API 请求体
#[derive(Debug, Deserialize)]
pub struct VkCallback {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub object: Option<Value>,
}

/// 归一化后的回调事件
#[derive(Debug, PartialEq, Eq)]
pub enum VkEvent {
    /// 服务器地址确认
    Confirmation,
    Message(IncomingMessage),
    /// 其他事件 (只需回复 "ok")
    Ignored(String),
}

#[derive(Debug, Deserialize)]
struct VkMessage {
    from_id: i64,
    #[serde(default)]
    peer_id: Option<i64>,
    #[serde(default)]
    text: String,
}

impl VkCallback {
    /// 回调密钥是否匹配 (未配置密钥时不校验)
    pub fn secret_matches(&self, expected: Option<&str>) -> bool {
        match expected {
            Some(expected) => self.secret.as_deref() == Some(expected),
            None => true,
        }
    }

    pub fn into_event(self) -> Result<VkEvent, BotError> {
        match self.kind.as_str() {
            "confirmation" => Ok(VkEvent::Confirmation),
            "message_new" => {
                let object = self.object.unwrap_or(Value::Null);
                // API 5.103 起消息包在 object.message 中
                let raw = match object.get("message") {
                    Some(inner) => inner.clone(),
                    None => object,
                };
                let message: VkMessage = serde_json::from_value(raw)?;
                Ok(VkEvent::Message(IncomingMessage {
                    platform: Platform::Vk,
                    chat_id: message.peer_id.unwrap_or(message.from_id),
                    user: ChatUser {
                        external_id: message.from_id,
                        first_name: String::new(),
                        last_name: String::new(),
                    },
                    text: message.text,
                }))
            }
            _ => Ok(VkEvent::Ignored(self.kind)),
        }
    }
}
