//! 回复模板
//!
//! 可由 JSON 文件覆盖，缺失的键使用内置默认值。占位符形如 `{name}`。

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::BotError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub error: String,
    pub unknown_command: String,
    pub help: String,
    /// `{name}`
    pub hello: String,
    /// `{name}`
    pub hello_again: String,
    pub menu_header: String,
    /// `{id}` `{name}` `{kind}` `{price}` `{quantity}`
    pub menu_item: String,
    pub menu_empty: String,
    pub offers_header: String,
    /// `{description}` `{price}`
    pub offer_item: String,
    /// `{order_id}`
    pub order_ok: String,
    /// `{dish_id}`
    pub unknown_dish: String,
    /// `{dish_id}`
    pub out_of_stock: String,
    /// `{reason}`
    pub invalid_order: String,
    pub order_busy: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            error: "Something went wrong. Please try again later.".into(),
            unknown_command: "Unknown command. Send /help to see what I can do.".into(),
            help: "/menu - what's cooking today\n/order 3x2 5 - order two portions of dish 3 and one of dish 5\n/help - this message".into(),
            hello: "Hello, {name}! Send /menu to see today's dishes.".into(),
            hello_again: "Welcome back, {name}!".into(),
            menu_header: "Today's menu:".into(),
            menu_item: "{id}. {name} ({kind}, {price}) - {quantity} left".into(),
            menu_empty: "Nothing is available right now.".into(),
            offers_header: "Special offers:".into(),
            offer_item: "{description} - {price}".into(),
            order_ok: "Order #{order_id} accepted!".into(),
            unknown_dish: "There is no dish number {dish_id}.".into(),
            out_of_stock: "Sorry, not enough portions of dish {dish_id} left.".into(),
            invalid_order: "Cannot read the order ({reason}). Example: /order 3x2 5".into(),
            order_busy: "We are too busy to take your order right now, please try again.".into(),
        }
    }
}

impl Messages {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, BotError> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

/// Substitute `{key}` placeholders
pub fn render(template: &str, vars: &[(&str, &dyn std::fmt::Display)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{key}}}"), &value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let m = Messages::default();
        assert_eq!(render(&m.hello_again, &[("name", &"Ivan")]), "Welcome back, Ivan!");
        assert_eq!(render(&m.order_ok, &[("order_id", &12)]), "Order #12 accepted!");
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.json");
        std::fs::write(&path, r#"{"hello": "Привет, {name}!"}"#).unwrap();

        let m = Messages::from_json_file(&path).unwrap();
        assert_eq!(m.hello, "Привет, {name}!");
        assert_eq!(m.error, Messages::default().error);
    }

    #[test]
    fn test_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.json");
        std::fs::write(&path, "{").unwrap();
        assert!(matches!(Messages::from_json_file(&path), Err(BotError::Parse(_))));
        assert!(matches!(
            Messages::from_json_file(dir.path().join("missing.json")),
            Err(BotError::Io(_))
        ));
    }
}
