//! 聊天命令解析
//!
//! | 命令 | 说明 |
//! |------|------|
//! | `/start` | 注册并问候 |
//! | `/menu` | 有货的菜品与当前优惠 |
//! | `/order 3x2 5` | 下单：菜品 3 两份、菜品 5 一份 |
//! | `/help` | 帮助 |

use shared::models::OrderItem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Menu,
    Help,
    Order(Vec<OrderItem>),
    /// `/order` 参数无法解析 (空参数时为空串)
    InvalidOrder(String),
    Unknown,
}

impl Command {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let Some(body) = text.strip_prefix('/') else {
            return Self::Unknown;
        };
        let (head, rest) = body.split_once(char::is_whitespace).unwrap_or((body, ""));
        // Telegram 群组中命令形如 /menu@korm_bot
        let name = head.split('@').next().unwrap_or(head).to_ascii_lowercase();

        match name.as_str() {
            "start" => Self::Start,
            "menu" => Self::Menu,
            "help" => Self::Help,
            "order" => parse_items(rest),
            _ => Self::Unknown,
        }
    }
}

fn parse_items(args: &str) -> Command {
    let mut items = Vec::new();
    for token in args.split_whitespace() {
        match parse_item(token) {
            Some(item) => items.push(item),
            None => return Command::InvalidOrder(token.to_string()),
        }
    }
    if items.is_empty() {
        return Command::InvalidOrder(String::new());
    }
    Command::Order(items)
}

/// `<dish>x<qty>` 或 `<dish>` (一份)
fn parse_item(token: &str) -> Option<OrderItem> {
    let (dish, quantity) = match token.split_once(['x', 'X', '*']) {
        Some((dish, quantity)) => (dish, quantity.parse().ok()?),
        None => (token, 1),
    };
    Some(OrderItem::new(dish.parse().ok()?, quantity))
}
