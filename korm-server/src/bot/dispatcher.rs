//! 平台无关的命令处理

use std::collections::HashMap;
use std::sync::Arc;

use shared::models::{ChatUser, OrderRequest, Platform};
use shared::util::now_millis;
use sqlx::SqlitePool;

use super::messages::render;
use super::{BotError, BotHandle, Command, IncomingMessage, Messages};
use crate::catalog;
use crate::db::repository::{RepoError, offer, user};
use crate::orders::{CheckedOrder, OrderError, OrderSerializer};

pub struct BotDispatcher {
    pool: SqlitePool,
    orders: OrderSerializer,
    messages: Messages,
    bots: HashMap<Platform, Arc<dyn BotHandle>>,
}

impl BotDispatcher {
    pub fn new(pool: SqlitePool, orders: OrderSerializer, messages: Messages) -> Self {
        Self {
            pool,
            orders,
            messages,
            bots: HashMap::new(),
        }
    }

    /// 注册平台实现 (同一平台后注册者覆盖先注册者)
    pub fn with_bot(mut self, bot: Arc<dyn BotHandle>) -> Self {
        self.bots.insert(bot.platform(), bot);
        self
    }

    pub fn has_platform(&self, platform: Platform) -> bool {
        self.bots.contains_key(&platform)
    }

    /// 处理消息并通过对应平台回复
    pub async fn handle(&self, msg: IncomingMessage) -> Result<(), BotError> {
        let Some(bot) = self.bots.get(&msg.platform) else {
            tracing::warn!(platform = %msg.platform, "No bot registered for platform, dropping message");
            return Ok(());
        };
        let reply = self.respond(&msg).await;
        bot.send_text(msg.chat_id, &reply).await
    }

    /// 计算回复文本；内部错误记录日志并以通用错误文本回复
    pub async fn respond(&self, msg: &IncomingMessage) -> String {
        let command = Command::parse(&msg.text);
        tracing::debug!(platform = %msg.platform, user = msg.user.external_id, ?command, "Bot command");

        let reply = match command {
            Command::Start => self.start(msg).await,
            Command::Menu => self.menu().await,
            Command::Order(items) => self.order(msg, OrderRequest { buyer_id: 0, items }).await,
            Command::InvalidOrder(token) => {
                let reason = if token.is_empty() { "no items".to_string() } else { token };
                Ok(render(&self.messages.invalid_order, &[("reason", &reason)]))
            }
            Command::Help => Ok(self.messages.help.clone()),
            Command::Unknown => Ok(self.messages.unknown_command.clone()),
        };

        reply.unwrap_or_else(|e| {
            tracing::error!(platform = %msg.platform, user = msg.user.external_id, error = %e, "Bot command failed");
            self.messages.error.clone()
        })
    }

    async fn start(&self, msg: &IncomingMessage) -> Result<String, RepoError> {
        let platform = msg.platform;
        if let Some(uid) = user::find_uid(&self.pool, platform, msg.user.external_id).await? {
            let name = if msg.user.first_name.is_empty() {
                user::find_by_id(&self.pool, uid)
                    .await?
                    .map(|u| u.first_name)
                    .unwrap_or_default()
            } else {
                msg.user.first_name.clone()
            };
            return Ok(render(&self.messages.hello_again, &[("name", &name)]));
        }

        let profile = self.profile(msg).await;
        let (uid, _) = user::ensure(&self.pool, platform, &profile).await?;
        tracing::info!(%platform, uid, "New chat user registered");
        Ok(render(&self.messages.hello, &[("name", &profile.first_name)]))
    }

    /// 消息不带姓名时向平台查询，失败则使用消息中的资料
    async fn profile(&self, msg: &IncomingMessage) -> ChatUser {
        if !msg.user.first_name.is_empty() {
            return msg.user.clone();
        }
        let Some(bot) = self.bots.get(&msg.platform) else {
            return msg.user.clone();
        };
        match bot.user_profile(msg.user.external_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => msg.user.clone(),
            Err(e) => {
                tracing::warn!(platform = %msg.platform, error = %e, "Cannot fetch user profile");
                msg.user.clone()
            }
        }
    }

    async fn menu(&self) -> Result<String, RepoError> {
        let kinds: HashMap<i64, _> = catalog::list_kinds(&self.pool)
            .await
            .map_err(catalog_repo_error)?
            .into_iter()
            .map(|k| (k.id, k))
            .collect();
        let dishes = catalog::list_dishes(&self.pool, None)
            .await
            .map_err(catalog_repo_error)?;

        let lines: Vec<String> = dishes
            .iter()
            .filter(|d| d.quantity > 0)
            .map(|d| {
                let (kind, price) = kinds
                    .get(&d.kind)
                    .map(|k| (k.repr.as_str(), k.price))
                    .unwrap_or(("?", 0));
                render(
                    &self.messages.menu_item,
                    &[
                        ("id", &d.id),
                        ("name", &d.name),
                        ("kind", &kind),
                        ("price", &price),
                        ("quantity", &d.quantity),
                    ],
                )
            })
            .collect();

        let mut text = if lines.is_empty() {
            self.messages.menu_empty.clone()
        } else {
            format!("{}\n{}", self.messages.menu_header, lines.join("\n"))
        };

        let offers = offer::find_active(&self.pool, now_millis()).await?;
        if !offers.is_empty() {
            text.push_str("\n\n");
            text.push_str(&self.messages.offers_header);
            for o in &offers {
                text.push('\n');
                text.push_str(&render(
                    &self.messages.offer_item,
                    &[("description", &o.description), ("price", &o.price)],
                ));
            }
        }
        Ok(text)
    }

    async fn order(&self, msg: &IncomingMessage, mut request: OrderRequest) -> Result<String, RepoError> {
        let (uid, _) = user::ensure(&self.pool, msg.platform, &msg.user).await?;
        request.buyer_id = uid;

        let order = match CheckedOrder::new(request) {
            Ok(order) => order,
            Err(e) => {
                return Ok(render(&self.messages.invalid_order, &[("reason", &e)]));
            }
        };

        let text = match self.orders.register_order(order).await {
            Ok(order_id) => render(&self.messages.order_ok, &[("order_id", &order_id)]),
            Err(OrderError::UnknownDish(id)) => {
                render(&self.messages.unknown_dish, &[("dish_id", &id)])
            }
            Err(OrderError::OutOfStock(id)) => {
                render(&self.messages.out_of_stock, &[("dish_id", &id)])
            }
            Err(e @ (OrderError::WorkerUnavailable | OrderError::Timeout(_))) => {
                tracing::warn!(uid, error = %e, "Bot order not accepted");
                self.messages.order_busy.clone()
            }
            Err(e) => {
                tracing::error!(uid, error = %e, "Bot order failed");
                self.messages.error.clone()
            }
        };
        Ok(text)
    }
}

fn catalog_repo_error(err: catalog::CatalogError) -> RepoError {
    match err {
        catalog::CatalogError::Repo(e) => e,
        other => RepoError::Database(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{dish, kind, order as order_repo, test_db};
    use crate::inventory;
    use async_trait::async_trait;
    use shared::models::{DishCreate, DishKindCreate};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    /// 记录发出的消息
    #[derive(Default)]
    struct RecordingBot {
        sent: Mutex<Vec<(i64, String)>>,
    }

    #[async_trait]
    impl BotHandle for RecordingBot {
        fn platform(&self) -> Platform {
            Platform::Vk
        }

        async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), BotError> {
            self.sent.lock().unwrap().push((chat_id, text.to_string()));
            Ok(())
        }

        async fn user_profile(&self, external_id: i64) -> Result<Option<ChatUser>, BotError> {
            Ok(Some(ChatUser {
                external_id,
                first_name: "Olga".into(),
                last_name: "Ivanova".into(),
            }))
        }
    }

    fn message(text: &str) -> IncomingMessage {
        IncomingMessage {
            platform: Platform::Vk,
            chat_id: 77,
            user: ChatUser {
                external_id: 77,
                first_name: String::new(),
                last_name: String::new(),
            },
            text: text.into(),
        }
    }

    async fn setup() -> (tempfile::TempDir, SqlitePool, Arc<RecordingBot>, BotDispatcher, CancellationToken, i64) {
        let (dir, pool) = test_db().await;
        let soup = kind::create(&pool, DishKindCreate { repr: "Soup".into(), price: 150 })
            .await
            .unwrap();
        let borscht = dish::create(
            &pool,
            DishCreate {
                name: "Borscht".into(),
                description: String::new(),
                quantity: 3,
                kind: soup.id,
            },
        )
        .await
        .unwrap();

        let (orders, worker) = OrderSerializer::new(pool.clone(), 8, Duration::from_secs(5));
        let shutdown = CancellationToken::new();
        tokio::spawn(worker.run(shutdown.clone()));

        let bot = Arc::new(RecordingBot::default());
        let dispatcher = BotDispatcher::new(pool.clone(), orders, Messages::default())
            .with_bot(bot.clone());
        (dir, pool, bot, dispatcher, shutdown, borscht.id)
    }

    #[tokio::test]
    async fn test_start_registers_then_greets_again() {
        let (_dir, pool, bot, dispatcher, _shutdown, _) = setup().await;

        dispatcher.handle(message("/start")).await.unwrap();
        dispatcher.handle(message("/start")).await.unwrap();

        let sent = bot.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], (77, "Hello, Olga! Send /menu to see today's dishes.".to_string()));
        assert_eq!(sent[1].1, "Welcome back, Olga!");
        assert!(user::find_uid(&pool, Platform::Vk, 77).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_menu_lists_stock() {
        let (_dir, _pool, _bot, dispatcher, _shutdown, borscht) = setup().await;
        let reply = dispatcher.respond(&message("/menu")).await;
        assert!(reply.starts_with("Today's menu:"));
        assert!(reply.contains(&format!("{borscht}. Borscht (Soup, 150) - 3 left")));
    }

    #[tokio::test]
    async fn test_order_goes_through_serializer() {
        let (_dir, pool, _bot, dispatcher, _shutdown, borscht) = setup().await;

        let reply = dispatcher.respond(&message(&format!("/order {borscht}x2"))).await;
        assert!(reply.starts_with("Order #"), "{reply}");
        assert_eq!(inventory::quantity_of(&pool, borscht).await.unwrap(), 1);

        let reply = dispatcher.respond(&message(&format!("/order {borscht}x2"))).await;
        assert_eq!(reply, format!("Sorry, not enough portions of dish {borscht} left."));

        let reply = dispatcher.respond(&message("/order 99999")).await;
        assert_eq!(reply, "There is no dish number 99999.");

        assert_eq!(order_repo::count(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_invalid_and_unknown_commands() {
        let (_dir, pool, _bot, dispatcher, _shutdown, borscht) = setup().await;
        let m = Messages::default();

        assert!(dispatcher.respond(&message("/order")).await.contains("no items"));
        let reply = dispatcher.respond(&message(&format!("/order {borscht}x0"))).await;
        assert!(reply.starts_with("Cannot read the order"), "{reply}");
        assert_eq!(dispatcher.respond(&message("good morning")).await, m.unknown_command);
        assert_eq!(dispatcher.respond(&message("/help")).await, m.help);
        assert_eq!(order_repo::count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stopped_worker_reports_busy() {
        let (_dir, _pool, _bot, dispatcher, shutdown, borscht) = setup().await;
        shutdown.cancel();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let reply = dispatcher.respond(&message(&format!("/order {borscht}"))).await;
        assert_eq!(reply, Messages::default().order_busy);
    }

    #[tokio::test]
    async fn test_unregistered_platform_is_dropped() {
        let (_dir, _pool, bot, dispatcher, _shutdown, _) = setup().await;
        let mut msg = message("/start");
        msg.platform = Platform::Telegram;
        dispatcher.handle(msg).await.unwrap();
        assert!(bot.sent.lock().unwrap().is_empty());
        assert!(!dispatcher.has_platform(Platform::Telegram));
    }
}
