use std::sync::Arc;
use std::time::Instant;

use sqlx::SqlitePool;

use crate::auth::JwtService;
use crate::bot::{BotDispatcher, Messages, TelegramBot, VkBot};
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::core::{Config, Result, ServerError};
use crate::db::DbService;
use crate::db::repository::admin;
use crate::orders::{OrderSerializer, OrderWorker};

/// 队列监控间隔
const QUEUE_MONITOR_INTERVAL: std::time::Duration = std::time::Duration::from_secs(30);

/// 服务器状态 - 持有所有服务的共享引用
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | pool | SqlitePool | 数据库连接池 |
/// | orders | OrderSerializer | 订单提交句柄 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
/// | bots | Arc<BotDispatcher> | 聊天机器人命令分发 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub orders: OrderSerializer,
    pub jwt_service: Arc<JwtService>,
    pub bots: Arc<BotDispatcher>,
    pub started_at: Instant,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构
    /// 2. 数据库 (含迁移)
    /// 3. 订单队列、JWT、机器人
    ///
    /// 返回的 [`OrderWorker`] 尚未运行，交给 [`Self::start_background_tasks`]。
    pub async fn initialize(config: &Config) -> Result<(Self, OrderWorker)> {
        config.ensure_work_dir_structure()?;

        let db = DbService::new(&config.database_path).await?;
        let pool = db.pool;

        let (orders, worker) = OrderSerializer::new(
            pool.clone(),
            config.order_queue_capacity,
            config.order_timeout(),
        );
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));

        let messages = match &config.messages_path {
            Some(path) => Messages::from_json_file(path)
                .map_err(|e| ServerError::Config(format!("{path}: {e}")))?,
            None => Messages::default(),
        };
        let mut dispatcher = BotDispatcher::new(pool.clone(), orders.clone(), messages);
        if let Some(token) = &config.telegram_token {
            dispatcher = dispatcher.with_bot(Arc::new(TelegramBot::new(token.clone())));
            tracing::info!("Telegram bot enabled");
        }
        if let Some(token) = &config.vk_token {
            dispatcher = dispatcher.with_bot(Arc::new(VkBot::new(token.clone())));
            tracing::info!("VK bot enabled");
        }

        let state = Self {
            config: config.clone(),
            pool,
            orders,
            jwt_service,
            bots: Arc::new(dispatcher),
            started_at: Instant::now(),
        };
        Ok((state, worker))
    }

    /// 启动后台任务
    ///
    /// - 订单队列消费者 (Worker)
    /// - 队列积压监控 (Periodic)
    pub fn start_background_tasks(&self, worker: OrderWorker, tasks: &mut BackgroundTasks) {
        let shutdown = tasks.shutdown_token();
        tasks.spawn("order_worker", TaskKind::Worker, worker.run(shutdown.clone()));
        tasks.spawn(
            "order_queue_monitor",
            TaskKind::Periodic,
            self.orders.clone().monitor(QUEUE_MONITOR_INTERVAL, shutdown),
        );
        tasks.log_summary();
    }

    /// 数据库中没有管理员且配置了初始账号时创建它
    pub async fn ensure_admin(&self) -> Result<()> {
        let (Some(username), Some(password)) =
            (&self.config.admin_username, &self.config.admin_password)
        else {
            return Ok(());
        };
        let existing = admin::count(&self.pool)
            .await
            .map_err(|e| ServerError::Database(e.to_string()))?;
        if existing > 0 {
            return Ok(());
        }
        admin::create(&self.pool, username, password, username)
            .await
            .map_err(|e| ServerError::Database(e.to_string()))?;
        tracing::info!(username = %username, "Initial admin account created");
        Ok(())
    }

    /// 获取 JWT 服务
    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    /// 运行时间 (秒)
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
