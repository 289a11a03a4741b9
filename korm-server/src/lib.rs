//! Korm Server - 聊天机器人点餐后端
//!
//! # 架构概述
//!
//! - **库存** (`inventory`): 条件更新保证库存永不为负
//! - **订单** (`orders`): 事务写入 + 单消费者队列，订单按到达顺序逐个处理
//! - **菜单** (`catalog`): 菜品与品类查询
//! - **数据库** (`db`): SQLite (sqlx)，内嵌迁移
//! - **认证** (`auth`): 管理后台 JWT + Argon2
//! - **机器人** (`bot`): Telegram / VK 命令处理
//! - **HTTP API** (`api`, `routes`): axum 路由与中间件
//!
//! # 模块结构
//!
//! ```text
//! korm-server/src/
//! ├── core/          # 配置、状态、后台任务、服务器
//! ├── auth/          # JWT 认证中间件
//! ├── api/           # HTTP 处理器
//! ├── routes/        # 路由组装、请求日志
//! ├── bot/           # 聊天平台
//! ├── db/            # 连接池与仓储
//! ├── orders/        # 订单队列与事务
//! ├── inventory.rs   # 库存条件更新
//! ├── catalog.rs     # 菜单查询
//! └── utils/         # 日志、校验
//! ```

pub mod api;
pub mod auth;
pub mod bot;
pub mod catalog;
pub mod core;
pub mod db;
pub mod inventory;
pub mod orders;
pub mod routes;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentAdmin, JwtService};
pub use core::{BackgroundTasks, Config, Server, ServerState};
pub use orders::{CheckedOrder, OrderError, OrderSerializer, OrderWorker};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// Security logging macro
///
/// ```ignore
/// security_log!("WARN", "login_failed", username = %req.username);
/// ```
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($fields:tt)+) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($fields)+
        );
    };
    ($level:expr, $event:expr) => {
        tracing::info!(target: "security", level = $level, event = $event);
    };
}

/// 加载 `.env`、创建工作目录、初始化日志
pub fn setup_environment() -> Result<Config, core::ServerError> {
    dotenv::dotenv().ok();
    let config = Config::from_env()?;
    config.ensure_work_dir_structure()?;
    init_logger_with_file(
        Some(&config.log_level),
        config.is_production(),
        config.log_dir.as_deref(),
    );
    Ok(config)
}

pub fn print_banner() {
    println!(
        r#"
  _
 | | _____  _ __ _ __ ___
 | |/ / _ \| '__| '_ ` _ \
 |   < (_) | |  | | | | | |
 |_|\_\___/|_|  |_| |_| |_|
    "#
    );
}
