use std::path::PathBuf;
use std::time::Duration;

use crate::auth::JwtConfig;
use crate::core::{Result, ServerError};

/// 服务器配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖 (启动时先加载 `.env`)：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库、日志) |
/// | DATABASE_PATH | <WORK_DIR>/korm.db | SQLite 数据库文件 |
/// | HTTP_PORT | 8080 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | ORDER_QUEUE_CAPACITY | 256 | 订单队列容量 |
/// | ORDER_TIMEOUT_MS | 10000 | 单个订单的等待上限 (排队 + 执行) |
/// | LOG_LEVEL | info | 未设置 RUST_LOG 时的默认级别 |
/// | LOG_DIR | - | 设置后启用按天滚动的文件日志 |
/// | MESSAGES_PATH | - | 机器人回复模板 (JSON) |
/// | TELEGRAM_TOKEN | - | 启用 Telegram 机器人 |
/// | TELEGRAM_SECRET | - | Telegram webhook 密钥 (X-Telegram-Bot-Api-Secret-Token) |
/// | VK_TOKEN | - | 启用 VK 机器人 |
/// | VK_CONFIRMATION | - | VK 回调确认串 |
/// | VK_SECRET | - | VK 回调密钥 |
/// | ADMIN_USERNAME / ADMIN_PASSWORD | - | 无管理员时创建的初始账号 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/srv/korm HTTP_PORT=9000 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录
    pub work_dir: String,
    /// 数据库文件路径
    pub database_path: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | production
    pub environment: String,
    /// JWT 认证配置
    pub jwt: JwtConfig,

    // === 订单队列 ===
    /// 有界队列容量
    pub order_queue_capacity: usize,
    /// 订单超时 (毫秒)
    pub order_timeout_ms: u64,

    // === 日志 ===
    pub log_level: String,
    pub log_dir: Option<String>,

    // === 聊天机器人 ===
    pub messages_path: Option<String>,
    pub telegram_token: Option<String>,
    pub telegram_secret: Option<String>,
    pub vk_token: Option<String>,
    pub vk_confirmation: Option<String>,
    pub vk_secret: Option<String>,

    // === 初始管理员 ===
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match env_opt(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ServerError::Config(format!("{key} has an invalid value: {raw}"))),
        None => Ok(default),
    }
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 未设置的项使用默认值；设置了但无法解析的项返回错误。
    pub fn from_env() -> Result<Self> {
        let work_dir = env_opt("WORK_DIR").unwrap_or_else(|| "./data".into());
        let database_path = env_opt("DATABASE_PATH").unwrap_or_else(|| {
            PathBuf::from(&work_dir)
                .join("korm.db")
                .to_string_lossy()
                .into_owned()
        });
        let environment = env_opt("ENVIRONMENT").unwrap_or_else(|| "development".into());
        let jwt = JwtConfig::from_env(environment == "production")?;

        Ok(Self {
            work_dir,
            database_path,
            http_port: env_parse("HTTP_PORT", 8080)?,
            environment,
            jwt,
            order_queue_capacity: env_parse("ORDER_QUEUE_CAPACITY", 256)?,
            order_timeout_ms: env_parse("ORDER_TIMEOUT_MS", 10_000)?,
            log_level: env_opt("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_dir: env_opt("LOG_DIR"),
            messages_path: env_opt("MESSAGES_PATH"),
            telegram_token: env_opt("TELEGRAM_TOKEN"),
            telegram_secret: env_opt("TELEGRAM_SECRET"),
            vk_token: env_opt("VK_TOKEN"),
            vk_confirmation: env_opt("VK_CONFIRMATION"),
            vk_secret: env_opt("VK_SECRET"),
            admin_username: env_opt("ADMIN_USERNAME"),
            admin_password: env_opt("ADMIN_PASSWORD"),
        })
    }

    /// 测试配置：指定数据库文件，不读取环境变量
    pub fn for_tests(database_path: impl Into<String>) -> Self {
        let database_path = database_path.into();
        let work_dir = PathBuf::from(&database_path)
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| ".".into());
        Self {
            work_dir,
            database_path,
            http_port: 0,
            environment: "test".into(),
            jwt: JwtConfig::with_secret(crate::auth::jwt::generate_secret()),
            order_queue_capacity: 64,
            order_timeout_ms: 5_000,
            log_level: "debug".into(),
            log_dir: None,
            messages_path: None,
            telegram_token: None,
            telegram_secret: Some("tg-secret".into()),
            vk_token: None,
            vk_confirmation: Some("confirm-me".into()),
            vk_secret: Some("vk-secret".into()),
            admin_username: None,
            admin_password: None,
        }
    }

    /// 订单超时
    pub fn order_timeout(&self) -> Duration {
        Duration::from_millis(self.order_timeout_ms)
    }

    /// 确保工作目录及数据库所在目录存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.work_dir)?;
        if let Some(parent) = PathBuf::from(&self.database_path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        if let Some(dir) = &self.log_dir {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_tests_derives_work_dir() {
        let config = Config::for_tests("/tmp/korm-test/db.sqlite");
        assert_eq!(config.work_dir, "/tmp/korm-test");
        assert_eq!(config.order_timeout(), Duration::from_secs(5));
        assert!(!config.is_production());
    }

    #[test]
    fn test_ensure_work_dir_structure() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("korm.db");
        let config = Config::for_tests(db.to_string_lossy());
        config.ensure_work_dir_structure().unwrap();
        assert!(dir.path().join("nested").is_dir());
    }
}
