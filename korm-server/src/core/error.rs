use thiserror::Error;

/// 启动与运行期错误 (非请求级别)
///
/// 请求级别的错误统一使用 [`shared::error::AppError`]。
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("数据库错误: {0}")]
    Database(String),

    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("内部服务器错误")]
    Internal(#[from] anyhow::Error),
}

impl From<crate::auth::JwtError> for ServerError {
    fn from(err: crate::auth::JwtError) -> Self {
        ServerError::Config(err.to_string())
    }
}

impl From<shared::error::AppError> for ServerError {
    fn from(err: shared::error::AppError) -> Self {
        ServerError::Database(err.message)
    }
}

/// 启动流程的 Result 类型别名
pub type Result<T> = std::result::Result<T, ServerError>;
