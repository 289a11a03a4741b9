//! 认证中间件
//!
//! 两级结构：
//!
//! - [`authenticate`] 在 Router 级别应用，携带 `Authorization: Bearer` 的请求
//!   被验证并注入 [`CurrentAdmin`]；没有该头的请求原样通过 (公共接口)
//! - [`require_admin`] 挂在管理路由上，要求扩展中存在 [`CurrentAdmin`]
//!
//! ```ignore
//! Router::new()
//!     .route("/", post(handler::create))
//!     .route_layer(middleware::from_fn(require_admin))
//! ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::AppError;

use crate::auth::{CurrentAdmin, JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;

/// 令牌解析中间件
///
/// | 情况 | 结果 |
/// |------|------|
/// | 无 Authorization 头 | 通过，无身份 |
/// | 非 Bearer 格式 | 401 TokenInvalid |
/// | 令牌过期 | 401 TokenExpired |
/// | 无效令牌 | 401 TokenInvalid |
pub async fn authenticate(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // CORS 预检
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let Some(header) = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    else {
        return Ok(next.run(req).await);
    };

    let token = JwtService::extract_from_header(header)
        .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?;

    match state.jwt_service.validate_token(token) {
        Ok(claims) => {
            req.extensions_mut().insert(CurrentAdmin::from(claims));
            Ok(next.run(req).await)
        }
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                uri = %req.uri(),
                error = %e
            );
            match e {
                JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            }
        }
    }
}

/// 管理员中间件 - 要求已认证的管理员
///
/// 未认证返回 401 NotAuthenticated
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    if req.extensions().get::<CurrentAdmin>().is_none() {
        security_log!("INFO", "auth_missing", uri = %req.uri());
        return Err(AppError::unauthorized());
    }
    Ok(next.run(req).await)
}
