//! Authentication Handlers

use std::time::Duration;

use axum::{Extension, Json, extract::State};
use serde::Serialize;

use crate::auth::CurrentAdmin;
use crate::core::ServerState;
use crate::db::repository::admin;
use crate::security_log;
use crate::utils::validation::{MAX_NAME_LEN, MAX_PASSWORD_LEN, validate_text};
use crate::utils::{AppError, AppResult};
use shared::models::{AdminLogin, LoginResponse};

/// Fixed delay for failed logins, slows down password guessing
const AUTH_FAILURE_DELAY_MS: u64 = 300;

/// POST /api/auth/login
///
/// Unknown username and wrong password produce the same error.
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<AdminLogin>,
) -> AppResult<Json<LoginResponse>> {
    validate_text(&req.username, "username", MAX_NAME_LEN)?;
    validate_text(&req.password, "password", MAX_PASSWORD_LEN)?;

    if !admin::check(&state.pool, &req.username, &req.password).await? {
        tokio::time::sleep(Duration::from_millis(AUTH_FAILURE_DELAY_MS)).await;
        security_log!("WARN", "login_failed", username = %req.username);
        return Err(AppError::invalid_credentials());
    }

    let name = admin::find_name(&state.pool, &req.username)
        .await?
        .unwrap_or_else(|| req.username.clone());
    let token = state
        .jwt_service
        .generate_token(&req.username, &name)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {e}")))?;

    security_log!("INFO", "login_success", username = %req.username);
    Ok(Json(LoginResponse { token, name }))
}

#[derive(Debug, Serialize)]
pub struct AdminInfo {
    pub username: String,
    pub name: String,
}

/// GET /api/auth/me
pub async fn me(Extension(admin): Extension<CurrentAdmin>) -> Json<AdminInfo> {
    Json(AdminInfo {
        username: admin.username,
        name: admin.name,
    })
}
