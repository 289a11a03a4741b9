//! Authentication Routes

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_admin;
use crate::core::ServerState;

/// - /api/auth/login: public
/// - /api/auth/me: admin token required
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/auth/login", post(handler::login))
        .merge(
            Router::new()
                .route("/api/auth/me", get(handler::me))
                .route_layer(middleware::from_fn(require_admin)),
        )
}
