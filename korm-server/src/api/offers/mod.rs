//! Offer API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/offers", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new().route("/", get(handler::list_active));

    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route_layer(middleware::from_fn(require_admin));

    read_routes.merge(manage_routes)
}
