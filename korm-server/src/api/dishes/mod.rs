//! Dish API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/dishes", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id));

    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", axum::routing::delete(handler::delete))
        .route("/{id}/add", post(handler::add))
        .route("/{id}/sub", post(handler::sub))
        .route_layer(middleware::from_fn(require_admin));

    read_routes.merge(manage_routes)
}
