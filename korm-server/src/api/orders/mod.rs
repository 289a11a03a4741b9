//! Order API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    let public_routes = Router::new().route("/", post(handler::register));

    let admin_routes = Router::new()
        .route("/", get(handler::list_by_buyer))
        .route("/{id}", get(handler::get_by_id))
        .route_layer(middleware::from_fn(require_admin));

    public_routes.merge(admin_routes)
}
