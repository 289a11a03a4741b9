//! HTTP 路由组装

mod logging;

use axum::Router;
use axum::middleware as axum_middleware;
use http::{HeaderName, HeaderValue};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::api;
use crate::core::ServerState;

pub use logging::logging_middleware;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request ID generator (uuid v4)
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        // Health API - public
        .merge(api::health::router())
        // Auth API - login public, /me admin
        .merge(api::auth::router())
        // Catalog & orders - reads public, writes admin
        .merge(api::dishes::router())
        .merge(api::kinds::router())
        .merge(api::offers::router())
        .merge(api::orders::router())
        // Chat platform webhooks - public
        .merge(api::bot::router())
}

/// Build a fully configured application with all middleware
///
/// Used by both the HTTP server and the in-process tests.
pub fn build_app(state: &ServerState) -> Router<ServerState> {
    build_router()
        // Admin token decoding - injects CurrentAdmin for route_layer guards
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            crate::auth::authenticate,
        ))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        // Request logging
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        // Propagate request ID to response
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        // Request ID - outermost, so every inner layer sees it
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
}
