//! API routes
//!
//! # Structure
//!
//! - [`health`] - liveness
//! - [`orders`] - order commands, order reads and customer tracking
//! - [`kitchen`] - kitchen window
//! - [`dashboard`] - cached restaurant aggregates
//! - [`admin`] - platform commission billing
//! - [`live_ws`] - WebSocket live feed
//! - [`scope`] - `X-Restaurant-Id` extractor

pub mod admin;
pub mod dashboard;
pub mod health;
pub mod kitchen;
pub mod live_ws;
pub mod orders;
pub mod scope;

use std::time::Duration;

use axum::Router;
use http::{HeaderName, HeaderValue};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::ServerState;

pub use scope::RestaurantScope;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Custom request ID generator
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
        .merge(health::router())
        .merge(orders::router())
        .merge(kitchen::router())
        .merge(dashboard::router())
        .merge(admin::router())
        .merge(live_ws::router())
}

/// Build the fully configured application with middleware and state
///
/// Used by the HTTP server and by the integration tests.
pub fn build_app(state: ServerState) -> Router {
    let timeout = Duration::from_millis(state.config.request_timeout_ms.max(1));

    build_router()
        // ========== Tower HTTP Middleware ==========
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(timeout))
        // Trace - request spans at INFO level
        .layer(TraceLayer::new_for_http())
        // ========== Request ID ==========
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        .with_state(state)
}
