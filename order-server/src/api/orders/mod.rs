//! Order API Module
//!
//! | Path | Method | Scope | Description |
//! |------|--------|-------|-------------|
//! | /api/orders | POST | - | Place an order (customer) |
//! | /api/orders/preview | POST | - | Authoritative pricing preview |
//! | /api/orders | GET | restaurant | Recent orders (`?status=&limit=`) |
//! | /api/orders/{id} | GET | restaurant | One order |
//! | /api/orders/{id}/status | PATCH | restaurant | Status change |
//! | /api/orders/{id}/cancel | POST | restaurant | Cancel |
//! | /api/orders/{id}/track | GET | - | Customer tracking |
//!
//! Commands answer with `CommandResponse`; reads use the `ApiResponse` envelope.

mod handler;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list))
        .route("/preview", post(handler::preview))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/status", patch(handler::update_status))
        .route("/{id}/cancel", post(handler::cancel))
        .route("/{id}/track", get(handler::track))
}
