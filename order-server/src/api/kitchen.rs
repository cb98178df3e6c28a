//! Kitchen window
//!
//! | Path | Method | Scope | Description |
//! |------|--------|-------|-------------|
//! | /api/kitchen/orders | GET | restaurant | Pending and preparing (oldest first), then recently completed |

use axum::{Router, extract::State, routing::get};
use shared::order::Order;

use crate::api::RestaurantScope;
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult};

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/kitchen/orders", get(kitchen_orders))
}

async fn kitchen_orders(
    State(state): State<ServerState>,
    scope: RestaurantScope,
) -> AppResult<ApiResponse<Vec<Order>>> {
    let orders = state.orders.kitchen_orders(scope.id()).await?;
    Ok(ApiResponse::success(orders))
}
