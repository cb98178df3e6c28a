//! Restaurant dashboard aggregates
//!
//! | Path | Method | Scope | Description |
//! |------|--------|-------|-------------|
//! | /api/dashboard/stats | GET | restaurant | Counts per status and money totals |

use axum::{Router, extract::State, routing::get};
use shared::order::DashboardStats;

use crate::api::RestaurantScope;
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult};

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/dashboard/stats", get(stats))
}

async fn stats(
    State(state): State<ServerState>,
    scope: RestaurantScope,
) -> AppResult<ApiResponse<DashboardStats>> {
    let stats = state.orders.dashboard_stats(scope.id()).await?;
    Ok(ApiResponse::success(stats))
}
