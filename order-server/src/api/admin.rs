//! Platform-admin console
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /api/admin/commissions | GET | Commission billing per restaurant (`?since=` Unix millis) |

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;
use shared::order::CommissionSummary;

use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult};

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/admin/commissions", get(commissions))
}

#[derive(Debug, Deserialize)]
pub struct CommissionQuery {
    pub since: Option<i64>,
}

async fn commissions(
    State(state): State<ServerState>,
    Query(query): Query<CommissionQuery>,
) -> AppResult<ApiResponse<Vec<CommissionSummary>>> {
    let summary = state.orders.commission_summary(query.since).await?;
    Ok(ApiResponse::success(summary))
}
