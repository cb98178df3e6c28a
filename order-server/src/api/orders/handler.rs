//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;
use shared::order::{
    CommandError, CommandErrorCode, CommandResponse, CreateOrderRequest, Order, OrderStatus,
    OrderTracking, PreviewOrderRequest, PreviewResponse, UpdateStatusRequest,
};

use crate::api::RestaurantScope;
use crate::core::ServerState;
use crate::orders::OrderError;
use crate::utils::{ApiResponse, AppError, AppResult};

type CommandReply = (StatusCode, Json<CommandResponse>);

fn command_error(err: OrderError) -> CommandReply {
    let error = CommandError::from(err);
    let status = error.code.error_code().http_status();
    (status, Json(CommandResponse::error(error)))
}

fn body_error(rejection: JsonRejection) -> CommandError {
    CommandError::new(CommandErrorCode::ValidationError, rejection.body_text())
}

/// Place an order
pub async fn create(
    State(state): State<ServerState>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> CommandReply {
    let Json(req) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(CommandResponse::error(body_error(rejection))),
            );
        }
    };

    match state.orders.create_order(req).await {
        Ok(order_id) => (StatusCode::CREATED, Json(CommandResponse::created(order_id))),
        Err(e) => command_error(e),
    }
}

/// Pricing preview with the same rules as create
pub async fn preview(
    State(state): State<ServerState>,
    payload: Result<Json<PreviewOrderRequest>, JsonRejection>,
) -> (StatusCode, Json<PreviewResponse>) {
    let Json(req) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(PreviewResponse::error(body_error(rejection))),
            );
        }
    };

    match state.orders.preview_order_pricing(&req).await {
        Ok(pricing) => (StatusCode::OK, Json(PreviewResponse::success(pricing))),
        Err(e) => {
            let error = CommandError::from(e);
            let status = error.code.error_code().http_status();
            (status, Json(PreviewResponse::error(error)))
        }
    }
}

pub async fn update_status(
    State(state): State<ServerState>,
    scope: RestaurantScope,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> CommandReply {
    let Json(req) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(CommandResponse::error(body_error(rejection))),
            );
        }
    };

    match state
        .orders
        .update_order_status(scope.id(), &id, req.status)
        .await
    {
        Ok(order) => (
            StatusCode::OK,
            Json(CommandResponse::status_changed(
                order.id,
                order.status,
                order.updated_at,
            )),
        ),
        Err(e) => command_error(e),
    }
}

pub async fn cancel(
    State(state): State<ServerState>,
    scope: RestaurantScope,
    Path(id): Path<String>,
) -> CommandReply {
    match state.orders.cancel_order(scope.id(), &id).await {
        Ok(order) => (
            StatusCode::OK,
            Json(CommandResponse::status_changed(
                order.id,
                order.status,
                order.updated_at,
            )),
        ),
        Err(e) => command_error(e),
    }
}

/// Query params for listing orders
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub limit: Option<usize>,
}

/// Recent orders of the scoped restaurant, newest first
pub async fn list(
    State(state): State<ServerState>,
    scope: RestaurantScope,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<Order>>> {
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<OrderStatus>)
        .transpose()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let orders = state
        .orders
        .list_orders(scope.id(), status, query.limit)
        .await?;
    Ok(ApiResponse::success(orders))
}

pub async fn get_by_id(
    State(state): State<ServerState>,
    scope: RestaurantScope,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Order>> {
    let order = state.orders.get_order(scope.id(), &id).await?;
    Ok(ApiResponse::success(order))
}

/// Customer tracking, addressed by order id alone
pub async fn track(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<OrderTracking>> {
    let tracking = state.orders.track_order(&id).await?;
    Ok(ApiResponse::success(tracking))
}
