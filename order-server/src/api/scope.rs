//! Restaurant scope extractor
//!
//! Staff endpoints act on behalf of one restaurant, named by the
//! `X-Restaurant-Id` header. Every repository read and write behind them is
//! filtered by that id.

use axum::extract::FromRequestParts;
use http::request::Parts;
use shared::error::AppError;

pub const RESTAURANT_HEADER: &str = "x-restaurant-id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestaurantScope(pub String);

impl RestaurantScope {
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for RestaurantScope
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(RESTAURANT_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| RestaurantScope(v.to_string()))
            .ok_or_else(AppError::scope_required)
    }
}
