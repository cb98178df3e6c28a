//! HTTP status for each error code

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,
            Self::ValidationFailed => StatusCode::BAD_REQUEST,
            Self::RestaurantScopeRequired => StatusCode::FORBIDDEN,
            Self::OrderNotFound | Self::MenuItemNotFound | Self::TableNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::InvalidStatusTransition => StatusCode::CONFLICT,
            // well-formed, but the catalog refuses it
            Self::MenuItemUnavailable | Self::TableInactive => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InternalError | Self::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
