//! API error mapping
//!
//! Every handler failure becomes a status code plus a `{ "detail": ... }`
//! body. Core failures surface as 400s with the underlying driver or
//! transport message as detail; store failures map to 404/409/500.

use askdb_core::Error as CoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use crate::store::StoreError;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            detail: detail.into(),
        }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            detail: detail.into(),
        }
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.into(),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        Self::bad_request(error.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => Self::not_found("record not found"),
            StoreError::Conflict(detail) => Self::conflict(detail),
            StoreError::Database(detail) => Self::internal(detail),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "detail": self.detail })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_bad_request() {
        let api: ApiError = CoreError::Execution("syntax error".to_string()).into();
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert!(api.detail.contains("syntax error"));
    }

    #[test]
    fn store_not_found_maps_to_404() {
        let api: ApiError = StoreError::NotFound.into();
        assert_eq!(api.status, StatusCode::NOT_FOUND);
    }
}
