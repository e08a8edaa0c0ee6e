use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use super::error::ApiError;

/// A JSON body with an explicit status code.
pub struct ApiResponse<T> {
    pub status: StatusCode,
    pub body: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(body: T) -> Self {
        Self { status: StatusCode::OK, body }
    }

    pub fn created(body: T) -> Self {
        Self { status: StatusCode::CREATED, body }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let json = match serde_json::to_string(&self.body) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize response: {}", e);
                return ApiError::Internal(e.to_string()).into_response();
            }
        };

        (
            self.status,
            [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            json,
        )
            .into_response()
    }
}
