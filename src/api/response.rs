//! JSON envelope shared by every API response
//!
//! `{ success, count?, data, error?, message? }`

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::ProxyError;

/// Response envelope
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Successful single-object response
    pub fn item(data: T) -> Self {
        Self {
            success: true,
            count: None,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    /// Successful list response with its length
    pub fn list(data: T, count: usize) -> Self {
        Self {
            success: true,
            count: Some(count),
            data: Some(data),
            error: None,
            message: None,
        }
    }
}

impl ApiResponse<()> {
    /// Failure response
    pub fn failure(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            count: None,
            data: None,
            error: Some(error.into()),
            message: Some(message.into()),
        }
    }
}

/// Handler error: a summary for `error` plus the underlying failure
#[derive(Debug)]
pub struct ApiError {
    summary: &'static str,
    source: ProxyError,
}

impl ApiError {
    pub fn new(summary: &'static str, source: ProxyError) -> Self {
        Self { summary, source }
    }

    /// Adapter for `map_err`
    pub fn with(summary: &'static str) -> impl Fn(ProxyError) -> ApiError {
        move |source| ApiError::new(summary, source)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.source.status_code();
        let summary = if status == StatusCode::NOT_FOUND {
            "Article not found"
        } else {
            self.summary
        };

        tracing::error!(status = status.as_u16(), error = %self.source, "{}", summary);

        (status, Json(ApiResponse::failure(summary, self.source.to_string()))).into_response()
    }
}
