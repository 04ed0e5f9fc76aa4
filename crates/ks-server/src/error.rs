//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`ks_core::Error`] so that route handlers
//! can return `Result<T, AppError>` directly.

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use ks_core::range::unsatisfiable_content_range;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    inner: ks_core::Error,
    request_id: Option<String>,
}

impl AppError {
    pub fn new(inner: ks_core::Error) -> Self {
        Self {
            inner,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, id: String) -> Self {
        self.request_id = Some(id);
        self
    }
}

impl From<ks_core::Error> for AppError {
    fn from(e: ks_core::Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // 416 carries the resource size in Content-Range and no body.
        if let ks_core::Error::RangeNotSatisfiable { size } = self.inner {
            return (
                status,
                [(header::CONTENT_RANGE, unsatisfiable_content_range(size))],
                Body::empty(),
            )
                .into_response();
        }

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                "Server error in HTTP handler"
            );
        }

        let body = json!({
            "error": self.inner.to_string(),
            "code": self.inner.code(),
            "request_id": self.request_id,
        });

        (status, axum::Json(body)).into_response()
    }
}
