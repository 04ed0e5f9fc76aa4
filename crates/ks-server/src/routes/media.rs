//! Gallery media route: `GET /media/{*path}`.
//!
//! The access gate runs as route middleware before these handlers. The
//! handlers only translate the request into a [`serve_media`] call and keep
//! per-status counters.

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Extension;

use ks_core::storage::split_segments;

use super::streaming_helpers::{serve_media, MediaSource};
use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;

/// GET /media/{path} -- serve an uploaded photo or video.
#[utoipa::path(
    get,
    path = "/media/{path}",
    params(
        ("path" = String, Path, description = "Storage-relative file path, e.g. `guests/alice/IMG_0042.jpg`"),
        ("Range" = Option<String>, Header, description = "Single byte range, `bytes=<start>-<end>`"),
    ),
    responses(
        (status = 200, description = "Whole file"),
        (status = 206, description = "Requested byte range"),
        (status = 400, description = "Empty path or path outside the upload directory"),
        (status = 401, description = "Event token missing or wrong"),
        (status = 404, description = "No such file"),
        (status = 415, description = "File type is not served"),
        (status = 416, description = "Malformed or unsatisfiable range"),
    ),
    tag = "media"
)]
pub async fn get_media(
    State(ctx): State<AppContext>,
    Extension(request_id): Extension<RequestId>,
    path: Result<Path<String>, PathRejection>,
    headers: HeaderMap,
) -> Response {
    let path = match path {
        Ok(Path(path)) => path,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Media path rejected");
            let response = AppError::new(ks_core::Error::Validation(format!(
                "invalid file path: {}",
                rejection.body_text()
            )))
            .with_request_id(request_id.0)
            .into_response();
            record(&response);
            return response;
        }
    };
    let segments = split_segments(&path);
    // A header that is not visible ASCII can never match the range grammar,
    // so it is passed on as an empty (malformed) value.
    let range_header = headers
        .get(header::RANGE)
        .map(|v| v.to_str().unwrap_or_default());

    let source = MediaSource {
        storage: &ctx.storage,
        mime: &ctx.mime,
        verify_signatures: ctx.config.media.verify_signatures,
    };

    let response = match serve_media(source, segments.as_slice(), range_header).await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!(path = %path, error = %e, "Media request rejected");
            AppError::new(e).with_request_id(request_id.0).into_response()
        }
    };

    record(&response);
    response
}

/// GET /media -- no file named.
pub async fn missing_path(Extension(request_id): Extension<RequestId>) -> Response {
    let response = AppError::new(ks_core::Error::Validation("file path is required".into()))
        .with_request_id(request_id.0)
        .into_response();
    record(&response);
    response
}

fn record(response: &Response) {
    let status = response.status();
    metrics::counter!("keepsake_media_requests_total", "status" => status.as_str().to_owned())
        .increment(1);
    if status.is_success() {
        if let Some(len) = response
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
        {
            metrics::counter!("keepsake_media_bytes_total").increment(len);
        }
    }
}
