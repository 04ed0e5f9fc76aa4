//! Event-token access gate.
//!
//! When an event token is configured, every gated request must present it.
//! The token is looked up in this order:
//! 1. `X-Event-Token: <token>`
//! 2. `Authorization: Bearer <token>`
//! 3. `?token=<token>` query parameter (links shared with guests)
//! 4. Cookie: `event_token=<token>`
//!
//! The gate runs as route middleware, so a rejected request never reaches
//! the filesystem.

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, Request, Uri};
use axum::middleware::Next;
use axum::response::Response;
use serde::Deserialize;

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;

/// Header carrying the event token.
pub const EVENT_TOKEN_HEADER: &str = "x-event-token";

/// Cookie name carrying the event token.
pub const EVENT_TOKEN_COOKIE: &str = "event_token";

/// Shared-secret gate in front of the gallery.
#[derive(Debug, Clone, Default)]
pub struct AccessGate {
    event_token: Option<String>,
}

impl AccessGate {
    /// Build a gate. An empty token is treated as no token.
    pub fn new(event_token: Option<String>) -> Self {
        Self {
            event_token: event_token.filter(|t| !t.is_empty()),
        }
    }

    /// Whether callers must present a token at all.
    pub fn is_token_required(&self) -> bool {
        self.event_token.is_some()
    }

    /// Whether `supplied` matches the configured token. Always `true` when no
    /// token is configured.
    pub fn is_token_valid(&self, supplied: Option<&str>) -> bool {
        match (&self.event_token, supplied) {
            (None, _) => true,
            (Some(expected), Some(given)) => constant_time_eq(expected, given),
            (Some(_), None) => false,
        }
    }

    /// Check a request's headers and URI against the gate.
    pub fn authorize(&self, headers: &HeaderMap, uri: &Uri) -> bool {
        if !self.is_token_required() {
            return true;
        }
        let supplied = extract_event_token(headers, uri);
        self.is_token_valid(supplied.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Pull the first event token present on a request.
pub fn extract_event_token(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    if let Some(token) = headers
        .get(EVENT_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        return Some(token.trim().to_owned());
    }

    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        return Some(token.trim().to_owned());
    }

    if let Ok(Query(TokenQuery { token: Some(token) })) = Query::<TokenQuery>::try_from_uri(uri) {
        return Some(token);
    }

    let cookies = headers.get(header::COOKIE).and_then(|v| v.to_str().ok())?;
    cookies.split(';').find_map(|part| {
        part.trim()
            .strip_prefix(EVENT_TOKEN_COOKIE)
            .and_then(|rest| rest.strip_prefix('='))
            .map(str::to_owned)
    })
}

/// Generate a random URL-safe event token suitable for QR-code links.
pub fn generate_event_token() -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: [u8; 24] = rng.gen();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Constant-time string comparison.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Access middleware. Applied to gallery routes only.
pub async fn access_middleware(
    State(ctx): State<AppContext>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    if ctx.gate.authorize(request.headers(), request.uri()) {
        return Ok(next.run(request).await);
    }

    tracing::debug!(path = %request.uri().path(), "Rejected request without valid event token");
    metrics::counter!("keepsake_access_denied_total").increment(1);

    let mut err = AppError::new(ks_core::Error::Unauthorized(
        "a valid event token is required".into(),
    ));
    if let Some(RequestId(id)) = request.extensions().get::<RequestId>() {
        err = err.with_request_id(id.clone());
    }
    Err(err)
}
