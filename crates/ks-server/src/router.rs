//! Axum router construction.
//!
//! Builds the full application router with the gated media routes, the
//! open system routes, middleware layers, and optional static UI serving.

use axum::http::{header, Method};
use axum::middleware;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::context::AppContext;
use crate::middleware::access::access_middleware;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
    paths(routes::health::health_check, routes::media::get_media),
    components(schemas(routes::health::HealthResponse))
)]
pub struct ApiDoc;

/// GET /api-docs/openapi.json
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD])
        .allow_headers(Any)
        .expose_headers([
            header::ACCEPT_RANGES,
            header::CONTENT_LENGTH,
            header::CONTENT_RANGE,
        ]);

    // Gallery media -- behind the event-token gate.
    let media_routes = Router::new()
        .route("/media", get(routes::media::missing_path))
        .route("/media/", get(routes::media::missing_path))
        .route("/media/{*path}", get(routes::media::get_media))
        .route_layer(middleware::from_fn_with_state(
            ctx.clone(),
            access_middleware,
        ));

    let static_dir = ctx.config.server.static_dir.clone();

    let mut app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::metrics::metrics_handler))
        .route("/api-docs/openapi.json", get(openapi_json))
        .merge(media_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx);

    // Static file serving for a prebuilt gallery UI.
    if let Some(dir) = static_dir {
        if dir.exists() {
            tracing::info!("Serving static files from {:?}", dir);
            let index_path = dir.join("index.html");
            app = app.fallback_service(
                tower_http::services::ServeDir::new(&dir)
                    .append_index_html_on_directories(true)
                    .not_found_service(tower_http::services::ServeFile::new(index_path)),
            );
        }
    }

    app
}
