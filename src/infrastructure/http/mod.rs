use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::controllers::{health, podcast::PodcastController};
use crate::domain::podcast::PodcastService;
use crate::infrastructure::middleware::request_id_middleware;

/// Room for the multipart envelope and form fields around the document
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the application router
pub fn build_router(
    podcast_service: Arc<PodcastService>,
    podcast_controller: Arc<PodcastController>,
    max_upload_bytes: usize,
) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let podcast_routes = Router::new()
        .route("/upload", post(PodcastController::upload))
        .route("/status/:job_id", get(PodcastController::status))
        .route("/cancel/:job_id", post(PodcastController::cancel))
        .route("/download/:identifier", get(PodcastController::download))
        .with_state(podcast_controller)
        .layer(DefaultBodyLimit::max(
            max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
        ));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(podcast_service)
        .merge(podcast_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
}

/// Serve `app` until `shutdown` fires
pub async fn start_http_server(
    host: &str,
    port: u16,
    app: Router,
    shutdown: CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("HTTP server stopped");

    Ok(())
}
