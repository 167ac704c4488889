pub mod request_id;

use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::controllers::{audio, health, synthesis::SynthesisController, ui};
use crate::domain::synthesis::SynthesisService;
use crate::infrastructure::config::Config;

pub use request_id::{request_id_middleware, request_id_of, RequestId, X_REQUEST_ID};

/// Build the application router with all routes configured
pub fn build_router(
    synthesis_service: Arc<SynthesisService>,
    synthesis_controller: Arc<SynthesisController>,
) -> Router {
    // Synthesis routes accept reference audio uploads
    let synthesis_routes = Router::new()
        .route("/api/synthesize", post(SynthesisController::synthesize))
        .route(
            "/api/synthesize/stream",
            post(SynthesisController::synthesize_stream),
        )
        .layer(DefaultBodyLimit::max(synthesis_controller.body_limit()))
        .route("/api/languages", get(SynthesisController::languages))
        .with_state(synthesis_controller);

    // Audio downloads and health checks
    let service_routes = Router::new()
        .route("/api/audio/:file_name", get(audio::download))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(synthesis_service);

    Router::new()
        .route("/", get(ui::index))
        .merge(synthesis_routes)
        .merge(service_routes)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id_of(request),
                    )
                })),
        )
}

/// Start the HTTP server
pub async fn start_http_server(
    config: Arc<Config>,
    app: Router,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
