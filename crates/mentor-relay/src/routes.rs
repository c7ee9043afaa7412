//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, request tracing, the `/api`
//! endpoints and, when configured, the widget's static files.

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use mentor_core::config::ServerConfig;
use mentor_core::error::MentorError;

use crate::handlers;
use crate::state::AppState;

/// CORS policy: any origin unless an allowlist is configured.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    if config.allowed_origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/threads", post(handlers::create_thread))
        .route(
            "/threads/{thread_id}/messages",
            get(handlers::list_thread_messages),
        )
        .route("/messages", post(handlers::send_message));

    let mut router = Router::new().nest("/api", api);

    if let Some(dir) = state.server.static_dir.as_deref() {
        tracing::info!(dir = %dir, "Serving static files");
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.server))
        .with_state(state)
}

/// Resolves when the process receives Ctrl-C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn start_server(state: AppState) -> Result<(), MentorError> {
    let addr = format!("{}:{}", state.server.host, state.server.port);
    let router = create_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MentorError::Server(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!(addr = %addr, "Relay listening");
    for endpoint in [
        "POST /api/threads",
        "POST /api/messages",
        "GET  /api/threads/{id}/messages",
        "GET  /api/health",
    ] {
        tracing::info!("  {}", endpoint);
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| MentorError::Server(format!("Server error: {}", e)))?;

    tracing::info!(uptime_secs = state.uptime().as_secs(), "Relay stopped");
    Ok(())
}
