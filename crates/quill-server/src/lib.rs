pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use quill_core::ServiceConfig;

pub use state::AppState;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(routes::health::health))
        .route("/api/generate", post(routes::generate::start_generation))
        .route("/api/generate/{id}", get(routes::generate::get_generation))
        .route(
            "/api/generate/{id}/cancel",
            post(routes::generate::cancel_generation),
        )
        .route(
            "/api/generate/{id}/events",
            get(routes::generate::generation_events),
        )
        .layer(cors)
        .with_state(app_state)
}

/// Start the generation API server.
pub async fn serve(config: ServiceConfig) -> anyhow::Result<()> {
    let port = config.port;
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(config, listener).await
}

/// Start the generation API server on a pre-bound listener.
///
/// Unlike `serve`, this accepts a `TcpListener` that was already bound so the
/// caller can read the actual port before starting (useful when `port = 0` and
/// the OS picks a free port).
pub async fn serve_on(
    config: ServiceConfig,
    listener: tokio::net::TcpListener,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(AppState::new(config));

    tracing::info!("generation API listening on http://localhost:{actual_port}");

    axum::serve(listener, app).await?;
    Ok(())
}
