use crate::server::routes;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Build the Axum application
pub fn build_app(state: AppState) -> Router {
    Router::new()
        // Prediction
        .route("/predict", post(routes::predict))
        .route("/test-like-count", post(routes::test_like_count))
        // History
        .route("/history", get(routes::list_history))
        .route("/history/clear", delete(routes::clear_history))
        .route("/history/:id", delete(routes::delete_history_item))
        .route("/stats", get(routes::get_stats))
        // Diagnostics
        .route("/health", get(routes::health))
        .route("/debug", get(routes::debug_info))
        .route("/metrics", get(routes::metrics))
        .fallback(routes::fallback)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the server until `shutdown` resolves
pub async fn run_server(
    state: AppState,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("CommentScope listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
