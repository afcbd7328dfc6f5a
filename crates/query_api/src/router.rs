use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{self, AppState};

/// Create the main application router with all API endpoints
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        // Natural-language queries
        .route("/query", post(handlers::handle_query))
        // Rule-based checks
        .route("/api/anomalies", get(handlers::get_anomalies))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
