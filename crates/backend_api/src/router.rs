use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{handlers, state::AppState};

/// Create the main application router with all API endpoints
pub fn create_router(state: AppState) -> Router {
    // Create CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Access gate
        .route("/api/login", post(handlers::login))
        // Dashboard endpoints
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/positions", get(handlers::get_positions))
        .route("/api/positions/range", get(handlers::get_positions_range))
        .route(
            "/api/distribution/:dimension",
            get(handlers::get_distribution),
        )
        .route("/api/warnings", get(handlers::get_warnings))
        .route("/api/export.csv", get(handlers::export_csv))
        // Cache management
        .route("/api/cache/invalidate", post(handlers::invalidate_cache))
        // Add shared state
        .with_state(state)
        // Add middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
