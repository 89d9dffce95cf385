//! Single-page web dashboard

pub mod form;
pub mod page;
pub mod plot;
pub mod routes;

pub use routes::AppState;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

/// Build the dashboard router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/analyze", post(routes::analyze))
        .route("/health", get(routes::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
