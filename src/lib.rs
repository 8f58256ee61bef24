//! YOLO object-detection service.
//!
//! Letterbox preprocessing, ONNX Runtime inference and per-class NMS behind
//! a small axum API.

pub mod classes;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod pipeline;
pub mod postprocess;
pub mod preprocess;
pub mod render;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use handlers::predict::AppState;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the HTTP router around shared state.
pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/",
            get({
                let state = state.clone();
                move || handlers::health::health(axum::extract::State(state))
            }),
        )
        .route(
            "/predict",
            post({
                let state = state.clone();
                move |query, multipart| {
                    handlers::predict::predict(axum::extract::State(state), query, multipart)
                }
            }),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
