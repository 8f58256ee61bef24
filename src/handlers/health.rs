//! Health probe: GET /

use super::predict::AppState;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize, PartialEq)]
pub struct Health {
    pub ok: bool,
    pub model: String,
    pub backend: &'static str,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<Health> {
    Json(Health {
        ok: true,
        model: state.model_name.clone(),
        backend: state.detector.engine_name(),
    })
}
