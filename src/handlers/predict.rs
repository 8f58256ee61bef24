//! Detection endpoint: POST /predict

use crate::error::AppError;
use crate::pipeline::{DetectionOutput, Detector, Thresholds};
use crate::preprocess::decode::decode_image;
use crate::render::Renderer;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

pub struct AppState {
    pub detector: Detector,
    pub renderer: Renderer,
    /// Used when a request leaves `conf` or `iou` out.
    pub defaults: Thresholds,
    pub model_name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PredictParams {
    pub render: Option<String>,
    pub conf: Option<f32>,
    pub iou: Option<f32>,
}

impl PredictParams {
    pub fn render(&self) -> Result<bool, AppError> {
        match self.render.as_deref() {
            None => Ok(false),
            Some(value) => parse_flag(value)
                .ok_or_else(|| AppError::BadRequest(format!("render must be a boolean, got {value:?}"))),
        }
    }

    pub fn thresholds(&self, defaults: Thresholds) -> Result<Thresholds, AppError> {
        Thresholds::new(
            self.conf.unwrap_or(defaults.conf),
            self.iou.unwrap_or(defaults.iou),
        )
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// POST /predict - Single image detection, JSON or annotated PNG
pub async fn predict(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PredictParams>, QueryRejection>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let start = Instant::now();

    let Query(params) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let render = params.render()?;
    let thresholds = params.thresholds(state.defaults)?;

    // Prefer the `file` field, otherwise take the first field that carries data
    let mut image_bytes = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Multipart error: {e}")))?
    {
        let is_file = field.name() == Some("file");
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read image: {e}")))?;
        if is_file {
            image_bytes = Some(data);
            break;
        }
        if image_bytes.is_none() && !data.is_empty() {
            image_bytes = Some(data);
        }
    }

    let image_bytes = image_bytes
        .ok_or_else(|| AppError::BadRequest("No file field in request".to_string()))?;

    // CPU-bound work runs on the blocking pool
    let worker_state = state.clone();
    let response = tokio::task::spawn_blocking(move || {
        let img = decode_image(&image_bytes)?;
        let output = worker_state.detector.detect(&img, thresholds)?;
        if render {
            let png = worker_state.renderer.render_png(&img, &output.boxes)?;
            Ok::<_, AppError>(PredictResponse::Png(png, output.boxes.len()))
        } else {
            Ok(PredictResponse::Json(output))
        }
    })
    .await??;

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    match response {
        PredictResponse::Json(output) => {
            info!(
                boxes = output.boxes.len(),
                width = output.width,
                height = output.height,
                elapsed_ms,
                "predict"
            );
            Ok(Json(output).into_response())
        }
        PredictResponse::Png(png, boxes) => {
            info!(boxes, bytes = png.len(), elapsed_ms, "predict (rendered)");
            Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
        }
    }
}

enum PredictResponse {
    Json(DetectionOutput),
    Png(Vec<u8>, usize),
}
