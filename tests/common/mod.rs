//! Shared helpers for pipeline integration tests.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rust_detect::classes::ClassNames;
use rust_detect::engine::{InferenceEngine, RawPrediction, BOX_FIELDS};
use rust_detect::error::AppError;
use rust_detect::pipeline::Detector;
use rust_detect::preprocess::tensor::Tensor;

pub const NUM_CLASSES: usize = 80;
pub const CANVAS: u32 = 640;

/// Engine that returns a fixed set of rows and remembers the last input.
pub struct SyntheticEngine {
    rows: Vec<Vec<f32>>,
    pub last_input: Mutex<Option<Tensor>>,
}

impl SyntheticEngine {
    pub fn new(rows: Vec<Vec<f32>>) -> Self {
        Self {
            rows,
            last_input: Mutex::new(None),
        }
    }
}

impl InferenceEngine for SyntheticEngine {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn run(&self, input: Tensor) -> Result<RawPrediction, AppError> {
        *self.last_input.lock().unwrap() = Some(input);
        RawPrediction::new(NUM_CLASSES, self.rows.concat())
    }
}

/// Engine whose inference call always fails.
pub struct FailingEngine;

impl InferenceEngine for FailingEngine {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn run(&self, _input: Tensor) -> Result<RawPrediction, AppError> {
        Err(AppError::EngineFailure("device lost".to_string()))
    }
}

/// One raw row in padded-canvas pixels with a single non-zero class score.
pub fn row(cx: f32, cy: f32, w: f32, h: f32, objectness: f32, class_id: usize, class_score: f32) -> Vec<f32> {
    let mut r = vec![0.0; BOX_FIELDS + NUM_CLASSES];
    r[..5].copy_from_slice(&[cx, cy, w, h, objectness]);
    r[BOX_FIELDS + class_id] = class_score;
    r
}

/// Value of an NCHW tensor at (batch, channel, y, x).
pub fn tensor_at(tensor: &Tensor, n: usize, c: usize, y: usize, x: usize) -> f32 {
    let [_, channels, height, width] = tensor.shape;
    tensor.data[((n * channels + c) * height + y) * width + x]
}

pub fn detector_with(engine: Arc<dyn InferenceEngine>) -> Detector {
    Detector::new(engine, ClassNames::coco(), CANVAS)
}

pub fn find_model_path() -> Option<PathBuf> {
    let candidates = vec!["data/yolov5m.onnx", "../data/yolov5m.onnx"];
    candidates
        .into_iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}
