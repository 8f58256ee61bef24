//! ONNX Runtime backend with a small session pool.
//!
//! A session needs exclusive access while running, so each one sits behind a
//! mutex and requests pick sessions round-robin.

use super::{InferenceEngine, RawPrediction};
use crate::error::AppError;
use crate::preprocess::tensor::Tensor;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::{debug, info};

pub struct OnnxEngine {
    sessions: Vec<Mutex<Session>>,
    next_session: AtomicUsize,
    input_name: String,
}

impl OnnxEngine {
    /// Load `pool_size` sessions from `model_path`.
    ///
    /// `intra_threads == 0` keeps the runtime's default thread count.
    pub fn load(model_path: &Path, pool_size: usize, intra_threads: usize) -> Result<Self, AppError> {
        if !model_path.is_file() {
            return Err(AppError::ModelNotLoaded(format!(
                "ONNX model not found at {}. Export the detector to ONNX and point MODEL_PATH at it",
                model_path.display()
            )));
        }

        let pool_size = pool_size.max(1);
        let mut sessions = Vec::with_capacity(pool_size);

        for _ in 0..pool_size {
            let session = build_session(model_path, intra_threads).map_err(|e| {
                AppError::ModelNotLoaded(format!("{}: {e}", model_path.display()))
            })?;
            sessions.push(session);
        }

        let input_name = sessions[0]
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| AppError::ModelNotLoaded("model declares no inputs".to_string()))?;

        info!(
            model = %model_path.display(),
            input = %input_name,
            pool_size,
            "ONNX sessions loaded"
        );

        Ok(Self {
            sessions: sessions.into_iter().map(Mutex::new).collect(),
            next_session: AtomicUsize::new(0),
            input_name,
        })
    }

    /// Get next session using round-robin.
    fn get_session(&self) -> &Mutex<Session> {
        let idx = self.next_session.fetch_add(1, Ordering::Relaxed) % self.sessions.len();
        &self.sessions[idx]
    }
}

fn build_session(model_path: &Path, intra_threads: usize) -> ort::Result<Session> {
    let mut builder = Session::builder()?.with_optimization_level(GraphOptimizationLevel::Level3)?;
    if intra_threads > 0 {
        builder = builder.with_intra_threads(intra_threads)?;
    }
    builder.commit_from_file(model_path)
}

impl InferenceEngine for OnnxEngine {
    fn name(&self) -> &'static str {
        "onnxruntime"
    }

    fn run(&self, input: Tensor) -> Result<RawPrediction, AppError> {
        let Tensor { shape, data } = input;
        let value = ort::value::Tensor::from_array((shape.to_vec(), data))?;

        let mut session = self
            .get_session()
            .lock()
            .map_err(|_| AppError::EngineFailure("session lock poisoned".to_string()))?;

        let outputs = session.run(ort::inputs![self.input_name.as_str() => value])?;
        if outputs.len() == 0 {
            return Err(AppError::EngineFailure("model produced no outputs".to_string()));
        }

        let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;
        let shape: Vec<i64> = shape.iter().copied().collect();
        debug!(?shape, "inference output");

        RawPrediction::from_shape(&shape, data.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_is_model_not_loaded() {
        let result = OnnxEngine::load(Path::new("/nonexistent/yolov5m.onnx"), 1, 0);
        match result {
            Err(AppError::ModelNotLoaded(msg)) => assert!(msg.contains("/nonexistent/yolov5m.onnx")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("missing model should not load"),
        }
    }
}
