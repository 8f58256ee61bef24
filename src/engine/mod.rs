//! Inference engine boundary.
//!
//! The detector only needs `run(tensor) -> RawPrediction`; everything after
//! that is engine-agnostic and tested with synthetic predictions.

pub mod onnx;

use crate::error::AppError;
use crate::preprocess::decode::ChannelOrder;
use crate::preprocess::tensor::Tensor;

pub use onnx::OnnxEngine;

/// Number of leading fields per row before the class scores: cx, cy, w, h, objectness.
pub const BOX_FIELDS: usize = 5;

pub trait InferenceEngine: Send + Sync {
    /// Backend name reported by the health probe.
    fn name(&self) -> &'static str;

    /// Channel order the model was trained with.
    fn channel_order(&self) -> ChannelOrder {
        ChannelOrder::Rgb
    }

    /// Run one batch-1 input; the tensor buffer moves into the backend.
    fn run(&self, input: Tensor) -> Result<RawPrediction, AppError>;
}

/// Raw detector output for one image: `num_candidates` rows of
/// `[cx, cy, w, h, objectness, class_0 .. class_{C-1}]`.
#[derive(Clone, Debug)]
pub struct RawPrediction {
    num_candidates: usize,
    num_classes: usize,
    data: Vec<f32>,
}

impl RawPrediction {
    pub fn new(num_classes: usize, data: Vec<f32>) -> Result<Self, AppError> {
        let row_len = BOX_FIELDS + num_classes;
        if num_classes == 0 || data.len() % row_len != 0 {
            return Err(AppError::EngineFailure(format!(
                "output of {} values does not split into rows of {row_len}",
                data.len()
            )));
        }
        Ok(Self {
            num_candidates: data.len() / row_len,
            num_classes,
            data,
        })
    }

    /// Build from an engine output shaped `[1, N, 5 + C]` or `[N, 5 + C]`.
    pub fn from_shape(shape: &[i64], data: Vec<f32>) -> Result<Self, AppError> {
        let dims: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
        let row_len = match dims.as_slice() {
            [1, _, row_len] | [_, row_len] => *row_len,
            _ => {
                return Err(AppError::EngineFailure(format!(
                    "unexpected output shape {shape:?}, expected [1, N, 5 + classes]"
                )))
            }
        };
        if row_len <= BOX_FIELDS {
            return Err(AppError::EngineFailure(format!(
                "output rows of {row_len} values carry no class scores"
            )));
        }
        Self::new(row_len - BOX_FIELDS, data)
    }

    pub fn num_candidates(&self) -> usize {
        self.num_candidates
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn rows(&self) -> std::slice::ChunksExact<'_, f32> {
        self.data.chunks_exact(BOX_FIELDS + self.num_classes)
    }
}
