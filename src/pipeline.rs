//! Detection pipeline: letterbox -> tensor -> engine -> decode -> rescale -> NMS.
//!
//! Thresholds travel with each call; the detector itself holds no per-request state.

use crate::classes::ClassNames;
use crate::engine::InferenceEngine;
use crate::error::AppError;
use crate::postprocess::candidates::decode_candidates;
use crate::postprocess::detection::{to_detections, Detection};
use crate::postprocess::nms::non_max_suppression;
use crate::postprocess::rescale::rescale_candidates;
use crate::preprocess::decode::DecodedImage;
use crate::preprocess::letterbox::letterbox;
use crate::preprocess::tensor::to_tensor;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    pub conf: f32,
    pub iou: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            conf: 0.25,
            iou: 0.45,
        }
    }
}

impl Thresholds {
    pub fn new(conf: f32, iou: f32) -> Result<Self, AppError> {
        for (name, value) in [("conf", conf), ("iou", iou)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AppError::BadRequest(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(Self { conf, iou })
    }
}

/// JSON body of a successful `/predict` call.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionOutput {
    pub boxes: Vec<Detection>,
    pub width: u32,
    pub height: u32,
}

pub struct Detector {
    engine: Arc<dyn InferenceEngine>,
    classes: ClassNames,
    input_size: u32,
}

impl Detector {
    pub fn new(engine: Arc<dyn InferenceEngine>, classes: ClassNames, input_size: u32) -> Self {
        Self {
            engine,
            classes,
            input_size,
        }
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub fn detect(
        &self,
        img: &DecodedImage,
        thresholds: Thresholds,
    ) -> Result<DetectionOutput, AppError> {
        let start = Instant::now();

        let lb = letterbox(img, self.input_size)?;
        let tensor = to_tensor(&lb.image, self.engine.channel_order())?;

        let prediction = self.engine.run(tensor)?;

        let mut candidates = decode_candidates(&prediction, thresholds.conf);
        let num_candidates = candidates.len();
        rescale_candidates(&mut candidates, &lb);
        let kept = non_max_suppression(&candidates, thresholds.iou);
        let boxes = to_detections(&kept, &self.classes, lb.orig_w, lb.orig_h);

        debug!(
            rows = prediction.num_candidates(),
            candidates = num_candidates,
            kept = boxes.len(),
            conf = thresholds.conf,
            iou = thresholds.iou,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "detection finished"
        );

        Ok(DetectionOutput {
            boxes,
            width: lb.orig_w,
            height: lb.orig_h,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_must_be_unit_interval() {
        assert!(Thresholds::new(0.0, 1.0).is_ok());
        assert!(matches!(
            Thresholds::new(1.2, 0.45),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            Thresholds::new(0.25, -0.1),
            Err(AppError::BadRequest(_))
        ));
        assert!(Thresholds::new(f32::NAN, 0.5).is_err());
    }
}
