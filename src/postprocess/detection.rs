//! Final detections in original image pixels.

use super::candidates::Candidate;
use crate::classes::ClassNames;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Detection {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    pub label: String,
    pub score: f32,
    /// Kept for rendering; not part of the JSON payload.
    #[serde(skip)]
    pub class_id: usize,
}

/// Round kept candidates to integer pixels clamped into `[0, w-1] x [0, h-1]`.
///
/// Scores are rounded to 6 decimals.
pub fn to_detections(
    kept: &[Candidate],
    classes: &ClassNames,
    orig_w: u32,
    orig_h: u32,
) -> Vec<Detection> {
    let max_x = orig_w.saturating_sub(1) as i32;
    let max_y = orig_h.saturating_sub(1) as i32;

    kept.iter()
        .map(|c| Detection {
            x1: (c.x1.round() as i32).clamp(0, max_x),
            y1: (c.y1.round() as i32).clamp(0, max_y),
            x2: (c.x2.round() as i32).clamp(0, max_x),
            y2: (c.y2.round() as i32).clamp(0, max_y),
            label: classes.label(c.class_id).into_owned(),
            score: round_score(c.score),
            class_id: c.class_id,
        })
        .collect()
}

fn round_score(score: f32) -> f32 {
    ((score as f64 * 1e6).round() / 1e6) as f32
}
