//! Inverse letterbox: padded-canvas coordinates -> original image pixels.

use super::candidates::Candidate;
use crate::preprocess::letterbox::LetterboxResult;

/// Map boxes back through `lb` and clip to `[0, w-1] x [0, h-1]`.
pub fn rescale_candidates(candidates: &mut [Candidate], lb: &LetterboxResult) {
    let max_x = lb.orig_w.saturating_sub(1) as f64;
    let max_y = lb.orig_h.saturating_sub(1) as f64;

    for c in candidates.iter_mut() {
        let (x1, y1) = lb.to_original(c.x1 as f64, c.y1 as f64);
        let (x2, y2) = lb.to_original(c.x2 as f64, c.y2 as f64);
        c.x1 = x1.clamp(0.0, max_x) as f32;
        c.y1 = y1.clamp(0.0, max_y) as f32;
        c.x2 = x2.clamp(0.0, max_x) as f32;
        c.y2 = y2.clamp(0.0, max_y) as f32;
    }
}
