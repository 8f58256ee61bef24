//! YOLO letterbox preprocessing.
//!
//! 1. scale = min(S/w, S/h), one ratio for both axes
//! 2. new_w = round(w * scale), new_h = round(h * scale)
//! 3. Resize with bilinear interpolation (skipped when the size is unchanged)
//! 4. Split padding with the Ultralytics rounding trick
//! 5. Fill the border with gray 114

use super::decode::DecodedImage;
use crate::error::AppError;

pub const PAD_VALUE: u8 = 114;

#[derive(Clone, Debug)]
pub struct LetterboxResult {
    /// Padded canvas, `target_size` x `target_size`, same channel order as the input
    pub image: DecodedImage,
    pub scale: f64,
    pub pad_x: u32,
    pub pad_y: u32,
    pub orig_w: u32,
    pub orig_h: u32,
}

impl LetterboxResult {
    /// Map a point from original-image space into padded-canvas space.
    pub fn to_canvas(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x * self.scale + self.pad_x as f64,
            y * self.scale + self.pad_y as f64,
        )
    }

    /// Map a point from padded-canvas space back to original-image space (unclipped).
    pub fn to_original(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.pad_x as f64) / self.scale,
            (y - self.pad_y as f64) / self.scale,
        )
    }
}

/// Padding on each side: (before, after).
///
/// The ±0.1 bias puts the odd pixel after the image so both sides stay integral.
pub fn split_padding(total: u32) -> (u32, u32) {
    let half = total as f64 / 2.0;
    ((half - 0.1).round() as u32, (half + 0.1).round() as u32)
}

pub fn letterbox(img: &DecodedImage, target_size: u32) -> Result<LetterboxResult, AppError> {
    if img.width == 0 || img.height == 0 {
        return Err(AppError::InvalidImage(format!(
            "cannot letterbox zero-area image ({}x{})",
            img.width, img.height
        )));
    }
    if target_size == 0 {
        return Err(AppError::InvalidImage("letterbox target size is zero".to_string()));
    }

    let orig_h = img.height as f64;
    let orig_w = img.width as f64;
    let target = target_size as f64;

    let scale = (target / orig_w).min(target / orig_h);

    let new_w = ((orig_w * scale).round() as u32).clamp(1, target_size);
    let new_h = ((orig_h * scale).round() as u32).clamp(1, target_size);

    let resized = if (new_w, new_h) != (img.width, img.height) {
        resize_bilinear(&img.data, img.width, img.height, new_w, new_h)?
    } else {
        img.data.clone()
    };

    let (left, right) = split_padding(target_size - new_w);
    let (top, bottom) = split_padding(target_size - new_h);
    debug_assert_eq!(left + new_w + right, target_size);
    debug_assert_eq!(top + new_h + bottom, target_size);

    let ts = target_size as usize;
    let mut padded = vec![PAD_VALUE; ts * ts * 3];

    // Copy resized image into center
    let row_bytes = new_w as usize * 3;
    for y in 0..new_h as usize {
        let src_offset = y * row_bytes;
        let dst_offset = ((y + top as usize) * ts + left as usize) * 3;
        padded[dst_offset..dst_offset + row_bytes]
            .copy_from_slice(&resized[src_offset..src_offset + row_bytes]);
    }

    Ok(LetterboxResult {
        image: DecodedImage {
            width: target_size,
            height: target_size,
            order: img.order,
            data: padded,
        },
        scale,
        pad_x: left,
        pad_y: top,
        orig_w: img.width,
        orig_h: img.height,
    })
}

/// Bilinear resize for 3-channel images using fast_image_resize.
fn resize_bilinear(
    src: &[u8],
    src_w: u32,
    src_h: u32,
    dst_w: u32,
    dst_h: u32,
) -> Result<Vec<u8>, AppError> {
    use fast_image_resize as fr;

    let src_image = fr::images::Image::from_vec_u8(src_w, src_h, src.to_vec(), fr::PixelType::U8x3)
        .map_err(|e| AppError::InvalidImage(format!("resize source: {e}")))?;

    let mut dst_image = fr::images::Image::new(dst_w, dst_h, fr::PixelType::U8x3);

    let mut resizer = fr::Resizer::new();
    resizer
        .resize(
            &src_image,
            &mut dst_image,
            &fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Interpolation(
                fr::FilterType::Bilinear,
            )),
        )
        .map_err(|e| AppError::Internal(format!("resize failed: {e}")))?;

    Ok(dst_image.into_vec())
}
