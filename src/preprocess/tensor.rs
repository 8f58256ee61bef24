//! Tensor codec: padded HWC u8 canvas -> NCHW f32 in [0, 1].

use super::decode::{ChannelOrder, DecodedImage};
use crate::error::AppError;

/// Dense FP32 tensor in row-major layout.
#[derive(Clone, Debug)]
pub struct Tensor {
    /// [N, C, H, W]
    pub shape: [usize; 4],
    pub data: Vec<f32>,
}

/// Convert a square padded image into a `[1, 3, S, S]` tensor in `order`.
pub fn to_tensor(img: &DecodedImage, order: ChannelOrder) -> Result<Tensor, AppError> {
    let w = img.width as usize;
    let h = img.height as usize;
    if w == 0 || h == 0 || img.data.len() != w * h * 3 {
        return Err(AppError::InvalidImage(format!(
            "malformed canvas: {}x{} with {} bytes",
            img.width,
            img.height,
            img.data.len()
        )));
    }

    // Source channel index for each destination plane
    let planes: [usize; 3] = if order == img.order { [0, 1, 2] } else { [2, 1, 0] };

    let plane = w * h;
    let mut data = vec![0.0f32; 3 * plane];

    for (i, px) in img.data.chunks_exact(3).enumerate() {
        data[i] = px[planes[0]] as f32 / 255.0;
        data[plane + i] = px[planes[1]] as f32 / 255.0;
        data[2 * plane + i] = px[planes[2]] as f32 / 255.0;
    }

    Ok(Tensor {
        shape: [1, 3, h, w],
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(t: &Tensor, c: usize, y: usize, x: usize) -> f32 {
        let [_, _, height, width] = t.shape;
        t.data[(c * height + y) * width + x]
    }

    #[test]
    fn transposes_and_normalizes() {
        let img = DecodedImage::from_raw(
            2,
            1,
            ChannelOrder::Rgb,
            vec![255, 0, 51, 0, 255, 102],
        )
        .expect("image");
        let tensor = to_tensor(&img, ChannelOrder::Rgb).expect("tensor");

        assert_eq!(tensor.shape, [1, 3, 1, 2]);
        assert_eq!(tensor.data.len(), 6);
        assert_eq!(at(&tensor, 0, 0, 0), 1.0);
        assert_eq!(at(&tensor, 1, 0, 1), 1.0);
        assert!((at(&tensor, 2, 0, 0) - 0.2).abs() < 1e-6);
        assert!((at(&tensor, 2, 0, 1) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn reorders_bgr_input_for_rgb_engine() {
        let img = DecodedImage::filled(3, 3, ChannelOrder::Bgr, [0, 128, 255]);
        let tensor = to_tensor(&img, ChannelOrder::Rgb).expect("tensor");
        assert_eq!(at(&tensor, 0, 1, 1), 1.0);
        assert_eq!(at(&tensor, 2, 2, 2), 0.0);
        assert!(tensor.data.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn rejects_malformed_buffer() {
        let img = DecodedImage {
            width: 4,
            height: 4,
            order: ChannelOrder::Rgb,
            data: vec![0; 10],
        };
        assert!(matches!(
            to_tensor(&img, ChannelOrder::Rgb),
            Err(AppError::InvalidImage(_))
        ));
    }
}
