//! Draw detections onto a copy of the original image and encode it as PNG.

use crate::error::AppError;
use crate::postprocess::detection::Detection;
use crate::preprocess::decode::DecodedImage;
use ab_glyph::{FontVec, PxScale};
use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::io::Cursor;
use std::path::Path;
use tracing::{info, warn};

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const TEXT_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const BOX_THICKNESS: i32 = 2;
const LABEL_FONT_SIZE: f32 = 16.0;
// Tag size estimate when no font is available
const FALLBACK_CHAR_WIDTH: u32 = 8;
const FALLBACK_TEXT_HEIGHT: u32 = 12;
const TAG_PADDING: u32 = 6;

pub struct Renderer {
    font: Option<FontVec>,
    scale: PxScale,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::without_font()
    }
}

impl Renderer {
    pub fn without_font() -> Self {
        Self {
            font: None,
            scale: PxScale::from(LABEL_FONT_SIZE),
        }
    }

    /// Load the label font. A missing or invalid font leaves labels as plain tags.
    pub fn load(font_path: &Path) -> Self {
        let font = std::fs::read(font_path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| FontVec::try_from_vec(bytes).map_err(|e| e.to_string()));

        match font {
            Ok(font) => {
                info!(font = %font_path.display(), "label font loaded");
                Self {
                    font: Some(font),
                    ..Self::without_font()
                }
            }
            Err(e) => {
                warn!(
                    font = %font_path.display(),
                    error = %e,
                    "label font unavailable, rendering tags without text"
                );
                Self::without_font()
            }
        }
    }

    pub fn draw(&self, img: &DecodedImage, detections: &[Detection]) -> Result<RgbImage, AppError> {
        let mut canvas = img
            .to_rgb_image()
            .map_err(|e| AppError::RenderFailure(e.to_string()))?;
        for det in detections {
            self.draw_detection(&mut canvas, det);
        }
        Ok(canvas)
    }

    /// Render and PNG-encode.
    pub fn render_png(&self, img: &DecodedImage, detections: &[Detection]) -> Result<Vec<u8>, AppError> {
        let canvas = self.draw(img, detections)?;
        encode_png(&canvas)
    }

    fn draw_detection(&self, canvas: &mut RgbImage, det: &Detection) {
        let (w, h) = (canvas.width() as i32, canvas.height() as i32);

        let x1 = det.x1.clamp(0, w - 1);
        let y1 = det.y1.clamp(0, h - 1);
        let x2 = det.x2.clamp(x1, w - 1);
        let y2 = det.y2.clamp(y1, h - 1);

        for t in 0..BOX_THICKNESS {
            let rw = (x2 - x1 + 1 - 2 * t).max(1) as u32;
            let rh = (y2 - y1 + 1 - 2 * t).max(1) as u32;
            draw_hollow_rect_mut(canvas, Rect::at(x1 + t, y1 + t).of_size(rw, rh), BOX_COLOR);
        }

        let label = format!("{} {:.2}", det.label, det.score);
        let (text_w, text_h) = match &self.font {
            Some(font) => text_size(self.scale, font, &label),
            None => (label.len() as u32 * FALLBACK_CHAR_WIDTH, FALLBACK_TEXT_HEIGHT),
        };

        // Tag sits above the top-left corner, pushed inside when it would leave the canvas
        let tag_w = (text_w + 2).min(w as u32);
        let tag_h = (text_h + TAG_PADDING).min(h as u32);
        let tag_x = x1.min(w - tag_w as i32).max(0);
        let tag_y = (y1 - tag_h as i32).max(0);

        draw_filled_rect_mut(canvas, Rect::at(tag_x, tag_y).of_size(tag_w, tag_h), BOX_COLOR);

        if let Some(font) = &self.font {
            draw_text_mut(
                canvas,
                TEXT_COLOR,
                tag_x + 1,
                tag_y + (TAG_PADDING / 2) as i32,
                self.scale,
                font,
                &label,
            );
        }
    }
}

pub fn encode_png(canvas: &RgbImage) -> Result<Vec<u8>, AppError> {
    let mut buf = Cursor::new(Vec::new());
    canvas
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| AppError::RenderFailure(e.to_string()))?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::decode::ChannelOrder;

    fn detection(x1: i32, y1: i32, x2: i32, y2: i32) -> Detection {
        Detection {
            x1,
            y1,
            x2,
            y2,
            label: "person".to_string(),
            score: 0.81,
            class_id: 0,
        }
    }

    #[test]
    fn draws_box_outline_and_tag() {
        let img = DecodedImage::filled(100, 60, ChannelOrder::Rgb, [255, 255, 255]);
        let canvas = Renderer::without_font()
            .draw(&img, &[detection(20, 30, 60, 50)])
            .expect("draw");

        assert_eq!(*canvas.get_pixel(40, 30), BOX_COLOR);
        assert_eq!(*canvas.get_pixel(20, 40), BOX_COLOR);
        assert_eq!(*canvas.get_pixel(40, 40), Rgb([255, 255, 255]));
        // Tag fills the area just above the top-left corner
        assert_eq!(*canvas.get_pixel(22, 25), BOX_COLOR);
    }

    #[test]
    fn tag_is_clipped_onto_canvas() {
        let img = DecodedImage::filled(40, 30, ChannelOrder::Rgb, [255, 255, 255]);
        let canvas = Renderer::without_font()
            .draw(&img, &[detection(35, 0, 39, 29)])
            .expect("draw");
        assert_eq!((canvas.width(), canvas.height()), (40, 30));
        assert_eq!(*canvas.get_pixel(0, 0), BOX_COLOR);
    }

    #[test]
    fn renders_png_that_decodes_to_same_size() {
        let img = DecodedImage::filled(32, 16, ChannelOrder::Bgr, [0, 0, 255]);
        let png = Renderer::without_font()
            .render_png(&img, &[])
            .expect("render");
        let decoded = image::load_from_memory(&png).expect("png").to_rgb8();
        assert_eq!(decoded.dimensions(), (32, 16));
        // BGR input is written out as RGB
        assert_eq!(*decoded.get_pixel(0, 0), Rgb([255, 0, 0]));
    }

    #[test]
    fn missing_font_falls_back() {
        let renderer = Renderer::load(Path::new("/nonexistent/font.ttf"));
        assert!(renderer.font.is_none());
    }
}
