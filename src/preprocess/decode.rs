//! Image decoding: turbojpeg for JPEG, image crate for PNG/WebP/BMP fallback.

use crate::error::AppError;

/// Byte order of the three channels of a pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgb,
    Bgr,
}

#[derive(Clone, Debug)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub order: ChannelOrder,
    /// Pixel data, row-major, 3 bytes per pixel in `order`
    pub data: Vec<u8>,
}

impl DecodedImage {
    /// Wrap a raw pixel buffer, checking that it matches the dimensions.
    pub fn from_raw(
        width: u32,
        height: u32,
        order: ChannelOrder,
        data: Vec<u8>,
    ) -> Result<Self, AppError> {
        if width == 0 || height == 0 {
            return Err(AppError::InvalidImage(format!(
                "zero-area image ({width}x{height})"
            )));
        }
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(AppError::InvalidImage(format!(
                "pixel buffer holds {} bytes, expected {expected} for {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            order,
            data,
        })
    }

    /// Solid-color image, mostly useful for tests and padding canvases.
    pub fn filled(width: u32, height: u32, order: ChannelOrder, pixel: [u8; 3]) -> Self {
        let data = pixel.repeat(width as usize * height as usize);
        Self {
            width,
            height,
            order,
            data,
        }
    }

    /// Return a copy of the image with channels in `order`.
    pub fn to_order(&self, order: ChannelOrder) -> DecodedImage {
        let mut data = self.data.clone();
        if order != self.order {
            for px in data.chunks_exact_mut(3) {
                px.swap(0, 2);
            }
        }
        DecodedImage {
            width: self.width,
            height: self.height,
            order,
            data,
        }
    }

    pub fn to_rgb_image(&self) -> Result<image::RgbImage, AppError> {
        let rgb = self.to_order(ChannelOrder::Rgb);
        image::RgbImage::from_raw(rgb.width, rgb.height, rgb.data).ok_or_else(|| {
            AppError::InvalidImage("pixel buffer does not match dimensions".to_string())
        })
    }
}

/// Decode image bytes into RGB pixel data.
pub fn decode_image(data: &[u8]) -> Result<DecodedImage, AppError> {
    if data.is_empty() {
        return Err(AppError::InvalidImage("empty upload".to_string()));
    }

    // Check JPEG magic bytes
    let decoded = if data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8 {
        decode_jpeg(data).map_err(AppError::InvalidImage)?
    } else {
        decode_fallback(data)?
    };

    DecodedImage::from_raw(
        decoded.width,
        decoded.height,
        ChannelOrder::Rgb,
        decoded.data,
    )
}

fn decode_jpeg(data: &[u8]) -> Result<DecodedImage, String> {
    let mut decompressor = turbojpeg::Decompressor::new().map_err(|e| format!("turbojpeg init: {e}"))?;
    let header = decompressor
        .read_header(data)
        .map_err(|e| format!("JPEG header: {e}"))?;

    let width = header.width;
    let height = header.height;
    let pitch = width * 3; // RGB, 3 bytes per pixel

    let mut pixels = vec![0u8; pitch * height];
    let image = turbojpeg::Image {
        pixels: pixels.as_mut_slice(),
        width,
        pitch,
        height,
        format: turbojpeg::PixelFormat::RGB,
    };

    decompressor
        .decompress(data, image)
        .map_err(|e| format!("JPEG decode: {e}"))?;

    Ok(DecodedImage {
        width: width as u32,
        height: height as u32,
        order: ChannelOrder::Rgb,
        data: pixels,
    })
}

fn decode_fallback(data: &[u8]) -> Result<DecodedImage, image::ImageError> {
    let img = image::load_from_memory(data)?;
    let rgb = img.to_rgb8();
    let width = rgb.width();
    let height = rgb.height();
    Ok(DecodedImage {
        width,
        height,
        order: ChannelOrder::Rgb,
        data: rgb.into_raw(),
    })
}
