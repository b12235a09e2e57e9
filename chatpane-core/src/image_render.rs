use std::io::Cursor;

use bytes::Bytes;
use image::{ImageReader, Limits, imageops::FilterType};

use crate::{CoreError, MAX_DECODE_DIMENSION};

/// A decoded image resized for inline display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaledImage {
    /// Encoded bytes as received.
    pub source: Bytes,
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA8 pixels, `width * height * 4` bytes.
    pub rgba: Vec<u8>,
}

impl ScaledImage {
    pub fn size(&self) -> [usize; 2] {
        [self.width as usize, self.height as usize]
    }
}

/// Decode `bytes` and scale the result to `target_width`, keeping the aspect
/// ratio. Small images are scaled up.
pub fn decode_scaled(bytes: &Bytes, target_width: u32) -> Result<ScaledImage, CoreError> {
    if bytes.is_empty() {
        return Err(CoreError::EmptyImage);
    }

    let mut reader = ImageReader::new(Cursor::new(bytes.as_ref()))
        .with_guessed_format()
        .map_err(|err| CoreError::ImageDecode(err.to_string()))?;
    if reader.format().is_none() {
        return Err(CoreError::UnrecognizedImage);
    }

    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_DECODE_DIMENSION);
    limits.max_image_height = Some(MAX_DECODE_DIMENSION);
    reader.limits(limits);

    let decoded = reader
        .decode()
        .map_err(|err| CoreError::ImageDecode(err.to_string()))?;

    let (width, height) = scaled_dimensions(decoded.width(), decoded.height(), target_width);
    let resized = image::imageops::resize(&decoded.to_rgba8(), width, height, FilterType::Triangle);

    Ok(ScaledImage {
        source: bytes.clone(),
        width,
        height,
        rgba: resized.into_raw(),
    })
}

/// Target size for a `src_w` x `src_h` image scaled to `target_w` wide.
///
/// Height is rounded to the nearest pixel, never below 1 and never above
/// [`MAX_DECODE_DIMENSION`] so extreme aspect ratios stay bounded.
pub fn scaled_dimensions(src_w: u32, src_h: u32, target_w: u32) -> (u32, u32) {
    let target_w = target_w.max(1);
    if src_w == 0 {
        return (target_w, 1);
    }

    let src_w = u64::from(src_w);
    let height = (u64::from(src_h) * u64::from(target_w) + src_w / 2) / src_w;
    let height = height.clamp(1, u64::from(MAX_DECODE_DIMENSION));
    (target_w, height as u32)
}
