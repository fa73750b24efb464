//! Base64 <-> image conversion
//!
//! Payloads arrive as base64 strings, optionally carrying a
//! `data:image/...;base64,` prefix from browser canvas captures. Decoding
//! always yields an RGB pixel buffer; re-encoding produces base64 JPEG.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("unsupported or corrupted image data: {0}")]
    Image(#[from] image::ImageError),
}

/// Decode a base64 string into an RGB pixel buffer.
///
/// A data-URL prefix is stripped when present, and whitespace is ignored
/// (JSON payloads produced by other runtimes wrap base64 at 76 columns).
/// The image format is sniffed from the decoded bytes.
pub fn decode_base64_image(data: &str) -> Result<RgbImage, CodecError> {
    // Remove data URL prefix if present
    let payload = match data.split_once(',') {
        Some((_, rest)) => rest,
        None => data,
    };
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();

    let bytes = STANDARD.decode(compact)?;
    let decoded = image::load_from_memory(&bytes)?;
    Ok(decoded.to_rgb8())
}

/// Encode an RGB pixel buffer as a base64 JPEG string (no data-URL prefix).
pub fn encode_image_base64(image: &RgbImage) -> Result<String, CodecError> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image.clone()).write_to(&mut buffer, ImageFormat::Jpeg)?;
    Ok(STANDARD.encode(buffer.into_inner()))
}
