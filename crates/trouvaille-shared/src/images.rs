//! Client-side photo compression.
//!
//! Report photos are re-encoded before upload so the object store never
//! receives multi-megabyte originals: the image is shrunk to a bounded
//! maximum dimension and JPEG quality is stepped down until the result fits
//! the target byte size.

use image::DynamicImage;

use crate::error::ImageError;

/// Bounds applied before a photo is uploaded.
#[derive(Debug, Clone, Copy)]
pub struct CompressionOptions {
    /// Longest allowed edge in pixels; larger images are downscaled,
    /// preserving aspect ratio.
    pub max_dimension: u32,
    /// Target upper bound on the encoded size in bytes.
    pub target_bytes: usize,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        // Mirrors the bounds the web client used: ~1 MB, 1920 px.
        Self {
            max_dimension: 1920,
            target_bytes: 1024 * 1024,
        }
    }
}

/// Quality ladder tried in order until the encoded size fits.
const QUALITY_STEPS: &[u8] = &[85, 70, 55, 40, 25];

/// Compress an image (PNG, JPEG or WebP) into a bounded JPEG.
///
/// Returns the encoded bytes, or [`ImageError::TargetUnreachable`] when even
/// the lowest quality step overshoots the target.
pub fn compress_image(bytes: &[u8], opts: CompressionOptions) -> Result<Vec<u8>, ImageError> {
    let img = image::load_from_memory(bytes)?;

    let img = if img.width() > opts.max_dimension || img.height() > opts.max_dimension {
        img.resize(
            opts.max_dimension,
            opts.max_dimension,
            image::imageops::FilterType::Triangle,
        )
    } else {
        img
    };

    // JPEG has no alpha channel.
    let img = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut best_len = usize::MAX;
    for &quality in QUALITY_STEPS {
        let encoded = encode_jpeg(&img, quality)?;
        if encoded.len() <= opts.target_bytes {
            return Ok(encoded);
        }
        best_len = best_len.min(encoded.len());
    }

    Err(ImageError::TargetUnreachable {
        target: opts.target_bytes,
        best: best_len,
    })
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, ImageError> {
    let mut out = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality);
    img.write_with_encoder(encoder)
        .map_err(|e| ImageError::Encode(e.to_string()))?;
    Ok(out)
}
