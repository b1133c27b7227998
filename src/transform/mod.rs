//! Image resize transform
//!
//! A pure function from source bytes to JPEG bytes. Decoding accepts any
//! format enabled in the `image` crate; the output is always JPEG.

mod method;
mod resample;

pub use method::InterpolationMethod;

use method::Resampler;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageError};
use thiserror::Error;

/// Content type of every transform output
pub const OUTPUT_CONTENT_TYPE: &str = "image/jpeg";

/// JPEG quality used for re-encoding
pub const JPEG_QUALITY: u8 = 75;

/// Largest accepted output edge, in pixels
pub const MAX_DIMENSION: u32 = 16_384;

/// Largest accepted output area, in pixels
pub const MAX_PIXELS: u64 = 64 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("failed to decode source image: {0}")]
    Decode(#[source] ImageError),

    #[error("failed to encode output image: {0}")]
    Encode(#[source] ImageError),

    #[error("source image has no pixels")]
    EmptyImage,

    #[error(
        "output {width}x{height} exceeds the {max_edge}px edge or {max_pixels} pixel limit",
        max_edge = MAX_DIMENSION,
        max_pixels = MAX_PIXELS
    )]
    TooLarge { width: u32, height: u32 },
}

pub type Result<T> = std::result::Result<T, TransformError>;

/// Resize `bytes` to `width` x `height` with `method` and re-encode as JPEG.
///
/// A zero on one axis preserves the source aspect ratio on that axis.
/// Zero on both axes keeps the source size.
pub fn resize(
    bytes: &[u8],
    width: u32,
    height: u32,
    method: InterpolationMethod,
) -> Result<Vec<u8>> {
    let source = image::load_from_memory(bytes).map_err(TransformError::Decode)?;
    let (src_w, src_h) = source.dimensions();
    if src_w == 0 || src_h == 0 {
        return Err(TransformError::EmptyImage);
    }

    let (dst_w, dst_h) = target_dimensions(src_w, src_h, width, height);

    let resized = if (dst_w, dst_h) == (src_w, src_h) {
        source
    } else {
        check_bounds(dst_w, dst_h)?;
        match method.resampler() {
            Resampler::Native(filter) => source.resize_exact(dst_w, dst_h, filter),
            Resampler::Custom(kernel) => DynamicImage::ImageRgba8(resample::resample(
                &source.to_rgba8(),
                dst_w,
                dst_h,
                kernel,
            )),
        }
    };

    encode_jpeg(&resized)
}

/// Compute the output size, filling zero axes from the source aspect ratio
pub fn target_dimensions(src_w: u32, src_h: u32, width: u32, height: u32) -> (u32, u32) {
    let scaled = |num: u32, other_dst: u32, other_src: u32| -> u32 {
        let v = (num as f64 * other_dst as f64 / other_src as f64).round() as u32;
        v.max(1)
    };

    match (width, height) {
        (0, 0) => (src_w, src_h),
        (0, h) => (scaled(src_w, h, src_h), h),
        (w, 0) => (w, scaled(src_h, w, src_w)),
        (w, h) => (w, h),
    }
}

/// Resampled output must fit the limits before any pixel buffer is allocated
fn check_bounds(width: u32, height: u32) -> Result<()> {
    let pixels = u64::from(width) * u64::from(height);
    if width > MAX_DIMENSION || height > MAX_DIMENSION || pixels > MAX_PIXELS {
        return Err(TransformError::TooLarge { width, height });
    }
    Ok(())
}

fn encode_jpeg(img: &DynamicImage) -> Result<Vec<u8>> {
    // JPEG carries no alpha channel
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
    encoder.encode_image(&rgb).map_err(TransformError::Encode)?;
    Ok(buf)
}
