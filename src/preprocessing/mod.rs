//! # Image Preprocessing Module
//!
//! This module provides the image transformations the decode fallback chains
//! try before handing an image to a symbol reader.
//!
//! The module is organized into focused sub-modules:
//! - `grayscale`: BT.601 luma conversion
//! - `thresholding`: fixed, inverted, Otsu and adaptive thresholding
//! - `filtering`: equalization, CLAHE, median denoising and sharpening
//! - `rotation`: lossless quarter turns
//! - `types`: Shared types and error definitions

pub mod filtering;
pub mod grayscale;
pub mod rotation;
pub mod thresholding;
pub mod types;

pub use types::{
    ClaheImageResult, PreprocessedImage, Preprocess, PreprocessingError, Rotation,
    ThresholdedImageResult,
};

pub use filtering::{apply_clahe, denoise, equalize, sharpen};
pub use grayscale::to_gray_bt601;
pub use rotation::rotate;
pub use thresholding::{apply_adaptive_threshold, apply_binary_threshold, apply_otsu_threshold};

use image::DynamicImage;

/// Applies one preprocessing step to an image.
pub fn apply(
    image: &DynamicImage,
    step: &Preprocess,
) -> Result<PreprocessedImage, PreprocessingError> {
    let start_time = std::time::Instant::now();
    let mut threshold = None;

    let processed = match *step {
        Preprocess::Original => image.clone(),
        Preprocess::Grayscale => DynamicImage::ImageLuma8(to_gray_bt601(image)),
        Preprocess::Binary { threshold: t } => {
            threshold = Some(t);
            apply_binary_threshold(image, t, false).image
        }
        Preprocess::InvertedBinary { threshold: t } => {
            threshold = Some(t);
            apply_binary_threshold(image, t, true).image
        }
        Preprocess::Otsu => {
            let result = apply_otsu_threshold(image)?;
            threshold = Some(result.threshold);
            result.image
        }
        Preprocess::AdaptiveGaussian { block_size, c } => {
            apply_adaptive_threshold(image, block_size, c)?
        }
        Preprocess::Equalize => equalize(image),
        Preprocess::Clahe { clip_limit, tiles } => apply_clahe(image, clip_limit, tiles)?.image,
        Preprocess::Denoise { radius } => denoise(image, radius)?,
        Preprocess::Sharpen => sharpen(image),
        Preprocess::Rotate(rotation) => rotate(image, rotation),
    };

    let processing_time = start_time.elapsed();

    tracing::trace!(
        target: "barcode_preprocessing",
        step = %step.describe(),
        width = processed.width(),
        height = processed.height(),
        "Preprocessing step applied in {}ms",
        processing_time.as_millis()
    );

    Ok(PreprocessedImage {
        image: processed,
        step: *step,
        threshold,
        processing_time_ms: processing_time.as_millis() as u32,
    })
}
