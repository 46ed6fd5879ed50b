//! # Shared Types for Image Preprocessing
//!
//! This module contains the shared types, structs, and enums used across
//! the preprocessing sub-modules.

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors that can occur during image preprocessing operations.
#[derive(Debug, Clone, PartialEq)]
pub enum PreprocessingError {
    /// A step was configured with a parameter it cannot work with
    InvalidParameter { message: String },
    /// Image processing operation failed
    ProcessingFailed { message: String },
}

impl fmt::Display for PreprocessingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreprocessingError::InvalidParameter { message } => {
                write!(f, "Invalid preprocessing parameter: {}", message)
            }
            PreprocessingError::ProcessingFailed { message } => {
                write!(f, "Image processing failed: {}", message)
            }
        }
    }
}

impl std::error::Error for PreprocessingError {}

/// Lossless quarter-turn rotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// A single preprocessing step of a fallback strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Preprocess {
    /// Image as loaded
    Original,
    /// BT.601 luma conversion
    Grayscale,
    /// Fixed threshold: pixel > threshold becomes white
    Binary { threshold: u8 },
    /// Fixed threshold with inverted output
    InvertedBinary { threshold: u8 },
    /// Threshold chosen by Otsu's method
    Otsu,
    /// Gaussian-weighted local threshold
    AdaptiveGaussian { block_size: u32, c: f32 },
    /// Global histogram equalization
    Equalize,
    /// Contrast limited adaptive histogram equalization over a `tiles` x `tiles` grid
    Clahe { clip_limit: f32, tiles: u32 },
    /// Median filter
    Denoise { radius: u32 },
    /// 3x3 sharpening kernel
    Sharpen,
    Rotate(Rotation),
}

impl Preprocess {
    /// Short human-readable description used in logs and reports.
    pub fn describe(&self) -> String {
        match self {
            Preprocess::Original => "original".to_string(),
            Preprocess::Grayscale => "grayscale".to_string(),
            Preprocess::Binary { threshold } => format!("binary threshold {}", threshold),
            Preprocess::InvertedBinary { threshold } => {
                format!("inverted binary threshold {}", threshold)
            }
            Preprocess::Otsu => "Otsu threshold".to_string(),
            Preprocess::AdaptiveGaussian { block_size, c } => {
                format!("adaptive threshold (block {}, C {})", block_size, c)
            }
            Preprocess::Equalize => "histogram equalization".to_string(),
            Preprocess::Clahe { clip_limit, tiles } => {
                format!("CLAHE (clip {}, {}x{} tiles)", clip_limit, tiles, tiles)
            }
            Preprocess::Denoise { radius } => format!("median denoise (radius {})", radius),
            Preprocess::Sharpen => "sharpen".to_string(),
            Preprocess::Rotate(rotation) => format!("rotate {}", rotation),
        }
    }

    /// The rotation this step applies, if any.
    pub fn rotation(&self) -> Option<Rotation> {
        match self {
            Preprocess::Rotate(rotation) => Some(*rotation),
            _ => None,
        }
    }
}

/// Result of applying a preprocessing step.
#[derive(Debug, Clone)]
pub struct PreprocessedImage {
    /// The processed image
    pub image: DynamicImage,
    /// The step that produced it
    pub step: Preprocess,
    /// Threshold actually used, for thresholding steps
    pub threshold: Option<u8>,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}

/// Result of image thresholding operation.
#[derive(Debug, Clone)]
pub struct ThresholdedImageResult {
    /// The thresholded binary image
    pub image: DynamicImage,
    /// Threshold value applied (the Otsu optimum for automatic thresholding)
    pub threshold: u8,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}

/// Result of CLAHE contrast enhancement operation.
#[derive(Debug, Clone)]
pub struct ClaheImageResult {
    /// The contrast-enhanced image
    pub image: DynamicImage,
    /// Clip limit used for histogram clipping
    pub clip_limit: f32,
    /// Tile size in pixels used for local histogram equalization
    pub tile_size: (u32, u32),
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}
