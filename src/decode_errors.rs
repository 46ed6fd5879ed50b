//! # Decode Error Types Module
//!
//! This module defines the error types used throughout the decoding pipeline.
//! It provides structured error handling for validation, preprocessing, symbol
//! readers, the external ZXing process and result persistence.

/// Custom error types for decode operations
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Image file validation errors (missing file, size limits, ...)
    Validation(String),
    /// Image loading/decoding errors
    ImageLoad(String),
    /// A preprocessing step could not be applied
    Preprocessing(String),
    /// An in-process symbol reader failed for a reason other than "nothing found"
    Reader(String),
    /// The external decoder binary (java/docker) or its jars are not available
    ExternalUnavailable(String),
    /// The external decoder ran but reported a failure
    ExternalFailed(String),
    /// An operation exceeded its time budget
    Timeout(String),
    /// OCR engine errors
    Ocr(String),
    /// Writing the decoded result failed
    Output(String),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Validation(msg) => write!(f, "[VALIDATION] Image validation failed: {}", msg),
            DecodeError::ImageLoad(msg) => write!(f, "[IMAGE_LOAD] Failed to load image: {}", msg),
            DecodeError::Preprocessing(msg) => write!(f, "[PREPROCESS] Preprocessing failed: {}", msg),
            DecodeError::Reader(msg) => write!(f, "[READER] Symbol reader failed: {}", msg),
            DecodeError::ExternalUnavailable(msg) => write!(f, "[EXTERNAL_UNAVAILABLE] External decoder not available: {}", msg),
            DecodeError::ExternalFailed(msg) => write!(f, "[EXTERNAL] External decoder failed: {}", msg),
            DecodeError::Timeout(msg) => write!(f, "[TIMEOUT] Operation timed out: {}", msg),
            DecodeError::Ocr(msg) => write!(f, "[OCR] Text extraction failed: {}", msg),
            DecodeError::Output(msg) => write!(f, "[OUTPUT] Could not save result: {}", msg),
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<anyhow::Error> for DecodeError {
    fn from(err: anyhow::Error) -> Self {
        DecodeError::Validation(err.to_string())
    }
}

impl From<crate::preprocessing::PreprocessingError> for DecodeError {
    fn from(err: crate::preprocessing::PreprocessingError) -> Self {
        DecodeError::Preprocessing(err.to_string())
    }
}

impl From<image::ImageError> for DecodeError {
    fn from(err: image::ImageError) -> Self {
        DecodeError::ImageLoad(err.to_string())
    }
}
