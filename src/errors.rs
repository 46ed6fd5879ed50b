//! # Application Error Types
//!
//! This module defines common error types used throughout the decoder application.
//! It provides structured error handling for the CLI and configuration layers.

use std::fmt;

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Configuration loading and validation errors
    Config(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "[CONFIG] {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Standardized error logging utilities for consistent error reporting across the application
pub mod error_logging {
    use tracing::error;

    /// Log a failed decode attempt with strategy context
    pub fn log_decode_error(
        error: &impl std::fmt::Display,
        profile: &str,
        strategy: &str,
        image_path: Option<&str>,
        processing_duration: Option<std::time::Duration>,
    ) {
        error!(
            error = %error,
            profile = %profile,
            strategy = %strategy,
            image_path = ?image_path,
            processing_duration_ms = ?processing_duration.map(|d| d.as_millis()),
            "Decode attempt failed"
        );
    }

    /// Log external decoder errors with command context
    pub fn log_external_error(
        error: &impl std::fmt::Display,
        backend: &str,
        program: &str,
        exit_code: Option<i32>,
    ) {
        error!(
            error = %error,
            backend = %backend,
            program = %program,
            exit_code = ?exit_code,
            "External decoder failed"
        );
    }

    /// Log file system errors with path and operation context
    pub fn log_filesystem_error(
        error: &impl std::fmt::Display,
        operation: &str,
        path: Option<&str>,
        file_size: Option<u64>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            path = ?path,
            file_size_bytes = ?file_size,
            "File system operation failed"
        );
    }
}
