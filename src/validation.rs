//! Validation of input images before any decode attempt
//!
//! Checks run from cheapest to most expensive:
//!
//! - the path exists, is a regular file and is not empty
//! - files above the quick-reject threshold are refused without reading them
//! - the format is sniffed from the leading bytes and the per-format size limit applied
//! - the decoded pixel buffer must fit in the configured memory budget

use anyhow::Result;
use image::ImageFormat;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

use crate::decoder_config::DecoderConfig;

/// Validate an image file with format-specific size limits and a memory estimate.
///
/// Returns the detected format, or `None` when the leading bytes did not
/// identify one (the decoder may still manage to open the file).
pub fn validate_image_file(path: &Path, config: &DecoderConfig) -> Result<Option<ImageFormat>> {
    let shown = path.display();

    if !path.exists() {
        return Err(anyhow::anyhow!(
            "Image validation failed: file does not exist ({})",
            shown
        ));
    }

    if !path.is_file() {
        return Err(anyhow::anyhow!(
            "Image validation failed: path is not a file ({})",
            shown
        ));
    }

    let file_size = path
        .metadata()
        .map_err(|e| {
            anyhow::anyhow!(
                "Image validation failed: cannot read file metadata ({}) - {}",
                shown,
                e
            )
        })?
        .len();

    if file_size == 0 {
        return Err(anyhow::anyhow!(
            "Image validation failed: file is empty ({})",
            shown
        ));
    }

    if file_size > config.format_limits.quick_reject {
        debug!(
            "Quick rejecting file {}: {} bytes exceeds quick reject threshold",
            shown, file_size
        );
        return Err(anyhow::anyhow!(
            "File too large for processing: {} bytes (exceeds quick reject threshold of {} bytes)",
            file_size,
            config.format_limits.quick_reject
        ));
    }

    let format = sniff_format(path, config)?;
    let format_limit = match format {
        Some(format) => format_size_limit(format, config),
        None => config.max_file_size,
    };
    debug!(
        "Detected format {:?} for {}, applying {} byte limit",
        format, shown, format_limit
    );

    if file_size > format_limit {
        return Err(anyhow::anyhow!(
            "Image file too large for {} format: {} bytes (maximum allowed: {} bytes)",
            format.map(|f| format!("{:?}", f)).unwrap_or_else(|| "unknown".to_string()),
            file_size,
            format_limit
        ));
    }

    let estimated_memory = estimate_decoded_bytes(path, file_size, format);
    debug!("Estimated memory usage for {}: {} bytes", shown, estimated_memory);
    if estimated_memory > config.max_memory_bytes {
        return Err(anyhow::anyhow!(
            "Estimated memory usage too high: {} bytes (maximum allowed: {} bytes)",
            estimated_memory,
            config.max_memory_bytes
        ));
    }

    Ok(format)
}

/// Size limit that applies to a detected format
pub fn format_size_limit(format: ImageFormat, config: &DecoderConfig) -> u64 {
    match format {
        ImageFormat::Png => config.format_limits.png_max,
        ImageFormat::Jpeg => config.format_limits.jpeg_max,
        ImageFormat::Bmp => config.format_limits.bmp_max,
        ImageFormat::Tiff => config.format_limits.tiff_max,
        _ => config.max_file_size,
    }
}

fn sniff_format(path: &Path, config: &DecoderConfig) -> Result<Option<ImageFormat>> {
    let file = File::open(path).map_err(|e| {
        anyhow::anyhow!(
            "Cannot open image file for validation: {} - {}",
            path.display(),
            e
        )
    })?;
    let mut reader = BufReader::new(file);
    let mut buffer = vec![0; config.buffer_size];

    let bytes_read = reader.read(&mut buffer)?;
    if bytes_read < config.min_format_bytes {
        debug!(
            "Could not read enough bytes for format detection from {}",
            path.display()
        );
        return Ok(None);
    }
    buffer.truncate(bytes_read);

    Ok(image::guess_format(&buffer).ok())
}

/// Estimated size of the decoded RGBA pixel buffer in bytes.
///
/// Uses the dimensions from the image header when they can be read, and a
/// per-format expansion factor of the file size otherwise.
pub fn estimate_decoded_bytes(path: &Path, file_size: u64, format: Option<ImageFormat>) -> u64 {
    let dimensions = image::ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .ok()
        .and_then(|reader| reader.into_dimensions().ok());

    match dimensions {
        Some((width, height)) => width as u64 * height as u64 * 4,
        None => (file_size as f64 * memory_factor(format)) as u64,
    }
}

/// Expansion factor from file size to decoded size, by format
pub fn memory_factor(format: Option<ImageFormat>) -> f64 {
    match format {
        Some(ImageFormat::Png) => 3.0,
        Some(ImageFormat::Jpeg) => 2.5,
        Some(ImageFormat::Bmp) => 1.2,
        Some(ImageFormat::Tiff) => 4.0,
        _ => 3.0,
    }
}
