//! # Image Filtering Module
//!
//! Contrast enhancement, noise reduction and sharpening for the decode fallbacks.
//! Global equalization and the median filter come from `imageproc`; CLAHE and
//! the sharpening kernel are implemented here.

use image::{DynamicImage, GrayImage, Luma, RgbImage};

use super::grayscale::to_gray_bt601;
use super::types::{ClaheImageResult, PreprocessingError};

/// Global histogram equalization of the BT.601 grayscale image.
pub fn equalize(image: &DynamicImage) -> DynamicImage {
    let gray = to_gray_bt601(image);
    DynamicImage::ImageLuma8(imageproc::contrast::equalize_histogram(&gray))
}

/// Median filter over a `(2 * radius + 1)` square window of the grayscale image.
pub fn denoise(image: &DynamicImage, radius: u32) -> Result<DynamicImage, PreprocessingError> {
    if radius == 0 {
        return Err(PreprocessingError::InvalidParameter {
            message: "median radius must be at least 1".to_string(),
        });
    }
    let gray = to_gray_bt601(image);
    Ok(DynamicImage::ImageLuma8(imageproc::filter::median_filter(
        &gray, radius, radius,
    )))
}

/// Sharpening kernel, applied per colour channel.
const SHARPEN_KERNEL: [[i32; 3]; 3] = [[-1, -1, -1], [-1, 9, -1], [-1, -1, -1]];

/// Sharpens the colour image with a 3x3 kernel. Edge pixels are replicated
/// and results are clamped to `0..=255`.
pub fn sharpen(image: &DynamicImage) -> DynamicImage {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let mut output = RgbImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let mut acc = [0i32; 3];
            for (ky, row) in SHARPEN_KERNEL.iter().enumerate() {
                for (kx, weight) in row.iter().enumerate() {
                    let sx = clamp_coord(x as i64 + kx as i64 - 1, width);
                    let sy = clamp_coord(y as i64 + ky as i64 - 1, height);
                    let pixel = rgb.get_pixel(sx, sy);
                    for channel in 0..3 {
                        acc[channel] += weight * pixel[channel] as i32;
                    }
                }
            }
            let out = output.get_pixel_mut(x, y);
            for channel in 0..3 {
                out[channel] = acc[channel].clamp(0, 255) as u8;
            }
        }
    }

    DynamicImage::ImageRgb8(output)
}

fn clamp_coord(value: i64, len: u32) -> u32 {
    value.clamp(0, len as i64 - 1) as u32
}

/// Applies Contrast Limited Adaptive Histogram Equalization (CLAHE) to enhance local contrast.
///
/// The image is split into a `tiles` x `tiles` grid. Each tile gets its own
/// clipped, equalized mapping, and every pixel is remapped by bilinear
/// interpolation between the four nearest tile mappings.
///
/// # Arguments
///
/// * `image` - The input image to enhance
/// * `clip_limit` - Histogram clip limit relative to a flat histogram (2.0 is typical)
/// * `tiles` - Number of tiles along each axis (8 is typical)
pub fn apply_clahe(
    image: &DynamicImage,
    clip_limit: f32,
    tiles: u32,
) -> Result<ClaheImageResult, PreprocessingError> {
    let start_time = std::time::Instant::now();

    if clip_limit.is_nan() || clip_limit <= 0.0 {
        return Err(PreprocessingError::InvalidParameter {
            message: format!("Invalid clip limit: {}. Must be > 0.0", clip_limit),
        });
    }
    if tiles == 0 {
        return Err(PreprocessingError::InvalidParameter {
            message: "Invalid tile grid: must have at least one tile".to_string(),
        });
    }

    let gray = to_gray_bt601(image);
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return Err(PreprocessingError::ProcessingFailed {
            message: "cannot equalize an empty image".to_string(),
        });
    }

    let tiles_x = tiles.min(width);
    let tiles_y = tiles.min(height);
    let tile_width = width.div_ceil(tiles_x);
    let tile_height = height.div_ceil(tiles_y);

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = (tx * tile_width).min(width);
            let y0 = (ty * tile_height).min(height);
            let x1 = (x0 + tile_width).min(width);
            let y1 = (y0 + tile_height).min(height);
            luts.push(tile_lut(&gray, (x0, y0, x1, y1), clip_limit));
        }
    }

    let mut output = GrayImage::new(width, height);
    for (x, y, pixel) in gray.enumerate_pixels() {
        // Position relative to tile centres
        let fx = (x as f32 + 0.5) / tile_width as f32 - 0.5;
        let fy = (y as f32 + 0.5) / tile_height as f32 - 0.5;
        let (tx0, tx1, ax) = neighbours(fx, tiles_x);
        let (ty0, ty1, ay) = neighbours(fy, tiles_y);

        let value = pixel[0] as usize;
        let lut = |tx: u32, ty: u32| luts[(ty * tiles_x + tx) as usize][value] as f32;

        let top = lut(tx0, ty0) * (1.0 - ax) + lut(tx1, ty0) * ax;
        let bottom = lut(tx0, ty1) * (1.0 - ax) + lut(tx1, ty1) * ax;
        let mapped = top * (1.0 - ay) + bottom * ay;
        output.put_pixel(x, y, Luma([mapped.round().clamp(0.0, 255.0) as u8]));
    }

    let processing_time = start_time.elapsed();

    tracing::debug!(
        target: "barcode_preprocessing",
        "CLAHE applied in {:.2}ms: clip_limit={}, grid={}x{}",
        processing_time.as_millis(),
        clip_limit,
        tiles_x,
        tiles_y
    );

    Ok(ClaheImageResult {
        image: DynamicImage::ImageLuma8(output),
        clip_limit,
        tile_size: (tile_width, tile_height),
        processing_time_ms: processing_time.as_millis() as u32,
    })
}

/// Indices of the two tiles surrounding a fractional tile coordinate and the
/// interpolation weight of the second one.
fn neighbours(position: f32, count: u32) -> (u32, u32, f32) {
    let max_index = count as f32 - 1.0;
    let clamped = position.clamp(0.0, max_index);
    let low = clamped.floor();
    let high = (low + 1.0).min(max_index);
    (low as u32, high as u32, clamped - low)
}

/// Clipped and equalized mapping for one tile.
fn tile_lut(gray: &GrayImage, (x0, y0, x1, y1): (u32, u32, u32, u32), clip_limit: f32) -> [u8; 256] {
    let mut histogram = [0u32; 256];
    for y in y0..y1 {
        for x in x0..x1 {
            histogram[gray.get_pixel(x, y)[0] as usize] += 1;
        }
    }
    let total_pixels = ((x1 - x0) * (y1 - y0)).max(1);

    let clip_limit_pixels = ((clip_limit * total_pixels as f32 / 256.0).round() as u32).max(1);
    let mut excess_pixels = 0u32;
    for count in histogram.iter_mut() {
        if *count > clip_limit_pixels {
            excess_pixels += *count - clip_limit_pixels;
            *count = clip_limit_pixels;
        }
    }

    // Redistribute excess pixels uniformly
    let uniform_increment = excess_pixels / 256;
    let mut remainder = excess_pixels % 256;
    for count in histogram.iter_mut() {
        *count += uniform_increment;
        if remainder > 0 {
            *count += 1;
            remainder -= 1;
        }
    }

    let mut lut = [0u8; 256];
    let mut cumulative = 0u32;
    for (value, count) in histogram.iter().enumerate() {
        cumulative += count;
        lut[value] = ((cumulative as f32 / total_pixels as f32) * 255.0)
            .round()
            .clamp(0.0, 255.0) as u8;
    }
    lut
}
