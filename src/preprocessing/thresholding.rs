//! # Image Thresholding Module
//!
//! Binary thresholding used by the fallback chains: fixed and inverted
//! thresholds, Otsu's method and Gaussian adaptive thresholding.

use image::{DynamicImage, GrayImage, ImageBuffer, Luma};

use super::grayscale::to_gray_bt601;
use super::types::{PreprocessingError, ThresholdedImageResult};

/// Applies a fixed threshold: pixels brighter than `threshold` become white.
///
/// With `invert` set the output is flipped, so dark modules come out white.
pub fn apply_binary_threshold(
    image: &DynamicImage,
    threshold: u8,
    invert: bool,
) -> ThresholdedImageResult {
    let start_time = std::time::Instant::now();

    let gray = to_gray_bt601(image);
    let binary = binarize(&gray, threshold, invert);

    let processing_time = start_time.elapsed();

    tracing::debug!(
        target: "barcode_preprocessing",
        "Binary thresholding completed in {:.2}ms: threshold={}, inverted={}, dimensions={}x{}",
        processing_time.as_millis(),
        threshold,
        invert,
        gray.width(),
        gray.height()
    );

    ThresholdedImageResult {
        image: DynamicImage::ImageLuma8(binary),
        threshold,
        processing_time_ms: processing_time.as_millis() as u32,
    }
}

/// Applies Otsu's thresholding algorithm to convert an image to binary (black/white).
///
/// The threshold is chosen by maximizing the between-class variance of the
/// grayscale histogram.
pub fn apply_otsu_threshold(
    image: &DynamicImage,
) -> Result<ThresholdedImageResult, PreprocessingError> {
    let start_time = std::time::Instant::now();

    let gray = to_gray_bt601(image);
    if gray.width() == 0 || gray.height() == 0 {
        return Err(PreprocessingError::ProcessingFailed {
            message: "cannot threshold an empty image".to_string(),
        });
    }

    let mut histogram = [0u32; 256];
    for pixel in gray.pixels() {
        histogram[pixel[0] as usize] += 1;
    }
    let total_pixels = (gray.width() as f64) * (gray.height() as f64);

    let optimal_threshold = find_otsu_threshold(&histogram, total_pixels);
    let binary = binarize(&gray, optimal_threshold, false);

    let processing_time = start_time.elapsed();

    tracing::debug!(
        target: "barcode_preprocessing",
        "Otsu thresholding completed in {:.2}ms: threshold={}, dimensions={}x{}",
        processing_time.as_millis(),
        optimal_threshold,
        gray.width(),
        gray.height()
    );

    Ok(ThresholdedImageResult {
        image: DynamicImage::ImageLuma8(binary),
        threshold: optimal_threshold,
        processing_time_ms: processing_time.as_millis() as u32,
    })
}

/// Gaussian adaptive thresholding.
///
/// Each pixel is compared with the Gaussian-weighted mean of its
/// `block_size` x `block_size` neighbourhood minus `c`. The kernel has
/// exactly `block_size` taps with sigma `0.3 * ((block_size - 1) * 0.5 - 1) + 0.8`,
/// and edges are padded by replicating border pixels.
pub fn apply_adaptive_threshold(
    image: &DynamicImage,
    block_size: u32,
    c: f32,
) -> Result<DynamicImage, PreprocessingError> {
    if block_size < 3 || block_size % 2 == 0 {
        return Err(PreprocessingError::InvalidParameter {
            message: format!(
                "adaptive block size must be odd and at least 3, got {}",
                block_size
            ),
        });
    }

    let start_time = std::time::Instant::now();

    let gray = to_gray_bt601(image);
    let sigma = adaptive_sigma(block_size);
    let kernel = gaussian_kernel(block_size, sigma);
    let luma: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
            Luma([gray.get_pixel(x, y)[0] as f32])
        });
    let local_mean = imageproc::filter::separable_filter_equal(&luma, &kernel);

    let mut output = GrayImage::new(gray.width(), gray.height());
    for (x, y, pixel) in gray.enumerate_pixels() {
        let limit = local_mean.get_pixel(x, y)[0] - c;
        let value = if pixel[0] as f32 > limit { 255 } else { 0 };
        output.put_pixel(x, y, Luma([value]));
    }

    tracing::debug!(
        target: "barcode_preprocessing",
        "Adaptive thresholding completed in {:.2}ms: block={}, c={}, sigma={:.2}",
        start_time.elapsed().as_millis(),
        block_size,
        c,
        sigma
    );

    Ok(DynamicImage::ImageLuma8(output))
}

/// Gaussian sigma for a given adaptive block size.
pub(crate) fn adaptive_sigma(block_size: u32) -> f32 {
    0.3 * ((block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1D Gaussian kernel with `size` taps.
pub(crate) fn gaussian_kernel(size: u32, sigma: f32) -> Vec<f32> {
    let center = (size / 2) as f32;
    let weights: Vec<f32> = (0..size)
        .map(|i| {
            let offset = i as f32 - center;
            (-(offset * offset) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

fn binarize(gray: &GrayImage, threshold: u8, invert: bool) -> GrayImage {
    let (above, below) = if invert { (0u8, 255u8) } else { (255u8, 0u8) };
    let mut binary = GrayImage::new(gray.width(), gray.height());
    for (x, y, pixel) in gray.enumerate_pixels() {
        let value = if pixel[0] > threshold { above } else { below };
        binary.put_pixel(x, y, Luma([value]));
    }
    binary
}

/// Finds the optimal threshold using Otsu's method by maximizing between-class variance.
///
/// Pixels `<= threshold` form the background class.
fn find_otsu_threshold(histogram: &[u32; 256], total_pixels: f64) -> u8 {
    let mut cumulative_sums = [0f64; 256];
    let mut cumulative_weighted_sums = [0f64; 256];

    let mut cumulative_sum = 0f64;
    let mut cumulative_weighted_sum = 0f64;
    for (i, &count) in histogram.iter().enumerate() {
        cumulative_sum += count as f64;
        cumulative_weighted_sum += (i as f64) * count as f64;
        cumulative_sums[i] = cumulative_sum;
        cumulative_weighted_sums[i] = cumulative_weighted_sum;
    }

    let total_weighted_sum = cumulative_weighted_sums[255];
    let mut max_variance = 0f64;
    let mut optimal_threshold = 0u8;

    for threshold in 0..255usize {
        let background = cumulative_sums[threshold];
        let foreground = total_pixels - background;
        if background == 0.0 || foreground == 0.0 {
            continue;
        }

        let w0 = background / total_pixels;
        let w1 = foreground / total_pixels;
        let mu0 = cumulative_weighted_sums[threshold] / background;
        let mu1 = (total_weighted_sum - cumulative_weighted_sums[threshold]) / foreground;

        let variance = w0 * w1 * (mu0 - mu1).powi(2);
        if variance > max_variance {
            max_variance = variance;
            optimal_threshold = threshold as u8;
        }
    }

    optimal_threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tone_image() -> DynamicImage {
        let mut img = GrayImage::new(10, 10);
        for (x, _, pixel) in img.enumerate_pixels_mut() {
            pixel[0] = if x < 5 { 25 } else { 225 };
        }
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn test_binary_threshold_is_strictly_greater() {
        let mut img = GrayImage::new(3, 1);
        img.put_pixel(0, 0, Luma([127]));
        img.put_pixel(1, 0, Luma([128]));
        img.put_pixel(2, 0, Luma([10]));
        let result = apply_binary_threshold(&DynamicImage::ImageLuma8(img), 127, false);
        let out = result.image.to_luma8();
        assert_eq!(out.get_pixel(0, 0)[0], 0);
        assert_eq!(out.get_pixel(1, 0)[0], 255);
        assert_eq!(out.get_pixel(2, 0)[0], 0);
    }

    #[test]
    fn test_inverted_binary_threshold() {
        let result = apply_binary_threshold(&two_tone_image(), 127, true);
        let out = result.image.to_luma8();
        assert_eq!(out.get_pixel(0, 0)[0], 255);
        assert_eq!(out.get_pixel(9, 0)[0], 0);
    }

    #[test]
    fn test_apply_otsu_threshold_separates_classes() {
        let result = apply_otsu_threshold(&two_tone_image())
            .expect("apply_otsu_threshold should succeed with a two-tone image");

        assert!(result.threshold >= 25 && result.threshold < 225);
        let binary = result.image.to_luma8();
        assert_eq!(binary.get_pixel(0, 0)[0], 0);
        assert_eq!(binary.get_pixel(9, 9)[0], 255);
        for pixel in binary.pixels() {
            assert!(pixel[0] == 0 || pixel[0] == 255);
        }
    }

    #[test]
    fn test_find_otsu_threshold_two_peaks() {
        let mut histogram = [0u32; 256];
        histogram[25] = 5000;
        histogram[225] = 5000;
        let threshold = find_otsu_threshold(&histogram, 10000.0);
        assert!((25..225).contains(&threshold));
    }

    #[test]
    fn test_find_otsu_threshold_uniform_image() {
        let mut histogram = [0u32; 256];
        histogram[128] = 100;
        // A single class has no between-class variance anywhere
        assert_eq!(find_otsu_threshold(&histogram, 100.0), 0);
    }

    #[test]
    fn test_adaptive_sigma_for_default_block() {
        assert!((adaptive_sigma(11) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_gaussian_kernel_matches_block_size() {
        let kernel = gaussian_kernel(11, adaptive_sigma(11));
        assert_eq!(kernel.len(), 11);
        assert!((kernel.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!((kernel[0] - kernel[10]).abs() < 1e-7);
        assert!(kernel[5] > kernel[4] && kernel[4] > kernel[0]);
    }

    #[test]
    fn test_adaptive_threshold_rejects_even_block() {
        let err = apply_adaptive_threshold(&two_tone_image(), 10, 2.0)
            .expect_err("even block sizes are invalid");
        assert!(matches!(err, PreprocessingError::InvalidParameter { .. }));
        assert!(apply_adaptive_threshold(&two_tone_image(), 1, 2.0).is_err());
    }

    #[test]
    fn test_adaptive_threshold_flat_region_is_white() {
        // On a flat image every pixel equals its local mean, which beats mean - c
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(20, 20, Luma([90])));
        let out = apply_adaptive_threshold(&img, 11, 2.0)
            .expect("valid parameters")
            .to_luma8();
        assert!(out.pixels().all(|p| p[0] == 255));
    }
}
