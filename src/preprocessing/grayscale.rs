//! BT.601 grayscale conversion.

use image::{DynamicImage, GrayImage, Luma};

/// Converts an image to 8-bit luma with the BT.601 weights
/// (0.299 R + 0.587 G + 0.114 B).
///
/// `DynamicImage::to_luma8` uses the Rec. 709 weights instead, which gives
/// slightly different gray levels on coloured input.
pub fn to_gray_bt601(image: &DynamicImage) -> GrayImage {
    if let DynamicImage::ImageLuma8(gray) = image {
        return gray.clone();
    }

    let rgb = image.to_rgb8();
    let mut gray = GrayImage::new(rgb.width(), rgb.height());
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        gray.put_pixel(x, y, Luma([luma.round().clamp(0.0, 255.0) as u8]));
    }
    gray
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_bt601_weights() {
        let mut img = RgbImage::new(3, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 255, 0]));
        img.put_pixel(2, 0, Rgb([0, 0, 255]));

        let gray = to_gray_bt601(&DynamicImage::ImageRgb8(img));
        assert_eq!(gray.get_pixel(0, 0)[0], 76);
        assert_eq!(gray.get_pixel(1, 0)[0], 150);
        assert_eq!(gray.get_pixel(2, 0)[0], 29);
    }

    #[test]
    fn test_gray_input_is_unchanged() {
        let img = GrayImage::from_pixel(4, 4, Luma([42]));
        let gray = to_gray_bt601(&DynamicImage::ImageLuma8(img.clone()));
        assert_eq!(gray, img);
    }
}
