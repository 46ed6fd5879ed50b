//! Quarter-turn rotations. Width and height swap for 90° and 270°, so no
//! pixels are cropped.

use image::DynamicImage;

use super::types::Rotation;

/// Rotates the image clockwise by the given quarter turn.
pub fn rotate(image: &DynamicImage, rotation: Rotation) -> DynamicImage {
    match rotation {
        Rotation::Deg90 => image.rotate90(),
        Rotation::Deg180 => image.rotate180(),
        Rotation::Deg270 => image.rotate270(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_quarter_turn_swaps_dimensions() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(30, 10));
        let rotated = rotate(&img, Rotation::Deg90);
        assert_eq!((rotated.width(), rotated.height()), (10, 30));
        let flipped = rotate(&img, Rotation::Deg180);
        assert_eq!((flipped.width(), flipped.height()), (30, 10));
    }

    #[test]
    fn test_rotate_moves_corner() {
        let mut img = GrayImage::new(4, 2);
        img.put_pixel(0, 0, Luma([200]));
        let rotated = rotate(&DynamicImage::ImageLuma8(img), Rotation::Deg90).to_luma8();
        // Clockwise: top-left goes to top-right
        assert_eq!(rotated.get_pixel(1, 0)[0], 200);
    }
}
