//! QR-only reader backed by `rqrr`.

use image::DynamicImage;

use super::SymbolReader;
use crate::decode_errors::DecodeError;
use crate::preprocessing::to_gray_bt601;
use crate::symbol::{DecodedSymbol, Symbology};

/// Locates QR grids and decodes each one. Grids that fail to decode are
/// skipped.
#[derive(Debug, Default, Clone)]
pub struct QrGridReader;

impl QrGridReader {
    pub fn new() -> Self {
        Self
    }
}

impl SymbolReader for QrGridReader {
    fn name(&self) -> &'static str {
        "rqrr"
    }

    fn read(&self, image: &DynamicImage) -> Result<Vec<DecodedSymbol>, DecodeError> {
        let gray = to_gray_bt601(image);
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            gray.width() as usize,
            gray.height() as usize,
            |x, y| gray.get_pixel(x as u32, y as u32)[0],
        );

        let grids = prepared.detect_grids();
        tracing::debug!(grids = grids.len(), "QR grid detection finished");

        let mut symbols = Vec::with_capacity(grids.len());
        for (index, grid) in grids.iter().enumerate() {
            let mut payload = Vec::new();
            match grid.decode_to(&mut payload) {
                Ok(meta) => {
                    tracing::debug!(grid = index, version = meta.version.0, "QR grid decoded");
                    let polygon = grid
                        .bounds
                        .iter()
                        .map(|point| (point.x as f32, point.y as f32))
                        .collect();
                    symbols.push(DecodedSymbol::from_bytes(Symbology::QrCode, payload, polygon));
                }
                Err(e) => {
                    tracing::debug!(grid = index, error = %e, "QR grid failed to decode");
                }
            }
        }

        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_blank_image_has_no_grids() {
        let blank = DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 64, Luma([255])));
        let symbols = QrGridReader::new().read(&blank).expect("no grids is not an error");
        assert!(symbols.is_empty());
    }
}
