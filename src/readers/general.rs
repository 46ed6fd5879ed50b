//! Multi-format reader backed by `rxing`.

use image::DynamicImage;
use rxing::{BarcodeFormat, Exceptions, RXingResult};

use super::SymbolReader;
use crate::decode_errors::DecodeError;
use crate::symbol::{DecodedSymbol, Symbology};

/// Detects every supported symbology, several symbols per image.
#[derive(Debug, Default, Clone)]
pub struct GeneralReader;

impl GeneralReader {
    pub fn new() -> Self {
        Self
    }
}

impl SymbolReader for GeneralReader {
    fn name(&self) -> &'static str {
        "rxing"
    }

    fn read(&self, image: &DynamicImage) -> Result<Vec<DecodedSymbol>, DecodeError> {
        let luma = image.to_luma8();
        let (width, height) = luma.dimensions();

        match rxing::helpers::detect_multiple_in_luma(luma.into_raw(), width, height) {
            Ok(results) => Ok(results.iter().map(to_symbol).collect()),
            Err(Exceptions::NotFoundException(_)) => Ok(Vec::new()),
            // A candidate that fails its checksum or format checks is not a symbol
            Err(e @ (Exceptions::ChecksumException(_) | Exceptions::FormatException(_))) => {
                tracing::debug!(error = %e, "rxing rejected a candidate symbol");
                Ok(Vec::new())
            }
            Err(e) => Err(DecodeError::Reader(e.to_string())),
        }
    }
}

fn to_symbol(result: &RXingResult) -> DecodedSymbol {
    let polygon = result
        .getPoints()
        .iter()
        .map(|point| (point.x, point.y))
        .collect();
    DecodedSymbol::new(symbology(result.getBarcodeFormat()), result.getText(), polygon)
}

/// Maps an rxing format onto the crate's symbology enum
pub fn symbology(format: &BarcodeFormat) -> Symbology {
    match format {
        BarcodeFormat::AZTEC => Symbology::Aztec,
        BarcodeFormat::DATA_MATRIX => Symbology::DataMatrix,
        BarcodeFormat::MAXICODE => Symbology::MaxiCode,
        BarcodeFormat::PDF_417 => Symbology::Pdf417,
        BarcodeFormat::QR_CODE => Symbology::QrCode,
        BarcodeFormat::MICRO_QR_CODE => Symbology::MicroQr,
        BarcodeFormat::EAN_8 => Symbology::Ean8,
        BarcodeFormat::EAN_13 => Symbology::Ean13,
        BarcodeFormat::UPC_A => Symbology::UpcA,
        BarcodeFormat::UPC_E => Symbology::UpcE,
        BarcodeFormat::CODE_39 => Symbology::Code39,
        BarcodeFormat::CODE_93 => Symbology::Code93,
        BarcodeFormat::CODE_128 => Symbology::Code128,
        BarcodeFormat::CODABAR => Symbology::Codabar,
        BarcodeFormat::ITF => Symbology::Itf,
        BarcodeFormat::RSS_14 => Symbology::Rss14,
        BarcodeFormat::RSS_EXPANDED => Symbology::RssExpanded,
        other => Symbology::Other(format!("{:?}", other).to_ascii_uppercase()),
    }
}
