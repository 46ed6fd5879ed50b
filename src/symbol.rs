//! # Decoded Symbol Model
//!
//! Types describing what a reader found in an image: the symbology, the payload
//! and where the symbol sits in the image.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::preprocessing::Rotation;

/// Barcode symbologies recognised by the readers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbology {
    Aztec,
    DataMatrix,
    MaxiCode,
    Pdf417,
    QrCode,
    MicroQr,
    Ean8,
    Ean13,
    UpcA,
    UpcE,
    Code39,
    Code93,
    Code128,
    Codabar,
    Itf,
    Rss14,
    RssExpanded,
    /// Anything a backend reports that has no dedicated variant
    Other(String),
}

impl Symbology {
    /// Parses the upper-case format names printed by ZXing (`PDF_417`, `QR_CODE`, ...).
    pub fn from_zxing_name(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "AZTEC" => Symbology::Aztec,
            "DATA_MATRIX" => Symbology::DataMatrix,
            "MAXICODE" => Symbology::MaxiCode,
            "PDF_417" => Symbology::Pdf417,
            "QR_CODE" => Symbology::QrCode,
            "MICRO_QR_CODE" | "RECTANGULAR_MICRO_QR_CODE" => Symbology::MicroQr,
            "EAN_8" => Symbology::Ean8,
            "EAN_13" => Symbology::Ean13,
            "UPC_A" => Symbology::UpcA,
            "UPC_E" => Symbology::UpcE,
            "CODE_39" => Symbology::Code39,
            "CODE_93" => Symbology::Code93,
            "CODE_128" => Symbology::Code128,
            "CODABAR" => Symbology::Codabar,
            "ITF" => Symbology::Itf,
            "RSS_14" => Symbology::Rss14,
            "RSS_EXPANDED" => Symbology::RssExpanded,
            other => Symbology::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Symbology::Aztec => "AZTEC",
            Symbology::DataMatrix => "DATAMATRIX",
            Symbology::MaxiCode => "MAXICODE",
            Symbology::Pdf417 => "PDF417",
            Symbology::QrCode => "QRCODE",
            Symbology::MicroQr => "MICROQR",
            Symbology::Ean8 => "EAN8",
            Symbology::Ean13 => "EAN13",
            Symbology::UpcA => "UPCA",
            Symbology::UpcE => "UPCE",
            Symbology::Code39 => "CODE39",
            Symbology::Code93 => "CODE93",
            Symbology::Code128 => "CODE128",
            Symbology::Codabar => "CODABAR",
            Symbology::Itf => "I25",
            Symbology::Rss14 => "DATABAR",
            Symbology::RssExpanded => "DATABAR_EXP",
            Symbology::Other(name) => name.as_str(),
        };
        f.write_str(name)
    }
}

/// Axis-aligned bounding box in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    /// Computes the bounding box of a polygon. Returns `None` for an empty polygon.
    pub fn bounding(points: &[(f32, f32)]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.0, first.1, first.0, first.1);
        for &(x, y) in rest {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some(Self {
            left: min_x.floor() as i32,
            top: min_y.floor() as i32,
            width: (max_x - min_x).round().max(0.0) as u32,
            height: (max_y - min_y).round().max(0.0) as u32,
        })
    }
}

/// One symbol decoded from an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedSymbol {
    pub symbology: Symbology,
    /// Payload as text
    pub data: String,
    /// Payload bytes as reported by the reader (may be empty)
    pub raw_bytes: Vec<u8>,
    pub rect: Option<Rect>,
    pub quality: Option<u32>,
    pub polygon: Vec<(f32, f32)>,
    /// Rotation applied to the image before this symbol was found
    pub rotation: Option<Rotation>,
}

impl DecodedSymbol {
    /// Builds a symbol from text, deriving the bounding box from the polygon.
    pub fn new(symbology: Symbology, data: impl Into<String>, polygon: Vec<(f32, f32)>) -> Self {
        let data = data.into();
        Self {
            symbology,
            raw_bytes: data.as_bytes().to_vec(),
            rect: Rect::bounding(&polygon),
            data,
            quality: None,
            polygon,
            rotation: None,
        }
    }

    /// Builds a symbol from raw payload bytes using [`payload_text`].
    pub fn from_bytes(symbology: Symbology, raw_bytes: Vec<u8>, polygon: Vec<(f32, f32)>) -> Self {
        Self {
            symbology,
            data: payload_text(&raw_bytes),
            rect: Rect::bounding(&polygon),
            raw_bytes,
            quality: None,
            polygon,
            rotation: None,
        }
    }

    /// Number of characters in the payload text.
    pub fn data_len(&self) -> usize {
        self.data.chars().count()
    }
}

/// Decodes payload bytes as UTF-8, falling back to Latin-1.
///
/// Latin-1 maps every byte to the code point of the same value, so the
/// fallback cannot fail.
pub fn payload_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_text_utf8() {
        assert_eq!(payload_text("héllo".as_bytes()), "héllo");
    }

    #[test]
    fn test_payload_text_latin1_fallback() {
        // 0xE9 alone is not valid UTF-8 but is 'é' in Latin-1
        assert_eq!(payload_text(&[0x63, 0x61, 0x66, 0xE9]), "café");
    }

    #[test]
    fn test_from_zxing_name() {
        assert_eq!(Symbology::from_zxing_name("PDF_417"), Symbology::Pdf417);
        assert_eq!(Symbology::from_zxing_name("qr_code"), Symbology::QrCode);
        assert_eq!(
            Symbology::from_zxing_name("TELEPEN"),
            Symbology::Other("TELEPEN".to_string())
        );
    }

    #[test]
    fn test_display_uses_short_names() {
        assert_eq!(Symbology::QrCode.to_string(), "QRCODE");
        assert_eq!(Symbology::Pdf417.to_string(), "PDF417");
        assert_eq!(Symbology::Other("ZXING".to_string()).to_string(), "ZXING");
    }

    #[test]
    fn test_rect_bounding() {
        let rect = Rect::bounding(&[(10.0, 20.0), (40.0, 22.0), (38.0, 60.0), (11.0, 58.0)])
            .expect("non-empty polygon has a bounding box");
        assert_eq!(rect.left, 10);
        assert_eq!(rect.top, 20);
        assert_eq!(rect.width, 30);
        assert_eq!(rect.height, 40);

        assert!(Rect::bounding(&[]).is_none());
    }
}
