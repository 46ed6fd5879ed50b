//! # Symbol Readers
//!
//! Adapters over the third-party decoders. In-process readers implement
//! [`SymbolReader`]; the ZXing subprocess has its own async interface because
//! it works on files rather than decoded pixels.

pub mod external;
pub mod general;
pub mod qr_grid;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::decode_errors::DecodeError;
use crate::symbol::DecodedSymbol;

pub use external::{parse_zxing_output, Backend, ExternalDecoder, Invocation};
pub use general::GeneralReader;
pub use qr_grid::QrGridReader;

/// An in-process symbol reader.
///
/// Finding nothing is `Ok(vec![])`; errors are reserved for reader failures.
pub trait SymbolReader: Send + Sync {
    fn name(&self) -> &'static str;

    fn read(&self, image: &DynamicImage) -> Result<Vec<DecodedSymbol>, DecodeError>;
}

/// Which reader a strategy hands its image to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReaderKind {
    /// Multi-format reader covering every supported symbology
    General,
    /// QR-only grid reader
    QrGrid,
    /// ZXing `CommandLineRunner` subprocess
    External,
}

impl std::fmt::Display for ReaderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReaderKind::General => write!(f, "general"),
            ReaderKind::QrGrid => write!(f, "qr-grid"),
            ReaderKind::External => write!(f, "zxing"),
        }
    }
}

/// The readers available to a decode run
#[derive(Clone)]
pub struct ReaderSet {
    pub general: Arc<dyn SymbolReader>,
    pub qr_grid: Arc<dyn SymbolReader>,
    /// `None` when the external decoder is disabled
    pub external: Option<ExternalDecoder>,
}

impl ReaderSet {
    /// The default in-process readers plus an optional external decoder.
    pub fn new(external: Option<ExternalDecoder>) -> Self {
        Self {
            general: Arc::new(GeneralReader::new()),
            qr_grid: Arc::new(QrGridReader::new()),
            external,
        }
    }

    /// In-process reader for a kind; `None` for [`ReaderKind::External`].
    pub fn in_process(&self, kind: ReaderKind) -> Option<&dyn SymbolReader> {
        match kind {
            ReaderKind::General => Some(self.general.as_ref()),
            ReaderKind::QrGrid => Some(self.qr_grid.as_ref()),
            ReaderKind::External => None,
        }
    }
}

impl std::fmt::Debug for ReaderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderSet")
            .field("general", &self.general.name())
            .field("qr_grid", &self.qr_grid.name())
            .field("external", &self.external.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_process_lookup() {
        let readers = ReaderSet::new(None);
        assert_eq!(
            readers.in_process(ReaderKind::General).map(|r| r.name()),
            Some("rxing")
        );
        assert_eq!(
            readers.in_process(ReaderKind::QrGrid).map(|r| r.name()),
            Some("rqrr")
        );
        assert!(readers.in_process(ReaderKind::External).is_none());
    }
}
