//! # Barcode Decoder
//!
//! Decodes QR, Aztec, Data Matrix, MaxiCode, PDF417 and 1D barcodes from
//! image files. Each decoding command runs an ordered chain of preprocessing
//! fallbacks over in-process readers and, where configured, the ZXing
//! command-line runner, then prints and saves what it found.

pub mod config;
pub mod decode_errors;
pub mod decoder_config;
pub mod errors;
pub mod observability;
pub mod observability_config;
pub mod ocr;
pub mod pipeline;
pub mod preprocessing;
pub mod profiles;
pub mod readers;
pub mod report;
pub mod symbol;
pub mod validation;

// Re-export types for easier access
pub use config::AppConfig;
pub use decode_errors::DecodeError;
pub use pipeline::{DecodeOutcome, FallbackChain, Strategy};
pub use profiles::{Profile, ProfileKind};
pub use readers::{ReaderSet, SymbolReader};
pub use symbol::{DecodedSymbol, Symbology};
