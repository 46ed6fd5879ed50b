//! # Decode Profiles
//!
//! A profile bundles everything one decoding command needs: the ordered
//! fallback strategies, the symbologies that count as a hit, where the result
//! file goes and how it is formatted.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::decoder_config::DecoderConfig;
use crate::pipeline::{FallbackChain, Strategy};
use crate::preprocessing::{Preprocess, Rotation};
use crate::readers::ReaderKind;
use crate::symbol::Symbology;

/// The decoding commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Qr,
    Aztec,
    DataMatrix,
    MaxiCode,
    Pdf417,
    Barcode,
    Scan,
}

impl ProfileKind {
    pub const ALL: [ProfileKind; 7] = [
        ProfileKind::Qr,
        ProfileKind::Aztec,
        ProfileKind::DataMatrix,
        ProfileKind::MaxiCode,
        ProfileKind::Pdf417,
        ProfileKind::Barcode,
        ProfileKind::Scan,
    ];

    /// Command name, also used as the `profile` metric label
    pub fn name(&self) -> &'static str {
        match self {
            ProfileKind::Qr => "qr",
            ProfileKind::Aztec => "aztec",
            ProfileKind::DataMatrix => "datamatrix",
            ProfileKind::MaxiCode => "maxicode",
            ProfileKind::Pdf417 => "pdf417",
            ProfileKind::Barcode => "barcode",
            ProfileKind::Scan => "scan",
        }
    }
}

impl std::fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Directory the result file is written to when no override is given
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLocation {
    WorkingDir,
    ImageDir,
}

/// Layout of the persisted result file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStyle {
    /// `<heading> #i`, `Type:` and `Data:` blocks
    Numbered { heading: &'static str },
    /// `Data Matrix #i:` followed by the data
    DataMatrix,
    /// Header with image and method, then the data and position
    Summary,
    /// Only the decoded data, one symbol per line
    RawData,
}

/// A fully configured decoding command
#[derive(Debug, Clone)]
pub struct Profile {
    pub kind: ProfileKind,
    /// Banner title
    pub title: &'static str,
    /// Noun used in counts, e.g. "Found 2 QR code(s)"
    pub noun: &'static str,
    pub chain: FallbackChain,
    pub output_file: &'static str,
    pub location: OutputLocation,
    pub style: ReportStyle,
    /// Printed under "Possible reasons:" when nothing decodes
    pub failure_hints: &'static [&'static str],
}

impl Profile {
    /// Build the profile for `kind` with thresholds taken from `config`.
    pub fn build(kind: ProfileKind, config: &DecoderConfig) -> Self {
        let binary = Preprocess::Binary {
            threshold: config.binary_threshold,
        };
        let adaptive = Preprocess::AdaptiveGaussian {
            block_size: config.adaptive_block_size,
            c: config.adaptive_c,
        };
        let general = |label: &str, preprocess: Preprocess| {
            Strategy::new(label, preprocess, ReaderKind::General)
        };

        match kind {
            ProfileKind::Qr => Self {
                kind,
                title: "QR CODE DECODER",
                noun: "QR code",
                chain: FallbackChain::new(
                    kind.name(),
                    vec![
                        general("Original image", Preprocess::Original),
                        general("Grayscale image", Preprocess::Grayscale),
                        Strategy::new("QR grid detector", Preprocess::Original, ReaderKind::QrGrid),
                        general("Grayscale conversion", Preprocess::Grayscale),
                        general("Binary threshold", binary),
                    ],
                ),
                output_file: "decoded_qrcode.txt",
                location: OutputLocation::WorkingDir,
                style: ReportStyle::Numbered { heading: "QR Code" },
                failure_hints: &[
                    "The image doesn't contain a QR code",
                    "The QR code is damaged or unclear",
                    "Image quality is too low",
                ],
            },
            ProfileKind::Aztec => Self {
                kind,
                title: "AZTEC CODE DECODER",
                noun: "Aztec code",
                chain: FallbackChain::new(
                    kind.name(),
                    vec![
                        general("Original image", Preprocess::Original),
                        general("Grayscale conversion", Preprocess::Grayscale),
                        general("Binary threshold", binary),
                        general("Otsu's threshold", Preprocess::Otsu),
                        general("Adaptive threshold", adaptive),
                    ],
                )
                .accepting(vec![Symbology::Aztec]),
                output_file: "decoded_aztec.txt",
                location: OutputLocation::WorkingDir,
                style: ReportStyle::Numbered {
                    heading: "Aztec Code",
                },
                failure_hints: &[
                    "The image doesn't contain an Aztec code",
                    "The Aztec code is damaged or unclear",
                    "Image quality is too low",
                ],
            },
            ProfileKind::DataMatrix => Self {
                kind,
                title: "DATA MATRIX BARCODE DECODER",
                noun: "Data Matrix barcode",
                chain: FallbackChain::new(
                    kind.name(),
                    vec![
                        general("Original image", Preprocess::Original),
                        general("Grayscale conversion", Preprocess::Grayscale),
                        general("Otsu's threshold", Preprocess::Otsu),
                    ],
                )
                .accepting(vec![Symbology::DataMatrix]),
                output_file: "decoded_datamatrix.txt",
                location: OutputLocation::WorkingDir,
                style: ReportStyle::DataMatrix,
                failure_hints: &[
                    "The image doesn't contain a Data Matrix barcode",
                    "The barcode is damaged or unclear",
                    "Image quality is too low",
                    "Wrong barcode type (not Data Matrix)",
                ],
            },
            ProfileKind::MaxiCode => Self {
                kind,
                title: "MAXICODE DECODER",
                noun: "MaxiCode",
                chain: FallbackChain::new(
                    kind.name(),
                    vec![
                        general("Original image", Preprocess::Original),
                        general("Grayscale conversion", Preprocess::Grayscale),
                        general("Binary threshold", binary),
                        general("Otsu's threshold", Preprocess::Otsu),
                        general("Adaptive threshold", adaptive),
                        Strategy::new("ZXing", Preprocess::Original, ReaderKind::External),
                    ],
                )
                .accepting(vec![Symbology::MaxiCode]),
                output_file: "decoded_maxicode.txt",
                location: OutputLocation::ImageDir,
                style: ReportStyle::Summary,
                failure_hints: &[
                    "The image doesn't contain a MaxiCode",
                    "The MaxiCode is damaged or unclear",
                    "Image quality is too low",
                    "MaxiCode usually needs the ZXing decoder (enable Docker or install the jars)",
                ],
            },
            ProfileKind::Pdf417 => Self {
                kind,
                title: "COMPREHENSIVE PDF417 BARCODE DECODER",
                noun: "PDF417 barcode",
                chain: FallbackChain::new(
                    kind.name(),
                    vec![
                        general("Original image", Preprocess::Original),
                        general("Grayscale conversion", Preprocess::Grayscale),
                        general("Binary threshold", binary),
                        general(
                            "Inverted binary",
                            Preprocess::InvertedBinary {
                                threshold: config.binary_threshold,
                            },
                        ),
                        general("Otsu's threshold", Preprocess::Otsu),
                        general("Adaptive threshold", adaptive),
                        general("Contrast enhancement", Preprocess::Equalize),
                        general(
                            "CLAHE enhancement",
                            Preprocess::Clahe {
                                clip_limit: config.clahe_clip_limit,
                                tiles: config.clahe_tiles,
                            },
                        ),
                        general("Rotation 90°", Preprocess::Rotate(Rotation::Deg90)),
                        general("Rotation 180°", Preprocess::Rotate(Rotation::Deg180)),
                        general("Rotation 270°", Preprocess::Rotate(Rotation::Deg270)),
                        general(
                            "Denoising",
                            Preprocess::Denoise {
                                radius: config.denoise_radius,
                            },
                        ),
                        general("Sharpening", Preprocess::Sharpen),
                        Strategy::new(
                            "ZXing Java library",
                            Preprocess::Original,
                            ReaderKind::External,
                        ),
                    ],
                ),
                output_file: "decoded_pdf417.txt",
                location: OutputLocation::WorkingDir,
                style: ReportStyle::RawData,
                failure_hints: &[
                    "The image does not contain a valid PDF417 barcode",
                    "The barcode is damaged or of very poor quality",
                    "The image is the wrong file",
                    "The barcode format is not PDF417",
                ],
            },
            ProfileKind::Barcode => Self {
                kind,
                title: "1D BARCODE DECODER",
                noun: "barcode",
                chain: FallbackChain::new(
                    kind.name(),
                    vec![
                        general("Original image", Preprocess::Original),
                        general("Grayscale conversion", Preprocess::Grayscale),
                        general("Binary threshold", binary),
                        general("Adaptive threshold", adaptive),
                    ],
                ),
                output_file: "decoded_barcode.txt",
                location: OutputLocation::WorkingDir,
                style: ReportStyle::Numbered { heading: "Barcode" },
                failure_hints: &[
                    "The image doesn't contain a 1D barcode",
                    "The barcode is damaged or unclear",
                    "Image quality is too low",
                    "Barcode type not supported",
                ],
            },
            ProfileKind::Scan => Self {
                kind,
                title: "BARCODE SCANNER",
                noun: "barcode",
                chain: FallbackChain::new(
                    kind.name(),
                    vec![
                        general("Original image", Preprocess::Original),
                        general("Grayscale conversion", Preprocess::Grayscale),
                        general("Contrast enhancement", Preprocess::Equalize),
                        general("Otsu's threshold", Preprocess::Otsu),
                        general("Adaptive threshold", adaptive),
                        general("Rotation 90°", Preprocess::Rotate(Rotation::Deg90)),
                        general("Rotation 180°", Preprocess::Rotate(Rotation::Deg180)),
                        general("Rotation 270°", Preprocess::Rotate(Rotation::Deg270)),
                    ],
                ),
                output_file: "decoded_result.txt",
                location: OutputLocation::WorkingDir,
                style: ReportStyle::RawData,
                failure_hints: &[
                    "The image quality is too low",
                    "The barcode is damaged or incomplete",
                    "The barcode might not be in a supported format",
                    "Try taking a clearer photo of the barcode",
                ],
            },
        }
    }

    /// Where the result file for `image` goes.
    ///
    /// `override_dir` wins over the profile's default location.
    pub fn output_path(&self, image: &Path, override_dir: Option<&Path>) -> PathBuf {
        if let Some(dir) = override_dir {
            return dir.join(self.output_file);
        }
        match self.location {
            OutputLocation::WorkingDir => PathBuf::from(self.output_file),
            OutputLocation::ImageDir => match image.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.join(self.output_file),
                _ => PathBuf::from(self.output_file),
            },
        }
    }

    /// Whether any strategy needs the ZXing subprocess
    pub fn uses_external(&self) -> bool {
        self.chain
            .strategies()
            .iter()
            .any(|strategy| strategy.reader == ReaderKind::External)
    }
}
