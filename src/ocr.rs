//! # OCR Processing Module
//!
//! Extracts human-readable text printed next to a barcode using the Tesseract
//! OCR engine through `leptess`.
//!
//! Tesseract is blocking, so each extraction runs on tokio's blocking pool
//! under a timeout.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn, Instrument};

use crate::decode_errors::DecodeError;
use crate::decoder_config::OcrConfig;
use crate::observability;

/// Tesseract-backed text extractor
#[derive(Debug, Clone)]
pub struct TextExtractor {
    config: OcrConfig,
}

impl TextExtractor {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    /// Extract text from an image file.
    ///
    /// The text is trimmed, blank lines are dropped and each remaining line
    /// is trimmed.
    pub async fn extract_text(&self, image_path: &Path) -> Result<String, DecodeError> {
        let span = observability::ocr_span("extract_text");
        self.run_with_timeout(image_path).instrument(span).await
    }

    async fn run_with_timeout(&self, image_path: &Path) -> Result<String, DecodeError> {
        let start_time = Instant::now();
        let timeout = Duration::from_secs(self.config.timeout_secs);
        let path: PathBuf = image_path.to_path_buf();
        let languages = self.config.languages.clone();
        let tessdata = self.config.tessdata_dir.clone();

        debug!(
            image = %path.display(),
            languages = %languages,
            "Starting OCR text extraction"
        );

        let task = tokio::task::spawn_blocking(move || {
            run_tesseract(&path, tessdata.as_deref(), &languages)
        });

        let result = match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(DecodeError::Ocr(format!(
                "OCR worker failed: {}",
                join_error
            ))),
            Err(_) => Err(DecodeError::Timeout(format!(
                "OCR did not finish within {}s",
                self.config.timeout_secs
            ))),
        };

        let elapsed = start_time.elapsed();
        observability::record_ocr_metrics(result.is_ok(), elapsed);

        match result {
            Ok(raw) => {
                let text = clean_ocr_text(&raw);
                debug!(
                    "OCR processing completed in {}ms, extracted {} characters",
                    elapsed.as_millis(),
                    text.len()
                );
                Ok(text)
            }
            Err(e) => {
                warn!("OCR processing failed after {}ms: {}", elapsed.as_millis(), e);
                Err(e)
            }
        }
    }
}

fn run_tesseract(path: &Path, tessdata: Option<&str>, languages: &str) -> Result<String, DecodeError> {
    let mut tess = leptess::LepTess::new(tessdata, languages)
        .map_err(|e| DecodeError::Ocr(format!("Failed to initialize Tesseract: {}", e)))?;

    tess.set_image(path)
        .map_err(|e| DecodeError::Ocr(format!("Failed to load image for OCR: {}", e)))?;

    tess.get_utf8_text()
        .map_err(|e| DecodeError::Ocr(format!("Failed to extract text from image: {}", e)))
}

/// Trim the text, drop blank lines and trim each remaining line.
pub fn clean_ocr_text(raw: &str) -> String {
    raw.trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<&str>>()
        .join("\n")
}
