//! # Fallback Chain
//!
//! Runs an ordered list of preprocessing + reader strategies against one
//! image until a strategy yields at least one accepted symbol.
//!
//! The image is validated and loaded once. Preprocessing and reader failures
//! are recorded on the attempt and the chain moves on; only validation and
//! image loading abort the run.

use chrono::{DateTime, Utc};
use image::DynamicImage;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn, Instrument};

use crate::decode_errors::DecodeError;
use crate::decoder_config::DecoderConfig;
use crate::observability;
use crate::preprocessing::{self, Preprocess};
use crate::readers::{ReaderKind, ReaderSet};
use crate::symbol::{DecodedSymbol, Symbology};
use crate::validation::validate_image_file;

/// One step of a fallback chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Strategy {
    /// Human-readable name printed in the attempt log
    pub label: String,
    pub preprocess: Preprocess,
    pub reader: ReaderKind,
}

impl Strategy {
    pub fn new(label: impl Into<String>, preprocess: Preprocess, reader: ReaderKind) -> Self {
        Self {
            label: label.into(),
            preprocess,
            reader,
        }
    }
}

/// How an attempt ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum AttemptStatus {
    /// Number of accepted symbols
    Decoded(usize),
    NotFound,
    Failed(String),
    /// The strategy's reader is not available
    Skipped(String),
}

impl AttemptStatus {
    /// Label used for the `result` metric dimension
    pub fn metric_label(&self) -> &'static str {
        match self {
            AttemptStatus::Decoded(_) => "decoded",
            AttemptStatus::NotFound => "not_found",
            AttemptStatus::Failed(_) => "failed",
            AttemptStatus::Skipped(_) => "skipped",
        }
    }
}

/// Record of one attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptRecord {
    /// 1-based position in the chain
    pub index: usize,
    pub label: String,
    pub reader: ReaderKind,
    #[serde(flatten)]
    pub status: AttemptStatus,
    pub elapsed_ms: u64,
}

/// The attempt that ended the chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessfulAttempt {
    pub index: usize,
    pub label: String,
    pub symbols: Vec<DecodedSymbol>,
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
pub struct DecodeOutcome {
    pub profile: String,
    pub image: PathBuf,
    pub started_at: DateTime<Utc>,
    pub attempts: Vec<AttemptRecord>,
    pub success: Option<SuccessfulAttempt>,
    pub total_ms: u64,
}

impl DecodeOutcome {
    pub fn is_success(&self) -> bool {
        self.success.is_some()
    }

    /// Symbols of the successful attempt, empty on failure.
    pub fn symbols(&self) -> &[DecodedSymbol] {
        self.success
            .as_ref()
            .map(|success| success.symbols.as_slice())
            .unwrap_or(&[])
    }
}

/// Progress notifications emitted while a chain runs
#[derive(Debug)]
pub enum AttemptEvent<'a> {
    Started { index: usize, strategy: &'a Strategy },
    Finished(&'a AttemptRecord),
}

/// Ordered strategies plus the symbologies a profile accepts
#[derive(Debug, Clone)]
pub struct FallbackChain {
    profile: String,
    strategies: Vec<Strategy>,
    accepts: Option<Vec<Symbology>>,
}

impl FallbackChain {
    pub fn new(profile: impl Into<String>, strategies: Vec<Strategy>) -> Self {
        Self {
            profile: profile.into(),
            strategies,
            accepts: None,
        }
    }

    /// Restrict accepted symbols to the given symbologies.
    pub fn accepting(mut self, symbologies: Vec<Symbology>) -> Self {
        self.accepts = Some(symbologies);
        self
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// Whether symbols of this symbology end the chain.
    pub fn accepts(&self, symbology: &Symbology) -> bool {
        self.accepts
            .as_ref()
            .map_or(true, |accepted| accepted.contains(symbology))
    }

    /// Whether a symbol returned by `reader` ends the chain.
    ///
    /// Output of the external decoder without a format header comes back as
    /// `Symbology::Other` and is kept regardless of the filter.
    pub fn accepts_from(&self, reader: ReaderKind, symbology: &Symbology) -> bool {
        self.accepts(symbology)
            || (reader == ReaderKind::External && matches!(symbology, Symbology::Other(_)))
    }

    /// Run the chain without progress notifications.
    pub async fn run(
        &self,
        path: &Path,
        readers: &ReaderSet,
        config: &DecoderConfig,
    ) -> Result<DecodeOutcome, DecodeError> {
        self.run_with_progress(path, readers, config, |_| {}).await
    }

    /// Run the chain, calling `on_event` before and after every attempt.
    pub async fn run_with_progress<F>(
        &self,
        path: &Path,
        readers: &ReaderSet,
        config: &DecoderConfig,
        on_event: F,
    ) -> Result<DecodeOutcome, DecodeError>
    where
        F: FnMut(AttemptEvent<'_>),
    {
        let span = observability::decode_span(&self.profile, &path.display().to_string());
        self.execute(path, readers, config, on_event)
            .instrument(span)
            .await
    }

    async fn execute<F>(
        &self,
        path: &Path,
        readers: &ReaderSet,
        config: &DecoderConfig,
        mut on_event: F,
    ) -> Result<DecodeOutcome, DecodeError>
    where
        F: FnMut(AttemptEvent<'_>),
    {
        let started_at = Utc::now();
        let run_start = Instant::now();

        validate_image_file(path, config)?;
        let image = image::open(path)?;
        info!(
            width = image.width(),
            height = image.height(),
            strategies = self.strategies.len(),
            "Image loaded, starting fallback chain"
        );

        let mut attempts = Vec::with_capacity(self.strategies.len());
        let mut success = None;

        for (position, strategy) in self.strategies.iter().enumerate() {
            let index = position + 1;
            on_event(AttemptEvent::Started { index, strategy });

            let attempt_start = Instant::now();
            let span = observability::attempt_span(index, &strategy.label);
            let result = self
                .attempt(strategy, path, &image, readers)
                .instrument(span)
                .await;
            let elapsed = attempt_start.elapsed();

            let (status, accepted) = match result {
                Ok(Some(symbols)) if !symbols.is_empty() => {
                    (AttemptStatus::Decoded(symbols.len()), Some(symbols))
                }
                Ok(Some(_)) => (AttemptStatus::NotFound, None),
                Ok(None) => (
                    AttemptStatus::Skipped("external decoder disabled".to_string()),
                    None,
                ),
                Err(e) => {
                    warn!(strategy = %strategy.label, error = %e, "Decode attempt failed");
                    (AttemptStatus::Failed(e.to_string()), None)
                }
            };

            observability::record_attempt_metrics(
                &self.profile,
                &strategy.label,
                status.metric_label(),
                elapsed,
            );

            let record = AttemptRecord {
                index,
                label: strategy.label.clone(),
                reader: strategy.reader,
                status,
                elapsed_ms: elapsed.as_millis() as u64,
            };
            on_event(AttemptEvent::Finished(&record));
            attempts.push(record);

            if let Some(symbols) = accepted {
                info!(strategy = %strategy.label, symbols = symbols.len(), "Decoded");
                success = Some(SuccessfulAttempt {
                    index,
                    label: strategy.label.clone(),
                    symbols,
                });
                break;
            }
        }

        let total = run_start.elapsed();
        observability::record_run_metrics(&self.profile, success.is_some(), attempts.len(), total);

        Ok(DecodeOutcome {
            profile: self.profile.clone(),
            image: path.to_path_buf(),
            started_at,
            attempts,
            success,
            total_ms: total.as_millis() as u64,
        })
    }

    /// One attempt. `Ok(None)` means the reader was not available.
    async fn attempt(
        &self,
        strategy: &Strategy,
        path: &Path,
        image: &DynamicImage,
        readers: &ReaderSet,
    ) -> Result<Option<Vec<DecodedSymbol>>, DecodeError> {
        let symbols = match strategy.reader {
            ReaderKind::External => {
                let Some(external) = readers.external.as_ref() else {
                    return Ok(None);
                };
                if strategy.preprocess == Preprocess::Original {
                    external.decode_file(path).await?
                } else {
                    let processed = preprocessing::apply(image, &strategy.preprocess)?;
                    let scratch = write_scratch_png(&processed.image)?;
                    external.decode_file(scratch.path()).await?
                }
            }
            kind => {
                let processed = preprocessing::apply(image, &strategy.preprocess)?;
                let reader = readers.in_process(kind).ok_or_else(|| {
                    DecodeError::Reader(format!("no in-process reader for {}", kind))
                })?;
                reader.read(&processed.image)?
            }
        };

        let found = symbols.len();
        let rotation = strategy.preprocess.rotation();
        let accepted: Vec<DecodedSymbol> = symbols
            .into_iter()
            .filter(|symbol| self.accepts_from(strategy.reader, &symbol.symbology))
            .map(|mut symbol| {
                symbol.rotation = rotation;
                symbol
            })
            .collect();

        if accepted.len() < found {
            debug!(
                found,
                accepted = accepted.len(),
                "Discarded symbols of other symbologies"
            );
        }

        Ok(Some(accepted))
    }
}

/// Writes a preprocessed image to a temporary PNG for the external decoder.
fn write_scratch_png(image: &DynamicImage) -> Result<tempfile::NamedTempFile, DecodeError> {
    let scratch = tempfile::Builder::new()
        .prefix("barcode-decoder-")
        .suffix(".png")
        .tempfile()
        .map_err(|e| DecodeError::ExternalFailed(format!("cannot create scratch image: {}", e)))?;
    image
        .save_with_format(scratch.path(), image::ImageFormat::Png)
        .map_err(|e| DecodeError::ExternalFailed(format!("cannot write scratch image: {}", e)))?;
    Ok(scratch)
}
