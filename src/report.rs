//! Report module for rendering decode outcomes and persisting results

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::decode_errors::DecodeError;
use crate::pipeline::{AttemptRecord, AttemptStatus, DecodeOutcome};
use crate::profiles::{Profile, ReportStyle};
use crate::symbol::DecodedSymbol;

const BANNER_WIDTH: usize = 80;

fn rule(c: char) -> String {
    c.to_string().repeat(BANNER_WIDTH)
}

/// Title banner printed before the first attempt
pub fn render_banner(profile: &Profile, image: &Path) -> String {
    let mut result = String::new();
    result.push_str(&format!("{}\n", rule('=')));
    result.push_str(&format!("{}\n", profile.title));
    result.push_str(&format!("{}\n", rule('=')));
    result.push_str(&format!("Image: {}\n", image.display()));
    result
}

/// Line printed when an attempt starts
pub fn render_attempt_started(index: usize, label: &str) -> String {
    format!("\n[{}] Trying: {}...", index, label)
}

/// Line printed when an attempt ends without a result
pub fn render_attempt_finished(record: &AttemptRecord) -> Option<String> {
    match &record.status {
        AttemptStatus::Decoded(_) => None,
        AttemptStatus::NotFound => Some("    nothing found".to_string()),
        AttemptStatus::Failed(message) => Some(format!("    Error: {}", message)),
        AttemptStatus::Skipped(reason) => Some(format!("    Skipped: {}", reason)),
    }
}

/// Per-symbol detail block for a successful run
pub fn render_success(profile: &Profile, outcome: &DecodeOutcome) -> String {
    let Some(success) = outcome.success.as_ref() else {
        return String::new();
    };

    let mut result = String::new();
    result.push_str(&format!("\n{}\n", rule('=')));
    result.push_str(&format!("✓ SUCCESS! Decoded with: {}\n", success.label));
    result.push_str(&format!(
        "Found {} {}(s)\n",
        success.symbols.len(),
        profile.noun
    ));
    result.push_str(&format!("{}\n", rule('=')));

    for (i, symbol) in success.symbols.iter().enumerate() {
        result.push_str(&render_symbol(i + 1, profile, symbol));
        result.push_str(&format!("{}\n", rule('-')));
    }
    result
}

fn render_symbol(number: usize, profile: &Profile, symbol: &DecodedSymbol) -> String {
    let heading = match profile.style {
        ReportStyle::Numbered { heading } => heading,
        ReportStyle::DataMatrix => "Data Matrix",
        ReportStyle::Summary | ReportStyle::RawData => "Symbol",
    };

    let mut result = String::new();
    result.push_str(&format!("\n{} #{}\n", heading, number));
    result.push_str(&format!("  Type: {}\n", symbol.symbology));
    result.push_str(&format!("  Data: {}\n", symbol.data));
    result.push_str(&format!("  Data Length: {} characters\n", symbol.data_len()));
    if !symbol.raw_bytes.is_empty() {
        result.push_str(&format!("  Raw Bytes: {}\n", byte_literal(&symbol.raw_bytes)));
    }
    if let Some(rect) = symbol.rect {
        result.push_str(&format!("  Position: x={}, y={}\n", rect.left, rect.top));
        result.push_str(&format!("  Size: {} x {} pixels\n", rect.width, rect.height));
    }
    if let Some(quality) = symbol.quality {
        result.push_str(&format!("  Quality: {}\n", quality));
    }
    if !symbol.polygon.is_empty() {
        result.push_str(&format!(
            "  Polygon points: {} vertices\n",
            symbol.polygon.len()
        ));
    }
    if let Some(rotation) = symbol.rotation {
        result.push_str(&format!("  Rotation: {}\n", rotation));
    }
    result
}

/// Escaped byte-string rendering, e.g. `b"caf\xc3\xa9"`
pub fn byte_literal(bytes: &[u8]) -> String {
    format!("b\"{}\"", bytes.escape_ascii())
}

/// Final summary lines
pub fn render_summary(profile: &Profile, outcome: &DecodeOutcome) -> String {
    let mut result = String::new();
    if outcome.is_success() {
        let symbols = outcome.symbols();
        result.push_str("\n✅ DECODING SUCCESSFUL!\n");
        result.push_str(&format!("Total decoded {}s: {}\n", profile.noun, symbols.len()));
        for (i, symbol) in symbols.iter().enumerate() {
            result.push_str(&format!("\n{}. [{}] {}\n", i + 1, symbol.symbology, symbol.data));
        }
    } else {
        result.push_str(&format!("\n{}\n", rule('=')));
        result.push_str(&format!(
            "❌ No {} found with any method! ({} attempts)\n",
            profile.noun,
            outcome.attempts.len()
        ));
        result.push_str("\nPossible reasons:\n");
        for hint in profile.failure_hints {
            result.push_str(&format!("  - {}\n", hint));
        }
        result.push_str("\n❌ DECODING FAILED\n");
    }
    result
}

/// Content of the persisted result file
pub fn file_content(profile: &Profile, outcome: &DecodeOutcome) -> String {
    let symbols = outcome.symbols();
    let mut result = String::new();

    match profile.style {
        ReportStyle::Numbered { heading } => {
            for (i, symbol) in symbols.iter().enumerate() {
                result.push_str(&format!("{} #{}\n", heading, i + 1));
                result.push_str(&format!("Type: {}\n", symbol.symbology));
                result.push_str(&format!("Data: {}\n", symbol.data));
                result.push('\n');
            }
        }
        ReportStyle::DataMatrix => {
            for (i, symbol) in symbols.iter().enumerate() {
                result.push_str(&format!("Data Matrix #{}:\n", i + 1));
                result.push_str(&format!("{}\n", symbol.data));
                result.push('\n');
            }
        }
        ReportStyle::Summary => {
            let method = outcome
                .success
                .as_ref()
                .map(|success| success.label.as_str())
                .unwrap_or("none");
            result.push_str("MaxiCode Decoding Result\n");
            result.push_str(&format!("{}\n", rule('=')));
            result.push_str(&format!("Image: {}\n", outcome.image.display()));
            result.push_str(&format!("Method: {}\n", method));
            result.push_str(&format!(
                "Decoded at: {}\n",
                outcome.started_at.format("%Y-%m-%d %H:%M:%S UTC")
            ));
            result.push_str("\nDecoded Data:\n");
            result.push_str(&joined_data(symbols));
            result.push('\n');
            if let Some(rect) = symbols.first().and_then(|symbol| symbol.rect) {
                result.push_str(&format!("\nPosition: x={} y={}\n", rect.left, rect.top));
                result.push_str(&format!("Size: {}x{} pixels\n", rect.width, rect.height));
            }
        }
        ReportStyle::RawData => {
            result.push_str(&joined_data(symbols));
        }
    }
    result
}

fn joined_data(symbols: &[DecodedSymbol]) -> String {
    symbols
        .iter()
        .map(|symbol| symbol.data.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write the result file, creating its parent directory when needed.
pub fn save_result(path: &Path, content: &str) -> Result<(), DecodeError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DecodeError::Output(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }
    }
    std::fs::write(path, content)
        .map_err(|e| DecodeError::Output(format!("cannot write {}: {}", path.display(), e)))?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "Result file written");
    Ok(())
}

/// Write the result file for a successful outcome.
///
/// Returns the path written, or `None` when nothing was decoded.
pub fn save_outcome(
    profile: &Profile,
    outcome: &DecodeOutcome,
    override_dir: Option<&Path>,
) -> Result<Option<PathBuf>, DecodeError> {
    if !outcome.is_success() {
        return Ok(None);
    }
    let path = profile.output_path(&outcome.image, override_dir);
    save_result(&path, &file_content(profile, outcome))?;
    Ok(Some(path))
}

/// What happened after the chain: result file and text extraction
#[derive(Debug, Default)]
pub struct RunExtras {
    pub saved_to: Option<PathBuf>,
    pub save_error: Option<String>,
    pub ocr_text: Option<String>,
    pub ocr_error: Option<String>,
}

/// Everything printed after the last attempt, either the human report or JSON.
pub fn render_final(
    profile: &Profile,
    outcome: &DecodeOutcome,
    extras: &RunExtras,
    json: bool,
) -> Result<String, DecodeError> {
    if json {
        let mut report = JsonReport::new(outcome);
        report.output_file = extras.saved_to.clone();
        report.save_error = extras.save_error.clone();
        report.ocr_text = extras.ocr_text.clone();
        return Ok(format!("{}\n", report.to_json()?));
    }

    let mut result = String::new();
    if let Some(error) = &extras.save_error {
        result.push_str(&format!("\n⚠️ Could not save to file: {}\n", error));
    }
    if let Some(error) = &extras.ocr_error {
        result.push_str(&format!("\n⚠️ Text extraction failed: {}\n", error));
    }
    result.push_str(&render_success(profile, outcome));
    if let Some(path) = &extras.saved_to {
        result.push_str(&format!("\n💾 Decoded data saved to: {}\n", path.display()));
    }
    if let Some(text) = &extras.ocr_text {
        result.push_str(&format!("\nExtracted Text:\n{}\n", text));
    }
    result.push_str(&render_summary(profile, outcome));
    Ok(result)
}

/// Process exit status: 0 when something was decoded, 1 otherwise
pub fn exit_status(outcome: &DecodeOutcome) -> u8 {
    if outcome.is_success() {
        0
    } else {
        1
    }
}

/// Machine-readable report printed with `--json`
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub decoded: bool,
    #[serde(flatten)]
    pub outcome: &'a DecodeOutcome,
    /// Result file, when one was written
    pub output_file: Option<PathBuf>,
    pub save_error: Option<String>,
    pub ocr_text: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl<'a> JsonReport<'a> {
    pub fn new(outcome: &'a DecodeOutcome) -> Self {
        Self {
            decoded: outcome.is_success(),
            outcome,
            output_file: None,
            save_error: None,
            ocr_text: None,
            generated_at: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Result<String, DecodeError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| DecodeError::Output(format!("cannot serialize report: {}", e)))
    }
}
