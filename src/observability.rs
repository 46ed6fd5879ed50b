//! Observability module for tracing and metrics setup.
//!
//! This module provides:
//! - Structured logging to stderr with configurable level and format
//! - Metrics collection through a Prometheus recorder
//! - Prometheus textfile export at the end of a run
//! - Span and metric helpers used by the decode pipeline

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::prelude::*;

use crate::observability_config::{LogFormat, ObservabilityConfig};

/// Initialize structured logging with tracing and configuration
///
/// `level` overrides the configured level (see
/// [`ObservabilityConfig::level_with_verbosity`]). `RUST_LOG` directives are
/// honoured on top of it.
pub fn init_tracing_with_config(config: &ObservabilityConfig, level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("barcode_decoder={}", level).parse()?)
        .add_directive(format!("barcode_preprocessing={}", level).parse()?)
        .add_directive("rxing=warn".parse()?);

    let registry = tracing_subscriber::registry().with(filter);
    let initialized = match config.log_format {
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init(),
    };
    initialized.context("Failed to install tracing subscriber")?;

    tracing::debug!(
        log_level = %level,
        log_format = ?config.log_format,
        "Tracing initialized with structured logging"
    );
    Ok(())
}

/// Initialize metrics collection with a Prometheus recorder.
///
/// Returns `None` when metrics are disabled.
pub fn init_metrics_with_config(config: &ObservabilityConfig) -> Result<Option<PrometheusHandle>> {
    if !config.metrics_enabled {
        tracing::debug!("Metrics collection disabled");
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    tracing::debug!(
        textfile = ?config.metrics_textfile,
        "Metrics collection initialized"
    );
    Ok(Some(handle))
}

/// Write the current Prometheus exposition to `path`.
///
/// The text is written to a temporary file next to the target and renamed
/// into place, so a textfile collector never reads a partial file.
pub fn write_metrics_textfile(handle: &PrometheusHandle, path: &Path) -> Result<()> {
    handle.run_upkeep();
    let rendered = handle.render();

    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(directory)
        .with_context(|| format!("Failed to create temporary file in {}", directory.display()))?;
    file.write_all(rendered.as_bytes())
        .context("Failed to write metrics exposition")?;
    file.persist(path)
        .with_context(|| format!("Failed to move metrics file into {}", path.display()))?;

    tracing::debug!(path = %path.display(), bytes = rendered.len(), "Metrics textfile written");
    Ok(())
}

/// Create a span covering one decode run
pub fn decode_span(profile: &str, image: &str) -> tracing::Span {
    tracing::info_span!("decode", profile = profile, image = image, component = "pipeline")
}

/// Create a span for a single fallback attempt
pub fn attempt_span(index: usize, strategy: &str) -> tracing::Span {
    tracing::debug_span!("attempt", index = index, strategy = strategy)
}

/// Create a span for an external decoder invocation
pub fn external_span(backend: &str) -> tracing::Span {
    tracing::debug_span!("external_decoder", backend = backend, component = "zxing")
}

/// Create a span for OCR operations
pub fn ocr_span(operation: &str) -> tracing::Span {
    tracing::info_span!("ocr_operation", operation = operation, component = "ocr")
}

/// Record metrics for one fallback attempt
pub fn record_attempt_metrics(profile: &str, strategy: &str, result: &'static str, duration: Duration) {
    metrics::counter!(
        "decode_attempts_total",
        "profile" => profile.to_string(),
        "strategy" => strategy.to_string(),
        "result" => result
    )
    .increment(1);
    metrics::histogram!("decode_attempt_duration_seconds", "profile" => profile.to_string())
        .record(duration.as_secs_f64());
}

/// Record metrics for a whole decode run
pub fn record_run_metrics(profile: &str, success: bool, attempts: usize, duration: Duration) {
    let result = if success { "success" } else { "failure" };
    metrics::counter!("decode_runs_total", "profile" => profile.to_string(), "result" => result)
        .increment(1);
    metrics::histogram!("decode_run_duration_seconds", "profile" => profile.to_string())
        .record(duration.as_secs_f64());
    metrics::histogram!("decode_run_attempts", "profile" => profile.to_string())
        .record(attempts as f64);
}

/// Record metrics for an external decoder invocation
pub fn record_external_metrics(backend: &str, result: &'static str, duration: Duration) {
    metrics::counter!(
        "external_decoder_invocations_total",
        "backend" => backend.to_string(),
        "result" => result
    )
    .increment(1);
    metrics::histogram!("external_decoder_duration_seconds", "backend" => backend.to_string())
        .record(duration.as_secs_f64());
}

/// Record OCR operation metrics
pub fn record_ocr_metrics(success: bool, duration: Duration) {
    metrics::counter!("ocr_operations_total", "result" => if success { "success" } else { "failure" })
        .increment(1);
    metrics::histogram!("ocr_duration_seconds").record(duration.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_metrics_textfile_renders_recorded_counters() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_attempt_metrics("qr", "original", "decoded", Duration::from_millis(12));
            record_run_metrics("qr", true, 1, Duration::from_millis(15));
        });

        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("decoder.prom");
        write_metrics_textfile(&handle, &path).expect("textfile written");

        let content = std::fs::read_to_string(&path).expect("textfile readable");
        assert!(content.contains("decode_attempts_total"));
        assert!(content.contains("decode_runs_total"));
        assert!(content.contains("profile=\"qr\""));
    }

    #[test]
    fn test_disabled_metrics_install_nothing() {
        let config = ObservabilityConfig {
            metrics_enabled: false,
            ..Default::default()
        };
        let handle = init_metrics_with_config(&config).expect("disabled metrics never fail");
        assert!(handle.is_none());
    }
}
