//! # Unified Application Configuration
//!
//! This module consolidates all decoder settings into a single, structured
//! configuration object. It supports loading from environment variables
//! (after `.env` has been read by `dotenvy`), validation, and a one-line
//! summary for logging.

use crate::decoder_config::{DecoderConfig, ExternalDecoderConfig, OcrConfig};
use crate::errors::{AppError, AppResult};
use crate::observability_config::ObservabilityConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Main application configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub decoder: DecoderConfig,
    pub external: ExternalDecoderConfig,
    pub ocr: OcrConfig,
    pub observability: ObservabilityConfig,
}

/// Parse `key` from `lookup`, falling back to `default` when unset.
fn parse_var<T, F>(lookup: &F, key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an invalid value '{}'", key, value))),
        _ => Ok(default),
    }
}

fn string_var<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|value| !value.trim().is_empty())
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::from_lookup(|key| env::var(key).ok())?;
        config.observability = ObservabilityConfig::from_env()?;
        Ok(config)
    }

    /// Build the decoder sections from an arbitrary variable source.
    ///
    /// Observability settings keep their defaults here; they are read by
    /// [`ObservabilityConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // Decoder configuration
        config.decoder.output_dir = string_var(&lookup, "BARCODE_OUTPUT_DIR").map(PathBuf::from);
        config.decoder.binary_threshold =
            parse_var(&lookup, "BINARY_THRESHOLD", config.decoder.binary_threshold)?;
        config.decoder.adaptive_block_size =
            parse_var(&lookup, "ADAPTIVE_BLOCK_SIZE", config.decoder.adaptive_block_size)?;
        config.decoder.adaptive_c = parse_var(&lookup, "ADAPTIVE_C", config.decoder.adaptive_c)?;
        config.decoder.clahe_clip_limit =
            parse_var(&lookup, "CLAHE_CLIP_LIMIT", config.decoder.clahe_clip_limit)?;
        config.decoder.max_file_size =
            parse_var(&lookup, "MAX_IMAGE_SIZE_BYTES", config.decoder.max_file_size)?;

        // External ZXing decoder
        config.external.enabled = parse_var(&lookup, "ZXING_ENABLED", config.external.enabled)?;
        if let Some(java_bin) = string_var(&lookup, "ZXING_JAVA_BIN") {
            config.external.java_bin = java_bin;
        }
        if let Some(jar_dir) = string_var(&lookup, "ZXING_JAR_DIR") {
            config.external.jar_dir = PathBuf::from(jar_dir);
        }
        config.external.timeout_secs =
            parse_var(&lookup, "ZXING_TIMEOUT_SECS", config.external.timeout_secs)?;
        config.external.docker_enabled =
            parse_var(&lookup, "ZXING_DOCKER_ENABLED", config.external.docker_enabled)?;
        config.external.docker_mode =
            parse_var(&lookup, "ZXING_DOCKER_MODE", config.external.docker_mode)?;
        if let Some(image) = string_var(&lookup, "ZXING_DOCKER_IMAGE") {
            config.external.docker_image = image;
        }
        if let Some(image) = string_var(&lookup, "ZXING_DOCKER_JVM_IMAGE") {
            config.external.docker_jvm_image = image;
        }
        config.external.docker_timeout_secs = parse_var(
            &lookup,
            "ZXING_DOCKER_TIMEOUT_SECS",
            config.external.docker_timeout_secs,
        )?;

        // OCR configuration
        if let Some(languages) = string_var(&lookup, "OCR_LANGUAGES") {
            config.ocr.languages = languages;
        }
        config.ocr.tessdata_dir = string_var(&lookup, "OCR_TESSDATA_DIR");
        config.ocr.timeout_secs = parse_var(&lookup, "OCR_TIMEOUT_SECS", config.ocr.timeout_secs)?;

        Ok(config)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> AppResult<()> {
        self.decoder.validate()?;
        self.external.validate()?;
        self.ocr.validate()?;
        self.observability.validate()?;
        Ok(())
    }

    /// Get a summary of the current configuration for logging
    pub fn summary(&self) -> String {
        format!(
            "Configuration: output_dir={}, zxing_enabled={}, jar_dir={}, docker_enabled={}, docker_mode={:?}, ocr_languages={}, log_format={:?}, metrics_enabled={}",
            self.decoder
                .output_dir
                .as_ref()
                .map(|dir| dir.display().to_string())
                .unwrap_or_else(|| "<profile default>".to_string()),
            self.external.enabled,
            self.external.jar_dir.display(),
            self.external.docker_enabled,
            self.external.docker_mode,
            self.ocr.languages,
            self.observability.log_format,
            self.observability.metrics_enabled
        )
    }
}
