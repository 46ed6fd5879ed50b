//! # Decoder Configuration Module
//!
//! This module defines configuration structures for the decode pipeline,
//! the external ZXing decoder and OCR, including format limits and
//! preprocessing parameters.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::{AppError, AppResult};

// Constants for decoder configuration
pub const FORMAT_DETECTION_BUFFER_SIZE: usize = 32;
pub const MIN_FORMAT_BYTES: usize = 8;
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB general limit for image files
pub const MAX_MEMORY_BYTES: u64 = 512 * 1024 * 1024;

pub const DEFAULT_BINARY_THRESHOLD: u8 = 127;
pub const DEFAULT_ADAPTIVE_BLOCK_SIZE: u32 = 11;
pub const DEFAULT_ADAPTIVE_C: f32 = 2.0;
pub const DEFAULT_CLAHE_CLIP_LIMIT: f32 = 2.0;
pub const DEFAULT_CLAHE_TILES: u32 = 8;
pub const DEFAULT_DENOISE_RADIUS: u32 = 1;

pub const ZXING_MAIN_CLASS: &str = "com.google.zxing.client.j2se.CommandLineRunner";
pub const DEFAULT_JAVASE_JAR: &str = "javase-3.5.0.jar";
pub const DEFAULT_CORE_JAR: &str = "core-3.5.0.jar";
pub const DEFAULT_JCOMMANDER_JAR: &str = "jcommander-1.82.jar";
pub const DEFAULT_DOCKER_IMAGE: &str = "zxing-decoder";
pub const DEFAULT_DOCKER_JVM_IMAGE: &str = "openjdk:17";

pub const DEFAULT_OCR_LANGUAGES: &str = "eng";

/// Format-specific file size limits for different image formats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatSizeLimits {
    /// PNG format limit (higher due to better compression)
    pub png_max: u64,
    /// JPEG format limit
    pub jpeg_max: u64,
    /// BMP format limit (uncompressed)
    pub bmp_max: u64,
    /// TIFF format limit
    pub tiff_max: u64,
    /// Files above this size are rejected before format detection
    pub quick_reject: u64,
}

impl Default for FormatSizeLimits {
    fn default() -> Self {
        Self {
            png_max: 15 * 1024 * 1024,      // 15MB for PNG
            jpeg_max: 10 * 1024 * 1024,     // 10MB for JPEG
            bmp_max: 5 * 1024 * 1024,       // 5MB for BMP
            tiff_max: 20 * 1024 * 1024,     // 20MB for TIFF
            quick_reject: 50 * 1024 * 1024, // 50MB quick reject
        }
    }
}

impl FormatSizeLimits {
    /// Validate format size limits
    pub fn validate(&self) -> AppResult<()> {
        for (name, value) in [
            ("png_max", self.png_max),
            ("jpeg_max", self.jpeg_max),
            ("bmp_max", self.bmp_max),
            ("tiff_max", self.tiff_max),
            ("quick_reject", self.quick_reject),
        ] {
            if value == 0 {
                return Err(AppError::Config(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        let largest = self.png_max.max(self.jpeg_max).max(self.bmp_max).max(self.tiff_max);
        if largest > self.quick_reject {
            return Err(AppError::Config(format!(
                "format limits ({}) must not exceed quick_reject ({})",
                largest, self.quick_reject
            )));
        }

        Ok(())
    }
}

/// Configuration for the decode pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Directory for result files; `None` keeps each profile's default location
    pub output_dir: Option<PathBuf>,
    /// Threshold for the fixed binary steps
    pub binary_threshold: u8,
    /// Neighbourhood size for adaptive thresholding (odd, >= 3)
    pub adaptive_block_size: u32,
    /// Constant subtracted from the local mean in adaptive thresholding
    pub adaptive_c: f32,
    pub clahe_clip_limit: f32,
    /// CLAHE grid size along each axis
    pub clahe_tiles: u32,
    pub denoise_radius: u32,
    /// Buffer size for format detection in bytes
    pub buffer_size: usize,
    /// Minimum bytes required for format detection
    pub min_format_bytes: usize,
    /// Maximum allowed file size for unrecognised formats
    pub max_file_size: u64,
    /// Upper bound on the estimated decoded image size
    pub max_memory_bytes: u64,
    pub format_limits: FormatSizeLimits,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            binary_threshold: DEFAULT_BINARY_THRESHOLD,
            adaptive_block_size: DEFAULT_ADAPTIVE_BLOCK_SIZE,
            adaptive_c: DEFAULT_ADAPTIVE_C,
            clahe_clip_limit: DEFAULT_CLAHE_CLIP_LIMIT,
            clahe_tiles: DEFAULT_CLAHE_TILES,
            denoise_radius: DEFAULT_DENOISE_RADIUS,
            buffer_size: FORMAT_DETECTION_BUFFER_SIZE,
            min_format_bytes: MIN_FORMAT_BYTES,
            max_file_size: MAX_FILE_SIZE,
            max_memory_bytes: MAX_MEMORY_BYTES,
            format_limits: FormatSizeLimits::default(),
        }
    }
}

impl DecoderConfig {
    /// Validate decoder configuration parameters
    pub fn validate(&self) -> AppResult<()> {
        if self.adaptive_block_size < 3 || self.adaptive_block_size % 2 == 0 {
            return Err(AppError::Config(format!(
                "adaptive_block_size must be odd and >= 3, got {}",
                self.adaptive_block_size
            )));
        }
        if self.clahe_clip_limit.is_nan() || self.clahe_clip_limit <= 0.0 {
            return Err(AppError::Config(format!(
                "clahe_clip_limit must be greater than 0, got {}",
                self.clahe_clip_limit
            )));
        }
        if self.clahe_tiles == 0 {
            return Err(AppError::Config(
                "clahe_tiles must be greater than 0".to_string(),
            ));
        }
        if self.denoise_radius == 0 {
            return Err(AppError::Config(
                "denoise_radius must be greater than 0".to_string(),
            ));
        }
        if self.buffer_size == 0 {
            return Err(AppError::Config(
                "buffer_size must be greater than 0".to_string(),
            ));
        }
        if self.min_format_bytes == 0 || self.min_format_bytes > self.buffer_size {
            return Err(AppError::Config(format!(
                "min_format_bytes ({}) must be between 1 and buffer_size ({})",
                self.min_format_bytes, self.buffer_size
            )));
        }
        if self.max_file_size == 0 {
            return Err(AppError::Config(
                "max_file_size must be greater than 0".to_string(),
            ));
        }
        if self.max_memory_bytes == 0 {
            return Err(AppError::Config(
                "max_memory_bytes must be greater than 0".to_string(),
            ));
        }

        self.format_limits.validate()?;

        Ok(())
    }
}

/// How the Docker backend runs ZXing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DockerMode {
    /// Mount the jar directory into a stock JVM image
    #[default]
    Jvm,
    /// Run an image whose entrypoint already is the ZXing runner
    Prebuilt,
}

impl std::str::FromStr for DockerMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jvm" => Ok(DockerMode::Jvm),
            "prebuilt" => Ok(DockerMode::Prebuilt),
            other => Err(AppError::Config(format!(
                "Invalid docker mode '{}': expected 'jvm' or 'prebuilt'",
                other
            ))),
        }
    }
}

/// Configuration for the external ZXing `CommandLineRunner`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalDecoderConfig {
    /// Master switch; when false every external strategy is skipped
    pub enabled: bool,
    pub java_bin: String,
    /// Directory holding the ZXing jars
    pub jar_dir: PathBuf,
    pub javase_jar: String,
    pub core_jar: String,
    pub jcommander_jar: String,
    pub main_class: String,
    /// Time budget for the host JVM invocation
    pub timeout_secs: u64,
    pub docker_enabled: bool,
    pub docker_bin: String,
    pub docker_mode: DockerMode,
    /// Image used in `Prebuilt` mode
    pub docker_image: String,
    /// Image used in `Jvm` mode
    pub docker_jvm_image: String,
    /// Time budget for one Docker invocation
    pub docker_timeout_secs: u64,
}

impl Default for ExternalDecoderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            java_bin: "java".to_string(),
            jar_dir: PathBuf::from("."),
            javase_jar: DEFAULT_JAVASE_JAR.to_string(),
            core_jar: DEFAULT_CORE_JAR.to_string(),
            jcommander_jar: DEFAULT_JCOMMANDER_JAR.to_string(),
            main_class: ZXING_MAIN_CLASS.to_string(),
            timeout_secs: 10,
            docker_enabled: true,
            docker_bin: "docker".to_string(),
            docker_mode: DockerMode::default(),
            docker_image: DEFAULT_DOCKER_IMAGE.to_string(),
            docker_jvm_image: DEFAULT_DOCKER_JVM_IMAGE.to_string(),
            docker_timeout_secs: 30,
        }
    }
}

impl ExternalDecoderConfig {
    /// The three jars in classpath order.
    pub fn jar_names(&self) -> [&str; 3] {
        [&self.javase_jar, &self.core_jar, &self.jcommander_jar]
    }

    /// Full paths of the jars on the host.
    pub fn jar_paths(&self) -> Vec<PathBuf> {
        self.jar_names()
            .iter()
            .map(|name| self.jar_dir.join(name))
            .collect()
    }

    /// Validate external decoder configuration parameters
    pub fn validate(&self) -> AppResult<()> {
        if self.java_bin.trim().is_empty() {
            return Err(AppError::Config("java_bin cannot be empty".to_string()));
        }
        if self.main_class.trim().is_empty() {
            return Err(AppError::Config("main_class cannot be empty".to_string()));
        }
        if self.jar_names().iter().any(|name| name.trim().is_empty()) {
            return Err(AppError::Config("jar names cannot be empty".to_string()));
        }
        if self.timeout_secs == 0 || self.docker_timeout_secs == 0 {
            return Err(AppError::Config(
                "external decoder timeouts must be greater than 0".to_string(),
            ));
        }
        if self.docker_enabled {
            if self.docker_bin.trim().is_empty() {
                return Err(AppError::Config("docker_bin cannot be empty".to_string()));
            }
            let image = match self.docker_mode {
                DockerMode::Jvm => &self.docker_jvm_image,
                DockerMode::Prebuilt => &self.docker_image,
            };
            if image.trim().is_empty() {
                return Err(AppError::Config(
                    "docker image cannot be empty when docker is enabled".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Configuration structure for OCR processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrConfig {
    /// OCR language codes (e.g., "eng", "eng+fra")
    pub languages: String,
    /// Directory containing `*.traineddata`; `None` uses Tesseract's default
    pub tessdata_dir: Option<String>,
    /// Timeout for one OCR run in seconds
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            languages: DEFAULT_OCR_LANGUAGES.to_string(),
            tessdata_dir: None,
            timeout_secs: 30,
        }
    }
}

impl OcrConfig {
    /// Validate OCR configuration parameters
    pub fn validate(&self) -> AppResult<()> {
        if self.languages.trim().is_empty() {
            return Err(AppError::Config("languages cannot be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(AppError::Config(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(DecoderConfig::default().validate().is_ok());
        assert!(ExternalDecoderConfig::default().validate().is_ok());
        assert!(OcrConfig::default().validate().is_ok());
    }

    #[test]
    #[allow(unused_assignments)]
    fn test_decoder_config_validation() {
        let mut config = DecoderConfig::default();

        config.adaptive_block_size = 10;
        assert!(config.validate().is_err());
        config.adaptive_block_size = 1;
        assert!(config.validate().is_err());
        config.adaptive_block_size = 11;

        config.clahe_clip_limit = 0.0;
        assert!(config.validate().is_err());
        config.clahe_clip_limit = f32::NAN;
        assert!(config.validate().is_err());
        config.clahe_clip_limit = 2.0;

        config.clahe_tiles = 0;
        assert!(config.validate().is_err());
        config.clahe_tiles = 8;

        config.min_format_bytes = 64;
        assert!(config.validate().is_err());
        config.min_format_bytes = 8;

        assert!(config.validate().is_ok());
    }

    #[test]
    #[allow(unused_assignments)]
    fn test_format_size_limits_validation() {
        let mut limits = FormatSizeLimits::default();
        assert!(limits.validate().is_ok());

        limits.png_max = 0;
        assert!(limits.validate().is_err());
        limits.png_max = 15 * 1024 * 1024;

        limits.tiff_max = 60 * 1024 * 1024;
        assert!(limits.validate().is_err());
        limits.tiff_max = 20 * 1024 * 1024;

        assert!(limits.validate().is_ok());
    }

    #[test]
    fn test_external_config_jar_paths() {
        let config = ExternalDecoderConfig {
            jar_dir: PathBuf::from("/opt/zxing"),
            ..Default::default()
        };
        let paths = config.jar_paths();
        assert_eq!(paths[0], PathBuf::from("/opt/zxing/javase-3.5.0.jar"));
        assert_eq!(paths[1], PathBuf::from("/opt/zxing/core-3.5.0.jar"));
        assert_eq!(paths[2], PathBuf::from("/opt/zxing/jcommander-1.82.jar"));
    }

    #[test]
    fn test_external_config_validation() {
        let config = ExternalDecoderConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ExternalDecoderConfig {
            docker_mode: DockerMode::Prebuilt,
            docker_image: " ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ExternalDecoderConfig {
            docker_enabled: false,
            docker_image: String::new(),
            docker_mode: DockerMode::Prebuilt,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_docker_mode_parsing() {
        assert_eq!("JVM".parse::<DockerMode>().ok(), Some(DockerMode::Jvm));
        assert_eq!(
            "prebuilt".parse::<DockerMode>().ok(),
            Some(DockerMode::Prebuilt)
        );
        assert!("podman".parse::<DockerMode>().is_err());
    }

    #[test]
    fn test_ocr_config_validation() {
        let config = OcrConfig {
            languages: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
