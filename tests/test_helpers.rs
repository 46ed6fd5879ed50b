//! # Test Helper Library
//!
//! Common setup for the integration tests: synthetic barcode images rendered
//! with the rxing writer, blank images, and configs that never reach for
//! Java or Docker.

#![allow(dead_code)]

use barcode_decoder::config::AppConfig;
use barcode_decoder::decoder_config::ExternalDecoderConfig;
use image::{GrayImage, Luma};
use rxing::{BarcodeFormat, MultiFormatWriter, Writer};
use std::path::{Path, PathBuf};

/// Render `text` as a barcode of `format`, black modules on white.
///
/// The writer scales the symbol to roughly `width` x `height` and adds its
/// own quiet zone.
pub fn render_symbol(text: &str, format: &BarcodeFormat, width: i32, height: i32) -> GrayImage {
    let matrix = MultiFormatWriter::default()
        .encode(text, format, width, height)
        .expect("rxing can encode the test payload");

    GrayImage::from_fn(matrix.getWidth(), matrix.getHeight(), |x, y| {
        if matrix.get(x, y) {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

/// Render a symbol and save it as a PNG in `dir`
pub fn write_symbol_png(dir: &Path, name: &str, text: &str, format: &BarcodeFormat) -> PathBuf {
    let (width, height) = match format {
        BarcodeFormat::PDF_417 => (400, 160),
        BarcodeFormat::CODE_128 | BarcodeFormat::EAN_13 => (320, 120),
        _ => (240, 240),
    };
    let image = render_symbol(text, format, width, height);
    let path = dir.join(name);
    image.save(&path).expect("test image can be written");
    path
}

/// Save a plain white PNG in `dir`
pub fn write_blank_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    GrayImage::from_pixel(width, height, Luma([255]))
        .save(&path)
        .expect("blank image can be written");
    path
}

/// External decoder settings that can never find a backend
pub fn offline_external_config(jar_dir: &Path) -> ExternalDecoderConfig {
    ExternalDecoderConfig {
        jar_dir: jar_dir.to_path_buf(),
        docker_enabled: false,
        ..Default::default()
    }
}

/// Create empty files named like the ZXing jars so the host JVM backend is planned
pub fn create_fake_jars(config: &ExternalDecoderConfig) {
    for path in config.jar_paths() {
        std::fs::write(&path, b"").expect("fake jar can be created");
    }
}

/// App configuration with the external decoder switched off
pub fn offline_app_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.external.enabled = false;
    config
}
