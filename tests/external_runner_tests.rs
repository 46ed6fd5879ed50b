//! # External Runner Tests
//!
//! Drives `ExternalDecoder::decode_file` against small shell scripts standing
//! in for `java`. All scenarios share one test so no other test in this
//! binary forks while a script is still open for writing.

#![cfg(unix)]

mod test_helpers;

use barcode_decoder::decode_errors::DecodeError;
use barcode_decoder::decoder_config::{DecoderConfig, ExternalDecoderConfig};
use barcode_decoder::pipeline::AttemptStatus;
use barcode_decoder::profiles::{Profile, ProfileKind};
use barcode_decoder::readers::{ExternalDecoder, ReaderKind, ReaderSet};
use barcode_decoder::symbol::Symbology;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use test_helpers::*;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("script written");
    let mut permissions = std::fs::metadata(&path).expect("script metadata").permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&path, permissions).expect("script made executable");
    path
}

fn decoder_for(dir: &Path, java: &Path, timeout_secs: u64) -> ExternalDecoder {
    let config = ExternalDecoderConfig {
        java_bin: java.to_string_lossy().into_owned(),
        timeout_secs,
        ..offline_external_config(dir)
    };
    create_fake_jars(&config);
    ExternalDecoder::new(config)
}

#[tokio::test]
async fn test_decode_file_against_scripted_runner() {
    let dir = tempfile::tempdir().expect("temp dir");
    let image = write_blank_png(dir.path(), "label.png", 32, 32);

    let decoding = write_script(
        dir.path(),
        "java-decodes",
        "cat <<'EOF'\nfile:///tmp/label.png (format: QR_CODE, type: URI):\nRaw result:\nhttps://example.org\nParsed result:\nhttps://example.org\nFound 3 result points.\n  Point 0: (5.0,5.0)\n  Point 1: (5.0,45.0)\n  Point 2: (45.0,5.0)\nEOF",
    );
    let empty = write_script(
        dir.path(),
        "java-empty",
        "echo \"No barcode found\"",
    );
    let failing = write_script(
        dir.path(),
        "java-fails",
        "echo 'Error: Could not find or load main class' >&2\nexit 1",
    );
    let slow = write_script(dir.path(), "java-slow", "sleep 5");
    let plain = write_script(
        dir.path(),
        "java-plain",
        "echo '[)>01 96123450000 840 001'",
    );

    let symbols = decoder_for(dir.path(), &decoding, 10)
        .decode_file(&image)
        .await
        .expect("scripted runner decodes");
    assert_eq!(symbols.len(), 1);
    assert_eq!(symbols[0].symbology, Symbology::QrCode);
    assert_eq!(symbols[0].data, "https://example.org");
    assert_eq!(symbols[0].polygon.len(), 3);

    let nothing = decoder_for(dir.path(), &empty, 10)
        .decode_file(&image)
        .await
        .expect("no barcode is not an error");
    assert!(nothing.is_empty());

    match decoder_for(dir.path(), &failing, 10).decode_file(&image).await {
        Err(DecodeError::ExternalFailed(message)) => {
            assert!(message.contains("Could not find or load main class"))
        }
        other => panic!("expected ExternalFailed, got {:?}", other),
    }

    let timed_out = decoder_for(dir.path(), &slow, 1).decode_file(&image).await;
    assert!(matches!(timed_out, Err(DecodeError::Timeout(_))));

    // MaxiCode falls back to ZXing; output without a format header still counts
    let maxicode = Profile::build(ProfileKind::MaxiCode, &DecoderConfig::default());
    let readers = ReaderSet::new(Some(decoder_for(dir.path(), &plain, 10)));
    let outcome = maxicode
        .chain
        .run(&image, &readers, &DecoderConfig::default())
        .await
        .expect("chain runs");

    assert!(outcome.is_success());
    let last = outcome.attempts.last().expect("attempts recorded");
    assert_eq!(last.reader, ReaderKind::External);
    assert_eq!(last.status, AttemptStatus::Decoded(1));
    assert_eq!(outcome.symbols()[0].symbology, Symbology::Other("ZXING".to_string()));
    assert_eq!(outcome.symbols()[0].data, "[)>01 96123450000 840 001");
}
