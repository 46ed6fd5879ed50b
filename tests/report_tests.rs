//! # Report Tests
//!
//! Console rendering, result file layouts and the JSON report.

use barcode_decoder::decoder_config::DecoderConfig;
use barcode_decoder::pipeline::{AttemptRecord, AttemptStatus, DecodeOutcome, SuccessfulAttempt};
use barcode_decoder::profiles::{Profile, ProfileKind};
use barcode_decoder::readers::ReaderKind;
use barcode_decoder::report::{self, JsonReport, RunExtras};
use barcode_decoder::symbol::{DecodedSymbol, Symbology};
use chrono::Utc;
use std::path::PathBuf;

fn profile(kind: ProfileKind) -> Profile {
    Profile::build(kind, &DecoderConfig::default())
}

fn outcome(profile: &str, symbols: Vec<DecodedSymbol>) -> DecodeOutcome {
    let mut attempts = vec![AttemptRecord {
        index: 1,
        label: "Original image".to_string(),
        reader: ReaderKind::General,
        status: AttemptStatus::NotFound,
        elapsed_ms: 4,
    }];
    let success = if symbols.is_empty() {
        None
    } else {
        attempts.push(AttemptRecord {
            index: 2,
            label: "Grayscale conversion".to_string(),
            reader: ReaderKind::General,
            status: AttemptStatus::Decoded(symbols.len()),
            elapsed_ms: 6,
        });
        Some(SuccessfulAttempt {
            index: 2,
            label: "Grayscale conversion".to_string(),
            symbols,
        })
    };

    DecodeOutcome {
        profile: profile.to_string(),
        image: PathBuf::from("/scans/label.png"),
        started_at: Utc::now(),
        attempts,
        success,
        total_ms: 10,
    }
}

fn square(symbology: Symbology, data: &str) -> DecodedSymbol {
    DecodedSymbol::new(
        symbology,
        data,
        vec![(10.0, 20.0), (70.0, 20.0), (70.0, 80.0), (10.0, 80.0)],
    )
}

#[test]
fn test_banner_has_title_and_image() {
    let banner = report::render_banner(&profile(ProfileKind::Qr), std::path::Path::new("qr.png"));
    let lines: Vec<&str> = banner.lines().collect();
    assert_eq!(lines[0], "=".repeat(80));
    assert_eq!(lines[1], "QR CODE DECODER");
    assert_eq!(lines[3], "Image: qr.png");
}

#[test]
fn test_success_block_lists_symbol_details() {
    let qr = profile(ProfileKind::Qr);
    let result = outcome("qr", vec![square(Symbology::QrCode, "héllo")]);
    let block = report::render_success(&qr, &result);

    assert!(block.contains("✓ SUCCESS! Decoded with: Grayscale conversion"));
    assert!(block.contains("QR Code #1"));
    assert!(block.contains("  Type: QRCODE"));
    assert!(block.contains("  Data: héllo"));
    assert!(block.contains("  Data Length: 5 characters"));
    assert!(block.contains("  Raw Bytes: b\"h\\xc3\\xa9llo\""));
    assert!(block.contains("  Position: x=10, y=20"));
    assert!(block.contains("  Size: 60 x 60 pixels"));
    assert!(block.contains("  Polygon points: 4 vertices"));
    assert!(!block.contains("Quality:"));
}

#[test]
fn test_summary_on_success_and_failure() {
    let barcode = profile(ProfileKind::Barcode);

    let success = report::render_summary(
        &barcode,
        &outcome("barcode", vec![square(Symbology::Ean13, "4006381333931")]),
    );
    assert!(success.contains("✅ DECODING SUCCESSFUL!"));
    assert!(success.contains("Total decoded barcodes: 1"));
    assert!(success.contains("1. [EAN13] 4006381333931"));

    let failure = report::render_summary(&barcode, &outcome("barcode", Vec::new()));
    assert!(failure.contains("Possible reasons:"));
    assert!(failure.contains("  - Barcode type not supported"));
    assert!(failure.contains("❌ DECODING FAILED"));
}

#[test]
fn test_numbered_file_content() {
    let qr = profile(ProfileKind::Qr);
    let result = outcome(
        "qr",
        vec![
            square(Symbology::QrCode, "first"),
            square(Symbology::QrCode, "second"),
        ],
    );
    assert_eq!(
        report::file_content(&qr, &result),
        "QR Code #1\nType: QRCODE\nData: first\n\nQR Code #2\nType: QRCODE\nData: second\n\n"
    );
}

#[test]
fn test_datamatrix_file_content() {
    let datamatrix = profile(ProfileKind::DataMatrix);
    let result = outcome("datamatrix", vec![square(Symbology::DataMatrix, "LOT 42")]);
    assert_eq!(
        report::file_content(&datamatrix, &result),
        "Data Matrix #1:\nLOT 42\n\n"
    );
}

#[test]
fn test_maxicode_summary_file_content() {
    let maxicode = profile(ProfileKind::MaxiCode);
    let result = outcome("maxicode", vec![square(Symbology::MaxiCode, "SHIP TO")]);
    let content = report::file_content(&maxicode, &result);

    assert!(content.starts_with("MaxiCode Decoding Result\n"));
    assert!(content.contains("Image: /scans/label.png\n"));
    assert!(content.contains("Method: Grayscale conversion\n"));
    assert!(content.contains("\nDecoded Data:\nSHIP TO\n"));
    assert!(content.contains("Position: x=10 y=20\n"));
    assert!(content.contains("Size: 60x60 pixels\n"));
}

#[test]
fn test_raw_data_file_joins_symbols() {
    let pdf417 = profile(ProfileKind::Pdf417);
    let result = outcome(
        "pdf417",
        vec![
            square(Symbology::Pdf417, "PART ONE"),
            square(Symbology::Pdf417, "PART TWO"),
        ],
    );
    assert_eq!(report::file_content(&pdf417, &result), "PART ONE\nPART TWO");
}

#[test]
fn test_json_report_flattens_outcome() {
    let result = outcome("scan", vec![square(Symbology::Code128, "ABC-123")]);
    let mut json = JsonReport::new(&result);
    json.output_file = Some(PathBuf::from("decoded_result.txt"));

    let value: serde_json::Value =
        serde_json::from_str(&json.to_json().expect("serializable")).expect("valid json");
    assert_eq!(value["decoded"], true);
    assert_eq!(value["profile"], "scan");
    assert_eq!(value["attempts"].as_array().map(Vec::len), Some(2));
    assert_eq!(value["attempts"][0]["status"], "not_found");
    assert_eq!(value["success"]["symbols"][0]["data"], "ABC-123");
    assert_eq!(value["output_file"], "decoded_result.txt");
    assert!(value["ocr_text"].is_null());
}

#[test]
fn test_attempt_finished_lines() {
    let mut record = AttemptRecord {
        index: 3,
        label: "ZXing".to_string(),
        reader: ReaderKind::External,
        status: AttemptStatus::Skipped("external decoder disabled".to_string()),
        elapsed_ms: 0,
    };
    assert_eq!(
        report::render_attempt_finished(&record).as_deref(),
        Some("    Skipped: external decoder disabled")
    );

    record.status = AttemptStatus::Decoded(1);
    assert!(report::render_attempt_finished(&record).is_none());
}

#[test]
fn test_exit_status_follows_outcome() {
    assert_eq!(
        report::exit_status(&outcome("qr", vec![square(Symbology::QrCode, "ok")])),
        0
    );
    assert_eq!(report::exit_status(&outcome("qr", Vec::new())), 1);
}

#[test]
fn test_save_outcome_writes_only_on_success() {
    let dir = tempfile::tempdir().expect("temp dir");
    let datamatrix = profile(ProfileKind::DataMatrix);

    let nothing = report::save_outcome(&datamatrix, &outcome("datamatrix", Vec::new()), Some(dir.path()))
        .expect("no error");
    assert!(nothing.is_none());

    let decoded = outcome("datamatrix", vec![square(Symbology::DataMatrix, "LOT 42")]);
    let path = report::save_outcome(&datamatrix, &decoded, Some(dir.path()))
        .expect("saved")
        .expect("path returned");
    assert_eq!(path, dir.path().join("decoded_datamatrix.txt"));
    assert_eq!(
        std::fs::read_to_string(&path).expect("readable"),
        "Data Matrix #1:\nLOT 42\n\n"
    );
}

#[test]
fn test_save_failure_becomes_warning() {
    let dir = tempfile::tempdir().expect("temp dir");
    let blocker = dir.path().join("not-a-directory");
    std::fs::write(&blocker, b"").expect("file created");

    let qr = profile(ProfileKind::Qr);
    let decoded = outcome("qr", vec![square(Symbology::QrCode, "payload")]);
    let err = report::save_outcome(&qr, &decoded, Some(&blocker)).unwrap_err();

    let extras = RunExtras {
        save_error: Some(err.to_string()),
        ..Default::default()
    };
    let text = report::render_final(&qr, &decoded, &extras, false).expect("rendered");
    assert!(text.contains("⚠️ Could not save to file: [OUTPUT]"));
    assert!(!text.contains("Decoded data saved to"));
    assert!(text.contains("✅ DECODING SUCCESSFUL!"));
    assert_eq!(report::exit_status(&decoded), 0);
}

#[test]
fn test_final_text_lists_saved_file_and_ocr_text() {
    let barcode = profile(ProfileKind::Barcode);
    let decoded = outcome("barcode", vec![square(Symbology::Ean13, "4006381333931")]);
    let extras = RunExtras {
        saved_to: Some(PathBuf::from("decoded_barcode.txt")),
        ocr_text: Some("BEST BEFORE 2027".to_string()),
        ..Default::default()
    };

    let text = report::render_final(&barcode, &decoded, &extras, false).expect("rendered");
    let saved = text.find("💾 Decoded data saved to: decoded_barcode.txt").expect("saved line");
    let ocr = text.find("Extracted Text:\nBEST BEFORE 2027").expect("ocr block");
    let summary = text.find("✅ DECODING SUCCESSFUL!").expect("summary");
    assert!(saved < ocr && ocr < summary);
}

#[test]
fn test_json_output_on_failure() {
    let qr = profile(ProfileKind::Qr);
    let failed = outcome("qr", Vec::new());

    let text = report::render_final(&qr, &failed, &RunExtras::default(), true).expect("rendered");
    assert!(!text.contains("DECODING FAILED"));

    let value: serde_json::Value = serde_json::from_str(&text).expect("valid json");
    assert_eq!(value["decoded"], false);
    assert!(value["success"].is_null());
    assert!(value["output_file"].is_null());
    assert!(value["save_error"].is_null());
    assert_eq!(value["attempts"].as_array().map(Vec::len), Some(1));
    assert_eq!(report::exit_status(&failed), 1);
}
