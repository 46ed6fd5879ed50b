use anyhow::{Context, Result};
use barcode_decoder::config::AppConfig;
use barcode_decoder::errors::error_logging;
use barcode_decoder::observability;
use barcode_decoder::ocr::TextExtractor;
use barcode_decoder::pipeline::AttemptEvent;
use barcode_decoder::profiles::{Profile, ProfileKind};
use barcode_decoder::readers::{ExternalDecoder, ReaderSet};
use barcode_decoder::report;
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

/// Decode barcodes from image files
#[derive(Parser, Debug)]
#[command(name = "barcode-decoder")]
#[command(version)]
#[command(about = "Decode QR, Aztec, Data Matrix, MaxiCode, PDF417 and 1D barcodes from images", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory for the result file (overrides BARCODE_OUTPUT_DIR)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Print the outcome as JSON instead of the human report
    #[arg(long, global = true)]
    json: bool,

    /// Do not write the result file
    #[arg(long, global = true)]
    no_save: bool,

    /// Write Prometheus metrics to this file when the run ends
    #[arg(long, global = true)]
    metrics_file: Option<PathBuf>,

    /// Skip the ZXing command-line runner
    #[arg(long, global = true)]
    no_external: bool,

    /// More log output (repeatable)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Less log output (repeatable)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    quiet: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode QR codes
    Qr { image: PathBuf },
    /// Decode Aztec codes
    Aztec { image: PathBuf },
    /// Decode Data Matrix barcodes
    Datamatrix { image: PathBuf },
    /// Decode MaxiCode symbols; the result is saved next to the image
    Maxicode { image: PathBuf },
    /// Decode PDF417 barcodes with the full fallback chain
    Pdf417 { image: PathBuf },
    /// Decode 1D barcodes
    Barcode {
        image: PathBuf,
        /// Also extract printed text with Tesseract
        #[arg(long)]
        ocr: bool,
    },
    /// Decode any supported symbology
    Scan { image: PathBuf },
}

impl Command {
    fn kind(&self) -> ProfileKind {
        match self {
            Command::Qr { .. } => ProfileKind::Qr,
            Command::Aztec { .. } => ProfileKind::Aztec,
            Command::Datamatrix { .. } => ProfileKind::DataMatrix,
            Command::Maxicode { .. } => ProfileKind::MaxiCode,
            Command::Pdf417 { .. } => ProfileKind::Pdf417,
            Command::Barcode { .. } => ProfileKind::Barcode,
            Command::Scan { .. } => ProfileKind::Scan,
        }
    }

    fn image(&self) -> &Path {
        match self {
            Command::Qr { image }
            | Command::Aztec { image }
            | Command::Datamatrix { image }
            | Command::Maxicode { image }
            | Command::Pdf417 { image }
            | Command::Barcode { image, .. }
            | Command::Scan { image } => image,
        }
    }

    fn ocr(&self) -> bool {
        matches!(self, Command::Barcode { ocr: true, .. })
    }
}

/// Load configuration from the environment and apply command-line overrides
fn load_config(cli: &Cli) -> Result<AppConfig> {
    // Tracing is not installed yet, so failures are only reported through the error
    let mut config = AppConfig::from_env()
        .map_err(|e| anyhow::anyhow!("Configuration loading failed: {}", e))?;

    if let Some(dir) = &cli.output {
        config.decoder.output_dir = Some(dir.clone());
    }
    if let Some(path) = &cli.metrics_file {
        config.observability.metrics_enabled = true;
        config.observability.metrics_textfile = Some(path.clone());
    }
    if cli.no_external {
        config.external.enabled = false;
    }

    config.validate().map_err(|e| {
        anyhow::anyhow!("Configuration validation failed: {}. Please check your configuration values.", e)
    })?;
    Ok(config)
}

/// Run one decoding command. Returns the process exit status.
async fn run(cli: &Cli, config: &AppConfig) -> Result<u8> {
    let kind = cli.command.kind();
    let image = cli.command.image();
    let profile = Profile::build(kind, &config.decoder);
    let human = !cli.json;

    let external = if profile.uses_external() {
        ExternalDecoder::from_config(&config.external)
    } else {
        None
    };
    let readers = ReaderSet::new(external);

    if human {
        print!("{}", report::render_banner(&profile, image));
    }

    let outcome = profile
        .chain
        .run_with_progress(image, &readers, &config.decoder, |event| {
            if !human {
                return;
            }
            match event {
                AttemptEvent::Started { index, strategy } => {
                    println!("{}", report::render_attempt_started(index, &strategy.label));
                }
                AttemptEvent::Finished(record) => {
                    if let Some(line) = report::render_attempt_finished(record) {
                        println!("{}", line);
                    }
                }
            }
        })
        .await;

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            error_logging::log_decode_error(
                &e,
                kind.name(),
                "load",
                Some(&image.display().to_string()),
                None,
            );
            return Err(e).with_context(|| format!("Cannot decode {}", image.display()));
        }
    };

    let mut extras = report::RunExtras::default();
    if !cli.no_save {
        match report::save_outcome(&profile, &outcome, config.decoder.output_dir.as_deref()) {
            Ok(path) => extras.saved_to = path,
            Err(e) => {
                error_logging::log_filesystem_error(
                    &e,
                    "save_result",
                    Some(&image.display().to_string()),
                    None,
                );
                extras.save_error = Some(e.to_string());
            }
        }
    }

    if cli.command.ocr() {
        let extractor = TextExtractor::new(config.ocr.clone());
        match extractor.extract_text(image).await {
            Ok(text) => extras.ocr_text = Some(text),
            Err(e) => {
                warn!(error = %e, "Text extraction failed");
                extras.ocr_error = Some(e.to_string());
            }
        }
    }

    print!("{}", report::render_final(&profile, &outcome, &extras, cli.json)?);

    info!(
        profile = %kind,
        success = outcome.is_success(),
        attempts = outcome.attempts.len(),
        total_ms = outcome.total_ms,
        "Decode run finished"
    );
    Ok(report::exit_status(&outcome))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let level = config
        .observability
        .level_with_verbosity(cli.verbose, cli.quiet);
    observability::init_tracing_with_config(&config.observability, level)?;
    info!("{}", config.summary());

    let metrics = observability::init_metrics_with_config(&config.observability)?;

    let result = run(&cli, &config).await;

    if let (Some(handle), Some(path)) = (
        metrics.as_ref(),
        config.observability.metrics_textfile.as_ref(),
    ) {
        if let Err(e) = observability::write_metrics_textfile(handle, path) {
            error_logging::log_filesystem_error(
                &e,
                "write_metrics_textfile",
                Some(&path.display().to_string()),
                None,
            );
        }
    }

    Ok(ExitCode::from(result?))
}
