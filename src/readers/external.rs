//! # External ZXing Decoder
//!
//! Runs ZXing's `CommandLineRunner` as a subprocess, first on the host JVM and
//! then inside Docker. Each invocation runs under a timeout and the child is
//! killed if the timeout fires.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tracing::Instrument;

use crate::decode_errors::DecodeError;
use crate::decoder_config::{DockerMode, ExternalDecoderConfig};
use crate::errors::error_logging;
use crate::observability;
use crate::symbol::{DecodedSymbol, Symbology};

/// Marker ZXing prints when an image holds no barcode
const NO_BARCODE_MARKER: &str = "No barcode found";

/// Where ZXing runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    HostJvm,
    Docker,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::HostJvm => "java",
            Backend::Docker => "docker",
        }
    }
}

/// A fully resolved command line for one backend
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub backend: Backend,
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl Invocation {
    /// Command line as a single string, for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a finished child process
#[derive(Debug, Clone)]
struct ProcessOutput {
    exit_code: Option<i32>,
    stdout: String,
    stderr: String,
}

/// ZXing `CommandLineRunner` wrapper
#[derive(Debug, Clone)]
pub struct ExternalDecoder {
    config: ExternalDecoderConfig,
}

impl ExternalDecoder {
    pub fn new(config: ExternalDecoderConfig) -> Self {
        Self { config }
    }

    /// Returns `None` when the external decoder is switched off.
    pub fn from_config(config: &ExternalDecoderConfig) -> Option<Self> {
        config.enabled.then(|| Self::new(config.clone()))
    }

    /// True when all three jars exist in the jar directory.
    pub fn host_jars_present(&self) -> bool {
        self.config.jar_paths().iter().all(|path| path.is_file())
    }

    /// The invocations to try for an image, in order.
    pub fn plan(&self, image: &Path) -> Result<Vec<Invocation>, DecodeError> {
        let mut invocations = Vec::new();

        if self.host_jars_present() {
            invocations.push(self.host_invocation(image)?);
        } else {
            tracing::debug!(
                jar_dir = %self.config.jar_dir.display(),
                "ZXing jars not found, skipping host JVM"
            );
        }

        if self.config.docker_enabled {
            invocations.push(self.docker_invocation(image)?);
        }

        Ok(invocations)
    }

    fn host_invocation(&self, image: &Path) -> Result<Invocation, DecodeError> {
        let classpath = std::env::join_paths(self.config.jar_paths()).map_err(|e| {
            DecodeError::ExternalUnavailable(format!("invalid jar classpath: {}", e))
        })?;

        Ok(Invocation {
            backend: Backend::HostJvm,
            program: self.config.java_bin.clone(),
            args: vec![
                "-cp".to_string(),
                classpath.to_string_lossy().into_owned(),
                self.config.main_class.clone(),
                image.to_string_lossy().into_owned(),
            ],
            timeout: Duration::from_secs(self.config.timeout_secs),
        })
    }

    fn docker_invocation(&self, image: &Path) -> Result<Invocation, DecodeError> {
        let absolute = absolute_path(image);
        let file_name = absolute
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                DecodeError::ExternalFailed(format!("{} has no file name", image.display()))
            })?;
        let data_dir = absolute
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut args = vec![
            "run".to_string(),
            "--rm".to_string(),
            "-v".to_string(),
            format!("{}:/data", data_dir.display()),
        ];

        match self.config.docker_mode {
            DockerMode::Prebuilt => {
                args.push(self.config.docker_image.clone());
            }
            DockerMode::Jvm => {
                let jar_dir = absolute_path(&self.config.jar_dir);
                // Paths inside the Linux container always use ':' separators
                let classpath = self
                    .config
                    .jar_names()
                    .iter()
                    .map(|name| format!("/app/{}", name))
                    .collect::<Vec<_>>()
                    .join(":");
                args.extend([
                    "-v".to_string(),
                    format!("{}:/app", jar_dir.display()),
                    self.config.docker_jvm_image.clone(),
                    "java".to_string(),
                    "-cp".to_string(),
                    classpath,
                    self.config.main_class.clone(),
                ]);
            }
        }
        args.push(format!("/data/{}", file_name));

        Ok(Invocation {
            backend: Backend::Docker,
            program: self.config.docker_bin.clone(),
            args,
            timeout: Duration::from_secs(self.config.docker_timeout_secs),
        })
    }

    /// Decode an image file with the first backend that runs successfully.
    ///
    /// A backend that reports "No barcode found" ends the search with an
    /// empty result. A backend that cannot run (missing binary, timeout,
    /// non-zero exit) hands over to the next one, and the last error is
    /// returned when none succeeds.
    pub async fn decode_file(&self, image: &Path) -> Result<Vec<DecodedSymbol>, DecodeError> {
        let invocations = self.plan(image)?;
        if invocations.is_empty() {
            return Err(DecodeError::ExternalUnavailable(format!(
                "no ZXing backend available (jars missing from {} and docker disabled)",
                self.config.jar_dir.display()
            )));
        }

        let mut last_error = None;
        for invocation in &invocations {
            let span = observability::external_span(invocation.backend.as_str());
            let started = Instant::now();

            match run_invocation(invocation).instrument(span).await {
                Ok(output) if output.exit_code == Some(0) => {
                    if output.stdout.contains(NO_BARCODE_MARKER) {
                        observability::record_external_metrics(
                            invocation.backend.as_str(),
                            "not_found",
                            started.elapsed(),
                        );
                        tracing::debug!("ZXing found no barcode");
                        return Ok(Vec::new());
                    }
                    observability::record_external_metrics(
                        invocation.backend.as_str(),
                        "decoded",
                        started.elapsed(),
                    );
                    return Ok(parse_zxing_output(&output.stdout));
                }
                Ok(output) => {
                    let message = format!(
                        "{} exited with {:?}: {}",
                        invocation.program,
                        output.exit_code,
                        first_line(&output.stderr).unwrap_or("no error output")
                    );
                    error_logging::log_external_error(
                        &message,
                        invocation.backend.as_str(),
                        &invocation.program,
                        output.exit_code,
                    );
                    observability::record_external_metrics(
                        invocation.backend.as_str(),
                        "failed",
                        started.elapsed(),
                    );
                    last_error = Some(DecodeError::ExternalFailed(message));
                }
                Err(e) => {
                    tracing::warn!(
                        backend = invocation.backend.as_str(),
                        error = %e,
                        "External decoder backend could not run"
                    );
                    observability::record_external_metrics(
                        invocation.backend.as_str(),
                        "error",
                        started.elapsed(),
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            DecodeError::ExternalUnavailable("no ZXing backend succeeded".to_string())
        }))
    }
}

async fn run_invocation(invocation: &Invocation) -> Result<ProcessOutput, DecodeError> {
    tracing::debug!(command = %invocation.command_line(), "Running external decoder");

    let mut command = tokio::process::Command::new(&invocation.program);
    command
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(invocation.timeout, command.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DecodeError::ExternalUnavailable(format!(
                "{} not found",
                invocation.program
            )));
        }
        Ok(Err(e)) => {
            return Err(DecodeError::ExternalFailed(format!(
                "failed to run {}: {}",
                invocation.program, e
            )));
        }
        Err(_) => {
            return Err(DecodeError::Timeout(format!(
                "{} did not finish within {}s",
                invocation.program,
                invocation.timeout.as_secs()
            )));
        }
    };

    Ok(ProcessOutput {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

fn header_regex() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| {
        Regex::new(r"\(format: ([A-Z0-9_]+), type: ([A-Z_]+)\):")
            .expect("Invalid ZXing header regex pattern")
    })
}

fn point_regex() -> &'static Regex {
    static POINT: OnceLock<Regex> = OnceLock::new();
    POINT.get_or_init(|| {
        Regex::new(r"Point \d+: \((-?[\d.]+),\s*(-?[\d.]+)\)")
            .expect("Invalid ZXing point regex pattern")
    })
}

/// Parses `CommandLineRunner` stdout into symbols.
///
/// Each `(format: X, type: Y):` header starts a result whose payload is the
/// text between `Raw result:` and `Parsed result:`. Output with no header
/// becomes a single `ZXING` symbol carrying the trimmed text.
pub fn parse_zxing_output(stdout: &str) -> Vec<DecodedSymbol> {
    let headers: Vec<_> = header_regex().captures_iter(stdout).collect();

    if headers.is_empty() {
        let trimmed = stdout.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        return vec![DecodedSymbol::new(
            Symbology::Other("ZXING".to_string()),
            trimmed,
            Vec::new(),
        )];
    }

    let mut symbols = Vec::with_capacity(headers.len());
    for (index, captures) in headers.iter().enumerate() {
        let (Some(whole), Some(format)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let block_end = headers
            .get(index + 1)
            .and_then(|next| next.get(0))
            .map(|next| next.start())
            .unwrap_or(stdout.len());
        let block = &stdout[whole.end()..block_end];

        let polygon = point_regex()
            .captures_iter(block)
            .filter_map(|point| {
                let x = point.get(1)?.as_str().parse::<f32>().ok()?;
                let y = point.get(2)?.as_str().parse::<f32>().ok()?;
                Some((x, y))
            })
            .collect();

        symbols.push(DecodedSymbol::new(
            Symbology::from_zxing_name(format.as_str()),
            raw_result(block),
            polygon,
        ));
    }

    symbols
}

/// Text between `Raw result:` and `Parsed result:` in one result block
fn raw_result(block: &str) -> String {
    let Some(start) = block.find("Raw result:") else {
        return block.trim().to_string();
    };
    let after = &block[start + "Raw result:".len()..];
    let end = after.find("Parsed result:").unwrap_or(after.len());
    after[..end]
        .trim_start_matches(['\r', '\n'])
        .trim_end_matches(['\r', '\n'])
        .to_string()
}

fn first_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|line| !line.is_empty())
}

fn absolute_path(path: &Path) -> PathBuf {
    std::fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_result_keeps_inner_lines() {
        let block = " type: TEXT):\nRaw result:\nline one\nline two\nParsed result:\nline one\n";
        assert_eq!(raw_result(block), "line one\nline two");
    }

    #[test]
    fn test_first_line_skips_blank() {
        assert_eq!(first_line("\n  \nError: boom\nmore"), Some("Error: boom"));
        assert_eq!(first_line(""), None);
    }

    #[test]
    fn test_plan_without_jars_or_docker_is_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        let decoder = ExternalDecoder::new(ExternalDecoderConfig {
            jar_dir: dir.path().to_path_buf(),
            docker_enabled: false,
            ..Default::default()
        });
        let plan = decoder.plan(Path::new("image.png")).expect("plan");
        assert!(plan.is_empty());
    }

    #[test]
    fn test_disabled_config_builds_no_decoder() {
        let config = ExternalDecoderConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(ExternalDecoder::from_config(&config).is_none());
    }
}
