//! Tesseract backend driving the `tesseract` executable.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Command;

use image::{DynamicImage, ImageFormat};
use tracing::{debug, trace};

use super::{OcrBackend, OcrOptions, RecognizedWord};
use crate::error::OcrError;

/// Messages Tesseract prints when its language data is missing.
const MISSING_LANGUAGE_MARKERS: [&str; 2] = ["Failed loading language", "Error opening data file"];

/// OCR backend that shells out to the Tesseract CLI.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    program: PathBuf,
}

impl TesseractCli {
    /// Use `tesseract` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("tesseract"),
        }
    }

    /// Use a specific executable.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    fn spawn_error(&self, e: std::io::Error) -> OcrError {
        match e.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => OcrError::EngineUnavailable(
                format!("cannot run {}: {}", self.program.display(), e),
            ),
            _ => OcrError::Recognition(format!("failed to start tesseract: {}", e)),
        }
    }

    fn run(&self, image: &DynamicImage, options: &OcrOptions, tsv: bool) -> Result<String, OcrError> {
        let input = tempfile::Builder::new()
            .prefix("guia-page-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| OcrError::InvalidImage(format!("cannot create temp file: {}", e)))?;

        image
            .save_with_format(input.path(), ImageFormat::Png)
            .map_err(|e| OcrError::InvalidImage(e.to_string()))?;

        let mut cmd = Command::new(&self.program);
        cmd.arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&options.language)
            .arg("--psm")
            .arg(options.psm.code().to_string());
        if let Some(dpi) = options.dpi {
            cmd.arg("--dpi").arg(dpi.to_string());
        }
        if tsv {
            cmd.arg("tsv");
        }

        trace!("Running {:?}", cmd);
        let output = cmd.output().map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr.lines().last().unwrap_or("").trim().to_string();
            if MISSING_LANGUAGE_MARKERS.iter().any(|m| stderr.contains(m)) {
                return Err(OcrError::EngineUnavailable(format!(
                    "language '{}' not installed: {}",
                    options.language, message
                )));
            }
            return Err(OcrError::Recognition(format!(
                "tesseract exited with {}: {}",
                output.status, message
            )));
        }

        String::from_utf8(output.stdout).map_err(|e| OcrError::MalformedOutput(e.to_string()))
    }
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrBackend for TesseractCli {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn check(&self) -> Result<String, OcrError> {
        let output = Command::new(&self.program)
            .arg("--version")
            .output()
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(OcrError::EngineUnavailable(format!(
                "{} --version exited with {}",
                self.program.display(),
                output.status
            )));
        }

        // Older releases print the banner on stderr.
        let banner = if output.stdout.is_empty() {
            String::from_utf8_lossy(&output.stderr).into_owned()
        } else {
            String::from_utf8_lossy(&output.stdout).into_owned()
        };
        let version = banner.lines().next().unwrap_or("tesseract").trim().to_string();
        debug!("OCR engine available: {}", version);
        Ok(version)
    }

    fn recognize_text(&self, image: &DynamicImage, options: &OcrOptions) -> Result<String, OcrError> {
        self.run(image, options, false)
    }

    fn recognize_words(
        &self,
        image: &DynamicImage,
        options: &OcrOptions,
    ) -> Result<Vec<RecognizedWord>, OcrError> {
        let tsv = self.run(image, options, true)?;
        parse_tsv(&tsv)
    }
}

/// Parse Tesseract TSV output into word records.
///
/// Only level-5 (word) rows are kept; filtering by confidence is left to the
/// caller.
pub fn parse_tsv(tsv: &str) -> Result<Vec<RecognizedWord>, OcrError> {
    let mut words = Vec::new();

    for (line_no, line) in tsv.lines().enumerate() {
        if line.is_empty() || line.starts_with("level") {
            continue;
        }

        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() < 11 {
            return Err(OcrError::MalformedOutput(format!(
                "line {}: expected 12 columns, got {}",
                line_no + 1,
                cols.len()
            )));
        }

        if cols[0] != "5" {
            continue;
        }

        let number = |idx: usize| -> Result<u32, OcrError> {
            cols[idx].trim().parse::<i64>().map(|v| v.max(0) as u32).map_err(|_| {
                OcrError::MalformedOutput(format!("line {}: bad number '{}'", line_no + 1, cols[idx]))
            })
        };

        let confidence: f32 = cols[10].trim().parse().map_err(|_| {
            OcrError::MalformedOutput(format!("line {}: bad confidence '{}'", line_no + 1, cols[10]))
        })?;

        words.push(RecognizedWord {
            text: cols.get(11).copied().unwrap_or("").to_string(),
            left: number(6)?,
            top: number(7)?,
            width: number(8)?,
            height: number(9)?,
            confidence,
        });
    }

    Ok(words)
}
