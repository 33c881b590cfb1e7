//! Receipt image OCR via the Tesseract command-line tool.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("image file not found: {0}")]
    FileNotFound(String),

    #[error("OCR engine could not be started: {0}")]
    Unavailable(String),

    #[error("OCR processing failed: {0}")]
    Failed(String),
}

/// Image binarization applied before recognition.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PreprocessMethod {
    #[default]
    Thresh,
    Blur,
    Adaptive,
    None,
}

impl PreprocessMethod {
    /// Tesseract `thresholding_method`; `None` keeps the engine default.
    fn thresholding_method(self) -> Option<u8> {
        match self {
            PreprocessMethod::Thresh => Some(0),
            PreprocessMethod::Blur => Some(1),
            PreprocessMethod::Adaptive => Some(2),
            PreprocessMethod::None => None,
        }
    }
}

impl FromStr for PreprocessMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "thresh" => Ok(PreprocessMethod::Thresh),
            "blur" => Ok(PreprocessMethod::Blur),
            "adaptive" => Ok(PreprocessMethod::Adaptive),
            "none" => Ok(PreprocessMethod::None),
            other => Err(format!(
                "unknown OCR preprocessing method '{other}' (expected thresh, blur, adaptive or none)"
            )),
        }
    }
}

#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognized text, trimmed.
    async fn extract_text(&self, path: &Path) -> Result<String, OcrError>;

    async fn is_available(&self) -> bool;
}

#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: PathBuf,
    preprocess: PreprocessMethod,
}

impl TesseractOcr {
    pub fn new(preprocess: PreprocessMethod) -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            preprocess,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    fn args(&self, image: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            image.as_os_str().to_owned(),
            "stdout".into(),
            "--oem".into(),
            "3".into(),
            // Single uniform block of text.
            "--psm".into(),
            "6".into(),
        ];
        if let Some(method) = self.preprocess.thresholding_method() {
            args.push("-c".into());
            args.push(format!("thresholding_method={method}").into());
        }
        args
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn extract_text(&self, path: &Path) -> Result<String, OcrError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(OcrError::FileNotFound(path.display().to_string()));
        }

        let output = Command::new(&self.binary)
            .args(self.args(path))
            .output()
            .await
            .map_err(|e| OcrError::Unavailable(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Failed(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn is_available(&self) -> bool {
        match Command::new(&self.binary).arg("--version").output().await {
            Ok(output) => output.status.success(),
            Err(e) => {
                tracing::debug!(error = %e, binary = %self.binary.display(), "tesseract not available");
                false
            }
        }
    }
}
