//! Upload acceptance rules for receipt images.

use std::path::Path;

use thiserror::Error;

use pantry_core::ReceiptId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("No filename provided")]
    MissingFilename,

    #[error("Invalid file type. Allowed: {allowed}")]
    InvalidType { allowed: String },

    #[error("File too large. Maximum size: {max_mb}MB")]
    TooLarge { max_mb: u64 },
}

/// Which files may be uploaded as receipts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    allowed_extensions: Vec<String>,
    max_file_size_mb: u64,
}

impl UploadPolicy {
    pub fn new<I, S>(allowed_extensions: I, max_file_size_mb: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed_extensions = allowed_extensions
            .into_iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self {
            allowed_extensions,
            max_file_size_mb,
        }
    }

    pub fn max_file_size_mb(&self) -> u64 {
        self.max_file_size_mb
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    /// Validate a file and return its normalized (lowercase) extension.
    pub fn check(&self, filename: &str, size_bytes: u64) -> Result<String, UploadError> {
        if filename.trim().is_empty() {
            return Err(UploadError::MissingFilename);
        }

        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if !self.allowed_extensions.contains(&ext) {
            return Err(UploadError::InvalidType {
                allowed: self.allowed_extensions.join(", "),
            });
        }

        if size_bytes > self.max_file_size_bytes() {
            return Err(UploadError::TooLarge {
                max_mb: self.max_file_size_mb,
            });
        }

        Ok(ext)
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(["jpg", "jpeg", "png", "pdf"], 10)
    }
}

/// File name under which an accepted upload is stored.
///
/// The receipt id keeps two uploads in the same millisecond apart.
pub fn stored_file_name(id: ReceiptId, ext: &str, unix_millis: i64) -> String {
    format!("receipt_{unix_millis}_{id}.{ext}")
}
