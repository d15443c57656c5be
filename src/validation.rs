//! Upload validation
//!
//! Checks the declared size and filename extension of an upload before any
//! bytes are parsed.

use crate::error::ValidationError;
use crate::models::{FileKind, ValidatedUpload};
use std::path::Path;

/// Extensions accepted per file kind, in display order
const SUPPORTED_FORMATS: &[(FileKind, &[&str])] = &[
    (FileKind::Pdf, &["pdf"]),
    (FileKind::Excel, &["xlsx", "xls", "xlsm"]),
];

pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct FileValidator {
    max_size: u64,
}

impl FileValidator {
    pub fn new() -> Self {
        Self {
            max_size: MAX_FILE_SIZE,
        }
    }

    pub fn with_max_size(max_size: u64) -> Self {
        Self { max_size }
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Size is checked before the extension, so an oversize file is always
    /// reported as too large.
    pub fn validate(&self, name: &str, size: u64) -> Result<ValidatedUpload, ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::NoFile);
        }

        if size > self.max_size {
            return Err(ValidationError::TooLarge {
                size,
                max_mb: self.max_size / (1024 * 1024),
            });
        }

        let extension = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();

        let kind = classify_extension(&extension).ok_or_else(|| {
            ValidationError::UnsupportedFormat {
                extension: extension.clone(),
                supported: supported_extensions().join(", "),
            }
        })?;

        Ok(ValidatedUpload {
            kind,
            extension,
            size,
            name: name.to_string(),
        })
    }
}

impl Default for FileValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a lower-case extension (no dot) to its file kind
pub fn classify_extension(extension: &str) -> Option<FileKind> {
    SUPPORTED_FORMATS
        .iter()
        .find(|(_, extensions)| extensions.contains(&extension))
        .map(|(kind, _)| *kind)
}

pub fn supported_extensions() -> Vec<&'static str> {
    SUPPORTED_FORMATS
        .iter()
        .flat_map(|(_, extensions)| extensions.iter().copied())
        .collect()
}
