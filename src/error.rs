//! Error types for the variable extractor

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No candidate path for an import exists on disk. The import hook swallows
    /// this and lets the compiler report the missing import itself.
    #[error("No file found for import '{reference}' ({} candidates tried)", candidates.len())]
    NotFound {
        reference: String,
        candidates: Vec<PathBuf>,
    },

    #[error("Compilation failed: {message}")]
    CompilationFailed { message: String },

    #[error("Extraction failed: {message}")]
    ExtractionFailed { message: String },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },
}

pub type Result<T> = std::result::Result<T, ExtractError>;

impl ExtractError {
    pub fn not_found(reference: impl Into<String>, candidates: Vec<PathBuf>) -> Self {
        Self::NotFound {
            reference: reference.into(),
            candidates,
        }
    }

    pub fn compilation(message: impl Into<String>) -> Self {
        Self::CompilationFailed {
            message: message.into(),
        }
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            message: message.into(),
        }
    }

    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Whether the error is fatal for an extraction call.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::NotFound { .. })
    }
}
