//! Error types for fill requests and PDF backends

use serde::Serialize;
use thiserror::Error;

/// Fatal outcomes of a fill request.
///
/// Every variant carries a stable code that is surfaced verbatim in the
/// error envelope returned to callers.
#[derive(Error, Debug)]
pub enum FillError {
    #[error("PDF 'pdf' or 'file' key required.")]
    MissingInput,

    #[error("PDF backend is not available in this build.")]
    MissingDependency,

    #[error("PDF decoding failed: {0}")]
    DecodeFailed(String),

    #[error("PDF processing failed: {0}")]
    ProcessingFailed(String),

    #[error("Base64 encoding failed: {0}")]
    EncodeFailed(String),

    #[error("Failed to save file: {0}")]
    SaveFailed(String),
}

impl FillError {
    /// Stable error code (`ATKPDF-01` .. `ATKPDF-06`)
    pub fn code(&self) -> &'static str {
        match self {
            FillError::MissingInput => "ATKPDF-01",
            FillError::MissingDependency => "ATKPDF-02",
            FillError::DecodeFailed(_) => "ATKPDF-03",
            FillError::ProcessingFailed(_) => "ATKPDF-04",
            FillError::EncodeFailed(_) => "ATKPDF-05",
            FillError::SaveFailed(_) => "ATKPDF-06",
        }
    }

    /// Error envelope as sent over the wire
    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            report: "error",
            message: self.to_string(),
            code: self.code(),
        }
    }
}

impl From<BackendError> for FillError {
    fn from(err: BackendError) -> Self {
        FillError::ProcessingFailed(err.to_string())
    }
}

/// `{"report":"error","message":...,"code":"ATKPDF-0x"}`
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub report: &'static str,
    pub message: String,
    pub code: &'static str,
}

/// Errors raised by a PDF backend implementation
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid PDF structure: {0}")]
    InvalidStructure(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid page number: {0}")]
    InvalidPage(usize),
}

pub type Result<T> = std::result::Result<T, FillError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_codes_are_stable() {
        let errors = vec![
            (FillError::MissingInput, "ATKPDF-01"),
            (FillError::MissingDependency, "ATKPDF-02"),
            (FillError::DecodeFailed("x".into()), "ATKPDF-03"),
            (FillError::ProcessingFailed("x".into()), "ATKPDF-04"),
            (FillError::EncodeFailed("x".into()), "ATKPDF-05"),
            (FillError::SaveFailed("x".into()), "ATKPDF-06"),
        ];

        for (error, code) in errors {
            assert_eq!(error.code(), code);
            assert!(!error.to_string().is_empty());
        }
    }

    #[test]
    fn test_envelope_shape() {
        let envelope = FillError::DecodeFailed("bad padding".into()).envelope();
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["report"], "error");
        assert_eq!(json["code"], "ATKPDF-03");
        assert_eq!(json["message"], "PDF decoding failed: bad padding");
    }

    #[test]
    fn test_backend_error_becomes_processing_failure() {
        let io_error = IoError::new(ErrorKind::UnexpectedEof, "truncated");
        let fill_error: FillError = BackendError::from(io_error).into();

        match fill_error {
            FillError::ProcessingFailed(ref msg) => assert!(msg.contains("truncated")),
            _ => panic!("Expected processing failure"),
        }
        assert_eq!(fill_error.code(), "ATKPDF-04");
    }
}
