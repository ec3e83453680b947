//! Error types for report rendering.

use thiserror::Error;

/// Result type for report rendering operations.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors that escape a render call.
///
/// Upstream data errors, degenerate numbers and missing fonts or images are handled where they
/// occur and never show up here. What remains is a malformed payload or a failing backend.
#[derive(Error, Debug)]
pub enum ReportError {
    /// The payload could not be decoded into a [`crate::payload::ReportPayload`].
    #[error("Malformed report payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// An explicitly supplied font file could not be parsed.
    #[error("Font error: {0}")]
    Font(String),

    /// The PDF backend failed while assembling or serializing the document.
    #[error("PDF backend error: {0}")]
    Pdf(String),

    /// An explicitly supplied image could not be decoded.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
