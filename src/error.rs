//! Structured error types for the document-generation pipeline.
//!
//! Two failure families that must never be conflated: business validation
//! on the inspection record (carries the full classified report) and
//! container/template failures on the archive bytes. Render-time partial
//! failures (a bad signature image, a missing optional field) are absorbed
//! by the renderer and never surface here.

use crate::validation::ValidationReport;

/// The unified error type returned by all public API functions.
#[derive(Debug, thiserror::Error)]
pub enum DocgenError {
    /// The inspection record failed business validation. Carries every
    /// blocking error found, not just the first.
    #[error("Inspection data is incomplete:\n{}", .0.summary())]
    Validation(ValidationReport),

    /// No template bytes were supplied by the host.
    #[error("Template not found. Make sure the template file exists at the configured path and is readable.")]
    TemplateNotFound,

    /// The template bytes are not a well-formed ZIP container.
    #[error("Corrupt template archive: {0}. Re-save the template from your word processor and try again.")]
    CorruptArchive(String),

    /// The container is a valid ZIP but has no main document part.
    #[error("Template has no word/document.xml part. The file is not a usable document template.")]
    MissingDocumentPart,

    /// Unrecoverable structural problem during rendering.
    #[error("Render error: {0}")]
    Render(String),

    /// JSON input failed to parse as an inspection record.
    #[error("Failed to parse inspection JSON: {source}\n  Hint: {hint}")]
    Parse {
        source: serde_json::Error,
        hint: String,
    },
}

impl From<serde_json::Error> for DocgenError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the inspection-record schema. Check field names and types."
                    .to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input; the JSON may be truncated.".to_string()
            }
            serde_json::error::Category::Io => {
                "I/O failure while reading the input stream.".to_string()
            }
        };
        DocgenError::Parse { source: e, hint }
    }
}
