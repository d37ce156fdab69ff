//! # Laudogen
//!
//! A document generation engine for field inspection reports.
//!
//! Most report generators render HTML and shell out to a converter. That
//! makes the output hostage to a browser engine and leaves the layout
//! unreviewable by the people who sign the report. Laudogen does the
//! opposite: **the user's own Word template is the layout.** The engine
//! fills a real .docx file in place, so whatever formatting the template
//! author set up survives untouched, and falls back to a built-in layout
//! only when the template cannot carry the record's content. A
//! template-free PDF rendition covers hosts with no template at all.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/API)
//!       ↓
//!   [model]      — Inspection record: participants, photos, NR-15 annexes
//!       ↓
//!   [validation] — Blocking errors, warnings, notes
//!       ↓
//!   [project]    — Record -> binding context (scalars, loops, images)
//!       ↓
//!   [docx]       — Fill template markers inside the ZIP container
//!   [pdf]        — Or serialize a sequential-text PDF
//! ```

pub mod archive;
pub mod assemble;
pub mod binding;
pub mod docx;
pub mod error;
pub mod image;
pub mod model;
pub mod nr15;
pub mod pdf;
pub mod project;
pub mod validation;

pub use assemble::{generate_docx, generate_pdf, GeneratedDocument};
pub use error::DocgenError;
pub use model::Inspection;
pub use validation::{validate_inspection, ValidationReport};

/// Generate the DOCX report from an inspection record described as JSON.
///
/// This is the primary entry point for hosts that hold the record as
/// serialized JSON. `template` carries the uploaded template bytes, or
/// `None` when the host has no template.
pub fn generate_docx_json(
    json: &str,
    template: Option<&[u8]>,
) -> Result<GeneratedDocument, DocgenError> {
    let inspection: Inspection = serde_json::from_str(json)?;
    generate_docx(&inspection, template)
}

/// Generate the template-free PDF rendition from a record described as JSON.
pub fn generate_pdf_json(json: &str) -> Result<GeneratedDocument, DocgenError> {
    let inspection: Inspection = serde_json::from_str(json)?;
    generate_pdf(&inspection)
}
