//! # Template Diagnostics
//!
//! Human-facing template tooling: a textual description of every marker a
//! template may use, and a deep integrity check that audits an uploaded
//! template file against the full marker catalog. The integrity check is
//! advisory and never mutates the template; its report is what the CLI
//! prints for `check-template`.

use std::collections::BTreeSet;

use crate::archive::Archive;
use crate::docx::{
    scan_markers, validator, MarkerKind, DOCUMENT_PART, EXPECTED_SCALARS, KNOWN_IMAGE_MARKERS,
    KNOWN_LOOPS,
};
use crate::error::DocgenError;

/// Outcome of a deep template audit.
#[derive(Debug, Clone)]
pub struct IntegrityReport {
    pub is_valid: bool,
    pub summary: String,
    pub details: Vec<String>,
}

/// Describe every marker the renderer understands, for template authors.
pub fn describe_required_template() -> String {
    let mut out = String::new();
    out.push_str("TEMPLATE MARKER REFERENCE\n");
    out.push_str("=========================\n\n");
    out.push_str(
        "The template is a .docx file. Place the markers below in the document\n\
         text; each {name} is replaced with the record's value when generating.\n\n",
    );

    out.push_str("Scalar placeholders (always provided):\n");
    for name in EXPECTED_SCALARS {
        out.push_str(&format!("  {{{name}}}\n"));
    }

    out.push_str("\nRepeating sections (content between the pair repeats per item):\n");
    out.push_str("  {#participants} {name} {role} {company} {email} {/participants}\n");
    out.push_str("  {#signatures}   {%signature} {name} {role} {company} {/signatures}\n");
    out.push_str("      only participants with a captured signature appear here\n");
    out.push_str("  {#photos}       {%image} {caption} {takenAt} {/photos}\n");
    out.push_str("  {#annexes}      {annexNumber} {annexTitle} {applicability}\n");
    out.push_str("                  {assessmentSite} {activitiesDescribed} {ppeUsed}\n");
    out.push_str("                  {measurements} {exposureTime} {conclusion}\n");
    out.push_str("                  {observations} {identifiedAgentCount} {/annexes}\n");
    out.push_str("  {#agents}       {agentId} {identified} {measuredValue} {aboveLimit}\n");
    out.push_str("                  {ppeDescription} {observations} {/agents}\n");
    out.push_str("      nest {#agents} inside {#annexes}\n");

    out.push_str("\nImage markers (replaced with the embedded picture):\n");
    for (marker, scope) in KNOWN_IMAGE_MARKERS {
        out.push_str(&format!("  {{%{marker}}}  inside {{#{scope}}}\n"));
    }

    out.push_str(
        "\nA record with photos needs the {#photos} loop and {%image} marker;\n\
         a record with signed participants needs {#signatures} and {%signature}.\n\
         When the template lacks them a built-in layout is used instead.\n",
    );
    out
}

/// Audit raw template bytes: container shape, marker pairing, and coverage
/// of the expected marker catalog.
pub fn check_template_integrity(bytes: &[u8]) -> IntegrityReport {
    let archive = match Archive::from_bytes(bytes) {
        Ok(archive) => archive,
        Err(DocgenError::CorruptArchive(detail)) => {
            return IntegrityReport {
                is_valid: false,
                summary: "File is not a readable .docx archive".to_string(),
                details: vec![detail],
            };
        }
        Err(other) => {
            return IntegrityReport {
                is_valid: false,
                summary: "File could not be opened".to_string(),
                details: vec![other.to_string()],
            };
        }
    };

    let report = validator::inspect(&archive);
    let mut details = Vec::new();
    details.extend(report.errors.iter().map(|e| format!("ERROR: {e}")));
    details.extend(report.warnings.iter().map(|w| format!("WARNING: {w}")));
    details.extend(report.notes.iter().map(|n| format!("note: {n}")));

    if let Some(text) = archive.get_text(DOCUMENT_PART) {
        audit_marker_catalog(&text, &mut details);
    }

    let summary = if !report.is_valid() {
        "Template is not usable".to_string()
    } else if report.warnings.is_empty() {
        "Template looks good".to_string()
    } else {
        format!(
            "Template is usable with {} warning(s)",
            report.warnings.len()
        )
    };

    IntegrityReport {
        is_valid: report.is_valid(),
        summary,
        details,
    }
}

/// Compare the markers actually present against the expected catalog.
fn audit_marker_catalog(text: &str, details: &mut Vec<String>) {
    let markers = scan_markers(text);
    let scalars: BTreeSet<&str> = markers
        .iter()
        .filter(|m| m.kind == MarkerKind::Scalar)
        .map(|m| m.name.as_str())
        .collect();

    let missing: Vec<&str> = EXPECTED_SCALARS
        .iter()
        .copied()
        .filter(|name| !scalars.contains(name))
        .collect();
    if missing.is_empty() {
        details.push("note: every standard placeholder is present".to_string());
    } else {
        details.push(format!(
            "note: {} standard placeholder(s) unused: {}",
            missing.len(),
            missing.join(", ")
        ));
    }

    // Loop-scoped names are legitimate scalars too, not "unknown".
    let loop_scoped: BTreeSet<&str> = [
        "name",
        "role",
        "company",
        "email",
        "caption",
        "takenAt",
        "annexNumber",
        "annexTitle",
        "applicability",
        "assessmentSite",
        "activitiesDescribed",
        "ppeUsed",
        "measurements",
        "exposureTime",
        "conclusion",
        "observations",
        "identifiedAgentCount",
        "agentId",
        "identified",
        "measuredValue",
        "aboveLimit",
        "ppeDescription",
    ]
    .into_iter()
    .collect();

    let extra: Vec<&str> = scalars
        .iter()
        .copied()
        .filter(|name| {
            !EXPECTED_SCALARS.contains(name)
                && !loop_scoped.contains(name)
                && !KNOWN_LOOPS.contains(name)
        })
        .collect();
    if !extra.is_empty() {
        details.push(format!(
            "WARNING: {} placeholder(s) not provided by the generator (will render empty): {}",
            extra.len(),
            extra.join(", ")
        ));
    }
}
