//! # Template Validator
//!
//! Inspects a loaded template archive for the structural markers the
//! renderer needs. Only two findings are blocking: a missing document part
//! and a template with no extractable scalar markers at all. Missing loop
//! or image markers are warnings — a template may validly omit photo or
//! signature support for a record that doesn't need them; the assembler
//! decides blocking-ness from what the record actually contains.

use std::collections::BTreeSet;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::archive::Archive;
use crate::docx::{
    scan_markers, Marker, MarkerKind, DOCUMENT_PART, KNOWN_IMAGE_MARKERS, KNOWN_LOOPS,
};

/// Findings from inspecting one template.
#[derive(Debug, Clone, Default)]
pub struct TemplateReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub notes: Vec<String>,
    /// The archive has no main document part; no further checks were run.
    pub missing_document_part: bool,
    loops_present: BTreeSet<String>,
    images_present: BTreeSet<String>,
    scalar_count: usize,
}

impl TemplateReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether the template carries a matched `{#name}` / `{/name}` pair.
    pub fn has_loop(&self, name: &str) -> bool {
        self.loops_present.contains(name)
    }

    /// Whether the template carries a `{%name}` marker.
    pub fn has_image_marker(&self, name: &str) -> bool {
        self.images_present.contains(name)
    }

    pub fn scalar_count(&self) -> usize {
        self.scalar_count
    }
}

/// Inspect a template archive.
pub fn inspect(archive: &Archive) -> TemplateReport {
    let mut report = TemplateReport::default();

    let Some(text) = archive.get_text(DOCUMENT_PART) else {
        report.missing_document_part = true;
        report.errors.push(format!(
            "Template has no {DOCUMENT_PART} part; it is not a usable document template"
        ));
        return report;
    };

    let markers = scan_markers(&text);

    report.scalar_count = markers
        .iter()
        .filter(|m| m.kind == MarkerKind::Scalar)
        .count();
    if report.scalar_count == 0 {
        report.errors.push(
            "Template contains no scalar placeholders; nothing would be filled in. Add markers such as {title} to the document text"
                .to_string(),
        );
    } else {
        report
            .notes
            .push(format!("{} scalar placeholder occurrence(s) found", report.scalar_count));
    }

    check_loops(&markers, &mut report);
    check_image_markers(&markers, &mut report);
    check_well_formed(&text, &mut report);

    report
}

fn check_loops(markers: &[Marker], report: &mut TemplateReport) {
    let loop_names: BTreeSet<&str> = markers
        .iter()
        .filter(|m| matches!(m.kind, MarkerKind::LoopOpen | MarkerKind::LoopClose))
        .map(|m| m.name.as_str())
        .collect();

    for name in loop_names {
        let opened = markers
            .iter()
            .any(|m| m.kind == MarkerKind::LoopOpen && m.name == name);
        let closed = markers
            .iter()
            .any(|m| m.kind == MarkerKind::LoopClose && m.name == name);
        match (opened, closed) {
            (true, true) => {
                report.loops_present.insert(name.to_string());
                if !KNOWN_LOOPS.contains(&name) {
                    report.warnings.push(format!(
                        "Loop '{{#{name}}}' is not a known loop; it will iterate zero times"
                    ));
                }
            }
            (true, false) => report.warnings.push(format!(
                "Loop '{{#{name}}}' is opened but never closed; it will not repeat"
            )),
            (false, true) => report.warnings.push(format!(
                "Loop close '{{/{name}}}' has no matching '{{#{name}}}'"
            )),
            (false, false) => unreachable!(),
        }
    }

    for &known in KNOWN_LOOPS {
        if !report.loops_present.contains(known) {
            report
                .notes
                .push(format!("Template does not use the '{{#{known}}}' loop"));
        }
    }
}

fn check_image_markers(markers: &[Marker], report: &mut TemplateReport) {
    // Byte spans of matched loop pairs: first open to the first close after it.
    let mut spans: Vec<(usize, usize)> = Vec::new();
    for open in markers.iter().filter(|m| m.kind == MarkerKind::LoopOpen) {
        if let Some(close) = markers
            .iter()
            .find(|m| m.kind == MarkerKind::LoopClose && m.name == open.name && m.start > open.end)
        {
            spans.push((open.end, close.start));
        }
    }

    for image in markers.iter().filter(|m| m.kind == MarkerKind::Image) {
        report.images_present.insert(image.name.clone());
        let known = KNOWN_IMAGE_MARKERS.iter().any(|(n, _)| *n == image.name);
        if !known {
            report.warnings.push(format!(
                "Image marker '{{%{}}}' is not a known marker; it will render empty",
                image.name
            ));
        }
        let inside_loop = spans.iter().any(|&(s, e)| image.start >= s && image.end <= e);
        if !inside_loop {
            report.warnings.push(format!(
                "Image marker '{{%{}}}' is outside any loop and may not render correctly",
                image.name
            ));
        }
    }
}

fn check_well_formed(text: &str, report: &mut TemplateReport) {
    let mut reader = Reader::from_str(text);
    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                report
                    .warnings
                    .push(format!("Document part XML is not well-formed: {e}"));
                break;
            }
        }
    }
}
