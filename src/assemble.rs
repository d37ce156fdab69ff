//! # Document Assembler
//!
//! The orchestration layer behind the two public generation entry points.
//! Both paths share the same gate: business validation runs first, and a
//! record with blocking findings never touches a template or produces
//! bytes. The DOCX path then loads the supplied template, checks it can
//! actually carry the record's content, and falls back to the built-in
//! layout only when it cannot.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::archive::Archive;
use crate::docx::render::{CollectingSink, RenderEvent};
use crate::docx::{fallback, render, validator, DOCX_MIME};
use crate::error::DocgenError;
use crate::model::Inspection;
use crate::pdf::{self, PDF_MIME};
use crate::project;
use crate::validation::{validate_inspection, ValidationReport};

/// A generated document, ready for the host to hand to the user.
///
/// Generation that succeeds can still have findings worth showing: the
/// record's non-blocking validation report and any degradations the
/// renderer reported (a skipped image, a blank placeholder) ride along
/// with the bytes.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub suggested_filename: String,
    /// Warnings and notes from record validation (errors would have
    /// aborted generation).
    pub validation: ValidationReport,
    /// Events the renderer reported while filling the template. Empty
    /// for the PDF path.
    pub render_events: Vec<RenderEvent>,
}

/// Generate the DOCX report for a record.
///
/// `template` is the raw bytes of the uploaded template file, or `None`
/// when the host has no template available. Blocking validation findings
/// abort before the template bytes are even looked at.
pub fn generate_docx(
    inspection: &Inspection,
    template: Option<&[u8]>,
) -> Result<GeneratedDocument, DocgenError> {
    let report = validate_inspection(inspection);
    if !report.is_valid() {
        return Err(DocgenError::Validation(report));
    }

    let bytes = template.ok_or(DocgenError::TemplateNotFound)?;
    let mut archive = Archive::from_bytes(bytes)?;

    let template_report = validator::inspect(&archive);
    // A template with no document part is broken, not merely incapable:
    // the caller gets the error, never a silently substituted layout.
    if template_report.missing_document_part {
        return Err(DocgenError::MissingDocumentPart);
    }
    if !template_report.is_valid() || !template_can_carry(inspection, &template_report) {
        archive = fallback::build_minimal_template();
    }

    let context = project::project(inspection, &current_date_iso());
    let mut sink = CollectingSink::default();
    render::render(&mut archive, &context, &mut sink)?;

    Ok(GeneratedDocument {
        bytes: archive.to_bytes(),
        mime: DOCX_MIME,
        suggested_filename: suggested_filename(&inspection.title, "docx"),
        validation: report,
        render_events: sink.events,
    })
}

/// Generate the template-free PDF rendition for a record.
///
/// Shares the validation gate and the projection with the DOCX path.
pub fn generate_pdf(inspection: &Inspection) -> Result<GeneratedDocument, DocgenError> {
    let report = validate_inspection(inspection);
    if !report.is_valid() {
        return Err(DocgenError::Validation(report));
    }

    let context = project::project(inspection, &current_date_iso());
    Ok(GeneratedDocument {
        bytes: pdf::write_document(&context),
        mime: PDF_MIME,
        suggested_filename: suggested_filename(&inspection.title, "pdf"),
        validation: report,
        render_events: Vec::new(),
    })
}

/// Whether a structurally valid template can carry everything this record
/// actually contains. A template without photo or signature support is
/// fine for a record that has neither.
fn template_can_carry(inspection: &Inspection, report: &validator::TemplateReport) -> bool {
    if inspection.has_photos() && !(report.has_loop("photos") && report.has_image_marker("image")) {
        return false;
    }
    if inspection.has_signed_participant()
        && !(report.has_loop("signatures") && report.has_image_marker("signature"))
    {
        return false;
    }
    true
}

/// `Report_<sanitized title>.<ext>`, safe for any filesystem.
fn suggested_filename(title: &str, extension: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = if stem.is_empty() { "inspection".to_string() } else { stem };
    format!("Report_{stem}.{extension}")
}

/// Today's date as `YYYY-MM-DD`, derived from the system clock.
///
/// Days-to-civil conversion from Howard Hinnant's algorithm; keeps the
/// crate free of a date dependency for a single timestamp.
pub fn current_date_iso() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let days = (secs / 86_400) as i64;
    let (year, month, day) = civil_from_days(days);
    format!("{year:04}-{month:02}-{day:02}")
}

fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let year = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let year = if month <= 2 { year + 1 } else { year };
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::DOCUMENT_PART;
    use crate::model::{InspectionStatus, Participant, Photo};

    fn valid_inspection() -> Inspection {
        Inspection {
            title: "Tower A Inspection".into(),
            address: "Industrial Ave 100".into(),
            responsible: "Jane Doe".into(),
            survey_date: "2024-03-01".into(),
            status: InspectionStatus::Completed,
            participants: vec![Participant {
                name: "Jane Doe".into(),
                role: "Engineer".into(),
                company: "Acme".into(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn template_bytes() -> Vec<u8> {
        fallback::build_minimal_template().to_bytes()
    }

    #[test]
    fn generates_docx_from_valid_record() {
        let doc = generate_docx(&valid_inspection(), Some(&template_bytes())).unwrap();
        assert_eq!(doc.mime, DOCX_MIME);
        assert_eq!(doc.suggested_filename, "Report_Tower_A_Inspection.docx");
        let archive = Archive::from_bytes(&doc.bytes).unwrap();
        let text = archive.get_text(DOCUMENT_PART).unwrap();
        assert!(text.contains("Tower A Inspection"));
        assert!(text.contains("Jane Doe"));
    }

    #[test]
    fn blocking_errors_abort_before_template_access() {
        let mut inspection = valid_inspection();
        inspection.participants.clear();
        // Garbage template bytes: never reached, so no CorruptArchive.
        let err = generate_docx(&inspection, Some(b"not a zip")).unwrap_err();
        match err {
            DocgenError::Validation(report) => {
                assert_eq!(report.errors.len(), 1);
                assert!(report.errors[0].contains("participant"));
            }
            other => panic!("expected Validation, got {other}"),
        }
    }

    #[test]
    fn template_without_document_part_is_an_error_not_a_fallback() {
        // A readable ZIP that simply has no word/document.xml.
        let mut archive = Archive::new();
        archive.set_text("[Content_Types].xml", "<Types/>");
        let err = generate_docx(&valid_inspection(), Some(&archive.to_bytes())).unwrap_err();
        assert!(matches!(err, DocgenError::MissingDocumentPart), "got {err}");
    }

    #[test]
    fn warnings_and_render_events_ride_along_on_success() {
        // Unsigned participant: a validation warning, never blocking.
        let mut inspection = valid_inspection();
        inspection.photos.push(Photo {
            data_url: "!!not an image!!".into(),
            caption: "Gauge".into(),
            ..Default::default()
        });
        let doc = generate_docx(&inspection, Some(&template_bytes())).unwrap();
        assert!(doc
            .validation
            .warnings
            .iter()
            .any(|w| w.contains("signed")));
        assert!(doc
            .render_events
            .iter()
            .any(|e| matches!(e, RenderEvent::ImageSkipped { .. })));

        // The PDF path carries the same validation findings.
        let pdf = generate_pdf(&inspection).unwrap();
        assert_eq!(pdf.validation.warnings, doc.validation.warnings);
        assert!(pdf.render_events.is_empty());
    }

    #[test]
    fn missing_template_is_template_not_found() {
        let err = generate_docx(&valid_inspection(), None).unwrap_err();
        assert!(matches!(err, DocgenError::TemplateNotFound));
    }

    #[test]
    fn corrupt_template_is_corrupt_archive() {
        let err = generate_docx(&valid_inspection(), Some(b"PK\x03\x04 nonsense")).unwrap_err();
        assert!(matches!(err, DocgenError::CorruptArchive(_)));
    }

    #[test]
    fn record_with_photos_falls_back_when_template_cannot_show_them() {
        // A valid template with scalars but no photos loop.
        let mut archive = Archive::new();
        archive.set_text(
            DOCUMENT_PART,
            "<w:document><w:body><w:p><w:r><w:t>{title}</w:t></w:r></w:p></w:body></w:document>",
        );
        let mut inspection = valid_inspection();
        inspection.photos.push(Photo {
            data_url: crate::image::tiny_png_base64(),
            caption: "boiler".into(),
            ..Default::default()
        });

        let doc = generate_docx(&inspection, Some(&archive.to_bytes())).unwrap();
        let result = Archive::from_bytes(&doc.bytes).unwrap();
        // Fallback layout was used and the photo got embedded.
        assert!(result.contains("word/media/image1.png"));
        assert!(result.get_text(DOCUMENT_PART).unwrap().contains("Photographic record"));
    }

    #[test]
    fn photoless_record_keeps_a_template_without_photo_support() {
        let mut archive = Archive::new();
        archive.set_text(
            DOCUMENT_PART,
            "<w:document><w:body><w:p><w:r><w:t>Only: {title}</w:t></w:r></w:p></w:body></w:document>",
        );
        let doc = generate_docx(&valid_inspection(), Some(&archive.to_bytes())).unwrap();
        let result = Archive::from_bytes(&doc.bytes).unwrap();
        let text = result.get_text(DOCUMENT_PART).unwrap();
        assert!(text.contains("Only: Tower A Inspection"));
    }

    #[test]
    fn signed_participant_without_signature_support_triggers_fallback() {
        let mut archive = Archive::new();
        archive.set_text(
            DOCUMENT_PART,
            "<w:document><w:body><w:p><w:r><w:t>{title}</w:t></w:r></w:p></w:body></w:document>",
        );
        let mut inspection = valid_inspection();
        inspection.participants[0].signature = Some(crate::image::tiny_png_base64());
        let doc = generate_docx(&inspection, Some(&archive.to_bytes())).unwrap();
        let result = Archive::from_bytes(&doc.bytes).unwrap();
        assert!(result.contains("word/media/image1.png"));
    }

    #[test]
    fn generates_pdf_with_shared_gate() {
        let doc = generate_pdf(&valid_inspection()).unwrap();
        assert_eq!(doc.mime, PDF_MIME);
        assert!(doc.bytes.starts_with(b"%PDF-1.7"));
        assert_eq!(doc.suggested_filename, "Report_Tower_A_Inspection.pdf");

        let mut bad = valid_inspection();
        bad.title.clear();
        assert!(matches!(generate_pdf(&bad), Err(DocgenError::Validation(_))));
    }

    #[test]
    fn civil_date_conversion() {
        assert_eq!(civil_from_days(0), (1970, 1, 1));
        assert_eq!(civil_from_days(19_782), (2024, 2, 29));
        assert_eq!(civil_from_days(20_000), (2024, 10, 4));
    }

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(suggested_filename("a/b: c", "pdf"), "Report_a_b__c.pdf");
        assert_eq!(suggested_filename("  ", "docx"), "Report_inspection.docx");
    }
}
