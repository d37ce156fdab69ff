//! Integration tests for the laudogen generation pipeline.
//!
//! These tests exercise the full path from an inspection record (struct or
//! JSON) to DOCX/PDF output. They verify:
//! - Validation gates generation before any template access
//! - Template markers are filled, loops cloned, images embedded
//! - Capability-based fallback to the built-in template
//! - Output archives round-trip through the ZIP reader
//! - PDF output is structurally valid

use laudogen::archive::Archive;
use laudogen::docx::fallback::build_minimal_template;
use laudogen::docx::{diagnose, DOCUMENT_PART, DOCUMENT_RELS_PART};
use laudogen::model::{
    AgentEvaluation, Inspection, InspectionStatus, Nr15Assessment, Participant, Photo,
};
use laudogen::{generate_docx, generate_pdf, validate_inspection, DocgenError};

// ─── Helpers ────────────────────────────────────────────────────

/// A valid 1x1 red PNG as a data URL.
fn tiny_png_data_url() -> String {
    use base64::Engine;
    let mut img = image::RgbaImage::new(1, 1);
    img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(encoder, img.as_raw(), 1, 1, image::ColorType::Rgba8)
        .expect("png encoding of a 1x1 image cannot fail");
    let b64 = base64::engine::general_purpose::STANDARD.encode(&buf);
    format!("data:image/png;base64,{b64}")
}

fn make_participant(name: &str, role: &str, company: &str) -> Participant {
    Participant {
        name: name.to_string(),
        role: role.to_string(),
        company: company.to_string(),
        ..Default::default()
    }
}

fn make_inspection() -> Inspection {
    Inspection {
        title: "Tower A Inspection".to_string(),
        kind: "Insalubrity survey".to_string(),
        address: "Industrial Ave 100".to_string(),
        responsible: "Jane Doe".to_string(),
        survey_date: "2024-03-01".to_string(),
        status: InspectionStatus::Completed,
        participants: vec![make_participant("Jane Doe", "Engineer", "Acme")],
        ..Default::default()
    }
}

fn make_photo(caption: &str) -> Photo {
    Photo {
        data_url: tiny_png_data_url(),
        caption: caption.to_string(),
        created_at: "2024-03-01T10:00:00Z".to_string(),
        ..Default::default()
    }
}

/// A structurally valid template carrying only the given document body.
fn template_with_body(body: &str) -> Vec<u8> {
    let mut archive = Archive::new();
    archive.set_text(
        DOCUMENT_PART,
        format!("<w:document><w:body>{body}</w:body></w:document>"),
    );
    archive.to_bytes()
}

fn document_text(docx: &[u8]) -> String {
    Archive::from_bytes(docx)
        .expect("output should be a readable archive")
        .get_text(DOCUMENT_PART)
        .expect("output should have a document part")
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 50, "PDF too small to be valid");
    assert!(bytes.starts_with(b"%PDF-1.7"), "Missing PDF header");
    assert!(
        bytes.windows(5).any(|w| w == b"%%EOF"),
        "Missing %%EOF marker"
    );
    assert!(bytes.windows(4).any(|w| w == b"xref"), "Missing xref table");
    assert!(bytes.windows(7).any(|w| w == b"trailer"), "Missing trailer");
}

// ─── Happy Path Tests ───────────────────────────────────────────

#[test]
fn test_valid_record_generates_docx() {
    let doc = generate_docx(&make_inspection(), Some(&build_minimal_template().to_bytes()))
        .expect("valid record and template should generate");
    assert_eq!(
        doc.mime,
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    );
    let text = document_text(&doc.bytes);
    assert!(text.contains("Tower A Inspection"));
    assert!(text.contains("Jane Doe (Engineer) - Acme"));
    // Dates are display-formatted in the output.
    assert!(text.contains("01/03/2024"));
    // No markers survive rendering.
    assert!(!text.contains("{title}"));
    assert!(!text.contains("{#participants}"));
}

#[test]
fn test_record_without_photos_does_not_repeat_photo_section() {
    let doc = generate_docx(&make_inspection(), Some(&build_minimal_template().to_bytes()))
        .unwrap();
    let text = document_text(&doc.bytes);
    // The photos loop iterated zero times: no caption markers, no drawings.
    assert!(!text.contains("{caption}"));
    assert!(!text.contains("<w:drawing>"));
}

#[test]
fn test_output_is_a_readable_zip() {
    let doc = generate_docx(&make_inspection(), Some(&build_minimal_template().to_bytes()))
        .unwrap();
    let archive = Archive::from_bytes(&doc.bytes).unwrap();
    assert!(archive.contains("[Content_Types].xml"));
    assert!(archive.contains(DOCUMENT_PART));
}

#[test]
fn test_json_entry_point() {
    let json = serde_json::to_string(&make_inspection()).unwrap();
    let doc = laudogen::generate_docx_json(&json, Some(&build_minimal_template().to_bytes()))
        .unwrap();
    assert!(document_text(&doc.bytes).contains("Tower A Inspection"));

    let err = laudogen::generate_docx_json("{not json", None).unwrap_err();
    assert!(matches!(err, DocgenError::Parse { .. }));
}

// ─── Validation Gating Tests ────────────────────────────────────

#[test]
fn test_zero_participants_is_a_single_blocking_error() {
    let mut inspection = make_inspection();
    inspection.participants.clear();
    let err = generate_docx(&inspection, Some(&build_minimal_template().to_bytes()))
        .unwrap_err();
    match err {
        DocgenError::Validation(report) => {
            assert_eq!(report.errors.len(), 1, "errors: {:?}", report.errors);
            assert!(report.errors[0].contains("participant"));
        }
        other => panic!("expected Validation error, got {other}"),
    }
}

#[test]
fn test_blocking_errors_run_before_template_access() {
    let mut inspection = make_inspection();
    inspection.title.clear();
    // Template bytes are garbage: if they were touched first, the error
    // would be CorruptArchive instead.
    let err = generate_docx(&inspection, Some(b"garbage")).unwrap_err();
    assert!(matches!(err, DocgenError::Validation(_)));
}

#[test]
fn test_validation_is_idempotent() {
    let mut inspection = make_inspection();
    inspection.photos.push(Photo::default());
    let first = validate_inspection(&inspection);
    let second = validate_inspection(&inspection);
    assert_eq!(first, second);
}

#[test]
fn test_missing_template_distinct_from_corrupt_template() {
    let missing = generate_docx(&make_inspection(), None).unwrap_err();
    assert!(matches!(missing, DocgenError::TemplateNotFound));

    let corrupt = generate_docx(&make_inspection(), Some(b"PK\x03\x04 junk")).unwrap_err();
    assert!(matches!(corrupt, DocgenError::CorruptArchive(_)));
}

// ─── Loop And Scope Tests ───────────────────────────────────────

#[test]
fn test_participant_loop_clones_per_entry() {
    let mut inspection = make_inspection();
    inspection.participants.push(make_participant("John Smith", "Supervisor", "Widget"));
    inspection.participants.push(make_participant("Ana Souza", "Technician", "Acme"));
    let template = template_with_body(
        "<w:p><w:r><w:t>{title}</w:t></w:r></w:p>\
         <w:p><w:r><w:t>{#participants}ROW {name}|{/participants}</w:t></w:r></w:p>",
    );
    let doc = generate_docx(&inspection, Some(&template)).unwrap();
    let text = document_text(&doc.bytes);
    assert_eq!(text.matches("ROW ").count(), 3);
    assert!(text.contains("ROW Jane Doe|ROW John Smith|ROW Ana Souza|"));
}

#[test]
fn test_empty_loop_removes_its_unit() {
    let template = template_with_body(
        "<w:p><w:r><w:t>{title}</w:t></w:r></w:p>\
         <w:p><w:r><w:t>BEFORE{#photos}PHOTO UNIT{/photos}AFTER</w:t></w:r></w:p>",
    );
    let doc = generate_docx(&make_inspection(), Some(&template)).unwrap();
    let text = document_text(&doc.bytes);
    assert!(text.contains("BEFOREAFTER"));
    assert!(!text.contains("PHOTO UNIT"));
}

#[test]
fn test_loop_scope_sees_outer_scalars() {
    let template = template_with_body(
        "<w:p><w:r><w:t>{#participants}{name} at {address}{/participants}</w:t></w:r></w:p>",
    );
    let doc = generate_docx(&make_inspection(), Some(&template)).unwrap();
    assert!(document_text(&doc.bytes).contains("Jane Doe at Industrial Ave 100"));
}

#[test]
fn test_nested_agents_loop() {
    let mut inspection = make_inspection();
    inspection.nr15_assessments.push(Nr15Assessment {
        annex_number: 1,
        applies: Some(true),
        assessment_site: "Boiler house".to_string(),
        activities_described: "Boiler rounds".to_string(),
        ppe_used: "Ear muffs".to_string(),
        conclusion: "Above limit".to_string(),
        agents: vec![AgentEvaluation {
            agent_id: "continuous-noise".to_string(),
            identified: true,
            measured_value: "91.2 dB(A)".to_string(),
            above_limit: Some(true),
            ppe_description: "Ear muffs".to_string(),
            ..Default::default()
        }],
        ..Default::default()
    });
    let template = template_with_body(
        "<w:p><w:r><w:t>{title} {#annexes}A{annexNumber}:[{#agents}{agentId} {aboveLimit}{/agents}]{/annexes}</w:t></w:r></w:p>",
    );
    let doc = generate_docx(&inspection, Some(&template)).unwrap();
    let text = document_text(&doc.bytes);
    assert!(text.contains("A1:[continuous-noise Above limit]"));
}

// ─── Image Embedding Tests ──────────────────────────────────────

#[test]
fn test_photos_become_media_entries_and_relationships() {
    let mut inspection = make_inspection();
    inspection.photos.push(make_photo("Boiler gauge"));
    inspection.photos.push(make_photo("Feed pump"));
    let doc = generate_docx(&inspection, Some(&build_minimal_template().to_bytes()))
        .unwrap();
    let archive = Archive::from_bytes(&doc.bytes).unwrap();

    assert!(archive.contains("word/media/image1.png"));
    assert!(archive.contains("word/media/image2.png"));
    let rels = archive.get_text(DOCUMENT_RELS_PART).unwrap();
    assert!(rels.contains("Target=\"media/image1.png\""));
    assert!(rels.contains("Target=\"media/image2.png\""));

    let text = archive.get_text(DOCUMENT_PART).unwrap();
    assert_eq!(text.matches("<w:drawing>").count(), 2);
    assert!(text.contains("Boiler gauge"));
    assert!(text.contains("Feed pump"));
}

#[test]
fn test_broken_photo_degrades_to_caption_only() {
    let mut inspection = make_inspection();
    inspection.photos.push(Photo {
        data_url: "!!not base64!!".to_string(),
        caption: "Broken capture".to_string(),
        ..Default::default()
    });
    let doc = generate_docx(&inspection, Some(&build_minimal_template().to_bytes()))
        .unwrap();
    let archive = Archive::from_bytes(&doc.bytes).unwrap();
    assert!(!archive.contains("word/media/image1.png"));
    let text = archive.get_text(DOCUMENT_PART).unwrap();
    assert!(text.contains("Broken capture"));
    assert!(!text.contains("{%image}"));
}

#[test]
fn test_signature_media_uses_signatures_loop() {
    let mut inspection = make_inspection();
    inspection.participants[0].signature = Some(tiny_png_data_url());
    inspection.participants.push(make_participant("John Smith", "Supervisor", "Widget"));
    let doc = generate_docx(&inspection, Some(&build_minimal_template().to_bytes()))
        .unwrap();
    let archive = Archive::from_bytes(&doc.bytes).unwrap();
    // One signed participant: exactly one embedded signature image.
    assert!(archive.contains("word/media/image1.png"));
    assert!(!archive.contains("word/media/image2.png"));
}

// ─── Fallback Template Tests ────────────────────────────────────

#[test]
fn test_signed_record_with_unsupporting_template_uses_fallback() {
    let mut inspection = make_inspection();
    inspection.participants[0].signature = Some(tiny_png_data_url());
    // Valid template, but no signatures loop or signature marker.
    let template = template_with_body("<w:p><w:r><w:t>{title}</w:t></w:r></w:p>");
    let doc = generate_docx(&inspection, Some(&template)).unwrap();
    let archive = Archive::from_bytes(&doc.bytes).unwrap();
    let text = archive.get_text(DOCUMENT_PART).unwrap();
    // Fallback layout rendered, with the signature embedded.
    assert!(text.contains("Signatures"));
    assert!(archive.contains("word/media/image1.png"));
}

#[test]
fn test_capable_template_is_kept() {
    let mut inspection = make_inspection();
    inspection.photos.push(make_photo("Gauge"));
    let template = template_with_body(
        "<w:p><w:r><w:t>CUSTOM LAYOUT {title}</w:t></w:r></w:p>\
         <w:p><w:r><w:t>{#photos}{%image}{caption}{/photos}</w:t></w:r></w:p>",
    );
    let doc = generate_docx(&inspection, Some(&template)).unwrap();
    let text = document_text(&doc.bytes);
    assert!(text.contains("CUSTOM LAYOUT Tower A Inspection"));
    assert!(text.contains("<w:drawing>"));
}

#[test]
fn test_photoless_record_keeps_photoless_template() {
    let template = template_with_body("<w:p><w:r><w:t>LEAN {title}</w:t></w:r></w:p>");
    let doc = generate_docx(&make_inspection(), Some(&template)).unwrap();
    assert!(document_text(&doc.bytes).contains("LEAN Tower A Inspection"));
}

// ─── PDF Path Tests ─────────────────────────────────────────────

#[test]
fn test_pdf_generation_from_valid_record() {
    let doc = generate_pdf(&make_inspection()).unwrap();
    assert_eq!(doc.mime, "application/pdf");
    assert_valid_pdf(&doc.bytes);
}

#[test]
fn test_pdf_shares_validation_gate() {
    let mut inspection = make_inspection();
    inspection.responsible.clear();
    assert!(matches!(
        generate_pdf(&inspection),
        Err(DocgenError::Validation(_))
    ));
}

#[test]
fn test_pdf_paginates_large_records() {
    let mut inspection = make_inspection();
    for n in 0..150 {
        inspection
            .participants
            .push(make_participant(&format!("Participant {n}"), "Technician", "Acme"));
    }
    let doc = generate_pdf(&inspection).unwrap();
    assert_valid_pdf(&doc.bytes);
    let text = String::from_utf8_lossy(&doc.bytes);
    assert!(text.matches("/Type /Page ").count() > 1);
}

// ─── Diagnostic Surface Tests ───────────────────────────────────

#[test]
fn test_integrity_check_on_generated_template() {
    let report = diagnose::check_template_integrity(&build_minimal_template().to_bytes());
    assert!(report.is_valid, "details: {:?}", report.details);
}

#[test]
fn test_integrity_check_on_garbage() {
    let report = diagnose::check_template_integrity(b"once upon a time");
    assert!(!report.is_valid);
    assert!(!report.details.is_empty());
}

#[test]
fn test_template_description_mentions_core_markers() {
    let text = diagnose::describe_required_template();
    for marker in ["{title}", "{#participants}", "{%signature}", "{#annexes}"] {
        assert!(text.contains(marker), "missing {marker}");
    }
}

// ─── Round Trip Tests ───────────────────────────────────────────

#[test]
fn test_record_round_trips_through_json() {
    let mut inspection = make_inspection();
    inspection.photos.push(make_photo("Gauge"));
    inspection.nr15_assessments.push(Nr15Assessment {
        annex_number: 3,
        applies: Some(false),
        ..Default::default()
    });
    let json = serde_json::to_string(&inspection).unwrap();
    let back: Inspection = serde_json::from_str(&json).unwrap();
    assert_eq!(serde_json::to_string(&back).unwrap(), json);
}

#[test]
fn test_generation_does_not_mutate_the_record() {
    let inspection = make_inspection();
    let before = serde_json::to_string(&inspection).unwrap();
    let _ = generate_docx(&inspection, Some(&build_minimal_template().to_bytes())).unwrap();
    let _ = generate_pdf(&inspection).unwrap();
    assert_eq!(serde_json::to_string(&inspection).unwrap(), before);
}

#[test]
fn test_example_cli_json_is_a_valid_record() {
    // The CLI --example payload must parse and generate.
    let json = include_str!("data/example_inspection.json");
    let doc = laudogen::generate_pdf_json(json).unwrap();
    assert_valid_pdf(&doc.bytes);
}
