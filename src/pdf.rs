//! # PDF Writer
//!
//! A from-scratch PDF 1.7 writer for the report's alternate output format.
//! We write the raw bytes ourselves because it keeps the generator
//! self-contained; the subset needed for a text report is manageable:
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- objects (catalog, pages, fonts, content streams)
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! The PDF rendition is a sequential text layout built from the same
//! binding context the DOCX renderer consumes: heading, metadata lines,
//! then one section per loop. Images are not drawn; photos and signatures
//! appear as their captions and names. Content streams are Flate
//! compressed; text uses the standard Type1 Helvetica faces with
//! WinAnsi encoding, which covers the Latin-1 accents the records carry.

use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::binding::BindingContext;

/// MIME type of a generated PDF payload.
pub const PDF_MIME: &str = "application/pdf";

// A4 portrait, in points.
const PAGE_WIDTH: f64 = 595.28;
const PAGE_HEIGHT: f64 = 841.89;
const MARGIN: f64 = 54.0;
const LINE_SPACING: f64 = 1.45;

/// Average glyph width as a fraction of the font size. Helvetica text runs
/// close to this; good enough for wrapping a report, not for typesetting.
const AVG_CHAR_WIDTH: f64 = 0.5;

struct Line {
    text: String,
    size: f64,
    bold: bool,
    space_after: f64,
}

impl Line {
    fn body(text: impl Into<String>) -> Self {
        Line { text: text.into(), size: 11.0, bold: false, space_after: 0.0 }
    }

    fn heading(text: impl Into<String>, size: f64) -> Self {
        Line { text: text.into(), size, bold: true, space_after: 4.0 }
    }

    fn gap() -> Self {
        Line { text: String::new(), size: 11.0, bold: false, space_after: 0.0 }
    }
}

/// Render the projected context as a PDF document.
pub fn write_document(context: &BindingContext) -> Vec<u8> {
    let lines = compose(context);
    let pages = paginate(&lines);
    serialize(&pages, &context.scalar("title"))
}

/// Flatten the binding context into a line sequence mirroring the DOCX
/// fallback layout.
fn compose(context: &BindingContext) -> Vec<Line> {
    let mut lines = Vec::new();

    lines.push(Line::heading(context.scalar("title"), 18.0));
    lines.push(Line::body(format!("Type: {}", context.scalar("kind"))));
    lines.push(Line::gap());

    lines.push(Line::heading("Inspection data", 14.0));
    for (label, key) in [
        ("Address", "address"),
        ("Unit", "unit"),
        ("Responsible", "responsible"),
        ("Survey date", "surveyDate"),
        ("Status", "statusText"),
        ("Observations", "observations"),
    ] {
        lines.push(Line::body(format!("{label}: {}", context.scalar(key))));
    }
    lines.push(Line::gap());

    lines.push(Line::heading(
        format!("Participants ({})", context.scalar("participantCount")),
        14.0,
    ));
    for participant in context.list("participants") {
        let email = participant.scalar("email");
        let suffix = if email.is_empty() { String::new() } else { format!(" {email}") };
        lines.push(Line::body(format!(
            "{} ({}) - {}{suffix}",
            participant.scalar("name"),
            participant.scalar("role"),
            participant.scalar("company"),
        )));
    }
    if context.list("participants").is_empty() {
        lines.push(Line::body("No participants added"));
    }
    lines.push(Line::gap());

    lines.push(Line::heading(
        format!("NR-15 assessment ({} applicable)", context.scalar("appliesCount")),
        14.0,
    ));
    for (label, key) in [
        ("Sectors evaluated", "sectorsEvaluated"),
        ("Activities", "activitiesDescription"),
        ("Collective protection identified", "epcsIdentified"),
        ("Observations", "nr15Observations"),
    ] {
        lines.push(Line::body(format!("{label}: {}", context.scalar(key))));
    }
    for annex in context.list("annexes") {
        lines.push(Line::gap());
        lines.push(Line::heading(
            format!(
                "Annex {} - {}: {}",
                annex.scalar("annexNumber"),
                annex.scalar("annexTitle"),
                annex.scalar("applicability"),
            ),
            12.0,
        ));
        for (label, key) in [
            ("Site", "assessmentSite"),
            ("Activities", "activitiesDescribed"),
            ("PPE in use", "ppeUsed"),
            ("Measurements", "measurements"),
            ("Exposure time", "exposureTime"),
        ] {
            let value = annex.scalar(key);
            if !value.is_empty() {
                lines.push(Line::body(format!("{label}: {value}")));
            }
        }
        for agent in annex.list("agents") {
            lines.push(Line::body(format!(
                "- {}: identified {}, {} {}, PPE {}",
                agent.scalar("agentId"),
                agent.scalar("identified"),
                agent.scalar("measuredValue"),
                agent.scalar("aboveLimit"),
                agent.scalar("ppeDescription"),
            )));
        }
        let conclusion = annex.scalar("conclusion");
        if !conclusion.is_empty() {
            lines.push(Line::body(format!("Conclusion: {conclusion}")));
        }
    }
    lines.push(Line::gap());

    lines.push(Line::heading(
        format!("Photographic record ({})", context.scalar("photoCount")),
        14.0,
    ));
    for photo in context.list("photos") {
        lines.push(Line::body(format!(
            "[photo] {} ({})",
            photo.scalar("caption"),
            photo.scalar("takenAt"),
        )));
    }
    lines.push(Line::gap());

    lines.push(Line::heading("Signatures", 14.0));
    for signature in context.list("signatures") {
        lines.push(Line::body(format!(
            "{} ({}) - {} [signed]",
            signature.scalar("name"),
            signature.scalar("role"),
            signature.scalar("company"),
        )));
    }
    if context.list("signatures").is_empty() {
        lines.push(Line::body("No signatures captured"));
    }
    lines.push(Line::gap());
    lines.push(Line::body(format!(
        "Document generated automatically on {}.",
        context.scalar("generationDate"),
    )));

    lines
}

struct PlacedLine {
    text: String,
    size: f64,
    bold: bool,
    x: f64,
    y: f64,
}

/// Wrap and flow lines onto pages, top-down with a running Y cursor.
fn paginate(lines: &[Line]) -> Vec<Vec<PlacedLine>> {
    let max_width = PAGE_WIDTH - 2.0 * MARGIN;
    let mut pages: Vec<Vec<PlacedLine>> = vec![Vec::new()];
    let mut y = PAGE_HEIGHT - MARGIN;

    for line in lines {
        let advance = line.size * LINE_SPACING;
        for piece in wrap(&line.text, line.size, max_width) {
            if y - advance < MARGIN {
                pages.push(Vec::new());
                y = PAGE_HEIGHT - MARGIN;
            }
            y -= advance;
            if !piece.is_empty() {
                pages.last_mut().unwrap().push(PlacedLine {
                    text: piece,
                    size: line.size,
                    bold: line.bold,
                    x: MARGIN,
                    y,
                });
            }
        }
        y -= line.space_after;
    }

    pages
}

/// Greedy whitespace wrap using the average-width heuristic. A single word
/// wider than the line is emitted as-is rather than broken.
fn wrap(text: &str, size: f64, max_width: f64) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }
    let max_chars = ((max_width / (size * AVG_CHAR_WIDTH)) as usize).max(1);
    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current_len > 0 && current_len + 1 + word_len > max_chars {
            out.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }
    if !current.is_empty() || out.is_empty() {
        out.push(current);
    }
    out
}

struct PdfObject {
    data: Vec<u8>,
}

fn serialize(pages: &[Vec<PlacedLine>], title: &str) -> Vec<u8> {
    // 0 = placeholder (PDF objects are 1-indexed)
    // 1 = Catalog, 2 = Pages, 3 = Helvetica, 4 = Helvetica-Bold
    let mut objects: Vec<PdfObject> = Vec::new();
    objects.push(PdfObject { data: vec![] });
    objects.push(PdfObject { data: vec![] });
    objects.push(PdfObject { data: vec![] });
    objects.push(PdfObject {
        data: b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_vec(),
    });
    objects.push(PdfObject {
        data:
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
                .to_vec(),
    });

    let mut page_obj_ids: Vec<usize> = Vec::new();
    for page in pages {
        let content = build_content_stream(page);
        let compressed = compress_to_vec_zlib(content.as_bytes(), 6);

        let content_obj_id = objects.len();
        let mut content_data: Vec<u8> = Vec::new();
        let _ = write!(
            content_data,
            "<< /Length {} /Filter /FlateDecode >>\nstream\n",
            compressed.len()
        );
        content_data.extend_from_slice(&compressed);
        content_data.extend_from_slice(b"\nendstream");
        objects.push(PdfObject { data: content_data });

        let page_obj_id = objects.len();
        let page_dict = format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH:.2} {PAGE_HEIGHT:.2}] \
             /Contents {content_obj_id} 0 R \
             /Resources << /Font << /F0 3 0 R /F1 4 0 R >> >> >>"
        );
        objects.push(PdfObject { data: page_dict.into_bytes() });
        page_obj_ids.push(page_obj_id);
    }

    objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();
    let kids: String = page_obj_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");
    objects[2].data = format!(
        "<< /Type /Pages /Kids [{kids}] /Count {} >>",
        page_obj_ids.len()
    )
    .into_bytes();

    let info_obj_id = objects.len();
    objects.push(PdfObject {
        data: format!(
            "<< /Title ({}) /Producer (laudogen) >>",
            escape_pdf_string(title)
        )
        .into_bytes(),
    });

    let mut output: Vec<u8> = Vec::new();
    let mut offsets: Vec<usize> = vec![0; objects.len()];

    output.extend_from_slice(b"%PDF-1.7\n");
    output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

    for (i, obj) in objects.iter().enumerate().skip(1) {
        offsets[i] = output.len();
        let header = format!("{i} 0 obj\n");
        output.extend_from_slice(header.as_bytes());
        output.extend_from_slice(&obj.data);
        output.extend_from_slice(b"\nendobj\n\n");
    }

    let xref_offset = output.len();
    let _ = write!(output, "xref\n0 {}\n", objects.len());
    let _ = write!(output, "0000000000 65535 f \n");
    for offset in offsets.iter().skip(1) {
        let _ = write!(output, "{offset:010} 00000 n \n");
    }
    let _ = write!(
        output,
        "trailer\n<< /Size {} /Root 1 0 R /Info {info_obj_id} 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
        objects.len()
    );

    output
}

fn build_content_stream(page: &[PlacedLine]) -> String {
    let mut stream = String::new();
    for line in page {
        let font = if line.bold { "F1" } else { "F0" };
        let _ = write!(
            stream,
            "BT\n/{font} {:.1} Tf\n{:.2} {:.2} Td\n({}) Tj\nET\n",
            line.size,
            line.x,
            line.y,
            encode_winansi(&line.text),
        );
    }
    stream
}

/// Escape special characters in a PDF string.
fn escape_pdf_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// Encode text as a WinAnsi PDF string literal, escaping delimiters and
/// writing non-ASCII bytes as octal escapes.
fn encode_winansi(text: &str) -> String {
    let mut out = String::new();
    for ch in text.chars() {
        let b = unicode_to_winansi(ch).unwrap_or(b'?');
        match b {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            0x20..=0x7E => out.push(b as char),
            _ => {
                let _ = write!(out, "\\{b:03o}");
            }
        }
    }
    out
}

/// Map a Unicode codepoint to a WinAnsiEncoding byte value.
///
/// WinAnsiEncoding is based on Windows-1252: 0x20..=0x7E and 0xA0..=0xFF
/// map directly, which covers the Latin-1 accents in the records. The
/// 0x80..=0x9F range holds the common punctuation specials.
fn unicode_to_winansi(ch: char) -> Option<u8> {
    let cp = ch as u32;
    if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
        return Some(cp as u8);
    }
    match cp {
        0x20AC => Some(0x80), // Euro sign
        0x201A => Some(0x82), // Single low-9 quotation mark
        0x201E => Some(0x84), // Double low-9 quotation mark
        0x2026 => Some(0x85), // Horizontal ellipsis
        0x2013 => Some(0x96), // En dash
        0x2014 => Some(0x97), // Em dash
        0x2018 => Some(0x91), // Left single quotation mark
        0x2019 => Some(0x92), // Right single quotation mark
        0x201C => Some(0x93), // Left double quotation mark
        0x201D => Some(0x94), // Right double quotation mark
        0x2022 => Some(0x95), // Bullet
        0x2122 => Some(0x99), // Trade mark sign
        _ => None,
    }
}
