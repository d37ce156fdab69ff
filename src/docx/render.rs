//! # Template Renderer
//!
//! The core templating pass: walks the document part's text as a marker
//! stream, substitutes scalars, clones loop bodies once per bound element
//! (inner scope shadowing outer), and resolves image markers into drawing
//! fragments backed by new media members and relationship records.
//!
//! The contract is best-effort output: a missing scalar renders empty, an
//! unresolvable image drops its marker, and only structural problems (no
//! document part) abort the render. Every degradation is reported to an
//! injectable [`DiagnosticSink`] so callers and tests can observe what
//! happened without the renderer writing to any host I/O stream.

use std::collections::BTreeSet;
use std::fmt;

use crate::archive::Archive;
use crate::binding::{Binding, BindingContext, Scope};
use crate::docx::{
    scan_markers, MarkerKind, CONTENT_TYPES_PART, DOCUMENT_PART, DOCUMENT_RELS_PART, MEDIA_FOLDER,
};
use crate::error::DocgenError;
use crate::image::ImageToken;

/// EMU per CSS pixel at 96 dpi (914400 EMU per inch).
const EMU_PER_PIXEL: i64 = 9525;

/// Display box for photo images, in EMU. A sizing heuristic, not an
/// invariant: images are aspect-fitted inside it when their pixel
/// dimensions can be probed.
pub const PHOTO_BOX_EMU: (i64, i64) = (4_572_000, 3_429_000);

/// Display box for signature images, in EMU.
pub const SIGNATURE_BOX_EMU: (i64, i64) = (2_286_000, 1_143_000);

/// Something the renderer wants observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEvent {
    LoopExpanded { name: String, iterations: usize },
    ImageEmbedded { name: String, target: String },
    ImageSkipped { name: String, reason: String },
    ScalarMissing { name: String },
    UnclosedLoop { name: String },
}

impl RenderEvent {
    /// Whether the event reports a degradation (something the user may
    /// want to act on) rather than normal progress.
    pub fn is_degradation(&self) -> bool {
        matches!(
            self,
            RenderEvent::ImageSkipped { .. }
                | RenderEvent::ScalarMissing { .. }
                | RenderEvent::UnclosedLoop { .. }
        )
    }
}

impl fmt::Display for RenderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderEvent::LoopExpanded { name, iterations } => {
                write!(f, "loop '{name}' expanded {iterations} time(s)")
            }
            RenderEvent::ImageEmbedded { name, target } => {
                write!(f, "image '{name}' embedded as {target}")
            }
            RenderEvent::ImageSkipped { name, reason } => {
                write!(f, "image '{name}' skipped: {reason}")
            }
            RenderEvent::ScalarMissing { name } => {
                write!(f, "placeholder '{name}' has no value and was left blank")
            }
            RenderEvent::UnclosedLoop { name } => {
                write!(f, "loop '{name}' is never closed and was ignored")
            }
        }
    }
}

/// Injectable diagnostics receiver.
pub trait DiagnosticSink {
    fn report(&mut self, event: RenderEvent);
}

/// Discards every event.
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&mut self, _event: RenderEvent) {}
}

/// Collects events for inspection, used by tests and the CLI.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub events: Vec<RenderEvent>,
}

impl DiagnosticSink for CollectingSink {
    fn report(&mut self, event: RenderEvent) {
        self.events.push(event);
    }
}

struct RenderState<'a> {
    sink: &'a mut dyn DiagnosticSink,
    /// New media members to add: (archive path, bytes).
    media: Vec<(String, Vec<u8>)>,
    /// New relationship records: (rId, target relative to word/).
    relationships: Vec<(String, String)>,
    /// Image file extensions used, for content-type defaults.
    extensions: BTreeSet<&'static str>,
    next_rel: usize,
    next_image: usize,
}

/// Render the binding context into the archive's document part.
///
/// Mutates the archive in place: document text is substituted, media
/// members are added, and relationship/content-type parts are patched.
/// Fails only when the archive has no document part.
pub fn render(
    archive: &mut Archive,
    context: &BindingContext,
    sink: &mut dyn DiagnosticSink,
) -> Result<(), DocgenError> {
    let text = archive
        .get_text(DOCUMENT_PART)
        .ok_or(DocgenError::MissingDocumentPart)?;

    let rels_text = archive
        .get_text(DOCUMENT_RELS_PART)
        .unwrap_or_else(empty_relationships);

    let mut state = RenderState {
        sink,
        media: Vec::new(),
        relationships: Vec::new(),
        extensions: BTreeSet::new(),
        next_rel: max_relationship_id(&rels_text) + 1,
        next_image: 1,
    };

    let mut frames: Vec<&BindingContext> = vec![context];
    let rendered = render_fragment(&text, &mut frames, &mut state);
    archive.set_text(DOCUMENT_PART, rendered);

    if !state.media.is_empty() {
        archive.ensure_folder(MEDIA_FOLDER);
        patch_relationships(archive, rels_text, &state.relationships);
        patch_content_types(archive, &state.extensions);
        for (path, bytes) in state.media {
            archive.set_binary(&path, bytes);
        }
    }

    Ok(())
}

/// Render one text fragment against the current scope chain.
///
/// Recursion handles nested loops; each iteration pushes its sub-context
/// onto `frames` so inner keys shadow outer ones.
fn render_fragment(
    text: &str,
    frames: &mut Vec<&BindingContext>,
    state: &mut RenderState,
) -> String {
    let markers = scan_markers(text);
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut i = 0;

    while i < markers.len() {
        let marker = &markers[i];
        out.push_str(&text[cursor..marker.start]);

        match marker.kind {
            MarkerKind::Scalar => {
                match Scope::new(frames).resolve(&marker.name) {
                    Some(Binding::Scalar(value)) => out.push_str(&text_to_xml(value)),
                    Some(_) => {} // loop/image key used as text: renders empty
                    None => state.sink.report(RenderEvent::ScalarMissing {
                        name: marker.name.clone(),
                    }),
                }
                cursor = marker.end;
                i += 1;
            }
            MarkerKind::Image => {
                match Scope::new(frames).resolve(&marker.name) {
                    Some(Binding::Image(token)) => {
                        let token = token.clone();
                        out.push_str(&embed_image(&marker.name, &token, state));
                    }
                    Some(_) => state.sink.report(RenderEvent::ImageSkipped {
                        name: marker.name.clone(),
                        reason: "bound value is not an image".to_string(),
                    }),
                    None => state.sink.report(RenderEvent::ImageSkipped {
                        name: marker.name.clone(),
                        reason: "no image bound".to_string(),
                    }),
                }
                cursor = marker.end;
                i += 1;
            }
            MarkerKind::LoopOpen => {
                match find_matching_close(&markers, i) {
                    Some(close_idx) => {
                        let close = &markers[close_idx];
                        let body = &text[marker.end..close.start];
                        let items = Scope::new(frames).list(&marker.name);
                        state.sink.report(RenderEvent::LoopExpanded {
                            name: marker.name.clone(),
                            iterations: items.len(),
                        });
                        for item in items {
                            frames.push(item);
                            let rendered = render_fragment(body, frames, state);
                            out.push_str(&rendered);
                            frames.pop();
                        }
                        cursor = close.end;
                        i = close_idx + 1;
                    }
                    None => {
                        state.sink.report(RenderEvent::UnclosedLoop {
                            name: marker.name.clone(),
                        });
                        cursor = marker.end;
                        i += 1;
                    }
                }
            }
            // A stray close without an open: drop the marker text.
            MarkerKind::LoopClose => {
                cursor = marker.end;
                i += 1;
            }
        }
    }

    out.push_str(&text[cursor..]);
    out
}

/// Find the close marker matching the open at `open_idx`, honoring nesting
/// of same-named loops.
fn find_matching_close(markers: &[crate::docx::Marker], open_idx: usize) -> Option<usize> {
    let name = &markers[open_idx].name;
    let mut depth = 0usize;
    for (idx, marker) in markers.iter().enumerate().skip(open_idx + 1) {
        if marker.name != *name {
            continue;
        }
        match marker.kind {
            MarkerKind::LoopOpen => depth += 1,
            MarkerKind::LoopClose => {
                if depth == 0 {
                    return Some(idx);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

/// Escape a scalar for placement inside `<w:t>`, turning newlines into
/// run breaks so multi-line values (participant listings) keep their lines.
fn text_to_xml(value: &str) -> String {
    let escaped = xml_escape(value);
    escaped.replace('\n', "</w:t><w:br/><w:t xml:space=\"preserve\">")
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Replace an image marker with a drawing run and queue the media member.
///
/// The marker sits inside `<w:t>` text, where a drawing cannot legally
/// live, so the replacement closes the current run, emits a drawing run,
/// and reopens a text run.
fn embed_image(name: &str, token: &ImageToken, state: &mut RenderState) -> String {
    let ext = token.mime.extension();
    let filename = format!("image{}.{}", state.next_image, ext);
    let rid = format!("rId{}", state.next_rel);
    let doc_pr_id = state.next_image;
    state.next_image += 1;
    state.next_rel += 1;

    let box_emu = if name == "signature" {
        SIGNATURE_BOX_EMU
    } else {
        PHOTO_BOX_EMU
    };
    let (cx, cy) = fit_box(token.dimensions(), box_emu);

    let target = format!("media/{filename}");
    let path = format!("{MEDIA_FOLDER}/{filename}");
    state.sink.report(RenderEvent::ImageEmbedded {
        name: name.to_string(),
        target: path.clone(),
    });
    state.media.push((path, token.bytes.clone()));
    state.relationships.push((rid.clone(), target));
    state.extensions.insert(ext);

    format!(
        concat!(
            "</w:t></w:r><w:r><w:drawing>",
            "<wp:inline xmlns:wp=\"http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing\" distT=\"0\" distB=\"0\" distL=\"0\" distR=\"0\">",
            "<wp:extent cx=\"{cx}\" cy=\"{cy}\"/>",
            "<wp:docPr id=\"{id}\" name=\"Picture {id}\"/>",
            "<a:graphic xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\">",
            "<a:graphicData uri=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">",
            "<pic:pic xmlns:pic=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">",
            "<pic:nvPicPr><pic:cNvPr id=\"{id}\" name=\"Picture {id}\"/><pic:cNvPicPr/></pic:nvPicPr>",
            "<pic:blipFill><a:blip xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\" r:embed=\"{rid}\"/>",
            "<a:stretch><a:fillRect/></a:stretch></pic:blipFill>",
            "<pic:spPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>",
            "<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></pic:spPr>",
            "</pic:pic></a:graphicData></a:graphic></wp:inline>",
            "</w:drawing></w:r><w:r><w:t>"
        ),
        cx = cx,
        cy = cy,
        id = doc_pr_id,
        rid = rid,
    )
}

/// Aspect-fit probed pixel dimensions into a display box. Falls back to
/// the box itself when the image cannot be probed.
fn fit_box(dimensions: Option<(u32, u32)>, box_emu: (i64, i64)) -> (i64, i64) {
    let (bw, bh) = box_emu;
    match dimensions {
        Some((w, h)) if w > 0 && h > 0 => {
            let w_emu = w as i64 * EMU_PER_PIXEL;
            let h_emu = h as i64 * EMU_PER_PIXEL;
            let scale = f64::min(bw as f64 / w_emu as f64, bh as f64 / h_emu as f64);
            (
                (w_emu as f64 * scale).round() as i64,
                (h_emu as f64 * scale).round() as i64,
            )
        }
        _ => (bw, bh),
    }
}

fn empty_relationships() -> String {
    concat!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
        "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
        "</Relationships>"
    )
    .to_string()
}

/// Highest rId number already present in a relationships part.
fn max_relationship_id(rels: &str) -> usize {
    let mut max = 0;
    let mut rest = rels;
    while let Some(pos) = rest.find("Id=\"rId") {
        rest = &rest[pos + 7..];
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        if let Ok(n) = digits.parse::<usize>() {
            max = max.max(n);
        }
    }
    max
}

fn patch_relationships(archive: &mut Archive, rels_text: String, new: &[(String, String)]) {
    let mut additions = String::new();
    for (rid, target) in new {
        additions.push_str(&format!(
            "<Relationship Id=\"{rid}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/image\" Target=\"{target}\"/>"
        ));
    }
    let patched = match rels_text.rfind("</Relationships>") {
        Some(pos) => {
            let mut s = rels_text;
            s.insert_str(pos, &additions);
            s
        }
        // No closing tag found: the part was absent or unusable, write a fresh one.
        None => {
            let mut s = empty_relationships();
            let pos = s.rfind("</Relationships>").unwrap_or(s.len());
            s.insert_str(pos, &additions);
            s
        }
    };
    archive.ensure_folder("word/_rels");
    archive.set_text(DOCUMENT_RELS_PART, patched);
}

fn patch_content_types(archive: &mut Archive, extensions: &BTreeSet<&'static str>) {
    let existing = archive.get_text(CONTENT_TYPES_PART).unwrap_or_else(|| {
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
            "<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">",
            "<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>",
            "<Default Extension=\"xml\" ContentType=\"application/xml\"/>",
            "</Types>"
        )
        .to_string()
    });

    let mut additions = String::new();
    for ext in extensions {
        if !existing.contains(&format!("Extension=\"{ext}\"")) {
            let mime = match *ext {
                "png" => "image/png",
                _ => "image/jpeg",
            };
            additions.push_str(&format!(
                "<Default Extension=\"{ext}\" ContentType=\"{mime}\"/>"
            ));
        }
    }
    if additions.is_empty() && archive.contains(CONTENT_TYPES_PART) {
        return;
    }
    let patched = match existing.rfind("</Types>") {
        Some(pos) => {
            let mut s = existing;
            s.insert_str(pos, &additions);
            s
        }
        None => existing,
    };
    archive.set_text(CONTENT_TYPES_PART, patched);
}
