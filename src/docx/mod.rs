//! # DOCX Container Support
//!
//! A DOCX file is a ZIP archive of XML parts (ECMA-376 / Office Open XML):
//!
//! ```text
//! [Content_Types].xml            <- content type declarations
//! _rels/.rels                    <- root relationships
//! word/document.xml              <- main document part
//! word/styles.xml                <- style definitions
//! word/_rels/document.xml.rels   <- document relationships
//! word/media/                    <- embedded images
//! ```
//!
//! Templates carry docxtemplater-style markers in the document part's text:
//! `{name}` scalars, `{#name}` / `{/name}` loop pairs, and `{%name}` image
//! substitution tags. The marker text lives inside simple `<w:t>` leaf
//! nodes, so all marker processing is a token scan over the raw part text,
//! always read and written through the [`Archive`](crate::archive::Archive)
//! API, never by treating the whole ZIP as a flat string.

pub mod diagnose;
pub mod fallback;
pub mod render;
pub mod validator;

/// MIME type of a generated DOCX payload.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const ROOT_RELS_PART: &str = "_rels/.rels";
pub const DOCUMENT_PART: &str = "word/document.xml";
pub const STYLES_PART: &str = "word/styles.xml";
pub const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
pub const MEDIA_FOLDER: &str = "word/media";

/// Loop names the renderer and validator understand.
pub const KNOWN_LOOPS: &[&str] = &["participants", "signatures", "photos", "annexes", "agents"];

/// Image markers the renderer understands, with the loop that scopes them.
pub const KNOWN_IMAGE_MARKERS: &[(&str, &str)] = &[("signature", "signatures"), ("image", "photos")];

/// Scalar placeholders the projector always provides. Used by the
/// diagnostic surface to audit template completeness.
pub const EXPECTED_SCALARS: &[&str] = &[
    "title",
    "kind",
    "address",
    "unit",
    "responsible",
    "surveyDate",
    "generationDate",
    "observations",
    "status",
    "statusText",
    "sectorsEvaluated",
    "activitiesDescription",
    "epcsIdentified",
    "nr15Observations",
    "participantCount",
    "photoCount",
    "appliesCount",
    "participantsSummary",
];

/// Kind of a template marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// `{name}`: text substitution.
    Scalar,
    /// `{#name}`: loop open.
    LoopOpen,
    /// `{/name}`: loop close.
    LoopClose,
    /// `{%name}`: binary image substitution.
    Image,
}

/// One marker occurrence in a document part's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub kind: MarkerKind,
    pub name: String,
    /// Byte offset of the opening `{`.
    pub start: usize,
    /// Byte offset one past the closing `}`.
    pub end: usize,
}

/// Scan text for template markers.
///
/// A marker is `{`, an optional `#`/`/`/`%` prefix, an identifier of ASCII
/// alphanumerics and underscores, then `}`. Anything else containing braces
/// (XML attribute values, stray characters) is left alone.
pub fn scan_markers(text: &str) -> Vec<Marker> {
    let bytes = text.as_bytes();
    let mut markers = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'{' {
            i += 1;
            continue;
        }
        let mut j = i + 1;
        let kind = match bytes.get(j) {
            Some(b'#') => {
                j += 1;
                MarkerKind::LoopOpen
            }
            Some(b'/') => {
                j += 1;
                MarkerKind::LoopClose
            }
            Some(b'%') => {
                j += 1;
                MarkerKind::Image
            }
            _ => MarkerKind::Scalar,
        };
        let name_start = j;
        while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_') {
            j += 1;
        }
        if j > name_start && bytes.get(j) == Some(&b'}') {
            markers.push(Marker {
                kind,
                name: text[name_start..j].to_string(),
                start: i,
                end: j + 1,
            });
            i = j + 1;
        } else {
            i += 1;
        }
    }
    markers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_all_marker_kinds() {
        let text = "<w:t>{title} {#photos}{%image}{caption}{/photos}</w:t>";
        let markers = scan_markers(text);
        let kinds: Vec<MarkerKind> = markers.iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            vec![
                MarkerKind::Scalar,
                MarkerKind::LoopOpen,
                MarkerKind::Image,
                MarkerKind::Scalar,
                MarkerKind::LoopClose,
            ]
        );
        assert_eq!(markers[1].name, "photos");
        assert_eq!(&text[markers[2].start..markers[2].end], "{%image}");
    }

    #[test]
    fn ignores_braces_without_identifiers() {
        assert!(scan_markers("{} {   } {<tag>} {un closed").is_empty());
    }

    #[test]
    fn marker_names_stop_at_non_identifier() {
        let markers = scan_markers("{a.b}");
        // "a" is followed by '.', not '}': no marker.
        assert!(markers.is_empty());
    }
}
