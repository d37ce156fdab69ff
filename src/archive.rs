//! # Archive Model
//!
//! In-memory representation of a ZIP container, which is what a DOCX file
//! is. We read and write the format ourselves: full control over the bytes
//! keeps the engine self-contained and makes output deterministic, which the
//! round-trip tests rely on. The ZIP spec is wordy but the subset a document
//! container needs is manageable.
//!
//! ## Container layout (simplified)
//!
//! ```text
//! [local file header][data]   <- one per member, in order
//! [local file header][data]
//! ...
//! [central directory]          <- one record per member, with offsets
//! [end of central directory]   <- points at the central directory
//! ```
//!
//! Determinism: entries serialize in insertion order, folders in sorted
//! order, and all timestamps are a fixed DOS epoch, so serializing an
//! unchanged archive twice is byte-for-byte identical.

use std::collections::{BTreeSet, HashMap};

use miniz_oxide::deflate::compress_to_vec;
use miniz_oxide::inflate::decompress_to_vec;

use crate::error::DocgenError;

const LOCAL_HEADER_SIG: u32 = 0x0403_4b50;
const CENTRAL_DIR_SIG: u32 = 0x0201_4b50;
const EOCD_SIG: u32 = 0x0605_4b50;

/// Fixed DOS date (1980-01-01) so output does not depend on wall-clock time.
const DOS_DATE: u16 = 0x0021;
const DOS_TIME: u16 = 0x0000;

/// Content of one archive member.
#[derive(Debug, Clone)]
pub enum EntryData {
    Text(String),
    Binary(Vec<u8>),
}

impl EntryData {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            EntryData::Text(s) => s.as_bytes(),
            EntryData::Binary(b) => b,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    path: String,
    data: EntryData,
}

/// An in-memory ZIP container of named text/binary entries.
#[derive(Debug, Clone, Default)]
pub struct Archive {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
    folders: BTreeSet<String>,
}

impl Archive {
    /// An empty container with no members.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a ZIP byte stream into an archive.
    ///
    /// Fails with `CorruptArchive` when the end-of-central-directory record,
    /// a central directory entry, or a local file header is malformed, or
    /// when a member's data does not decompress / match its checksum.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocgenError> {
        let eocd = find_eocd(bytes)
            .ok_or_else(|| corrupt("missing end-of-central-directory record"))?;
        let entry_count = read_u16(bytes, eocd + 10).ok_or_else(|| corrupt("truncated EOCD"))? as usize;
        let cd_offset =
            read_u32(bytes, eocd + 16).ok_or_else(|| corrupt("truncated EOCD"))? as usize;

        let mut archive = Archive::new();
        let mut pos = cd_offset;
        for _ in 0..entry_count {
            let sig = read_u32(bytes, pos).ok_or_else(|| corrupt("truncated central directory"))?;
            if sig != CENTRAL_DIR_SIG {
                return Err(corrupt("bad central directory entry signature"));
            }
            let method =
                read_u16(bytes, pos + 10).ok_or_else(|| corrupt("truncated central directory"))?;
            let crc =
                read_u32(bytes, pos + 16).ok_or_else(|| corrupt("truncated central directory"))?;
            let compressed_size = read_u32(bytes, pos + 20)
                .ok_or_else(|| corrupt("truncated central directory"))?
                as usize;
            let name_len = read_u16(bytes, pos + 28)
                .ok_or_else(|| corrupt("truncated central directory"))?
                as usize;
            let extra_len = read_u16(bytes, pos + 30)
                .ok_or_else(|| corrupt("truncated central directory"))?
                as usize;
            let comment_len = read_u16(bytes, pos + 32)
                .ok_or_else(|| corrupt("truncated central directory"))?
                as usize;
            let local_offset = read_u32(bytes, pos + 42)
                .ok_or_else(|| corrupt("truncated central directory"))?
                as usize;
            let name_bytes = bytes
                .get(pos + 46..pos + 46 + name_len)
                .ok_or_else(|| corrupt("truncated entry name"))?;
            let name = String::from_utf8(name_bytes.to_vec())
                .map_err(|_| corrupt("entry name is not valid UTF-8"))?;
            pos += 46 + name_len + extra_len + comment_len;

            if name.ends_with('/') {
                archive.folders.insert(name);
                continue;
            }

            let data = read_member_data(bytes, local_offset, compressed_size, method, &name)?;
            if crc32(&data) != crc {
                return Err(corrupt(&format!("checksum mismatch in '{name}'")));
            }
            archive.insert(name, EntryData::Binary(data));
        }

        Ok(archive)
    }

    /// Store a text entry, replacing any existing entry at `path`.
    pub fn set_text(&mut self, path: &str, content: impl Into<String>) {
        self.insert(path.to_string(), EntryData::Text(content.into()));
    }

    /// Store a binary entry, replacing any existing entry at `path`.
    pub fn set_binary(&mut self, path: &str, content: Vec<u8>) {
        self.insert(path.to_string(), EntryData::Binary(content));
    }

    /// Entry content as text, if present and valid UTF-8.
    pub fn get_text(&self, path: &str) -> Option<String> {
        let entry = self.get(path)?;
        match entry {
            EntryData::Text(s) => Some(s.clone()),
            EntryData::Binary(b) => String::from_utf8(b.clone()).ok(),
        }
    }

    /// Entry content as raw bytes, if present.
    pub fn get_bytes(&self, path: &str) -> Option<&[u8]> {
        self.get(path).map(EntryData::as_bytes)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// Register a folder. Idempotent; a trailing slash is added if missing.
    pub fn ensure_folder(&mut self, path: &str) {
        let normalized = if path.ends_with('/') {
            path.to_string()
        } else {
            format!("{path}/")
        };
        self.folders.insert(normalized);
    }

    /// Whether a folder exists, either registered explicitly or implied by
    /// an entry path beneath the prefix.
    pub fn has_folder(&self, path: &str) -> bool {
        let normalized = if path.ends_with('/') {
            path.to_string()
        } else {
            format!("{path}/")
        };
        self.folders.contains(&normalized)
            || self.entries.iter().any(|e| e.path.starts_with(&normalized))
    }

    /// Entry paths in insertion order (folders not included).
    pub fn entry_paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.path.as_str())
    }

    /// Serialize to ZIP bytes. Deterministic for an unchanged archive.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out: Vec<u8> = Vec::new();
        let mut central: Vec<u8> = Vec::new();
        let mut member_count = 0u16;

        for folder in &self.folders {
            let offset = out.len() as u32;
            write_local_header(&mut out, folder, 0, 0, 0, 0);
            write_central_record(&mut central, folder, 0, 0, 0, 0, offset);
            member_count += 1;
        }

        for entry in &self.entries {
            let data = entry.data.as_bytes();
            let crc = crc32(data);
            // Deflate unless it doesn't actually help (tiny or incompressible
            // members are stored raw).
            let compressed = compress_to_vec(data, 6);
            let (method, payload): (u16, &[u8]) = if compressed.len() < data.len() {
                (8, &compressed)
            } else {
                (0, data)
            };
            let offset = out.len() as u32;
            write_local_header(&mut out, &entry.path, method, crc, payload.len() as u32, data.len() as u32);
            out.extend_from_slice(payload);
            write_central_record(
                &mut central,
                &entry.path,
                method,
                crc,
                payload.len() as u32,
                data.len() as u32,
                offset,
            );
            member_count += 1;
        }

        let cd_offset = out.len() as u32;
        let cd_size = central.len() as u32;
        out.extend_from_slice(&central);

        // End of central directory.
        push_u32(&mut out, EOCD_SIG);
        push_u16(&mut out, 0); // disk number
        push_u16(&mut out, 0); // disk with central directory
        push_u16(&mut out, member_count);
        push_u16(&mut out, member_count);
        push_u32(&mut out, cd_size);
        push_u32(&mut out, cd_offset);
        push_u16(&mut out, 0); // comment length

        out
    }

    fn get(&self, path: &str) -> Option<&EntryData> {
        self.index.get(path).map(|&i| &self.entries[i].data)
    }

    fn insert(&mut self, path: String, data: EntryData) {
        if let Some(&i) = self.index.get(&path) {
            self.entries[i].data = data;
        } else {
            self.index.insert(path.clone(), self.entries.len());
            self.entries.push(Entry { path, data });
        }
    }
}

fn read_member_data(
    bytes: &[u8],
    local_offset: usize,
    compressed_size: usize,
    method: u16,
    name: &str,
) -> Result<Vec<u8>, DocgenError> {
    let sig = read_u32(bytes, local_offset).ok_or_else(|| corrupt("truncated local file header"))?;
    if sig != LOCAL_HEADER_SIG {
        return Err(corrupt(&format!("bad local file header for '{name}'")));
    }
    let name_len = read_u16(bytes, local_offset + 26)
        .ok_or_else(|| corrupt("truncated local file header"))? as usize;
    let extra_len = read_u16(bytes, local_offset + 28)
        .ok_or_else(|| corrupt("truncated local file header"))? as usize;
    let data_start = local_offset + 30 + name_len + extra_len;
    let raw = bytes
        .get(data_start..data_start + compressed_size)
        .ok_or_else(|| corrupt(&format!("truncated data for '{name}'")))?;

    match method {
        0 => Ok(raw.to_vec()),
        8 => decompress_to_vec(raw)
            .map_err(|_| corrupt(&format!("corrupt deflate stream in '{name}'"))),
        other => Err(corrupt(&format!(
            "unsupported compression method {other} in '{name}'"
        ))),
    }
}

/// Locate the end-of-central-directory record by scanning back from the end.
/// The record is 22 bytes plus an optional comment of up to 64 KiB.
fn find_eocd(bytes: &[u8]) -> Option<usize> {
    if bytes.len() < 22 {
        return None;
    }
    let floor = bytes.len().saturating_sub(22 + u16::MAX as usize);
    (floor..=bytes.len() - 22)
        .rev()
        .find(|&i| read_u32(bytes, i) == Some(EOCD_SIG))
}

fn write_local_header(
    out: &mut Vec<u8>,
    name: &str,
    method: u16,
    crc: u32,
    compressed_size: u32,
    uncompressed_size: u32,
) {
    push_u32(out, LOCAL_HEADER_SIG);
    push_u16(out, 20); // version needed to extract
    push_u16(out, 0); // general purpose flags
    push_u16(out, method);
    push_u16(out, DOS_TIME);
    push_u16(out, DOS_DATE);
    push_u32(out, crc);
    push_u32(out, compressed_size);
    push_u32(out, uncompressed_size);
    push_u16(out, name.len() as u16);
    push_u16(out, 0); // extra field length
    out.extend_from_slice(name.as_bytes());
}

#[allow(clippy::too_many_arguments)]
fn write_central_record(
    out: &mut Vec<u8>,
    name: &str,
    method: u16,
    crc: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    local_offset: u32,
) {
    push_u32(out, CENTRAL_DIR_SIG);
    push_u16(out, 20); // version made by
    push_u16(out, 20); // version needed to extract
    push_u16(out, 0); // general purpose flags
    push_u16(out, method);
    push_u16(out, DOS_TIME);
    push_u16(out, DOS_DATE);
    push_u32(out, crc);
    push_u32(out, compressed_size);
    push_u32(out, uncompressed_size);
    push_u16(out, name.len() as u16);
    push_u16(out, 0); // extra field length
    push_u16(out, 0); // comment length
    push_u16(out, 0); // disk number start
    push_u16(out, 0); // internal attributes
    push_u32(out, 0); // external attributes
    push_u32(out, local_offset);
    out.extend_from_slice(name.as_bytes());
}

fn push_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn read_u16(bytes: &[u8], pos: usize) -> Option<u16> {
    Some(u16::from_le_bytes(bytes.get(pos..pos + 2)?.try_into().ok()?))
}

fn read_u32(bytes: &[u8], pos: usize) -> Option<u32> {
    Some(u32::from_le_bytes(bytes.get(pos..pos + 4)?.try_into().ok()?))
}

/// CRC-32 (IEEE 802.3), bitwise. Document members are small enough that a
/// lookup table isn't worth carrying.
pub(crate) fn crc32(data: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
        }
    }
    !crc
}

fn corrupt(detail: &str) -> DocgenError {
    DocgenError::CorruptArchive(detail.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_archive() -> Archive {
        let mut archive = Archive::new();
        archive.set_text("[Content_Types].xml", "<Types/>");
        archive.ensure_folder("word");
        archive.set_text("word/document.xml", "<w:document>hello</w:document>");
        archive.set_binary("word/media/image1.png", vec![0x89, 0x50, 0x4E, 0x47, 1, 2, 3]);
        archive
    }

    #[test]
    fn crc32_known_vector() {
        // Standard check value for "123456789".
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn round_trip_preserves_entries() {
        let archive = sample_archive();
        let bytes = archive.to_bytes();
        let loaded = Archive::from_bytes(&bytes).unwrap();

        assert_eq!(
            loaded.get_text("word/document.xml").unwrap(),
            "<w:document>hello</w:document>"
        );
        assert_eq!(
            loaded.get_bytes("word/media/image1.png").unwrap(),
            &[0x89, 0x50, 0x4E, 0x47, 1, 2, 3]
        );
        assert!(loaded.has_folder("word"));
    }

    #[test]
    fn serialization_is_deterministic() {
        let archive = sample_archive();
        let first = archive.to_bytes();
        let second = archive.to_bytes();
        assert_eq!(first, second);

        // Parsing the output and serializing again reproduces the exact
        // bytes, not merely a stable-but-different stream.
        let reloaded = Archive::from_bytes(&first).unwrap();
        assert_eq!(reloaded.to_bytes(), first);
    }

    #[test]
    fn set_replaces_in_place_keeping_order() {
        let mut archive = sample_archive();
        archive.set_text("[Content_Types].xml", "<Types>v2</Types>");
        let paths: Vec<&str> = archive.entry_paths().collect();
        assert_eq!(paths[0], "[Content_Types].xml");
        assert_eq!(archive.get_text("[Content_Types].xml").unwrap(), "<Types>v2</Types>");
    }

    #[test]
    fn garbage_bytes_are_corrupt() {
        let err = Archive::from_bytes(b"this is not a zip file at all......").unwrap_err();
        assert!(matches!(err, DocgenError::CorruptArchive(_)));
    }

    #[test]
    fn truncated_archive_is_corrupt() {
        let bytes = sample_archive().to_bytes();
        let err = Archive::from_bytes(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, DocgenError::CorruptArchive(_)));
    }

    #[test]
    fn folder_queries() {
        let mut archive = Archive::new();
        archive.ensure_folder("word/media");
        archive.ensure_folder("word/media"); // idempotent
        assert!(archive.has_folder("word/media"));
        assert!(archive.has_folder("word/media/"));
        assert!(!archive.has_folder("word/embeddings"));

        // Implied by entry prefix, even without explicit registration.
        archive.set_text("word/_rels/document.xml.rels", "<Relationships/>");
        assert!(archive.has_folder("word/_rels"));
    }

    #[test]
    fn incompressible_member_is_stored_raw() {
        let mut archive = Archive::new();
        // 7 bytes of high-entropy data: deflate can only grow it.
        archive.set_binary("word/media/blob.bin", vec![0xA7, 0x3F, 0x91, 0x04, 0xDD, 0x5B, 0xE0]);
        let bytes = archive.to_bytes();
        let loaded = Archive::from_bytes(&bytes).unwrap();
        assert_eq!(
            loaded.get_bytes("word/media/blob.bin").unwrap(),
            &[0xA7, 0x3F, 0x91, 0x04, 0xDD, 0x5B, 0xE0]
        );
    }
}
