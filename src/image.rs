//! # Image Token Normalization
//!
//! The capture UI hands us signature and photo payloads as either bare
//! base64 strings or full data URLs. Everything is normalized into an
//! [`ImageToken`]: decoded bytes plus a MIME type sniffed from the magic
//! bytes. A token is only ever produced from decodable input: a missing or
//! broken image yields `None`, never an empty-but-unusable value, so the
//! renderer can trust every token it sees.

use std::io::Cursor;

use base64::Engine;

/// Raster formats a document container can embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMime {
    Png,
    Jpeg,
}

impl ImageMime {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageMime::Png => "image/png",
            ImageMime::Jpeg => "image/jpeg",
        }
    }

    /// File extension used for archive media members.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageMime::Png => "png",
            ImageMime::Jpeg => "jpeg",
        }
    }
}

/// A normalized, decodable image ready for embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageToken {
    pub mime: ImageMime,
    pub bytes: Vec<u8>,
}

impl ImageToken {
    /// Normalize a source string into a token.
    ///
    /// Accepted forms:
    /// - `data:image/...;base64,...` data URL
    /// - raw base64-encoded PNG or JPEG bytes
    ///
    /// Returns `None` for empty input, undecodable base64, or bytes that are
    /// neither PNG nor JPEG. The MIME type always comes from the magic
    /// bytes, not from the data-URL prefix, so a mislabeled URL still
    /// normalizes correctly.
    pub fn normalize(src: &str) -> Option<ImageToken> {
        let src = src.trim();
        if src.is_empty() {
            return None;
        }

        let b64 = if src.starts_with("data:") {
            let comma = src.find(',')?;
            &src[comma + 1..]
        } else {
            src
        };

        let bytes = base64::engine::general_purpose::STANDARD.decode(b64).ok()?;
        let mime = sniff_mime(&bytes)?;
        Some(ImageToken { mime, bytes })
    }

    /// Canonical data-URL form of the token.
    pub fn to_data_url(&self) -> String {
        let b64 = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{}", self.mime.as_str(), b64)
    }

    /// Pixel dimensions, when the payload can be probed. Embedding never
    /// requires this; it only improves the display box's aspect ratio.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        image::io::Reader::new(Cursor::new(&self.bytes))
            .with_guessed_format()
            .ok()?
            .into_dimensions()
            .ok()
    }
}

fn sniff_mime(data: &[u8]) -> Option<ImageMime> {
    if is_png(data) {
        Some(ImageMime::Png)
    } else if is_jpeg(data) {
        Some(ImageMime::Jpeg)
    } else {
        None
    }
}

fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

fn is_png(data: &[u8]) -> bool {
    data.len() >= 4 && data[0] == 0x89 && data[1] == 0x50 && data[2] == 0x4E && data[3] == 0x47
}

/// A valid 1x1 red PNG as base64, for tests across the crate.
#[cfg(test)]
pub(crate) fn tiny_png_base64() -> String {
    let mut img = image::RgbaImage::new(1, 1);
    img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(encoder, img.as_raw(), 1, 1, image::ColorType::Rgba8).unwrap();
    base64::engine::general_purpose::STANDARD.encode(&buf)
}
