//! Resource classification: deciding the file extension (and from it the
//! MIME type) of an image or media payload from its path and inline data.

use crate::error::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

/// Pre-encoded images declare their own type: `image/<token>;`.
static DATA_IMAGE_TYPE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"image/(\w+);").unwrap());

/// Marker for inline SVG payloads (matched case-insensitively).
const SVG_MARKER: &str = "image/svg+xml";

/// Extension used when nothing else can be derived.
pub const DEFAULT_IMAGE_EXTENSION: &str = "png";

/// Determine an image extension.
///
/// 1. From the path: last segment, query and fragment stripped, text after
///    the last `.`; `png` when empty.
/// 2. Inline data declaring `image/<token>;` overrides the path.
/// 3. Inline data mentioning `image/svg+xml` yields `svg`.
pub fn image_extension(data: Option<&str>, path: Option<&str>) -> String {
    let mut extension = extension_from_path(path.unwrap_or_default());

    if let Some(data) = data.filter(|d| !d.is_empty()) {
        if let Some(caps) = DATA_IMAGE_TYPE_REGEX.captures(data) {
            extension = caps[1].to_string();
        } else if data.to_lowercase().contains(SVG_MARKER) {
            extension = "svg".to_string();
        }
    }

    extension
}

/// Determine an audio/video extension.
///
/// Inline data wins: the MIME subtype before the first `;`. Otherwise the
/// text after the last `.` of the path. There is no `image/<token>;` or SVG
/// override here.
pub fn media_extension(data: Option<&str>, path: Option<&str>) -> String {
    match data.filter(|d| !d.is_empty()) {
        Some(data) => data
            .split(';')
            .next()
            .and_then(|mime| mime.split('/').nth(1))
            .unwrap_or_default()
            .to_string(),
        None => path
            .unwrap_or_default()
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

/// MIME type recorded for an image extension.
pub fn image_mime(extension: &str) -> String {
    match extension {
        "svg" => "image/svg+xml".to_string(),
        other => format!("image/{}", other),
    }
}

/// Reject inline data that lacks the `base64,` header.
pub fn require_base64_header(data: &str) -> Result<()> {
    if data.to_lowercase().contains("base64,") {
        Ok(())
    } else {
        Err(Error::MissingBase64Header(preview(data)))
    }
}

fn preview(data: &str) -> String {
    data.chars().take(32).collect()
}

fn extension_from_path(path: &str) -> String {
    let file = path.rsplit('/').next().unwrap_or_default();
    let file = file.split('?').next().unwrap_or_default();
    let ext = file.rsplit('.').next().unwrap_or_default();
    let ext = ext.split('#').next().unwrap_or_default();

    if ext.is_empty() {
        DEFAULT_IMAGE_EXTENSION.to_string()
    } else {
        ext.to_string()
    }
}
