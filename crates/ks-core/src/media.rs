//! Media type allow-list.
//!
//! [`MimeTable`] maps lower-case file extensions to the MIME types keepsake is
//! willing to serve. The table is fixed: SVG is never served (scripts can be
//! embedded in it) and formats the uploader does not accept (`avif`, `mkv`)
//! are left out even if such files end up in the upload directory.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Number of leading bytes read when sniffing a file's signature.
pub const SIGNATURE_SNIFF_LEN: usize = 512;

/// The fixed extension to MIME mapping.
const ALLOWED: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("mp4", "video/mp4"),
    ("mov", "video/quicktime"),
    ("avi", "video/x-msvideo"),
    ("webm", "video/webm"),
];

/// Broad category of a served media file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a MIME type by its top-level type.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.split('/').next() {
            Some("image") => Some(MediaKind::Image),
            Some("video") => Some(MediaKind::Video),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable extension to MIME lookup, built once at startup.
#[derive(Debug, Clone)]
pub struct MimeTable {
    by_extension: HashMap<&'static str, &'static str>,
}

impl Default for MimeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MimeTable {
    /// Build the table from the fixed allow-list.
    pub fn new() -> Self {
        Self {
            by_extension: ALLOWED.iter().copied().collect(),
        }
    }

    /// Look up a MIME type by extension (case-insensitive, without the dot).
    pub fn lookup(&self, extension: &str) -> Option<&'static str> {
        self.by_extension
            .get(extension.to_ascii_lowercase().as_str())
            .copied()
    }

    /// Look up the MIME type for a path by its extension.
    pub fn for_path(&self, path: &Path) -> Option<&'static str> {
        let ext = path.extension()?.to_str()?;
        self.lookup(ext)
    }

    /// Number of allow-listed extensions.
    pub fn len(&self) -> usize {
        self.by_extension.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_extension.is_empty()
    }
}

/// Check a file's leading bytes against the MIME type its extension claims.
///
/// Returns `true` when the content is consistent with the claim: either the
/// signature is unrecognized, or it identifies a type of the same
/// [`MediaKind`]. A JPEG stored as `.png` passes; a PDF or HTML document
/// stored as `.jpg` does not.
pub fn signature_matches(head: &[u8], claimed_mime: &str) -> bool {
    let Some(detected) = infer::get(head) else {
        return true;
    };
    let detected_kind = MediaKind::from_mime(detected.mime_type());
    let claimed_kind = MediaKind::from_mime(claimed_mime);
    let ok = detected_kind.is_some() && detected_kind == claimed_kind;
    if !ok {
        tracing::debug!(
            detected = detected.mime_type(),
            claimed = claimed_mime,
            "Signature does not match extension"
        );
    }
    ok
}
