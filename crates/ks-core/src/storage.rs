//! Storage-root path resolution.
//!
//! Request paths are checked twice before any file is opened: a textual
//! filter rejects `..` and backslashes outright, then the candidate is
//! canonicalized (following symlinks) and must still sit under the
//! canonical root.

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Canonicalized base directory that media paths are resolved against.
#[derive(Debug, Clone)]
pub struct StorageRoot {
    root: PathBuf,
}

impl StorageRoot {
    /// Canonicalize `path` and use it as the root. The directory must exist.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let root = std::fs::canonicalize(path).map_err(|e| {
            Error::Config(format!("upload directory {} is unusable: {e}", path.display()))
        })?;
        if !root.is_dir() {
            return Err(Error::Config(format!(
                "upload directory {} is not a directory",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    /// The canonical root path.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Join request segments onto the root after the textual checks.
    ///
    /// The result is not canonicalized; pass it through
    /// [`StorageRoot::ensure_contains`] after canonicalizing.
    pub fn candidate<S: AsRef<str>>(&self, segments: &[S]) -> Result<PathBuf> {
        if segments.is_empty() {
            return Err(Error::Validation("file path is required".into()));
        }

        let joined = segments
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<&str>>()
            .join("/");
        if joined.contains("..") || joined.contains('\\') || joined.contains('\0') {
            return Err(Error::Validation("invalid file path".into()));
        }

        let mut path = self.root.clone();
        for segment in segments {
            let segment: &str = segment.as_ref();
            path.push(segment);
        }
        Ok(path)
    }

    /// Confirm that an already canonicalized path is the root or lies below it.
    pub fn ensure_contains(&self, canonical: &Path) -> Result<()> {
        if canonical.starts_with(&self.root) {
            Ok(())
        } else {
            tracing::warn!(
                path = %canonical.display(),
                root = %self.root.display(),
                "Resolved path escapes storage root"
            );
            Err(Error::Validation("invalid file path".into()))
        }
    }

    /// Blocking end-to-end resolution: textual checks, canonicalization and
    /// containment.
    pub fn resolve<S: AsRef<str>>(&self, segments: &[S]) -> Result<PathBuf> {
        let candidate = self.candidate(segments)?;
        let canonical = std::fs::canonicalize(&candidate)
            .map_err(|_| Error::not_found("file", segments_display(segments)))?;
        self.ensure_contains(&canonical)?;
        Ok(canonical)
    }
}

/// Split a URL wildcard capture into non-empty path segments.
pub fn split_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Render segments for log and error messages.
pub fn segments_display<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<&str>>()
        .join("/")
}
