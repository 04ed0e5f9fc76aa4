//! HTTP `Range` header handling for single byte ranges.
//!
//! Only the single-range form `bytes=<start>-<end>` is accepted, with either
//! bound optional. A missing `start` defaults to `0` and a missing `end`
//! defaults to the last byte, so `bytes=-` selects the whole file and
//! `bytes=-N` selects bytes `0..=N`. Multi-range requests and any other
//! syntax are rejected.

use crate::{Error, Result};

/// An inclusive byte range `[start, end]` within a resource.
///
/// Constructed only through [`parse_range_header`], so `start <= end < size`
/// always holds for the size it was built against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered by the range.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` value for a partial response.
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}

/// `Content-Range` value accompanying a 416 response.
pub fn unsatisfiable_content_range(size: u64) -> String {
    format!("bytes */{size}")
}

/// Split a header value into its raw bounds.
///
/// Returns `None` if the value does not match `bytes=(\d*)-(\d*)` exactly or
/// a bound does not fit in a `u64`.
pub fn parse_bounds(value: &str) -> Option<(Option<u64>, Option<u64>)> {
    let bounds = value.strip_prefix("bytes=")?;
    let (start, end) = bounds.split_once('-')?;
    Some((parse_bound(start)?, parse_bound(end)?))
}

fn parse_bound(raw: &str) -> Option<Option<u64>> {
    if raw.is_empty() {
        return Some(None);
    }
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok().map(Some)
}

/// Parse and validate a `Range` header against a resource of `size` bytes.
///
/// Fails with [`Error::RangeNotSatisfiable`] if the syntax is malformed, if
/// `start > end`, or if `start >= size`. An `end` past the last byte is
/// clamped.
pub fn parse_range_header(value: &str, size: u64) -> Result<ByteRange> {
    let unsatisfiable = || Error::RangeNotSatisfiable { size };

    let (start, end) = parse_bounds(value).ok_or_else(unsatisfiable)?;
    let last = size.checked_sub(1).ok_or_else(unsatisfiable)?;

    let start = start.unwrap_or(0);
    let end = end.unwrap_or(last);

    if start > end || start >= size {
        return Err(unsatisfiable());
    }

    Ok(ByteRange {
        start,
        end: end.min(last),
    })
}
