//! Single `Range: bytes=` header parsing.

use thiserror::Error;

/// Inclusive byte range within a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered; never zero.
    pub fn byte_len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` value for this range of a `size` byte resource.
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    /// Not of the form `bytes=<digits?>-<digits?>`.
    #[error("malformed range header {0:?}")]
    Malformed(String),

    /// Well formed but outside the resource, inverted, or multipart.
    #[error("range not satisfiable")]
    Unsatisfiable,
}

/// Parse a `Range` header value against a resource of `size` bytes.
///
/// An empty start means 0 and an empty end means the last byte, so
/// `bytes=-N` selects `0..=N` rather than a suffix. An end past the last
/// byte is unsatisfiable, not clamped.
pub fn parse_range(header: &str, size: u64) -> Result<ByteRange, RangeError> {
    let malformed = || RangeError::Malformed(header.to_string());

    let spec = header.trim().strip_prefix("bytes=").ok_or_else(malformed)?;
    if spec.contains(',') {
        return Err(RangeError::Unsatisfiable);
    }
    let (start, end) = spec.split_once('-').ok_or_else(malformed)?;

    let start = match parse_bound(start).ok_or_else(malformed)? {
        Some(start) => start,
        None => 0,
    };
    let end = match parse_bound(end).ok_or_else(malformed)? {
        Some(end) => end,
        None => size.checked_sub(1).ok_or(RangeError::Unsatisfiable)?,
    };

    if start >= size || end >= size || start > end {
        return Err(RangeError::Unsatisfiable);
    }

    Ok(ByteRange { start, end })
}

/// `Some(None)` for an empty bound, `None` when it is not all digits.
fn parse_bound(s: &str) -> Option<Option<u64>> {
    let s = s.trim();
    if s.is_empty() {
        return Some(None);
    }
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok().map(Some)
}
