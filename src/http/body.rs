//! Captured body buffers and charset resolution.
//!
//! A `CapturedBody` is the logged copy of one request or response body.
//! It is append-only, optionally capped, and decodes with the charset the
//! message declared in its `Content-Type` header.

use std::borrow::Cow;

use axum::http::{header, HeaderMap};
use encoding_rs::{Encoding, REPLACEMENT, UTF_8};

/// Default cap for the logged copy of a request body (1 MiB).
pub const DEFAULT_MAX_PAYLOAD: usize = 1024 * 1024;

/// Default limit on an accepted request body (16 MiB).
pub const DEFAULT_MAX_BODY: usize = 16 * 1024 * 1024;

/// Append-only byte buffer plus the encoding used to render it as text.
#[derive(Debug)]
pub struct CapturedBody {
    buf: Vec<u8>,
    limit: Option<usize>,
    dropped: usize,
    encoding: &'static Encoding,
}

impl CapturedBody {
    /// A buffer that keeps at most `limit` bytes and silently drops the rest.
    pub fn bounded(limit: usize, encoding: &'static Encoding) -> Self {
        Self {
            buf: Vec::new(),
            limit: Some(limit),
            dropped: 0,
            encoding,
        }
    }

    /// A buffer that keeps everything.
    pub fn unbounded(encoding: &'static Encoding) -> Self {
        Self {
            buf: Vec::new(),
            limit: None,
            dropped: 0,
            encoding,
        }
    }

    /// Mirror a chunk into the buffer, up to the cap.
    pub fn append(&mut self, chunk: &[u8]) {
        let room = match self.limit {
            Some(limit) => limit.saturating_sub(self.buf.len()),
            None => chunk.len(),
        };
        let take = room.min(chunk.len());
        self.buf.extend_from_slice(&chunk[..take]);
        self.dropped += chunk.len() - take;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// True when bytes were dropped because of the cap.
    pub fn is_truncated(&self) -> bool {
        self.dropped > 0
    }

    pub fn dropped_bytes(&self) -> usize {
        self.dropped
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Decode the captured bytes. Empty is `""`; malformed sequences are
    /// replaced rather than reported.
    pub fn text(&self) -> Cow<'_, str> {
        if self.buf.is_empty() {
            return Cow::Borrowed("");
        }
        self.encoding.decode_without_bom_handling(&self.buf).0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Resolve the charset declared by a message's `Content-Type`.
///
/// Missing, blank, unknown or unsupported labels all resolve to UTF-8.
pub fn resolve_charset(headers: &HeaderMap) -> &'static Encoding {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(charset_param)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .filter(|encoding| *encoding != REPLACEMENT)
        .unwrap_or(UTF_8)
}

fn charset_param(content_type: &str) -> Option<&str> {
    content_type
        .split(';')
        .skip(1)
        .find_map(|param| {
            let (name, value) = param.split_once('=')?;
            name.trim()
                .eq_ignore_ascii_case("charset")
                .then(|| value.trim().trim_matches('"'))
        })
        .filter(|label| !label.is_empty())
}
