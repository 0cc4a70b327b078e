use crate::static_files;
use smallvec::SmallVec;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Maximum inline headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Response headers; names compare case-insensitively.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Response body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Body {
    #[default]
    Empty,
    Text(String),
    Bytes(Vec<u8>),
    /// A file streamed in [`static_files::CHUNK_SIZE`] blocks on output.
    File(PathBuf),
}

impl Body {
    /// Whether nothing will be written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Text(s) => s.is_empty(),
            Body::Bytes(b) => b.is_empty(),
            Body::File(_) => false,
        }
    }

    /// The body as text, for in-memory bodies that hold UTF-8.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Empty => Some(""),
            Body::Text(s) => Some(s),
            Body::Bytes(b) => std::str::from_utf8(b).ok(),
            Body::File(_) => None,
        }
    }

    /// Write the body to `out`, streaming files chunk by chunk.
    ///
    /// # Errors
    ///
    /// Writing fails, or a file body cannot be read.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<u64> {
        match self {
            Body::Empty => Ok(0),
            Body::Text(s) => out.write_all(s.as_bytes()).map(|()| s.len() as u64),
            Body::Bytes(b) => out.write_all(b).map(|()| b.len() as u64),
            Body::File(path) => static_files::copy_file_chunked(path, out),
        }
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::Text(s.to_owned())
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Text(s)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Bytes(bytes)
    }
}

/// The outcome of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: HeaderVec,
    pub body: Body,
}

impl Response {
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// The body as text; empty for files and non-UTF-8 bytes.
    #[must_use]
    pub fn text(&self) -> &str {
        self.body.as_text().unwrap_or_default()
    }
}

pub(crate) fn find_header<'a>(headers: &'a HeaderVec, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

pub(crate) fn set_header(headers: &mut HeaderVec, name: &str, value: String) {
    headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    headers.push((Arc::from(name), value));
}
