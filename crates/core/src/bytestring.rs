//! Counted byte strings.
//!
//! [`ByteString`] is the immutable counted byte sequence used throughout the
//! wire protocol (property values, svndiff `new_data`, commit bodies). It may
//! contain NULs and is not required to be valid UTF-8. [`ByteBuf`] is the
//! mutable, growable counterpart with amortized append.

use bytes::Bytes;
use std::fmt;

/// An immutable counted byte string. Cheap to clone (`Bytes` is refcounted).
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct ByteString(Bytes);

impl ByteString {
    /// The empty byte string. Distinct from "absent" at the call site —
    /// callers distinguish the two with `Option<ByteString>`.
    pub fn empty() -> Self {
        Self(Bytes::new())
    }

    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Build from a NUL-terminated C-style byte slice, stopping at the first
    /// NUL (or the end of `bytes`, whichever comes first).
    pub fn from_cstr(bytes: &[u8]) -> Self {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Self(Bytes::copy_from_slice(&bytes[..end]))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `memcmp`-style comparison: first by length, then by content.
    pub fn compare(&self, other: &ByteString) -> std::cmp::Ordering {
        self.0.len().cmp(&other.0.len()).then_with(|| self.0.cmp(&other.0))
    }

    /// Best-effort UTF-8 view, lossily replacing invalid sequences.
    pub fn to_string_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl From<&str> for ByteString {
    fn from(s: &str) -> Self {
        Self(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for ByteString {
    fn from(s: String) -> Self {
        Self(Bytes::from(s.into_bytes()))
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(v: Vec<u8>) -> Self {
        Self(Bytes::from(v))
    }
}

impl AsRef<[u8]> for ByteString {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for ByteString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteString({:?})", self.to_string_lossy())
    }
}

/// A growable byte buffer with doubling growth, the mutable counterpart of
/// [`ByteString`]. All mutating operations live here; `ByteString` is
/// immutable from the consumer's point of view.
#[derive(Clone, Default)]
pub struct ByteBuf {
    data: Vec<u8>,
}

impl ByteBuf {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            data: Vec::with_capacity(cap),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Append bytes, growing capacity by doubling (amortized O(1) per byte,
    /// matching the growth policy of `svn_stringbuf_t`).
    pub fn append_bytes(&mut self, bytes: &[u8]) {
        let needed = self.data.len() + bytes.len();
        if needed > self.data.capacity() {
            let mut new_cap = self.data.capacity().max(1);
            while new_cap < needed {
                new_cap *= 2;
            }
            self.data.reserve(new_cap - self.data.len());
        }
        self.data.extend_from_slice(bytes);
    }

    pub fn append_str(&mut self, s: &str) {
        self.append_bytes(s.as_bytes());
    }

    pub fn append_cstr(&mut self, s: &[u8]) {
        let end = s.iter().position(|&b| b == 0).unwrap_or(s.len());
        self.append_bytes(&s[..end]);
    }

    /// Fill `count` bytes with `byte`.
    pub fn fill(&mut self, byte: u8, count: usize) {
        self.data.resize(self.data.len() + count, byte);
    }

    /// Index of the first non-whitespace byte, if any.
    pub fn find_nonwhitespace(&self) -> Option<usize> {
        self.data.iter().position(|b| !b.is_ascii_whitespace())
    }

    /// Return a copy with leading/trailing ASCII whitespace removed.
    pub fn strip_whitespace(&self) -> ByteBuf {
        let start = self
            .data
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .unwrap_or(self.data.len());
        let end = self
            .data
            .iter()
            .rposition(|b| !b.is_ascii_whitespace())
            .map(|p| p + 1)
            .unwrap_or(start);
        ByteBuf {
            data: self.data[start..end].to_vec(),
        }
    }

    /// Index of the last occurrence of `ch`, searching backward.
    pub fn rfind_char(&self, ch: u8) -> Option<usize> {
        self.data.iter().rposition(|&b| b == ch)
    }

    /// Truncate to and including the last occurrence of `ch`; a no-op if
    /// `ch` is absent.
    pub fn chop_to_char(&mut self, ch: u8) {
        if let Some(pos) = self.rfind_char(ch) {
            self.data.truncate(pos + 1);
        }
    }

    pub fn duplicate(&self) -> ByteBuf {
        self.clone()
    }

    pub fn to_byte_string(&self) -> ByteString {
        ByteString::from_bytes(self.data.clone())
    }
}

impl From<ByteBuf> for ByteString {
    fn from(buf: ByteBuf) -> Self {
        ByteString::from_bytes(buf.data)
    }
}

impl fmt::Debug for ByteBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteBuf({:?})", String::from_utf8_lossy(&self.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_vs_absent() {
        let empty = ByteString::empty();
        assert!(empty.is_empty());
        let absent: Option<ByteString> = None;
        assert!(absent.is_none());
    }

    #[test]
    fn test_compare() {
        let a = ByteString::from("abc");
        let b = ByteString::from("abd");
        assert_eq!(a.compare(&a), std::cmp::Ordering::Equal);
        assert_eq!(a.compare(&b), std::cmp::Ordering::Less);
    }

    #[test]
    fn test_append_amortized_growth() {
        let mut buf = ByteBuf::new();
        for _ in 0..1000 {
            buf.append_str("x");
        }
        assert_eq!(buf.len(), 1000);
    }

    #[test]
    fn test_chop_to_char() {
        let mut buf = ByteBuf::new();
        buf.append_str("trunk/src/main.rs");
        buf.chop_to_char(b'/');
        assert_eq!(buf.as_slice(), b"trunk/src/");
    }

    #[test]
    fn test_strip_whitespace() {
        let mut buf = ByteBuf::new();
        buf.append_str("  hello world  \n");
        let stripped = buf.strip_whitespace();
        assert_eq!(stripped.as_slice(), b"hello world");
    }

    #[test]
    fn test_from_cstr_stops_at_nul() {
        let bs = ByteString::from_cstr(b"hello\0world");
        assert_eq!(bs.as_bytes(), b"hello");
    }
}
