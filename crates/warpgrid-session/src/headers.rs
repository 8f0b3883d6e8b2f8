//! Request header wire convention.
//!
//! Backend processes expect the request metadata (CGI-style variables such
//! as `REQUEST_METHOD` or `PATH_INFO`) as one buffer of NUL-terminated
//! name/value pairs:
//!
//! ```text
//! headers := header*
//! header  := name NUL value NUL
//! name, value := one or more bytes, none equal to NUL
//! ```
//!
//! The buffer is sent as a single framed message by
//! [`Session::send_headers`](crate::Session::send_headers).

use crate::error::HeaderError;

const NUL: u8 = 0;

/// An encoded header buffer. Every pair pushed is validated, so the bytes
/// always match the grammar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderBuffer {
    buf: Vec<u8>,
    count: usize,
}

impl HeaderBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            buf: Vec::with_capacity(bytes),
            count: 0,
        }
    }

    /// Encode a sequence of pairs, stopping at the first invalid one.
    pub fn from_pairs<I, N, V>(pairs: I) -> Result<Self, HeaderError>
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let mut headers = Self::new();
        for (name, value) in pairs {
            headers.push(name, value)?;
        }
        Ok(headers)
    }

    /// Append one `name NUL value NUL` pair.
    pub fn push(
        &mut self,
        name: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
    ) -> Result<&mut Self, HeaderError> {
        let (name, value) = (name.as_ref(), value.as_ref());
        if name.is_empty() {
            return Err(HeaderError::EmptyName);
        }
        if name.contains(&NUL) {
            return Err(HeaderError::NulInName {
                name: String::from_utf8_lossy(name).into_owned(),
            });
        }
        if value.is_empty() {
            return Err(HeaderError::EmptyValue {
                name: String::from_utf8_lossy(name).into_owned(),
            });
        }
        if value.contains(&NUL) {
            return Err(HeaderError::NulInValue {
                name: String::from_utf8_lossy(name).into_owned(),
            });
        }

        self.buf.reserve(name.len() + value.len() + 2);
        self.buf.extend_from_slice(name);
        self.buf.push(NUL);
        self.buf.extend_from_slice(value);
        self.buf.push(NUL);
        self.count += 1;
        Ok(self)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Encoded size in bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Number of name/value pairs.
    pub fn header_count(&self) -> usize {
        self.count
    }
}

impl AsRef<[u8]> for HeaderBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

/// Decode a header buffer into borrowed `(name, value)` pairs.
///
/// Strict: every token must be non-empty and NUL-terminated, and tokens
/// must come in pairs.
pub fn parse_headers(buf: &[u8]) -> Result<Vec<(&[u8], &[u8])>, HeaderError> {
    if buf.is_empty() {
        return Ok(Vec::new());
    }
    if buf.last() != Some(&NUL) {
        return Err(HeaderError::Unterminated);
    }

    let mut tokens = Vec::new();
    let mut offset = 0;
    // The trailing NUL yields one empty slice after the final split.
    for token in buf[..buf.len() - 1].split(|b| *b == NUL) {
        if token.is_empty() {
            return Err(HeaderError::EmptyToken { offset });
        }
        tokens.push(token);
        offset += token.len() + 1;
    }

    if tokens.len() % 2 != 0 {
        return Err(HeaderError::OddTokenCount);
    }
    Ok(tokens.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect())
}
