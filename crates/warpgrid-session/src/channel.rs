//! Message framing on a session stream.
//!
//! A *scalar* message is a 4-byte big-endian length followed by exactly that
//! many payload bytes. Raw writes carry no framing at all. Backend processes
//! read the request header buffer as one scalar and the request body as raw
//! bytes.
//!
//! ```text
//! +----------------+---------------------------+
//! | len: u32 (BE)  | payload (len bytes)       |
//! +----------------+---------------------------+
//! ```

use std::io::{self, Read, Write};
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::error::{Result, SessionError};
use crate::stream::SessionStream;
use crate::sys;

/// Size of the scalar length prefix in bytes.
pub const SCALAR_PREFIX_LEN: usize = 4;

/// Scalar payloads are buffered in steps of at most this many bytes.
const READ_CHUNK: usize = 64 * 1024;

/// A borrowed view of a stream that reads and writes framed messages.
pub struct MessageChannel<'a, S: ?Sized> {
    stream: &'a mut S,
    cancel: &'a CancelToken,
}

impl<'a, S: ?Sized> MessageChannel<'a, S> {
    pub fn new(stream: &'a mut S, cancel: &'a CancelToken) -> Self {
        Self { stream, cancel }
    }
}

impl<S: Write + ?Sized> MessageChannel<'_, S> {
    /// Write `data` as one length-prefixed message.
    pub fn write_scalar(&mut self, data: &[u8]) -> Result<()> {
        let len = u32::try_from(data.len()).map_err(|_| {
            SessionError::io(
                "scalar message too large",
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} bytes exceeds the 4-byte length prefix", data.len()),
                ),
            )
        })?;
        sys::write_all(&mut *self.stream, &len.to_be_bytes(), self.cancel)?;
        sys::write_all(&mut *self.stream, data, self.cancel)
    }

    /// Write `data` as-is, without framing.
    pub fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        sys::write_all(&mut *self.stream, data, self.cancel)
    }
}

impl<S: Read + ?Sized> MessageChannel<'_, S> {
    /// Read one length-prefixed message.
    ///
    /// Returns `Ok(None)` if the stream ends cleanly before a prefix. A
    /// `max_size` of zero disables the size check.
    pub fn read_scalar(&mut self, max_size: usize) -> Result<Option<Vec<u8>>> {
        let mut prefix = [0u8; SCALAR_PREFIX_LEN];
        match sys::read_full(&mut *self.stream, &mut prefix, self.cancel)? {
            0 => return Ok(None),
            SCALAR_PREFIX_LEN => {}
            n => return Err(truncated("scalar length prefix", n, SCALAR_PREFIX_LEN)),
        }

        let len = u32::from_be_bytes(prefix) as usize;
        if max_size > 0 && len > max_size {
            return Err(SessionError::io(
                "reading scalar message",
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("message of {len} bytes exceeds the {max_size} byte limit"),
                ),
            ));
        }

        let mut payload = Vec::with_capacity(len.min(READ_CHUNK));
        while payload.len() < len {
            let filled = payload.len();
            let step = (len - filled).min(READ_CHUNK);
            payload.resize(filled + step, 0);
            let n = sys::read(&mut *self.stream, &mut payload[filled..], self.cancel)?;
            payload.truncate(filled + n);
            if n == 0 {
                return Err(truncated("scalar payload", filled, len));
            }
        }
        Ok(Some(payload))
    }

    /// Read whatever is available, up to `buf.len()` bytes. Returns 0 at
    /// end of stream.
    pub fn read_raw(&mut self, buf: &mut [u8]) -> Result<usize> {
        sys::read(&mut *self.stream, buf, self.cancel)
    }
}

impl<S: SessionStream + ?Sized> MessageChannel<'_, S> {
    /// Apply a read timeout. Zero disables it.
    pub fn set_read_timeout(&self, timeout: Duration) -> Result<()> {
        self.stream
            .set_read_timeout(sys::timeout_option(timeout))
            .map_err(|e| SessionError::io("cannot set the read timeout", e))
    }

    /// Apply a write timeout. Zero disables it.
    pub fn set_write_timeout(&self, timeout: Duration) -> Result<()> {
        self.stream
            .set_write_timeout(sys::timeout_option(timeout))
            .map_err(|e| SessionError::io("cannot set the write timeout", e))
    }
}

fn truncated(what: &str, got: usize, expected: usize) -> SessionError {
    SessionError::io(
        format!("reading {what}"),
        io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("stream ended after {got} of {expected} bytes"),
        ),
    )
}
