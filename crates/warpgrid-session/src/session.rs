//! The session contract.
//!
//! A session forwards exactly one HTTP request to a backend process and
//! gives the caller the stream to read the response from. Callers drive it
//! in a fixed order:
//!
//! 1. [`send_headers`](Session::send_headers) with the encoded CGI headers;
//! 2. [`send_body_block`](Session::send_body_block), zero or more times;
//! 3. [`shutdown_writer`](Session::shutdown_writer) once the body is sent;
//! 4. read the response through [`stream_mut`](Session::stream_mut);
//! 5. drop the session (or call its explicit finish operation), which
//!    closes the stream and notifies the owning pool.
//!
//! Sessions are not thread-safe: every mutating operation takes `&mut self`
//! and a session is confined to the task handling its request.

use std::time::Duration;

use tracing::trace;

use crate::cancel::CancelToken;
use crate::channel::MessageChannel;
use crate::error::{Result, SessionError};
use crate::headers::HeaderBuffer;
use crate::stream::SessionStream;

/// Backend process identifier.
pub type ProcessId = u32;

/// Capability set shared by every session variant.
pub trait Session {
    /// The transport this session owns.
    type Stream: SessionStream;

    /// The stream, or `None` once it has been closed or discarded.
    fn stream(&self) -> Option<&Self::Stream>;

    fn stream_mut(&mut self) -> Option<&mut Self::Stream>;

    /// Cancellation observed by blocking operations.
    fn cancel_token(&self) -> &CancelToken;

    /// Set the timeout for subsequent reads. Zero disables it.
    fn set_reader_timeout(&mut self, timeout: Duration) -> Result<()>;

    /// Set the timeout for subsequent writes. Zero disables it.
    fn set_writer_timeout(&mut self, timeout: Duration) -> Result<()>;

    /// Half-close the read direction. No-op once the stream is gone.
    fn shutdown_reader(&mut self) -> Result<()>;

    /// Half-close the write direction. No-op once the stream is gone.
    fn shutdown_writer(&mut self) -> Result<()>;

    /// Close the stream. Idempotent; the stream is absent afterwards even
    /// if an error is returned.
    fn close_stream(&mut self) -> Result<()>;

    /// Give up ownership of the stream without closing it.
    fn discard_stream(&mut self) -> Option<Self::Stream>;

    /// The backend process this session talks to.
    fn pid(&self) -> ProcessId;

    fn pool_tag(&self) -> &str;

    fn set_pool_tag(&mut self, tag: String);

    /// Send the request headers as one framed message.
    ///
    /// `headers` must already be encoded as described in
    /// [`crate::headers`]. This must be the first operation on a session.
    fn send_headers(&mut self, headers: &[u8]) -> Result<()> {
        trace!(pid = self.pid(), bytes = headers.len(), "sending request headers");
        let cancel = self.cancel_token().clone();
        let stream = self.stream_mut().ok_or(SessionError::ChannelUnavailable {
            operation: "write headers to the request handler",
        })?;
        MessageChannel::new(stream, &cancel)
            .write_scalar(headers)
            .map_err(|e| e.with_context("writing headers to the request handler"))
    }

    /// Convenience shortcut for [`send_headers`](Session::send_headers).
    fn send_header_buffer(&mut self, headers: &HeaderBuffer) -> Result<()> {
        self.send_headers(headers.as_bytes())
    }

    /// Send a chunk of the request body, unframed.
    ///
    /// May be called any number of times after `send_headers`; the chunks
    /// appear on the wire back to back in call order.
    fn send_body_block(&mut self, block: &[u8]) -> Result<()> {
        trace!(pid = self.pid(), bytes = block.len(), "sending request body block");
        let cancel = self.cancel_token().clone();
        let stream = self.stream_mut().ok_or(SessionError::ChannelUnavailable {
            operation: "write a request body block to the request handler",
        })?;
        MessageChannel::new(stream, &cancel)
            .write_raw(block)
            .map_err(|e| e.with_context("sending the request body to the request handler"))
    }

    /// Whether the stream has been closed or discarded.
    fn is_stream_closed(&self) -> bool {
        self.stream().is_none()
    }
}
