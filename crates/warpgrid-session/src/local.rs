//! Session over a locally owned stream.
//!
//! [`LocalSession`] owns the socket connected to a backend process together
//! with the pool's release callback. Dropping it closes the socket (unless
//! it was discarded) and then fires the callback exactly once.

use std::fmt;
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::cancel::CancelToken;
use crate::channel::MessageChannel;
use crate::error::{Result, SessionError};
use crate::session::{ProcessId, Session};
use crate::stream::SessionStream;
use crate::sys;

/// Invoked once when a session gives up its resources.
pub type ReleaseCallback = Box<dyn FnOnce() + Send + 'static>;

/// A session owning its stream directly.
pub struct LocalSession<S: SessionStream = UnixStream> {
    pid: ProcessId,
    stream: Option<S>,
    /// Taken on first release; `None` means the callback already ran.
    release: Option<ReleaseCallback>,
    pool_tag: String,
    cancel: CancelToken,
}

impl<S: SessionStream> LocalSession<S> {
    /// Wrap an open stream. Performs no I/O.
    pub fn new(pid: ProcessId, stream: S, release: impl FnOnce() + Send + 'static) -> Self {
        trace!(pid, fd = stream.raw_fd(), "session created");
        Self {
            pid,
            stream: Some(stream),
            release: Some(Box::new(release)),
            pool_tag: String::new(),
            cancel: CancelToken::never(),
        }
    }

    /// Observe `cancel` in every blocking operation.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// End the session: close the stream, then fire the release callback.
    ///
    /// Unlike dropping, this reports a close failure to the caller. The
    /// callback runs either way.
    pub fn finish(mut self) -> Result<()> {
        let result = self.close_stream();
        self.release();
        result
    }

    /// Whether the release callback has already run.
    pub fn is_released(&self) -> bool {
        self.release.is_none()
    }

    fn release(&mut self) {
        if let Some(callback) = self.release.take() {
            debug!(pid = self.pid, pool_tag = %self.pool_tag, "releasing session");
            callback();
        }
    }

    fn shutdown(&mut self, how: Shutdown, direction: &str) -> Result<()> {
        let Some(stream) = self.stream.as_ref() else {
            return Ok(());
        };
        trace!(pid = self.pid, direction, "shutting down session stream");
        sys::shutdown(stream, how, &self.cancel)
            .map_err(|e| e.with_context(format!("cannot shutdown the {direction} stream")))
    }
}

impl<S: SessionStream> Session for LocalSession<S> {
    type Stream = S;

    fn stream(&self) -> Option<&S> {
        self.stream.as_ref()
    }

    fn stream_mut(&mut self) -> Option<&mut S> {
        self.stream.as_mut()
    }

    fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    fn set_reader_timeout(&mut self, timeout: Duration) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(SessionError::ChannelUnavailable {
            operation: "set the reader timeout",
        })?;
        MessageChannel::new(stream, &self.cancel)
            .set_read_timeout(timeout)
            .map_err(|e| e.with_context("cannot set the reader timeout of the session stream"))
    }

    fn set_writer_timeout(&mut self, timeout: Duration) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(SessionError::ChannelUnavailable {
            operation: "set the writer timeout",
        })?;
        MessageChannel::new(stream, &self.cancel)
            .set_write_timeout(timeout)
            .map_err(|e| e.with_context("cannot set the writer timeout of the session stream"))
    }

    fn shutdown_reader(&mut self) -> Result<()> {
        self.shutdown(Shutdown::Read, "reader")
    }

    fn shutdown_writer(&mut self) -> Result<()> {
        self.shutdown(Shutdown::Write, "writer")
    }

    fn close_stream(&mut self) -> Result<()> {
        // Taken before closing so a failed close is never retried.
        let Some(stream) = self.stream.take() else {
            return Ok(());
        };
        let fd = stream.raw_fd();
        stream.close().map_err(sys::close_error)?;
        debug!(pid = self.pid, fd, "session stream closed");
        Ok(())
    }

    fn discard_stream(&mut self) -> Option<S> {
        let stream = self.stream.take();
        if let Some(stream) = &stream {
            debug!(pid = self.pid, fd = stream.raw_fd(), "session stream discarded");
        }
        stream
    }

    fn pid(&self) -> ProcessId {
        self.pid
    }

    fn pool_tag(&self) -> &str {
        &self.pool_tag
    }

    fn set_pool_tag(&mut self, tag: String) {
        self.pool_tag = tag;
    }
}

impl<S: SessionStream> Drop for LocalSession<S> {
    fn drop(&mut self) {
        if let Err(e) = self.close_stream() {
            warn!(pid = self.pid, error = %e, "failed to close session stream during teardown");
        }
        self.release();
    }
}

impl<S: SessionStream> fmt::Debug for LocalSession<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSession")
            .field("pid", &self.pid)
            .field("fd", &self.stream.as_ref().and_then(|s| s.raw_fd()))
            .field("open", &self.stream.is_some())
            .field("released", &self.is_released())
            .field("pool_tag", &self.pool_tag)
            .finish()
    }
}
