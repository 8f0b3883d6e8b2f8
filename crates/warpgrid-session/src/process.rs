//! Pool-side connector for backend processes.
//!
//! A [`BackendProcess`] describes a running application process listening
//! on a Unix socket. [`BackendProcess::connect`] opens one session to it and
//! tracks the number of sessions in flight: the count goes up on connect
//! and back down from the session's release callback.
//!
//! ```text
//! pool picks a BackendProcess
//!   → connect()            active += 1
//!     → send_headers / send_body_block / shutdown_writer
//!     → read response
//!   → drop(session)        close stream, active -= 1
//! ```

use std::io;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use crate::cancel::CancelToken;
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::headers::HeaderBuffer;
use crate::local::LocalSession;
use crate::session::{ProcessId, Session};

/// A backend application process reachable over a Unix socket.
#[derive(Debug, Clone)]
pub struct BackendProcess {
    pid: ProcessId,
    socket_path: PathBuf,
    config: SessionConfig,
    active: Arc<AtomicUsize>,
}

impl BackendProcess {
    pub fn new(pid: ProcessId, socket_path: impl Into<PathBuf>, config: SessionConfig) -> Self {
        Self {
            pid,
            socket_path: socket_path.into(),
            config,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Sessions opened and not yet released.
    pub fn active_sessions(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Open a new session to this process.
    pub fn connect(&self) -> Result<LocalSession<UnixStream>> {
        self.connect_with_cancel(CancelToken::never())
    }

    /// Open a new session whose blocking operations observe `cancel`.
    pub fn connect_with_cancel(&self, cancel: CancelToken) -> Result<LocalSession<UnixStream>> {
        if cancel.is_cancelled() {
            return Err(SessionError::cancelled(format!(
                "connecting to {}",
                self.socket_path.display()
            )));
        }

        // connect(2) is not restarted after EINTR; the interruption is a
        // transport failure like any other.
        let stream = UnixStream::connect(&self.socket_path).map_err(|e| self.connect_error(e))?;

        self.active.fetch_add(1, Ordering::AcqRel);
        let active = Arc::clone(&self.active);
        let pid = self.pid;
        // From here on the session owns the stream and the counter decrement.
        let mut session = LocalSession::new(pid, stream, move || {
            let remaining = active.fetch_sub(1, Ordering::AcqRel) - 1;
            debug!(pid, remaining, "backend session released");
        })
        .with_cancel_token(cancel);

        session.set_reader_timeout(self.config.reader_timeout)?;
        session.set_writer_timeout(self.config.writer_timeout)?;

        debug!(
            pid,
            socket = %self.socket_path.display(),
            active = self.active_sessions(),
            "backend session opened"
        );
        Ok(session)
    }

    /// Check an encoded header buffer against the configured size limit
    /// and send it.
    pub fn send_request_headers(
        &self,
        session: &mut LocalSession<UnixStream>,
        headers: &HeaderBuffer,
    ) -> Result<()> {
        if headers.len() > self.config.max_header_size {
            return Err(SessionError::io(
                "writing headers to the request handler",
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "header buffer of {} bytes exceeds the {} byte limit",
                        headers.len(),
                        self.config.max_header_size
                    ),
                ),
            ));
        }
        session.send_header_buffer(headers)
    }

    fn connect_error(&self, source: io::Error) -> SessionError {
        SessionError::io(
            format!(
                "cannot connect to backend process {} at {}",
                self.pid,
                self.socket_path.display()
            ),
            source,
        )
    }
}
