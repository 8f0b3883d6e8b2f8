//! Session error types.

use std::io;

use thiserror::Error;

/// Errors raised by session operations.
///
/// A cancellation is never reported as `Transport`, and a deferred write
/// failure surfaced by `close(2)` is reported as `PendingWriteFailed`.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The stream has already been closed or discarded.
    #[error("cannot {operation}: the session stream has already been closed or discarded")]
    ChannelUnavailable { operation: &'static str },

    /// An I/O call on the stream failed.
    #[error("{context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: io::Error,
    },

    /// A reader or writer timeout expired.
    #[error("{context}: timed out ({source})")]
    Timeout {
        context: String,
        #[source]
        source: io::Error,
    },

    /// `close(2)` reported a previously buffered write failure (`EIO`).
    #[error("a write operation on the session stream failed: {source}")]
    PendingWriteFailed {
        #[source]
        source: io::Error,
    },

    /// The operation was aborted by external cancellation.
    #[error("{context}: cancelled")]
    Cancelled { context: String },
}

pub type Result<T> = std::result::Result<T, SessionError>;

impl SessionError {
    /// Classify an I/O error, separating timeout expiry from other failures.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        let context = context.into();
        match source.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
                SessionError::Timeout { context, source }
            }
            _ => SessionError::Transport { context, source },
        }
    }

    pub fn cancelled(context: impl Into<String>) -> Self {
        SessionError::Cancelled {
            context: context.into(),
        }
    }

    /// Replace the human-readable context, keeping the kind and the OS error.
    ///
    /// Lower layers report what syscall failed; the session relabels the
    /// error with what it was trying to do at the time.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        match self {
            SessionError::Transport { source, .. } => SessionError::Transport {
                context: context.into(),
                source,
            },
            SessionError::Timeout { source, .. } => SessionError::Timeout {
                context: context.into(),
                source,
            },
            SessionError::Cancelled { .. } => SessionError::Cancelled {
                context: context.into(),
            },
            other => other,
        }
    }

    /// The underlying OS error code, if any.
    pub fn os_error(&self) -> Option<i32> {
        match self {
            SessionError::Transport { source, .. }
            | SessionError::Timeout { source, .. }
            | SessionError::PendingWriteFailed { source } => source.raw_os_error(),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SessionError::Cancelled { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, SessionError::Timeout { .. })
    }

    pub fn is_pending_write_failure(&self) -> bool {
        matches!(self, SessionError::PendingWriteFailed { .. })
    }

    pub fn is_channel_unavailable(&self) -> bool {
        matches!(self, SessionError::ChannelUnavailable { .. })
    }
}

/// Errors produced while encoding or decoding the request header buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("header name must not be empty")]
    EmptyName,

    #[error("header {name:?} has an empty value")]
    EmptyValue { name: String },

    #[error("header name {name:?} contains a NUL byte")]
    NulInName { name: String },

    #[error("header {name:?} has a value containing a NUL byte")]
    NulInValue { name: String },

    #[error("header buffer ends with an unterminated token")]
    Unterminated,

    #[error("header buffer has a name without a value")]
    OddTokenCount,

    #[error("empty header token at offset {offset}")]
    EmptyToken { offset: usize },
}
