//! WarpGrid backend sessions.
//!
//! A session carries exactly one HTTP request/response exchange between the
//! request router and a backend application process over a full-duplex
//! local stream.
//!
//! # Components
//!
//! - **`session`** — the [`Session`] contract every variant implements
//! - **`local`** — [`LocalSession`], which owns its socket and the pool's
//!   release callback
//! - **`headers`** — the NUL-separated request header encoding
//! - **`channel`** — length-prefixed message framing on the stream
//! - **`cancel`** — cooperative cancellation for blocking I/O
//! - **`process`** — [`BackendProcess`], the pool-side connector
//! - **`config`** — [`SessionConfig`] timeouts and limits
//!
//! # Example
//!
//! ```no_run
//! use std::io::Read;
//! use warpgrid_session::{BackendProcess, HeaderBuffer, Session, SessionConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let backend = BackendProcess::new(4242, "/run/app/worker.sock", SessionConfig::default());
//! let mut session = backend.connect()?;
//!
//! let headers = HeaderBuffer::from_pairs([("REQUEST_METHOD", "POST"), ("CONTENT_LENGTH", "3")])?;
//! session.send_header_buffer(&headers)?;
//! session.send_body_block(b"a=1")?;
//! session.shutdown_writer()?;
//!
//! let mut response = Vec::new();
//! if let Some(stream) = session.stream_mut() {
//!     stream.read_to_end(&mut response)?;
//! }
//! session.finish()?;
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod channel;
pub mod config;
pub mod error;
pub mod headers;
pub mod local;
pub mod process;
pub mod session;
pub mod stream;
mod sys;

pub use cancel::{CancelSource, CancelToken};
pub use channel::MessageChannel;
pub use config::SessionConfig;
pub use error::{HeaderError, Result, SessionError};
pub use headers::{HeaderBuffer, parse_headers};
pub use local::{LocalSession, ReleaseCallback};
pub use process::BackendProcess;
pub use session::{ProcessId, Session};
pub use stream::SessionStream;
