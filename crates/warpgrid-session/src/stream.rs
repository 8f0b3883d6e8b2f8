//! The transport a session owns.
//!
//! [`SessionStream`] is the small surface a session needs beyond
//! `Read + Write`: half-close, per-direction timeouts and a close that
//! reports errors (dropping a std socket silently discards `close(2)`
//! failures, including a deferred `EIO`).

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::os::unix::io::{AsRawFd, IntoRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::time::Duration;

use crate::sys;

/// A connected, full-duplex byte stream exclusively owned by one session.
pub trait SessionStream: Read + Write {
    /// Shut down the read half, the write half, or both.
    fn shutdown(&self, how: Shutdown) -> io::Result<()>;

    /// Set the timeout for blocking reads. `None` blocks indefinitely.
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;

    /// Set the timeout for blocking writes. `None` blocks indefinitely.
    fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;

    /// Close the stream, reporting the result of `close(2)`.
    fn close(self) -> io::Result<()>
    where
        Self: Sized;

    /// The descriptor, for diagnostics.
    fn raw_fd(&self) -> Option<RawFd> {
        None
    }
}

macro_rules! impl_socket_stream {
    ($ty:ty) => {
        impl SessionStream for $ty {
            fn shutdown(&self, how: Shutdown) -> io::Result<()> {
                <$ty>::shutdown(self, how)
            }

            fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
                <$ty>::set_read_timeout(self, timeout)
            }

            fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
                <$ty>::set_write_timeout(self, timeout)
            }

            fn close(self) -> io::Result<()> {
                sys::close_fd(self.into_raw_fd())
            }

            fn raw_fd(&self) -> Option<RawFd> {
                Some(self.as_raw_fd())
            }
        }
    };
}

impl_socket_stream!(UnixStream);
impl_socket_stream!(TcpStream);
