//! Thin syscall shim.
//!
//! Every wrapper retries on `EINTR` and checks the cancellation token before
//! each retry, then translates failures into [`SessionError`] kinds. The
//! context strings name the syscall; callers relabel them with
//! [`SessionError::with_context`].

use std::io::{self, Read, Write};
use std::net::Shutdown;
use std::os::unix::io::RawFd;
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::error::{Result, SessionError};
use crate::stream::SessionStream;

/// Write all of `buf`, retrying partial writes and interruptions.
pub(crate) fn write_all<W: Write + ?Sized>(
    writer: &mut W,
    mut buf: &[u8],
    cancel: &CancelToken,
) -> Result<()> {
    while !buf.is_empty() {
        if cancel.is_cancelled() {
            return Err(SessionError::cancelled("write(2)"));
        }
        match writer.write(buf) {
            Ok(0) => {
                return Err(SessionError::io(
                    "write(2)",
                    io::Error::from(io::ErrorKind::WriteZero),
                ));
            }
            Ok(n) => buf = &buf[n..],
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(SessionError::io("write(2)", e)),
        }
    }
    Ok(())
}

/// One read, retried on interruption. Returns 0 at end of stream.
pub(crate) fn read<R: Read + ?Sized>(
    reader: &mut R,
    buf: &mut [u8],
    cancel: &CancelToken,
) -> Result<usize> {
    loop {
        if cancel.is_cancelled() {
            return Err(SessionError::cancelled("read(2)"));
        }
        match reader.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(SessionError::io("read(2)", e)),
        }
    }
}

/// Fill `buf` completely. Returns the number of bytes read, which is less
/// than `buf.len()` only if the stream ended.
pub(crate) fn read_full<R: Read + ?Sized>(
    reader: &mut R,
    buf: &mut [u8],
    cancel: &CancelToken,
) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match read(&mut *reader, &mut buf[filled..], cancel)? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

pub(crate) fn shutdown<S: SessionStream + ?Sized>(
    stream: &S,
    how: Shutdown,
    cancel: &CancelToken,
) -> Result<()> {
    loop {
        if cancel.is_cancelled() {
            return Err(SessionError::cancelled("shutdown(2)"));
        }
        match stream.shutdown(how) {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(SessionError::io("shutdown(2)", e)),
        }
    }
}

/// Close a descriptor this process owns.
///
/// Not retried on `EINTR`: Linux releases the descriptor before reporting
/// it, and a retry could close a descriptor reused by another thread.
pub(crate) fn close_fd(fd: RawFd) -> io::Result<()> {
    // SAFETY: the caller transferred ownership of `fd` to us and never uses
    // it again.
    let ret = unsafe { libc::close(fd) };
    if ret == -1 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EINTR) {
            return Ok(());
        }
        return Err(err);
    }
    Ok(())
}

/// Translate a failed close into the session taxonomy.
pub(crate) fn close_error(source: io::Error) -> SessionError {
    if source.raw_os_error() == Some(libc::EIO) {
        SessionError::PendingWriteFailed { source }
    } else {
        SessionError::Transport {
            context: "cannot close the session stream".to_string(),
            source,
        }
    }
}

/// Zero means "no timeout".
pub(crate) fn timeout_option(timeout: Duration) -> Option<Duration> {
    if timeout.is_zero() { None } else { Some(timeout) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelSource;

    /// Returns `EINTR` for the first `interrupts` calls, then accepts at most
    /// `chunk` bytes per write.
    struct Flaky {
        interrupts: usize,
        chunk: usize,
        written: Vec<u8>,
    }

    impl Write for Flaky {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.interrupts > 0 {
                self.interrupts -= 1;
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            let n = buf.len().min(self.chunk);
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_all_retries_interruptions_and_partial_writes() {
        let mut w = Flaky {
            interrupts: 3,
            chunk: 2,
            written: Vec::new(),
        };
        write_all(&mut w, b"hello world", &CancelToken::never()).unwrap();
        assert_eq!(w.written, b"hello world");
    }

    #[test]
    fn write_all_observes_cancellation() {
        let source = CancelSource::new();
        source.cancel();
        let mut w = Flaky {
            interrupts: 0,
            chunk: 64,
            written: Vec::new(),
        };
        let err = write_all(&mut w, b"data", &source.token()).unwrap_err();
        assert!(err.is_cancelled());
        assert!(w.written.is_empty());
    }

    #[test]
    fn write_zero_is_a_transport_error() {
        let mut w = Flaky {
            interrupts: 0,
            chunk: 0,
            written: Vec::new(),
        };
        let err = write_all(&mut w, b"x", &CancelToken::never()).unwrap_err();
        match err {
            SessionError::Transport { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::WriteZero)
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[test]
    fn read_full_stops_at_eof() {
        let mut r: &[u8] = b"abc";
        let mut buf = [0u8; 8];
        let n = read_full(&mut r, &mut buf, &CancelToken::never()).unwrap();
        assert_eq!(n, 3);
        assert_eq!(&buf[..3], b"abc");
    }

    #[test]
    fn close_error_distinguishes_eio() {
        let err = close_error(io::Error::from_raw_os_error(libc::EIO));
        assert!(err.is_pending_write_failure());

        let err = close_error(io::Error::from_raw_os_error(libc::EBADF));
        assert!(matches!(err, SessionError::Transport { .. }));
        assert_eq!(err.os_error(), Some(libc::EBADF));
    }

    #[test]
    fn close_fd_rejects_invalid_descriptor() {
        let err = close_fd(-1).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EBADF));
    }

    #[test]
    fn zero_timeout_means_none() {
        assert_eq!(timeout_option(Duration::ZERO), None);
        assert_eq!(
            timeout_option(Duration::from_secs(3)),
            Some(Duration::from_secs(3))
        );
    }
}
