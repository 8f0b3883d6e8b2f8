//! Shared helpers for session integration tests.

#![allow(dead_code)]

use std::io::Read;
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use warpgrid_session::{CancelToken, MessageChannel};

/// Install a test subscriber once; `RUST_LOG` controls verbosity.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// A release callback that counts its invocations.
pub fn counting_release() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    (count, move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

/// What a backend process received for one request.
#[derive(Debug)]
pub struct ReceivedRequest {
    pub headers: Vec<u8>,
    pub body: Vec<u8>,
}

/// Read one request the way a backend process does: a framed header
/// message, then raw body bytes until the writer half-closes.
pub fn read_request(stream: &mut UnixStream) -> ReceivedRequest {
    let cancel = CancelToken::never();
    let headers = MessageChannel::new(&mut *stream, &cancel)
        .read_scalar(0)
        .expect("read header message")
        .expect("header message present");
    let mut body = Vec::new();
    stream.read_to_end(&mut body).expect("read body");
    ReceivedRequest { headers, body }
}
