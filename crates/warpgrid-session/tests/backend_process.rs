//! Pool connector tests against a backend listening on a Unix socket.

mod common;

use std::io::{Read, Write};
use std::os::unix::net::UnixListener;
use std::thread;
use std::time::Duration;

use common::{init_tracing, read_request};
use warpgrid_session::{
    BackendProcess, CancelSource, HeaderBuffer, Session, SessionConfig, SessionError,
};

/// Spawn a backend that serves one request: it echoes the body back after
/// a fixed status line and returns what it received.
fn spawn_echo_backend(listener: UnixListener) -> thread::JoinHandle<common::ReceivedRequest> {
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let request = read_request(&mut stream);
        stream.write_all(b"Status: 200 OK\r\n\r\n").expect("write status");
        stream.write_all(&request.body).expect("write body");
        request
    })
}

#[test]
fn connect_forward_and_release() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("worker.sock");
    let listener = UnixListener::bind(&socket).unwrap();
    let backend_thread = spawn_echo_backend(listener);

    let backend = BackendProcess::new(4242, &socket, SessionConfig::default());
    assert_eq!(backend.active_sessions(), 0);

    let mut session = backend.connect().unwrap();
    assert_eq!(session.pid(), 4242);
    assert_eq!(backend.active_sessions(), 1);

    let headers =
        HeaderBuffer::from_pairs([("REQUEST_METHOD", "POST"), ("CONTENT_LENGTH", "3")]).unwrap();
    backend.send_request_headers(&mut session, &headers).unwrap();
    session.send_body_block(b"a=1").unwrap();
    session.shutdown_writer().unwrap();

    let mut response = String::new();
    session
        .stream_mut()
        .unwrap()
        .read_to_string(&mut response)
        .unwrap();
    assert_eq!(response, "Status: 200 OK\r\n\r\na=1");

    let received = backend_thread.join().unwrap();
    assert_eq!(received.headers, headers.as_bytes());
    assert_eq!(received.body, b"a=1");

    drop(session);
    assert_eq!(backend.active_sessions(), 0);
}

#[test]
fn configured_timeouts_are_applied() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("worker.sock");
    let _listener = UnixListener::bind(&socket).unwrap();

    let config = SessionConfig {
        reader_timeout: Duration::from_secs(30),
        writer_timeout: Duration::from_secs(2),
        ..SessionConfig::default()
    };
    let backend = BackendProcess::new(7, &socket, config);
    let session = backend.connect().unwrap();

    let stream = session.stream().unwrap();
    assert_eq!(stream.read_timeout().unwrap(), Some(Duration::from_secs(30)));
    assert_eq!(stream.write_timeout().unwrap(), Some(Duration::from_secs(2)));
}

#[test]
fn every_session_releases_its_slot() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("worker.sock");
    let _listener = UnixListener::bind(&socket).unwrap();
    let backend = BackendProcess::new(7, &socket, SessionConfig::default());

    let a = backend.connect().unwrap();
    let mut b = backend.connect().unwrap();
    let c = backend.connect().unwrap();
    assert_eq!(backend.active_sessions(), 3);

    // Discarding the stream does not skip the release.
    let _owned = b.discard_stream().unwrap();
    drop(b);
    assert_eq!(backend.active_sessions(), 2);

    c.finish().unwrap();
    assert_eq!(backend.active_sessions(), 1);

    drop(a);
    assert_eq!(backend.active_sessions(), 0);
}

#[test]
fn connect_to_missing_socket_fails_with_transport_error() {
    let dir = tempfile::tempdir().unwrap();
    let backend = BackendProcess::new(7, dir.path().join("absent.sock"), SessionConfig::default());

    let err = backend.connect().unwrap_err();
    assert!(matches!(err, SessionError::Transport { .. }));
    assert_eq!(err.os_error(), Some(libc::ENOENT));
    assert!(err.to_string().contains("absent.sock"));
    assert_eq!(backend.active_sessions(), 0);
}

#[test]
fn connect_with_cancelled_token_is_cancelled() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("worker.sock");
    let _listener = UnixListener::bind(&socket).unwrap();
    let backend = BackendProcess::new(7, &socket, SessionConfig::default());

    let source = CancelSource::new();
    source.cancel();
    let err = backend.connect_with_cancel(source.token()).unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(backend.active_sessions(), 0);
}

#[test]
fn oversized_headers_are_rejected_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("worker.sock");
    let _listener = UnixListener::bind(&socket).unwrap();
    let config = SessionConfig {
        max_header_size: 16,
        ..SessionConfig::default()
    };
    let backend = BackendProcess::new(7, &socket, config);
    let mut session = backend.connect().unwrap();

    let headers = HeaderBuffer::from_pairs([("HTTP_USER_AGENT", "a rather long agent")]).unwrap();
    let err = backend.send_request_headers(&mut session, &headers).unwrap_err();
    match err {
        SessionError::Transport { source, .. } => {
            assert_eq!(source.kind(), std::io::ErrorKind::InvalidInput)
        }
        other => panic!("expected transport error, got {other:?}"),
    }

    // Nothing was sent, so the session can still carry a valid request.
    let small = HeaderBuffer::from_pairs([("A", "1")]).unwrap();
    backend.send_request_headers(&mut session, &small).unwrap();
}
