//! End-to-end framing through a recording session: header commit
//! ordering, Content-Length vs chunked bodies, terminal framing, close
//! idempotency, and the shutdown-output path.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use filament_http1::{H1Connection, H1Output, Message, Version};
use filament_net::{ConnectionBootstrap, Config, HttpConnection, Session};

#[derive(Clone, Default)]
struct RecordingSession {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    buffers: Mutex<Vec<Bytes>>,
    closed: AtomicBool,
}

impl RecordingSession {
    fn buffer_count(&self) -> usize {
        self.inner.buffers.lock().unwrap().len()
    }

    fn wire(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for buf in self.inner.buffers.lock().unwrap().iter() {
            out.extend_from_slice(buf);
        }
        out
    }

    fn wire_text(&self) -> String {
        String::from_utf8(self.wire()).unwrap()
    }

    fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl Session for RecordingSession {
    fn encode(&self, buf: Bytes) {
        self.inner.buffers.lock().unwrap().push(buf);
    }

    fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        None
    }

    fn remote_addr(&self) -> Option<SocketAddr> {
        None
    }
}

fn response() -> Message {
    Message::response(200, Version::Http11).header("server", "filament")
}

#[test]
fn fixed_body_has_single_content_length_and_header_first() {
    let session = RecordingSession::default();
    let completed = Arc::new(AtomicUsize::new(0));
    let hook_count = completed.clone();
    let output = H1Output::new(response(), session.clone())
        .with_complete_hook(move || {
            hook_count.fetch_add(1, Ordering::SeqCst);
        });

    output
        .write_with_content_length(&[b"hello", b" world"])
        .unwrap();

    // Header buffer, then the two body parts, in order.
    let buffers = session.inner.buffers.lock().unwrap().clone();
    assert_eq!(buffers.len(), 3);
    let header = String::from_utf8(buffers[0].to_vec()).unwrap();
    assert!(header.starts_with("HTTP/1.1 200 OK\r\n"));
    assert_eq!(header.matches("content-length").count(), 1);
    assert!(header.contains("content-length: 11\r\n"));
    assert!(header.ends_with("\r\n\r\n"));
    assert_eq!(&buffers[1][..], b"hello");
    assert_eq!(&buffers[2][..], b" world");

    // Auto-closed, completion hook fired exactly once, transport open.
    assert!(output.is_closed());
    assert_eq!(completed.load(Ordering::SeqCst), 1);
    assert!(!session.is_closed());
}

#[test]
fn chunked_writes_produce_exact_envelopes() {
    let session = RecordingSession::default();
    let output = H1Output::new(response(), session.clone());

    output.write(b"hello").unwrap();
    output.write(b"abc").unwrap();
    output.close().unwrap();

    let text = session.wire_text();
    assert!(text.contains("transfer-encoding: chunked\r\n"));
    let body_start = text.find("\r\n\r\n").unwrap() + 4;
    assert_eq!(&text[body_start..], "5\r\nhello\r\n3\r\nabc\r\n0\r\n\r\n");
}

#[test]
fn uncommitted_close_emits_empty_body_framing() {
    let session = RecordingSession::default();
    let output = H1Output::new(response(), session.clone());

    output.close().unwrap();

    let text = session.wire_text();
    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.contains("content-length: 0\r\n"));
    assert!(!text.contains("transfer-encoding"));
    assert!(text.ends_with("\r\n\r\n"));
    assert!(output.is_committed());
    assert!(output.is_closed());
}

#[test]
fn close_is_idempotent() {
    let session = RecordingSession::default();
    let output = H1Output::new(response(), session.clone());

    output.write(b"data").unwrap();
    output.close().unwrap();
    let after_first = session.buffer_count();
    let wire = session.wire();

    output.close().unwrap();
    assert_eq!(session.buffer_count(), after_first);
    assert_eq!(session.wire(), wire);
}

#[test]
fn zero_length_write_is_a_noop() {
    let session = RecordingSession::default();
    let output = H1Output::new(response(), session.clone());

    output.write(b"").unwrap();
    assert_eq!(session.buffer_count(), 0);
    assert!(!output.is_committed());
}

#[test]
fn write_after_close_is_a_noop() {
    let session = RecordingSession::default();
    let output = H1Output::new(response(), session.clone());

    output.close().unwrap();
    let count = session.buffer_count();
    output.write(b"late").unwrap();
    assert_eq!(session.buffer_count(), count);
}

#[test]
fn commit_is_idempotent() {
    let session = RecordingSession::default();
    let output = H1Output::new(response(), session.clone());

    output.commit().unwrap();
    let count = session.buffer_count();
    output.commit().unwrap();
    assert_eq!(session.buffer_count(), count);
}

#[test]
fn http10_response_closes_transport_on_shutdown_out() {
    let session = RecordingSession::default();
    let completed = Arc::new(AtomicUsize::new(0));
    let hook_count = completed.clone();
    let info = Message::response(200, Version::Http10);
    let output = H1Output::new(info, session.clone()).with_complete_hook(move || {
        hook_count.fetch_add(1, Ordering::SeqCst);
    });

    output.write(b"legacy body").unwrap();
    output.close().unwrap();

    let text = session.wire_text();
    assert!(!text.contains("content-length"));
    assert!(!text.contains("transfer-encoding"));
    // Body end is signalled by closing the connection.
    assert!(session.is_closed());
    assert_eq!(completed.load(Ordering::SeqCst), 0);
}

#[test]
fn request_output_uses_request_line() {
    let session = RecordingSession::default();
    let info = Message::request("POST", "/upload", Version::Http11)
        .header("host", "example.com");
    let output = H1Output::new(info, session.clone());

    output.write_with_content_length(&[b"payload"]).unwrap();

    let text = session.wire_text();
    assert!(text.starts_with("POST /upload HTTP/1.1\r\n"));
    assert!(text.contains("content-length: 7\r\n"));
    assert!(text.ends_with("payload"));
}

#[test]
fn concurrent_close_emits_terminal_once() {
    let session = RecordingSession::default();
    let output = Arc::new(H1Output::new(response(), session.clone()));
    output.write(b"hello").unwrap();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let output = output.clone();
        handles.push(std::thread::spawn(move || output.close().unwrap()));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let text = session.wire_text();
    assert_eq!(text.matches("0\r\n\r\n").count(), 1);
}

#[test]
fn bootstrap_teardown_closes_attached_connection() {
    let session = RecordingSession::default();
    let conn = H1Connection::new(session.clone());
    assert!(conn.is_open());

    let bootstrap = ConnectionBootstrap::new(&Config::default());
    let mut attached: Option<Box<dyn HttpConnection>> = Some(Box::new(conn));
    bootstrap.session_closed(&mut attached);

    assert!(attached.is_none());
    assert!(session.is_closed());
}
