//! The transport session a framer writes into.

use std::net::SocketAddr;

use bytes::Bytes;

/// A non-blocking byte sink plus connection lifecycle.
///
/// `encode` enqueues bytes on the transport's own write queue and returns
/// immediately; the transport owns backpressure. Buffer order is
/// preserved: two `encode` calls from the same thread arrive on the wire
/// in call order.
pub trait Session: Send + Sync {
    /// Enqueue bytes for transmission. Fire-and-forget.
    fn encode(&self, buf: Bytes);

    /// Close the connection. Idempotent from the caller's perspective;
    /// transport-level faults are the transport's to report.
    fn close(&self);

    fn local_addr(&self) -> Option<SocketAddr>;

    fn remote_addr(&self) -> Option<SocketAddr>;
}
