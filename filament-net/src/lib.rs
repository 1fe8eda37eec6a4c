//! Transport-facing glue for the filament HTTP stack.
//!
//! This crate defines the seams between the protocol cores and the
//! embedding transport:
//!
//! - [`Session`]: the non-blocking byte sink a message framer writes
//!   encoded buffers into, plus connection lifecycle.
//! - [`ProtocolSelector`]: ALPN-style application protocol selection
//!   over the peer's offered list.
//! - [`ConnectionBootstrap`] / [`Handshake`]: TLS handshake driving and
//!   per-session attachment of a negotiated connection object.
//! - [`Config`]: construction-time tunables; no ambient globals.
//!
//! The transport itself (event loop, sockets, backpressure) is the
//! embedder's. filament never blocks on network I/O: buffers handed to
//! [`Session::encode`] are fire-and-forget.

pub mod alpn;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod metrics;
pub mod session;

pub use alpn::{AppProtocol, ProtocolSelector};
pub use bootstrap::{ConnectionBootstrap, Handshake, HandshakeStatus, HttpConnection, Negotiation};
pub use config::{Config, TlsConfig};
pub use error::NetError;
pub use session::Session;
