use std::io;

use thiserror::Error;

/// Errors produced by the transport glue.
#[derive(Debug, Error)]
pub enum NetError {
    /// TLS handshake or record-layer failure.
    #[error("tls error: {0}")]
    Tls(#[from] rustls::Error),

    /// I/O error surfaced by the TLS record layer.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The handshake already failed; the session should be torn down.
    #[error("handshake failed")]
    HandshakeFailed,

    /// The connection was closed.
    #[error("connection closed")]
    Closed,
}
