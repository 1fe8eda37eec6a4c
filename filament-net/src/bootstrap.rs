//! Per-session connection bootstrap: TLS handshake, protocol selection,
//! and teardown of the attached connection.
//!
//! The embedding transport delivers session-open, data, and session-close
//! events; this module turns them into a negotiated application protocol
//! and, eventually, a closed connection. The ClientHello is read through
//! a rustls [`Acceptor`] so the peer's ALPN offers can be run through the
//! [`ProtocolSelector`] before the server connection is built.

use std::io;
use std::sync::Arc;

use bytes::Bytes;
use rustls::ServerConnection;
use rustls::server::Acceptor;
use tracing::{debug, error};

use crate::alpn::ProtocolSelector;
use crate::config::Config;
use crate::error::NetError;
use crate::metrics::{
    HANDSHAKES_COMPLETED, HANDSHAKE_FAILURES, SESSIONS_CLOSED, SESSIONS_OPENED,
};
use crate::session::Session;

/// A protocol connection object attached to a session after negotiation.
///
/// filament-http1 provides the HTTP/1 implementation; an HTTP/2
/// connection object plugs in through the same trait.
pub trait HttpConnection: Send {
    fn is_open(&self) -> bool;

    fn close(&mut self) -> Result<(), NetError>;
}

/// What a freshly opened session needs next.
pub enum Negotiation {
    /// No TLS configured: attach an HTTP/1 connection directly.
    Plaintext,
    /// Drive this handshake with inbound ciphertext until it completes.
    Secure(Handshake),
}

/// Progress of a TLS handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeStatus {
    /// More ciphertext needed.
    Pending,
    /// Handshake finished; the selected application protocol.
    Complete { protocol: String },
}

enum Phase {
    /// Reading the ClientHello to capture the peer's ALPN offers.
    ClientHello(Acceptor),
    /// Driving the TLS state machine to completion.
    Negotiating {
        conn: ServerConnection,
        protocol: String,
    },
    Complete {
        conn: ServerConnection,
        protocol: String,
    },
    Failed,
}

/// One session's TLS handshake state.
pub struct Handshake {
    phase: Phase,
    config: Arc<rustls::ServerConfig>,
    selector: ProtocolSelector,
}

impl Handshake {
    pub fn new(config: Arc<rustls::ServerConfig>, selector: ProtocolSelector) -> Self {
        Self {
            phase: Phase::ClientHello(Acceptor::default()),
            config,
            selector,
        }
    }

    /// Feed inbound ciphertext and flush any handshake output to the
    /// session. Returns `Complete` once, and on every call thereafter,
    /// without consuming further input; post-handshake ciphertext belongs
    /// to the attached connection's record layer (see [`into_parts`]).
    ///
    /// [`into_parts`]: Handshake::into_parts
    pub fn feed<S: Session>(
        &mut self,
        ciphertext: &[u8],
        session: &S,
    ) -> Result<HandshakeStatus, NetError> {
        let mut cursor = io::Cursor::new(ciphertext);
        loop {
            match std::mem::replace(&mut self.phase, Phase::Failed) {
                Phase::ClientHello(mut acceptor) => {
                    acceptor.read_tls(&mut cursor)?;
                    match acceptor.accept() {
                        Ok(None) => {
                            self.phase = Phase::ClientHello(acceptor);
                            return Ok(HandshakeStatus::Pending);
                        }
                        Ok(Some(accepted)) => {
                            let offered: Vec<String> = accepted
                                .client_hello()
                                .alpn()
                                .map(|alpn| {
                                    alpn.map(|p| String::from_utf8_lossy(p).into_owned())
                                        .collect()
                                })
                                .unwrap_or_default();
                            let refs: Vec<&str> =
                                offered.iter().map(String::as_str).collect();
                            let protocol = self.selector.select(&refs);
                            debug!(?offered, %protocol, "application protocol selected");
                            match accepted.into_connection(self.config.clone()) {
                                Ok(conn) => {
                                    self.phase = Phase::Negotiating { conn, protocol };
                                }
                                Err((e, mut alert)) => {
                                    let mut out = Vec::new();
                                    let _ = alert.write(&mut out);
                                    if !out.is_empty() {
                                        session.encode(Bytes::from(out));
                                    }
                                    HANDSHAKE_FAILURES.increment();
                                    return Err(e.into());
                                }
                            }
                        }
                        Err((e, mut alert)) => {
                            let mut out = Vec::new();
                            let _ = alert.write(&mut out);
                            if !out.is_empty() {
                                session.encode(Bytes::from(out));
                            }
                            HANDSHAKE_FAILURES.increment();
                            return Err(e.into());
                        }
                    }
                }
                Phase::Negotiating { mut conn, protocol } => {
                    conn.read_tls(&mut cursor)?;
                    if let Err(e) = conn.process_new_packets() {
                        // Flush the alert before reporting.
                        flush_tls_output(&mut conn, session);
                        HANDSHAKE_FAILURES.increment();
                        return Err(e.into());
                    }
                    flush_tls_output(&mut conn, session);
                    if conn.is_handshaking() {
                        self.phase = Phase::Negotiating { conn, protocol };
                        return Ok(HandshakeStatus::Pending);
                    }
                    HANDSHAKES_COMPLETED.increment();
                    let status = HandshakeStatus::Complete {
                        protocol: protocol.clone(),
                    };
                    self.phase = Phase::Complete { conn, protocol };
                    return Ok(status);
                }
                Phase::Complete { conn, protocol } => {
                    let status = HandshakeStatus::Complete {
                        protocol: protocol.clone(),
                    };
                    self.phase = Phase::Complete { conn, protocol };
                    return Ok(status);
                }
                Phase::Failed => return Err(NetError::HandshakeFailed),
            }
        }
    }

    /// Consume a completed handshake, yielding the TLS record layer and
    /// the negotiated protocol name. `None` until complete.
    pub fn into_parts(self) -> Option<(ServerConnection, String)> {
        match self.phase {
            Phase::Complete { conn, protocol } => Some((conn, protocol)),
            _ => None,
        }
    }
}

fn flush_tls_output<S: Session>(conn: &mut ServerConnection, session: &S) {
    let mut out = Vec::new();
    while conn.wants_write() {
        if conn.write_tls(&mut out).is_err() {
            break;
        }
    }
    if !out.is_empty() {
        session.encode(Bytes::from(out));
    }
}

/// Builds per-session negotiation state and tears attached connections
/// down with the session.
pub struct ConnectionBootstrap {
    tls: Option<Arc<rustls::ServerConfig>>,
    selector: ProtocolSelector,
}

impl ConnectionBootstrap {
    pub fn new(config: &Config) -> Self {
        let tls = config.tls.as_ref().map(|t| t.server_config.clone());
        if config.secure && tls.is_none() {
            // Degraded: keep serving plaintext rather than dying.
            error!("secure transport configured but no TLS config present");
        }
        Self {
            tls,
            selector: ProtocolSelector::from_config(config),
        }
    }

    pub fn selector(&self) -> &ProtocolSelector {
        &self.selector
    }

    /// A new inbound session: either start a TLS handshake or attach
    /// plaintext HTTP/1 directly.
    pub fn session_opened(&self) -> Negotiation {
        SESSIONS_OPENED.increment();
        match &self.tls {
            Some(config) => Negotiation::Secure(Handshake::new(
                config.clone(),
                self.selector.clone(),
            )),
            None => Negotiation::Plaintext,
        }
    }

    /// The session went away: close the attached connection if still
    /// open. Close faults are logged and swallowed; teardown never fails
    /// the caller.
    pub fn session_closed(&self, attached: &mut Option<Box<dyn HttpConnection>>) {
        SESSIONS_CLOSED.increment();
        if let Some(conn) = attached.as_deref_mut()
            && conn.is_open()
            && let Err(e) = conn.close()
        {
            error!("connection close failed: {e}");
        }
        *attached = None;
    }

    /// A transport fault: log it and close the attached connection the
    /// same way session teardown does.
    pub fn session_fault(
        &self,
        fault: &dyn std::error::Error,
        attached: &mut Option<Box<dyn HttpConnection>>,
    ) {
        error!("session fault: {fault}");
        if let Some(conn) = attached.as_deref_mut()
            && conn.is_open()
            && let Err(e) = conn.close()
        {
            error!("connection close failed: {e}");
        }
        *attached = None;
    }
}
