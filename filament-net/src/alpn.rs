//! Application protocol selection.
//!
//! The peer's offered list is scanned in offer order and the first
//! protocol present in the supported set wins. When nothing overlaps the
//! configured default is returned instead of failing the negotiation;
//! deployments that want hard-failure semantics set a different default.

use std::collections::HashSet;

use crate::config::Config;
use crate::metrics::NEGOTIATION_DEFAULTED;

/// Protocols the server speaks, including the h2 draft identifiers some
/// older peers still offer.
pub const SUPPORTED_PROTOCOLS: &[&str] = &["http/1.1", "h2", "h2-17", "h2-16", "h2-15", "h2-14"];

/// Default when the peer offers nothing we support.
pub const DEFAULT_PROTOCOL: &str = "h2";

/// Which protocol family a negotiated name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppProtocol {
    Http1,
    Http2,
}

impl AppProtocol {
    /// Classify a negotiated protocol name. Everything except http/1.1
    /// (h2 and its draft identifiers) is HTTP/2.
    pub fn from_name(name: &str) -> Self {
        if name == "http/1.1" {
            AppProtocol::Http1
        } else {
            AppProtocol::Http2
        }
    }
}

/// ALPN-style selector over a supported protocol set.
#[derive(Debug, Clone)]
pub struct ProtocolSelector {
    supported: HashSet<String>,
    default_protocol: String,
}

impl ProtocolSelector {
    pub fn new(
        supported: impl IntoIterator<Item = String>,
        default_protocol: impl Into<String>,
    ) -> Self {
        Self {
            supported: supported.into_iter().collect(),
            default_protocol: default_protocol.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.supported_protocols.iter().cloned(),
            config.default_protocol.clone(),
        )
    }

    /// Select a protocol from the peer's offered list, scanning in offer
    /// order; falls back to the configured default when nothing matches.
    pub fn select(&self, offered: &[&str]) -> String {
        for protocol in offered {
            if self.supported.contains(*protocol) {
                return (*protocol).to_string();
            }
        }
        NEGOTIATION_DEFAULTED.increment();
        self.default_protocol.clone()
    }

    /// Supported protocols in rustls ALPN wire form, for embedding into a
    /// `rustls::ServerConfig`.
    pub fn alpn_protocols(&self) -> Vec<Vec<u8>> {
        SUPPORTED_PROTOCOLS
            .iter()
            .filter(|p| self.supported.contains(**p))
            .map(|p| p.as_bytes().to_vec())
            .collect()
    }
}

impl Default for ProtocolSelector {
    fn default() -> Self {
        Self::new(
            SUPPORTED_PROTOCOLS.iter().map(|s| s.to_string()),
            DEFAULT_PROTOCOL,
        )
    }
}
