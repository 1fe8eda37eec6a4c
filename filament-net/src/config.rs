//! Construction-time configuration.

use std::sync::Arc;

use crate::alpn::{DEFAULT_PROTOCOL, SUPPORTED_PROTOCOLS};

/// TLS configuration. Pass a pre-built rustls ServerConfig; certificate
/// and key loading happen outside this stack.
#[derive(Clone)]
pub struct TlsConfig {
    pub server_config: Arc<rustls::ServerConfig>,
}

/// Stack configuration. All tunables are explicit; nothing is read from
/// ambient process state.
#[derive(Clone)]
pub struct Config {
    /// Whether inbound sessions are expected to speak TLS. When true and
    /// `tls` is absent, the bootstrap logs the fault and runs degraded
    /// (plaintext) instead of crashing.
    pub secure: bool,
    /// Optional TLS configuration for inbound sessions.
    pub tls: Option<TlsConfig>,
    /// Application protocols offered/accepted during negotiation.
    pub supported_protocols: Vec<String>,
    /// Protocol assumed when the peer's offers have no overlap.
    pub default_protocol: String,
    /// Scratch buffer size for serialized header blocks.
    pub header_buffer_size: usize,
    /// HPACK dynamic table capacity per connection direction.
    pub dynamic_table_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            secure: false,
            tls: None,
            supported_protocols: SUPPORTED_PROTOCOLS.iter().map(|s| s.to_string()).collect(),
            default_protocol: DEFAULT_PROTOCOL.to_string(),
            header_buffer_size: 4096,
            dynamic_table_capacity: 4096,
        }
    }
}
