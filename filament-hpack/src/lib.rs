//! HPACK header compression context (RFC 7541).
//!
//! This crate implements the header table shared between the encode and
//! decode directions of a connection:
//!
//! - 61-entry static table (RFC 7541 Appendix A)
//! - Size-bounded dynamic table with insertion-ordered eviction
//! - Prefix integer codec
//! - Table-driven header block encoder and decoder
//!
//! One [`HeaderTable`] is created per connection direction and lives for
//! the connection's duration. The [`Encoder`] and [`Decoder`] each own
//! their direction's table; the two stay mirrored because both sides
//! apply identical add/evict semantics.
//!
//! # Example
//!
//! ```rust
//! use filament_hpack::{Decoder, Encoder, HeaderField};
//!
//! let mut encoder = Encoder::new(4096);
//! let mut decoder = Decoder::new(4096);
//!
//! let headers = vec![
//!     HeaderField::new(":method", "GET"),
//!     HeaderField::new(":path", "/"),
//! ];
//! let mut block = Vec::new();
//! encoder.encode(&headers, &mut block);
//! assert_eq!(decoder.decode(&block).unwrap(), headers);
//! ```

pub mod codec;
pub mod error;
pub mod field;
pub mod table;

pub use codec::{Decoder, Encoder};
pub use error::HpackError;
pub use field::HeaderField;
pub use table::{Entry, HeaderTable};
