//! HTTP/1 message generation and output framing.
//!
//! This crate turns a logical request or response plus a stream of body
//! bytes into correctly framed HTTP/1 wire bytes:
//!
//! ```text
//!   Message + body writes
//!        |
//!   +----v--------+     +-------------+     +---------+
//!   | H1Output    |---->| Generator   |---->| Session |
//!   | commit/     |     | CL/chunked/ |     | encode  |
//!   | write/close |     | EOF framing |     +---------+
//!   +-------------+     +-------------+
//! ```
//!
//! [`H1Output`] decides between Content-Length and chunked transfer
//! encoding at commit time, hands encoded buffers to the non-blocking
//! [`Session`](filament_net::Session), and emits the terminal framing on
//! close.
//!
//! # Example
//!
//! ```rust,ignore
//! use filament_http1::{H1Output, Message, Version};
//!
//! let info = Message::response(200, Version::Http11)
//!     .header("content-type", "text/plain");
//! let output = H1Output::new(info, session);
//! output.write_with_content_length(&[b"hello"])?;
//! ```

pub mod conn;
pub mod error;
pub mod generator;
pub mod message;
pub mod output;

pub use conn::H1Connection;
pub use error::HttpError;
pub use generator::{GenResult, Generator, State};
pub use message::{Headers, Message, MessageKind, Version};
pub use output::H1Output;
