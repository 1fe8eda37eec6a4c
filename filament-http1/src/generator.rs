//! The transfer-encoding-aware HTTP/1 byte generator.
//!
//! The generator is driven by the output framer through repeated
//! `generate` calls. Given the same inputs and current state it
//! deterministically advances and reports whether bytes were produced
//! (`Flush`), another call is needed (`Continue`), or the message is
//! fully terminated (`Done`, or `ShutdownOut` when the body is delimited
//! by closing the connection).
//!
//! Framing mode is fixed at commit time:
//! - a declared body length (hint or `content-length` header) selects
//!   Content-Length framing;
//! - otherwise HTTP/1.1 messages chunk (`transfer-encoding: chunked`,
//!   hex sizes, CRLF delimiters, zero-size terminal chunk);
//! - otherwise the body runs to connection close.

use crate::error::HttpError;
use crate::message::{Message, MessageKind, Version, status_reason};

/// Scratch buffer size for one chunk envelope: CRLF + 8 hex digits + CRLF.
pub const CHUNK_HEADER_SIZE: usize = 12;

/// Generator state, visible to the framer for mismatch checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Start,
    Committed,
    Completing,
    End,
}

/// Outcome of one `generate` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenResult {
    /// State advanced; call again to produce bytes.
    Continue,
    /// Bytes were produced; hand the buffers to the transport.
    Flush,
    /// Message fully terminated.
    Done,
    /// Message terminated; the peer learns the body end from
    /// connection close. Close the transport.
    ShutdownOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyMode {
    Fixed(u64),
    Chunked,
    /// No length, no chunking: the body is delimited by closing the
    /// connection.
    Eof,
}

/// Per-message byte generator.
pub struct Generator {
    state: State,
    mode: BodyMode,
    client_mode: bool,
    content_written: u64,
    /// A content chunk has been emitted; the next envelope must first
    /// terminate it with CRLF.
    chunk_open: bool,
    terminal_written: bool,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator {
    pub fn new() -> Self {
        Self {
            state: State::Start,
            mode: BodyMode::Fixed(0),
            client_mode: false,
            content_written: 0,
            chunk_open: false,
            terminal_written: false,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Whether the committed message uses chunked transfer encoding.
    pub fn is_chunking(&self) -> bool {
        self.state != State::Start && self.mode == BodyMode::Chunked
    }

    /// Drive one step of request generation.
    pub fn generate_request(
        &mut self,
        info: Option<&Message>,
        header: Option<&mut Vec<u8>>,
        chunk: Option<&mut Vec<u8>>,
        content: Option<&[u8]>,
        last: bool,
    ) -> Result<GenResult, HttpError> {
        self.generate(info, header, chunk, content, last, true)
    }

    /// Drive one step of response generation.
    pub fn generate_response(
        &mut self,
        info: Option<&Message>,
        header: Option<&mut Vec<u8>>,
        chunk: Option<&mut Vec<u8>>,
        content: Option<&[u8]>,
        last: bool,
    ) -> Result<GenResult, HttpError> {
        self.generate(info, header, chunk, content, last, false)
    }

    fn generate(
        &mut self,
        info: Option<&Message>,
        header: Option<&mut Vec<u8>>,
        chunk: Option<&mut Vec<u8>>,
        content: Option<&[u8]>,
        last: bool,
        client_mode: bool,
    ) -> Result<GenResult, HttpError> {
        match self.state {
            State::Start => {
                let info = info.ok_or(HttpError::Misuse("commit without message"))?;
                let header = header.ok_or(HttpError::Misuse("commit without header buffer"))?;
                self.commit(info, header, content, last, client_mode)
            }
            State::Committed => {
                if last {
                    self.begin_completion(content)
                } else {
                    let content =
                        content.ok_or(HttpError::Misuse("committed write without content"))?;
                    self.content(content, chunk)
                }
            }
            State::Completing => {
                if !last {
                    return Err(HttpError::Misuse("content after completion started"));
                }
                self.complete(chunk)
            }
            State::End => Ok(GenResult::Done),
        }
    }

    /// Serialize the header block exactly once and fix the framing mode.
    fn commit(
        &mut self,
        info: &Message,
        header: &mut Vec<u8>,
        content: Option<&[u8]>,
        last: bool,
        client_mode: bool,
    ) -> Result<GenResult, HttpError> {
        self.client_mode = client_mode;
        let content_len = content.map_or(0, |c| c.len() as u64);

        let te_chunked = info
            .headers()
            .get("transfer-encoding")
            .is_some_and(|v| v.eq_ignore_ascii_case("chunked"));

        self.mode = if let Some(n) = info.content_length() {
            if content_len > n {
                return Err(HttpError::ContentOverrun);
            }
            BodyMode::Fixed(n)
        } else if te_chunked {
            BodyMode::Chunked
        } else if last {
            // Empty body, framed as such. Responses declare the zero
            // length; requests without a body carry no framing header.
            BodyMode::Fixed(0)
        } else if info.version() == Version::Http11 {
            BodyMode::Chunked
        } else {
            BodyMode::Eof
        };

        match info.kind() {
            MessageKind::Request { method, target } => {
                header.extend_from_slice(method.as_bytes());
                header.push(b' ');
                header.extend_from_slice(target.as_bytes());
                header.push(b' ');
                header.extend_from_slice(info.version().as_str().as_bytes());
                header.extend_from_slice(b"\r\n");
            }
            MessageKind::Response { status, reason } => {
                header.extend_from_slice(info.version().as_str().as_bytes());
                header.push(b' ');
                header.extend_from_slice(status.to_string().as_bytes());
                header.push(b' ');
                let reason = reason.as_deref().unwrap_or_else(|| status_reason(*status));
                header.extend_from_slice(reason.as_bytes());
                header.extend_from_slice(b"\r\n");
            }
        }

        // Framing headers are emitted exactly once; any caller-supplied
        // duplicates of content-length are dropped here.
        for (name, value) in info.headers().iter() {
            if name.eq_ignore_ascii_case("content-length") {
                continue;
            }
            header.extend_from_slice(name.as_bytes());
            header.extend_from_slice(b": ");
            header.extend_from_slice(value.as_bytes());
            header.extend_from_slice(b"\r\n");
        }
        match self.mode {
            BodyMode::Fixed(n) => {
                // Responses always declare the length; requests only when
                // a length was declared (an empty-body GET stays bare).
                if info.content_length().is_some() || !info.is_request() {
                    header.extend_from_slice(b"content-length: ");
                    header.extend_from_slice(n.to_string().as_bytes());
                    header.extend_from_slice(b"\r\n");
                }
            }
            BodyMode::Chunked => {
                if !te_chunked {
                    header.extend_from_slice(b"transfer-encoding: chunked\r\n");
                }
            }
            BodyMode::Eof => {}
        }
        header.extend_from_slice(b"\r\n");

        // The first chunk envelope rides in the header buffer so the
        // framer can hand (header, content) to the transport as-is.
        if self.mode == BodyMode::Chunked && content_len > 0 {
            self.write_envelope(header, content_len as usize);
        }
        self.content_written = content_len;

        if last {
            if let BodyMode::Fixed(n) = self.mode
                && self.content_written < n
            {
                return Err(HttpError::ContentIncomplete);
            }
            // A chunked message committed as last folds the terminal
            // chunk into the header block.
            if self.mode == BodyMode::Chunked {
                self.write_terminal(header);
            }
            self.state = State::Completing;
        } else {
            self.state = State::Committed;
        }
        Ok(GenResult::Flush)
    }

    /// Account one committed body write, emitting a chunk envelope when
    /// chunking.
    fn content(
        &mut self,
        content: &[u8],
        chunk: Option<&mut Vec<u8>>,
    ) -> Result<GenResult, HttpError> {
        match self.mode {
            BodyMode::Fixed(n) => {
                if self.content_written + content.len() as u64 > n {
                    return Err(HttpError::ContentOverrun);
                }
                self.content_written += content.len() as u64;
                Ok(GenResult::Flush)
            }
            BodyMode::Chunked => {
                let chunk =
                    chunk.ok_or(HttpError::Misuse("chunked write without chunk buffer"))?;
                if !content.is_empty() {
                    self.write_envelope(chunk, content.len());
                }
                self.content_written += content.len() as u64;
                Ok(GenResult::Flush)
            }
            BodyMode::Eof => {
                self.content_written += content.len() as u64;
                Ok(GenResult::Flush)
            }
        }
    }

    /// First close call after commit: advance to COMPLETING.
    fn begin_completion(&mut self, content: Option<&[u8]>) -> Result<GenResult, HttpError> {
        if content.is_some() {
            return Err(HttpError::Misuse("content on completion call"));
        }
        if let BodyMode::Fixed(n) = self.mode
            && self.content_written < n
        {
            return Err(HttpError::ContentIncomplete);
        }
        self.state = State::Completing;
        Ok(GenResult::Continue)
    }

    /// Completing: emit the terminal chunk once, then report the message
    /// end.
    fn complete(&mut self, chunk: Option<&mut Vec<u8>>) -> Result<GenResult, HttpError> {
        if self.mode == BodyMode::Chunked && !self.terminal_written {
            let chunk =
                chunk.ok_or(HttpError::Misuse("terminal chunk without chunk buffer"))?;
            self.write_terminal(chunk);
            return Ok(GenResult::Flush);
        }
        self.state = State::End;
        match self.mode {
            BodyMode::Eof => Ok(GenResult::ShutdownOut),
            _ => Ok(GenResult::Done),
        }
    }

    fn write_envelope(&mut self, buf: &mut Vec<u8>, len: usize) {
        if self.chunk_open {
            buf.extend_from_slice(b"\r\n");
        }
        buf.extend_from_slice(format!("{len:x}").as_bytes());
        buf.extend_from_slice(b"\r\n");
        self.chunk_open = true;
    }

    fn write_terminal(&mut self, buf: &mut Vec<u8>) {
        if self.chunk_open {
            buf.extend_from_slice(b"\r\n");
        }
        buf.extend_from_slice(b"0\r\n\r\n");
        self.terminal_written = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(version: Version) -> Message {
        Message::response(200, version).header("server", "filament")
    }

    #[test]
    fn commit_fixed_emits_single_content_length() {
        let mut generator = Generator::new();
        let mut info = response(Version::Http11);
        info.headers_mut().add("content-length", "9"); // stale duplicate
        info.set_content_length(5);

        let mut header = Vec::new();
        let result = generator
            .generate_response(Some(&info), Some(&mut header), None, Some(b"hello"), false)
            .unwrap();
        assert_eq!(result, GenResult::Flush);
        assert_eq!(generator.state(), State::Committed);
        assert!(!generator.is_chunking());

        let text = String::from_utf8(header).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert_eq!(text.matches("content-length").count(), 1);
        assert!(text.contains("content-length: 5\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn commit_without_length_chunks_on_http11() {
        let mut generator = Generator::new();
        let info = response(Version::Http11);

        let mut header = Vec::new();
        generator
            .generate_response(Some(&info), Some(&mut header), None, Some(b"hello"), false)
            .unwrap();
        assert!(generator.is_chunking());

        let text = String::from_utf8(header).unwrap();
        assert!(text.contains("transfer-encoding: chunked\r\n"));
        // First chunk envelope rides at the end of the header block.
        assert!(text.ends_with("\r\n\r\n5\r\n"));
    }

    #[test]
    fn chunk_envelopes_are_byte_exact() {
        let mut generator = Generator::new();
        let info = response(Version::Http11);
        let mut header = Vec::new();
        generator
            .generate_response(Some(&info), Some(&mut header), None, Some(b"hello"), false)
            .unwrap();

        // Second write: envelope closes the previous chunk first.
        let mut chunk = Vec::with_capacity(CHUNK_HEADER_SIZE);
        let result = generator
            .generate_response(None, None, Some(&mut chunk), Some(b"abc"), false)
            .unwrap();
        assert_eq!(result, GenResult::Flush);
        assert_eq!(chunk, b"\r\n3\r\n");

        // Close: CONTINUE to COMPLETING, then FLUSH with the terminal.
        let mut terminal = Vec::with_capacity(CHUNK_HEADER_SIZE);
        let result = generator
            .generate_response(None, None, Some(&mut terminal), None, true)
            .unwrap();
        assert_eq!(result, GenResult::Continue);
        assert_eq!(generator.state(), State::Completing);
        assert!(terminal.is_empty());

        let result = generator
            .generate_response(None, None, Some(&mut terminal), None, true)
            .unwrap();
        assert_eq!(result, GenResult::Flush);
        assert_eq!(terminal, b"\r\n0\r\n\r\n");

        let result = generator.generate_response(None, None, None, None, true).unwrap();
        assert_eq!(result, GenResult::Done);
        assert_eq!(generator.state(), State::End);
    }

    #[test]
    fn uncommitted_close_response_declares_zero_length() {
        let mut generator = Generator::new();
        let info = response(Version::Http11);
        let mut header = Vec::new();
        let result = generator
            .generate_response(Some(&info), Some(&mut header), None, None, true)
            .unwrap();
        assert_eq!(result, GenResult::Flush);
        assert_eq!(generator.state(), State::Completing);
        let text = String::from_utf8(header).unwrap();
        assert!(text.contains("content-length: 0\r\n"));
        assert!(!text.contains("transfer-encoding"));

        let result = generator.generate_response(None, None, None, None, true).unwrap();
        assert_eq!(result, GenResult::Done);
    }

    #[test]
    fn uncommitted_close_request_omits_framing_headers() {
        let mut generator = Generator::new();
        let info = Message::request("GET", "/", Version::Http11).header("host", "example.com");
        let mut header = Vec::new();
        generator
            .generate_request(Some(&info), Some(&mut header), None, None, true)
            .unwrap();
        let text = String::from_utf8(header).unwrap();
        assert!(text.starts_with("GET / HTTP/1.1\r\n"));
        assert!(!text.contains("content-length"));
        assert!(!text.contains("transfer-encoding"));
    }

    #[test]
    fn http10_response_without_length_shuts_down_output() {
        let mut generator = Generator::new();
        let info = response(Version::Http10);
        let mut header = Vec::new();
        generator
            .generate_response(Some(&info), Some(&mut header), None, Some(b"old"), false)
            .unwrap();
        assert!(!generator.is_chunking());
        let text = String::from_utf8(header).unwrap();
        assert!(!text.contains("transfer-encoding"));
        assert!(!text.contains("content-length"));

        let result = generator.generate_response(None, None, None, None, true).unwrap();
        assert_eq!(result, GenResult::Continue);
        let result = generator.generate_response(None, None, None, None, true).unwrap();
        assert_eq!(result, GenResult::ShutdownOut);
        assert_eq!(generator.state(), State::End);
    }

    #[test]
    fn fixed_overrun_is_rejected() {
        let mut generator = Generator::new();
        let mut info = response(Version::Http11);
        info.set_content_length(4);
        let mut header = Vec::new();
        generator
            .generate_response(Some(&info), Some(&mut header), None, Some(b"1234"), false)
            .unwrap();
        let err = generator
            .generate_response(None, None, None, Some(b"more"), false)
            .unwrap_err();
        assert!(matches!(err, HttpError::ContentOverrun));
    }

    #[test]
    fn fixed_underrun_close_is_rejected() {
        let mut generator = Generator::new();
        let mut info = response(Version::Http11);
        info.set_content_length(10);
        let mut header = Vec::new();
        generator
            .generate_response(Some(&info), Some(&mut header), None, Some(b"1234"), false)
            .unwrap();
        let err = generator
            .generate_response(None, None, None, None, true)
            .unwrap_err();
        assert!(matches!(err, HttpError::ContentIncomplete));
    }

    #[test]
    fn explicit_chunked_header_commit_as_last_folds_terminal() {
        let mut generator = Generator::new();
        let info = response(Version::Http11).header("transfer-encoding", "chunked");
        let mut header = Vec::new();
        generator
            .generate_response(Some(&info), Some(&mut header), None, None, true)
            .unwrap();
        let text = String::from_utf8(header).unwrap();
        assert_eq!(text.matches("transfer-encoding").count(), 1);
        assert!(text.ends_with("\r\n\r\n0\r\n\r\n"));

        let result = generator.generate_response(None, None, None, None, true).unwrap();
        assert_eq!(result, GenResult::Done);
    }
}
