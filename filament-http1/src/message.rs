//! Logical HTTP messages handed to the output framer.
//!
//! A `Message` is built by the application layer, handed to the framer
//! once, and treated as immutable after commit: the header block is
//! serialized exactly once, so changing fields afterwards has no effect
//! on the wire.

/// HTTP protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Http10,
    Http11,
}

impl Version {
    pub fn as_str(&self) -> &'static str {
        match self {
            Version::Http10 => "HTTP/1.0",
            Version::Http11 => "HTTP/1.1",
        }
    }
}

/// Order-preserving header sequence. Duplicate names are allowed; `set`
/// is the exactly-once path used for framing headers like
/// `content-length`.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    fields: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, preserving order and duplicates.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Replace every occurrence of `name` with a single field.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.fields
            .retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.fields.push((name.to_string(), value.into()));
    }

    /// First value for `name` (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone)]
pub enum MessageKind {
    Request { method: String, target: String },
    Response { status: u16, reason: Option<String> },
}

/// A logical HTTP message: request or status line, version, headers, and
/// an optional body-length hint consumed by the generator's framing
/// decision.
#[derive(Debug, Clone)]
pub struct Message {
    kind: MessageKind,
    version: Version,
    headers: Headers,
    content_length: Option<u64>,
}

impl Message {
    pub fn request(
        method: impl Into<String>,
        target: impl Into<String>,
        version: Version,
    ) -> Self {
        Self {
            kind: MessageKind::Request {
                method: method.into(),
                target: target.into(),
            },
            version,
            headers: Headers::new(),
            content_length: None,
        }
    }

    pub fn response(status: u16, version: Version) -> Self {
        Self {
            kind: MessageKind::Response {
                status,
                reason: None,
            },
            version,
            headers: Headers::new(),
            content_length: None,
        }
    }

    /// Builder-style header append.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    /// Builder-style body-length hint.
    pub fn content_length_hint(mut self, length: u64) -> Self {
        self.content_length = Some(length);
        self
    }

    pub fn kind(&self) -> &MessageKind {
        &self.kind
    }

    pub fn is_request(&self) -> bool {
        matches!(self.kind, MessageKind::Request { .. })
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Declared body length: the hint if set, else a parseable
    /// `content-length` header.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
            .or_else(|| self.headers.get("content-length")?.parse().ok())
    }

    /// Fix the body length before commit: sets the hint and exactly one
    /// `content-length` header.
    pub fn set_content_length(&mut self, length: u64) {
        self.content_length = Some(length);
        self.headers.set("content-length", length.to_string());
    }
}

/// Default reason phrases for common status codes.
pub fn status_reason(status: u16) -> &'static str {
    match status {
        100 => "Continue",
        101 => "Switching Protocols",
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        206 => "Partial Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        413 => "Payload Too Large",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "",
    }
}
