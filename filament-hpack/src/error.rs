//! HPACK decode errors.
//!
//! Table overflow is not an error: an oversized add is a defined
//! no-entry result from [`HeaderTable::add`](crate::table::HeaderTable::add)
//! that callers handle by falling back to literal encoding.

/// Errors produced while decoding a header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HpackError {
    /// The block ended mid-representation.
    Truncated,
    /// An indexed representation referenced an unpopulated index.
    InvalidIndex(u64),
    /// A string literal had the Huffman flag set; this decoder only
    /// accepts raw literals.
    Huffman,
    /// A dynamic table size update exceeded the protocol-negotiated
    /// maximum.
    SizeUpdate(usize),
    /// A string literal was not valid UTF-8.
    InvalidString,
}

impl std::fmt::Display for HpackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Truncated => write!(f, "truncated header block"),
            Self::InvalidIndex(i) => write!(f, "invalid table index {i}"),
            Self::Huffman => write!(f, "huffman-coded literal not supported"),
            Self::SizeUpdate(n) => write!(f, "table size update {n} exceeds negotiated maximum"),
            Self::InvalidString => write!(f, "string literal is not valid UTF-8"),
        }
    }
}

impl std::error::Error for HpackError {}
