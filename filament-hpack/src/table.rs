//! The HPACK header table: static entries plus the size-bounded dynamic
//! table (RFC 7541 Sections 2.3.1-2.3.2).
//!
//! The table is created per connection direction (one for encode, one for
//! decode) and mutated only by the thread owning that direction. Dynamic
//! entries are stored newest-first, so positional scans resolve the
//! "most recent duplicate wins" rule and keep the name lookup pointing at
//! the highest remaining insertion index without a separate index map.

use std::collections::VecDeque;

use crate::field::HeaderField;

/// HPACK static table entries: (name, value). 61 entries indexed 1..61
/// (RFC 7541 Appendix A).
const STATIC_TABLE: &[(&str, &str)] = &[
    (":authority", ""),                   // 1
    (":method", "GET"),                   // 2
    (":method", "POST"),                  // 3
    (":path", "/"),                       // 4
    (":path", "/index.html"),             // 5
    (":scheme", "http"),                  // 6
    (":scheme", "https"),                 // 7
    (":status", "200"),                   // 8
    (":status", "204"),                   // 9
    (":status", "206"),                   // 10
    (":status", "304"),                   // 11
    (":status", "400"),                   // 12
    (":status", "404"),                   // 13
    (":status", "500"),                   // 14
    ("accept-charset", ""),               // 15
    ("accept-encoding", "gzip, deflate"), // 16
    ("accept-language", ""),              // 17
    ("accept-ranges", ""),                // 18
    ("accept", ""),                       // 19
    ("access-control-allow-origin", ""),  // 20
    ("age", ""),                          // 21
    ("allow", ""),                        // 22
    ("authorization", ""),                // 23
    ("cache-control", ""),                // 24
    ("content-disposition", ""),          // 25
    ("content-encoding", ""),             // 26
    ("content-language", ""),             // 27
    ("content-length", ""),               // 28
    ("content-location", ""),             // 29
    ("content-range", ""),                // 30
    ("content-type", ""),                 // 31
    ("cookie", ""),                       // 32
    ("date", ""),                         // 33
    ("etag", ""),                         // 34
    ("expect", ""),                       // 35
    ("expires", ""),                      // 36
    ("from", ""),                         // 37
    ("host", ""),                         // 38
    ("if-match", ""),                     // 39
    ("if-modified-since", ""),            // 40
    ("if-none-match", ""),                // 41
    ("if-range", ""),                     // 42
    ("if-unmodified-since", ""),          // 43
    ("last-modified", ""),                // 44
    ("link", ""),                         // 45
    ("location", ""),                     // 46
    ("max-forwards", ""),                 // 47
    ("proxy-authenticate", ""),           // 48
    ("proxy-authorization", ""),          // 49
    ("range", ""),                        // 50
    ("referer", ""),                      // 51
    ("refresh", ""),                      // 52
    ("retry-after", ""),                  // 53
    ("server", ""),                       // 54
    ("set-cookie", ""),                   // 55
    ("strict-transport-security", ""),    // 56
    ("transfer-encoding", ""),            // 57
    ("user-agent", ""),                   // 58
    ("vary", ""),                         // 59
    ("via", ""),                          // 60
    ("www-authenticate", ""),             // 61
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    /// 1-based index into the static table.
    Static { index: usize },
    /// Monotonic insertion counter, never reused.
    Dynamic { insertion: u64 },
}

/// A resolved table entry: the field plus where it lives.
///
/// Entries are cheap snapshots. A dynamic entry's combined wire index
/// shifts as newer entries are inserted; resolve it at encode time with
/// [`HeaderTable::wire_index`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    field: HeaderField,
    kind: EntryKind,
}

impl Entry {
    pub fn field(&self) -> &HeaderField {
        &self.field
    }

    pub fn is_static(&self) -> bool {
        matches!(self.kind, EntryKind::Static { .. })
    }

    /// Insertion index of a dynamic entry. Static entries have none and
    /// order below every dynamic entry.
    pub fn insertion_index(&self) -> Option<u64> {
        match self.kind {
            EntryKind::Static { .. } => None,
            EntryKind::Dynamic { insertion } => Some(insertion),
        }
    }

    fn size(&self) -> usize {
        self.field.size()
    }
}

fn static_entry(pos: usize) -> Entry {
    let (name, value) = STATIC_TABLE[pos];
    Entry {
        field: HeaderField::new(name, value),
        kind: EntryKind::Static { index: pos + 1 },
    }
}

/// The header table for one connection direction.
///
/// Static entries are immutable and never evicted. Dynamic entries form a
/// FIFO bounded by `capacity`; adding a fitting entry evicts the oldest
/// entries first, and an entry whose own size exceeds the capacity is
/// rejected outright, leaving the table unchanged.
pub struct HeaderTable {
    /// Newest-first. Front is combined index 62.
    dynamic: VecDeque<Entry>,
    dynamic_size: usize,
    capacity: usize,
    next_insertion: u64,
}

impl HeaderTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            dynamic: VecDeque::new(),
            dynamic_size: 0,
            capacity,
            next_insertion: 0,
        }
    }

    /// Full-field lookup. A dynamic match wins over a static match, and
    /// among dynamic duplicates the most recently inserted wins.
    pub fn lookup(&self, field: &HeaderField) -> Option<Entry> {
        if let Some(e) = self.dynamic.iter().find(|e| e.field == *field) {
            return Some(e.clone());
        }
        STATIC_TABLE
            .iter()
            .position(|(n, v)| *n == field.name() && *v == field.value())
            .map(static_entry)
    }

    /// Name-only lookup. The most recent dynamic entry with the name wins
    /// over any static entry; otherwise the first static entry matches.
    pub fn lookup_name(&self, name: &str) -> Option<Entry> {
        if let Some(e) = self.dynamic.iter().find(|e| e.field.name() == name) {
            return Some(e.clone());
        }
        STATIC_TABLE
            .iter()
            .position(|(n, _)| *n == name)
            .map(static_entry)
    }

    /// Add a field to the dynamic table.
    ///
    /// Returns `None` when the entry alone exceeds the capacity; the table
    /// is left unchanged. Otherwise the oldest entries are evicted until
    /// the new entry fits (boundary inclusive) and the new entry is
    /// returned.
    pub fn add(&mut self, field: HeaderField) -> Option<Entry> {
        let entry_size = field.size();
        if entry_size > self.capacity {
            return None;
        }
        while self.dynamic_size + entry_size > self.capacity && !self.dynamic.is_empty() {
            if let Some(evicted) = self.dynamic.pop_back() {
                self.dynamic_size -= evicted.size();
            }
        }
        let entry = Entry {
            field,
            kind: EntryKind::Dynamic {
                insertion: self.next_insertion,
            },
        };
        self.next_insertion += 1;
        self.dynamic_size += entry_size;
        self.dynamic.push_front(entry.clone());
        Some(entry)
    }

    /// Change the capacity. Shrinking evicts oldest-first down to the new
    /// limit; growing only allows future adds to succeed.
    pub fn resize(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.dynamic_size > self.capacity && !self.dynamic.is_empty() {
            if let Some(evicted) = self.dynamic.pop_back() {
                self.dynamic_size -= evicted.size();
            }
        }
    }

    /// Entry by 1-based combined wire index: 1..=61 static, 62.. dynamic
    /// newest-first.
    pub fn get(&self, index: usize) -> Option<Entry> {
        if index == 0 {
            return None;
        }
        if index <= STATIC_TABLE.len() {
            return Some(static_entry(index - 1));
        }
        self.dynamic.get(index - STATIC_TABLE.len() - 1).cloned()
    }

    /// Current combined wire index of an entry, or `None` if a dynamic
    /// entry has been evicted since it was resolved.
    pub fn wire_index(&self, entry: &Entry) -> Option<usize> {
        match entry.kind {
            EntryKind::Static { index } => Some(index),
            EntryKind::Dynamic { .. } => self
                .dynamic
                .iter()
                .position(|e| e == entry)
                .map(|p| p + STATIC_TABLE.len() + 1),
        }
    }

    /// Number of dynamic entries.
    pub fn entry_count(&self) -> usize {
        self.dynamic.len()
    }

    /// Total size of all dynamic entries, per the RFC accounting rule.
    pub fn dynamic_size(&self) -> usize {
        self.dynamic_size
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn static_len() -> usize {
        STATIC_TABLE.len()
    }
}
