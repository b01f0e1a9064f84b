use std::sync::{Mutex, MutexGuard, PoisonError};

use ktrace_types::Record;

#[derive(Debug, Default)]
struct Inner {
    records: Vec<Record>,
    /// Index one past the last record handed out by `slice_since` or
    /// `take_new`.
    cursor: usize,
}

/// Append-only log of decoded records, shared between the ingestion
/// thread and any number of readers.
///
/// The producer only ever calls [`append`](Self::append). Readers get
/// cloned snapshots, so a slow reader never holds the lock while it
/// renders. The log keeps one delivery cursor for the presentation
/// layer's "give me what's new" polling; resetting it to zero is the only
/// mutation a reader can make.
///
/// ```text
///   records: [ r0 r1 r2 r3 r4 ]
///                      ▲        ▲
///                   cursor     len
///   slice_since(0) → ([r3, r4], len), cursor = len
///   take_new()     → [],               cursor = len
/// ```
#[derive(Debug, Default)]
pub struct TraceLog {
    inner: Mutex<Inner>,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, record: Record) {
        self.lock().records.push(record);
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    /// Records not yet delivered at or after `cursor`, and the log length
    /// at call time.
    ///
    /// Reading starts from whichever is further along, `cursor` or the
    /// delivery cursor, clamped to the length. The delivery cursor then
    /// moves to the end, so a second call with the same `cursor` returns
    /// nothing until more records are appended or
    /// [`reset_cursor`](Self::reset_cursor) rewinds it.
    pub fn slice_since(&self, cursor: usize) -> (Vec<Record>, usize) {
        let mut inner = self.lock();
        let len = inner.records.len();
        let start = cursor.max(inner.cursor).min(len);
        let fresh = inner.records[start..].to_vec();
        inner.cursor = len;
        (fresh, len)
    }

    /// Records appended since the last delivery, advancing the delivery
    /// cursor to the end of the log.
    pub fn take_new(&self) -> Vec<Record> {
        self.slice_since(0).0
    }

    /// Rewind the delivery cursor so the next
    /// [`slice_since`](Self::slice_since) or [`take_new`](Self::take_new)
    /// returns the whole log again.
    pub fn reset_cursor(&self) {
        self.lock().cursor = 0;
    }

    pub fn cursor(&self) -> usize {
        self.lock().cursor
    }

    /// A copy of every record so far.
    pub fn snapshot(&self) -> Vec<Record> {
        self.lock().records.clone()
    }
}
