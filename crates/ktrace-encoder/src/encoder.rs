use ktrace_types::{FieldValue, Record, TraceTag};
use ktrace_wire::EventWidth;

use crate::error::EncodeError;
use crate::frame_writer::write_record;

/// Trace stream encoder. Produces the byte stream the kernel's serial
/// tracer emits.
///
/// Records are accumulated through chainable builder methods and
/// serialized in one go by [`encode`](Self::encode). This is the inverse
/// of the stream decoder and is used to drive it from replayed captures,
/// tests and benchmarks.
///
/// # Usage
///
/// ```rust
/// use ktrace_encoder::TraceEncoder;
/// use ktrace_wire::EventWidth;
///
/// let bytes = TraceEncoder::new(EventWidth::Two)
///     .mark_init(0, 512)
///     .def_task("blink", 1)
///     .mark_start(10, 1)
///     .debug_message("boot ok\n")
///     .mark_halt(99)
///     .encode()
///     .unwrap();
/// assert_eq!(bytes[0], 2);
/// ```
///
/// # Output layout
///
/// ```text
/// ┌──────────────┬──────────────────────────────────────────┐
/// │ [1 byte]     │ Negotiation byte (event id width)        │
/// │ [frame]      │ Record 0 (tag + fields + padding)        │
/// │ [text + NUL] │   only for definition/debug records      │
/// │ [frame]      │ Record 1 ...                             │
/// │ ...          │                                          │
/// └──────────────┴──────────────────────────────────────────┘
/// ```
pub struct TraceEncoder {
    width: EventWidth,
    records: Vec<Record>,
}

impl TraceEncoder {
    pub fn new(width: EventWidth) -> Self {
        Self {
            width,
            records: Vec::new(),
        }
    }

    pub fn width(&self) -> EventWidth {
        self.width
    }

    /// Number of records queued so far.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Queue an already-built record.
    pub fn record(&mut self, record: Record) -> &mut Self {
        self.records.push(record);
        self
    }

    fn push(&mut self, tag: TraceTag, fields: Vec<(&'static str, FieldValue)>) -> &mut Self {
        self.record(Record::new(tag, fields))
    }

    // ── Definitions ───────────────────────────────────────────────────

    pub fn def_task(&mut self, handle: &str, instance: u8) -> &mut Self {
        self.push(
            TraceTag::DefTask,
            vec![
                ("handle", FieldValue::Text(handle.to_string())),
                ("instance", FieldValue::Uint(u64::from(instance))),
            ],
        )
    }

    pub fn def_event(&mut self, handle: &str, event: u64) -> &mut Self {
        self.push(
            TraceTag::DefEvent,
            vec![
                ("handle", FieldValue::Text(handle.to_string())),
                ("event", FieldValue::Uint(event)),
            ],
        )
    }

    pub fn def_alloc(&mut self, handle: &str, bytes: u16) -> &mut Self {
        self.push(
            TraceTag::DefAlloc,
            vec![
                ("handle", FieldValue::Text(handle.to_string())),
                ("bytes", FieldValue::Uint(u64::from(bytes))),
            ],
        )
    }

    // ── Marks ─────────────────────────────────────────────────────────

    pub fn mark_init(&mut self, time: u64, heap: u16) -> &mut Self {
        self.push(
            TraceTag::MarkInit,
            vec![
                ("time", FieldValue::Uint(time)),
                ("heap", FieldValue::Uint(u64::from(heap))),
            ],
        )
    }

    pub fn mark_halt(&mut self, time: u64) -> &mut Self {
        self.push(TraceTag::MarkHalt, vec![("time", FieldValue::Uint(time))])
    }

    pub fn mark_start(&mut self, time: u64, instance: u8) -> &mut Self {
        self.mark_instance(TraceTag::MarkStart, time, instance)
    }

    pub fn mark_stop(&mut self, time: u64, instance: u8) -> &mut Self {
        self.mark_instance(TraceTag::MarkStop, time, instance)
    }

    fn mark_instance(&mut self, tag: TraceTag, time: u64, instance: u8) -> &mut Self {
        self.push(
            tag,
            vec![
                ("time", FieldValue::Uint(time)),
                ("instance", FieldValue::Uint(u64::from(instance))),
            ],
        )
    }

    pub fn mark_event(&mut self, time: u64, event: u64) -> &mut Self {
        self.push(
            TraceTag::MarkEvent,
            vec![
                ("time", FieldValue::Uint(time)),
                ("event", FieldValue::Uint(event)),
            ],
        )
    }

    pub fn mark_idle(&mut self, time: u64) -> &mut Self {
        self.push(TraceTag::MarkIdle, vec![("time", FieldValue::Uint(time))])
    }

    pub fn mark_wake(&mut self, time: u64) -> &mut Self {
        self.push(TraceTag::MarkWake, vec![("time", FieldValue::Uint(time))])
    }

    // ── Errors ────────────────────────────────────────────────────────

    /// Queue an error record that carries no fields, e.g.
    /// `Error_Max_Task`. Tags that do declare fields fail at
    /// [`encode`](Self::encode) with [`EncodeError::MissingField`].
    pub fn error(&mut self, tag: TraceTag) -> &mut Self {
        self.push(tag, Vec::new())
    }

    /// `Error_Undefined_Event` or `Error_Duplicate_Event`.
    pub fn error_event(&mut self, tag: TraceTag, event: u64) -> &mut Self {
        self.push(tag, vec![("event", FieldValue::Uint(event))])
    }

    /// `Error_Invalid_Task` or `Error_Missed`.
    pub fn error_instance(&mut self, tag: TraceTag, instance: u8) -> &mut Self {
        self.push(tag, vec![("instance", FieldValue::Uint(u64::from(instance)))])
    }

    // ── Debug ─────────────────────────────────────────────────────────

    pub fn debug_message(&mut self, message: &str) -> &mut Self {
        self.push(
            TraceTag::DebugMessage,
            vec![("message", FieldValue::Text(message.to_string()))],
        )
    }

    // ── Serialization ─────────────────────────────────────────────────

    /// Serialize the negotiation byte followed by every queued record.
    ///
    /// # Errors
    ///
    /// The first [`EncodeError`] hit by any record.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut out = vec![self.width.negotiation_byte()];
        self.write_frames(&mut out)?;
        Ok(out)
    }

    /// Serialize the queued records without the negotiation byte, for
    /// appending to a stream that has already been negotiated.
    ///
    /// # Errors
    ///
    /// The first [`EncodeError`] hit by any record.
    pub fn encode_frames(&self) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::new();
        self.write_frames(&mut out)?;
        Ok(out)
    }

    fn write_frames(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        for record in &self.records {
            write_record(self.width, record, out)?;
        }
        Ok(())
    }
}
