use ktrace_types::{FieldKind, FieldValue, Record, TraceTag};
use ktrace_wire::frame::{TAG_SCALAR, TEXT_TERMINATOR};
use tracing::{debug, trace};

use crate::cancel::CancelToken;
use crate::descriptor::ProtocolDescriptor;
use crate::error::DecodeError;
use crate::source::ByteSource;

/// Incremental decoder over a live [`ByteSource`].
///
/// Each call to [`try_next`](Self::try_next) makes one attempt at one
/// record:
///
/// ```text
///   available < threshold ──▶ Ok(None)          (nothing consumed)
///            │
///            ▼
///   read frame (threshold bytes)
///            │
///   tag = u16 at 0 ─── out of range ──▶ MalformedTag
///            │
///   fixed fields from frame prefix
///            │
///   text tag? ── yes ──▶ read_one until 0x00 (replaces handle slot)
///            │
///            ▼
///   Ok(Some(record))
/// ```
///
/// Every record occupies one full frame on the wire: the firmware sends
/// its whole tagged union regardless of which member is live, so bytes
/// past a tag's fixed size are padding and are dropped with the frame.
///
/// A record is either produced whole or not at all. After any error the
/// stream is abandoned and further attempts fail with
/// [`DecodeError::StreamAbandoned`].
///
/// # Example
///
/// ```rust
/// use ktrace_decoder::{SliceSource, StreamDecoder};
///
/// // width 2, then Mark_Halt at t=7
/// let mut bytes = vec![2u8, 4, 0, 7, 0, 0, 0, 0, 0, 0, 0];
/// bytes.resize(1 + 12, 0);
///
/// let mut decoder = StreamDecoder::negotiate(SliceSource::new(bytes)).unwrap();
/// let record = decoder.try_next().unwrap().unwrap();
/// assert_eq!(record.name(), "Mark_Halt");
/// assert_eq!(record.time(), Some(7));
/// ```
pub struct StreamDecoder<S> {
    source: S,
    descriptor: ProtocolDescriptor,
    cancel: Option<CancelToken>,
    max_text_len: Option<usize>,
    state: DecoderState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DecoderState {
    Ready,
    Abandoned,
}

impl<S: ByteSource> StreamDecoder<S> {
    /// Wrap a source whose negotiation byte has already been consumed.
    pub fn new(source: S, descriptor: ProtocolDescriptor) -> Self {
        Self {
            source,
            descriptor,
            cancel: None,
            max_text_len: None,
            state: DecoderState::Ready,
        }
    }

    /// Read the negotiation byte from `source` and resolve the descriptor.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::TransportShortfall`] if no byte arrives within the
    ///   source's timeout.
    /// - [`DecodeError::Negotiation`] for an unsupported width.
    pub fn negotiate(mut source: S) -> Result<Self, DecodeError> {
        let byte = source.read(1)?;
        let Some(&first) = byte.first() else {
            return Err(DecodeError::TransportShortfall {
                expected: 1,
                actual: 0,
            });
        };
        let descriptor = ProtocolDescriptor::resolve(first)?;
        Ok(Self::new(source, descriptor))
    }

    /// Observe `token` whenever a text read times out.
    #[must_use]
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Fail text reads that run past `limit` bytes without a terminator.
    #[must_use]
    pub fn with_max_text_len(mut self, limit: Option<usize>) -> Self {
        self.max_text_len = limit;
        self
    }

    pub fn descriptor(&self) -> &ProtocolDescriptor {
        &self.descriptor
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Attempt to decode one record.
    ///
    /// Returns `Ok(None)` when fewer than
    /// [`decode_threshold`](ProtocolDescriptor::decode_threshold) bytes
    /// are buffered. Nothing is consumed in that case and the caller
    /// should retry later.
    ///
    /// The text tail of definition and debug records is read one byte at
    /// a time with no length limit (unless configured). If the terminator
    /// never arrives this call keeps waiting, checking the cancel token
    /// each time a byte read times out. A source that reports itself
    /// closed ends the wait with [`DecodeError::UnterminatedText`].
    ///
    /// # Errors
    ///
    /// See [`DecodeError`]. Every error is fatal for the stream.
    pub fn try_next(&mut self) -> Result<Option<Record>, DecodeError> {
        if self.state == DecoderState::Abandoned {
            return Err(DecodeError::StreamAbandoned);
        }
        let result = self.attempt();
        if result.is_err() {
            self.state = DecoderState::Abandoned;
        }
        result
    }

    /// Iterate over records that can be decoded right now.
    ///
    /// The iterator ends when the source runs dry; calling `records()`
    /// again later picks up where the last one stopped. An error is
    /// yielded once and ends the iteration.
    pub fn records(&mut self) -> Records<'_, S> {
        Records {
            decoder: self,
            done: false,
        }
    }

    fn attempt(&mut self) -> Result<Option<Record>, DecodeError> {
        let threshold = self.descriptor.decode_threshold();
        if self.source.available()? < threshold {
            return Ok(None);
        }

        let frame = self.source.read(threshold)?;
        if frame.len() < threshold {
            return Err(DecodeError::TransportShortfall {
                expected: threshold,
                actual: frame.len(),
            });
        }

        let tag = TraceTag::from_wire(TAG_SCALAR.read(&frame, 0)?)?;
        let layout = self.descriptor.layout(tag);

        let mut fields = Vec::with_capacity(layout.fields.len());
        for field in &layout.fields {
            let value = if field.kind == FieldKind::HandleSlot {
                // Pointer value is meaningless off-target; text follows the frame
                FieldValue::Text(String::new())
            } else {
                FieldValue::Uint(field.scalar.read(&frame, field.offset)?)
            };
            fields.push((field.name, value));
        }

        if tag.carries_text() {
            let text = self.read_text(tag)?;
            if let Some((_, slot)) = fields.first_mut() {
                *slot = FieldValue::Text(text);
            }
        }

        let record = Record::new(tag, fields);
        trace!(%record, "decoded trace record");
        Ok(Some(record))
    }

    fn read_text(&mut self, tag: TraceTag) -> Result<String, DecodeError> {
        let mut text = String::new();
        loop {
            match self.source.read_one()? {
                Some(TEXT_TERMINATOR) => return Ok(text),
                Some(byte) if byte.is_ascii() => {
                    if let Some(limit) = self.max_text_len.filter(|limit| text.len() >= *limit) {
                        return Err(DecodeError::TextTooLong {
                            tag: tag.name(),
                            limit,
                        });
                    }
                    text.push(char::from(byte));
                }
                Some(byte) => {
                    return Err(DecodeError::NonAsciiText {
                        tag: tag.name(),
                        byte,
                        offset: text.len(),
                    });
                }
                None if self.source.is_closed() && self.source.available()? == 0 => {
                    return Err(DecodeError::UnterminatedText {
                        tag: tag.name(),
                        received: text.len(),
                    });
                }
                None => {
                    if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                        return Err(DecodeError::Cancelled);
                    }
                    debug!(
                        tag = tag.name(),
                        received = text.len(),
                        "waiting for text terminator"
                    );
                }
            }
        }
    }
}

/// Iterator returned by [`StreamDecoder::records`].
pub struct Records<'a, S> {
    decoder: &'a mut StreamDecoder<S>,
    done: bool,
}

impl<S: ByteSource> Iterator for Records<'_, S> {
    type Item = Result<Record, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.decoder.try_next() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
