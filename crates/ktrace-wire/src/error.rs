/// Errors raised by the low-level wire codec.
///
/// These cover the two things that can go wrong below the record layer:
/// the negotiation byte names a width the protocol does not support, or
/// a scalar read/write runs off the end of its buffer or overflows its
/// declared width.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The negotiation byte was not one of 1, 2, 4 or 8.
    #[error("unsupported event identifier width: {found} (expected 1, 2, 4 or 8)")]
    UnsupportedEventWidth { found: u8 },

    /// Input ended before a complete scalar could be read.
    #[error("unexpected end of frame at offset {offset}")]
    UnexpectedEof { offset: usize },

    /// A value does not fit in the scalar width it is being written as.
    #[error("value {value} does not fit in {width} byte(s)")]
    ValueTooWide { value: u64, width: usize },
}
