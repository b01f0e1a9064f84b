use ktrace_types::TypeError;
use ktrace_wire::WireError;

/// Errors that end a trace stream.
///
/// "Not enough bytes buffered yet" is deliberately absent: it is reported
/// as `Ok(None)` by [`StreamDecoder::try_next`](crate::StreamDecoder::try_next)
/// and simply means "try again later". Every variant here is fatal. The
/// protocol has no resynchronization marker, so once a frame is misread
/// the rest of the stream cannot be trusted.
///
/// ```text
///   DecodeError
///   ├── Negotiation(WireError)  ← first byte is not a supported width
///   ├── MalformedTag            ← tag outside the 21-entry catalogue
///   ├── TransportShortfall      ← source delivered less than it advertised
///   ├── NonAsciiText            ← definition/debug text byte above 0x7F
///   ├── TextTooLong             ← text exceeded the configured cap
///   ├── UnterminatedText        ← source closed before the text ended
///   ├── Cancelled               ← stop requested while waiting for text
///   ├── StreamAbandoned         ← decode attempted after a fatal error
///   ├── Wire(WireError)         ← scalar-level failure inside a frame
///   └── Io(std::io::Error)      ← from the byte source
/// ```
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The negotiation byte could not be turned into a descriptor.
    #[error("protocol negotiation failed: {0}")]
    Negotiation(#[source] WireError),

    #[error("malformed trace tag {value} (valid range is 0..=20)")]
    MalformedTag { value: u64 },

    /// The byte source claimed enough bytes were buffered, then returned
    /// fewer. Indicates a broken transport.
    #[error("transport shortfall: expected {expected} bytes, got {actual}")]
    TransportShortfall { expected: usize, actual: usize },

    #[error("non-ASCII byte {byte:#04X} at offset {offset} in {tag} text")]
    NonAsciiText {
        tag: &'static str,
        byte: u8,
        offset: usize,
    },

    #[error("{tag} text exceeds {limit} bytes without a terminator")]
    TextTooLong { tag: &'static str, limit: usize },

    #[error("{tag} text cut off after {received} bytes: byte source closed")]
    UnterminatedText { tag: &'static str, received: usize },

    #[error("decode cancelled while waiting for text terminator")]
    Cancelled,

    #[error("stream was abandoned after a previous fatal error")]
    StreamAbandoned,

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<TypeError> for DecodeError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::UnknownTag { value } => Self::MalformedTag { value },
            TypeError::Wire(wire) => Self::Wire(wire),
        }
    }
}
