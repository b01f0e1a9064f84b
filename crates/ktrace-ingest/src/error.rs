use ktrace_decoder::DecodeError;

/// Errors that terminate an ingestion session in the failed state.
///
/// Cancellation is not among them: a stop request ends the session
/// successfully with [`StopReason::Cancelled`](crate::StopReason::Cancelled).
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("trace stream decode failed after {records} record(s): {source}")]
    Decode {
        records: usize,
        #[source]
        source: DecodeError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// The underlying decode error, if that is what ended the session.
    pub fn decode_error(&self) -> Option<&DecodeError> {
        match self {
            Self::Decode { source, .. } => Some(source),
            Self::Io(_) => None,
        }
    }
}
