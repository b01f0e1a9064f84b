use std::sync::Arc;
use std::thread;

use ktrace_decoder::{ByteSource, CancelToken, DecodeError, ProtocolDescriptor, StreamDecoder};
use ktrace_types::TraceTag;
use ktrace_wire::EventWidth;
use tracing::{debug, error, info, warn};

use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::log::TraceLog;
use crate::sink::DiagnosticSink;

/// Lifecycle of an ingestion session.
///
/// ```text
///   Negotiating ──▶ Polling ──▶ Terminated
///        │                          ▲
///        └──────── failure ─────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IngestState {
    Negotiating,
    Polling,
    Terminated,
}

/// Why a session ended without error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The kernel sent `Mark_Halt`.
    Halted,
    /// The record count went past [`IngestConfig::max_records`].
    LimitReached,
    /// The cancel token was tripped.
    Cancelled,
    /// The transport closed with less than a record left buffered.
    EndOfInput,
}

/// Outcome of a successful session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IngestSummary {
    pub reason: StopReason,
    /// Records decoded and appended during this session.
    pub records: usize,
    /// `None` if the session ended before negotiation finished.
    pub event_width: Option<EventWidth>,
    /// Bytes still buffered at exit, read and thrown away.
    pub discarded: usize,
}

/// Drives a [`StreamDecoder`] over a byte source until the kernel halts,
/// the record ceiling is hit, the session is cancelled, the transport
/// closes, or the stream breaks.
///
/// Decoded records go to a shared [`TraceLog`]; `Debug_Message` text is
/// also forwarded to a [`DiagnosticSink`] as it arrives.
///
/// ```text
/// ┌────────────┐     ┌───────────────┐     ┌──────────────┐
/// │ ByteSource │────▶│ StreamDecoder │────▶│ TraceLog     │◀── readers
/// └────────────┘     └───────────────┘     └──────────────┘
///                            │
///                            └── Debug_Message ──▶ DiagnosticSink
/// ```
///
/// While fewer than a frame's bytes are buffered the loop sleeps for
/// [`IngestConfig::poll_interval`]. The cancel token is checked between
/// iterations and whenever a text read times out; a read in progress is
/// never interrupted. Whatever is left in the source is drained on the
/// way out.
pub struct Ingestor<D> {
    config: IngestConfig,
    log: Arc<TraceLog>,
    sink: D,
    cancel: CancelToken,
    state: IngestState,
}

impl<D: DiagnosticSink> Ingestor<D> {
    pub fn new(config: IngestConfig, log: Arc<TraceLog>, sink: D) -> Self {
        Self {
            config,
            log,
            sink,
            cancel: CancelToken::new(),
            state: IngestState::Negotiating,
        }
    }

    /// Use an externally owned cancel token.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// A handle that stops [`run`](Self::run) at its next check.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn log(&self) -> &Arc<TraceLog> {
        &self.log
    }

    pub fn state(&self) -> IngestState {
        self.state
    }

    /// Run one session over `source`.
    ///
    /// # Errors
    ///
    /// - [`IngestError::Decode`] wrapping whichever fatal
    ///   [`DecodeError`] ended the stream, including a failed negotiation.
    /// - [`IngestError::Io`] if the source fails while waiting for the
    ///   negotiation byte.
    ///
    /// The log keeps every record appended before the failure.
    pub fn run<S: ByteSource>(&mut self, mut source: S) -> Result<IngestSummary, IngestError> {
        self.state = IngestState::Negotiating;
        info!("waiting for protocol negotiation");

        let outcome = match self.negotiate(&mut source) {
            Ok(Some(descriptor)) => {
                let width = descriptor.event_width();
                info!(
                    event_width = width.bytes(),
                    decode_threshold = descriptor.decode_threshold(),
                    "negotiated; polling for records"
                );
                self.state = IngestState::Polling;
                self.poll(&mut source, descriptor)
                    .map(|(reason, records)| (reason, records, Some(width)))
            }
            Ok(None) if self.cancel.is_cancelled() => Ok((StopReason::Cancelled, 0, None)),
            Ok(None) => Ok((StopReason::EndOfInput, 0, None)),
            Err(e) => Err(e),
        };

        let discarded = drain(&mut source);
        self.state = IngestState::Terminated;

        match outcome {
            Ok((reason, records, event_width)) => {
                info!(?reason, records, discarded, "trace session finished");
                Ok(IngestSummary {
                    reason,
                    records,
                    event_width,
                    discarded,
                })
            }
            Err(e) => {
                error!(error = %e, "trace session failed");
                Err(e)
            }
        }
    }

    /// Wait for the negotiation byte and resolve it.
    ///
    /// Returns `Ok(None)` if cancelled or the transport closed first.
    fn negotiate<S: ByteSource>(
        &mut self,
        source: &mut S,
    ) -> Result<Option<ProtocolDescriptor>, IngestError> {
        loop {
            if self.cancel.is_cancelled() {
                warn!("cancelled before negotiation");
                return Ok(None);
            }
            let closed = source.is_closed();
            if source.available()? >= 1 {
                let byte = source.read(1)?;
                if let Some(&first) = byte.first() {
                    return ProtocolDescriptor::resolve(first)
                        .map(Some)
                        .map_err(|source| IngestError::Decode { records: 0, source });
                }
            }
            if closed {
                warn!("byte source closed before negotiation");
                return Ok(None);
            }
            thread::sleep(self.config.poll_interval);
        }
    }

    fn poll<S: ByteSource>(
        &mut self,
        source: &mut S,
        descriptor: ProtocolDescriptor,
    ) -> Result<(StopReason, usize), IngestError> {
        let mut decoder = StreamDecoder::new(source, descriptor)
            .with_cancel(self.cancel.clone())
            .with_max_text_len(self.config.max_text_len);
        let mut count = 0usize;

        loop {
            if self.cancel.is_cancelled() {
                warn!(records = count, "ingestion cancelled");
                return Ok((StopReason::Cancelled, count));
            }

            // Sampled before the attempt so bytes written just ahead of
            // the close are still decoded.
            let closed = decoder.source_mut().is_closed();
            let record = match decoder.try_next() {
                Ok(Some(record)) => record,
                Ok(None) if closed => {
                    info!(records = count, "byte source closed");
                    return Ok((StopReason::EndOfInput, count));
                }
                Ok(None) => {
                    thread::sleep(self.config.poll_interval);
                    continue;
                }
                Err(DecodeError::Cancelled) => {
                    warn!(records = count, "ingestion cancelled mid-record");
                    return Ok((StopReason::Cancelled, count));
                }
                Err(err) => {
                    return Err(IngestError::Decode {
                        records: count,
                        source: err,
                    });
                }
            };

            count += 1;
            let tag = record.tag();
            let diagnostic = match tag {
                TraceTag::DebugMessage => record.payload_text().map(str::to_owned),
                _ => None,
            };
            self.log.append(record);

            if let Some(text) = diagnostic {
                self.sink.emit(&text);
            }

            if tag == TraceTag::MarkHalt {
                return Ok((StopReason::Halted, count));
            }
            if count > self.config.max_records {
                debug!(max_records = self.config.max_records, "record ceiling reached");
                return Ok((StopReason::LimitReached, count));
            }
        }
    }
}

fn drain<S: ByteSource>(source: &mut S) -> usize {
    match source.discard_pending() {
        Ok(0) => 0,
        Ok(n) => {
            warn!(bytes = n, "discarded unread bytes");
            n
        }
        Err(e) => {
            warn!(error = %e, "failed to drain byte source");
            0
        }
    }
}
