/// Implementation of `ktrace listen`.
///
/// The input is pumped into a [`pipe`] by a plain reader thread so the
/// decoder sees serial-line semantics (bytes trickle in, reads time out).
/// The ingestion loop runs on a tokio blocking thread while the async side
/// prints new records on every poll tick and trips the cancel token on
/// Ctrl-C.
///
/// ```text
///  file / stdin ──▶ reader thread ──▶ PipeWriter ─┐
///                                                 ▼
///                       spawn_blocking: Ingestor::run(PipeSource)
///                                                 │ append
///                                                 ▼
///  stdout ◀── JSON elements ◀── interval tick ◀── TraceLog::take_new
/// ```
///
/// # Output
///
/// stdout carries a single JSON array, one pretty-printed object per
/// record, written incrementally:
///
/// ```text
/// [
/// {
///   "name": "Mark_Init",
///   "tag": 3,
///   "time": 0,
///   "heap": 512
/// },
/// ...
/// ]
/// ```
///
/// `Debug_Message` text goes to stderr verbatim as it arrives. A one-line
/// summary follows on stderr when the session ends.
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use ktrace_decoder::{CancelToken, PipeWriter, pipe};
use ktrace_ingest::{IngestConfig, IngestSummary, Ingestor, StderrSink, StopReason, TraceLog};
use ktrace_types::Record;
use tracing::{debug, warn};

use crate::ListenArgs;

const READ_CHUNK: usize = 4096;

/// Run the `ktrace listen` command.
///
/// # Errors
///
/// Returns an error if the input cannot be opened, the async runtime cannot
/// start, stdout cannot be written, or the stream turns out to be malformed.
/// Records decoded before a stream error are still printed.
pub fn run(args: &ListenArgs) -> Result<()> {
    let input = open_input(&args.input)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("cannot start async runtime")?;
    runtime.block_on(listen(args, input))
}

async fn listen(args: &ListenArgs, input: Box<dyn Read + Send>) -> Result<()> {
    let poll_interval = Duration::from_millis(args.poll_ms);
    let config = IngestConfig::default()
        .with_max_records(args.max)
        .with_poll_interval(poll_interval)
        .with_max_text_len(args.max_text);

    let (writer, source) = pipe(Duration::from_millis(args.read_timeout_ms));
    let pump_stop = CancelToken::new();
    let reader = {
        let stop = pump_stop.clone();
        thread::spawn(move || pump(input, writer, &stop))
    };

    let log = Arc::new(TraceLog::new());
    let mut ingestor = Ingestor::new(config, Arc::clone(&log), StderrSink);
    let cancel = ingestor.cancel_token();
    let mut session = tokio::task::spawn_blocking(move || ingestor.run(source));

    let mut out = JsonArray::open(io::stdout())?;
    // interval() panics on a zero period
    let mut ticker = tokio::time::interval(poll_interval.max(Duration::from_millis(1)));

    let outcome = loop {
        tokio::select! {
            joined = &mut session => break joined.context("ingestion task failed")?,
            _ = ticker.tick() => out.push_all(&log.take_new())?,
            signal = tokio::signal::ctrl_c() => {
                signal.context("cannot listen for Ctrl-C")?;
                warn!("interrupted; stopping");
                cancel.cancel();
            }
        }
    };

    out.push_all(&log.take_new())?;
    out.close()?;

    pump_stop.cancel();
    if reader.is_finished() {
        if let Ok(forwarded) = reader.join() {
            debug!(bytes = forwarded, "reader thread finished");
        }
    } else {
        // A read blocked on stdin cannot be interrupted; process exit ends it.
        debug!("reader thread still blocked on input; leaving it to process exit");
    }

    let summary = outcome.context("trace stream failed")?;
    eprintln!("{}", describe(&summary));
    Ok(())
}

fn open_input(path: &Path) -> Result<Box<dyn Read + Send>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(io::stdin()));
    }
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    Ok(Box::new(file))
}

/// Copy `input` into the pipe until EOF, a read error, or `stop`.
///
/// The writer is dropped on return, which closes the pipe. Returns the
/// number of bytes forwarded.
fn pump(mut input: impl Read, writer: PipeWriter, stop: &CancelToken) -> u64 {
    let mut buf = [0u8; READ_CHUNK];
    let mut forwarded = 0u64;
    while !stop.is_cancelled() {
        match input.read(&mut buf) {
            Ok(0) => {
                debug!("input reached end of file");
                break;
            }
            Ok(n) => {
                writer.write(&buf[..n]);
                forwarded += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => {
                warn!(error = %e, "input read failed; closing stream");
                break;
            }
        }
    }
    forwarded
}

fn describe(summary: &IngestSummary) -> String {
    let reason = match summary.reason {
        StopReason::Halted => "kernel halted",
        StopReason::LimitReached => "record limit reached",
        StopReason::Cancelled => "cancelled",
        StopReason::EndOfInput => "end of input",
    };
    let width = summary
        .event_width
        .map_or_else(|| "not negotiated".to_string(), |w| format!("{}-byte events", w.bytes()));
    let mut line = format!("{} records ({width}), stopped: {reason}", summary.records);
    if summary.discarded > 0 {
        line.push_str(&format!(", {} trailing bytes discarded", summary.discarded));
    }
    line
}

// ── JSON array writer ─────────────────────────────────────────────────────────

/// Streams records as the elements of one JSON array.
struct JsonArray<W: Write> {
    out: W,
    empty: bool,
}

impl<W: Write> JsonArray<W> {
    fn open(mut out: W) -> Result<Self> {
        out.write_all(b"[")?;
        out.flush()?;
        Ok(Self { out, empty: true })
    }

    fn push_all(&mut self, records: &[Record]) -> Result<()> {
        for record in records {
            self.out.write_all(if self.empty { b"\n" } else { b",\n" })?;
            serde_json::to_writer_pretty(&mut self.out, record)?;
            self.empty = false;
        }
        self.out.flush()?;
        Ok(())
    }

    fn close(mut self) -> Result<()> {
        self.out.write_all(if self.empty { b"]\n" } else { b"\n]\n" })?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ktrace_decoder::ByteSource;
    use ktrace_types::{FieldValue, TraceTag};

    fn idle(time: u64) -> Record {
        Record::new(TraceTag::MarkIdle, vec![("time", FieldValue::Uint(time))])
    }

    #[test]
    fn json_array_is_well_formed() {
        let mut buf = Vec::new();
        let mut arr = JsonArray::open(&mut buf).unwrap();
        arr.push_all(&[idle(1)]).unwrap();
        arr.push_all(&[]).unwrap();
        arr.push_all(&[idle(2)]).unwrap();
        arr.close().unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        let times: Vec<_> = parsed
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["time"].as_u64().unwrap())
            .collect();
        assert_eq!(times, [1, 2]);
    }

    #[test]
    fn empty_array() {
        let mut buf = Vec::new();
        JsonArray::open(&mut buf).unwrap().close().unwrap();
        assert_eq!(buf, b"[]\n");
    }

    #[test]
    fn pump_forwards_input_then_closes_the_pipe() {
        let (writer, mut source) = pipe(Duration::from_millis(10));
        let forwarded = pump(&[1u8, 2, 3][..], writer, &CancelToken::new());
        assert_eq!(forwarded, 3);
        assert!(source.is_closed());
        assert_eq!(source.read(8).unwrap(), [1, 2, 3]);
    }

    #[test]
    fn pump_stops_once_asked() {
        let (writer, mut source) = pipe(Duration::from_millis(10));
        let stop = CancelToken::new();
        stop.cancel();
        assert_eq!(pump(io::repeat(7), writer, &stop), 0);
        assert!(source.is_closed());
        assert_eq!(source.available().unwrap(), 0);
    }
}
