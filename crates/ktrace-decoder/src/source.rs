use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// A byte-oriented transport the decoder pulls from.
///
/// Modelled on a serial port: the kernel pushes bytes at its own pace,
/// the host can ask how many are buffered, and reads block for at most
/// the transport's timeout.
///
/// ```text
/// ┌──────────────┬──────────────────────────────────────────────────┐
/// │ Method       │ Contract                                         │
/// ├──────────────┼──────────────────────────────────────────────────┤
/// │ available    │ bytes readable right now without blocking        │
/// │ read(n)      │ up to n bytes; fewer only if the timeout expired │
/// │ read_one     │ one byte, or None if the timeout expired         │
/// └──────────────┴──────────────────────────────────────────────────┘
/// ```
///
/// Bytes are delivered in transmission order. Nothing is assumed about
/// when they arrive.
pub trait ByteSource {
    /// Number of bytes that can be read without blocking.
    ///
    /// # Errors
    ///
    /// Any transport failure.
    fn available(&mut self) -> io::Result<usize>;

    /// Read up to `n` bytes, blocking up to the transport timeout.
    ///
    /// # Errors
    ///
    /// Any transport failure. A timeout is not an error; it shows up as
    /// a short read.
    fn read(&mut self, n: usize) -> io::Result<Vec<u8>>;

    /// Read a single byte, blocking up to the transport timeout.
    ///
    /// # Errors
    ///
    /// Any transport failure. A timeout is `Ok(None)`, and so is a
    /// closed transport with nothing left buffered.
    fn read_one(&mut self) -> io::Result<Option<u8>>;

    /// Read and drop everything currently buffered.
    ///
    /// # Returns
    ///
    /// Number of bytes discarded.
    ///
    /// # Errors
    ///
    /// Any transport failure.
    fn discard_pending(&mut self) -> io::Result<usize> {
        let pending = self.available()?;
        if pending == 0 {
            return Ok(0);
        }
        Ok(self.read(pending)?.len())
    }

    /// Whether the transport has closed. Bytes already buffered can
    /// still be read, but no more will arrive.
    ///
    /// Sources that cannot tell report `false` forever.
    fn is_closed(&self) -> bool {
        false
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn available(&mut self) -> io::Result<usize> {
        (**self).available()
    }

    fn read(&mut self, n: usize) -> io::Result<Vec<u8>> {
        (**self).read(n)
    }

    fn read_one(&mut self) -> io::Result<Option<u8>> {
        (**self).read_one()
    }

    fn discard_pending(&mut self) -> io::Result<usize> {
        (**self).discard_pending()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn available(&mut self) -> io::Result<usize> {
        (**self).available()
    }

    fn read(&mut self, n: usize) -> io::Result<Vec<u8>> {
        (**self).read(n)
    }

    fn read_one(&mut self) -> io::Result<Option<u8>> {
        (**self).read_one()
    }

    fn discard_pending(&mut self) -> io::Result<usize> {
        (**self).discard_pending()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

// ── SliceSource ───────────────────────────────────────────────────────

/// In-memory source over a captured byte stream.
///
/// Everything not yet read counts as available, and reads never block.
/// More bytes can be appended with [`extend`](Self::extend) to simulate
/// a transport that delivers in bursts.
#[derive(Clone, Debug, Default)]
pub struct SliceSource {
    data: Vec<u8>,
    pos: usize,
    closed: bool,
}

impl SliceSource {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            closed: false,
        }
    }

    /// A source over a finished capture: nothing more will arrive.
    pub fn closed(data: impl Into<Vec<u8>>) -> Self {
        Self {
            closed: true,
            ..Self::new(data)
        }
    }

    /// Append bytes as if they had just arrived.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

impl ByteSource for SliceSource {
    fn available(&mut self) -> io::Result<usize> {
        Ok(self.remaining())
    }

    fn read(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let end = self.data.len().min(self.pos + n);
        let bytes = self.data[self.pos..end].to_vec();
        self.pos = end;
        Ok(bytes)
    }

    fn read_one(&mut self) -> io::Result<Option<u8>> {
        let byte = self.data.get(self.pos).copied();
        if byte.is_some() {
            self.pos += 1;
        }
        Ok(byte)
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

// ── Pipe ──────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct PipeState {
    buf: VecDeque<u8>,
    closed: bool,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<PipeState>,
    arrived: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, PipeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Create a connected writer/source pair.
///
/// The writer side is fed by whatever owns the real transport (a thread
/// pumping stdin or a serial port); the source side hands the bytes to
/// the decoder with serial-port semantics, where every blocking read
/// gives up after `timeout`.
///
/// ```text
///   producer thread ──▶ PipeWriter ──▶ [ buffer ] ──▶ PipeSource ──▶ decoder
/// ```
pub fn pipe(timeout: Duration) -> (PipeWriter, PipeSource) {
    let shared = Arc::new(Shared::default());
    (
        PipeWriter {
            shared: Arc::clone(&shared),
        },
        PipeSource { shared, timeout },
    )
}

/// Producer half of a [`pipe`]. Dropping it closes the pipe.
#[derive(Debug)]
pub struct PipeWriter {
    shared: Arc<Shared>,
}

impl PipeWriter {
    pub fn write(&self, bytes: &[u8]) {
        let mut state = self.shared.lock();
        state.buf.extend(bytes);
        drop(state);
        self.shared.arrived.notify_all();
    }

    /// Signal that no more bytes will arrive.
    pub fn close(&self) {
        self.shared.lock().closed = true;
        self.shared.arrived.notify_all();
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        self.close();
    }
}

/// Consumer half of a [`pipe`].
#[derive(Debug)]
pub struct PipeSource {
    shared: Arc<Shared>,
    timeout: Duration,
}

impl PipeSource {
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Block until `want` bytes are buffered, the writer closes, or the
    /// timeout expires.
    fn wait_for(&self, want: usize) -> MutexGuard<'_, PipeState> {
        let deadline = Instant::now() + self.timeout;
        let mut state = self.shared.lock();
        while state.buf.len() < want && !state.closed {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            state = self
                .shared
                .arrived
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        state
    }
}

impl ByteSource for PipeSource {
    fn available(&mut self) -> io::Result<usize> {
        Ok(self.shared.lock().buf.len())
    }

    fn read(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let mut state = self.wait_for(n);
        let take = n.min(state.buf.len());
        Ok(state.buf.drain(..take).collect())
    }

    fn read_one(&mut self) -> io::Result<Option<u8>> {
        // Closed and empty also reads as None; callers ask `is_closed`.
        Ok(self.wait_for(1).buf.pop_front())
    }

    fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn slice_source_reads_in_order() {
        let mut src = SliceSource::new(vec![1, 2, 3, 4]);
        assert_eq!(src.available().unwrap(), 4);
        assert_eq!(src.read(3).unwrap(), [1, 2, 3]);
        assert_eq!(src.read_one().unwrap(), Some(4));
        assert_eq!(src.read_one().unwrap(), None);
        assert_eq!(src.read(5).unwrap(), Vec::<u8>::new());
        assert_eq!(src.position(), 4);
    }

    #[test]
    fn slice_source_extend_and_discard() {
        let mut src = SliceSource::new(vec![9]);
        src.extend(&[8, 7]);
        assert_eq!(src.discard_pending().unwrap(), 3);
        assert_eq!(src.available().unwrap(), 0);
        assert_eq!(src.discard_pending().unwrap(), 0);
    }

    #[test]
    fn pipe_read_one_times_out_when_idle() {
        let (_writer, mut src) = pipe(Duration::from_millis(10));
        assert_eq!(src.read_one().unwrap(), None);
    }

    #[test]
    fn pipe_short_read_on_timeout() {
        let (writer, mut src) = pipe(Duration::from_millis(10));
        writer.write(&[1, 2]);
        assert_eq!(src.read(4).unwrap(), [1, 2]);
    }

    #[test]
    fn pipe_delivers_across_threads() {
        let (writer, mut src) = pipe(Duration::from_secs(5));
        let producer = thread::spawn(move || {
            for chunk in [[1u8, 2], [3, 4]] {
                thread::sleep(Duration::from_millis(5));
                writer.write(&chunk);
            }
        });
        assert_eq!(src.read(4).unwrap(), [1, 2, 3, 4]);
        producer.join().unwrap();
        assert!(src.is_closed());
        assert_eq!(src.available().unwrap(), 0);
    }

    #[test]
    fn pipe_closed_and_empty_reads_nothing() {
        let (writer, mut src) = pipe(Duration::from_secs(5));
        writer.write(&[42]);
        drop(writer);
        assert_eq!(src.read_one().unwrap(), Some(42));
        assert_eq!(src.read_one().unwrap(), None);
        assert!(src.is_closed());
        assert_eq!(src.read(3).unwrap(), Vec::<u8>::new());
    }
}
