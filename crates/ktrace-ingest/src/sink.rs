use std::io::{self, Write};

/// Receives the text of `Debug_Message` records as they are decoded.
///
/// Emitting is infallible from the loop's point of view; a sink that
/// cannot deliver should drop the text rather than stop ingestion.
pub trait DiagnosticSink {
    fn emit(&mut self, text: &str);
}

impl<F: FnMut(&str)> DiagnosticSink for F {
    fn emit(&mut self, text: &str) {
        self(text);
    }
}

/// Writes diagnostic text to stderr verbatim.
///
/// No newline is added; the firmware includes its own.
#[derive(Clone, Copy, Debug, Default)]
pub struct StderrSink;

impl DiagnosticSink for StderrSink {
    fn emit(&mut self, text: &str) {
        let mut err = io::stderr().lock();
        let _ = err.write_all(text.as_bytes());
        let _ = err.flush();
    }
}
