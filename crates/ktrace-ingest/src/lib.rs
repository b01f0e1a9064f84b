#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod ingest;
pub mod log;
pub mod sink;

pub use config::IngestConfig;
pub use error::IngestError;
pub use ingest::{IngestState, IngestSummary, Ingestor, StopReason};
pub use log::TraceLog;
pub use sink::{DiagnosticSink, StderrSink};
