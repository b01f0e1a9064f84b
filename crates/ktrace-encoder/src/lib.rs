#![warn(clippy::pedantic)]

pub mod encoder;
pub mod error;
pub mod frame_writer;

pub use encoder::TraceEncoder;
pub use error::EncodeError;
