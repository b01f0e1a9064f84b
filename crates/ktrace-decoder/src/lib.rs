#![warn(clippy::pedantic)]

pub mod cancel;
pub mod descriptor;
pub mod error;
pub mod source;
pub mod stream;

pub use cancel::CancelToken;
pub use descriptor::{ProtocolDescriptor, ResolvedField, TagLayout};
pub use error::DecodeError;
pub use source::{ByteSource, PipeSource, PipeWriter, SliceSource, pipe};
pub use stream::{Records, StreamDecoder};
