#![warn(clippy::pedantic)]

pub mod error;
pub mod layout;
pub mod record;
pub mod tag;

pub use error::TypeError;
pub use layout::{FieldKind, FieldSpec};
pub use record::{FieldValue, Record};
pub use tag::{TagFamily, TraceTag};
