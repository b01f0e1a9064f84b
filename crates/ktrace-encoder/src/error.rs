use ktrace_wire::WireError;

/// Errors that can occur while serializing records into frames.
///
/// ```text
///   EncodeError
///   ├── MissingField      ← record lacks a field its tag declares
///   ├── WrongValueKind    ← numeric field given text or vice versa
///   ├── ValueOutOfRange   ← value wider than the field's scalar
///   ├── TextContainsNul   ← text would terminate early on the wire
///   ├── NonAsciiText      ← text outside the 7-bit range
///   └── Wire(WireError)   ← from ktrace-wire
/// ```
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("{tag} record is missing field {field}")]
    MissingField {
        tag: &'static str,
        field: &'static str,
    },

    #[error("{tag} field {field} has the wrong value kind")]
    WrongValueKind {
        tag: &'static str,
        field: &'static str,
    },

    #[error("{tag} field {field} value {value} does not fit in {width} byte(s)")]
    ValueOutOfRange {
        tag: &'static str,
        field: &'static str,
        value: u64,
        width: usize,
    },

    #[error("{tag} text contains a NUL byte at index {index}")]
    TextContainsNul { tag: &'static str, index: usize },

    #[error("{tag} text contains a non-ASCII character at index {index}")]
    NonAsciiText { tag: &'static str, index: usize },

    #[error(transparent)]
    Wire(#[from] WireError),
}
