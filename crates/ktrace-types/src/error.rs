use ktrace_wire::WireError;

/// Errors raised while mapping raw frame values onto the record catalogue.
///
/// ```text
/// ┌─────────────────────────────────────────────────────┐
/// │ TypeError (this crate)                              │
/// │   ├── UnknownTag for values outside the catalogue   │
/// │   └── wraps WireError for scalar-level failures     │
/// └─────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, thiserror::Error)]
pub enum TypeError {
  /// The tag value does not index the 21-entry catalogue.
  #[error("unknown trace tag: {value}")]
  UnknownTag { value: u64 },

  #[error(transparent)]
  Wire(#[from] WireError),
}
