use ktrace_types::{FieldKind, FieldValue, Record};
use ktrace_wire::frame::{TAG_SCALAR, TEXT_TERMINATOR, frame_size};
use ktrace_wire::{EventWidth, WireError};

use crate::error::EncodeError;

/// Pointer value written into handle slots.
///
/// The decoder never looks at it; the firmware sends whatever address the
/// string lives at.
const HANDLE_PLACEHOLDER: u64 = 0;

/// Append one record to `out` exactly as the firmware's serial emitter
/// would send it.
///
/// Wire layout written:
///
/// ```text
/// ┌──────────────────────────────────────────────────────┐
/// │ tag          (u16 LE)                                │
/// │ fields       (per tag layout, little-endian)         │
/// │ padding      (zeros up to frame_size(width))         │
/// │ text + 0x00  (definition and debug tags only)        │
/// └──────────────────────────────────────────────────────┘
/// ```
///
/// On error `out` is left as it was.
///
/// # Returns
///
/// Total number of bytes written.
///
/// # Errors
///
/// See [`EncodeError`].
pub fn write_record(
    width: EventWidth,
    record: &Record,
    out: &mut Vec<u8>,
) -> Result<usize, EncodeError> {
    let start = out.len();
    let result = write_frame(width, record, out);
    if result.is_err() {
        out.truncate(start);
    }
    result.map(|()| out.len() - start)
}

fn write_frame(width: EventWidth, record: &Record, out: &mut Vec<u8>) -> Result<(), EncodeError> {
    let tag = record.tag();
    let frame_start = out.len();

    TAG_SCALAR.write(u64::from(tag.wire_value()), out)?;

    let mut text = None;
    for spec in tag.fields() {
        let value = record.get(spec.name).ok_or(EncodeError::MissingField {
            tag: tag.name(),
            field: spec.name,
        })?;

        if spec.kind == FieldKind::HandleSlot {
            let FieldValue::Text(s) = value else {
                return Err(EncodeError::WrongValueKind {
                    tag: tag.name(),
                    field: spec.name,
                });
            };
            text = Some(s.as_str());
            spec.kind
                .scalar(width)
                .write(HANDLE_PLACEHOLDER, out)?;
            continue;
        }

        let FieldValue::Uint(v) = value else {
            return Err(EncodeError::WrongValueKind {
                tag: tag.name(),
                field: spec.name,
            });
        };
        spec.kind
            .scalar(width)
            .write(*v, out)
            .map_err(|e| match e {
                WireError::ValueTooWide { value, width } => EncodeError::ValueOutOfRange {
                    tag: tag.name(),
                    field: spec.name,
                    value,
                    width,
                },
                other => EncodeError::Wire(other),
            })?;
    }

    // The rest of the tagged union goes out as-is
    out.resize(frame_start + frame_size(width), 0);

    if let Some(text) = text {
        validate_text(tag.name(), text)?;
        out.extend_from_slice(text.as_bytes());
        out.push(TEXT_TERMINATOR);
    }

    Ok(())
}

fn validate_text(tag: &'static str, text: &str) -> Result<(), EncodeError> {
    for (index, byte) in text.bytes().enumerate() {
        if byte == TEXT_TERMINATOR {
            return Err(EncodeError::TextContainsNul { tag, index });
        }
        if !byte.is_ascii() {
            return Err(EncodeError::NonAsciiText { tag, index });
        }
    }
    Ok(())
}
