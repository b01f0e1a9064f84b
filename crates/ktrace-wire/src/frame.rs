use crate::scalar::Scalar;
use crate::width::EventWidth;

/// Size of the record tag at the start of every frame.
///
/// The firmware's `Trace_Tag_t` is an `int`-sized enum, which is 16 bits
/// on AVR.
pub const TAG_SIZE: usize = 2;

/// Scalar the tag is carried as.
pub const TAG_SCALAR: Scalar = Scalar::U16;

/// Size of the string pointer slot in definition and debug frames.
///
/// The firmware sends the raw pointer value; its text follows the frame
/// as a NUL-terminated string.
pub const HANDLE_SLOT_SIZE: usize = 2;

/// Terminator of the text that trails definition and debug frames.
pub const TEXT_TERMINATOR: u8 = 0x00;

/// Size of one fixed frame for the given event width.
///
/// The firmware writes `sizeof(Trace_t)` bytes per record: the tag followed
/// by the largest union member. The two candidates for the largest member
/// are a timestamp paired with an event id and a timestamp paired with a
/// 16-bit field.
///
/// ```text
/// ┌───────┬────────────┐
/// │ Width │ Frame size │
/// ├───────┼────────────┤
/// │ 1     │ 12         │
/// │ 2     │ 12         │
/// │ 4     │ 14         │
/// │ 8     │ 18         │
/// └───────┴────────────┘
/// ```
pub fn frame_size(width: EventWidth) -> usize {
    let with_event = TAG_SIZE + Scalar::U64.size() + width.bytes();
    let with_u16 = TAG_SIZE + Scalar::U64.size() + Scalar::U16.size();
    with_event.max(with_u16)
}
