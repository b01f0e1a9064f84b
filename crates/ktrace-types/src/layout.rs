use ktrace_wire::frame::{HANDLE_SLOT_SIZE, TAG_SIZE};
use ktrace_wire::{EventWidth, Scalar};

use crate::tag::TraceTag;

/// How a single fixed field is carried on the wire.
///
/// ```text
/// ┌────────────┬──────────────────────────────────────────────────┐
/// │ Kind       │ Wire form                                        │
/// ├────────────┼──────────────────────────────────────────────────┤
/// │ Fixed(s)   │ scalar `s`, independent of the negotiated width  │
/// │ EventId    │ scalar sized by the negotiated event width       │
/// │ HandleSlot │ 16-bit pointer; replaced by the trailing text    │
/// └────────────┴──────────────────────────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
  Fixed(Scalar),
  EventId,
  HandleSlot,
}

impl FieldKind {
  /// The concrete scalar for this field under `width`.
  pub fn scalar(self, width: EventWidth) -> Scalar {
    match self {
      Self::Fixed(scalar) => scalar,
      Self::EventId => width.scalar(),
      Self::HandleSlot => Scalar::U16,
    }
  }

  /// Encoded size in bytes under `width`.
  pub fn size(self, width: EventWidth) -> usize {
    match self {
      Self::HandleSlot => HANDLE_SLOT_SIZE,
      other => other.scalar(width).size(),
    }
  }
}

/// One named field of a tag's fixed layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
  pub name: &'static str,
  pub kind: FieldKind,
}

const fn field(name: &'static str, kind: FieldKind) -> FieldSpec {
  FieldSpec { name, kind }
}

const TIME: FieldSpec = field("time", FieldKind::Fixed(Scalar::U64));
const INSTANCE: FieldSpec = field("instance", FieldKind::Fixed(Scalar::U8));
const EVENT: FieldSpec = field("event", FieldKind::EventId);
const HANDLE: FieldSpec = field("handle", FieldKind::HandleSlot);

const DEF_TASK: &[FieldSpec] = &[HANDLE, INSTANCE];
const DEF_EVENT: &[FieldSpec] = &[HANDLE, EVENT];
const DEF_ALLOC: &[FieldSpec] = &[HANDLE, field("bytes", FieldKind::Fixed(Scalar::U16))];
const MARK_INIT: &[FieldSpec] = &[TIME, field("heap", FieldKind::Fixed(Scalar::U16))];
const MARK_TIME: &[FieldSpec] = &[TIME];
const MARK_INSTANCE: &[FieldSpec] = &[TIME, INSTANCE];
const MARK_EVENT: &[FieldSpec] = &[TIME, EVENT];
const ONLY_EVENT: &[FieldSpec] = &[EVENT];
const ONLY_INSTANCE: &[FieldSpec] = &[INSTANCE];
const DEBUG_MESSAGE: &[FieldSpec] = &[field("message", FieldKind::HandleSlot)];
const NONE: &[FieldSpec] = &[];

impl TraceTag {
  /// The fixed fields following the tag, in wire order.
  ///
  /// Text-bearing tags declare their text as a [`FieldKind::HandleSlot`]
  /// in first position; the decoder swaps the slot's pointer value for
  /// the text read after the frame.
  pub fn fields(self) -> &'static [FieldSpec] {
    match self {
      Self::DefTask => DEF_TASK,
      Self::DefEvent => DEF_EVENT,
      Self::DefAlloc => DEF_ALLOC,
      Self::MarkInit => MARK_INIT,
      Self::MarkHalt | Self::MarkIdle | Self::MarkWake => MARK_TIME,
      Self::MarkStart | Self::MarkStop => MARK_INSTANCE,
      Self::MarkEvent => MARK_EVENT,
      Self::ErrorUndefinedEvent | Self::ErrorDuplicateEvent => ONLY_EVENT,
      Self::ErrorInvalidTask | Self::ErrorMissed => ONLY_INSTANCE,
      Self::ErrorMaxEvent
      | Self::ErrorMaxAlloc
      | Self::ErrorMaxPool
      | Self::ErrorNullPool
      | Self::ErrorMaxTask
      | Self::ErrorNullTask => NONE,
      Self::DebugMessage => DEBUG_MESSAGE,
    }
  }

  /// Bytes occupied by the tag plus its declared fields under `width`.
  pub fn fixed_size(self, width: EventWidth) -> usize {
    TAG_SIZE
      + self
        .fields()
        .iter()
        .map(|f| f.kind.size(width))
        .sum::<usize>()
  }

  /// Whether any field of this tag is sized by the event width.
  pub fn uses_event_width(self) -> bool {
    self.fields().iter().any(|f| f.kind == FieldKind::EventId)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn event_width_tags() {
    let tags: Vec<_> = TraceTag::ALL
      .iter()
      .filter(|t| t.uses_event_width())
      .map(|t| t.name())
      .collect();
    assert_eq!(
      tags,
      [
        "Def_Event",
        "Mark_Event",
        "Error_Undefined_Event",
        "Error_Duplicate_Event"
      ]
    );
  }

  #[test]
  fn fixed_sizes_with_two_byte_events() {
    let w = EventWidth::Two;
    assert_eq!(TraceTag::DefTask.fixed_size(w), 5);
    assert_eq!(TraceTag::DefEvent.fixed_size(w), 6);
    assert_eq!(TraceTag::MarkInit.fixed_size(w), 12);
    assert_eq!(TraceTag::MarkHalt.fixed_size(w), 10);
    assert_eq!(TraceTag::ErrorMaxPool.fixed_size(w), 2);
    assert_eq!(TraceTag::ErrorMissed.fixed_size(w), 3);
    assert_eq!(TraceTag::DebugMessage.fixed_size(w), 4);
  }

  #[test]
  fn event_fields_follow_width() {
    assert_eq!(TraceTag::MarkEvent.fixed_size(EventWidth::One), 11);
    assert_eq!(TraceTag::MarkEvent.fixed_size(EventWidth::Eight), 18);
    assert_eq!(TraceTag::ErrorUndefinedEvent.fixed_size(EventWidth::Four), 6);
  }

  #[test]
  fn text_tags_lead_with_handle_slot() {
    for tag in TraceTag::ALL.iter().filter(|t| t.carries_text()) {
      assert_eq!(tag.fields()[0].kind, FieldKind::HandleSlot, "{tag}");
    }
    for tag in TraceTag::ALL.iter().filter(|t| !t.carries_text()) {
      assert!(
        tag.fields().iter().all(|f| f.kind != FieldKind::HandleSlot),
        "{tag}"
      );
    }
  }
}
