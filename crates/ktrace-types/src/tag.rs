use crate::error::TypeError;

// ── Macro for the tag catalogue ───────────────────────────────────────
//
// The catalogue is order-significant: a variant's position is its wire
// value. The macro keeps the variant list, the wire mapping and the
// display names in one place so they cannot drift apart.

macro_rules! trace_tags {
  (
    $(#[$meta:meta])*
    pub enum $name:ident {
      $( $(#[$vmeta:meta])* $variant:ident = $wire:literal => $label:literal ),+ $(,)?
    }
  ) => {
    $(#[$meta])*
    pub enum $name {
      $( $(#[$vmeta])* $variant ),+
    }

    impl $name {
      /// Every tag in wire order.
      pub const ALL: &'static [Self] = &[$( Self::$variant ),+];

      /// The 16-bit value carried at the start of the frame.
      pub fn wire_value(self) -> u16 {
        match self {
          $( Self::$variant => $wire ),+
        }
      }

      /// Map a raw tag value onto the catalogue.
      ///
      /// # Errors
      ///
      /// [`TypeError::UnknownTag`] for any value outside the catalogue.
      /// An unknown tag is a decode failure, never a new kind.
      pub fn from_wire(value: u64) -> Result<Self, TypeError> {
        match value {
          $( $wire => Ok(Self::$variant), )+
          other => Err(TypeError::UnknownTag { value: other }),
        }
      }

      /// The firmware's name for this tag, e.g. `Mark_Init`.
      pub fn name(self) -> &'static str {
        match self {
          $( Self::$variant => $label ),+
        }
      }
    }
  };
}

trace_tags! {
  /// Record kinds emitted by the kernel's serial tracer.
  ///
  /// ```text
  /// ┌──────┬───────────────────────┬────────────┐
  /// │ Wire │ Name                  │ Family     │
  /// ├──────┼───────────────────────┼────────────┤
  /// │ 0-2  │ Def_*                 │ Definition │
  /// │ 3-9  │ Mark_*                │ Mark       │
  /// │ 10-19│ Error_*               │ Error      │
  /// │ 20   │ Debug_Message         │ Debug      │
  /// └──────┴───────────────────────┴────────────┘
  /// ```
  #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
  pub enum TraceTag {
    /// A task was created.
    DefTask = 0 => "Def_Task",
    /// An event was given a name.
    DefEvent = 1 => "Def_Event",
    /// Memory was allocated.
    DefAlloc = 2 => "Def_Alloc",
    /// The kernel started.
    MarkInit = 3 => "Mark_Init",
    /// The kernel is about to stop. Terminal for a trace session.
    MarkHalt = 4 => "Mark_Halt",
    MarkStart = 5 => "Mark_Start",
    MarkStop = 6 => "Mark_Stop",
    MarkEvent = 7 => "Mark_Event",
    MarkIdle = 8 => "Mark_Idle",
    MarkWake = 9 => "Mark_Wake",
    ErrorMaxEvent = 10 => "Error_Max_Event",
    ErrorUndefinedEvent = 11 => "Error_Undefined_Event",
    ErrorMaxAlloc = 12 => "Error_Max_Alloc",
    ErrorMaxPool = 13 => "Error_Max_Pool",
    ErrorNullPool = 14 => "Error_Null_Pool",
    ErrorMaxTask = 15 => "Error_Max_Task",
    ErrorNullTask = 16 => "Error_Null_Task",
    ErrorInvalidTask = 17 => "Error_Invalid_Task",
    ErrorDuplicateEvent = 18 => "Error_Duplicate_Event",
    ErrorMissed = 19 => "Error_Missed",
    /// Free-form text for the host console.
    DebugMessage = 20 => "Debug_Message",
  }
}

/// Broad grouping of the catalogue, following the firmware's header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagFamily {
  /// Relates a text handle to a resource.
  Definition,
  /// Relates something to a moment in time.
  Mark,
  /// Something unexpected happened in the kernel.
  Error,
  Debug,
}

impl TraceTag {
  pub fn family(self) -> TagFamily {
    match self {
      Self::DefTask | Self::DefEvent | Self::DefAlloc => TagFamily::Definition,
      Self::MarkInit
      | Self::MarkHalt
      | Self::MarkStart
      | Self::MarkStop
      | Self::MarkEvent
      | Self::MarkIdle
      | Self::MarkWake => TagFamily::Mark,
      Self::ErrorMaxEvent
      | Self::ErrorUndefinedEvent
      | Self::ErrorMaxAlloc
      | Self::ErrorMaxPool
      | Self::ErrorNullPool
      | Self::ErrorMaxTask
      | Self::ErrorNullTask
      | Self::ErrorInvalidTask
      | Self::ErrorDuplicateEvent
      | Self::ErrorMissed => TagFamily::Error,
      Self::DebugMessage => TagFamily::Debug,
    }
  }

  /// Whether a NUL-terminated text follows this tag's frame.
  pub fn carries_text(self) -> bool {
    matches!(self.family(), TagFamily::Definition | TagFamily::Debug)
  }
}

impl std::fmt::Display for TraceTag {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.name())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn catalogue_has_21_entries_in_wire_order() {
    assert_eq!(TraceTag::ALL.len(), 21);
    for (index, tag) in (0u64..).zip(TraceTag::ALL) {
      assert_eq!(u64::from(tag.wire_value()), index, "{tag:?} out of order");
      assert_eq!(TraceTag::from_wire(index).unwrap(), *tag);
    }
  }

  #[test]
  fn out_of_range_is_unknown() {
    for value in [21u64, 99, 0xFFFF] {
      assert!(matches!(
        TraceTag::from_wire(value),
        Err(TypeError::UnknownTag { value: v }) if v == value
      ));
    }
  }

  #[test]
  fn text_bearing_tags() {
    let bearing: Vec<_> = TraceTag::ALL
      .iter()
      .filter(|t| t.carries_text())
      .map(|t| t.name())
      .collect();
    assert_eq!(
      bearing,
      ["Def_Task", "Def_Event", "Def_Alloc", "Debug_Message"]
    );
  }

  #[test]
  fn names_match_firmware() {
    assert_eq!(TraceTag::MarkInit.name(), "Mark_Init");
    assert_eq!(TraceTag::ErrorDuplicateEvent.to_string(), "Error_Duplicate_Event");
    assert_eq!(TraceTag::DebugMessage.family(), TagFamily::Debug);
  }
}
