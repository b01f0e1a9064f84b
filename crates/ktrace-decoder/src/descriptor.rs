use ktrace_types::{FieldKind, TraceTag};
use ktrace_wire::frame::{TAG_SIZE, frame_size};
use ktrace_wire::{EventWidth, Scalar};
use tracing::debug;

use crate::error::DecodeError;

/// A field of a tag layout with its width and frame offset resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedField {
    pub name: &'static str,
    pub kind: FieldKind,
    pub scalar: Scalar,
    /// Byte offset from the start of the frame (the tag is at 0).
    pub offset: usize,
}

/// The fixed-portion layout of one tag under a negotiated width.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagLayout {
    pub tag: TraceTag,
    /// Tag plus declared fields, in bytes.
    pub fixed_size: usize,
    pub fields: Vec<ResolvedField>,
}

impl TagLayout {
    fn resolve(tag: TraceTag, width: EventWidth) -> Self {
        let mut offset = TAG_SIZE;
        let fields = tag
            .fields()
            .iter()
            .map(|spec| {
                let scalar = spec.kind.scalar(width);
                let field = ResolvedField {
                    name: spec.name,
                    kind: spec.kind,
                    scalar,
                    offset,
                };
                offset += spec.kind.size(width);
                field
            })
            .collect();

        Self {
            tag,
            fixed_size: offset,
            fields,
        }
    }
}

/// Everything the decoder needs to know about a connection, derived from
/// its single negotiation byte.
///
/// ```text
///   negotiation byte ──▶ EventWidth ──▶ ┌─────────────────────────────┐
///                                       │ 21 TagLayouts (by wire tag) │
///                                       │ decode threshold            │
///                                       └─────────────────────────────┘
/// ```
///
/// Built once per connection and owned by the
/// [`StreamDecoder`](crate::StreamDecoder). A second negotiation byte
/// mid-stream is not part of the protocol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtocolDescriptor {
    width: EventWidth,
    threshold: usize,
    layouts: Vec<TagLayout>,
}

impl ProtocolDescriptor {
    /// Resolve a descriptor from the stream's first byte.
    ///
    /// # Errors
    ///
    /// [`DecodeError::Negotiation`] if the byte is not 1, 2, 4 or 8. The
    /// connection should be torn down in that case.
    pub fn resolve(negotiation_byte: u8) -> Result<Self, DecodeError> {
        let width =
            EventWidth::from_negotiation_byte(negotiation_byte).map_err(DecodeError::Negotiation)?;
        let descriptor = Self::for_width(width);
        debug!(
            event_width = width.bytes(),
            decode_threshold = descriptor.threshold,
            "resolved trace protocol descriptor"
        );
        Ok(descriptor)
    }

    pub fn for_width(width: EventWidth) -> Self {
        let layouts = TraceTag::ALL
            .iter()
            .map(|tag| TagLayout::resolve(*tag, width))
            .collect();

        Self {
            width,
            threshold: frame_size(width),
            layouts,
        }
    }

    pub fn event_width(&self) -> EventWidth {
        self.width
    }

    /// Bytes that must be buffered before a decode attempt is made.
    ///
    /// Every frame on the wire is exactly this long, so it is also the
    /// number of bytes read per record before any trailing text.
    pub fn decode_threshold(&self) -> usize {
        self.threshold
    }

    pub fn layout(&self, tag: TraceTag) -> &TagLayout {
        &self.layouts[usize::from(tag.wire_value())]
    }

    /// Tag plus declared fields for `tag`, in bytes.
    pub fn fixed_size(&self, tag: TraceTag) -> usize {
        self.layout(tag).fixed_size
    }

    /// All 21 layouts in wire order.
    pub fn layouts(&self) -> &[TagLayout] {
        &self.layouts
    }
}
