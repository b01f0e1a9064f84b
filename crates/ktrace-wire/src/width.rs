use crate::error::WireError;
use crate::scalar::Scalar;

/// Byte width of the kernel's event identifier type.
///
/// The firmware announces `sizeof(Event_t)` as the very first byte of the
/// stream. The width is fixed for the lifetime of a connection and decides
/// the size of every event-id field in the record catalogue.
///
/// ```text
/// ┌──────┬─────────┬──────────────┐
/// │ Byte │ Variant │ Scalar       │
/// ├──────┼─────────┼──────────────┤
/// │ 1    │ One     │ u8           │
/// │ 2    │ Two     │ u16          │
/// │ 4    │ Four    │ u32          │
/// │ 8    │ Eight   │ u64          │
/// └──────┴─────────┴──────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventWidth {
    One,
    Two,
    Four,
    Eight,
}

impl EventWidth {
    /// Every supported width, narrowest first.
    pub const ALL: [Self; 4] = [Self::One, Self::Two, Self::Four, Self::Eight];

    /// Interpret the negotiation byte.
    ///
    /// # Errors
    ///
    /// [`WireError::UnsupportedEventWidth`] for anything other than
    /// 1, 2, 4 or 8. The stream cannot be decoded in that case.
    pub fn from_negotiation_byte(byte: u8) -> Result<Self, WireError> {
        match byte {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            4 => Ok(Self::Four),
            8 => Ok(Self::Eight),
            found => Err(WireError::UnsupportedEventWidth { found }),
        }
    }

    /// The byte the firmware sends to announce this width.
    pub fn negotiation_byte(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Four => 4,
            Self::Eight => 8,
        }
    }

    /// Width in bytes.
    pub fn bytes(self) -> usize {
        usize::from(self.negotiation_byte())
    }

    /// The unsigned scalar an event identifier is carried as.
    pub fn scalar(self) -> Scalar {
        match self {
            Self::One => Scalar::U8,
            Self::Two => Scalar::U16,
            Self::Four => Scalar::U32,
            Self::Eight => Scalar::U64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_supported_widths() {
        for width in EventWidth::ALL {
            let byte = width.negotiation_byte();
            assert_eq!(EventWidth::from_negotiation_byte(byte).unwrap(), width);
            assert_eq!(width.bytes(), width.scalar().size());
        }
    }

    #[test]
    fn rejects_unsupported_widths() {
        for byte in [0u8, 3, 5, 6, 7, 9, 16, 0xFF] {
            let result = EventWidth::from_negotiation_byte(byte);
            assert!(
                matches!(result, Err(WireError::UnsupportedEventWidth { found }) if found == byte),
                "byte {byte} should be rejected"
            );
        }
    }
}
