use crate::error::WireError;

/// Fixed-width unsigned scalar as laid out on the wire.
///
/// All scalars are little-endian and packed with no alignment padding,
/// which is how the AVR toolchain lays out the firmware's trace struct.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scalar {
    U8,
    U16,
    U32,
    U64,
}

impl Scalar {
    /// Encoded size in bytes.
    pub fn size(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
            Self::U64 => 8,
        }
    }

    /// Largest value representable in this width.
    pub fn max_value(self) -> u64 {
        match self {
            Self::U8 => u64::from(u8::MAX),
            Self::U16 => u64::from(u16::MAX),
            Self::U32 => u64::from(u32::MAX),
            Self::U64 => u64::MAX,
        }
    }

    /// Read this scalar from `buf` at `offset`.
    ///
    /// # Errors
    ///
    /// [`WireError::UnexpectedEof`] if fewer than [`size`](Self::size)
    /// bytes remain after `offset`.
    pub fn read(self, buf: &[u8], offset: usize) -> Result<u64, WireError> {
        let end = offset + self.size();
        let bytes = buf
            .get(offset..end)
            .ok_or(WireError::UnexpectedEof { offset: buf.len() })?;

        let mut wide = [0u8; 8];
        wide[..bytes.len()].copy_from_slice(bytes);
        Ok(u64::from_le_bytes(wide))
    }

    /// Append `value` to `out` in this width.
    ///
    /// # Errors
    ///
    /// [`WireError::ValueTooWide`] if `value` exceeds
    /// [`max_value`](Self::max_value). Nothing is written in that case.
    pub fn write(self, value: u64, out: &mut Vec<u8>) -> Result<(), WireError> {
        if value > self.max_value() {
            return Err(WireError::ValueTooWide {
                value,
                width: self.size(),
            });
        }
        out.extend_from_slice(&value.to_le_bytes()[..self.size()]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian() {
        let buf = [0xE8, 0x03, 0x00, 0x02];
        assert_eq!(Scalar::U16.read(&buf, 0).unwrap(), 1000);
        assert_eq!(Scalar::U16.read(&buf, 2).unwrap(), 512);
        assert_eq!(Scalar::U8.read(&buf, 1).unwrap(), 0x03);
        assert_eq!(Scalar::U32.read(&buf, 0).unwrap(), 0x0200_03E8);
    }

    #[test]
    fn read_past_end_is_eof() {
        let buf = [0u8; 5];
        assert!(matches!(
            Scalar::U64.read(&buf, 0),
            Err(WireError::UnexpectedEof { offset: 5 })
        ));
        assert!(matches!(
            Scalar::U16.read(&buf, 4),
            Err(WireError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn write_rejects_overflow() {
        let mut out = Vec::new();
        let result = Scalar::U8.write(256, &mut out);
        assert!(matches!(
            result,
            Err(WireError::ValueTooWide { value: 256, width: 1 })
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn write_then_read_u64_extremes() {
        let mut out = Vec::new();
        Scalar::U64.write(u64::MAX, &mut out).unwrap();
        Scalar::U64.write(0, &mut out).unwrap();
        assert_eq!(out.len(), 16);
        assert_eq!(Scalar::U64.read(&out, 0).unwrap(), u64::MAX);
        assert_eq!(Scalar::U64.read(&out, 8).unwrap(), 0);
    }
}
