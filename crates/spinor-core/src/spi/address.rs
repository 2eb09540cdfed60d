//! Address width types

/// Address width for SPI commands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AddressWidth {
    /// 3-byte (24-bit) address - supports up to 16 MiB
    #[default]
    ThreeByte,
    /// 4-byte (32-bit) address - supports up to 4 GiB
    FourByte,
}

impl AddressWidth {
    /// Address width required for a chip with the given 64 KiB block count.
    ///
    /// 512 blocks (256 Mbit) is the first capacity that no longer fits in
    /// 24 bits; the boundary is exact.
    pub const fn for_block_count(block_count: u32) -> Self {
        if block_count >= 512 {
            Self::FourByte
        } else {
            Self::ThreeByte
        }
    }

    /// Returns the number of address bytes
    pub const fn bytes(&self) -> usize {
        match self {
            Self::ThreeByte => 3,
            Self::FourByte => 4,
        }
    }

    /// Encode an address big-endian into `buf` (must hold `bytes()` bytes)
    pub fn encode(&self, address: u32, buf: &mut [u8]) {
        match self {
            Self::ThreeByte => {
                buf[0] = (address >> 16) as u8;
                buf[1] = (address >> 8) as u8;
                buf[2] = address as u8;
            }
            Self::FourByte => {
                buf[0] = (address >> 24) as u8;
                buf[1] = (address >> 16) as u8;
                buf[2] = (address >> 8) as u8;
                buf[3] = address as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_byte_encoding() {
        let mut buf = [0u8; 3];
        AddressWidth::ThreeByte.encode(0x123456, &mut buf);
        assert_eq!(buf, [0x12, 0x34, 0x56]);
    }

    #[test]
    fn four_byte_encoding() {
        let mut buf = [0u8; 4];
        AddressWidth::FourByte.encode(0x0102_0304, &mut buf);
        assert_eq!(buf, [0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn four_byte_boundary_at_512_blocks() {
        assert_eq!(AddressWidth::for_block_count(256), AddressWidth::ThreeByte);
        assert_eq!(AddressWidth::for_block_count(511), AddressWidth::ThreeByte);
        assert_eq!(AddressWidth::for_block_count(512), AddressWidth::FourByte);
        assert_eq!(AddressWidth::for_block_count(1024), AddressWidth::FourByte);
    }
}
