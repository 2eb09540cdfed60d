//! Device geometry and address arithmetic
//!
//! The address space is a flat byte space partitioned into fixed
//! power-of-two regions: 256-byte pages, 4 KiB sectors (16 pages) and
//! 64 KiB blocks (16 sectors). Every conversion below is exact.

use crate::error::{Error, Result};
use crate::spi::AddressWidth;

use super::id::{Capacity, Manufacturer};

/// Smallest programmable unit; a program command may not cross its boundary
pub const PAGE_SIZE: u32 = 0x100;
/// Smallest erasable unit (16 pages)
pub const SECTOR_SIZE: u32 = 0x1000;
/// Larger erase granularity (16 sectors)
pub const BLOCK_SIZE: u32 = 0x1_0000;

/// Byte address of the first byte of a page
pub const fn page_to_address(page: u32) -> u32 {
    page * PAGE_SIZE
}

/// Byte address of the first byte of a sector
pub const fn sector_to_address(sector: u32) -> u32 {
    sector * SECTOR_SIZE
}

/// Byte address of the first byte of a block
pub const fn block_to_address(block: u32) -> u32 {
    block * BLOCK_SIZE
}

/// Page containing a byte address
pub const fn address_to_page(address: u32) -> u32 {
    address / PAGE_SIZE
}

/// Sector containing a byte address
pub const fn address_to_sector(address: u32) -> u32 {
    address / SECTOR_SIZE
}

/// Block containing a byte address
pub const fn address_to_block(address: u32) -> u32 {
    address / BLOCK_SIZE
}

/// Sector containing a page
pub const fn page_to_sector(page: u32) -> u32 {
    page * PAGE_SIZE / SECTOR_SIZE
}

/// Block containing a page
pub const fn page_to_block(page: u32) -> u32 {
    page * PAGE_SIZE / BLOCK_SIZE
}

/// Block containing a sector
pub const fn sector_to_block(sector: u32) -> u32 {
    sector * SECTOR_SIZE / BLOCK_SIZE
}

/// First page of a sector
pub const fn sector_to_page(sector: u32) -> u32 {
    sector * SECTOR_SIZE / PAGE_SIZE
}

/// First page of a block
pub const fn block_to_page(block: u32) -> u32 {
    block * BLOCK_SIZE / PAGE_SIZE
}

/// Identity and derived geometry of one attached flash chip
///
/// Populated once by identification and immutable afterwards. The
/// derived counts are internally consistent by construction:
/// `page_count * PAGE_SIZE == sector_count * SECTOR_SIZE
///  == block_count * BLOCK_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Decoded manufacturer (advisory)
    pub manufacturer: Manufacturer,
    /// Memory-type byte, device-specific and kept opaque
    pub memory_type: u8,
    /// Decoded capacity code
    pub capacity: Capacity,
    /// Number of 64 KiB blocks
    pub block_count: u32,
    /// Number of 4 KiB sectors (16 per block)
    pub sector_count: u32,
    /// Number of 256-byte pages
    pub page_count: u32,
}

impl Geometry {
    /// Derive the geometry from the three JEDEC identification bytes.
    ///
    /// Fails with `UnknownCapacity` when the capacity code is not in the
    /// table; an unknown manufacturer is carried through as-is.
    pub fn from_id(manufacturer: u8, memory_type: u8, capacity: u8) -> Result<Self> {
        let decoded_capacity = Capacity::from_jedec(capacity);
        let block_count = decoded_capacity
            .block_count()
            .ok_or(Error::UnknownCapacity(capacity))?;
        let sector_count = block_count * 16;
        let page_count = sector_count * SECTOR_SIZE / PAGE_SIZE;
        Ok(Self {
            manufacturer: Manufacturer::from_jedec(manufacturer),
            memory_type,
            capacity: decoded_capacity,
            block_count,
            sector_count,
            page_count,
        })
    }

    /// Total capacity in bytes
    pub const fn total_bytes(&self) -> u64 {
        self.page_count as u64 * PAGE_SIZE as u64
    }

    /// Address width the chip's commands must carry
    pub const fn address_width(&self) -> AddressWidth {
        AddressWidth::for_block_count(self.block_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_counts_are_consistent() {
        for code in [0x11u8, 0x14, 0x17, 0x19, 0x20] {
            let geo = Geometry::from_id(0xEF, 0x40, code).unwrap();
            assert_eq!(geo.sector_count, geo.block_count * 16);
            assert_eq!(
                geo.page_count as u64 * PAGE_SIZE as u64,
                geo.sector_count as u64 * SECTOR_SIZE as u64
            );
            assert_eq!(
                geo.sector_count as u64 * SECTOR_SIZE as u64,
                geo.block_count as u64 * BLOCK_SIZE as u64
            );
        }
    }

    #[test]
    fn addressing_mode_boundary() {
        let geo = Geometry::from_id(0xEF, 0x40, 0x18).unwrap();
        assert_eq!(geo.block_count, 256);
        assert_eq!(geo.address_width(), AddressWidth::ThreeByte);

        let geo = Geometry::from_id(0xEF, 0x40, 0x19).unwrap();
        assert_eq!(geo.block_count, 512);
        assert_eq!(geo.address_width(), AddressWidth::FourByte);
    }

    #[test]
    fn unknown_capacity_fails() {
        assert_eq!(
            Geometry::from_id(0xEF, 0x40, 0x42),
            Err(Error::UnknownCapacity(0x42))
        );
    }

    #[test]
    fn unknown_manufacturer_is_not_fatal() {
        let geo = Geometry::from_id(0x00, 0x40, 0x15).unwrap();
        assert_eq!(geo.manufacturer, Manufacturer::Unknown(0x00));
        assert_eq!(geo.block_count, 32);
    }

    #[test]
    fn conversions_are_exact() {
        assert_eq!(page_to_address(3), 0x300);
        assert_eq!(sector_to_address(2), 0x2000);
        assert_eq!(block_to_address(1), 0x1_0000);
        assert_eq!(address_to_page(0x300 + 200), 3);
        assert_eq!(address_to_sector(0x2FFF), 2);
        assert_eq!(address_to_block(0xFFFF), 0);
        assert_eq!(page_to_sector(16), 1);
        assert_eq!(page_to_block(255), 0);
        assert_eq!(sector_to_page(1), 16);
        assert_eq!(sector_to_block(15), 0);
        assert_eq!(block_to_page(2), 512);
    }
}
