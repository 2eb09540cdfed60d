//! Standard JEDEC SPI flash opcodes
//!
//! The subset of the JEDEC command set this driver issues, plus the
//! dummy byte clocked out while receiving.

use super::AddressWidth;

/// Dummy byte clocked out during receive-only phases
pub const DUMMY: u8 = 0xA5;

// ============================================================================
// Write control
// ============================================================================

/// Write Enable - required before any write/erase operation
pub const WREN: u8 = 0x06;
/// Write Disable - clears WEL bit in status register
pub const WRDI: u8 = 0x04;
/// Enable Write Status Register (legacy SST command)
pub const EWSR: u8 = 0x50;

// ============================================================================
// Status register operations
// ============================================================================

/// Read Status Register 1
pub const RDSR: u8 = 0x05;
/// Read Status Register 2
pub const RDSR2: u8 = 0x35;
/// Read Status Register 3
pub const RDSR3: u8 = 0x15;
/// Write Status Register 1
pub const WRSR: u8 = 0x01;
/// Write Status Register 2
pub const WRSR2: u8 = 0x31;
/// Write Status Register 3
pub const WRSR3: u8 = 0x11;

// ============================================================================
// Identification
// ============================================================================

/// Read JEDEC ID (manufacturer + memory type + capacity)
pub const RDID: u8 = 0x9F;

// ============================================================================
// Read / program
// ============================================================================

/// Read Data with 3-byte address
pub const READ: u8 = 0x03;
/// Read Data with 4-byte address
pub const READ_4B: u8 = 0x13;
/// Page Program with 3-byte address
pub const PP: u8 = 0x02;
/// Page Program with 4-byte address
pub const PP_4B: u8 = 0x12;

// ============================================================================
// Erase commands
// ============================================================================

/// Sector Erase 4KB with 3-byte address
pub const SE_20: u8 = 0x20;
/// Sector Erase 4KB with 4-byte address
pub const SE_21: u8 = 0x21;
/// Block Erase 64KB with 3-byte address
pub const BE_D8: u8 = 0xD8;
/// Block Erase 64KB with 4-byte address
pub const BE_DC: u8 = 0xDC;
/// Chip Erase (entire chip)
pub const CE_60: u8 = 0x60;
/// Chip Erase (alternate opcode, the one this driver issues)
pub const CE_C7: u8 = 0xC7;

// ============================================================================
// Power management
// ============================================================================

/// Deep Power Down
pub const DP: u8 = 0xB9;
/// Release from Deep Power Down
pub const RDP: u8 = 0xAB;

// ============================================================================
// Opcode selection by address width
// ============================================================================

/// Page-program opcode for the given address width
pub const fn page_program(width: AddressWidth) -> u8 {
    match width {
        AddressWidth::ThreeByte => PP,
        AddressWidth::FourByte => PP_4B,
    }
}

/// Read-data opcode for the given address width
pub const fn read_data(width: AddressWidth) -> u8 {
    match width {
        AddressWidth::ThreeByte => READ,
        AddressWidth::FourByte => READ_4B,
    }
}

/// Sector-erase opcode for the given address width
pub const fn sector_erase(width: AddressWidth) -> u8 {
    match width {
        AddressWidth::ThreeByte => SE_20,
        AddressWidth::FourByte => SE_21,
    }
}

/// Block-erase opcode for the given address width
pub const fn block_erase(width: AddressWidth) -> u8 {
    match width {
        AddressWidth::ThreeByte => BE_D8,
        AddressWidth::FourByte => BE_DC,
    }
}
