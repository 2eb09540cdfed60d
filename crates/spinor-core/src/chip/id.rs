//! JEDEC identification byte tables

use core::fmt;

/// JEDEC manufacturer, decoded from the first identification byte
///
/// An unmatched byte maps to `Unknown` with the raw value preserved for
/// diagnostics. The manufacturer is advisory only - identification still
/// succeeds with an unknown vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Manufacturer {
    /// Winbond (0xEF)
    Winbond,
    /// Spansion/AMD (0x01)
    Spansion,
    /// Micron/ST (0x20)
    Micron,
    /// Macronix (0xC2)
    Macronix,
    /// ISSI (0xD5)
    Issi,
    /// GigaDevice (0xC8)
    GigaDevice,
    /// AMIC (0x37)
    Amic,
    /// SST (0xBF)
    Sst,
    /// Hyundai (0xAD)
    Hyundai,
    /// Fudan (0xA1)
    Fudan,
    /// ESMT (0x8C)
    Esmt,
    /// Intel (0x89)
    Intel,
    /// Sanyo (0x62)
    Sanyo,
    /// Fujitsu (0x04)
    Fujitsu,
    /// EON (0x1C)
    Eon,
    /// Puya (0x85)
    Puya,
    /// Unrecognized manufacturer byte, raw value preserved
    Unknown(u8),
}

impl Manufacturer {
    /// Decode the manufacturer byte of the JEDEC ID
    pub const fn from_jedec(byte: u8) -> Self {
        match byte {
            0xEF => Self::Winbond,
            0x01 => Self::Spansion,
            0x20 => Self::Micron,
            0xC2 => Self::Macronix,
            0xD5 => Self::Issi,
            0xC8 => Self::GigaDevice,
            0x37 => Self::Amic,
            0xBF => Self::Sst,
            0xAD => Self::Hyundai,
            0xA1 => Self::Fudan,
            0x8C => Self::Esmt,
            0x89 => Self::Intel,
            0x62 => Self::Sanyo,
            0x04 => Self::Fujitsu,
            0x1C => Self::Eon,
            0x85 => Self::Puya,
            other => Self::Unknown(other),
        }
    }

    /// Vendor name for logging
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Winbond => "Winbond",
            Self::Spansion => "Spansion",
            Self::Micron => "Micron",
            Self::Macronix => "Macronix",
            Self::Issi => "ISSI",
            Self::GigaDevice => "GigaDevice",
            Self::Amic => "AMIC",
            Self::Sst => "SST",
            Self::Hyundai => "Hyundai",
            Self::Fudan => "Fudan",
            Self::Esmt => "ESMT",
            Self::Intel => "Intel",
            Self::Sanyo => "Sanyo",
            Self::Fujitsu => "Fujitsu",
            Self::Eon => "EON",
            Self::Puya => "Puya",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for Manufacturer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(raw) => write!(f, "unknown (0x{:02X})", raw),
            other => f.write_str(other.name()),
        }
    }
}

/// Capacity code, decoded from the third identification byte
///
/// The capacity is load-bearing: all geometry derives from it, so an
/// unmatched code fails identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    /// 1 Mbit (code 0x11)
    Mbit1,
    /// 2 Mbit (code 0x12)
    Mbit2,
    /// 4 Mbit (code 0x13)
    Mbit4,
    /// 8 Mbit (code 0x14)
    Mbit8,
    /// 16 Mbit (code 0x15)
    Mbit16,
    /// 32 Mbit (code 0x16)
    Mbit32,
    /// 64 Mbit (code 0x17)
    Mbit64,
    /// 128 Mbit (code 0x18)
    Mbit128,
    /// 256 Mbit (code 0x19)
    Mbit256,
    /// 512 Mbit (code 0x20)
    Mbit512,
    /// Unrecognized capacity code, raw value preserved
    Unknown(u8),
}

impl Capacity {
    /// Decode the capacity byte of the JEDEC ID
    pub const fn from_jedec(byte: u8) -> Self {
        match byte {
            0x11 => Self::Mbit1,
            0x12 => Self::Mbit2,
            0x13 => Self::Mbit4,
            0x14 => Self::Mbit8,
            0x15 => Self::Mbit16,
            0x16 => Self::Mbit32,
            0x17 => Self::Mbit64,
            0x18 => Self::Mbit128,
            0x19 => Self::Mbit256,
            0x20 => Self::Mbit512,
            other => Self::Unknown(other),
        }
    }

    /// Number of 64 KiB blocks, `None` for an unrecognized code
    pub const fn block_count(&self) -> Option<u32> {
        match self {
            Self::Mbit1 => Some(2),
            Self::Mbit2 => Some(4),
            Self::Mbit4 => Some(8),
            Self::Mbit8 => Some(16),
            Self::Mbit16 => Some(32),
            Self::Mbit32 => Some(64),
            Self::Mbit64 => Some(128),
            Self::Mbit128 => Some(256),
            Self::Mbit256 => Some(512),
            Self::Mbit512 => Some(1024),
            Self::Unknown(_) => None,
        }
    }

    /// Capacity in megabits, `None` for an unrecognized code
    pub const fn megabits(&self) -> Option<u32> {
        // One 64 KiB block is half a megabit
        match self.block_count() {
            Some(blocks) => Some(blocks / 2),
            None => None,
        }
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(raw) => write!(f, "unknown (0x{:02X})", raw),
            other => match other.megabits() {
                Some(mbit) => write!(f, "{} Mbit", mbit),
                None => f.write_str("unknown"),
            },
        }
    }
}
