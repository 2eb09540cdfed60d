//! Error types for spinor-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
///
/// All failures surface here as result values; nothing is retried
/// internally. A failed multi-page write leaves the pages programmed
/// before the failing chunk as written - flash cannot un-write bits, so
/// callers must treat the target region as indeterminate and erase it
/// before relying on its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Bus transfer failed or timed out at the hardware level
    Transport,
    /// Busy-wait on the status register exceeded its budget
    Timeout,
    /// Address, page, sector or block index exceeds the device geometry
    OutOfRange,
    /// Offset is at or past the size of the addressed region
    InvalidOffset,
    /// Operation attempted before a successful `init`
    NotInitialized,
    /// `init` called on an already-initialized device
    AlreadyInitialized,
    /// Capacity code from the JEDEC ID is not in the known table
    UnknownCapacity(u8),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "SPI transfer failed"),
            Self::Timeout => write!(f, "operation timed out"),
            Self::OutOfRange => write!(f, "address out of range"),
            Self::InvalidOffset => write!(f, "offset exceeds region size"),
            Self::NotInitialized => write!(f, "device not initialized"),
            Self::AlreadyInitialized => write!(f, "device already initialized"),
            Self::UnknownCapacity(code) => {
                write!(f, "unknown capacity code 0x{:02X}", code)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
