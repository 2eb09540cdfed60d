//! Status register bit definitions

use bitflags::bitflags;

bitflags! {
    /// Status register 1
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Status1: u8 {
        /// Write In Progress / Busy
        const BUSY = 1 << 0;
        /// Write Enable Latch
        const WEL  = 1 << 1;
        /// Block Protect bit 0
        const BP0  = 1 << 2;
        /// Block Protect bit 1
        const BP1  = 1 << 3;
        /// Block Protect bit 2
        const BP2  = 1 << 4;
        /// Top/Bottom Protect
        const TB   = 1 << 5;
        /// Sector/Block Protect
        const SEC  = 1 << 6;
        /// Status Register Protect 0
        const SRP0 = 1 << 7;
    }
}

bitflags! {
    /// Status register 2
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Status2: u8 {
        /// Status Register Protect 1
        const SRP1 = 1 << 0;
        /// Quad Enable
        const QE   = 1 << 1;
        /// Security register Lock bit 0
        const LB0  = 1 << 3;
        /// Security register Lock bit 1
        const LB1  = 1 << 4;
        /// Security register Lock bit 2
        const LB2  = 1 << 5;
        /// Complement Protect
        const CMP  = 1 << 6;
        /// Suspend Status
        const SUS  = 1 << 7;
    }
}

bitflags! {
    /// Status register 3
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Status3: u8 {
        /// Write Protect Selection
        const WPS  = 1 << 2;
        /// Output Driver Strength bit 0
        const DRV0 = 1 << 5;
        /// Output Driver Strength bit 1
        const DRV1 = 1 << 6;
        /// /HOLD or /RESET function
        const HOLD = 1 << 7;
    }
}
