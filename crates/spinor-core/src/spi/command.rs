//! SPI command structure
//!
//! Builds the exact transmit frame for each flash operation. Frames are
//! small (opcode plus at most a 4-byte address); payload data is clocked
//! out separately by the protocol layer, so no allocation is needed.

use heapless::Vec;

use super::{opcodes, AddressWidth};

/// Longest command frame: opcode + 4-byte address
pub const MAX_FRAME: usize = 5;

/// An encoded command frame ready for transmission
pub type CommandFrame = Vec<u8, MAX_FRAME>;

/// A single flash command header
///
/// Pure data: building and encoding a command has no side effects and
/// never inspects chip state beyond the caller-supplied address width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    /// The opcode byte
    pub opcode: u8,
    /// Address (if any)
    pub address: Option<u32>,
    /// Address width used when an address is present
    pub width: AddressWidth,
}

impl Command {
    /// A command with no address phase (e.g. WREN, WRDI, chip erase)
    pub const fn simple(opcode: u8) -> Self {
        Self {
            opcode,
            address: None,
            width: AddressWidth::ThreeByte,
        }
    }

    /// An addressed command (page program, erase, read)
    pub const fn addressed(opcode: u8, address: u32, width: AddressWidth) -> Self {
        Self {
            opcode,
            address: Some(address),
            width,
        }
    }

    /// Encode the transmit frame: opcode, then the big-endian address
    pub fn encode(&self) -> CommandFrame {
        let mut frame = CommandFrame::new();
        // MAX_FRAME covers the opcode plus the widest address
        let _ = frame.push(self.opcode);
        if let Some(address) = self.address {
            let mut bytes = [0u8; 4];
            self.width.encode(address, &mut bytes);
            let _ = frame.extend_from_slice(&bytes[..self.width.bytes()]);
        }
        frame
    }
}

/// JEDEC identification frame: the chip returns four bytes while these
/// four are clocked out (byte 0 of the response is discarded).
pub const fn identify_frame() -> [u8; 4] {
    [opcodes::RDID, 0xFF, 0xFF, 0xFF]
}

/// Status-register read frame: opcode plus one dummy byte; the status
/// value arrives in the second received byte.
pub const fn status_read_frame(opcode: u8) -> [u8; 2] {
    [opcode, opcodes::DUMMY]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_frame_is_one_opcode() {
        let frame = Command::simple(opcodes::WREN).encode();
        assert_eq!(frame.as_slice(), &[0x06]);
    }

    #[test]
    fn three_byte_program_frame() {
        let cmd = Command::addressed(opcodes::PP, 0x123456, AddressWidth::ThreeByte);
        assert_eq!(cmd.encode().as_slice(), &[0x02, 0x12, 0x34, 0x56]);
    }

    #[test]
    fn four_byte_program_frame() {
        let cmd = Command::addressed(opcodes::PP_4B, 0x0112_3456, AddressWidth::FourByte);
        assert_eq!(cmd.encode().as_slice(), &[0x12, 0x01, 0x12, 0x34, 0x56]);
    }

    #[test]
    fn erase_frames_use_width_specific_opcodes() {
        let se = Command::addressed(
            opcodes::sector_erase(AddressWidth::ThreeByte),
            0x1000,
            AddressWidth::ThreeByte,
        );
        assert_eq!(se.encode().as_slice(), &[0x20, 0x00, 0x10, 0x00]);

        let be = Command::addressed(
            opcodes::block_erase(AddressWidth::FourByte),
            0x0100_0000,
            AddressWidth::FourByte,
        );
        assert_eq!(be.encode().as_slice(), &[0xDC, 0x01, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn fixed_frames() {
        assert_eq!(identify_frame(), [0x9F, 0xFF, 0xFF, 0xFF]);
        assert_eq!(status_read_frame(opcodes::RDSR), [0x05, 0xA5]);
    }
}
