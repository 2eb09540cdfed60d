//! SPI command framing for the flash protocol
//!
//! This module provides the command codec: opcode tables, address
//! encoding, status register bits, and the builder that produces the
//! exact transmit frame for each operation.

mod address;
mod command;
pub mod opcodes;
mod status;

pub use address::AddressWidth;
pub use command::{identify_frame, status_read_frame, Command, CommandFrame};
pub use status::{Status1, Status2, Status3};
