//! Flash command sequences
//!
//! The low-level command sequences common to JEDEC SPI NOR chips:
//! identification, status register access, write enable/disable, page
//! program, erase, read, and the busy-poll loop. Each sequence brackets
//! its frames with chip-select and goes through the [`SpiBus`] port.
//!
//! Uses `maybe_async` to support both sync and async modes:
//! - With the `is_sync` feature: blocking/synchronous
//! - Without it: async

use log::warn;
use maybe_async::maybe_async;

use crate::bus::SpiBus;
use crate::error::{Error, Result};
use crate::spi::{identify_frame, opcodes, status_read_frame, AddressWidth, Command};
use crate::spi::{Status1, Status2, Status3};

/// Bus timeout for command frames
pub const CMD_TIMEOUT_MS: u32 = 100;
/// Bus timeout for transmitting program payload
pub const DATA_WRITE_TIMEOUT_MS: u32 = 1000;
/// Bus timeout for receiving read payload
pub const DATA_READ_TIMEOUT_MS: u32 = 2000;

/// Delay between busy-flag polls
pub const POLL_INTERVAL_MS: u32 = 1;

/// Busy-poll budget for a page program
pub const PAGE_PROGRAM_TIMEOUT_MS: u32 = 100;
/// Busy-poll budget for a 4 KiB sector erase
pub const SECTOR_ERASE_TIMEOUT_MS: u32 = 1000;
/// Busy-poll budget for a 64 KiB block erase
pub const BLOCK_ERASE_TIMEOUT_MS: u32 = 3000;
/// Busy-poll budget per block for a chip erase
pub const CHIP_ERASE_TIMEOUT_PER_BLOCK_MS: u32 = 1000;

/// Send the Write Enable command
#[maybe_async]
pub async fn write_enable<B: SpiBus + ?Sized>(bus: &mut B) -> Result<()> {
    let frame = Command::simple(opcodes::WREN).encode();
    bus.chip_select(true);
    let res = bus.transmit(&frame, CMD_TIMEOUT_MS).await;
    bus.chip_select(false);
    res
}

/// Send the Write Disable command
#[maybe_async]
pub async fn write_disable<B: SpiBus + ?Sized>(bus: &mut B) -> Result<()> {
    let frame = Command::simple(opcodes::WRDI).encode();
    bus.chip_select(true);
    let res = bus.transmit(&frame, CMD_TIMEOUT_MS).await;
    bus.chip_select(false);
    res
}

#[maybe_async]
async fn read_status_raw<B: SpiBus + ?Sized>(bus: &mut B, opcode: u8) -> Result<u8> {
    let tx = status_read_frame(opcode);
    let mut rx = [0u8; 2];
    bus.chip_select(true);
    let res = bus.transfer(&tx, &mut rx, CMD_TIMEOUT_MS).await;
    bus.chip_select(false);
    res?;
    Ok(rx[1])
}

/// Read status register 1. Never needs write-enable, no side effects.
#[maybe_async]
pub async fn read_status1<B: SpiBus + ?Sized>(bus: &mut B) -> Result<Status1> {
    Ok(Status1::from_bits_retain(
        read_status_raw(bus, opcodes::RDSR).await?,
    ))
}

/// Read status register 2
#[maybe_async]
pub async fn read_status2<B: SpiBus + ?Sized>(bus: &mut B) -> Result<Status2> {
    Ok(Status2::from_bits_retain(
        read_status_raw(bus, opcodes::RDSR2).await?,
    ))
}

/// Read status register 3
#[maybe_async]
pub async fn read_status3<B: SpiBus + ?Sized>(bus: &mut B) -> Result<Status3> {
    Ok(Status3::from_bits_retain(
        read_status_raw(bus, opcodes::RDSR3).await?,
    ))
}

/// Two-phase status write: write-status-enable, then opcode + value,
/// each in its own chip-select window.
#[maybe_async]
pub async fn write_status_raw<B: SpiBus + ?Sized>(
    bus: &mut B,
    opcode: u8,
    value: u8,
) -> Result<()> {
    let enable = Command::simple(opcodes::EWSR).encode();
    bus.chip_select(true);
    let res = bus.transmit(&enable, CMD_TIMEOUT_MS).await;
    bus.chip_select(false);
    res?;

    let frame = [opcode, value];
    bus.chip_select(true);
    let res = bus.transmit(&frame, CMD_TIMEOUT_MS).await;
    bus.chip_select(false);
    res
}

/// Read the JEDEC identification bytes.
///
/// Returns (manufacturer, memory type, capacity code).
#[maybe_async]
pub async fn read_jedec_id<B: SpiBus + ?Sized>(bus: &mut B) -> Result<(u8, u8, u8)> {
    let tx = identify_frame();
    let mut rx = [0u8; 4];
    bus.chip_select(true);
    let res = bus.transfer(&tx, &mut rx, CMD_TIMEOUT_MS).await;
    bus.chip_select(false);
    res?;
    Ok((rx[1], rx[2], rx[3]))
}

/// Wait for the busy flag in status register 1 to clear.
///
/// Sleeps [`POLL_INTERVAL_MS`] between polls and fails with `Timeout`
/// once `timeout_ms` has elapsed on the bus clock. Blocking spin-wait on
/// the calling context; the sleep yields to the host scheduler.
#[maybe_async]
pub async fn wait_ready<B: SpiBus + ?Sized>(bus: &mut B, timeout_ms: u32) -> Result<()> {
    let start = bus.now_ms();
    loop {
        bus.sleep_ms(POLL_INTERVAL_MS).await;
        if bus.now_ms().saturating_sub(start) >= timeout_ms as u64 {
            warn!("wait_ready: busy flag stuck for {} ms", timeout_ms);
            return Err(Error::Timeout);
        }
        if !read_status1(bus).await?.contains(Status1::BUSY) {
            return Ok(());
        }
    }
}

/// Program one page-bounded span of bytes at `address`.
///
/// `data` must not cross a page boundary; callers enforce that. The full
/// mutating bracket runs here: write-enable, command + payload, busy
/// poll, and an unconditional write-disable on the way out (its own
/// failure is logged, not propagated, so the command outcome survives).
#[maybe_async]
pub async fn program_page<B: SpiBus + ?Sized>(
    bus: &mut B,
    address: u32,
    data: &[u8],
    width: AddressWidth,
) -> Result<()> {
    write_enable(bus).await?;

    let frame = Command::addressed(opcodes::page_program(width), address, width).encode();
    bus.chip_select(true);
    let mut res = bus.transmit(&frame, CMD_TIMEOUT_MS).await;
    if res.is_ok() {
        res = bus.transmit(data, DATA_WRITE_TIMEOUT_MS).await;
    }
    bus.chip_select(false);

    if res.is_ok() {
        res = wait_ready(bus, PAGE_PROGRAM_TIMEOUT_MS).await;
    }
    if let Err(e) = write_disable(bus).await {
        warn!("write-disable after page program failed: {}", e);
    }
    res
}

#[maybe_async]
async fn erase_with<B: SpiBus + ?Sized>(
    bus: &mut B,
    command: Command,
    poll_timeout_ms: u32,
) -> Result<()> {
    write_enable(bus).await?;

    let frame = command.encode();
    bus.chip_select(true);
    let mut res = bus.transmit(&frame, CMD_TIMEOUT_MS).await;
    bus.chip_select(false);

    if res.is_ok() {
        res = wait_ready(bus, poll_timeout_ms).await;
    }
    if let Err(e) = write_disable(bus).await {
        warn!("write-disable after erase failed: {}", e);
    }
    res
}

/// Erase the 4 KiB sector at `address`
#[maybe_async]
pub async fn erase_sector<B: SpiBus + ?Sized>(
    bus: &mut B,
    address: u32,
    width: AddressWidth,
) -> Result<()> {
    let cmd = Command::addressed(opcodes::sector_erase(width), address, width);
    erase_with(bus, cmd, SECTOR_ERASE_TIMEOUT_MS).await
}

/// Erase the 64 KiB block at `address`
#[maybe_async]
pub async fn erase_block<B: SpiBus + ?Sized>(
    bus: &mut B,
    address: u32,
    width: AddressWidth,
) -> Result<()> {
    let cmd = Command::addressed(opcodes::block_erase(width), address, width);
    erase_with(bus, cmd, BLOCK_ERASE_TIMEOUT_MS).await
}

/// Erase the entire chip. The poll budget scales with capacity.
#[maybe_async]
pub async fn erase_chip<B: SpiBus + ?Sized>(bus: &mut B, block_count: u32) -> Result<()> {
    let cmd = Command::simple(opcodes::CE_C7);
    erase_with(bus, cmd, block_count * CHIP_ERASE_TIMEOUT_PER_BLOCK_MS).await
}

/// Read `buf.len()` bytes starting at `address`. No write-enable needed.
#[maybe_async]
pub async fn read_data<B: SpiBus + ?Sized>(
    bus: &mut B,
    address: u32,
    buf: &mut [u8],
    width: AddressWidth,
) -> Result<()> {
    let frame = Command::addressed(opcodes::read_data(width), address, width).encode();
    bus.chip_select(true);
    let mut res = bus.transmit(&frame, CMD_TIMEOUT_MS).await;
    if res.is_ok() {
        res = bus.receive(buf, DATA_READ_TIMEOUT_MS).await;
    }
    bus.chip_select(false);
    res
}

/// Enter deep power-down
#[maybe_async]
pub async fn power_down<B: SpiBus + ?Sized>(bus: &mut B) -> Result<()> {
    let frame = Command::simple(opcodes::DP).encode();
    bus.chip_select(true);
    let res = bus.transmit(&frame, CMD_TIMEOUT_MS).await;
    bus.chip_select(false);
    res
}

/// Release from deep power-down
#[maybe_async]
pub async fn release_power_down<B: SpiBus + ?Sized>(bus: &mut B) -> Result<()> {
    let frame = Command::simple(opcodes::RDP).encode();
    bus.chip_select(true);
    let res = bus.transmit(&frame, CMD_TIMEOUT_MS).await;
    bus.chip_select(false);
    res
}
