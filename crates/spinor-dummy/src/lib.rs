//! spinor-dummy - In-memory flash emulator for testing
//!
//! Provides [`DummyBus`], an in-memory flash chip behind the
//! [`SpiBus`] port. It decodes the command frames the driver clocks
//! out (identification, status, write enable, program, erase, read,
//! power-down) and applies them to a byte array, so the whole driver
//! stack can be exercised without hardware.
//!
//! Time is virtual: the clock only advances through `sleep_ms`, which
//! makes busy-poll and timeout behavior deterministic.

use std::cell::Cell;
use std::rc::Rc;

use log::{trace, warn};
use maybe_async::maybe_async;

use spinor_core::bus::SpiBus;
use spinor_core::chip::{Capacity, BLOCK_SIZE, SECTOR_SIZE};
use spinor_core::error::{Error, Result};
use spinor_core::spi::opcodes;

/// Configuration for the emulated chip
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// JEDEC manufacturer byte
    pub manufacturer_id: u8,
    /// JEDEC memory-type byte
    pub memory_type: u8,
    /// JEDEC capacity code (determines memory size)
    pub capacity_code: u8,
    /// How long the busy flag stays set after a program/erase
    pub busy_ms: u64,
    /// Report busy forever, for timeout tests
    pub stuck_busy: bool,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            manufacturer_id: 0xEF, // Winbond
            memory_type: 0x40,
            capacity_code: 0x15, // 32 blocks / 2 MiB
            busy_ms: 2,
            stuck_busy: false,
        }
    }
}

/// In-memory flash chip implementing [`SpiBus`].
///
/// Command frames accumulate while chip-select is active and are
/// applied when it deselects; identification and status reads answer
/// inside the full-duplex exchange, like the real chip does.
pub struct DummyBus {
    config: DummyConfig,
    data: Vec<u8>,
    clock_ms: u64,
    busy_until: u64,
    selected: bool,
    frame: Vec<u8>,
    replied: bool,
    write_enabled: bool,
    status_write_armed: bool,
    powered_down: bool,
    status_reg1: u8,
    status_reg2: u8,
    status_reg3: u8,
    transfers: Rc<Cell<u32>>,
}

impl DummyBus {
    /// Create an emulated chip. Memory starts erased (all 0xFF).
    pub fn new(config: DummyConfig) -> Self {
        // An unknown capacity code still yields a constructible chip so
        // identification-failure paths can be tested.
        let blocks = Capacity::from_jedec(config.capacity_code)
            .block_count()
            .unwrap_or(1);
        let data = vec![0xFF; (blocks * BLOCK_SIZE) as usize];
        Self {
            config,
            data,
            clock_ms: 0,
            busy_until: 0,
            selected: false,
            frame: Vec::new(),
            replied: false,
            write_enabled: false,
            status_write_armed: false,
            powered_down: false,
            status_reg1: 0,
            status_reg2: 0,
            status_reg3: 0,
            transfers: Rc::new(Cell::new(0)),
        }
    }

    /// Create an emulated chip with the default configuration
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// The emulated memory contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the emulated memory
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Whether the chip's write-enable latch is currently set
    pub fn write_enabled(&self) -> bool {
        self.write_enabled
    }

    /// Whether the chip is in deep power-down
    pub fn powered_down(&self) -> bool {
        self.powered_down
    }

    /// Shared counter of bus transactions, for asserting that an
    /// operation touched (or did not touch) the bus.
    pub fn transfer_counter(&self) -> Rc<Cell<u32>> {
        Rc::clone(&self.transfers)
    }

    fn busy(&self) -> bool {
        self.config.stuck_busy || self.clock_ms < self.busy_until
    }

    fn sr1(&self) -> u8 {
        let mut v = self.status_reg1 & !0x03;
        if self.busy() {
            v |= 0x01;
        }
        if self.write_enabled {
            v |= 0x02;
        }
        v
    }

    fn count_transaction(&self) {
        self.transfers.set(self.transfers.get() + 1);
    }

    fn addr3(frame: &[u8]) -> usize {
        ((frame[1] as usize) << 16) | ((frame[2] as usize) << 8) | frame[3] as usize
    }

    fn addr4(frame: &[u8]) -> usize {
        ((frame[1] as usize) << 24)
            | ((frame[2] as usize) << 16)
            | ((frame[3] as usize) << 8)
            | frame[4] as usize
    }

    fn program(&mut self, addr: usize, payload: &[u8]) {
        if !self.write_enabled {
            warn!("page program without write-enable, ignored");
            return;
        }
        if addr + payload.len() > self.data.len() {
            warn!("page program past end of memory, ignored");
            return;
        }
        // Programming only clears bits
        for (i, &byte) in payload.iter().enumerate() {
            self.data[addr + i] &= byte;
        }
        self.write_enabled = false;
        self.busy_until = self.clock_ms + self.config.busy_ms;
    }

    fn erase(&mut self, addr: usize, region: usize) {
        if !self.write_enabled {
            warn!("erase without write-enable, ignored");
            return;
        }
        let aligned = addr & !(region - 1);
        if aligned + region > self.data.len() {
            warn!("erase past end of memory, ignored");
            return;
        }
        for byte in &mut self.data[aligned..aligned + region] {
            *byte = 0xFF;
        }
        self.write_enabled = false;
        self.busy_until = self.clock_ms + self.config.busy_ms;
    }

    fn erase_all(&mut self) {
        if !self.write_enabled {
            warn!("chip erase without write-enable, ignored");
            return;
        }
        for byte in &mut self.data {
            *byte = 0xFF;
        }
        self.write_enabled = false;
        self.busy_until = self.clock_ms + self.config.busy_ms;
    }

    /// Apply the accumulated frame on chip-select deselect.
    fn apply_frame(&mut self) {
        if self.frame.is_empty() || self.replied {
            return;
        }
        let frame = std::mem::take(&mut self.frame);
        trace!("apply frame opcode {:#04x} len {}", frame[0], frame.len());
        let armed = std::mem::replace(&mut self.status_write_armed, false);
        match frame[0] {
            opcodes::WREN if frame.len() == 1 => self.write_enabled = true,
            opcodes::WRDI if frame.len() == 1 => self.write_enabled = false,
            opcodes::EWSR if frame.len() == 1 => self.status_write_armed = true,
            opcodes::WRSR if frame.len() == 2 && armed => self.status_reg1 = frame[1],
            opcodes::WRSR2 if frame.len() == 2 && armed => self.status_reg2 = frame[1],
            opcodes::WRSR3 if frame.len() == 2 && armed => self.status_reg3 = frame[1],
            opcodes::PP if frame.len() >= 4 => {
                self.program(Self::addr3(&frame), &frame[4..])
            }
            opcodes::PP_4B if frame.len() >= 5 => {
                self.program(Self::addr4(&frame), &frame[5..])
            }
            opcodes::SE_20 if frame.len() == 4 => {
                self.erase(Self::addr3(&frame), SECTOR_SIZE as usize)
            }
            opcodes::SE_21 if frame.len() == 5 => {
                self.erase(Self::addr4(&frame), SECTOR_SIZE as usize)
            }
            opcodes::BE_D8 if frame.len() == 4 => {
                self.erase(Self::addr3(&frame), BLOCK_SIZE as usize)
            }
            opcodes::BE_DC if frame.len() == 5 => {
                self.erase(Self::addr4(&frame), BLOCK_SIZE as usize)
            }
            opcodes::CE_C7 | opcodes::CE_60 if frame.len() == 1 => self.erase_all(),
            opcodes::DP if frame.len() == 1 => self.powered_down = true,
            opcodes::RDP if frame.len() == 1 => self.powered_down = false,
            // Read headers are consumed by receive(); nothing to apply.
            opcodes::READ | opcodes::READ_4B => {}
            other => warn!("unhandled frame opcode {:#04x}", other),
        }
    }
}

#[maybe_async(AFIT)]
impl SpiBus for DummyBus {
    fn chip_select(&mut self, select: bool) {
        if select {
            self.selected = true;
            self.frame.clear();
            self.replied = false;
        } else if self.selected {
            self.apply_frame();
            self.selected = false;
        }
    }

    async fn transfer(&mut self, tx: &[u8], rx: &mut [u8], _timeout_ms: u32) -> Result<()> {
        if !self.selected || tx.len() != rx.len() {
            return Err(Error::Transport);
        }
        self.count_transaction();
        self.frame.extend_from_slice(tx);
        if self.frame.is_empty() {
            return Ok(());
        }
        match self.frame[0] {
            opcodes::RDID if rx.len() >= 4 => {
                rx[1] = self.config.manufacturer_id;
                rx[2] = self.config.memory_type;
                rx[3] = self.config.capacity_code;
                self.replied = true;
            }
            opcodes::RDSR if rx.len() >= 2 => {
                rx[1] = self.sr1();
                self.replied = true;
            }
            opcodes::RDSR2 if rx.len() >= 2 => {
                rx[1] = self.status_reg2;
                self.replied = true;
            }
            opcodes::RDSR3 if rx.len() >= 2 => {
                rx[1] = self.status_reg3;
                self.replied = true;
            }
            _ => {}
        }
        Ok(())
    }

    async fn transmit(&mut self, tx: &[u8], _timeout_ms: u32) -> Result<()> {
        if !self.selected {
            return Err(Error::Transport);
        }
        self.count_transaction();
        self.frame.extend_from_slice(tx);
        Ok(())
    }

    async fn receive(&mut self, rx: &mut [u8], _timeout_ms: u32) -> Result<()> {
        if !self.selected {
            return Err(Error::Transport);
        }
        self.count_transaction();
        let addr = match self.frame.first() {
            Some(&opcodes::READ) if self.frame.len() == 4 => Self::addr3(&self.frame),
            Some(&opcodes::READ_4B) if self.frame.len() == 5 => Self::addr4(&self.frame),
            _ => return Err(Error::Transport),
        };
        if addr + rx.len() > self.data.len() {
            return Err(Error::Transport);
        }
        rx.copy_from_slice(&self.data[addr..addr + rx.len()]);
        self.replied = true;
        Ok(())
    }

    async fn sleep_ms(&mut self, ms: u32) {
        self.clock_ms += ms as u64;
    }

    fn now_ms(&self) -> u64 {
        self.clock_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spinor_core::chip::Manufacturer;
    use spinor_core::spi::{AddressWidth, Status2};
    use spinor_core::{Error, Flash};

    fn ready_flash() -> Flash<DummyBus> {
        let mut flash = Flash::new(DummyBus::new_default());
        flash.init().unwrap();
        flash
    }

    #[test]
    fn init_identifies_chip() {
        let flash = ready_flash();
        let geo = flash.geometry().unwrap();
        assert_eq!(geo.manufacturer, Manufacturer::Winbond);
        assert_eq!(geo.block_count, 32);
        assert_eq!(geo.sector_count, 512);
        assert_eq!(geo.page_count, 8192);
        assert_eq!(geo.address_width(), AddressWidth::ThreeByte);
    }

    #[test]
    fn init_twice_fails() {
        let mut flash = ready_flash();
        assert_eq!(flash.init(), Err(Error::AlreadyInitialized));
    }

    #[test]
    fn operations_require_init() {
        let mut flash = Flash::new(DummyBus::new_default());
        assert_eq!(flash.write_page(0, &[0x00], 0), Err(Error::NotInitialized));
        let mut buf = [0u8; 4];
        assert_eq!(flash.read_page(0, &mut buf, 0), Err(Error::NotInitialized));
        assert_eq!(flash.erase_sector(0), Err(Error::NotInitialized));
        assert_eq!(flash.erase_chip(), Err(Error::NotInitialized));
    }

    #[test]
    fn unknown_capacity_fails_init() {
        let mut flash = Flash::new(DummyBus::new(DummyConfig {
            capacity_code: 0x99,
            ..DummyConfig::default()
        }));
        assert_eq!(flash.init(), Err(Error::UnknownCapacity(0x99)));
        assert!(flash.geometry().is_none());
    }

    #[test]
    fn unknown_manufacturer_is_not_fatal() {
        let mut flash = Flash::new(DummyBus::new(DummyConfig {
            manufacturer_id: 0x1F,
            ..DummyConfig::default()
        }));
        flash.init().unwrap();
        let geo = flash.geometry().unwrap();
        assert_eq!(geo.manufacturer, Manufacturer::Unknown(0x1F));
    }

    #[test]
    fn write_roundtrip_across_page_boundary() {
        let mut flash = ready_flash();
        let data: Vec<u8> = (0..40).map(|i| i as u8).collect();
        // Spans the page 1 / page 2 boundary at 0x200
        flash.write_address(0x1F0, &data).unwrap();

        let mut buf = [0u8; 40];
        flash.read_address(0x1F0, &mut buf).unwrap();
        assert_eq!(&buf[..], &data[..]);

        let bus = flash.release();
        assert_eq!(&bus.data()[0x1F0..0x1F0 + 40], &data[..]);
    }

    #[test]
    fn reads_are_idempotent() {
        let mut flash = ready_flash();
        flash.write_address(0x400, &[0x5A; 16]).unwrap();
        let mut first = [0u8; 16];
        let mut second = [0u8; 16];
        flash.read_address(0x400, &mut first).unwrap();
        flash.read_address(0x400, &mut second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn out_of_range_touches_no_bus() {
        let bus = DummyBus::new_default();
        let counter = bus.transfer_counter();
        let mut flash = Flash::new(bus);
        flash.init().unwrap();

        let before = counter.get();
        assert_eq!(flash.write_page(8192, &[0x00], 0), Err(Error::OutOfRange));
        let mut buf = [0u8; 4];
        assert_eq!(flash.read_sector(512, &mut buf, 0), Err(Error::OutOfRange));
        assert_eq!(flash.erase_block(32), Err(Error::OutOfRange));
        assert_eq!(
            flash.write_address(0x20_0000 - 1, &[0, 0]),
            Err(Error::OutOfRange)
        );
        assert_eq!(counter.get(), before);
    }

    #[test]
    fn invalid_offset_at_each_granularity() {
        let mut flash = ready_flash();
        let mut buf = [0u8; 4];
        assert_eq!(flash.write_page(0, &[0], 256), Err(Error::InvalidOffset));
        assert_eq!(flash.write_sector(0, &[0], 4096), Err(Error::InvalidOffset));
        assert_eq!(flash.write_block(0, &[0], 65536), Err(Error::InvalidOffset));
        assert_eq!(flash.read_page(0, &mut buf, 256), Err(Error::InvalidOffset));
        assert_eq!(
            flash.read_sector(0, &mut buf, 4096),
            Err(Error::InvalidOffset)
        );
        assert_eq!(
            flash.read_block(0, &mut buf, 65536),
            Err(Error::InvalidOffset)
        );
    }

    #[test]
    fn page_write_clamps_to_remaining_room() {
        let mut flash = ready_flash();
        // 100 bytes at offset 200 of page 3: only 56 fit
        let written = flash.write_page(3, &[0xAB; 100], 200).unwrap();
        assert_eq!(written, 56);

        let mut buf = [0x00u8; 100];
        let read = flash.read_page(3, &mut buf, 200).unwrap();
        assert_eq!(read, 56);
        assert!(buf[..56].iter().all(|&b| b == 0xAB));
        // Tail past the clamp is untouched
        assert!(buf[56..].iter().all(|&b| b == 0x00));

        // The data landed at byte address page*256 + offset
        let mut at = [0u8; 56];
        flash.read_address(3 * 256 + 200, &mut at).unwrap();
        assert!(at.iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn sector_write_clamps_and_splits_pages() {
        let mut flash = ready_flash();
        let data = vec![0x11u8; 500];
        // 500 bytes at offset 4000 of sector 2: only 96 fit
        let written = flash.write_sector(2, &data, 4000).unwrap();
        assert_eq!(written, 96);

        let mut buf = vec![0u8; 96];
        flash.read_address(2 * 4096 + 4000, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0x11));
        // Next sector untouched
        let mut next = [0u8; 4];
        flash.read_address(3 * 4096, &mut next).unwrap();
        assert_eq!(next, [0xFF; 4]);
    }

    #[test]
    fn erase_sector_scope() {
        let mut flash = ready_flash();
        flash.write_address(0x0FFC, &[0x00; 8]).unwrap(); // straddles sectors 0/1
        flash.erase_sector(0).unwrap();

        let mut buf = [0u8; 8];
        flash.read_address(0x0FFC, &mut buf).unwrap();
        assert_eq!(&buf[..4], &[0xFF; 4]); // sector 0 erased
        assert_eq!(&buf[4..], &[0x00; 4]); // sector 1 kept
    }

    #[test]
    fn erase_chip_wipes_everything() {
        let mut flash = ready_flash();
        flash.write_address(0, &[0x00; 32]).unwrap();
        flash.write_address(0x1F_0000, &[0x00; 32]).unwrap();
        flash.erase_chip().unwrap();
        let bus = flash.release();
        assert!(bus.data().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn stuck_busy_write_times_out() {
        let mut flash = Flash::new(DummyBus::new(DummyConfig {
            stuck_busy: true,
            ..DummyConfig::default()
        }));
        flash.init().unwrap();
        // Power-on settle leaves the clock at 20 ms
        let res = flash.write_page(0, &[0x00; 4], 0);
        assert_eq!(res, Err(Error::Timeout));

        let bus = flash.release();
        // Poll budget is 100 ms, checked at 1 ms granularity
        let elapsed = bus.now_ms() - 20;
        assert!((100..=101).contains(&elapsed), "elapsed {}", elapsed);
        // Write-disable still ran on the failure path
        assert!(!bus.write_enabled());
    }

    #[test]
    fn lock_is_released_after_failures() {
        let mut flash = Flash::new(DummyBus::new(DummyConfig {
            stuck_busy: true,
            ..DummyConfig::default()
        }));
        flash.init().unwrap();
        assert_eq!(flash.write_page(0, &[0x00], 0), Err(Error::Timeout));
        // A failed operation must not leave the lock held; a later
        // operation would spin forever if it did.
        flash.read_status2().unwrap();
    }

    #[test]
    fn write_enable_left_clear_after_success() {
        let mut flash = ready_flash();
        flash.write_page(0, &[0x42; 16], 0).unwrap();
        let bus = flash.release();
        assert!(!bus.write_enabled());
    }

    #[test]
    fn four_byte_addressing_boundary() {
        // 0x18 = 256 blocks = 16 MiB, still 3-byte
        let mut flash = Flash::new(DummyBus::new(DummyConfig {
            capacity_code: 0x18,
            ..DummyConfig::default()
        }));
        flash.init().unwrap();
        assert_eq!(
            flash.geometry().unwrap().address_width(),
            AddressWidth::ThreeByte
        );

        // 0x19 = 512 blocks = 32 MiB, 4-byte
        let mut flash = Flash::new(DummyBus::new(DummyConfig {
            capacity_code: 0x19,
            ..DummyConfig::default()
        }));
        flash.init().unwrap();
        assert_eq!(
            flash.geometry().unwrap().address_width(),
            AddressWidth::FourByte
        );

        // Roundtrip past the 16 MiB line needs the 4-byte frames
        let high = 0x0100_0200;
        flash.write_address(high, &[0xC3; 32]).unwrap();
        let mut buf = [0u8; 32];
        flash.read_address(high, &mut buf).unwrap();
        assert_eq!(buf, [0xC3; 32]);
    }

    #[test]
    fn status_register_write_and_read() {
        let mut flash = ready_flash();
        flash.write_status2(Status2::QE).unwrap();
        let sr2 = flash.read_status2().unwrap();
        assert!(sr2.contains(Status2::QE));
    }

    #[test]
    fn power_down_and_release() {
        let mut flash = ready_flash();
        flash.power_down().unwrap();
        let bus = flash.release();
        assert!(bus.powered_down());

        // Wake-up works on an uninitialized handle too
        let mut flash = Flash::new(bus);
        flash.release_power_down().unwrap();
        assert!(!flash.release().powered_down());
    }
}
