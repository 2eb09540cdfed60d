//! High-level flash operations
//!
//! Every public operation takes the operation lock, runs its command
//! sequence through [`protocol`], and releases the lock on all exit
//! paths. Data operations require a prior [`Flash::init`]; status and
//! power operations only need the bus.

use log::debug;
use maybe_async::maybe_async;

use crate::bus::SpiBus;
use crate::chip::{
    block_to_address, sector_to_address, Geometry, BLOCK_SIZE, PAGE_SIZE, SECTOR_SIZE,
};
use crate::error::{Error, Result};
use crate::flash::Flash;
use crate::protocol;
use crate::spi::{opcodes, AddressWidth, Status1, Status2, Status3};

/// Bytes to program out of `remaining` without crossing the page
/// boundary ahead of `cursor`.
fn chunk_len(cursor: u32, remaining: usize) -> usize {
    let room = (PAGE_SIZE - cursor % PAGE_SIZE) as usize;
    remaining.min(room)
}

/// Bytes of a region write/read after clamping to the room left past
/// `offset`. Callers have already rejected `offset >= region_size`.
fn clamp_to_region(region_size: u32, offset: u32, len: usize) -> usize {
    len.min((region_size - offset) as usize)
}

impl<B: SpiBus> Flash<B> {
    // ------------------------------------------------------------------
    // Erase
    // ------------------------------------------------------------------

    /// Erase the whole chip. Poll budget scales with capacity.
    #[maybe_async]
    pub async fn erase_chip(&mut self) -> Result<()> {
        let geometry = self.require_init()?;
        debug!("erase chip ({} blocks)", geometry.block_count);
        self.acquire().await;
        let res = protocol::erase_chip(&mut self.bus, geometry.block_count).await;
        self.lock.release();
        res
    }

    /// Erase the 4 KiB sector `sector`
    #[maybe_async]
    pub async fn erase_sector(&mut self, sector: u32) -> Result<()> {
        let geometry = self.require_init()?;
        if sector >= geometry.sector_count {
            return Err(Error::OutOfRange);
        }
        debug!("erase sector {}", sector);
        self.acquire().await;
        let res = protocol::erase_sector(
            &mut self.bus,
            sector_to_address(sector),
            geometry.address_width(),
        )
        .await;
        self.lock.release();
        res
    }

    /// Erase the 64 KiB block `block`
    #[maybe_async]
    pub async fn erase_block(&mut self, block: u32) -> Result<()> {
        let geometry = self.require_init()?;
        if block >= geometry.block_count {
            return Err(Error::OutOfRange);
        }
        debug!("erase block {}", block);
        self.acquire().await;
        let res = protocol::erase_block(
            &mut self.bus,
            block_to_address(block),
            geometry.address_width(),
        )
        .await;
        self.lock.release();
        res
    }

    // ------------------------------------------------------------------
    // Write
    // ------------------------------------------------------------------

    /// Program `data` starting at byte `address`, splitting on page
    /// boundaries. Aborts on the first failing page; already-programmed
    /// pages are not rolled back.
    #[maybe_async]
    pub async fn write_address(&mut self, address: u32, data: &[u8]) -> Result<()> {
        let geometry = self.require_init()?;
        if address as u64 + data.len() as u64 > geometry.total_bytes() {
            return Err(Error::OutOfRange);
        }
        debug!("write {} bytes at {:#x}", data.len(), address);
        self.acquire().await;
        let res = self
            .write_span(address, data, geometry.address_width())
            .await;
        self.lock.release();
        res
    }

    /// Program into page `page` starting `offset` bytes in.
    ///
    /// The length is clamped to the room left in the page; the number of
    /// bytes actually programmed is returned.
    #[maybe_async]
    pub async fn write_page(&mut self, page: u32, data: &[u8], offset: u32) -> Result<usize> {
        let geometry = self.require_init()?;
        self.write_region(page, geometry.page_count, PAGE_SIZE, data, offset, geometry)
            .await
    }

    /// Program into sector `sector` starting `offset` bytes in, clamped
    /// to the sector. Returns the byte count programmed.
    #[maybe_async]
    pub async fn write_sector(&mut self, sector: u32, data: &[u8], offset: u32) -> Result<usize> {
        let geometry = self.require_init()?;
        self.write_region(
            sector,
            geometry.sector_count,
            SECTOR_SIZE,
            data,
            offset,
            geometry,
        )
        .await
    }

    /// Program into block `block` starting `offset` bytes in, clamped
    /// to the block. Returns the byte count programmed.
    #[maybe_async]
    pub async fn write_block(&mut self, block: u32, data: &[u8], offset: u32) -> Result<usize> {
        let geometry = self.require_init()?;
        self.write_region(block, geometry.block_count, BLOCK_SIZE, data, offset, geometry)
            .await
    }

    #[maybe_async]
    async fn write_region(
        &mut self,
        index: u32,
        count: u32,
        region_size: u32,
        data: &[u8],
        offset: u32,
        geometry: Geometry,
    ) -> Result<usize> {
        if index >= count {
            return Err(Error::OutOfRange);
        }
        if offset >= region_size {
            return Err(Error::InvalidOffset);
        }
        let base = index * region_size;
        let len = clamp_to_region(region_size, offset, data.len());
        debug!(
            "write {} bytes at {:#x} (region offset {})",
            len,
            base + offset,
            offset
        );
        self.acquire().await;
        let res = self
            .write_span(base + offset, &data[..len], geometry.address_width())
            .await;
        self.lock.release();
        res.map(|()| len)
    }

    /// Page-boundary-aware program loop. Lock already held.
    #[maybe_async]
    async fn write_span(&mut self, address: u32, data: &[u8], width: AddressWidth) -> Result<()> {
        let mut cursor = address;
        let mut remaining = data;
        while !remaining.is_empty() {
            let len = chunk_len(cursor, remaining.len());
            protocol::program_page(&mut self.bus, cursor, &remaining[..len], width).await?;
            cursor += len as u32;
            remaining = &remaining[len..];
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fill `buf` from byte `address`
    #[maybe_async]
    pub async fn read_address(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        let geometry = self.require_init()?;
        if address as u64 + buf.len() as u64 > geometry.total_bytes() {
            return Err(Error::OutOfRange);
        }
        debug!("read {} bytes at {:#x}", buf.len(), address);
        self.acquire().await;
        let res = protocol::read_data(&mut self.bus, address, buf, geometry.address_width()).await;
        self.lock.release();
        res
    }

    /// Read from page `page` starting `offset` bytes in, clamped to the
    /// page. Returns the byte count read; the tail of `buf` past the
    /// clamp is left untouched.
    #[maybe_async]
    pub async fn read_page(&mut self, page: u32, buf: &mut [u8], offset: u32) -> Result<usize> {
        let geometry = self.require_init()?;
        self.read_region(page, geometry.page_count, PAGE_SIZE, buf, offset, geometry)
            .await
    }

    /// Read from sector `sector` starting `offset` bytes in, clamped to
    /// the sector. Returns the byte count read.
    #[maybe_async]
    pub async fn read_sector(&mut self, sector: u32, buf: &mut [u8], offset: u32) -> Result<usize> {
        let geometry = self.require_init()?;
        self.read_region(
            sector,
            geometry.sector_count,
            SECTOR_SIZE,
            buf,
            offset,
            geometry,
        )
        .await
    }

    /// Read from block `block` starting `offset` bytes in, clamped to
    /// the block. Returns the byte count read.
    #[maybe_async]
    pub async fn read_block(&mut self, block: u32, buf: &mut [u8], offset: u32) -> Result<usize> {
        let geometry = self.require_init()?;
        self.read_region(block, geometry.block_count, BLOCK_SIZE, buf, offset, geometry)
            .await
    }

    #[maybe_async]
    async fn read_region(
        &mut self,
        index: u32,
        count: u32,
        region_size: u32,
        buf: &mut [u8],
        offset: u32,
        geometry: Geometry,
    ) -> Result<usize> {
        if index >= count {
            return Err(Error::OutOfRange);
        }
        if offset >= region_size {
            return Err(Error::InvalidOffset);
        }
        let base = index * region_size;
        let len = clamp_to_region(region_size, offset, buf.len());
        debug!(
            "read {} bytes at {:#x} (region offset {})",
            len,
            base + offset,
            offset
        );
        self.acquire().await;
        let res = protocol::read_data(
            &mut self.bus,
            base + offset,
            &mut buf[..len],
            geometry.address_width(),
        )
        .await;
        self.lock.release();
        res.map(|()| len)
    }

    // ------------------------------------------------------------------
    // Status registers
    // ------------------------------------------------------------------

    /// Read status register 1
    #[maybe_async]
    pub async fn read_status1(&mut self) -> Result<Status1> {
        self.acquire().await;
        let res = protocol::read_status1(&mut self.bus).await;
        self.lock.release();
        res
    }

    /// Read status register 2
    #[maybe_async]
    pub async fn read_status2(&mut self) -> Result<Status2> {
        self.acquire().await;
        let res = protocol::read_status2(&mut self.bus).await;
        self.lock.release();
        res
    }

    /// Read status register 3
    #[maybe_async]
    pub async fn read_status3(&mut self) -> Result<Status3> {
        self.acquire().await;
        let res = protocol::read_status3(&mut self.bus).await;
        self.lock.release();
        res
    }

    /// Write status register 1
    #[maybe_async]
    pub async fn write_status1(&mut self, value: Status1) -> Result<()> {
        self.acquire().await;
        let res = protocol::write_status_raw(&mut self.bus, opcodes::WRSR, value.bits()).await;
        self.lock.release();
        res
    }

    /// Write status register 2
    #[maybe_async]
    pub async fn write_status2(&mut self, value: Status2) -> Result<()> {
        self.acquire().await;
        let res = protocol::write_status_raw(&mut self.bus, opcodes::WRSR2, value.bits()).await;
        self.lock.release();
        res
    }

    /// Write status register 3
    #[maybe_async]
    pub async fn write_status3(&mut self, value: Status3) -> Result<()> {
        self.acquire().await;
        let res = protocol::write_status_raw(&mut self.bus, opcodes::WRSR3, value.bits()).await;
        self.lock.release();
        res
    }

    // ------------------------------------------------------------------
    // Power management
    // ------------------------------------------------------------------

    /// Enter deep power-down
    #[maybe_async]
    pub async fn power_down(&mut self) -> Result<()> {
        self.acquire().await;
        let res = protocol::power_down(&mut self.bus).await;
        self.lock.release();
        res
    }

    /// Release from deep power-down
    #[maybe_async]
    pub async fn release_power_down(&mut self) -> Result<()> {
        self.acquire().await;
        let res = protocol::release_power_down(&mut self.bus).await;
        self.lock.release();
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_stops_at_page_boundary() {
        assert_eq!(chunk_len(0, 1000), 256);
        assert_eq!(chunk_len(200, 1000), 56);
        assert_eq!(chunk_len(255, 1000), 1);
        assert_eq!(chunk_len(256, 1000), 256);
        assert_eq!(chunk_len(0x1234, 10), 10);
    }

    #[test]
    fn region_clamp() {
        assert_eq!(clamp_to_region(256, 200, 100), 56);
        assert_eq!(clamp_to_region(256, 0, 40), 40);
        assert_eq!(clamp_to_region(4096, 4000, 500), 96);
        assert_eq!(clamp_to_region(65536, 0, 100_000), 65536);
    }
}
