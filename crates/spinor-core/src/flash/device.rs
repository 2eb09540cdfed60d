//! Flash device handle

use log::{debug, info};
use maybe_async::maybe_async;

use crate::bus::SpiBus;
use crate::chip::Geometry;
use crate::error::{Error, Result};
use crate::flash::OpLock;
use crate::protocol;

/// Minimum bus-clock age before the chip is assumed out of power-on reset
const POWER_ON_SETTLE_MS: u64 = 20;

/// A SPI NOR flash chip behind a [`SpiBus`] port.
///
/// Construct with [`Flash::new`], then call [`Flash::init`] to identify
/// the chip before using any data operation. Operations serialize
/// through an internal lock; a second concurrent caller waits for the
/// first to finish.
pub struct Flash<B> {
    pub(crate) bus: B,
    pub(crate) geometry: Option<Geometry>,
    pub(crate) lock: OpLock,
}

impl<B: SpiBus> Flash<B> {
    /// Wrap a bus. The device is unusable until [`Flash::init`] runs.
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            geometry: None,
            lock: OpLock::new(),
        }
    }

    /// The identified chip geometry, if [`Flash::init`] has succeeded.
    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    /// Give the bus back, consuming the handle.
    pub fn release(self) -> B {
        self.bus
    }

    /// Identify the chip and derive its geometry.
    ///
    /// Waits out the power-on settle window on a freshly started bus
    /// clock, clears any latched write-enable, then reads the JEDEC id.
    /// Fails with `AlreadyInitialized` on a second call and with
    /// `UnknownCapacity` when the capacity code is not in the table.
    #[maybe_async]
    pub async fn init(&mut self) -> Result<()> {
        if self.geometry.is_some() {
            return Err(Error::AlreadyInitialized);
        }
        self.acquire().await;
        let res = self.identify().await;
        self.lock.release();
        res
    }

    #[maybe_async]
    async fn identify(&mut self) -> Result<()> {
        while self.bus.now_ms() < POWER_ON_SETTLE_MS {
            self.bus.sleep_ms(1).await;
        }
        protocol::write_disable(&mut self.bus).await?;

        let (mf, mem_type, cap) = protocol::read_jedec_id(&mut self.bus).await?;
        debug!(
            "jedec id: manufacturer {:#04x} type {:#04x} capacity {:#04x}",
            mf, mem_type, cap
        );

        let geometry = Geometry::from_id(mf, mem_type, cap)?;
        info!(
            "{} chip, {} KiB, {} blocks",
            geometry.manufacturer,
            geometry.total_bytes() / 1024,
            geometry.block_count
        );
        self.geometry = Some(geometry);
        Ok(())
    }

    /// Block until the operation lock is free, then hold it.
    #[maybe_async]
    pub(crate) async fn acquire(&mut self) {
        while !self.lock.try_acquire() {
            self.bus.sleep_ms(1).await;
        }
    }

    pub(crate) fn require_init(&self) -> Result<Geometry> {
        self.geometry.ok_or(Error::NotInitialized)
    }
}
