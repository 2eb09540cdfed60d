//! Transport abstraction for the SPI bus
//!
//! The driver never touches hardware directly. Everything it needs from
//! the platform - clocking bytes, the chip-select line, delays and a
//! millisecond clock - comes through the [`SpiBus`] trait.
//!
//! The trait uses `maybe_async` to support both sync and async modes:
//! - With the `is_sync` feature: blocking/synchronous
//! - Without it: async (for Embassy, tokio, or poll-driven transports)

use crate::error::Result;
use maybe_async::maybe_async;

/// SPI bus port supplied by the host platform
///
/// All transfers are synchronous from the driver's point of view: a call
/// either completes the exchange, or returns `Error::Transport` once the
/// given timeout elapses at the hardware level. Chip-select bracketing is
/// done by the driver; implementations only drive the line.
#[maybe_async(AFIT)]
pub trait SpiBus {
    /// Drive the chip-select line; `true` selects the chip.
    ///
    /// Electrical settling after the edge is the implementation's problem.
    fn chip_select(&mut self, select: bool);

    /// Full-duplex exchange. `tx` and `rx` must be the same length.
    async fn transfer(&mut self, tx: &[u8], rx: &mut [u8], timeout_ms: u32) -> Result<()>;

    /// Transmit-only transfer (received bytes are discarded).
    async fn transmit(&mut self, tx: &[u8], timeout_ms: u32) -> Result<()>;

    /// Receive-only transfer (dummy bytes are clocked out).
    async fn receive(&mut self, rx: &mut [u8], timeout_ms: u32) -> Result<()>;

    /// Cooperative delay, usable while lock-spinning or status-polling.
    async fn sleep_ms(&mut self, ms: u32);

    /// Monotonic millisecond clock, counted from an arbitrary epoch
    /// (typically boot). Used for timeout accounting only.
    fn now_ms(&self) -> u64;
}
