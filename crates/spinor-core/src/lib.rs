//! spinor-core - Driver core for SPI-attached NOR flash chips
//!
//! This crate translates byte-oriented read/write/erase requests into the
//! flash chip's command protocol: JEDEC identification, page-boundary-aware
//! write splitting, 3- vs 4-byte address framing, and busy-polling with
//! per-operation timeouts. The physical transport (SPI transfers, the
//! chip-select line and delays) is supplied by the host through the
//! [`bus::SpiBus`] trait, so the driver is `no_std` compatible and carries
//! no platform code of its own.
//!
//! # Features
//!
//! - `std` - Enable standard library support (`std::error::Error` impls)
//! - `is_sync` - Compile the async API as blocking/synchronous
//!
//! # Example
//!
//! ```ignore
//! use spinor_core::{bus::SpiBus, Flash};
//!
//! fn bring_up<B: SpiBus>(bus: B) {
//!     let mut flash = Flash::new(bus);
//!     match flash.init() {
//!         Ok(()) => {
//!             let geo = flash.geometry().unwrap();
//!             println!("{} chip, {} blocks", geo.manufacturer, geo.block_count);
//!         }
//!         Err(e) => println!("init failed: {}", e),
//!     }
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
// Allow async fn in traits - we use maybe-async for dual sync/async support
#![allow(async_fn_in_trait)]

#[cfg(feature = "std")]
extern crate std;

pub mod bus;
pub mod chip;
pub mod error;
pub mod flash;
pub mod protocol;
pub mod spi;

pub use error::{Error, Result};
pub use flash::Flash;
