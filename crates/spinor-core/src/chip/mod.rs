//! Chip identity and geometry
//!
//! Types for what the JEDEC identification returns (manufacturer,
//! memory type, capacity code) and the block/sector/page geometry
//! derived from it.

mod geometry;
mod id;

pub use geometry::{
    address_to_block, address_to_page, address_to_sector, block_to_address, block_to_page,
    page_to_address, page_to_block, page_to_sector, sector_to_address, sector_to_block,
    sector_to_page, Geometry, BLOCK_SIZE, PAGE_SIZE, SECTOR_SIZE,
};
pub use id::{Capacity, Manufacturer};
