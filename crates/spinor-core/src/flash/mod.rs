//! Flash device handle and high-level operations

mod device;
mod lock;
mod operations;

pub use device::Flash;
pub(crate) use lock::OpLock;
