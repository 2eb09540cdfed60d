//! Single-operation lock
//!
//! One flash operation runs at a time. The lock is a plain atomic flag;
//! contenders spin with a millisecond sleep so a second caller blocks
//! until the first finishes rather than failing.

use core::sync::atomic::{AtomicBool, Ordering};

pub(crate) struct OpLock {
    held: AtomicBool,
}

impl OpLock {
    pub(crate) const fn new() -> Self {
        Self {
            held: AtomicBool::new(false),
        }
    }

    /// Try to take the lock. Returns whether it was free.
    pub(crate) fn try_acquire(&self) -> bool {
        self.held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    pub(crate) fn release(&self) {
        self.held.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_release_cycle() {
        let lock = OpLock::new();
        assert!(lock.try_acquire());
        assert!(!lock.try_acquire());
        lock.release();
        assert!(lock.try_acquire());
    }
}
