//! One-shot completion signaling.
//!
//! A kernel completion is a single bit of information, written once per
//! invocation by the interrupt side and read-and-cleared once by the
//! waiter. The hardware's interrupt delivery provides the happens-before
//! edge; the flag itself carries it with acquire/release ordering, no
//! locking.

use std::sync::atomic::{AtomicBool, Ordering};

/// Single-producer/single-consumer completion flag.
#[derive(Debug, Default)]
pub struct CompletionFlag {
    done: AtomicBool,
}

impl CompletionFlag {
    /// Cleared flag.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            done: AtomicBool::new(false),
        }
    }

    /// Producer side: mark the invocation complete.
    pub fn signal(&self) {
        self.done.store(true, Ordering::Release);
    }

    /// Non-destructive poll.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Consumer side: read and clear. Returns whether the flag was set.
    pub fn take(&self) -> bool {
        self.done.swap(false, Ordering::AcqRel)
    }
}
