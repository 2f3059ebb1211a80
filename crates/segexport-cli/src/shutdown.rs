//! Cooperative cancellation shared between the Ctrl+C handler and an export.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct ShutdownSignal {
    flag: AtomicBool,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Flag polled by the exporter.
    pub fn flag(&self) -> &AtomicBool {
        &self.flag
    }
}
