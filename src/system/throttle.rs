//! Counter-based frame gate.
//!
//! Every incoming frame bumps a counter; a frame is processed only when the
//! counter is a multiple of the divisor. The divisor lives behind a shared
//! handle and is read on every frame, so a "processing speed" control takes
//! effect on the very next frame.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Shared, live-adjustable throttle divisor. Values below 1 read as 1.
#[derive(Debug, Clone)]
pub struct DivisorHandle(Arc<AtomicU32>);

impl DivisorHandle {
    pub fn new(divisor: u32) -> Self {
        Self(Arc::new(AtomicU32::new(divisor.max(1))))
    }

    pub fn get(&self) -> u32 {
        self.0.load(Ordering::Relaxed).max(1)
    }

    pub fn set(&self, divisor: u32) {
        let divisor = divisor.max(1);
        let previous = self.0.swap(divisor, Ordering::Relaxed);
        if previous != divisor {
            tracing::debug!("Frame divisor changed {} -> {}", previous, divisor);
        }
    }
}

impl Default for DivisorHandle {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Decides which incoming frames reach the detector.
#[derive(Debug, Default)]
pub struct FrameThrottle {
    counter: u64,
    divisor: DivisorHandle,
}

impl FrameThrottle {
    pub fn new(divisor: u32) -> Self {
        Self::with_handle(DivisorHandle::new(divisor))
    }

    pub fn with_handle(divisor: DivisorHandle) -> Self {
        Self { counter: 0, divisor }
    }

    /// Handle for adjusting the divisor from elsewhere (e.g. a UI slider).
    pub fn handle(&self) -> DivisorHandle {
        self.divisor.clone()
    }

    /// Number of frames seen so far.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Count one incoming frame and decide whether it is processed.
    pub fn tick(&mut self) -> bool {
        self.counter = self.counter.wrapping_add(1);
        self.counter % u64::from(self.divisor.get()) == 0
    }

    /// Gate a frame. Skipped frames are dropped (released to their source)
    /// before this returns; nothing is buffered.
    pub fn admit<F>(&mut self, frame: F) -> Option<F> {
        if self.tick() {
            Some(frame)
        } else {
            drop(frame);
            None
        }
    }
}
