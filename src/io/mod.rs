//! Recorded detector output for offline replay.

pub mod replay;

pub use replay::{DetectionLog, ReplayDetector};
