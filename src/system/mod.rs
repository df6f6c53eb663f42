//! Frame-level orchestration around the tracking core.
//!
//! This module contains the frame throttle, the single-threaded `Pipeline`
//! that owns a tracking session, and the `DetectorWorker` that moves
//! detection onto its own thread behind a keep-latest queue.

pub mod messages;
pub mod pipeline;
pub mod throttle;
pub mod worker;

pub use messages::{DetectionMsg, FrameMsg};
pub use pipeline::{Candidate, FrameOutcome, Pipeline, SelectionOutcome, SelectionRequest};
pub use throttle::{DivisorHandle, FrameThrottle};
pub use worker::{DetectorWorker, WorkerConfig};
