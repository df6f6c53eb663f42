//! Per-frame detector output as consumed by the tracking core.
//!
//! The detection model itself is external: it delivers boxes with an
//! optional cross-frame tracking ID and an optional label. IDs may be
//! missing and may churn for the same physical object; the tracker
//! tolerates that rather than correcting it.

pub mod source;
pub mod types;

pub use source::DetectionSource;
pub use types::{DetectedObject, FrameDetections, TrackingId};
