//! Message types exchanged with the detector worker thread.

use anyhow::Result;

use crate::detection::FrameDetections;

/// Frame queued for detection, tagged with its submission number.
pub struct FrameMsg<F> {
    pub sequence: u64,
    pub frame: F,
}

/// Detector output for one submitted frame.
pub struct DetectionMsg {
    /// Sequence number of the frame this result belongs to.
    pub sequence: u64,
    /// Detections, or the detector's failure for this frame.
    pub detections: Result<FrameDetections>,
}
