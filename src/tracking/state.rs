//! Lock-on state machine states.

/// Lifecycle state of a tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    /// No target locked; detections are offered as candidates.
    Idle,
    /// A target is locked; each frame is compared against the anchor.
    Locked,
}

impl Default for TrackingState {
    fn default() -> Self {
        Self::Idle
    }
}
