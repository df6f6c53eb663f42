//! Per-frame tracking outputs and lifecycle events.
//!
//! These describe what happened when one frame of detections was applied
//! to a session:
//! - nothing (not tracking / unusable frame)
//! - target found, with deviation from the anchor and alignment class
//! - target lost while still locked

use nalgebra::{Point2, Vector2};

use crate::detection::TrackingId;
use crate::geometry::{BoundingBox, Rect};

/// Deviation and geometry for a frame where the locked target was found.
///
/// All rectangles and vectors are in display space.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentReport {
    /// `None` when the locked target carries no tracking ID.
    pub identity: Option<TrackingId>,
    /// Anchor box, rescaled with this frame's factors.
    pub anchor: Rect,
    /// Tracked object's box as detected in this frame.
    pub tracked: Rect,
    /// Tracked box re-centered on the smoothed center.
    pub smoothed: Rect,
    pub smoothed_center: Point2<f32>,
    /// `smoothed_center - anchor.center()`.
    pub deviation: Vector2<f32>,
    pub aligned: bool,
    pub label: Option<String>,
}

/// Outcome of applying one frame to a session.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// Session is idle; the frame was ignored.
    NotTracking,
    /// Frame dimensions (or viewport) unusable; session left untouched.
    Malformed,
    /// Target found.
    Tracked(AlignmentReport),
    /// Target not in this frame. The session stays locked and resumes if
    /// the same identity shows up again. No deviation is available.
    Lost {
        anchor: Rect,
        /// Consecutive frames without the target, including this one.
        consecutive: usize,
    },
}

impl Observation {
    pub fn is_lost(&self) -> bool {
        matches!(self, Observation::Lost { .. })
    }

    pub fn report(&self) -> Option<&AlignmentReport> {
        match self {
            Observation::Tracked(report) => Some(report),
            _ => None,
        }
    }
}

/// Lock/unlock transitions, for driving UI state.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    Locked {
        identity: Option<TrackingId>,
        anchor: BoundingBox,
        /// True when this lock replaced an existing one.
        replaced: bool,
    },
    Stopped {
        identity: Option<TrackingId>,
    },
}
