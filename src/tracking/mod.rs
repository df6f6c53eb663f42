//! Lock-on tracking: selects a target, follows it across frames and reports
//! how far it has drifted from where it was when the lock was taken.
//!
//! - Candidate selection (tap point or frame center)
//! - Exponential smoothing of the tracked center
//! - Idle/Locked session with target loss and reacquisition
//! - Deviation and alignment classification against the anchor

pub mod result;
pub mod selector;
pub mod session;
pub mod smoothing;
pub mod state;

pub use result::{AlignmentReport, LifecycleEvent, Observation};
pub use selector::{Selection, select_by_point, select_nearest_center};
pub use session::{ReferenceAnchor, TrackerConfig, TrackingSession, is_aligned};
pub use smoothing::ExponentialSmoother;
pub use state::TrackingState;
