//! Tracking session: the lock/unlock lifecycle and per-frame alignment.
//!
//! A session is owned by one driver loop and mutated only through `lock`,
//! `observe` and `stop`. Frames must be observed in arrival order; the
//! smoothing filter silently corrupts if they are not.

use anyhow::{Result, ensure};
use nalgebra::{Point2, Vector2};
use serde::Deserialize;

use crate::detection::{DetectedObject, FrameDetections, TrackingId};
use crate::geometry::{BoundingBox, Rect, ScaleFactors, Viewport, scale_box};
use crate::tracking::TrackingState;
use crate::tracking::result::{AlignmentReport, LifecycleEvent, Observation};
use crate::tracking::smoothing::{DEFAULT_SMOOTHING_ALPHA, ExponentialSmoother};

/// Alignment threshold used when none is configured, in display pixels.
pub const DEFAULT_ALIGNMENT_THRESHOLD: f32 = 40.0;

/// Tunable tracking parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Absolute per-axis deviation below which the target counts as
    /// aligned. Display-space pixels; independent of box size.
    pub alignment_threshold: f32,
    /// Weight of the newest sample in the position filter, in `(0, 1]`.
    pub smoothing_alpha: f32,
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.alignment_threshold.is_finite() && self.alignment_threshold > 0.0,
            "alignment_threshold must be a positive number, got {}",
            self.alignment_threshold
        );
        ensure!(
            self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0,
            "smoothing_alpha must be in (0, 1], got {}",
            self.smoothing_alpha
        );
        Ok(())
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            alignment_threshold: DEFAULT_ALIGNMENT_THRESHOLD,
            smoothing_alpha: DEFAULT_SMOOTHING_ALPHA,
        }
    }
}

/// Box captured at lock time, kept in detector space.
///
/// Rescaled every frame so viewport changes (rotation, resize) during a
/// lock episode are picked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceAnchor {
    pub bounding_box: BoundingBox,
}

impl ReferenceAnchor {
    pub fn scaled(&self, scale: ScaleFactors) -> Rect {
        scale_box(&self.bounding_box, scale)
    }
}

/// Strict per-axis test: a deviation equal to the threshold is not aligned.
pub fn is_aligned(deviation: &Vector2<f32>, threshold: f32) -> bool {
    deviation.x.abs() < threshold && deviation.y.abs() < threshold
}

/// Lock-on state for one target at a time.
#[derive(Debug)]
pub struct TrackingSession {
    config: TrackerConfig,
    state: TrackingState,
    tracked_identity: Option<TrackingId>,
    anchor: Option<ReferenceAnchor>,
    /// Created on lock, dropped on stop. Never carried across lock episodes.
    smoother: Option<ExponentialSmoother>,
    last_deviation: Option<Vector2<f32>>,
    aligned: bool,
    /// Consecutive frames the locked target has been missing.
    lost_frames: usize,
}

impl TrackingSession {
    pub fn new() -> Self {
        Self::from_valid_config(TrackerConfig::default())
    }

    pub fn with_config(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: TrackerConfig) -> Self {
        Self {
            config,
            state: TrackingState::Idle,
            tracked_identity: None,
            anchor: None,
            smoother: None,
            last_deviation: None,
            aligned: false,
            lost_frames: 0,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn state(&self) -> TrackingState {
        self.state
    }

    pub fn is_locked(&self) -> bool {
        self.state == TrackingState::Locked
    }

    pub fn tracked_identity(&self) -> Option<TrackingId> {
        self.tracked_identity
    }

    pub fn anchor(&self) -> Option<&ReferenceAnchor> {
        self.anchor.as_ref()
    }

    /// Deviation from the last frame where the target was found. `None`
    /// while idle and while the target is lost.
    pub fn last_deviation(&self) -> Option<Vector2<f32>> {
        self.last_deviation
    }

    pub fn is_aligned(&self) -> bool {
        self.aligned
    }

    pub fn lost_frames(&self) -> usize {
        self.lost_frames
    }

    /// Lock onto `identity` with `anchor` as the zero point.
    ///
    /// Locking while already locked replaces the previous episode outright:
    /// new anchor, new identity, fresh filter.
    pub fn lock(&mut self, identity: Option<TrackingId>, anchor: BoundingBox) -> LifecycleEvent {
        let replaced = self.is_locked();
        if replaced {
            tracing::info!(
                "Replacing lock on {:?} with {:?}",
                self.tracked_identity,
                identity
            );
        } else {
            tracing::info!("Locked on {:?} at {:?}", identity, anchor);
        }
        if identity.is_none() {
            tracing::warn!("Locked target has no tracking ID; following the first one without");
        }

        self.state = TrackingState::Locked;
        self.tracked_identity = identity;
        self.anchor = Some(ReferenceAnchor {
            bounding_box: anchor,
        });
        self.smoother = Some(ExponentialSmoother::new(self.config.smoothing_alpha));
        self.last_deviation = None;
        self.aligned = false;
        self.lost_frames = 0;

        LifecycleEvent::Locked {
            identity,
            anchor,
            replaced,
        }
    }

    /// Lock onto a detected object, anchoring at its current box.
    pub fn lock_object(&mut self, object: &DetectedObject) -> LifecycleEvent {
        self.lock(object.identity, object.bounding_box)
    }

    /// Return to idle. Safe from any state; `None` if already idle.
    pub fn stop(&mut self) -> Option<LifecycleEvent> {
        if !self.is_locked() {
            return None;
        }
        let identity = self.tracked_identity.take();
        tracing::info!("Stopped tracking {:?}", identity);

        self.state = TrackingState::Idle;
        self.anchor = None;
        self.smoother = None;
        self.last_deviation = None;
        self.aligned = false;
        self.lost_frames = 0;

        Some(LifecycleEvent::Stopped { identity })
    }

    /// Apply one frame, deriving scale factors from the viewport the frame
    /// is shown on.
    pub fn observe(&mut self, frame: &FrameDetections, viewport: Viewport) -> Observation {
        if !self.is_locked() {
            return Observation::NotTracking;
        }
        match ScaleFactors::for_rotated_view(viewport, frame.source_width, frame.source_height) {
            Some(scale) => self.observe_scaled(frame, scale),
            None => {
                tracing::warn!(
                    "Skipping frame: source {}x{}, viewport {}x{}",
                    frame.source_width,
                    frame.source_height,
                    viewport.width,
                    viewport.height
                );
                Observation::Malformed
            }
        }
    }

    /// Apply one frame with explicit scale factors.
    pub fn observe_scaled(&mut self, frame: &FrameDetections, scale: ScaleFactors) -> Observation {
        if !self.is_locked() {
            return Observation::NotTracking;
        }
        if !frame.is_well_formed() {
            return Observation::Malformed;
        }
        let (Some(anchor), Some(smoother)) = (self.anchor.as_ref(), self.smoother.as_mut()) else {
            return Observation::NotTracking;
        };
        let anchor_rect = anchor.scaled(scale);

        let Some(object) = frame.find(self.tracked_identity) else {
            self.lost_frames += 1;
            self.last_deviation = None;
            self.aligned = false;
            if self.lost_frames == 1 {
                tracing::debug!("Target {:?} lost", self.tracked_identity);
            }
            return Observation::Lost {
                anchor: anchor_rect,
                consecutive: self.lost_frames,
            };
        };

        let identity = object.identity;
        if self.lost_frames > 0 {
            tracing::debug!(
                "Target {:?} reacquired after {} frames",
                identity,
                self.lost_frames
            );
            self.lost_frames = 0;
        }

        let tracked = scale_box(&object.bounding_box, scale);
        let smoothed_center: Point2<f32> = smoother.update(tracked.center());
        let deviation = smoothed_center - anchor_rect.center();
        let aligned = is_aligned(&deviation, self.config.alignment_threshold);

        self.last_deviation = Some(deviation);
        self.aligned = aligned;

        tracing::trace!(
            "Target {:?} deviation=({:.1}, {:.1}) aligned={}",
            identity,
            deviation.x,
            deviation.y,
            aligned
        );

        Observation::Tracked(AlignmentReport {
            identity,
            anchor: anchor_rect,
            tracked,
            smoothed: Rect::from_center(smoothed_center, tracked.width(), tracked.height()),
            smoothed_center,
            deviation,
            aligned,
            label: object.label.clone(),
        })
    }
}

impl Default for TrackingSession {
    fn default() -> Self {
        Self::new()
    }
}
