//! Per-frame driver: throttle, detect, then select or track.
//!
//! The pipeline owns the tracking session and is driven from a single
//! thread, one frame at a time, in arrival order. Detection can run inline
//! (`process`) or on a `DetectorWorker`, in which case results are fed back
//! through `apply`.

use nalgebra::Point2;

use crate::detection::{DetectionSource, FrameDetections, TrackingId};
use crate::geometry::{Rect, ScaleFactors, Viewport, scale_box};
use crate::tracking::selector::{select_by_point, select_nearest_center};
use crate::tracking::{LifecycleEvent, Observation, TrackingSession};

use super::throttle::{DivisorHandle, FrameThrottle};

/// How the next idle frame should pick a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionRequest {
    /// Tap location in display space.
    Point(Point2<f32>),
    /// Object nearest to the frame center.
    NearestCenter,
}

/// Result of a selection request.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    Locked(LifecycleEvent),
    /// Nothing selectable; the session stays idle.
    NoCandidate,
}

/// One detected object as offered for selection while idle.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub identity: Option<TrackingId>,
    /// Scaled box in display space.
    pub rect: Rect,
    pub label: Option<String>,
}

impl Candidate {
    pub fn center(&self) -> Point2<f32> {
        self.rect.center()
    }
}

/// What happened to one incoming frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Gated out by the throttle and released unprocessed.
    Skipped,
    /// The detector failed on this frame.
    DetectorFailed,
    /// Unusable frame dimensions or viewport; nothing changed.
    Malformed,
    /// Session idle: everything offered for selection, plus the outcome of a
    /// pending selection request if there was one.
    Idle {
        candidates: Vec<Candidate>,
        selection: Option<SelectionOutcome>,
    },
    /// Session locked.
    Locked(Observation),
}

/// Frame-level driver around a `TrackingSession`.
#[derive(Debug)]
pub struct Pipeline {
    throttle: FrameThrottle,
    session: TrackingSession,
    viewport: Viewport,
    pending_selection: Option<SelectionRequest>,
}

impl Pipeline {
    pub fn new(session: TrackingSession, viewport: Viewport, divisor: DivisorHandle) -> Self {
        Self {
            throttle: FrameThrottle::with_handle(divisor),
            session,
            viewport,
            pending_selection: None,
        }
    }

    pub fn session(&self) -> &TrackingSession {
        &self.session
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Update the output surface size; used from the next frame on.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn divisor(&self) -> DivisorHandle {
        self.throttle.handle()
    }

    /// Queue a selection for the next processed frame. Ignored while locked;
    /// call `stop` first to pick a new target.
    pub fn request_selection(&mut self, request: SelectionRequest) {
        if self.session.is_locked() {
            tracing::debug!("Ignoring selection request while locked");
            return;
        }
        self.pending_selection = Some(request);
    }

    pub fn stop(&mut self) -> Option<LifecycleEvent> {
        self.pending_selection = None;
        self.session.stop()
    }

    /// Throttle gate. `None` means the frame was skipped and already
    /// released; the caller should not submit it for detection.
    pub fn admit<F>(&mut self, frame: F) -> Option<F> {
        self.throttle.admit(frame)
    }

    /// Run one frame through the throttle, the detector and the tracker.
    pub fn process<F, D>(&mut self, frame: F, detector: &mut D) -> FrameOutcome
    where
        D: DetectionSource<F> + ?Sized,
    {
        let Some(frame) = self.admit(frame) else {
            return FrameOutcome::Skipped;
        };
        let detections = detector.detect(&frame);
        drop(frame);

        match detections {
            Ok(detections) => self.apply(&detections),
            Err(e) => {
                tracing::warn!("Detector failed: {:#}", e);
                FrameOutcome::DetectorFailed
            }
        }
    }

    /// Apply one frame's detections to the session.
    pub fn apply(&mut self, detections: &FrameDetections) -> FrameOutcome {
        let Some(scale) = ScaleFactors::for_rotated_view(
            self.viewport,
            detections.source_width,
            detections.source_height,
        ) else {
            tracing::warn!(
                "Skipping frame: source {}x{}, viewport {}x{}",
                detections.source_width,
                detections.source_height,
                self.viewport.width,
                self.viewport.height
            );
            return FrameOutcome::Malformed;
        };

        if self.session.is_locked() {
            return FrameOutcome::Locked(self.session.observe_scaled(detections, scale));
        }

        let candidates = detections
            .objects
            .iter()
            .map(|obj| Candidate {
                identity: obj.identity,
                rect: scale_box(&obj.bounding_box, scale),
                label: obj.label.clone(),
            })
            .collect();

        let selection = self.pending_selection.take().map(|request| {
            let selected = match request {
                SelectionRequest::Point(point) => select_by_point(detections, point, scale),
                SelectionRequest::NearestCenter => select_nearest_center(detections),
            };
            match selected {
                Some(selection) => {
                    SelectionOutcome::Locked(self.session.lock_object(selection.object))
                }
                None => {
                    tracing::debug!("No candidate for {:?}", request);
                    SelectionOutcome::NoCandidate
                }
            }
        });

        FrameOutcome::Idle {
            candidates,
            selection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, bail};

    use crate::detection::DetectedObject;
    use crate::geometry::BoundingBox;
    use crate::tracking::TrackingState;

    const UNIT_VIEW: Viewport = Viewport {
        width: 480.0,
        height: 640.0,
    };

    fn obj(id: i32, l: i32, t: i32, r: i32, b: i32) -> DetectedObject {
        DetectedObject::new(Some(TrackingId::new(id)), BoundingBox::new(l, t, r, b))
    }

    /// Detector that returns scripted frames keyed by the frame number.
    struct Scripted(Vec<FrameDetections>);

    impl DetectionSource<usize> for Scripted {
        fn detect(&mut self, frame: &usize) -> Result<FrameDetections> {
            match self.0.get(*frame) {
                Some(d) => Ok(d.clone()),
                None => bail!("no frame {}", frame),
            }
        }
    }

    fn pipeline(divisor: u32) -> Pipeline {
        Pipeline::new(TrackingSession::new(), UNIT_VIEW, DivisorHandle::new(divisor))
    }

    #[test]
    fn test_idle_frame_lists_candidates() {
        let mut p = pipeline(1);
        let frame = FrameDetections::new(vec![obj(1, 0, 0, 10, 10).with_label("Plant")], 640, 480);
        match p.apply(&frame) {
            FrameOutcome::Idle {
                candidates,
                selection,
            } => {
                assert_eq!(candidates.len(), 1);
                assert_eq!(candidates[0].rect, Rect::new(0.0, 0.0, 10.0, 10.0));
                assert_eq!(candidates[0].label.as_deref(), Some("Plant"));
                assert!(selection.is_none());
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_tap_locks_then_tracks() {
        let mut p = pipeline(1);
        let objects = vec![obj(1, 0, 0, 10, 10), obj(2, 100, 100, 200, 200)];
        let frame = FrameDetections::new(objects, 640, 480);

        p.request_selection(SelectionRequest::Point(Point2::new(150.0, 150.0)));
        let out = p.apply(&frame);
        assert!(matches!(
            out,
            FrameOutcome::Idle {
                selection: Some(SelectionOutcome::Locked(LifecycleEvent::Locked {
                    identity: Some(TrackingId(2)),
                    ..
                })),
                ..
            }
        ));
        assert_eq!(p.session().state(), TrackingState::Locked);

        match p.apply(&frame) {
            FrameOutcome::Locked(Observation::Tracked(report)) => {
                assert_eq!(report.identity, Some(TrackingId::new(2)));
                assert!(report.aligned);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_tap_miss_stays_idle() {
        let mut p = pipeline(1);
        let frame = FrameDetections::new(vec![obj(1, 0, 0, 10, 10)], 640, 480);
        p.request_selection(SelectionRequest::Point(Point2::new(300.0, 300.0)));
        assert!(matches!(
            p.apply(&frame),
            FrameOutcome::Idle {
                selection: Some(SelectionOutcome::NoCandidate),
                ..
            }
        ));
        assert_eq!(p.session().state(), TrackingState::Idle);

        // One-shot: the request is consumed.
        assert!(matches!(
            p.apply(&frame),
            FrameOutcome::Idle { selection: None, .. }
        ));
    }

    #[test]
    fn test_malformed_frame_keeps_pending_selection() {
        let mut p = pipeline(1);
        p.request_selection(SelectionRequest::NearestCenter);
        assert_eq!(p.apply(&FrameDetections::empty(0, 0)), FrameOutcome::Malformed);

        let frame = FrameDetections::new(vec![obj(5, 300, 200, 340, 280)], 640, 480);
        assert!(matches!(
            p.apply(&frame),
            FrameOutcome::Idle {
                selection: Some(SelectionOutcome::Locked(_)),
                ..
            }
        ));
    }

    #[test]
    fn test_process_applies_throttle_and_detector() {
        let frames: Vec<FrameDetections> = (0..6)
            .map(|i| FrameDetections::new(vec![obj(1, i * 10, 0, i * 10 + 10, 10)], 640, 480))
            .collect();
        let mut detector = Scripted(frames);
        let mut p = pipeline(3);

        let outcomes: Vec<FrameOutcome> =
            (0..6usize).map(|i| p.process(i, &mut detector)).collect();
        let processed: Vec<usize> = outcomes
            .iter()
            .enumerate()
            .filter(|(_, o)| **o != FrameOutcome::Skipped)
            .map(|(i, _)| i)
            .collect();
        // Counter hits 3 and 6 on the third and sixth frames.
        assert_eq!(processed, vec![2, 5]);
    }

    #[test]
    fn test_detector_failure_is_not_fatal() {
        let mut detector = Scripted(vec![]);
        let mut p = pipeline(1);
        assert_eq!(p.process(0, &mut detector), FrameOutcome::DetectorFailed);
        assert_eq!(p.session().state(), TrackingState::Idle);
    }

    #[test]
    fn test_stop_returns_to_idle() {
        let mut p = pipeline(1);
        let frame = FrameDetections::new(vec![obj(1, 300, 200, 340, 280)], 640, 480);
        p.request_selection(SelectionRequest::NearestCenter);
        p.apply(&frame);
        assert!(p.session().is_locked());

        // Selection requests are ignored while locked.
        p.request_selection(SelectionRequest::NearestCenter);
        assert!(matches!(p.stop(), Some(LifecycleEvent::Stopped { .. })));
        assert!(matches!(p.apply(&frame), FrameOutcome::Idle { selection: None, .. }));
    }
}
