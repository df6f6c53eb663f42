//! Candidate selection: pick at most one detected object for lock-on.
//!
//! Both policies are pure functions of the frame and the target. Neither
//! touches the tracking session; committing a selection is the caller's
//! job.

use nalgebra::Point2;

use crate::detection::{DetectedObject, FrameDetections};
use crate::geometry::{Rect, ScaleFactors, scale_box};

/// Object picked by a selection policy.
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    /// Position of the object in `FrameDetections::objects`.
    pub index: usize,
    pub object: &'a DetectedObject,
    /// Squared distance from the object's box center to the target, in the
    /// space the comparison was made in.
    pub distance_sq: f32,
}

/// Tap-to-select.
///
/// Keeps only objects whose scaled box contains `point`, then takes the one
/// whose scaled center is closest to it. Ties go to the earliest object in
/// detector order. `point` must be in the same display space the boxes are
/// scaled into.
pub fn select_by_point<'a>(
    frame: &'a FrameDetections,
    point: Point2<f32>,
    scale: ScaleFactors,
) -> Option<Selection<'a>> {
    if !frame.is_well_formed() {
        return None;
    }
    nearest(
        frame.objects.iter().enumerate().filter_map(|(index, object)| {
            let scaled = scale_box(&object.bounding_box, scale);
            scaled
                .contains(&point)
                .then(|| (index, object, distance_sq(&scaled, point)))
        }),
    )
}

/// Auto-select the object nearest to the detector-space frame center.
///
/// No containment filter: any object in the frame is eligible.
pub fn select_nearest_center(frame: &FrameDetections) -> Option<Selection<'_>> {
    if !frame.is_well_formed() {
        return None;
    }
    let center = frame.center();
    nearest(frame.objects.iter().enumerate().map(|(index, object)| {
        (index, object, distance_sq(&object.bounding_box.to_rect(), center))
    }))
}

fn distance_sq(rect: &Rect, point: Point2<f32>) -> f32 {
    (rect.center() - point).norm_squared()
}

fn nearest<'a>(
    candidates: impl Iterator<Item = (usize, &'a DetectedObject, f32)>,
) -> Option<Selection<'a>> {
    // `min_by` keeps the first of several equal minima.
    candidates
        .min_by(|a, b| a.2.total_cmp(&b.2))
        .map(|(index, object, distance_sq)| Selection {
            index,
            object,
            distance_sq,
        })
}
