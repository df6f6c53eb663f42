//! Detection data model.

use nalgebra::Point2;

use crate::geometry::BoundingBox;

/// Cross-frame identity assigned by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackingId(pub i32);

impl TrackingId {
    pub fn new(id: i32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TrackingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// One physical object seen in the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedObject {
    /// Detector-assigned identity. `None` when the detector could not
    /// associate the box across frames.
    pub identity: Option<TrackingId>,
    /// Box in detector space.
    pub bounding_box: BoundingBox,
    /// Best-effort classification; cosmetic only.
    pub label: Option<String>,
}

impl DetectedObject {
    pub fn new(identity: Option<TrackingId>, bounding_box: BoundingBox) -> Self {
        Self {
            identity,
            bounding_box,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Full detector result for one processed frame.
///
/// `source_width` x `source_height` is the coordinate space the boxes are
/// expressed in. Boxes are expected to lie inside it, but nothing here
/// relies on that.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameDetections {
    pub objects: Vec<DetectedObject>,
    pub source_width: i32,
    pub source_height: i32,
}

impl FrameDetections {
    pub fn new(objects: Vec<DetectedObject>, source_width: i32, source_height: i32) -> Self {
        Self {
            objects,
            source_width,
            source_height,
        }
    }

    /// An empty frame of the given size.
    pub fn empty(source_width: i32, source_height: i32) -> Self {
        Self::new(Vec::new(), source_width, source_height)
    }

    /// False when the source dimensions cannot be used for scaling.
    pub fn is_well_formed(&self) -> bool {
        self.source_width > 0 && self.source_height > 0
    }

    /// Detector-space frame center.
    pub fn center(&self) -> Point2<f32> {
        Point2::new(
            self.source_width as f32 * 0.5,
            self.source_height as f32 * 0.5,
        )
    }

    /// First object whose identity equals `identity`. A missing identity
    /// matches the first object that also has none.
    pub fn find(&self, identity: Option<TrackingId>) -> Option<&DetectedObject> {
        self.objects.iter().find(|obj| obj.identity == identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(id: Option<i32>, l: i32) -> DetectedObject {
        DetectedObject::new(id.map(TrackingId::new), BoundingBox::new(l, 0, l + 10, 10))
    }

    #[test]
    fn test_find_by_identity() {
        let objects = vec![obj(Some(1), 0), obj(Some(42), 50), obj(Some(42), 90)];
        let frame = FrameDetections::new(objects, 100, 100);
        let found = frame.find(Some(TrackingId::new(42))).unwrap();
        assert_eq!(found.bounding_box.left, 50);
        assert!(frame.find(Some(TrackingId::new(7))).is_none());
    }

    #[test]
    fn test_missing_identity_matches_first_unidentified() {
        let objects = vec![obj(Some(1), 0), obj(None, 30), obj(None, 60)];
        let frame = FrameDetections::new(objects, 100, 100);
        assert_eq!(frame.find(None).unwrap().bounding_box.left, 30);

        let identified = FrameDetections::new(vec![obj(Some(1), 0)], 100, 100);
        assert!(identified.find(None).is_none());
    }

    #[test]
    fn test_well_formed_and_center() {
        let frame = FrameDetections::empty(640, 480);
        assert!(frame.is_well_formed());
        assert_eq!(frame.center(), Point2::new(320.0, 240.0));
        assert!(!FrameDetections::empty(0, 480).is_well_formed());
        assert!(!FrameDetections::empty(640, -5).is_well_formed());
    }

    #[test]
    fn test_tracking_id_display() {
        assert_eq!(format!("{}", TrackingId::new(42)), "T42");
    }
}
