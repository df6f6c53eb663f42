//! Detector-space to display-space scaling.
//!
//! Frames are captured in the sensor's landscape orientation and shown in
//! portrait, so the horizontal display axis is scaled against the source
//! *height* and the vertical axis against the source *width*. The swap is a
//! fixed convention of the rotated camera mount.

use crate::geometry::rect::{BoundingBox, Rect};

/// Size of the output (display) surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Independent horizontal and vertical scale factors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactors {
    pub x: f32,
    pub y: f32,
}

impl ScaleFactors {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Scale factors for a frame of `source_width` x `source_height`
    /// displayed rotated by 90 degrees on `viewport`.
    ///
    /// Returns `None` for a malformed frame (non-positive dimensions) or a
    /// viewport that has not been measured yet, so callers never divide
    /// by zero.
    pub fn for_rotated_view(
        viewport: Viewport,
        source_width: i32,
        source_height: i32,
    ) -> Option<Self> {
        if source_width <= 0 || source_height <= 0 || !viewport.is_usable() {
            return None;
        }
        Some(Self {
            x: viewport.width / source_height as f32,
            y: viewport.height / source_width as f32,
        })
    }

    /// Factors that undo this scaling. `None` if either factor is zero.
    pub fn inverse(&self) -> Option<Self> {
        if self.x == 0.0 || self.y == 0.0 {
            return None;
        }
        Some(Self {
            x: 1.0 / self.x,
            y: 1.0 / self.y,
        })
    }
}

/// Map a detector-space box into display space. No clamping, no rounding.
pub fn scale_box(bbox: &BoundingBox, scale: ScaleFactors) -> Rect {
    scale_rect(&bbox.to_rect(), scale)
}

/// Scale each edge of a float rectangle independently.
pub fn scale_rect(rect: &Rect, scale: ScaleFactors) -> Rect {
    Rect::new(
        rect.left * scale.x,
        rect.top * scale.y,
        rect.right * scale.x,
        rect.bottom * scale.y,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_is_linear_per_edge() {
        let b = BoundingBox::new(12, 30, 100, 250);
        let s = ScaleFactors::new(1.5, 0.75);
        let r = scale_box(&b, s);
        assert_eq!(r.left, 12.0 * 1.5);
        assert_eq!(r.top, 30.0 * 0.75);
        assert_eq!(r.right, 100.0 * 1.5);
        assert_eq!(r.bottom, 250.0 * 0.75);
    }

    #[test]
    fn test_rotated_view_swaps_axes() {
        // 640x480 landscape sensor shown on a 1080x1920 portrait surface.
        let s = ScaleFactors::for_rotated_view(Viewport::new(1080.0, 1920.0), 640, 480).unwrap();
        assert_eq!(s.x, 1080.0 / 480.0);
        assert_eq!(s.y, 1920.0 / 640.0);
    }

    #[test]
    fn test_rotated_view_rejects_malformed_dimensions() {
        let vp = Viewport::new(1080.0, 1920.0);
        assert!(ScaleFactors::for_rotated_view(vp, 0, 480).is_none());
        assert!(ScaleFactors::for_rotated_view(vp, 640, -1).is_none());
        assert!(ScaleFactors::for_rotated_view(Viewport::new(0.0, 0.0), 640, 480).is_none());
        assert!(ScaleFactors::for_rotated_view(Viewport::new(f32::NAN, 10.0), 640, 480).is_none());
    }

    #[test]
    fn test_inverse_round_trip() {
        let s = ScaleFactors::new(2.0, 4.0);
        let b = BoundingBox::new(3, 5, 7, 9);
        let there = scale_box(&b, s);
        let back = scale_rect(&there, s.inverse().unwrap());
        assert_eq!(back, b.to_rect());
        assert!(ScaleFactors::new(0.0, 1.0).inverse().is_none());
    }
}
