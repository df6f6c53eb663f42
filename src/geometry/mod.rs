//! Geometry utilities: detector-space boxes, display-space rectangles and
//! the scale mapping between them.

pub mod rect;
pub mod scale;

pub use rect::{BoundingBox, Rect};
pub use scale::{ScaleFactors, Viewport, scale_box, scale_rect};
