//! Producer/consumer seam between frames and the external detector.

use anyhow::Result;

use super::types::FrameDetections;

/// A detection backend.
///
/// Implementations wrap whatever model produces boxes for a frame. `F` is
/// the frame payload type owned by the frame source; the detector only
/// borrows it, and the caller releases the frame as soon as `detect`
/// returns.
pub trait DetectionSource<F> {
    fn detect(&mut self, frame: &F) -> Result<FrameDetections>;
}

impl<F, D> DetectionSource<F> for Box<D>
where
    D: DetectionSource<F> + ?Sized,
{
    fn detect(&mut self, frame: &F) -> Result<FrameDetections> {
        (**self).detect(frame)
    }
}
