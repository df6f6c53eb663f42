//! Single-pole exponential smoothing of a 2D position.
//!
//! No velocity state and no prediction: a frame where the target is missing
//! is simply not fed to the filter.

use nalgebra::Point2;

/// Smoothing weight used when none is configured.
pub const DEFAULT_SMOOTHING_ALPHA: f32 = 0.2;

/// Exponential moving average over 2D points.
///
/// `last' = alpha * sample + (1 - alpha) * last`. The first sample after
/// construction or `reset` passes through unchanged.
#[derive(Debug, Clone)]
pub struct ExponentialSmoother {
    alpha: f32,
    last: Point2<f32>,
    initialized: bool,
}

impl ExponentialSmoother {
    /// `alpha` must lie in `(0, 1]`; 1 disables smoothing.
    pub fn new(alpha: f32) -> Self {
        debug_assert!(alpha > 0.0 && alpha <= 1.0, "alpha out of range: {alpha}");
        Self {
            alpha,
            last: Point2::origin(),
            initialized: false,
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Feed one sample and return the smoothed position.
    pub fn update(&mut self, sample: Point2<f32>) -> Point2<f32> {
        if !self.initialized {
            self.last = sample;
            self.initialized = true;
            return sample;
        }
        let keep = 1.0 - self.alpha;
        self.last = Point2::new(
            self.alpha * sample.x + keep * self.last.x,
            self.alpha * sample.y + keep * self.last.y,
        );
        self.last
    }

    /// Forget history; the next sample passes through unchanged.
    pub fn reset(&mut self) {
        self.initialized = false;
    }
}

impl Default for ExponentialSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_ALPHA)
    }
}
