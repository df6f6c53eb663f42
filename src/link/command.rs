//! Command line encoding.

use nalgebra::Vector2;

use crate::tracking::AlignmentReport;

/// One `(x, y)` pair bound for the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentCommand {
    pub x: f32,
    pub y: f32,
}

impl AlignmentCommand {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn from_deviation(deviation: &Vector2<f32>) -> Self {
        Self::new(deviation.x, deviation.y)
    }

    pub fn from_report(report: &AlignmentReport) -> Self {
        Self::from_deviation(&report.deviation)
    }

    /// Device orientation in degrees: pitch on x, roll on y.
    pub fn from_orientation(pitch_deg: f32, roll_deg: f32) -> Self {
        Self::new(pitch_deg, roll_deg)
    }

    /// `x:<x>,y:<y>\n`, two decimals, `.` as separator regardless of locale.
    pub fn encode(&self) -> String {
        format!("x:{:.2},y:{:.2}\n", self.x, self.y)
    }
}

impl std::fmt::Display for AlignmentCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x:{:.2},y:{:.2}", self.x, self.y)
    }
}
