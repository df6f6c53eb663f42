//! CSV detection logs.
//!
//! One row per detected object:
//!
//! ```text
//! frame,source_width,source_height,id,left,top,right,bottom,label
//! 0,640,480,42,100,120,220,260,Food
//! 1,640,480,,,,,,
//! ```
//!
//! An empty `id` or `label` means the detector gave none. A row whose box
//! columns are all empty declares a frame with no objects.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;

use crate::detection::{DetectedObject, DetectionSource, FrameDetections, TrackingId};
use crate::geometry::BoundingBox;

#[derive(Debug, Deserialize)]
struct DetectionRow {
    frame: u64,
    source_width: i32,
    source_height: i32,
    id: Option<i32>,
    left: Option<i32>,
    top: Option<i32>,
    right: Option<i32>,
    bottom: Option<i32>,
    label: Option<String>,
}

impl DetectionRow {
    fn bounding_box(&self) -> Result<Option<BoundingBox>> {
        match (self.left, self.top, self.right, self.bottom) {
            (Some(l), Some(t), Some(r), Some(b)) => Ok(Some(BoundingBox::new(l, t, r, b))),
            (None, None, None, None) => Ok(None),
            _ => bail!("frame {}: incomplete bounding box", self.frame),
        }
    }
}

/// Detections of a recording, ordered by frame number.
#[derive(Debug, Default)]
pub struct DetectionLog {
    frames: BTreeMap<u64, FrameDetections>,
}

impl DetectionLog {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        Self::from_reader(file).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .comment(Some(b'#'))
            .trim(Trim::All)
            .from_reader(reader);

        let mut frames: BTreeMap<u64, FrameDetections> = BTreeMap::new();
        for (line, row) in rdr.deserialize::<DetectionRow>().enumerate() {
            let row = row.with_context(|| format!("Bad detection row {}", line + 1))?;
            let bbox = row.bounding_box()?;

            let frame = frames
                .entry(row.frame)
                .or_insert_with(|| FrameDetections::empty(row.source_width, row.source_height));
            if frame.source_width != row.source_width || frame.source_height != row.source_height {
                bail!(
                    "frame {}: source size changes from {}x{} to {}x{}",
                    row.frame,
                    frame.source_width,
                    frame.source_height,
                    row.source_width,
                    row.source_height
                );
            }

            if let Some(bbox) = bbox {
                frame.objects.push(DetectedObject {
                    identity: row.id.map(TrackingId::new),
                    bounding_box: bbox,
                    label: row.label.filter(|l| !l.is_empty()),
                });
            }
        }

        Ok(Self { frames })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Recorded frame numbers in ascending order.
    pub fn frame_numbers(&self) -> impl Iterator<Item = u64> + '_ {
        self.frames.keys().copied()
    }

    pub fn frame(&self, number: u64) -> Option<&FrameDetections> {
        self.frames.get(&number)
    }

    pub fn into_detector(self) -> ReplayDetector {
        ReplayDetector { log: self }
    }
}

/// Detector that answers from a recorded log, keyed by frame number.
#[derive(Debug)]
pub struct ReplayDetector {
    log: DetectionLog,
}

impl ReplayDetector {
    pub fn log(&self) -> &DetectionLog {
        &self.log
    }
}

impl DetectionSource<u64> for ReplayDetector {
    fn detect(&mut self, frame: &u64) -> Result<FrameDetections> {
        self.log
            .frame(*frame)
            .cloned()
            .with_context(|| format!("No detections recorded for frame {}", frame))
    }
}
