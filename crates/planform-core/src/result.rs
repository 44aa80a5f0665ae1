//! Floor plan result contract
//!
//! The inference service answers an uploaded plan with a JSON document of the form
//! `{Width, Height, points: [{x1,y1,x2,y2}], classes: [{name}|null], averageDoor}`.
//! `points[i]` and `classes[i]` describe the same detected region.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResultError {
    #[error("Failed to parse floor plan result: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Axis-aligned rectangle in source-image pixel coordinates.
///
/// `x2 >= x1` and `y2 >= y1` are expected but not enforced; reversed or
/// degenerate boxes are absorbed by the geometry builder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl DetectionBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x1 + self.x2) * 0.5, (self.y1 + self.y2) * 0.5)
    }

    pub fn extent(&self) -> (f64, f64) {
        (self.x2 - self.x1, self.y2 - self.y1)
    }
}

/// Label attached to a detection.
///
/// The service emits `{}` for class ids it does not map, so the name itself is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassLabel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ClassLabel {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

/// The detection classes that produce geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionClass {
    Wall,
    Door,
    Window,
}

impl RegionClass {
    pub const ALL: [RegionClass; 3] = [RegionClass::Wall, RegionClass::Door, RegionClass::Window];

    /// Exact, case-sensitive match on the wire name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "wall" => Some(Self::Wall),
            "door" => Some(Self::Door),
            "window" => Some(Self::Window),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wall => "wall",
            Self::Door => "door",
            Self::Window => "window",
        }
    }
}

impl std::fmt::Display for RegionClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full analysis payload consumed by the viewer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloorPlanResult {
    /// Source image width in pixels
    #[serde(rename = "Width")]
    pub width: f64,
    /// Source image height in pixels
    #[serde(rename = "Height")]
    pub height: f64,
    #[serde(default)]
    pub points: Vec<DetectionBox>,
    #[serde(default)]
    pub classes: Vec<Option<ClassLabel>>,
    /// Average door opening length; zero when no doors were detected
    #[serde(rename = "averageDoor", default)]
    pub average_door: f64,
}

impl FloorPlanResult {
    pub fn from_json(content: &str) -> Result<Self, ResultError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ResultError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Raw label name at `index`, if the label exists and carries a name
    pub fn label_at(&self, index: usize) -> Option<&str> {
        self.classes
            .get(index)
            .and_then(|label| label.as_ref())
            .and_then(|label| label.name.as_deref())
    }

    /// Recognized class at `index`; `None` for absent, nameless or unknown labels
    pub fn class_at(&self, index: usize) -> Option<RegionClass> {
        self.label_at(index).and_then(RegionClass::from_name)
    }

    /// Iterate over detections that produce geometry, in source order
    pub fn regions(&self) -> impl Iterator<Item = (usize, &DetectionBox, RegionClass)> + '_ {
        self.points
            .iter()
            .enumerate()
            .filter_map(|(i, bbox)| self.class_at(i).map(|class| (i, bbox, class)))
    }

    pub fn has_doors(&self) -> bool {
        self.average_door != 0.0
    }

    pub fn summary(&self) -> RegionCounts {
        let mut counts = RegionCounts::default();
        for i in 0..self.points.len() {
            match self.class_at(i) {
                Some(RegionClass::Wall) => counts.walls += 1,
                Some(RegionClass::Door) => counts.doors += 1,
                Some(RegionClass::Window) => counts.windows += 1,
                None => counts.skipped += 1,
            }
        }
        counts
    }
}

/// Per-class detection counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionCounts {
    pub walls: usize,
    pub doors: usize,
    pub windows: usize,
    /// Detections without a recognized label
    pub skipped: usize,
}

impl RegionCounts {
    pub fn recognized(&self) -> usize {
        self.walls + self.doors + self.windows
    }
}
