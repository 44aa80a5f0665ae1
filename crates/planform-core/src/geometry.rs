//! Geometry builder - detection boxes to positioned solids
//!
//! The builder is pure: the same result always yields the same solids in the
//! same order. Plan pixels map to world units through a fixed scale, the plan is
//! centred on the world origin and every solid is extruded to the same height.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::result::{FloorPlanResult, RegionClass};

/// Geometry conversion settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// World units per source pixel
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Extrusion height shared by every class
    #[serde(default = "default_wall_height")]
    pub wall_height: f64,
    /// Smallest footprint extent a solid may have
    #[serde(default = "default_min_extent")]
    pub min_extent: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            wall_height: default_wall_height(),
            min_extent: default_min_extent(),
        }
    }
}

impl GeometryConfig {
    /// Reject settings that would produce inverted, flat or sub-unit solids
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |name: &str, value: f64| ConfigError::InvalidGeometry(format!("{name} = {value}"));

        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(invalid("scale", self.scale));
        }
        if !self.wall_height.is_finite() || self.wall_height <= 0.0 {
            return Err(invalid("wall_height", self.wall_height));
        }
        if !self.min_extent.is_finite() || self.min_extent < 1.0 {
            return Err(invalid("min_extent", self.min_extent));
        }
        Ok(())
    }
}

fn default_scale() -> f64 {
    0.15
}

fn default_wall_height() -> f64 {
    30.0
}

fn default_min_extent() -> f64 {
    1.0
}

/// 8-bit sRGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn from_hex(hex: u32) -> Self {
        Self((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    pub fn to_hex(self) -> u32 {
        (u32::from(self.0) << 16) | (u32::from(self.1) << 8) | u32::from(self.2)
    }
}

/// Surface appearance of a solid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Appearance {
    pub color: Rgb,
    pub roughness: f32,
    pub metallic: f32,
    /// 1.0 is fully opaque
    pub opacity: f32,
}

impl Appearance {
    pub const WALL: Appearance = Appearance {
        color: Rgb::from_hex(0xbfc0c0),
        roughness: 0.6,
        metallic: 0.0,
        opacity: 1.0,
    };

    pub const DOOR: Appearance = Appearance {
        color: Rgb::from_hex(0x8b5a2b),
        roughness: 0.5,
        metallic: 0.0,
        opacity: 1.0,
    };

    pub const WINDOW: Appearance = Appearance {
        color: Rgb::from_hex(0x4fc3f7),
        roughness: 1.0,
        metallic: 0.0,
        opacity: 0.55,
    };

    pub fn for_class(class: RegionClass) -> Self {
        match class {
            RegionClass::Wall => Self::WALL,
            RegionClass::Door => Self::DOOR,
            RegionClass::Window => Self::WINDOW,
        }
    }

    pub fn is_translucent(&self) -> bool {
        self.opacity < 1.0
    }
}

/// A positioned, appearance-assigned box derived from one detection
#[derive(Debug, Clone, PartialEq)]
pub struct Solid {
    /// Index of the source detection in the result
    pub index: usize,
    pub class: RegionClass,
    /// Centre of the box in world units (Y up)
    pub position: [f32; 3],
    /// Width (X), height (Y) and depth (Z) in world units
    pub size: [f32; 3],
    pub appearance: Appearance,
    pub casts_shadow: bool,
    pub receives_shadow: bool,
}

impl Solid {
    pub fn width(&self) -> f32 {
        self.size[0]
    }

    pub fn height(&self) -> f32 {
        self.size[1]
    }

    pub fn depth(&self) -> f32 {
        self.size[2]
    }
}

/// Build the solid set for a result. No result yields no solids.
///
/// Detections whose label is absent, nameless or not one of wall/door/window
/// are skipped without error.
pub fn build_solids(result: Option<&FloorPlanResult>, config: &GeometryConfig) -> Vec<Solid> {
    let Some(result) = result else {
        return Vec::new();
    };

    let s = config.scale;
    // Footprints never drop below one world unit, whatever the settings say
    let floor = config.min_extent.max(1.0);
    let y = config.wall_height * 0.5;
    let half_width = result.width * 0.5;
    let half_height = result.height * 0.5;

    let mut solids = Vec::with_capacity(result.points.len());
    for (index, bbox) in result.points.iter().enumerate() {
        let Some(class) = result.class_at(index) else {
            tracing::debug!(index, label = ?result.label_at(index), "Skipping detection without a recognized class");
            continue;
        };

        let (dx, dy) = bbox.extent();
        // f64::max ignores NaN, so malformed extents also land on the floor
        let width = (dx * s).max(floor);
        let depth = (dy * s).max(floor);

        let (cx, cy) = bbox.center();
        let x = finite_or_zero((cx - half_width) * s);
        let z = finite_or_zero((cy - half_height) * s);

        solids.push(Solid {
            index,
            class,
            position: [x as f32, y as f32, z as f32],
            size: [width as f32, config.wall_height as f32, depth as f32],
            appearance: Appearance::for_class(class),
            casts_shadow: true,
            receives_shadow: true,
        });
    }

    solids
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{ClassLabel, DetectionBox};

    const EPS: f32 = 1e-4;

    fn plan(points: Vec<DetectionBox>, classes: Vec<Option<ClassLabel>>) -> FloorPlanResult {
        FloorPlanResult {
            width: 200.0,
            height: 100.0,
            points,
            classes,
            average_door: 1.0,
        }
    }

    fn wall() -> Option<ClassLabel> {
        Some(ClassLabel::named("wall"))
    }

    #[test]
    fn test_single_wall_scenario() {
        let result = plan(vec![DetectionBox::new(0.0, 0.0, 100.0, 20.0)], vec![wall()]);
        let solids = build_solids(Some(&result), &GeometryConfig::default());

        assert_eq!(solids.len(), 1);
        let solid = &solids[0];
        assert_eq!(solid.class, RegionClass::Wall);
        assert!((solid.position[0] - -7.5).abs() < EPS);
        assert!((solid.position[1] - 15.0).abs() < EPS);
        assert!((solid.position[2] - -6.0).abs() < EPS);
        assert!((solid.width() - 15.0).abs() < EPS);
        assert!((solid.height() - 30.0).abs() < EPS);
        assert!((solid.depth() - 3.0).abs() < EPS);
        assert!(solid.casts_shadow && solid.receives_shadow);
    }

    #[test]
    fn test_no_result_yields_no_solids() {
        assert!(build_solids(None, &GeometryConfig::default()).is_empty());
    }

    #[test]
    fn test_absent_label_is_skipped() {
        let result = plan(vec![DetectionBox::new(0.0, 0.0, 10.0, 10.0)], vec![None]);
        assert!(build_solids(Some(&result), &GeometryConfig::default()).is_empty());
    }

    #[test]
    fn test_count_matches_recognized_labels() {
        let result = plan(
            vec![DetectionBox::new(0.0, 0.0, 10.0, 10.0); 6],
            vec![
                wall(),
                Some(ClassLabel::named("door")),
                Some(ClassLabel::named("window")),
                Some(ClassLabel::named("column")),
                Some(ClassLabel::default()),
                None,
            ],
        );
        let solids = build_solids(Some(&result), &GeometryConfig::default());

        assert_eq!(solids.len(), 3);
        assert!(solids.len() <= result.points.len());
        assert_eq!(solids.len(), result.summary().recognized());
        let indices: Vec<usize> = solids.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_degenerate_and_reversed_boxes_floor_to_one() {
        let result = plan(
            vec![
                DetectionBox::new(40.0, 10.0, 40.0, 60.0),
                DetectionBox::new(10.0, 30.0, 90.0, 30.0),
                DetectionBox::new(90.0, 80.0, 10.0, 20.0),
            ],
            vec![wall(), wall(), wall()],
        );
        let solids = build_solids(Some(&result), &GeometryConfig::default());

        assert_eq!(solids[0].width(), 1.0);
        assert!((solids[0].depth() - 7.5).abs() < EPS);
        assert!((solids[1].width() - 12.0).abs() < EPS);
        assert_eq!(solids[1].depth(), 1.0);
        assert_eq!(solids[2].width(), 1.0);
        assert_eq!(solids[2].depth(), 1.0);
    }

    #[test]
    fn test_centering_law() {
        let boxes = [
            DetectionBox::new(12.0, 7.0, 31.0, 90.0),
            DetectionBox::new(150.0, 3.5, 199.0, 44.0),
            DetectionBox::new(0.0, 0.0, 200.0, 100.0),
        ];
        let result = plan(boxes.to_vec(), vec![wall(), wall(), wall()]);
        let solids = build_solids(Some(&result), &GeometryConfig::default());

        for (solid, bbox) in solids.iter().zip(boxes.iter()) {
            let x = ((bbox.x1 + bbox.x2) / 2.0 - 100.0) * 0.15;
            let z = ((bbox.y1 + bbox.y2) / 2.0 - 50.0) * 0.15;
            assert!((solid.position[0] as f64 - x).abs() < 1e-4);
            assert!((solid.position[2] as f64 - z).abs() < 1e-4);
        }
        // A box covering the whole plan sits on the origin
        assert!(solids[2].position[0].abs() < EPS);
        assert!(solids[2].position[2].abs() < EPS);
    }

    #[test]
    fn test_non_finite_coordinates_are_absorbed() {
        let result = plan(vec![DetectionBox::new(f64::NAN, 0.0, 10.0, 10.0)], vec![wall()]);
        let solids = build_solids(Some(&result), &GeometryConfig::default());

        assert_eq!(solids.len(), 1);
        assert_eq!(solids[0].width(), 1.0);
        assert_eq!(solids[0].position[0], 0.0);
    }

    #[test]
    fn test_appearance_by_class() {
        let result = plan(
            vec![DetectionBox::new(0.0, 0.0, 10.0, 10.0); 3],
            vec![
                wall(),
                Some(ClassLabel::named("door")),
                Some(ClassLabel::named("window")),
            ],
        );
        let solids = build_solids(Some(&result), &GeometryConfig::default());

        assert_eq!(solids[0].appearance, Appearance::WALL);
        assert_eq!(solids[1].appearance, Appearance::DOOR);
        assert_eq!(solids[2].appearance, Appearance::WINDOW);
        assert!(!solids[0].appearance.is_translucent());
        assert!(solids[2].appearance.is_translucent());
        assert_eq!(Appearance::WALL.color.to_hex(), 0xbfc0c0);
        // Every class shares the extrusion height
        assert!(solids.iter().all(|s| s.height() == 30.0));
    }

    #[test]
    fn test_validate_rejects_out_of_range_settings() {
        assert!(GeometryConfig::default().validate().is_ok());

        let cases = [
            GeometryConfig { min_extent: 0.5, ..Default::default() },
            GeometryConfig { min_extent: f64::NAN, ..Default::default() },
            GeometryConfig { scale: 0.0, ..Default::default() },
            GeometryConfig { scale: -0.15, ..Default::default() },
            GeometryConfig { wall_height: -30.0, ..Default::default() },
            GeometryConfig { wall_height: f64::INFINITY, ..Default::default() },
        ];
        for config in cases {
            assert!(config.validate().is_err(), "accepted {config:?}");
        }
    }

    #[test]
    fn test_small_min_extent_still_floors_to_one() {
        let result = plan(vec![DetectionBox::new(40.0, 10.0, 40.0, 10.0)], vec![wall()]);
        let config = GeometryConfig {
            min_extent: 0.0,
            ..Default::default()
        };
        let solids = build_solids(Some(&result), &config);

        assert_eq!(solids[0].width(), 1.0);
        assert_eq!(solids[0].depth(), 1.0);
    }

    #[test]
    fn test_build_is_deterministic() {
        let result = plan(
            vec![
                DetectionBox::new(3.0, 4.0, 50.0, 9.0),
                DetectionBox::new(60.0, 10.0, 64.0, 80.0),
            ],
            vec![wall(), Some(ClassLabel::named("window"))],
        );
        let config = GeometryConfig::default();
        assert_eq!(build_solids(Some(&result), &config), build_solids(Some(&result), &config));
    }
}
