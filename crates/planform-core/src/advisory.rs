//! Non-blocking advisories derived from a floor plan result

use crate::result::FloorPlanResult;

/// Advisory shown over the 3D preview
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advisory {
    /// The result reports no door openings
    NoDoorOpenings,
}

impl Advisory {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoDoorOpenings => "No doors detected - model generated without door openings",
        }
    }
}

/// Advisory for the current result, recomputed on every UI pass
pub fn advisory_for(result: Option<&FloorPlanResult>) -> Option<Advisory> {
    match result {
        Some(result) if result.average_door == 0.0 => Some(Advisory::NoDoorOpenings),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{build_solids, GeometryConfig};
    use crate::result::{ClassLabel, DetectionBox};

    fn scenario(average_door: f64) -> FloorPlanResult {
        FloorPlanResult {
            width: 200.0,
            height: 100.0,
            points: vec![DetectionBox::new(0.0, 0.0, 100.0, 20.0)],
            classes: vec![Some(ClassLabel::named("wall"))],
            average_door,
        }
    }

    #[test]
    fn test_no_advisory_with_doors() {
        assert_eq!(advisory_for(Some(&scenario(1.0))), None);
    }

    #[test]
    fn test_advisory_without_doors_leaves_solids_unchanged() {
        let with_doors = scenario(1.0);
        let without_doors = scenario(0.0);

        assert_eq!(advisory_for(Some(&without_doors)), Some(Advisory::NoDoorOpenings));

        let config = GeometryConfig::default();
        assert_eq!(
            build_solids(Some(&with_doors), &config),
            build_solids(Some(&without_doors), &config)
        );
    }

    #[test]
    fn test_no_advisory_without_result() {
        assert_eq!(advisory_for(None), None);
    }
}
