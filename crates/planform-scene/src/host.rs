//! Viewer host - the state the embedding application drives
//!
//! The front-end owns these resources: it mounts and unmounts the viewer,
//! publishes the current [`FloorPlanResult`] and chooses where on the window
//! the 3D surface lives. The lifecycle manager reacts to all of it.

use std::sync::Arc;

use bevy::prelude::*;
use planform_core::{FloorPlanResult, GeometryConfig};

/// The result currently shown by the viewer
///
/// Identity matters: replacing the result with a new value (even an equal
/// one) triggers a full rebuild, re-publishing the same `Arc` does not.
#[derive(Resource, Debug, Clone, Default)]
pub struct FloorPlanData(pub Option<Arc<FloorPlanResult>>);

impl FloorPlanData {
    pub fn set(&mut self, result: FloorPlanResult) {
        self.0 = Some(Arc::new(result));
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    pub fn get(&self) -> Option<&FloorPlanResult> {
        self.0.as_deref()
    }

    /// True when both refer to the same published result (or both to none)
    pub fn is_same(&self, other: &Option<Arc<FloorPlanResult>>) -> bool {
        match (&self.0, other) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Options for a mounted viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HostOptions {
    /// Show the control that switches to full-viewport presentation
    pub show_fullscreen_control: bool,
}

/// Mount state of the viewer
///
/// Every mount gets a new generation; the lifecycle manager treats a new
/// generation like new data and rebuilds from scratch.
#[derive(Resource, Debug, Default)]
pub struct ViewerHost {
    mounted: Option<HostOptions>,
    generation: u64,
}

impl ViewerHost {
    pub fn mount(&mut self, options: HostOptions) {
        self.generation += 1;
        self.mounted = Some(options);
        tracing::info!(generation = self.generation, ?options, "Viewer mounted");
    }

    pub fn unmount(&mut self) {
        if self.mounted.take().is_some() {
            tracing::info!(generation = self.generation, "Viewer unmounted");
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn options(&self) -> Option<HostOptions> {
        self.mounted
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Presentation switch requested from the overlay or a front-end route
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationRequest {
    Fullscreen,
    Embedded,
}

/// Geometry settings used when building scenes
#[derive(Resource, Debug, Clone, Default)]
pub struct SceneSettings {
    pub geometry: GeometryConfig,
}
