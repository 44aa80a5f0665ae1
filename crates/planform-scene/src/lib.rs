//! Planform Scene - 3D viewer shared by the front-ends
//!
//! Builds an interactive scene from a floor plan result: a lit ground plane,
//! one extruded solid per recognized detection, an orbit camera and a render
//! loop that runs only while the viewer is mounted. Front-ends drive it
//! through [`ViewerHost`], [`FloorPlanData`] and [`HostViewport`].

pub mod camera;
pub mod conversion;
pub mod frame_loop;
pub mod host;
pub mod lifecycle;
pub mod resize;
pub mod ui;

use bevy::prelude::*;

/// Per-frame order of the viewer systems
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewerSet {
    /// Build or tear down the scene
    Lifecycle,
    /// Pointer input to the orbit controller
    Input,
    /// Follow host viewport size changes
    Resize,
    /// Serve the pending frame request
    Render,
}

/// Scene lifecycle, resize and render loop in their per-frame order
///
/// Carries no input or overlay, so it runs without an egui context.
pub struct ViewerCorePlugin;

impl Plugin for ViewerCorePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ViewerHost>()
            .init_resource::<FloorPlanData>()
            .init_resource::<SceneSettings>()
            .add_message::<PresentationRequest>()
            .configure_sets(
                Update,
                (
                    ViewerSet::Lifecycle,
                    ViewerSet::Input,
                    ViewerSet::Resize,
                    ViewerSet::Render,
                )
                    .chain(),
            )
            .add_plugins(lifecycle::LifecyclePlugin)
            .add_plugins(resize::ResizePlugin)
            .add_plugins(frame_loop::FrameLoopPlugin);
    }
}

/// Plugin that sets up the viewer host and everything it drives
pub struct ViewerHostPlugin;

impl Plugin for ViewerHostPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(ViewerCorePlugin)
            .add_plugins(camera::CameraPlugin)
            .add_plugins(ui::OverlayPlugin);
    }
}

// Re-export commonly used types
pub use conversion::{
    process_inference_results, ConversionFailed, ConversionPlugin, ConversionRequest, ConversionState,
    PendingInference,
};
pub use host::{FloorPlanData, HostOptions, PresentationRequest, SceneSettings, ViewerHost};
pub use lifecycle::{SceneId, SceneLifecycle};
pub use resize::HostViewport;
pub use ui::{exit_fullscreen_button, ViewerOverlaySet};
