//! Resize responder
//!
//! The render surface tracks the host viewport: either the whole window or a
//! rectangle the front-end reserves for the embedded preview. While a scene is
//! live the responder watches that size and keeps the surface and the camera
//! aspect ratio in step with it.

use bevy::camera::Viewport;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::lifecycle::SceneId;
use crate::ViewerSet;

/// Size used when no window exists yet
const FALLBACK_SIZE: UVec2 = UVec2::new(1280, 720);

/// Where the 3D surface sits on the primary window
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct HostViewport {
    /// Region in logical pixels. `None` covers the whole window.
    pub region: Option<Rect>,
}

impl HostViewport {
    pub fn whole_window() -> Self {
        Self { region: None }
    }

    pub fn embedded(region: Rect) -> Self {
        Self {
            region: Some(region),
        }
    }

    /// The surface rectangle in logical pixels
    pub fn logical_region(&self, window: &Window) -> Rect {
        let full = Rect::new(0.0, 0.0, window.width(), window.height());
        match self.region {
            Some(region) => region.intersect(full),
            None => full,
        }
    }
}

/// Physical placement of the render surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub position: UVec2,
    pub size: UVec2,
    /// The surface covers the whole window
    pub fills_window: bool,
}

impl SurfaceSize {
    pub const FALLBACK: SurfaceSize = SurfaceSize {
        position: UVec2::ZERO,
        size: FALLBACK_SIZE,
        fills_window: true,
    };

    pub fn aspect_ratio(&self) -> f32 {
        self.size.x.max(1) as f32 / self.size.y.max(1) as f32
    }

    pub fn viewport(&self) -> Option<Viewport> {
        if self.fills_window {
            None
        } else {
            Some(Viewport {
                physical_position: self.position,
                physical_size: self.size,
                ..default()
            })
        }
    }
}

/// Measure the host viewport in physical pixels, never zero-sized
pub fn surface_size(window: &Window, host: &HostViewport) -> SurfaceSize {
    let full = UVec2::new(window.physical_width().max(1), window.physical_height().max(1));
    let Some(region) = host.region else {
        return SurfaceSize {
            position: UVec2::ZERO,
            size: full,
            fills_window: true,
        };
    };

    let scale = window.scale_factor();
    let min = (region.min * scale).round().max(Vec2::ZERO).as_uvec2().min(full - UVec2::ONE);
    let max = (region.max * scale).round().max(Vec2::ZERO).as_uvec2().min(full);
    let size = max.saturating_sub(min).max(UVec2::ONE);

    SurfaceSize {
        position: min,
        size,
        fills_window: false,
    }
}

/// Resize subscription of the live scene
#[derive(Debug, Clone, Copy)]
struct Subscription {
    scene: SceneId,
    surface: Entity,
    applied: SurfaceSize,
}

/// Holds at most one subscription, owned by the live scene
#[derive(Resource, Debug, Default)]
pub struct ResizeResponder {
    subscription: Option<Subscription>,
    resizes: u64,
}

impl ResizeResponder {
    pub fn register(&mut self, scene: SceneId, surface: Entity, applied: SurfaceSize) {
        if let Some(previous) = self.subscription {
            tracing::warn!(scene = ?previous.scene, "Replacing a resize subscription that was never released");
        }
        self.subscription = Some(Subscription {
            scene,
            surface,
            applied,
        });
    }

    /// Drop the subscription; returns whether one existed
    pub fn unregister(&mut self) -> bool {
        self.subscription.take().is_some()
    }

    pub fn is_registered(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn subscribed_scene(&self) -> Option<SceneId> {
        self.subscription.map(|s| s.scene)
    }

    /// Number of size changes applied so far
    pub fn resizes(&self) -> u64 {
        self.resizes
    }
}

pub struct ResizePlugin;

impl Plugin for ResizePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HostViewport>()
            .init_resource::<ResizeResponder>()
            .add_systems(Update, respond_to_resize.in_set(ViewerSet::Resize));
    }
}

/// Apply the current host size to the subscribed surface when it changed
pub fn respond_to_resize(
    mut responder: ResMut<ResizeResponder>,
    host: Res<HostViewport>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut surfaces: Query<(&mut Camera, &mut Projection)>,
) {
    let Some(subscription) = responder.subscription else {
        return;
    };
    let Ok(window) = windows.single() else {
        return;
    };

    let size = surface_size(window, &host);
    if size == subscription.applied {
        return;
    }

    let Ok((mut camera, mut projection)) = surfaces.get_mut(subscription.surface) else {
        return;
    };
    apply_surface_size(&mut camera, &mut projection, size);

    tracing::debug!(
        width = size.size.x,
        height = size.size.y,
        fills_window = size.fills_window,
        "Render surface resized"
    );
    responder.subscription = Some(Subscription {
        applied: size,
        ..subscription
    });
    responder.resizes += 1;
}

pub fn apply_surface_size(camera: &mut Camera, projection: &mut Projection, size: SurfaceSize) {
    camera.viewport = size.viewport();
    if let Projection::Perspective(perspective) = projection {
        perspective.aspect_ratio = size.aspect_ratio();
    }
}
