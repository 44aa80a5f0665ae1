//! Render loop
//!
//! A scene draws only while it holds a pending frame request. Each served
//! request advances the camera controller, marks the surface for drawing and
//! immediately requests the next frame. Cancelling drops the pending request,
//! after which nothing is drawn for that scene again.

use bevy::prelude::*;

use crate::camera::OrbitController;
use crate::lifecycle::{SceneId, SceneSurface};
use crate::ViewerSet;

/// A frame requested on behalf of a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRequest {
    pub scene: SceneId,
    pub sequence: u64,
}

#[derive(Resource, Debug, Default)]
pub struct FrameLoop {
    running: Option<SceneId>,
    pending: Option<FrameRequest>,
    next_sequence: u64,
    frames: u64,
}

impl FrameLoop {
    /// Start looping for `scene` and request its first frame
    pub fn start(&mut self, scene: SceneId) {
        if let Some(previous) = self.running {
            tracing::warn!(scene = ?previous, "Starting a render loop while another is still running");
        }
        self.running = Some(scene);
        self.frames = 0;
        self.pending = Some(self.next_request(scene));
    }

    /// Request the next frame; refused unless `scene` is the running one
    pub fn request_next(&mut self, scene: SceneId) -> bool {
        if self.running != Some(scene) {
            return false;
        }
        self.pending = Some(self.next_request(scene));
        true
    }

    pub fn take_pending(&mut self) -> Option<FrameRequest> {
        self.pending.take()
    }

    pub fn pending(&self) -> Option<FrameRequest> {
        self.pending
    }

    /// Cancel the pending frame and stop the loop
    pub fn cancel(&mut self) -> Option<SceneId> {
        self.pending = None;
        self.running.take()
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn running_scene(&self) -> Option<SceneId> {
        self.running
    }

    /// Frames drawn for the running scene
    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    fn next_request(&mut self, scene: SceneId) -> FrameRequest {
        self.next_sequence += 1;
        FrameRequest {
            scene,
            sequence: self.next_sequence,
        }
    }
}

pub struct FrameLoopPlugin;

impl Plugin for FrameLoopPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FrameLoop>()
            .add_systems(Update, run_frame_loop.in_set(ViewerSet::Render));
    }
}

/// Serve the pending frame request, if any
pub fn run_frame_loop(
    mut frame_loop: ResMut<FrameLoop>,
    mut surfaces: Query<(&SceneSurface, &mut OrbitController, &mut Transform, &mut Camera)>,
) {
    let Some(request) = frame_loop.take_pending() else {
        return;
    };

    let mut drawn = false;
    for (surface, mut controller, mut transform, mut camera) in &mut surfaces {
        if surface.scene != request.scene {
            continue;
        }
        // Controller update must happen before the frame is drawn
        *transform = controller.update();
        camera.is_active = true;
        drawn = true;
    }

    if !drawn {
        tracing::trace!(scene = ?request.scene, "Frame request without a live surface");
        return;
    }

    frame_loop.frames += 1;
    frame_loop.request_next(request.scene);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_requests_first_frame() {
        let mut frame_loop = FrameLoop::default();
        frame_loop.start(SceneId(1));
        assert!(frame_loop.is_running());
        assert_eq!(frame_loop.pending().map(|r| r.scene), Some(SceneId(1)));
    }

    #[test]
    fn test_cancel_drops_pending_request() {
        let mut frame_loop = FrameLoop::default();
        frame_loop.start(SceneId(1));
        assert_eq!(frame_loop.cancel(), Some(SceneId(1)));
        assert!(frame_loop.pending().is_none());
        assert!(!frame_loop.is_running());
        // A stopped loop never re-arms
        assert!(!frame_loop.request_next(SceneId(1)));
        assert!(frame_loop.take_pending().is_none());
    }

    #[test]
    fn test_stale_scene_cannot_request() {
        let mut frame_loop = FrameLoop::default();
        frame_loop.start(SceneId(1));
        frame_loop.cancel();
        frame_loop.start(SceneId(2));
        frame_loop.take_pending();

        assert!(!frame_loop.request_next(SceneId(1)));
        assert!(frame_loop.pending().is_none());
        assert!(frame_loop.request_next(SceneId(2)));
    }

    #[test]
    fn test_requests_are_sequenced() {
        let mut frame_loop = FrameLoop::default();
        frame_loop.start(SceneId(1));
        let first = frame_loop.take_pending().unwrap();
        frame_loop.request_next(SceneId(1));
        let second = frame_loop.take_pending().unwrap();
        assert!(second.sequence > first.sequence);
    }
}
