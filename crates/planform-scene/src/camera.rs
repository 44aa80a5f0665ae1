//! Camera rig and orbit navigation
//!
//! The controller keeps the camera on a sphere around a target point. Pointer
//! input accumulates into pending deltas which are bled off a fraction at a
//! time on every frame, so motion carries on briefly after the pointer is
//! released.

use std::f32::consts::PI;

use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::resize::HostViewport;
use crate::ViewerSet;

/// Vertical field of view
pub const FOV_DEGREES: f32 = 45.0;
pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 1000.0;
/// Where every new scene places the camera
pub const INITIAL_POSITION: Vec3 = Vec3::new(0.0, 60.0, 160.0);
pub const INITIAL_TARGET: Vec3 = Vec3::ZERO;

/// Fraction of the pending motion applied per frame
pub const DAMPING_FACTOR: f32 = 0.06;
pub const MIN_DISTANCE: f32 = 40.0;
pub const MAX_DISTANCE: f32 = 400.0;

/// Keeps the polar angle off the poles
const POLE_EPSILON: f32 = 1e-6;
/// Scale applied per wheel notch
const ZOOM_STEP: f32 = 0.95;

/// Orbit controller state, attached to the render surface
#[derive(Component, Debug, Clone)]
pub struct OrbitController {
    pub target: Vec3,
    pub radius: f32,
    /// Azimuth around +Y, zero looking down -Z
    pub theta: f32,
    /// Polar angle from +Y
    pub phi: f32,
    pub damping: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub rotate_speed: f32,
    pub pan_speed: f32,
    pending_theta: f32,
    pending_phi: f32,
    pending_pan: Vec3,
    pending_scale: f32,
}

impl OrbitController {
    /// Controller looking from `position` at `target`
    pub fn new(position: Vec3, target: Vec3) -> Self {
        let offset = position - target;
        let radius = offset.length();
        let (theta, phi) = if radius > 0.0 {
            (
                offset.x.atan2(offset.z),
                (offset.y / radius).clamp(-1.0, 1.0).acos(),
            )
        } else {
            (0.0, PI / 2.0)
        };

        Self {
            target,
            radius: radius.clamp(MIN_DISTANCE, MAX_DISTANCE),
            theta,
            phi,
            damping: DAMPING_FACTOR,
            min_distance: MIN_DISTANCE,
            max_distance: MAX_DISTANCE,
            rotate_speed: 1.0,
            pan_speed: 1.0,
            pending_theta: 0.0,
            pending_phi: 0.0,
            pending_pan: Vec3::ZERO,
            pending_scale: 1.0,
        }
    }

    /// Queue a rotation in radians. Positive `azimuth` swings the camera left.
    pub fn rotate(&mut self, azimuth: f32, polar: f32) {
        self.pending_theta -= azimuth * self.rotate_speed;
        self.pending_phi -= polar * self.rotate_speed;
    }

    /// Queue a rotation from a pointer drag measured in pixels
    pub fn rotate_by_pixels(&mut self, delta: Vec2, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        self.rotate(2.0 * PI * delta.x / height, 2.0 * PI * delta.y / height);
    }

    /// Queue a pan of the target from a pointer drag measured in pixels
    pub fn pan_by_pixels(&mut self, delta: Vec2, viewport_height: f32) {
        // Move the target by the distance the drag covers at target depth
        let visible = 2.0 * self.radius * (FOV_DEGREES.to_radians() * 0.5).tan();
        let per_pixel = visible / viewport_height.max(1.0) * self.pan_speed;

        let rotation = self.rotation();
        let right = rotation * Vec3::X;
        let up = rotation * Vec3::Y;
        self.pending_pan += (-right * delta.x + up * delta.y) * per_pixel;
    }

    /// Queue a zoom. Factors above one move the camera away from the target.
    pub fn dolly(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.pending_scale *= factor;
        }
    }

    /// One wheel notch; positive is towards the target
    pub fn zoom_notch(&mut self, direction: f32) {
        if direction > 0.0 {
            self.dolly(ZOOM_STEP);
        } else if direction < 0.0 {
            self.dolly(1.0 / ZOOM_STEP);
        }
    }

    /// True while queued motion has not yet settled
    pub fn is_moving(&self) -> bool {
        self.pending_theta.abs() > 1e-5
            || self.pending_phi.abs() > 1e-5
            || self.pending_pan.length_squared() > 1e-10
            || (self.pending_scale - 1.0).abs() > f32::EPSILON
    }

    /// Advance one frame and return the camera transform
    pub fn update(&mut self) -> Transform {
        self.theta += self.pending_theta * self.damping;
        self.phi = (self.phi + self.pending_phi * self.damping).clamp(POLE_EPSILON, PI - POLE_EPSILON);
        self.radius = (self.radius * self.pending_scale).clamp(self.min_distance, self.max_distance);
        self.target += self.pending_pan * self.damping;

        let decay = 1.0 - self.damping;
        self.pending_theta *= decay;
        self.pending_phi *= decay;
        self.pending_pan *= decay;
        self.pending_scale = 1.0;

        self.transform()
    }

    pub fn position(&self) -> Vec3 {
        let sin_phi = self.phi.sin();
        self.target
            + Vec3::new(
                self.radius * sin_phi * self.theta.sin(),
                self.radius * self.phi.cos(),
                self.radius * sin_phi * self.theta.cos(),
            )
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position()).looking_at(self.target, Vec3::Y)
    }

    fn rotation(&self) -> Quat {
        self.transform().rotation
    }
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new(INITIAL_POSITION, INITIAL_TARGET)
    }
}

/// Pointer listeners attached to a render surface
///
/// Removing this component (together with the controller) is how the
/// controller is disposed: input is no longer routed to the surface.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct OrbitInputBinding;

/// Routes pointer input to bound orbit controllers
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, apply_orbit_input.in_set(ViewerSet::Input));
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_orbit_input(
    mut controllers: Query<&mut OrbitController, With<OrbitInputBinding>>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    touch_input: Res<Touches>,
    windows: Query<&Window, With<PrimaryWindow>>,
    host_viewport: Res<HostViewport>,
    mut contexts: bevy_egui::EguiContexts,
) {
    let motion: Vec2 = mouse_motion.read().map(|m| m.delta).sum();
    let scroll: f32 = mouse_wheel.read().map(|w| w.y).sum();

    if controllers.is_empty() {
        return;
    }

    // A widget being pressed or dragged takes precedence over the scene.
    // Panels never overlap the host region, so hovering them is covered by
    // the region test below.
    let egui_busy = contexts
        .ctx_mut()
        .map(|ctx| ctx.is_using_pointer())
        .unwrap_or(false);
    if egui_busy {
        return;
    }

    let Ok(window) = windows.single() else {
        return;
    };
    let region = host_viewport.logical_region(window);
    let over_surface = window
        .cursor_position()
        .is_some_and(|cursor| region.contains(cursor));
    let height = region.height();

    for mut controller in &mut controllers {
        if over_surface {
            if mouse_button.pressed(MouseButton::Left) && motion != Vec2::ZERO {
                controller.rotate_by_pixels(motion, height);
            }
            if (mouse_button.pressed(MouseButton::Right) || mouse_button.pressed(MouseButton::Middle))
                && motion != Vec2::ZERO
            {
                controller.pan_by_pixels(motion, height);
            }
            if scroll != 0.0 {
                controller.zoom_notch(scroll);
            }
        }

        let touches: Vec<_> = touch_input
            .iter()
            .map(|touch| (touch.position(), touch.delta()))
            .collect();
        match touch_gesture(&touches, region) {
            Some(TouchGesture::Orbit(delta)) => controller.rotate_by_pixels(delta, height),
            Some(TouchGesture::Pinch(factor)) => controller.dolly(factor),
            None => {}
        }
    }
}

/// Motion requested by the active touches
#[derive(Debug, Clone, Copy, PartialEq)]
enum TouchGesture {
    Orbit(Vec2),
    Pinch(f32),
}

/// One finger orbits, two fingers pinch. Every finger must be inside the
/// host region; `touches` holds (position, delta) per finger.
fn touch_gesture(touches: &[(Vec2, Vec2)], region: Rect) -> Option<TouchGesture> {
    if touches.iter().any(|(position, _)| !region.contains(*position)) {
        return None;
    }
    match touches {
        [(_, delta)] if *delta != Vec2::ZERO => Some(TouchGesture::Orbit(*delta)),
        [(p1, d1), (p2, d2)] => {
            let curr_dist = p1.distance(*p2);
            let prev_dist = (*p1 - *d1).distance(*p2 - *d2);
            (curr_dist > 1.0 && prev_dist > 1.0).then(|| TouchGesture::Pinch(prev_dist / curr_dist))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    #[test]
    fn test_initial_pose() {
        let mut controller = OrbitController::default();
        let transform = controller.update();

        assert!(transform.translation.distance(INITIAL_POSITION) < EPS);
        // Looking at the origin
        let forward = transform.forward();
        let to_target = (INITIAL_TARGET - INITIAL_POSITION).normalize();
        assert!(forward.dot(to_target) > 0.999);
        assert!(!controller.is_moving());
    }

    #[test]
    fn test_rotation_is_damped() {
        let mut controller = OrbitController::default();
        let start = controller.theta;
        controller.rotate(-1.0, 0.0);

        controller.update();
        assert!((controller.theta - start - DAMPING_FACTOR).abs() < 1e-5);
        assert!(controller.is_moving());

        // Inertia: motion continues with no further input and converges
        let after_first = controller.theta;
        controller.update();
        assert!(controller.theta > after_first);
        for _ in 0..1000 {
            controller.update();
        }
        assert!((controller.theta - start - 1.0).abs() < 1e-3);
        assert!(!controller.is_moving());
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut controller = OrbitController::default();
        controller.dolly(100.0);
        controller.update();
        assert_eq!(controller.radius, MAX_DISTANCE);

        controller.dolly(0.0001);
        controller.update();
        assert_eq!(controller.radius, MIN_DISTANCE);

        // Invalid factors are ignored
        controller.dolly(f32::NAN);
        controller.dolly(-2.0);
        controller.update();
        assert_eq!(controller.radius, MIN_DISTANCE);
    }

    #[test]
    fn test_zoom_notch_direction() {
        let mut controller = OrbitController::default();
        let start = controller.radius;
        controller.zoom_notch(1.0);
        controller.update();
        assert!(controller.radius < start);

        controller.zoom_notch(-1.0);
        controller.zoom_notch(-1.0);
        controller.update();
        assert!(controller.radius > start);
    }

    #[test]
    fn test_polar_angle_stays_off_poles() {
        let mut controller = OrbitController::default();
        controller.rotate(0.0, 1000.0);
        for _ in 0..200 {
            controller.update();
        }
        assert!(controller.phi > 0.0);
        assert!(controller.position().is_finite());
    }

    #[test]
    fn test_touch_gestures_inside_region() {
        let region = Rect::new(0.0, 0.0, 400.0, 300.0);

        let orbit = touch_gesture(&[(Vec2::new(50.0, 50.0), Vec2::new(4.0, 0.0))], region);
        assert_eq!(orbit, Some(TouchGesture::Orbit(Vec2::new(4.0, 0.0))));
        assert_eq!(touch_gesture(&[(Vec2::new(50.0, 50.0), Vec2::ZERO)], region), None);

        // Fingers moving apart from 100px to 200px zoom in
        let spread = [
            (Vec2::new(100.0, 100.0), Vec2::new(-50.0, 0.0)),
            (Vec2::new(300.0, 100.0), Vec2::new(50.0, 0.0)),
        ];
        assert_eq!(touch_gesture(&spread, region), Some(TouchGesture::Pinch(0.5)));
    }

    #[test]
    fn test_pinch_outside_region_is_ignored() {
        let region = Rect::new(320.0, 0.0, 1280.0, 420.0);

        // Both fingers over the side panel
        let on_panel = [
            (Vec2::new(50.0, 100.0), Vec2::new(-20.0, 0.0)),
            (Vec2::new(250.0, 100.0), Vec2::new(20.0, 0.0)),
        ];
        assert_eq!(touch_gesture(&on_panel, region), None);

        // One finger in, one finger out
        let straddling = [
            (Vec2::new(250.0, 100.0), Vec2::new(-20.0, 0.0)),
            (Vec2::new(600.0, 100.0), Vec2::new(20.0, 0.0)),
        ];
        assert_eq!(touch_gesture(&straddling, region), None);

        // Single-finger orbit keeps the same rule
        assert_eq!(touch_gesture(&[(Vec2::new(50.0, 50.0), Vec2::ONE)], region), None);
    }

    #[test]
    fn test_pan_moves_target() {
        let mut controller = OrbitController::default();
        controller.pan_by_pixels(Vec2::new(100.0, 0.0), 600.0);
        for _ in 0..500 {
            controller.update();
        }
        // Dragging right moves the target towards -X for a camera on +Z
        assert!(controller.target.x < -1.0);
        assert!(controller.target.y.abs() < EPS);
    }
}
