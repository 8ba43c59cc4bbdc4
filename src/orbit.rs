use glam::Vec3;
use winit::event::MouseButton;

use crate::camera::Camera;
use crate::input::Input;

const ELEVATION_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Mouse orbit, pan and zoom for the main passthrough camera.
///
/// Left drag orbits around the target, right drag pans the target in the view
/// plane, the scroll wheel zooms.
///
/// # Example
/// ```
/// use stereograph::{Camera, Input, OrbitControls, Vec3};
///
/// let mut camera = Camera::new().at([0.0, 5.0, 20.0]).looking_at(Vec3::ZERO);
/// let mut orbit = OrbitControls::from_camera(&camera, Vec3::ZERO);
///
/// // In the frame loop:
/// let input = Input::new();
/// if orbit.update(&input) {
///     orbit.apply(&mut camera);
/// }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct OrbitControls {
    /// Point the camera orbits around.
    pub target: Vec3,
    pub distance: f32,
    /// Horizontal angle in radians, zero looking down -Z.
    pub azimuth: f32,
    /// Vertical angle in radians, clamped short of the poles.
    pub elevation: f32,
    /// Radians per pixel of drag.
    pub sensitivity: f32,
    /// Distance per scroll line.
    pub zoom_sensitivity: f32,
    /// Target movement per pixel of drag, scaled by distance.
    pub pan_sensitivity: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 20.0,
            azimuth: 0.0,
            elevation: 0.25,
            sensitivity: 0.005,
            zoom_sensitivity: 1.0,
            pan_sensitivity: 0.001,
            min_distance: 0.5,
            max_distance: 200.0,
        }
    }
}

impl OrbitControls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Controls that leave `camera` where it is, orbiting `target`.
    pub fn from_camera(camera: &Camera, target: impl Into<Vec3>) -> Self {
        let target = target.into();
        let offset = camera.position - target;
        let distance = offset.length();
        let defaults = Self::default();
        if distance <= f32::EPSILON {
            return Self { target, ..defaults };
        }
        Self {
            target,
            distance,
            azimuth: offset.x.atan2(offset.z),
            elevation: (offset.y / distance)
                .clamp(-1.0, 1.0)
                .asin()
                .clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT),
            min_distance: defaults.min_distance.min(distance),
            max_distance: defaults.max_distance.max(distance),
            ..defaults
        }
    }

    pub fn target(mut self, target: impl Into<Vec3>) -> Self {
        self.target = target.into();
        self
    }

    pub fn distance_limits(mut self, min: f32, max: f32) -> Self {
        self.min_distance = min;
        self.max_distance = max;
        self.distance = self.distance.clamp(min, max);
        self
    }

    /// Apply this frame's mouse input. Returns `true` if the view changed.
    pub fn update(&mut self, input: &Input) -> bool {
        let mut changed = false;
        let delta = input.mouse_delta();

        if input.mouse_down(MouseButton::Left) && delta != glam::Vec2::ZERO {
            self.azimuth -= delta.x * self.sensitivity;
            self.elevation = (self.elevation + delta.y * self.sensitivity)
                .clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT);
            changed = true;
        }

        if input.mouse_down(MouseButton::Right) && delta != glam::Vec2::ZERO {
            let camera = self.camera_frame();
            let scale = self.distance * self.pan_sensitivity;
            self.target += (-camera.right() * delta.x + camera.up * delta.y) * scale;
            changed = true;
        }

        let scroll = input.scroll_delta().y;
        if scroll != 0.0 {
            self.distance = (self.distance - scroll * self.zoom_sensitivity)
                .clamp(self.min_distance, self.max_distance);
            changed = true;
        }

        changed
    }

    /// Where the camera sits for the current angles.
    pub fn position(&self) -> Vec3 {
        let (sin_a, cos_a) = self.azimuth.sin_cos();
        let (sin_e, cos_e) = self.elevation.sin_cos();
        self.target + self.distance * Vec3::new(cos_e * sin_a, sin_e, cos_e * cos_a)
    }

    /// Move and aim `camera`, keeping its projection.
    pub fn apply(&self, camera: &mut Camera) {
        let frame = self.camera_frame();
        camera.position = frame.position;
        camera.forward = frame.forward;
        camera.up = Vec3::Y;
    }

    /// Position and orientation with an up vector orthogonal to forward.
    fn camera_frame(&self) -> Camera {
        let position = self.position();
        let forward = (self.target - position).normalize_or(Vec3::NEG_Z);
        let right = forward.cross(Vec3::Y).normalize_or(Vec3::X);
        Camera {
            position,
            forward,
            up: right.cross(forward),
            ..Camera::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use winit::event::ElementState;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    fn drag(button: MouseButton, delta: Vec2) -> Input {
        let mut input = Input::new();
        input.handle_cursor(Vec2::new(400.0, 300.0));
        input.handle_mouse_button(button, ElementState::Pressed);
        input.handle_cursor(Vec2::new(400.0, 300.0) + delta);
        input
    }

    #[test]
    fn from_camera_keeps_the_camera_in_place() {
        let camera = Camera::new().at([0.0, 5.0, 20.0]).looking_at(Vec3::ZERO);
        let orbit = OrbitControls::from_camera(&camera, Vec3::ZERO);

        let mut applied = Camera::new();
        orbit.apply(&mut applied);
        assert!(close(applied.position, camera.position));
        assert!(close(applied.forward, camera.forward));
    }

    #[test]
    fn left_drag_orbits_at_constant_distance() {
        let mut orbit = OrbitControls::new();
        let before = orbit.position();

        assert!(orbit.update(&drag(MouseButton::Left, Vec2::new(100.0, 0.0))));

        let after = orbit.position();
        assert!((orbit.azimuth + 0.5).abs() < 1e-6);
        assert!(((after - orbit.target).length() - 20.0).abs() < 1e-4);
        assert!(!close(before, after));
    }

    #[test]
    fn elevation_stops_short_of_the_pole() {
        let mut orbit = OrbitControls::new();
        orbit.update(&drag(MouseButton::Left, Vec2::new(0.0, 10_000.0)));
        assert!(orbit.elevation < std::f32::consts::FRAC_PI_2);

        let mut camera = Camera::new();
        orbit.apply(&mut camera);
        assert!(camera.forward.is_finite());
        assert!(camera.right().length() > 0.9);
    }

    #[test]
    fn scroll_zooms_within_limits() {
        let mut orbit = OrbitControls::new().distance_limits(2.0, 30.0);
        let mut input = Input::new();
        input.handle_scroll(Vec2::new(0.0, 5.0));
        assert!(orbit.update(&input));
        assert_eq!(orbit.distance, 15.0);

        input.handle_scroll(Vec2::new(0.0, 100.0));
        orbit.update(&input);
        assert_eq!(orbit.distance, 2.0);
    }

    #[test]
    fn right_drag_pans_the_target() {
        let mut orbit = OrbitControls::new();
        orbit.elevation = 0.0;
        assert!(orbit.update(&drag(MouseButton::Right, Vec2::new(50.0, 0.0))));

        // Looking down -Z, dragging right moves the target towards -X.
        assert!(orbit.target.x < 0.0);
        assert!(orbit.target.y.abs() < 1e-6);
        assert!(((orbit.position() - orbit.target).length() - 20.0).abs() < 1e-4);
    }

    #[test]
    fn idle_input_changes_nothing() {
        let mut orbit = OrbitControls::new();
        let before = orbit.clone();
        let mut input = Input::new();
        input.handle_cursor(Vec2::new(10.0, 10.0));
        input.handle_cursor(Vec2::new(50.0, 10.0));

        assert!(!orbit.update(&input));
        assert_eq!(orbit, before);
    }
}
