//! Main camera following a physics body.

use glam::Vec3;

use crate::camera::Camera;

/// The parts of a rigid body the render loop talks to.
///
/// Implemented by whatever physics integration drives the player; this crate
/// never simulates anything itself.
pub trait RigidBodyHandle {
    fn apply_impulse(&mut self, impulse: Vec3);

    /// Current world position of the body.
    fn translation(&self) -> Vec3;
}

/// Keeps the main camera on a body, at a fixed offset from it.
pub struct CameraFollow {
    body: Box<dyn RigidBodyHandle>,
    offset: Vec3,
}

impl CameraFollow {
    pub fn new(body: Box<dyn RigidBodyHandle>) -> Self {
        Self {
            body,
            offset: Vec3::ZERO,
        }
    }

    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    pub fn body(&self) -> &dyn RigidBodyHandle {
        self.body.as_ref()
    }

    pub fn body_mut(&mut self) -> &mut dyn RigidBodyHandle {
        self.body.as_mut()
    }

    /// Copy the body's position into `camera`. Orientation is left alone.
    pub fn update(&self, camera: &mut Camera) {
        camera.position = self.body.translation() + self.offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Point(Vec3);

    impl RigidBodyHandle for Point {
        fn apply_impulse(&mut self, impulse: Vec3) {
            self.0 += impulse;
        }

        fn translation(&self) -> Vec3 {
            self.0
        }
    }

    #[test]
    fn camera_tracks_body() {
        let mut follow = CameraFollow::new(Box::new(Point(Vec3::ZERO))).with_offset(Vec3::Y);
        let mut camera = Camera::new();

        follow.body_mut().apply_impulse(Vec3::new(3.0, 0.0, -1.0));
        follow.update(&mut camera);

        assert_eq!(camera.position, Vec3::new(3.0, 1.0, -1.0));
        assert_eq!(camera.forward, Vec3::NEG_Z);
    }
}
