use glam::{Mat4, Vec3};

use crate::render_graph::DisplaySize;

/// Projection parameters for a [`Camera`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    /// Perspective projection, `fov` is the vertical field of view in radians.
    Perspective { fov: f32, near: f32, far: f32 },
    /// Orthographic projection whose frustum spans the viewport in pixels,
    /// origin at the top-left corner.
    Orthographic { near: f32, far: f32 },
}

/// A camera for 3D scenes and the 2D overlay.
///
/// Provides position, orientation and projection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    pub projection: Projection,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            up: Vec3::Y,
            projection: Projection::Perspective {
                fov: 75f32.to_radians(),
                near: 0.1,
                far: 1000.0,
            },
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// A perspective camera with the given vertical fov in degrees.
    pub fn perspective(fov_degrees: f32, near: f32, far: f32) -> Self {
        Self {
            projection: Projection::Perspective {
                fov: fov_degrees.to_radians(),
                near,
                far,
            },
            ..Self::default()
        }
    }

    /// An orthographic camera at the origin looking down -Z.
    pub fn orthographic(near: f32, far: f32) -> Self {
        Self {
            projection: Projection::Orthographic { near, far },
            ..Self::default()
        }
    }

    pub fn at(mut self, position: impl Into<Vec3>) -> Self {
        self.position = position.into();
        self
    }

    pub fn looking_at(mut self, target: impl Into<Vec3>) -> Self {
        let forward = (target.into() - self.position).normalize_or_zero();
        if forward != Vec3::ZERO {
            self.forward = forward;
        }
        self
    }

    /// Compute the right vector from forward and up.
    pub fn right(&self) -> Vec3 {
        self.forward.cross(self.up).normalize_or_zero()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward, self.up)
    }

    /// Projection matrix for a viewport of the given size (depth range `[0, 1]`).
    pub fn projection_matrix(&self, viewport: DisplaySize) -> Mat4 {
        match self.projection {
            Projection::Perspective { fov, near, far } => {
                Mat4::perspective_rh(fov, viewport.aspect(), near, far)
            }
            Projection::Orthographic { near, far } => Mat4::orthographic_rh(
                0.0,
                viewport.width as f32,
                viewport.height as f32,
                0.0,
                near,
                far,
            ),
        }
    }

    pub fn view_projection(&self, viewport: DisplaySize) -> Mat4 {
        self.projection_matrix(viewport) * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn orthographic_maps_pixel_corners_to_ndc() {
        let camera = Camera::orthographic(0.0001, 1.0);
        let vp = camera.view_projection(DisplaySize::new(800, 600));

        let top_left = vp * Vec4::new(0.0, 0.0, -0.1, 1.0);
        let bottom_right = vp * Vec4::new(800.0, 600.0, -0.1, 1.0);

        assert!((top_left.x + 1.0).abs() < 1e-5);
        assert!((top_left.y - 1.0).abs() < 1e-5);
        assert!((bottom_right.x - 1.0).abs() < 1e-5);
        assert!((bottom_right.y + 1.0).abs() < 1e-5);
        assert!(top_left.z > 0.0 && top_left.z < 1.0);
    }

    #[test]
    fn looking_at_normalizes_forward() {
        let camera = Camera::new().at([0.0, 5.0, 20.0]).looking_at(Vec3::ZERO);
        assert!((camera.forward.length() - 1.0).abs() < 1e-5);
        assert!(camera.forward.z < 0.0);
        assert!(camera.right().x > 0.0);
    }
}
