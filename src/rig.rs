//! Stereo camera rig: two perspective cameras parented to a shared transform.
//!
//! The rig is a plain transform node. Once both cameras exist they are attached
//! as children, offset by half the baseline to either side along the rig's
//! local X axis. From then on every rig movement moves both eyes rigidly, so
//! the separation between them never changes.
//!
//! ```text
//!        rig origin
//!   L ------ o ------ R        local X
//!  -B/2             +B/2
//! ```

use glam::{Quat, Vec3};

use crate::camera::Camera;
use crate::error::{StereoError, StereoResult};

/// Which eye of the stereo pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    /// Both eyes in render order.
    pub const BOTH: [Eye; 2] = [Eye::Left, Eye::Right];

    /// -1 for the left eye, +1 for the right eye.
    pub fn sign(self) -> f32 {
        match self {
            Eye::Left => -1.0,
            Eye::Right => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Eye::Left => "left",
            Eye::Right => "right",
        }
    }
}

/// A value per eye.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct EyePair<T> {
    pub left: T,
    pub right: T,
}

impl<T> EyePair<T> {
    pub fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    /// Build a pair by calling `f` once per eye, left first.
    pub fn from_fn(mut f: impl FnMut(Eye) -> T) -> Self {
        let left = f(Eye::Left);
        let right = f(Eye::Right);
        Self { left, right }
    }

    pub fn get(&self, eye: Eye) -> &T {
        match eye {
            Eye::Left => &self.left,
            Eye::Right => &self.right,
        }
    }

    pub fn get_mut(&mut self, eye: Eye) -> &mut T {
        match eye {
            Eye::Left => &mut self.left,
            Eye::Right => &mut self.right,
        }
    }

    pub fn as_ref(&self) -> EyePair<&T> {
        EyePair {
            left: &self.left,
            right: &self.right,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> EyePair<U> {
        EyePair {
            left: f(self.left),
            right: f(self.right),
        }
    }
}

/// The two cameras handed to the rig once the scene has created them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPair {
    pub left: Camera,
    pub right: Camera,
}

/// Result of a successful [`StereoCameraRig::attach`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachOutcome {
    /// The cameras were parented and the initial placement applied.
    Attached,
    /// The rig was already attached; nothing changed.
    AlreadyAttached,
}

/// A camera parented to the rig, with its offset in rig-local space.
#[derive(Clone, Copy, Debug)]
struct RigEye {
    camera: Camera,
    local_offset: Vec3,
}

/// Parent transform carrying the left and right eye cameras.
#[derive(Clone, Debug)]
pub struct StereoCameraRig {
    position: Vec3,
    rotation: Quat,
    baseline: f32,
    initial_offset: Vec3,
    eyes: Option<EyePair<RigEye>>,
}

impl StereoCameraRig {
    /// Create an unattached rig at the origin.
    ///
    /// `initial_offset` is the one-time translation (in rig-local space)
    /// applied when the cameras get attached.
    pub fn new(baseline: f32, initial_offset: Vec3) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            baseline,
            initial_offset,
            eyes: None,
        }
    }

    pub fn baseline(&self) -> f32 {
        self.baseline
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Orient the rig. Eyes follow, keeping their local offsets.
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize();
    }

    pub fn is_attached(&self) -> bool {
        self.eyes.is_some()
    }

    /// Parent both cameras to the rig and apply the initial placement.
    ///
    /// Returns [`StereoError::NotReady`] without touching the rig if either
    /// camera is missing. Once attached, further calls are no-ops.
    pub fn attach(
        &mut self,
        left: Option<Camera>,
        right: Option<Camera>,
    ) -> StereoResult<AttachOutcome> {
        if self.eyes.is_some() {
            return Ok(AttachOutcome::AlreadyAttached);
        }
        let (Some(left), Some(right)) = (left, right) else {
            return Err(StereoError::NotReady);
        };

        let half = self.baseline * 0.5;
        let eyes = EyePair::new(left, right);
        self.eyes = Some(EyePair::from_fn(|eye| RigEye {
            camera: *eyes.get(eye),
            local_offset: Vec3::new(eye.sign() * half, 0.0, 0.0),
        }));

        self.translate_local(self.initial_offset);

        log::info!(
            "stereo rig attached (baseline {}, rig at {:?})",
            self.baseline,
            self.position
        );
        Ok(AttachOutcome::Attached)
    }

    /// Translate the rig along its local X and Z axes.
    ///
    /// Legal before attach; the rig moves but there are no eyes to carry yet.
    pub fn move_local(&mut self, dx: f32, dz: f32) {
        self.translate_local(Vec3::new(dx, 0.0, dz));
    }

    /// Translate the rig by a vector expressed in its local frame.
    pub fn translate_local(&mut self, delta: Vec3) {
        self.position += self.rotation * delta;
    }

    /// The eye offset relative to the rig origin, if attached.
    pub fn local_offset(&self, eye: Eye) -> Option<Vec3> {
        self.eyes.as_ref().map(|eyes| eyes.get(eye).local_offset)
    }

    /// World-space camera for an eye, if attached.
    ///
    /// The eye faces the rig's forward direction (-Z in rig space) and keeps
    /// the projection of the camera it was attached with.
    pub fn eye_camera(&self, eye: Eye) -> Option<Camera> {
        let rig_eye = self.eyes.as_ref()?.get(eye);
        Some(Camera {
            position: self.position + self.rotation * rig_eye.local_offset,
            forward: self.rotation * Vec3::NEG_Z,
            up: self.rotation * Vec3::Y,
            projection: rig_eye.camera.projection,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> (Option<Camera>, Option<Camera>) {
        (Some(Camera::new()), Some(Camera::new()))
    }

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-4, "{a:?} != {b:?}");
    }

    #[test]
    fn attach_places_eyes_at_half_baseline() {
        let mut rig = StereoCameraRig::new(10.0, Vec3::ZERO);
        let (left, right) = pair();
        assert_eq!(rig.attach(left, right).unwrap(), AttachOutcome::Attached);

        assert_close(rig.eye_camera(Eye::Left).unwrap().position, Vec3::new(-5.0, 0.0, 0.0));
        assert_close(rig.eye_camera(Eye::Right).unwrap().position, Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn initial_placement_shifts_both_eyes_equally() {
        let mut rig = StereoCameraRig::new(10.0, Vec3::new(0.0, 2.0, 8.0));
        let (left, right) = pair();
        rig.attach(left, right).unwrap();

        assert_close(rig.eye_camera(Eye::Left).unwrap().position, Vec3::new(-5.0, 2.0, 8.0));
        assert_close(rig.eye_camera(Eye::Right).unwrap().position, Vec3::new(5.0, 2.0, 8.0));
    }

    #[test]
    fn attach_requires_both_cameras() {
        let mut rig = StereoCameraRig::new(10.0, Vec3::new(0.0, 2.0, 8.0));

        assert!(matches!(
            rig.attach(Some(Camera::new()), None),
            Err(StereoError::NotReady)
        ));
        assert!(matches!(rig.attach(None, None), Err(StereoError::NotReady)));
        assert!(!rig.is_attached());
        assert_eq!(rig.position(), Vec3::ZERO);
    }

    #[test]
    fn attach_is_idempotent() {
        let mut rig = StereoCameraRig::new(10.0, Vec3::new(0.0, 2.0, 8.0));
        let (left, right) = pair();
        rig.attach(left, right).unwrap();
        let first = (rig.eye_camera(Eye::Left), rig.eye_camera(Eye::Right));

        assert_eq!(
            rig.attach(left, right).unwrap(),
            AttachOutcome::AlreadyAttached
        );
        assert_eq!((rig.eye_camera(Eye::Left), rig.eye_camera(Eye::Right)), first);
        assert_eq!(rig.local_offset(Eye::Left), Some(Vec3::new(-5.0, 0.0, 0.0)));
        assert_eq!(rig.local_offset(Eye::Right), Some(Vec3::new(5.0, 0.0, 0.0)));
    }

    #[test]
    fn movement_preserves_eye_separation() {
        let mut rig = StereoCameraRig::new(6.0, Vec3::ZERO);
        let (left, right) = pair();
        rig.attach(left, right).unwrap();

        rig.move_local(3.0, -1.5);
        rig.move_local(-0.5, 4.0);

        let l = rig.eye_camera(Eye::Left).unwrap().position;
        let r = rig.eye_camera(Eye::Right).unwrap().position;
        assert_close(r - l, Vec3::new(6.0, 0.0, 0.0));
        assert_close((l + r) * 0.5, rig.position());
        assert_eq!(rig.local_offset(Eye::Left), Some(Vec3::new(-3.0, 0.0, 0.0)));
    }

    #[test]
    fn movement_before_attach_moves_the_rig_only() {
        let mut rig = StereoCameraRig::new(10.0, Vec3::ZERO);
        rig.move_local(0.5, 0.0);

        assert_eq!(rig.position(), Vec3::new(0.5, 0.0, 0.0));
        assert!(rig.eye_camera(Eye::Left).is_none());

        let (left, right) = pair();
        rig.attach(left, right).unwrap();
        assert_close(rig.eye_camera(Eye::Left).unwrap().position, Vec3::new(-4.5, 0.0, 0.0));
    }

    #[test]
    fn rotated_rig_moves_along_local_axes() {
        let mut rig = StereoCameraRig::new(2.0, Vec3::ZERO);
        rig.set_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        let (left, right) = pair();
        rig.attach(left, right).unwrap();

        rig.move_local(1.0, 0.0);
        assert_close(rig.position(), Vec3::new(0.0, 0.0, -1.0));

        let left = rig.eye_camera(Eye::Left).unwrap();
        assert_close(left.position, Vec3::new(0.0, 0.0, 0.0));
        assert_close(left.forward, Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn eye_pair_indexing() {
        let mut pair = EyePair::from_fn(|eye| eye.label());
        assert_eq!(*pair.get(Eye::Left), "left");
        *pair.get_mut(Eye::Right) = "R";
        assert_eq!(pair.map(str::len), EyePair::new(4, 1));
    }
}
