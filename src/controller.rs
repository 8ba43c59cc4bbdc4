//! Keyboard control of the stereo rig, plus the wait for its cameras.
//!
//! The controller starts out waiting for the scene to hand over a
//! [`CameraPair`]. Readiness is checked from the render loop at a fixed
//! interval without blocking; once the cameras arrive they are attached and
//! the controller stops polling for good.

use std::time::{Duration, Instant};

use futures::channel::oneshot;
use winit::keyboard::KeyCode;

use crate::rig::{AttachOutcome, CameraPair, StereoCameraRig};

/// A discrete rig movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RigCommand {
    StrafeLeft,
    StrafeRight,
    Forward,
    Back,
}

impl RigCommand {
    /// The command bound to a key, if any.
    pub fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::KeyA => Some(Self::StrafeLeft),
            KeyCode::KeyD => Some(Self::StrafeRight),
            KeyCode::KeyW => Some(Self::Forward),
            KeyCode::KeyS => Some(Self::Back),
            _ => None,
        }
    }

    /// Local (dx, dz) for one step of the given size.
    pub fn delta(self, step: f32) -> (f32, f32) {
        match self {
            Self::StrafeLeft => (-step, 0.0),
            Self::StrafeRight => (step, 0.0),
            Self::Forward => (0.0, step),
            Self::Back => (0.0, -step),
        }
    }
}

enum ControllerState {
    Unattached {
        ready: Option<oneshot::Receiver<CameraPair>>,
        last_poll: Option<Instant>,
    },
    Attached,
}

/// Moves the rig one step per key press and attaches it once cameras exist.
pub struct RigController {
    state: ControllerState,
    step: f32,
    poll_interval: Duration,
}

impl RigController {
    /// A controller waiting on `ready` for the eye cameras.
    pub fn new(ready: oneshot::Receiver<CameraPair>, step: f32, poll_interval: Duration) -> Self {
        Self {
            state: ControllerState::Unattached {
                ready: Some(ready),
                last_poll: None,
            },
            step,
            poll_interval,
        }
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn is_attached(&self) -> bool {
        matches!(self.state, ControllerState::Attached)
    }

    /// Check for the cameras if the poll interval elapsed.
    ///
    /// Returns `true` on the tick that attached the rig.
    pub fn tick(&mut self, rig: &mut StereoCameraRig, now: Instant) -> bool {
        let ControllerState::Unattached { ready, last_poll } = &mut self.state else {
            return false;
        };
        if let Some(last) = *last_poll {
            if now.saturating_duration_since(last) < self.poll_interval {
                return false;
            }
        }
        *last_poll = Some(now);

        let Some(receiver) = ready.as_mut() else {
            return false;
        };
        let cameras = match receiver.try_recv() {
            Ok(Some(cameras)) => cameras,
            Ok(None) => return false,
            Err(oneshot::Canceled) => {
                log::warn!("camera source dropped before delivering cameras, rig stays detached");
                *ready = None;
                return false;
            }
        };

        match rig.attach(Some(cameras.left), Some(cameras.right)) {
            Ok(outcome) => {
                if outcome == AttachOutcome::AlreadyAttached {
                    log::debug!("rig was attached elsewhere before the cameras arrived");
                }
                self.state = ControllerState::Attached;
                true
            }
            Err(err) => {
                log::warn!("rig attach failed: {err}");
                false
            }
        }
    }

    /// Apply a key press. Returns `true` if the rig moved.
    ///
    /// Movement is accepted whether or not the rig is attached yet.
    pub fn on_key_down(&self, rig: &mut StereoCameraRig, key: KeyCode) -> bool {
        let Some(command) = RigCommand::from_key(key) else {
            return false;
        };
        let (dx, dz) = command.delta(self.step);
        rig.move_local(dx, dz);
        log::trace!("{command:?} -> rig at {:?}", rig.position());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use glam::Vec3;

    const POLL: Duration = Duration::from_millis(10);

    fn cameras() -> CameraPair {
        CameraPair {
            left: Camera::new(),
            right: Camera::new(),
        }
    }

    #[test]
    fn attaches_once_cameras_arrive() {
        let (tx, rx) = oneshot::channel();
        let mut controller = RigController::new(rx, 0.5, POLL);
        let mut rig = StereoCameraRig::new(10.0, Vec3::new(0.0, 2.0, 8.0));
        let start = Instant::now();

        assert!(!controller.tick(&mut rig, start));
        tx.send(cameras()).unwrap();

        // Within the interval nothing is polled.
        assert!(!controller.tick(&mut rig, start + Duration::from_millis(5)));
        assert!(!rig.is_attached());

        assert!(controller.tick(&mut rig, start + POLL));
        assert!(controller.is_attached());
        assert_eq!(rig.position(), Vec3::new(0.0, 2.0, 8.0));

        assert!(!controller.tick(&mut rig, start + POLL * 2));
    }

    #[test]
    fn dropped_sender_stops_polling() {
        let (tx, rx) = oneshot::channel::<CameraPair>();
        let mut controller = RigController::new(rx, 0.5, POLL);
        let mut rig = StereoCameraRig::new(10.0, Vec3::ZERO);
        drop(tx);

        let start = Instant::now();
        assert!(!controller.tick(&mut rig, start));
        assert!(!controller.tick(&mut rig, start + POLL));
        assert!(!controller.is_attached());
        assert!(!rig.is_attached());
    }

    #[test]
    fn keys_move_by_one_step() {
        let (_tx, rx) = oneshot::channel();
        let controller = RigController::new(rx, 0.5, POLL);
        let mut rig = StereoCameraRig::new(10.0, Vec3::ZERO);

        assert!(controller.on_key_down(&mut rig, KeyCode::KeyA));
        assert_eq!(rig.position(), Vec3::new(-0.5, 0.0, 0.0));
        assert!(controller.on_key_down(&mut rig, KeyCode::KeyD));
        assert!(controller.on_key_down(&mut rig, KeyCode::KeyD));
        assert_eq!(rig.position(), Vec3::new(0.5, 0.0, 0.0));
        assert!(controller.on_key_down(&mut rig, KeyCode::KeyS));
        assert_eq!(rig.position(), Vec3::new(0.5, 0.0, -0.5));

        assert!(!controller.on_key_down(&mut rig, KeyCode::KeyQ));
        assert!(!controller.on_key_down(&mut rig, KeyCode::Space));
        assert_eq!(rig.position(), Vec3::new(0.5, 0.0, -0.5));
    }

    #[test]
    fn four_forward_presses_move_four_steps() {
        let (_tx, rx) = oneshot::channel();
        let controller = RigController::new(rx, 0.5, POLL);
        let mut rig = StereoCameraRig::new(10.0, Vec3::ZERO);

        for _ in 0..4 {
            controller.on_key_down(&mut rig, KeyCode::KeyW);
        }
        assert_eq!(rig.position(), Vec3::new(0.0, 0.0, 2.0));
    }
}
