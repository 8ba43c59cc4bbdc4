use std::time::Duration;

use glam::Vec3;

use crate::camera::Camera;
use crate::error::{StereoError, StereoResult};
use crate::rig::StereoCameraRig;

/// Tunables for the stereo rig, its cameras and the controller.
#[derive(Clone, Debug, PartialEq)]
pub struct StereoConfig {
    /// Horizontal separation between the two eye cameras.
    pub baseline: f32,
    /// One-time rig translation (rig-local) applied when the cameras attach.
    pub initial_offset: Vec3,
    /// Distance moved per key press.
    pub step: f32,
    /// How often the controller checks whether the cameras are ready.
    pub poll_interval: Duration,
    /// Vertical field of view of both eye cameras, in degrees.
    pub eye_fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Where the single-eye passthrough camera sits.
    pub main_camera_position: Vec3,
    pub main_camera_target: Vec3,
}

impl Default for StereoConfig {
    fn default() -> Self {
        Self {
            baseline: 10.0,
            initial_offset: Vec3::new(0.0, 2.0, 8.0),
            step: 0.5,
            poll_interval: Duration::from_millis(10),
            eye_fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            main_camera_position: Vec3::new(0.0, 5.0, 20.0),
            main_camera_target: Vec3::ZERO,
        }
    }
}

impl StereoConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn baseline(mut self, baseline: f32) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn initial_offset(mut self, offset: impl Into<Vec3>) -> Self {
        self.initial_offset = offset.into();
        self
    }

    pub fn step(mut self, step: f32) -> Self {
        self.step = step;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn eye_fov(mut self, fov_degrees: f32) -> Self {
        self.eye_fov_degrees = fov_degrees;
        self
    }

    pub fn clip_planes(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    pub fn main_camera_at(mut self, position: impl Into<Vec3>, target: impl Into<Vec3>) -> Self {
        self.main_camera_position = position.into();
        self.main_camera_target = target.into();
        self
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> StereoResult<()> {
        if !self.baseline.is_finite() || self.baseline < 0.0 {
            return Err(StereoError::invalid_config(format!(
                "baseline must be finite and non-negative, got {}",
                self.baseline
            )));
        }
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(StereoError::invalid_config(format!(
                "step must be positive, got {}",
                self.step
            )));
        }
        if !self.initial_offset.is_finite() {
            return Err(StereoError::invalid_config("initial offset must be finite"));
        }
        if self.poll_interval.is_zero() {
            return Err(StereoError::invalid_config("poll interval must be non-zero"));
        }
        if !(self.eye_fov_degrees > 0.0 && self.eye_fov_degrees < 180.0) {
            return Err(StereoError::invalid_config(format!(
                "eye fov must be in (0, 180) degrees, got {}",
                self.eye_fov_degrees
            )));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(StereoError::invalid_config(format!(
                "clip planes must satisfy 0 < near < far, got {}..{}",
                self.near, self.far
            )));
        }
        Ok(())
    }

    /// An unattached rig built from this configuration.
    pub fn build_rig(&self) -> StereoCameraRig {
        StereoCameraRig::new(self.baseline, self.initial_offset)
    }

    /// A camera suitable for either eye.
    pub fn eye_camera(&self) -> Camera {
        Camera::perspective(self.eye_fov_degrees, self.near, self.far)
    }

    /// The application's default single-eye camera.
    pub fn main_camera(&self) -> Camera {
        Camera::perspective(self.eye_fov_degrees, self.near, self.far)
            .at(self.main_camera_position)
            .looking_at(self.main_camera_target)
    }
}

/// Configuration for the app window.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub stereo: StereoConfig,
    /// Draw the FPS panel over the top-left corner.
    pub show_stats: bool,
    /// Start with the depth preview of the eye images showing.
    pub depth_preview: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Stereograph".to_string(),
            width: 1280,
            height: 720,
            stereo: StereoConfig::default(),
            show_stats: true,
            depth_preview: false,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn stereo(mut self, stereo: StereoConfig) -> Self {
        self.stereo = stereo;
        self
    }

    pub fn show_stats(mut self, show: bool) -> Self {
        self.show_stats = show;
        self
    }

    pub fn depth_preview(mut self, show: bool) -> Self {
        self.depth_preview = show;
        self
    }

    pub fn validate(&self) -> StereoResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(StereoError::invalid_config(format!(
                "window size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        self.stereo.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(StereoConfig::new().baseline(-1.0).validate().is_err());
        assert!(StereoConfig::new().baseline(f32::NAN).validate().is_err());
        assert!(StereoConfig::new().step(0.0).validate().is_err());
        assert!(StereoConfig::new().clip_planes(1.0, 0.5).validate().is_err());
        assert!(
            StereoConfig::new()
                .poll_interval(Duration::ZERO)
                .validate()
                .is_err()
        );
        assert!(AppConfig::new().size(0, 600).validate().is_err());
    }

    #[test]
    fn stats_on_and_depth_preview_off_by_default() {
        let config = AppConfig::new();
        assert!(config.show_stats);
        assert!(!config.depth_preview);
        assert!(config.show_stats(false).depth_preview(true).depth_preview);
    }

    #[test]
    fn zero_baseline_is_allowed() {
        assert!(StereoConfig::new().baseline(0.0).validate().is_ok());
    }
}
