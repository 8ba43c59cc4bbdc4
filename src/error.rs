//! Error type shared by the stereo pipeline and the application runner.

pub type StereoResult<T> = Result<T, StereoError>;

#[derive(thiserror::Error, Debug)]
pub enum StereoError {
    /// Both stereo cameras must exist before the rig can be attached.
    #[error("stereo cameras are not ready")]
    NotReady,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("window creation failed: {0}")]
    Window(#[from] winit::error::OsError),

    #[error(transparent)]
    Depth(#[from] crate::depth::DepthError),

    #[error("eye readback failed: {0}")]
    Readback(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StereoError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert_eq!(StereoError::NotReady.to_string(), "stereo cameras are not ready");
        assert!(
            StereoError::invalid_config("step")
                .to_string()
                .starts_with("invalid configuration:")
        );
    }

    #[test]
    fn depth_errors_convert() {
        let err: StereoError = crate::depth::DepthError::InvalidConfig("window".into()).into();
        assert!(matches!(err, StereoError::Depth(_)));
        assert!(err.to_string().starts_with("invalid depth configuration:"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("device lost");
        let err = StereoError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("device lost"));
    }
}
