//! Off-screen eye targets and the pool that keeps them sized to the display.

use super::engine::{DisplaySize, RenderEngine};
use crate::gpu::GpuContext;
use crate::rig::{Eye, EyePair};

/// Color format of every eye target.
pub const EYE_TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Depth format shared by the eye targets and the display.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// An off-screen color buffer with its own depth attachment.
///
/// The color texture can be rendered to and later sampled by the overlay pass.
/// Targets are never resized in place; the pool drops and recreates them.
pub struct RenderTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub depth_view: wgpu::TextureView,
    eye: Eye,
    size: DisplaySize,
}

impl RenderTarget {
    pub fn new(gpu: &GpuContext, eye: Eye, size: DisplaySize) -> Self {
        let label = format!("{} Eye Target", eye.label());
        let extent = wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&label),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: EYE_TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = create_depth_view(gpu, &label, size);
        Self {
            texture,
            view,
            depth_view,
            eye,
            size,
        }
    }

    pub fn eye(&self) -> Eye {
        self.eye
    }

    pub fn size(&self) -> DisplaySize {
        self.size
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        EYE_TARGET_FORMAT
    }
}

/// Create a depth texture view of the given size.
pub(crate) fn create_depth_view(
    gpu: &GpuContext,
    label: &str,
    size: DisplaySize,
) -> wgpu::TextureView {
    let depth = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some(&format!("{label} Depth")),
        size: wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    depth.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Two off-screen targets, one per eye, always the same size as the display.
///
/// Targets are allocated lazily on first use. When the display size changes
/// both are recreated together, so they never differ in size from each other.
pub struct FrameBufferPool<T> {
    targets: Option<EyePair<T>>,
    size: Option<DisplaySize>,
}

impl<T> Default for FrameBufferPool<T> {
    fn default() -> Self {
        Self {
            targets: None,
            size: None,
        }
    }
}

impl<T> FrameBufferPool<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size of the current targets, if any have been allocated.
    pub fn size(&self) -> Option<DisplaySize> {
        self.size
    }

    /// Reallocate both targets if the display size changed.
    ///
    /// Returns `true` when new targets were created. A zero-area display
    /// allocates nothing and leaves the current targets alone.
    pub fn ensure_size<E>(&mut self, engine: &mut E) -> bool
    where
        E: RenderEngine<Target = T>,
    {
        self.refresh(engine).is_some_and(|(_, created)| created)
    }

    /// The target for `eye`, sized to the current display.
    ///
    /// `None` while the display has zero area.
    pub fn target_for<E>(&mut self, eye: Eye, engine: &mut E) -> Option<&T>
    where
        E: RenderEngine<Target = T>,
    {
        self.refresh(engine).map(|(targets, _)| targets.get(eye))
    }

    fn refresh<E>(&mut self, engine: &mut E) -> Option<(&EyePair<T>, bool)>
    where
        E: RenderEngine<Target = T>,
    {
        let display = engine.display_size();
        if display.is_empty() {
            return None;
        }
        let stale = self.size != Some(display);
        if stale {
            match self.size {
                Some(old) => log::debug!(
                    "eye targets resized {}x{} -> {}x{}",
                    old.width,
                    old.height,
                    display.width,
                    display.height
                ),
                None => log::debug!(
                    "eye targets allocated at {}x{}",
                    display.width,
                    display.height
                ),
            }
            // Drop the old pair before allocating so peak memory stays at two targets.
            self.targets = None;
            self.size = Some(display);
        }
        let targets = self
            .targets
            .get_or_insert_with(|| EyePair::from_fn(|eye| engine.create_target(eye, display)));
        Some((targets, stale))
    }

    /// Both targets, if allocated.
    pub fn targets(&self) -> Option<EyePair<&T>> {
        self.targets.as_ref().map(EyePair::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_graph::RecordingEngine;

    #[test]
    fn allocates_lazily_and_only_once_per_size() {
        let mut engine = RecordingEngine::new(DisplaySize::new(800, 600));
        let mut pool = FrameBufferPool::new();
        assert!(pool.targets().is_none());

        assert!(pool.ensure_size(&mut engine));
        assert!(!pool.ensure_size(&mut engine));
        assert_eq!(engine.allocations(), 2);
        assert_eq!(pool.size(), Some(DisplaySize::new(800, 600)));
    }

    #[test]
    fn resize_recreates_both_targets() {
        let mut engine = RecordingEngine::new(DisplaySize::new(800, 600));
        let mut pool = FrameBufferPool::new();
        let before = pool.target_for(Eye::Left, &mut engine).unwrap().id;

        engine.resize(DisplaySize::new(1024, 768));
        let left = pool.target_for(Eye::Left, &mut engine).unwrap().clone();
        let targets = pool.targets().unwrap();

        assert_ne!(left.id, before);
        assert_eq!(left.size, DisplaySize::new(1024, 768));
        assert_eq!(targets.right.size, DisplaySize::new(1024, 768));
        assert_eq!(targets.right.eye, Eye::Right);
        assert_eq!(engine.allocations(), 4);
    }

    #[test]
    fn zero_area_display_yields_no_target() {
        let mut engine = RecordingEngine::new(DisplaySize::new(0, 0));
        let mut pool = FrameBufferPool::new();

        assert!(pool.target_for(Eye::Left, &mut engine).is_none());
        assert!(!pool.ensure_size(&mut engine));
        assert_eq!(engine.allocations(), 0);
        assert_eq!(pool.size(), None);

        engine.resize(DisplaySize::new(640, 480));
        let left = pool.target_for(Eye::Left, &mut engine).unwrap().clone();
        assert_eq!(left.size, DisplaySize::new(640, 480));

        // Minimizing keeps the last targets around for the restore.
        engine.resize(DisplaySize::new(0, 480));
        assert!(pool.target_for(Eye::Right, &mut engine).is_none());
        assert_eq!(pool.size(), Some(DisplaySize::new(640, 480)));
        assert_eq!(engine.allocations(), 2);
    }
}
