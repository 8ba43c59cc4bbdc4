//! Copies the eye targets back to the CPU.

use super::engine::DisplaySize;
use super::render_target::RenderTarget;
use crate::error::{StereoError, StereoResult};
use crate::gpu::GpuContext;
use crate::rig::{Eye, EyePair};

/// Staging buffers for reading both eye targets as tightly packed RGBA8.
///
/// Buffers are reused until the target size changes. Every read blocks until
/// the GPU has finished the copy.
#[derive(Default)]
pub struct EyeReadback {
    size: Option<DisplaySize>,
    bytes_per_row: u32,
    buffers: Option<EyePair<wgpu::Buffer>>,
}

impl EyeReadback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read both targets. They must share one size.
    pub fn read(
        &mut self,
        gpu: &GpuContext,
        targets: EyePair<&RenderTarget>,
    ) -> StereoResult<EyePair<Vec<u8>>> {
        let size = targets.get(Eye::Left).size();
        if targets.get(Eye::Right).size() != size {
            return Err(StereoError::Readback(format!(
                "eye targets differ in size: {:?} and {:?}",
                size,
                targets.get(Eye::Right).size()
            )));
        }
        if size.is_empty() {
            return Err(StereoError::Readback("eye targets have zero area".into()));
        }

        self.ensure_buffers(gpu, size);
        let Some(buffers) = self.buffers.as_ref() else {
            return Err(StereoError::Readback("no staging buffers".into()));
        };

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Eye Readback Encoder"),
            });
        for eye in Eye::BOTH {
            encoder.copy_texture_to_buffer(
                wgpu::TexelCopyTextureInfo {
                    texture: &targets.get(eye).texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                wgpu::TexelCopyBufferInfo {
                    buffer: buffers.get(eye),
                    layout: wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(self.bytes_per_row),
                        rows_per_image: Some(size.height),
                    },
                },
                wgpu::Extent3d {
                    width: size.width,
                    height: size.height,
                    depth_or_array_layers: 1,
                },
            );
        }
        gpu.queue.submit(Some(encoder.finish()));

        let (tx, rx) = std::sync::mpsc::channel();
        for eye in Eye::BOTH {
            let tx = tx.clone();
            buffers
                .get(eye)
                .slice(..)
                .map_async(wgpu::MapMode::Read, move |res| {
                    let _ = tx.send((eye, res));
                });
        }
        drop(tx);
        gpu.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| StereoError::Readback(format!("poll failed: {e:?}")))?;

        let mut mapped = EyePair::new(false, false);
        let mut failure = None;
        for (eye, res) in rx.try_iter() {
            match res {
                Ok(()) => *mapped.get_mut(eye) = true,
                Err(e) => failure = Some(format!("{eye:?} eye map failed: {e:?}")),
            }
        }

        let row_bytes = size.width as usize * 4;
        let mut out = EyePair::new(Vec::new(), Vec::new());
        for eye in Eye::BOTH {
            if !*mapped.get(eye) {
                continue;
            }
            let buffer = buffers.get(eye);
            if failure.is_none() {
                let data = buffer.slice(..).get_mapped_range();
                *out.get_mut(eye) = unpad_rows(&data, row_bytes, self.bytes_per_row as usize);
            }
            buffer.unmap();
        }

        if let Some(failure) = failure {
            return Err(StereoError::Readback(failure));
        }
        if Eye::BOTH.iter().any(|&eye| !*mapped.get(eye)) {
            return Err(StereoError::Readback("map callback never ran".into()));
        }
        Ok(out)
    }

    fn ensure_buffers(&mut self, gpu: &GpuContext, size: DisplaySize) {
        if self.size == Some(size) && self.buffers.is_some() {
            return;
        }
        self.bytes_per_row = padded_bytes_per_row(size.width);
        let buffer_size = self.bytes_per_row as u64 * size.height as u64;
        self.buffers = Some(EyePair::from_fn(|eye| {
            gpu.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("{} Eye Readback", eye.label())),
                size: buffer_size,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                mapped_at_creation: false,
            })
        }));
        self.size = Some(size);
        log::debug!("eye readback buffers sized to {}x{}", size.width, size.height);
    }
}

/// Row pitch for an RGBA8 copy of `width` pixels.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let alignment = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let unpadded = width * 4;
    unpadded.div_ceil(alignment) * alignment
}

/// Strip row padding from a mapped copy.
pub fn unpad_rows(data: &[u8], row_bytes: usize, padded_row_bytes: usize) -> Vec<u8> {
    if padded_row_bytes == 0 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(data.len() / padded_row_bytes * row_bytes);
    for row in data.chunks(padded_row_bytes) {
        out.extend_from_slice(&row[..row_bytes.min(row.len())]);
    }
    out
}
