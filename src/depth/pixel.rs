//! RGB565 packing, luminance and resampling.

use glam::UVec2;

/// Pack an 8-bit RGB color into RGB565, dropping the low bits.
pub fn pack_rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3)
}

/// Linear luminance of an RGB565 pixel, scaled to the full `u16` range.
pub fn rgb565_luminance(pixel: u16) -> u16 {
    let r = ((pixel >> 11) & 0x1f) as f32 / 31.0;
    let g = ((pixel >> 5) & 0x3f) as f32 / 63.0;
    let b = (pixel & 0x1f) as f32 / 31.0;
    let luminance = 0.2126 * r + 0.7152 * g + 0.0722 * b;
    (luminance.clamp(0.0, 1.0) * u16::MAX as f32).round() as u16
}

/// Convert tightly packed RGBA8 pixels to RGB565. Alpha is ignored.
pub fn rgba8_to_rgb565(rgba: &[u8]) -> Vec<u16> {
    rgba.chunks_exact(4)
        .map(|px| pack_rgb565(px[0], px[1], px[2]))
        .collect()
}

/// Nearest-neighbour resample of an RGBA8 image.
pub fn resample_rgba8(rgba: &[u8], from: UVec2, to: UVec2) -> Vec<u8> {
    let mut out = Vec::with_capacity((to.x * to.y * 4) as usize);
    if from.x == 0 || from.y == 0 {
        out.resize((to.x * to.y * 4) as usize, 0);
        return out;
    }
    for y in 0..to.y {
        let sy = (y as u64 * from.y as u64 / to.y as u64) as usize;
        for x in 0..to.x {
            let sx = (x as u64 * from.x as u64 / to.x as u64) as usize;
            let i = (sy * from.x as usize + sx) * 4;
            match rgba.get(i..i + 4) {
                Some(px) => out.extend_from_slice(px),
                None => out.extend_from_slice(&[0, 0, 0, 0]),
            }
        }
    }
    out
}

/// A single-channel 16-bit intensity image.
#[derive(Clone, Debug, PartialEq)]
pub struct GrayFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u16>,
}

impl GrayFrame {
    /// Grayscale conversion of an RGB565 frame.
    pub fn from_rgb565(width: u32, height: u32, rgb565: &[u16]) -> Self {
        Self {
            width,
            height,
            pixels: rgb565.iter().map(|&px| rgb565_luminance(px)).collect(),
        }
    }

    pub fn get(&self, x: u32, y: u32) -> u16 {
        self.pixels
            .get((y * self.width + x) as usize)
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packing_keeps_the_high_bits() {
        assert_eq!(pack_rgb565(255, 255, 255), 0xffff);
        assert_eq!(pack_rgb565(255, 0, 0), 0xf800);
        assert_eq!(pack_rgb565(0, 255, 0), 0x07e0);
        assert_eq!(pack_rgb565(0, 0, 255), 0x001f);
    }

    #[test]
    fn luminance_weights_green_highest() {
        assert_eq!(rgb565_luminance(0x0000), 0);
        assert_eq!(rgb565_luminance(0xffff), u16::MAX);
        let red = rgb565_luminance(0xf800);
        let green = rgb565_luminance(0x07e0);
        let blue = rgb565_luminance(0x001f);
        assert!(green > red && red > blue);
    }

    #[test]
    fn resample_picks_nearest_source_pixel() {
        // 2x1 image: red, blue.
        let src = [255, 0, 0, 255, 0, 0, 255, 255];
        let out = resample_rgba8(&src, UVec2::new(2, 1), UVec2::new(4, 2));
        assert_eq!(out.len(), 4 * 2 * 4);
        assert_eq!(&out[0..4], &[255, 0, 0, 255]);
        assert_eq!(&out[4..8], &[255, 0, 0, 255]);
        assert_eq!(&out[8..12], &[0, 0, 255, 255]);
        assert_eq!(&out[16..20], &[255, 0, 0, 255]);
    }
}
