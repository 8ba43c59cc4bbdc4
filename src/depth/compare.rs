use glam::UVec2;

use super::pixel::GrayFrame;

/// Scores how different two square pixel windows are. Lower is more alike.
pub trait BlockComparer: Send {
    fn compare(
        &self,
        original: &GrayFrame,
        candidate: &GrayFrame,
        original_at: UVec2,
        candidate_at: UVec2,
        window: u32,
    ) -> u64;
}

/// Sum of absolute differences over the window.
#[derive(Clone, Copy, Debug, Default)]
pub struct SumOfAbsoluteDifferences;

impl BlockComparer for SumOfAbsoluteDifferences {
    fn compare(
        &self,
        original: &GrayFrame,
        candidate: &GrayFrame,
        original_at: UVec2,
        candidate_at: UVec2,
        window: u32,
    ) -> u64 {
        let mut sad = 0u64;
        for y in 0..window {
            for x in 0..window {
                let a = original.get(original_at.x + x, original_at.y + y);
                let b = candidate.get(candidate_at.x + x, candidate_at.y + y);
                sad += a.abs_diff(b) as u64;
            }
        }
        sad
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(pixels: &[u16]) -> GrayFrame {
        GrayFrame {
            width: 4,
            height: 1,
            pixels: pixels.to_vec(),
        }
    }

    #[test]
    fn sad_sums_absolute_differences() {
        let a = frame(&[10, 20, 30, 40]);
        let b = frame(&[40, 30, 20, 10]);
        let sad = SumOfAbsoluteDifferences;

        assert_eq!(sad.compare(&a, &b, UVec2::ZERO, UVec2::ZERO, 1), 30);
        assert_eq!(sad.compare(&a, &a, UVec2::new(2, 0), UVec2::new(2, 0), 1), 0);
        assert_eq!(sad.compare(&a, &b, UVec2::new(0, 0), UVec2::new(3, 0), 1), 0);
    }
}
