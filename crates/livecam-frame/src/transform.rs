//! Fixed-point YUV to BGR transform over the semi-planar packed frame.
//!
//! Each 2x2 block of luma shares one (V, U) pair. Coefficients are 16.16
//! fixed point; the per-pixel work is three adds and three clamps.

use crate::geometry::FrameGeometry;

// --- 16.16 fixed-point coefficients ---
const R_FROM_V: i32 = 91_881;
const G_FROM_U: i32 = 22_544;
const G_FROM_V: i32 = 46_793;
const B_FROM_U: i32 = 116_129;
const FIXED_SHIFT: u32 = 16;

// Chroma bias folded into each channel offset (128 * coefficient).
const R_BIAS: i32 = 179;
const G_BIAS: i32 = 135;
const B_BIAS: i32 = 226;

/// Channel offsets shared by the four luma samples of one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChromaOffsets {
    r: i32,
    g: i32,
    b: i32,
}

impl ChromaOffsets {
    #[inline(always)]
    fn new(v: u8, u: u8) -> Self {
        let v = i32::from(v);
        let u = i32::from(u);
        Self {
            r: ((R_FROM_V * v) >> FIXED_SHIFT) - R_BIAS,
            g: ((G_FROM_U * u + G_FROM_V * v) >> FIXED_SHIFT) - G_BIAS,
            b: ((B_FROM_U * u) >> FIXED_SHIFT) - B_BIAS,
        }
    }

    /// Write one pixel in (B, G, R) order.
    #[inline(always)]
    fn write(self, y: u8, bgr: &mut [u8]) {
        let y = i32::from(y);
        bgr[0] = clamp_u8(y + self.b);
        bgr[1] = clamp_u8(y - self.g);
        bgr[2] = clamp_u8(y + self.r);
    }
}

#[inline(always)]
fn clamp_u8(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

/// Convert the packed frame into `out` (`geometry.output_len()` bytes, BGR).
pub fn convert(packed: &[u8], geometry: &FrameGeometry, out: &mut [u8]) {
    let width = geometry.width;
    let stride = geometry.output_row_stride;
    if width == 0 || geometry.height == 0 {
        return;
    }

    let (luma, chroma) = packed.split_at(geometry.chroma_offset());
    let chroma = &chroma[..geometry.chroma_offset() / 2];

    let row_pairs = luma
        .chunks_exact(2 * width)
        .zip(chroma.chunks_exact(width))
        .zip(out.chunks_exact_mut(2 * stride));

    for ((luma_rows, chroma_row), out_rows) in row_pairs {
        let (top, bottom) = luma_rows.split_at(width);
        let (out_top, out_bottom) = out_rows.split_at_mut(stride);

        let blocks = chroma_row
            .chunks_exact(2)
            .zip(top.chunks_exact(2).zip(bottom.chunks_exact(2)))
            .zip(out_top.chunks_exact_mut(6).zip(out_bottom.chunks_exact_mut(6)));

        for ((vu, (top, bottom)), (out_top, out_bottom)) in blocks {
            let offsets = ChromaOffsets::new(vu[0], vu[1]);
            let (top_left, top_right) = out_top.split_at_mut(3);
            let (bottom_left, bottom_right) = out_bottom.split_at_mut(3);
            offsets.write(top[0], top_left);
            offsets.write(top[1], top_right);
            offsets.write(bottom[0], bottom_left);
            offsets.write(bottom[1], bottom_right);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(width: usize, height: usize) -> FrameGeometry {
        FrameGeometry {
            width,
            height,
            chroma_width: width / 2,
            chroma_height: height / 2,
            luma_row_stride: width,
            chroma_row_stride_u: width / 2,
            chroma_row_stride_v: width / 2,
            chroma_pixel_stride_u: 1,
            chroma_pixel_stride_v: 1,
            output_row_stride: 3 * width,
            luma_plane_size: width * height,
        }
    }

    #[test]
    fn test_neutral_chroma_offsets_are_zero() {
        assert_eq!(ChromaOffsets::new(128, 128), ChromaOffsets { r: 0, g: 0, b: 0 });
    }

    #[test]
    fn test_clamp_bounds() {
        assert_eq!(clamp_u8(-300), 0);
        assert_eq!(clamp_u8(0), 0);
        assert_eq!(clamp_u8(128), 128);
        assert_eq!(clamp_u8(255), 255);
        assert_eq!(clamp_u8(400), 255);
    }

    #[test]
    fn test_reference_red() {
        let g = geometry(2, 2);
        // Y = 76 everywhere, V = 255, U = 84
        let packed = [76u8, 76, 76, 76, 255, 84];
        let mut out = [0u8; 12];
        convert(&packed, &g, &mut out);

        for px in out.chunks_exact(3) {
            assert!(px[0] <= 2, "blue {}", px[0]);
            assert!(px[1] <= 2, "green {}", px[1]);
            assert!(px[2] >= 253, "red {}", px[2]);
        }
    }

    #[test]
    fn test_block_positions() {
        // 4x2 frame, two blocks: left neutral, right neutral; distinct luma per pixel.
        let g = geometry(4, 2);
        let packed = [10u8, 20, 30, 40, 50, 60, 70, 80, 128, 128, 128, 128];
        let mut out = [0u8; 24];
        convert(&packed, &g, &mut out);

        let lumas: Vec<u8> = out.chunks_exact(3).map(|px| px[0]).collect();
        assert_eq!(lumas, vec![10, 20, 30, 40, 50, 60, 70, 80]);
        for px in out.chunks_exact(3) {
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
        }
    }

    #[test]
    fn test_each_block_uses_its_own_chroma() {
        let g = geometry(4, 2);
        // Left block neutral, right block strongly red.
        let packed = [76u8, 76, 76, 76, 76, 76, 76, 76, 128, 128, 255, 84];
        let mut out = [0u8; 24];
        convert(&packed, &g, &mut out);

        let px = |x: usize, y: usize| {
            let i = y * 12 + x * 3;
            [out[i], out[i + 1], out[i + 2]]
        };
        assert_eq!(px(0, 0), [76, 76, 76]);
        assert_eq!(px(1, 1), [76, 76, 76]);
        assert!(px(2, 0)[2] >= 253);
        assert!(px(3, 1)[0] <= 2);
    }

    #[test]
    fn test_saturates_high_luma() {
        let g = geometry(2, 2);
        let packed = [250u8, 250, 250, 250, 255, 255];
        let mut out = [0u8; 12];
        convert(&packed, &g, &mut out);
        // R and B overflow and clamp to 255.
        assert_eq!(out[0], 255);
        assert_eq!(out[2], 255);
    }
}
