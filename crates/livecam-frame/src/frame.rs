//! Packed BGR frame types and brightness statistics.

use crate::geometry::{alloc_zeroed, ConvertError};
use serde::Serialize;

/// Borrowed view of a packed BGR frame: 3 bytes per pixel in (B, G, R)
/// order, rows `row_stride` bytes apart.
///
/// This, with its dimensions and stride, is what gets handed to the face
/// detector for image loading.
#[derive(Debug, Clone, Copy)]
pub struct BgrFrame<'a> {
    pub data: &'a [u8],
    pub width: usize,
    pub height: usize,
    pub row_stride: usize,
}

impl<'a> BgrFrame<'a> {
    /// (B, G, R) of the pixel at column `x`, row `y`.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = y * self.row_stride + x * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Iterate over the rows, each `3 * width` bytes long.
    pub fn rows(&self) -> impl Iterator<Item = &'a [u8]> {
        let data = self.data;
        let row_len = self.width * 3;
        let row_stride = self.row_stride;
        (0..self.height).map(move |y| {
            let start = y * row_stride;
            &data[start..start + row_len]
        })
    }

    /// Copy into an owned, tightly packed image.
    pub fn to_image(&self) -> Result<BgrImage, ConvertError> {
        let mut data = alloc_zeroed("image", self.width * self.height * 3)?;
        if self.width > 0 {
            for (dst, src) in data.chunks_exact_mut(self.width * 3).zip(self.rows()) {
                dst.copy_from_slice(src);
            }
        }
        Ok(BgrImage {
            data,
            width: self.width,
            height: self.height,
        })
    }
}

/// Owned, tightly packed BGR image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BgrImage {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
}

impl BgrImage {
    pub fn row_stride(&self) -> usize {
        self.width * 3
    }

    pub fn as_frame(&self) -> BgrFrame<'_> {
        BgrFrame {
            data: &self.data,
            width: self.width,
            height: self.height,
            row_stride: self.row_stride(),
        }
    }

    /// Swap to (R, G, B) byte order, for writing standard image files.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.data
            .chunks_exact(3)
            .flat_map(|px| [px[2], px[1], px[0]])
            .collect()
    }
}

/// Per-channel averages of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameSummary {
    pub mean_b: f32,
    pub mean_g: f32,
    pub mean_r: f32,
    /// Mean BT.601 luminance (0.0–255.0).
    pub brightness: f32,
    pub is_dark: bool,
}

/// Luminance below which a pixel counts as dark (the lowest eighth).
const DARK_LUMA: u32 = 32;

/// BT.601 luminance of one BGR pixel, in 8-bit fixed point.
fn luma(px: &[u8]) -> u32 {
    (29 * u32::from(px[0]) + 150 * u32::from(px[1]) + 77 * u32::from(px[2])) >> 8
}

/// Summarize a frame. It is dark when more than `dark_threshold` (0.0–1.0)
/// of its pixels fall below [`DARK_LUMA`]. Empty frames are dark.
pub fn summarize(frame: &BgrFrame<'_>, dark_threshold: f32) -> FrameSummary {
    let pixels = frame.width * frame.height;
    if pixels == 0 {
        return FrameSummary {
            mean_b: 0.0,
            mean_g: 0.0,
            mean_r: 0.0,
            brightness: 0.0,
            is_dark: true,
        };
    }

    let mut sums = [0u64; 3];
    let mut luma_sum = 0u64;
    let mut dark_count = 0usize;
    for row in frame.rows() {
        for px in row.chunks_exact(3) {
            sums[0] += u64::from(px[0]);
            sums[1] += u64::from(px[1]);
            sums[2] += u64::from(px[2]);
            let l = luma(px);
            luma_sum += u64::from(l);
            if l < DARK_LUMA {
                dark_count += 1;
            }
        }
    }

    let n = pixels as f32;
    FrameSummary {
        mean_b: sums[0] as f32 / n,
        mean_g: sums[1] as f32 / n,
        mean_r: sums[2] as f32 / n,
        brightness: luma_sum as f32 / n,
        is_dark: (dark_count as f32 / n) > dark_threshold,
    }
}
