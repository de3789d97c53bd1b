//! Raw frame file layouts.
//!
//! Splits a contiguous YUV 4:2:0 buffer (as dumped from a camera or a
//! capture tool) into the three plane views the converter takes. Unlike the
//! conversion path, everything here is checked: the bytes come from files.

use crate::plane::{PlaneView, YuvFrame};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LayoutError {
    #[error("invalid frame dimensions {width}x{height} (must be even, non-zero and fit in memory)")]
    InvalidDimensions { width: usize, height: usize },
    #[error("row alignment must be non-zero")]
    InvalidAlignment,
    #[error("buffer too short: expected {expected} bytes, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },
    #[error("unknown layout: {0} (expected i420, yv12, nv12 or nv21)")]
    UnknownLayout(String),
}

/// Byte layout of one raw 4:2:0 frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawLayout {
    /// Y, then U, then V; planar chroma.
    I420,
    /// Y, then V, then U; planar chroma.
    Yv12,
    /// Y, then interleaved U/V.
    Nv12,
    /// Y, then interleaved V/U (the usual Android camera layout).
    Nv21,
}

impl RawLayout {
    pub const ALL: [RawLayout; 4] = [Self::I420, Self::Yv12, Self::Nv12, Self::Nv21];

    pub fn name(self) -> &'static str {
        match self {
            Self::I420 => "i420",
            Self::Yv12 => "yv12",
            Self::Nv12 => "nv12",
            Self::Nv21 => "nv21",
        }
    }

    pub fn is_interleaved(self) -> bool {
        matches!(self, Self::Nv12 | Self::Nv21)
    }

    pub fn chroma_pixel_stride(self) -> usize {
        if self.is_interleaved() {
            2
        } else {
            1
        }
    }

    /// Luma and chroma row strides for `width`, rounded up to `alignment`.
    pub fn row_strides(
        self,
        width: usize,
        alignment: usize,
    ) -> Result<(usize, usize), LayoutError> {
        if alignment == 0 {
            return Err(LayoutError::InvalidAlignment);
        }
        let chroma_row = if self.is_interleaved() { width } else { width / 2 };
        width
            .checked_next_multiple_of(alignment)
            .zip(chroma_row.checked_next_multiple_of(alignment))
            .ok_or(LayoutError::InvalidDimensions { width, height: 0 })
    }

    /// Exact byte size of one frame, validating the dimensions on the way.
    pub fn frame_len(
        self,
        width: usize,
        height: usize,
        alignment: usize,
    ) -> Result<usize, LayoutError> {
        check_dimensions(width, height, alignment)?;
        let (luma_stride, chroma_stride) = self
            .row_strides(width, alignment)
            .map_err(|_| LayoutError::InvalidDimensions { width, height })?;
        let chroma_planes = if self.is_interleaved() { 1 } else { 2 };

        luma_stride
            .checked_mul(height)
            .zip(chroma_stride.checked_mul(height / 2))
            .and_then(|(luma, chroma)| chroma.checked_mul(chroma_planes)?.checked_add(luma))
            .ok_or(LayoutError::InvalidDimensions { width, height })
    }

    /// Split `buf` into plane views. Bytes past the first frame are ignored.
    pub fn split_planes<'a>(
        self,
        buf: &'a [u8],
        width: usize,
        height: usize,
        alignment: usize,
    ) -> Result<YuvFrame<'a>, LayoutError> {
        let expected = self.frame_len(width, height, alignment)?;
        if buf.len() < expected {
            return Err(LayoutError::BufferTooShort {
                expected,
                actual: buf.len(),
            });
        }

        let (luma_stride, chroma_stride) = self.row_strides(width, alignment)?;
        let (luma, chroma) = buf[..expected].split_at(luma_stride * height);
        let y = PlaneView::new(luma, luma_stride, 1);

        let (u, v) = if self.is_interleaved() {
            // Both views cover the one interleaved plane, offset by a byte;
            // each ends one byte short, as camera stacks hand them out.
            let first = &chroma[..chroma.len() - 1];
            let second = &chroma[1..];
            let (u, v) = match self {
                Self::Nv12 => (first, second),
                _ => (second, first),
            };
            (PlaneView::new(u, chroma_stride, 2), PlaneView::new(v, chroma_stride, 2))
        } else {
            let (first, second) = chroma.split_at(chroma.len() / 2);
            let (u, v) = match self {
                Self::I420 => (first, second),
                _ => (second, first),
            };
            (PlaneView::new(u, chroma_stride, 1), PlaneView::new(v, chroma_stride, 1))
        };

        Ok(YuvFrame::new(width, height, y, u, v))
    }

    /// Lay out tightly packed planes (`width * height` luma, then
    /// `width/2 * height/2` each of U and V) as one raw frame, zero-padding
    /// rows to `alignment`.
    pub fn pack_planes(
        self,
        y: &[u8],
        u: &[u8],
        v: &[u8],
        width: usize,
        height: usize,
        alignment: usize,
    ) -> Result<Vec<u8>, LayoutError> {
        let frame_len = self.frame_len(width, height, alignment)?;

        let (cw, ch) = (width / 2, height / 2);
        for (plane, expected) in [(y, width * height), (u, cw * ch), (v, cw * ch)] {
            if plane.len() < expected {
                return Err(LayoutError::BufferTooShort {
                    expected,
                    actual: plane.len(),
                });
            }
        }

        let (luma_stride, chroma_stride) = self.row_strides(width, alignment)?;
        let mut out = vec![0u8; frame_len];
        let (luma, chroma) = out.split_at_mut(luma_stride * height);

        for (dst, src) in luma.chunks_exact_mut(luma_stride).zip(y.chunks_exact(width)) {
            dst[..width].copy_from_slice(src);
        }

        if self.is_interleaved() {
            let (first, second) = match self {
                Self::Nv12 => (u, v),
                _ => (v, u),
            };
            let rows = chroma
                .chunks_exact_mut(chroma_stride)
                .zip(first.chunks_exact(cw).zip(second.chunks_exact(cw)));
            for (dst, (first_row, second_row)) in rows {
                let samples = first_row.iter().zip(second_row);
                for (pair, (&a, &b)) in dst.chunks_exact_mut(2).zip(samples) {
                    pair[0] = a;
                    pair[1] = b;
                }
            }
        } else {
            let (first, second) = match self {
                Self::I420 => (u, v),
                _ => (v, u),
            };
            let (first_dst, second_dst) = chroma.split_at_mut(chroma_stride * ch);
            for (dst, src) in [(first_dst, first), (second_dst, second)] {
                for (row, samples) in dst.chunks_exact_mut(chroma_stride).zip(src.chunks_exact(cw)) {
                    row[..cw].copy_from_slice(samples);
                }
            }
        }

        Ok(out)
    }
}

impl fmt::Display for RawLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for RawLayout {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|layout| layout.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| LayoutError::UnknownLayout(s.to_string()))
    }
}

fn check_dimensions(width: usize, height: usize, alignment: usize) -> Result<(), LayoutError> {
    if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
        return Err(LayoutError::InvalidDimensions { width, height });
    }
    if alignment == 0 {
        return Err(LayoutError::InvalidAlignment);
    }
    Ok(())
}
