//! Per-dimension frame geometry and the scratch buffers sized from it.
//!
//! Geometry is derived from the first frame of a given width/height and
//! reused until the dimensions change. All buffers are reallocated together
//! when that happens and left untouched otherwise.

use crate::plane::YuvFrame;
use std::collections::TryReserveError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("failed to allocate {bytes} bytes for the {buffer} buffer")]
    Allocation {
        buffer: &'static str,
        bytes: usize,
        #[source]
        source: TryReserveError,
    },
}

/// Layout constants for one frame size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    pub width: usize,
    pub height: usize,
    pub chroma_width: usize,
    pub chroma_height: usize,
    pub luma_row_stride: usize,
    pub chroma_row_stride_u: usize,
    pub chroma_row_stride_v: usize,
    pub chroma_pixel_stride_u: usize,
    pub chroma_pixel_stride_v: usize,
    /// Always `3 * width`; the output carries no row padding.
    pub output_row_stride: usize,
    /// Byte length of the luma plane as delivered, padding included.
    pub luma_plane_size: usize,
}

impl FrameGeometry {
    pub fn from_frame(frame: &YuvFrame<'_>) -> Self {
        Self {
            width: frame.width,
            height: frame.height,
            chroma_width: frame.width / 2,
            chroma_height: frame.height / 2,
            luma_row_stride: frame.y.row_stride,
            chroma_row_stride_u: frame.u.row_stride,
            chroma_row_stride_v: frame.v.row_stride,
            chroma_pixel_stride_u: frame.u.pixel_stride,
            chroma_pixel_stride_v: frame.v.pixel_stride,
            output_row_stride: 3 * frame.width,
            luma_plane_size: frame.y.len(),
        }
    }

    /// Offset of the first interleaved (V, U) pair in the packed frame.
    pub fn chroma_offset(&self) -> usize {
        self.width * self.height
    }

    pub fn packed_len(&self) -> usize {
        self.luma_plane_size + self.width * self.height / 2
    }

    pub fn output_len(&self) -> usize {
        self.output_row_stride * self.height
    }
}

/// Row staging buffers for the two chroma planes.
#[derive(Debug, Default)]
pub struct LineScratch {
    pub u: Vec<u8>,
    pub v: Vec<u8>,
}

/// Every buffer the pipeline reuses between frames.
#[derive(Debug, Default)]
pub struct Scratch {
    /// Semi-planar intermediate: luma, then (V, U) pairs.
    pub packed: Vec<u8>,
    /// Packed BGR output.
    pub output: Vec<u8>,
    pub lines: LineScratch,
}

/// Remembers the last frame size and owns the buffers sized for it.
#[derive(Debug, Default)]
pub struct GeometryCache {
    geometry: Option<FrameGeometry>,
    scratch: Scratch,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn geometry(&self) -> Option<&FrameGeometry> {
        self.geometry.as_ref()
    }

    pub fn scratch(&self) -> &Scratch {
        &self.scratch
    }

    pub fn scratch_mut(&mut self) -> &mut Scratch {
        &mut self.scratch
    }

    /// Return the geometry for `frame`, recomputing it and reallocating
    /// every scratch buffer only when the frame size changed.
    ///
    /// On allocation failure the previous geometry and buffers are kept.
    pub fn ensure_geometry(
        &mut self,
        frame: &YuvFrame<'_>,
    ) -> Result<FrameGeometry, ConvertError> {
        if let Some(geometry) = self.geometry {
            if geometry.width == frame.width && geometry.height == frame.height {
                return Ok(geometry);
            }
        }

        let geometry = FrameGeometry::from_frame(frame);
        let scratch = Scratch {
            packed: alloc_zeroed("packed", geometry.packed_len())?,
            output: alloc_zeroed("output", geometry.output_len())?,
            lines: LineScratch {
                u: alloc_zeroed("u line", geometry.chroma_row_stride_u)?,
                v: alloc_zeroed("v line", geometry.chroma_row_stride_v)?,
            },
        };

        tracing::debug!(
            width = geometry.width,
            height = geometry.height,
            luma_row_stride = geometry.luma_row_stride,
            u_row_stride = geometry.chroma_row_stride_u,
            v_row_stride = geometry.chroma_row_stride_v,
            u_pixel_stride = geometry.chroma_pixel_stride_u,
            v_pixel_stride = geometry.chroma_pixel_stride_v,
            "frame geometry changed; buffers reallocated"
        );

        self.geometry = Some(geometry);
        self.scratch = scratch;
        Ok(geometry)
    }
}

/// Allocate a zero-filled buffer, reporting failure instead of aborting.
pub(crate) fn alloc_zeroed(buffer: &'static str, bytes: usize) -> Result<Vec<u8>, ConvertError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(bytes)
        .map_err(|source| ConvertError::Allocation {
            buffer,
            bytes,
            source,
        })?;
    buf.resize(bytes, 0);
    Ok(buf)
}
