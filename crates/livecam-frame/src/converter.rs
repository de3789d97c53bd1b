//! The per-frame conversion pipeline: geometry cache, repack, transform.

use crate::frame::BgrFrame;
use crate::geometry::{ConvertError, FrameGeometry, GeometryCache};
use crate::plane::YuvFrame;
use crate::{repack, transform};

/// Converts YUV 4:2:0 camera frames to packed BGR, reusing its buffers
/// across frames of the same size.
///
/// One converter serves one worker. `convert` takes `&mut self` and
/// overwrites the previous output, so the returned view must be consumed
/// (or copied with [`BgrFrame::to_image`]) before the next call.
#[derive(Debug, Default)]
pub struct YuvToBgrConverter {
    cache: GeometryCache,
}

impl YuvToBgrConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Geometry of the last converted frame size, if any.
    pub fn geometry(&self) -> Option<&FrameGeometry> {
        self.cache.geometry()
    }

    /// Convert one frame. The only error is a failed buffer allocation
    /// after a frame size change.
    pub fn convert(&mut self, frame: &YuvFrame<'_>) -> Result<BgrFrame<'_>, ConvertError> {
        frame.debug_assert_valid();

        let geometry = self.cache.ensure_geometry(frame)?;
        let scratch = self.cache.scratch_mut();
        repack::pack(frame, &geometry, &mut scratch.packed, &mut scratch.lines);
        transform::convert(&scratch.packed, &geometry, &mut scratch.output);

        Ok(BgrFrame {
            data: &scratch.output,
            width: geometry.width,
            height: geometry.height,
            row_stride: geometry.output_row_stride,
        })
    }
}
