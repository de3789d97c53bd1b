//! Borrowed and owned views of the three YUV 4:2:0 input planes.

use crate::rotate::Rotation;

/// Read-only view of one camera plane.
///
/// `row_stride` is the byte distance between row starts, `pixel_stride` the
/// distance between consecutive samples in a row (1 for planar chroma,
/// 2 for semi-planar interleaved chroma; always 1 for luma).
#[derive(Debug, Clone, Copy)]
pub struct PlaneView<'a> {
    pub data: &'a [u8],
    pub row_stride: usize,
    pub pixel_stride: usize,
}

impl<'a> PlaneView<'a> {
    pub fn new(data: &'a [u8], row_stride: usize, pixel_stride: usize) -> Self {
        Self {
            data,
            row_stride,
            pixel_stride,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// One YUV 4:2:0 frame as delivered by the camera: luma dimensions plus
/// the Y, U and V planes. Chroma dimensions are always half of luma.
#[derive(Debug, Clone, Copy)]
pub struct YuvFrame<'a> {
    pub width: usize,
    pub height: usize,
    pub y: PlaneView<'a>,
    pub u: PlaneView<'a>,
    pub v: PlaneView<'a>,
}

impl<'a> YuvFrame<'a> {
    pub fn new(
        width: usize,
        height: usize,
        y: PlaneView<'a>,
        u: PlaneView<'a>,
        v: PlaneView<'a>,
    ) -> Self {
        Self {
            width,
            height,
            y,
            u,
            v,
        }
    }

    /// Assert the caller-side preconditions in debug builds.
    ///
    /// Release builds never check these; a violation shows up as wrong
    /// pixels or a slice bounds panic.
    pub(crate) fn debug_assert_valid(&self) {
        debug_assert!(
            self.width % 2 == 0 && self.height % 2 == 0,
            "4:2:0 frame dimensions must be even, got {}x{}",
            self.width,
            self.height
        );
        debug_assert!(
            self.y.row_stride >= self.width,
            "luma row stride {} shorter than width {}",
            self.y.row_stride,
            self.width
        );
        debug_assert!(
            self.y.len() >= self.y.row_stride * self.height.saturating_sub(1) + self.width,
            "luma plane too short: {} bytes",
            self.y.len()
        );
        for (name, plane) in [("u", &self.u), ("v", &self.v)] {
            debug_assert!(
                matches!(plane.pixel_stride, 1 | 2),
                "{name} pixel stride must be 1 or 2, got {}",
                plane.pixel_stride
            );
            let chroma_width = self.width / 2;
            if chroma_width > 0 {
                debug_assert!(
                    plane.row_stride >= plane.pixel_stride * (chroma_width - 1) + 1,
                    "{name} row stride {} too short for {chroma_width} samples",
                    plane.row_stride
                );
            }
        }
    }
}

/// Owned copy of one plane, for moving a frame onto another thread.
#[derive(Debug, Clone)]
pub struct OwnedPlane {
    pub data: Vec<u8>,
    pub row_stride: usize,
    pub pixel_stride: usize,
}

impl OwnedPlane {
    pub fn view(&self) -> PlaneView<'_> {
        PlaneView::new(&self.data, self.row_stride, self.pixel_stride)
    }
}

impl From<PlaneView<'_>> for OwnedPlane {
    fn from(view: PlaneView<'_>) -> Self {
        Self {
            data: view.data.to_vec(),
            row_stride: view.row_stride,
            pixel_stride: view.pixel_stride,
        }
    }
}

/// A captured frame detached from the camera's buffers.
#[derive(Debug, Clone)]
pub struct OwnedYuvFrame {
    pub width: usize,
    pub height: usize,
    pub y: OwnedPlane,
    pub u: OwnedPlane,
    pub v: OwnedPlane,
    /// Capture sequence number, echoed back with the analysis result.
    pub sequence: u64,
    /// Clockwise rotation needed to make the frame upright, if the camera
    /// reported one.
    pub rotation: Option<Rotation>,
}

impl OwnedYuvFrame {
    pub fn from_frame(frame: &YuvFrame<'_>, sequence: u64) -> Self {
        Self {
            width: frame.width,
            height: frame.height,
            y: frame.y.into(),
            u: frame.u.into(),
            v: frame.v.into(),
            sequence,
            rotation: None,
        }
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = Some(rotation);
        self
    }

    pub fn view(&self) -> YuvFrame<'_> {
        YuvFrame::new(
            self.width,
            self.height,
            self.y.view(),
            self.u.view(),
            self.v.view(),
        )
    }
}
