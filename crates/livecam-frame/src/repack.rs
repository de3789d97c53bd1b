//! Strided plane repacking into one semi-planar buffer.
//!
//! Output layout: `width * height` luma bytes with row padding removed,
//! followed by `chroma_width * chroma_height` interleaved (V, U) pairs.
//! Pixel stride 1 (planar) and 2 (semi-planar) chroma go through the
//! same stride walk.

use crate::geometry::{FrameGeometry, LineScratch};
use crate::plane::{PlaneView, YuvFrame};

/// Repack the three planes of `frame` into `packed`.
///
/// `packed` must hold at least `geometry.packed_len()` bytes and the line
/// buffers must be sized to the chroma row strides in `geometry`.
pub fn pack(
    frame: &YuvFrame<'_>,
    geometry: &FrameGeometry,
    packed: &mut [u8],
    lines: &mut LineScratch,
) {
    let (luma, chroma) = packed.split_at_mut(geometry.chroma_offset());
    copy_luma(&frame.y, geometry, luma);
    interleave_chroma(&frame.u, &frame.v, geometry, lines, chroma);
}

/// Copy `height` rows of `width` bytes, dropping the padding between rows.
fn copy_luma(plane: &PlaneView<'_>, geometry: &FrameGeometry, out: &mut [u8]) {
    let width = geometry.width;
    if width == 0 {
        return;
    }

    let mut cursor = 0usize;
    for row in out.chunks_exact_mut(width).take(geometry.height) {
        row.copy_from_slice(&plane.data[cursor..cursor + width]);
        // The last advance may point past the final row; never beyond the plane.
        cursor = (cursor + geometry.luma_row_stride).min(geometry.luma_plane_size);
    }
}

fn interleave_chroma(
    u: &PlaneView<'_>,
    v: &PlaneView<'_>,
    geometry: &FrameGeometry,
    lines: &mut LineScratch,
    out: &mut [u8],
) {
    let pair_row_len = geometry.chroma_width * 2;
    if pair_row_len == 0 {
        return;
    }

    let mut u_cursor = 0usize;
    let mut v_cursor = 0usize;
    for out_row in out.chunks_exact_mut(pair_row_len).take(geometry.chroma_height) {
        v_cursor += stage_row(v.data, v_cursor, geometry.chroma_row_stride_v, &mut lines.v);
        u_cursor += stage_row(u.data, u_cursor, geometry.chroma_row_stride_u, &mut lines.u);

        let v_samples = lines.v.iter().step_by(geometry.chroma_pixel_stride_v);
        let u_samples = lines.u.iter().step_by(geometry.chroma_pixel_stride_u);
        for ((pair, &v), &u) in out_row.chunks_exact_mut(2).zip(v_samples).zip(u_samples) {
            pair[0] = v;
            pair[1] = u;
        }
    }
}

/// Stage the row starting at `cursor` into `line` and return how many bytes
/// were consumed from the plane.
///
/// A full row is `row_stride` bytes. Camera stacks commonly deliver the last
/// chroma row without its trailing padding (and interleaved views one byte
/// short), so the final row may stop early; only the bytes that exist are
/// staged.
fn stage_row(data: &[u8], cursor: usize, row_stride: usize, line: &mut [u8]) -> usize {
    let remaining = data.len().saturating_sub(cursor);
    let len = if remaining < row_stride {
        remaining
    } else {
        row_stride
    };
    line[..len].copy_from_slice(&data[cursor..cursor + len]);
    len
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeometryCache;

    fn run_pack(frame: &YuvFrame<'_>) -> Vec<u8> {
        let mut cache = GeometryCache::new();
        let geometry = cache.ensure_geometry(frame).unwrap();
        let scratch = cache.scratch_mut();
        pack(frame, &geometry, &mut scratch.packed, &mut scratch.lines);
        scratch.packed[..geometry.width * geometry.height * 3 / 2].to_vec()
    }

    #[test]
    fn test_pack_planar_tight() {
        let y: Vec<u8> = (0..8).collect();
        let u = [100u8, 101];
        let v = [200u8, 201];
        let frame = YuvFrame::new(
            4,
            2,
            PlaneView::new(&y, 4, 1),
            PlaneView::new(&u, 2, 1),
            PlaneView::new(&v, 2, 1),
        );

        let packed = run_pack(&frame);
        assert_eq!(&packed[..8], &[0, 1, 2, 3, 4, 5, 6, 7]);
        // (V, U) order
        assert_eq!(&packed[8..], &[200, 100, 201, 101]);
    }

    #[test]
    fn test_pack_strips_luma_padding() {
        // 4x2 luma in rows of 6; padding bytes are 0xFF.
        let y = [1u8, 2, 3, 4, 0xFF, 0xFF, 5, 6, 7, 8];
        let u = [128u8, 128];
        let v = [128u8, 128];
        let frame = YuvFrame::new(
            4,
            2,
            PlaneView::new(&y, 6, 1),
            PlaneView::new(&u, 2, 1),
            PlaneView::new(&v, 2, 1),
        );

        let packed = run_pack(&frame);
        assert_eq!(&packed[..8], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_pack_semi_planar_nv21_views() {
        // NV21 chroma plane: V U V U ... ; the U view starts one byte in and
        // both views are one byte shorter than the interleaved plane.
        let y = vec![16u8; 16];
        let vu = [10u8, 20, 11, 21, 12, 22, 13, 23];
        let frame = YuvFrame::new(
            4,
            4,
            PlaneView::new(&y, 4, 1),
            PlaneView::new(&vu[1..], 4, 2),
            PlaneView::new(&vu[..7], 4, 2),
        );

        let packed = run_pack(&frame);
        assert_eq!(&packed[16..], &vu);
    }

    #[test]
    fn test_pack_planar_and_semi_planar_agree() {
        let y: Vec<u8> = (0..16).collect();
        let u = [1u8, 2, 3, 4];
        let v = [5u8, 6, 7, 8];
        let planar = YuvFrame::new(
            4,
            4,
            PlaneView::new(&y, 4, 1),
            PlaneView::new(&u, 2, 1),
            PlaneView::new(&v, 2, 1),
        );

        let uv = [1u8, 5, 2, 6, 3, 7, 4, 8];
        let semi = YuvFrame::new(
            4,
            4,
            PlaneView::new(&y, 4, 1),
            PlaneView::new(&uv[..7], 4, 2),
            PlaneView::new(&uv[1..], 4, 2),
        );

        assert_eq!(run_pack(&planar), run_pack(&semi));
    }

    #[test]
    fn test_pack_independent_chroma_strides() {
        // U rows padded to 4, V rows padded to 3; both planar.
        let y = vec![0u8; 16];
        let u = [1u8, 2, 0xEE, 0xEE, 3, 4];
        let v = [5u8, 6, 0xDD, 7, 8];
        let frame = YuvFrame::new(
            4,
            4,
            PlaneView::new(&y, 4, 1),
            PlaneView::new(&u, 4, 1),
            PlaneView::new(&v, 3, 1),
        );

        let packed = run_pack(&frame);
        assert_eq!(&packed[16..], &[5, 1, 6, 2, 7, 3, 8, 4]);
    }

    #[test]
    fn test_stage_row_full() {
        let data = [1u8, 2, 3, 4, 5, 6];
        let mut line = [0u8; 4];
        assert_eq!(stage_row(&data, 0, 4, &mut line), 4);
        assert_eq!(line, [1, 2, 3, 4]);
    }

    #[test]
    fn test_stage_row_short_final_row() {
        let data = [1u8, 2, 3, 4, 5, 6];
        let mut line = [9u8; 4];
        assert_eq!(stage_row(&data, 4, 4, &mut line), 2);
        // Only the bytes that exist are overwritten.
        assert_eq!(line, [5, 6, 9, 9]);
    }

    #[test]
    fn test_stage_row_exhausted_plane() {
        let data = [1u8, 2];
        let mut line = [7u8; 2];
        assert_eq!(stage_row(&data, 2, 2, &mut line), 0);
        assert_eq!(line, [7, 7]);
    }
}
