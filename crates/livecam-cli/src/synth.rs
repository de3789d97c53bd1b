//! Synthetic color-bar frames for exercising the pipeline without a camera.

/// The eight classic bars, in (R, G, B).
const BARS: [[u8; 3]; 8] = [
    [255, 255, 255],
    [255, 255, 0],
    [0, 255, 255],
    [0, 255, 0],
    [255, 0, 255],
    [255, 0, 0],
    [0, 0, 255],
    [0, 0, 0],
];

/// Full-range BT.601 (JFIF) forward transform.
fn rgb_to_yuv([r, g, b]: [u8; 3]) -> (u8, u8, u8) {
    let (r, g, b) = (f32::from(r), f32::from(g), f32::from(b));
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let u = -0.168_736 * r - 0.331_264 * g + 0.5 * b + 128.0;
    let v = 0.5 * r - 0.418_688 * g - 0.081_312 * b + 128.0;
    let to_u8 = |x: f32| x.round().clamp(0.0, 255.0) as u8;
    (to_u8(y), to_u8(u), to_u8(v))
}

/// Which bar covers column `x` of frame number `frame`. Bars scroll left by
/// two pixels per frame.
pub fn bar_at(x: usize, width: usize, frame: usize) -> [u8; 3] {
    let shifted = (x + 2 * frame) % width;
    BARS[shifted * BARS.len() / width]
}

/// Tightly packed Y, U and V planes for one color-bar frame.
pub fn color_bars(width: usize, height: usize, frame: usize) -> (Vec<u8>, Vec<u8>, Vec<u8>) {
    let (cw, ch) = (width / 2, height / 2);
    let row: Vec<(u8, u8, u8)> = (0..width).map(|x| rgb_to_yuv(bar_at(x, width, frame))).collect();

    let mut y = Vec::with_capacity(width * height);
    for _ in 0..height {
        y.extend(row.iter().map(|&(l, _, _)| l));
    }

    // Bars are constant down a column, so one chroma row serves them all.
    let chroma_row: Vec<(u8, u8)> = (0..cw).map(|cx| (row[2 * cx].1, row[2 * cx].2)).collect();
    let mut u = Vec::with_capacity(cw * ch);
    let mut v = Vec::with_capacity(cw * ch);
    for _ in 0..ch {
        u.extend(chroma_row.iter().map(|&(u, _)| u));
        v.extend(chroma_row.iter().map(|&(_, v)| v));
    }

    (y, u, v)
}
