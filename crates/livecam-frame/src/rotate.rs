//! Quarter-turn rotation of converted frames.
//!
//! Cameras report how far a frame must be turned clockwise to be upright;
//! the detector expects upright images.

use crate::frame::{BgrFrame, BgrImage};
use crate::geometry::{alloc_zeroed, ConvertError};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RotationError {
    #[error("unsupported rotation: {0} degrees (must be a multiple of 90)")]
    Unsupported(i32),
}

/// Clockwise rotation in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Parse a clockwise angle. Any multiple of 90 is accepted, negative
    /// angles turn counter-clockwise.
    pub fn from_degrees(degrees: i32) -> Result<Self, RotationError> {
        match degrees.rem_euclid(360) {
            0 => Ok(Self::Deg0),
            90 => Ok(Self::Deg90),
            180 => Ok(Self::Deg180),
            270 => Ok(Self::Deg270),
            _ => Err(RotationError::Unsupported(degrees)),
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }
}

/// Rotate `frame` clockwise into a new tightly packed image.
pub fn rotate(frame: &BgrFrame<'_>, rotation: Rotation) -> Result<BgrImage, ConvertError> {
    // Maps source (x, y) in a w x h frame to its destination coordinates.
    let target: fn(usize, usize, usize, usize) -> (usize, usize) = match rotation {
        Rotation::Deg0 => return frame.to_image(),
        Rotation::Deg90 => |x, y, _w, h| (h - 1 - y, x),
        Rotation::Deg180 => |x, y, w, h| (w - 1 - x, h - 1 - y),
        Rotation::Deg270 => |x, y, w, _h| (y, w - 1 - x),
    };

    let (w, h) = (frame.width, frame.height);
    let (out_w, out_h) = if rotation.swaps_dimensions() { (h, w) } else { (w, h) };
    let mut data = alloc_zeroed("rotated", w * h * 3)?;

    for (y, row) in frame.rows().enumerate() {
        for (x, px) in row.chunks_exact(3).enumerate() {
            let (dx, dy) = target(x, y, w, h);
            let dst = (dy * out_w + dx) * 3;
            data[dst..dst + 3].copy_from_slice(px);
        }
    }

    Ok(BgrImage {
        data,
        width: out_w,
        height: out_h,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 3x2 image whose blue channel holds the pixel index.
    fn indexed() -> BgrImage {
        BgrImage {
            data: (0u8..6).flat_map(|i| [i, 0, 0]).collect(),
            width: 3,
            height: 2,
        }
    }

    fn blues(image: &BgrImage) -> Vec<u8> {
        image.data.chunks_exact(3).map(|px| px[0]).collect()
    }

    #[test]
    fn test_from_degrees() {
        assert_eq!(Rotation::from_degrees(0), Ok(Rotation::Deg0));
        assert_eq!(Rotation::from_degrees(90), Ok(Rotation::Deg90));
        assert_eq!(Rotation::from_degrees(450), Ok(Rotation::Deg90));
        assert_eq!(Rotation::from_degrees(-90), Ok(Rotation::Deg270));
        assert_eq!(Rotation::from_degrees(45), Err(RotationError::Unsupported(45)));
    }

    #[test]
    fn test_rotate_0_copies() {
        let image = indexed();
        let out = rotate(&image.as_frame(), Rotation::Deg0).unwrap();
        assert_eq!(out, image);
    }

    #[test]
    fn test_rotate_90_clockwise() {
        // 0 1 2        3 0
        // 3 4 5   →    4 1
        //              5 2
        let out = rotate(&indexed().as_frame(), Rotation::Deg90).unwrap();
        assert_eq!((out.width, out.height), (2, 3));
        assert_eq!(blues(&out), vec![3, 0, 4, 1, 5, 2]);
    }

    #[test]
    fn test_rotate_180() {
        let out = rotate(&indexed().as_frame(), Rotation::Deg180).unwrap();
        assert_eq!((out.width, out.height), (3, 2));
        assert_eq!(blues(&out), vec![5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_rotate_270() {
        // 0 1 2        2 5
        // 3 4 5   →    1 4
        //              0 3
        let out = rotate(&indexed().as_frame(), Rotation::Deg270).unwrap();
        assert_eq!((out.width, out.height), (2, 3));
        assert_eq!(blues(&out), vec![2, 5, 1, 4, 0, 3]);
    }

    #[test]
    fn test_four_quarter_turns_is_identity() {
        let image = indexed();
        let mut out = image.clone();
        for _ in 0..4 {
            out = rotate(&out.as_frame(), Rotation::Deg90).unwrap();
        }
        assert_eq!(out, image);
    }
}
