//! livecam-frame — Camera frame conversion for face analysis.
//!
//! Converts YUV 4:2:0 camera planes (arbitrary row and pixel strides) into
//! a packed BGR buffer with integer-only arithmetic, plus the helpers
//! around it: rotation, brightness statistics and raw file layouts.

pub mod converter;
pub mod frame;
pub mod geometry;
pub mod layout;
pub mod plane;
pub mod profiles;
pub mod repack;
pub mod rotate;
pub mod transform;

pub use converter::YuvToBgrConverter;
pub use frame::{summarize, BgrFrame, BgrImage, FrameSummary};
pub use geometry::{ConvertError, FrameGeometry, GeometryCache};
pub use layout::{LayoutError, RawLayout};
pub use plane::{OwnedPlane, OwnedYuvFrame, PlaneView, YuvFrame};
pub use rotate::{rotate, Rotation, RotationError};
