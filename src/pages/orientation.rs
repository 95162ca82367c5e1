//! Page orientation
//!
//! Rotating a page only changes its Orientation tag (274). The eight codes
//! form a cycle under clockwise quarter turns, with the mirrored codes on
//! their own four-step sub-cycle.

use image::DynamicImage;
use std::fmt;

use crate::tiff::constants::orientation as codes;
use crate::tiff::errors::{TiffError, TiffResult};

/// The eight orientation codes, named by where row 0 and column 0 are shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    #[default]
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
    LeftTop,
    RightTop,
    RightBottom,
    LeftBottom,
}

impl Orientation {
    /// All orientations in code order
    pub const ALL: [Orientation; 8] = [
        Orientation::TopLeft,
        Orientation::TopRight,
        Orientation::BottomRight,
        Orientation::BottomLeft,
        Orientation::LeftTop,
        Orientation::RightTop,
        Orientation::RightBottom,
        Orientation::LeftBottom,
    ];

    /// Parses a tag value
    pub fn from_code(code: u64) -> TiffResult<Self> {
        match u16::try_from(code) {
            Ok(codes::TOP_LEFT) => Ok(Orientation::TopLeft),
            Ok(codes::TOP_RIGHT) => Ok(Orientation::TopRight),
            Ok(codes::BOTTOM_RIGHT) => Ok(Orientation::BottomRight),
            Ok(codes::BOTTOM_LEFT) => Ok(Orientation::BottomLeft),
            Ok(codes::LEFT_TOP) => Ok(Orientation::LeftTop),
            Ok(codes::RIGHT_TOP) => Ok(Orientation::RightTop),
            Ok(codes::RIGHT_BOTTOM) => Ok(Orientation::RightBottom),
            Ok(codes::LEFT_BOTTOM) => Ok(Orientation::LeftBottom),
            _ => Err(TiffError::InvalidOrientation(code)),
        }
    }

    /// The tag value
    pub fn code(self) -> u16 {
        match self {
            Orientation::TopLeft => codes::TOP_LEFT,
            Orientation::TopRight => codes::TOP_RIGHT,
            Orientation::BottomRight => codes::BOTTOM_RIGHT,
            Orientation::BottomLeft => codes::BOTTOM_LEFT,
            Orientation::LeftTop => codes::LEFT_TOP,
            Orientation::RightTop => codes::RIGHT_TOP,
            Orientation::RightBottom => codes::RIGHT_BOTTOM,
            Orientation::LeftBottom => codes::LEFT_BOTTOM,
        }
    }

    /// The orientation after one clockwise quarter turn
    pub fn rotated_clockwise(self) -> Self {
        match self {
            Orientation::TopLeft => Orientation::RightTop,
            Orientation::TopRight => Orientation::RightBottom,
            Orientation::BottomRight => Orientation::LeftBottom,
            Orientation::BottomLeft => Orientation::LeftTop,
            Orientation::LeftTop => Orientation::TopRight,
            Orientation::RightTop => Orientation::BottomRight,
            Orientation::RightBottom => Orientation::BottomLeft,
            Orientation::LeftBottom => Orientation::TopLeft,
        }
    }

    /// The orientation after rotating clockwise by `degree`
    pub fn rotate(self, degree: i32) -> TiffResult<Self> {
        let steps = quarter_turns(degree)?;
        Ok((0..steps).fold(self, |orientation, _| orientation.rotated_clockwise()))
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

/// Number of quarter turns in a rotation of 90, 180 or 270 degrees
pub fn quarter_turns(degree: i32) -> TiffResult<u32> {
    match degree {
        90 | 180 | 270 => Ok((degree / 90) as u32),
        _ => Err(TiffError::InvalidRotation(degree)),
    }
}

/// Applies an orientation to decoded pixels
///
/// Returns an image whose row 0 is the visual top and column 0 the visual
/// left. Transposing orientations swap width and height.
pub fn apply_orientation(image: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::TopLeft => image,
        Orientation::TopRight => image.fliph(),
        Orientation::BottomRight => image.rotate180(),
        Orientation::BottomLeft => image.flipv(),
        Orientation::LeftTop => image.rotate90().fliph(),
        Orientation::RightTop => image.rotate90(),
        Orientation::RightBottom => image.rotate90().flipv(),
        Orientation::LeftBottom => image.rotate270(),
    }
}
