//! Panel mounting orientation

use core::fmt;
use core::str::FromStr;

use embedded_graphics::geometry::Size;

/// How the panel is mounted relative to the viewer
///
/// The controller always scans in its native portrait orientation; landscape
/// mountings draw on a canvas with width and height swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Orientation {
    /// Native orientation, no rotation
    Portrait,
    /// Panel turned so the logical canvas is rotated 90° counter-clockwise
    /// onto the physical buffer
    #[default]
    LandscapeRight,
    /// Panel turned the other way: 270° counter-clockwise
    LandscapeLeft,
}

impl Orientation {
    /// Check if this orientation swaps width and height
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Orientation::LandscapeRight | Orientation::LandscapeLeft)
    }

    /// Logical canvas size for a panel with the given physical size
    pub fn logical_size(self, physical: Size) -> Size {
        if self.swaps_dimensions() {
            Size::new(physical.height, physical.width)
        } else {
            physical
        }
    }

    /// Configuration spelling of this orientation
    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::LandscapeRight => "landscape_right",
            Orientation::LandscapeLeft => "landscape_left",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when an orientation name is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown orientation {0:?} (expected portrait, landscape_right or landscape_left)")]
pub struct UnknownOrientation(pub String);

impl FromStr for Orientation {
    type Err = UnknownOrientation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "portrait" => Ok(Orientation::Portrait),
            "landscape_right" => Ok(Orientation::LandscapeRight),
            "landscape_left" => Ok(Orientation::LandscapeLeft),
            _ => Err(UnknownOrientation(s.to_string())),
        }
    }
}
