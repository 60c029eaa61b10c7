//! Orientation-independent drawing surface

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};

use crate::{Orientation, PhysicalFrame, INK, PAPER};

/// A monochrome drawing surface sized for a given mounting orientation
///
/// `BinaryColor::On` is ink (black), `BinaryColor::Off` is paper (white).
/// Out-of-bounds pixels are silently dropped, like every other
/// embedded-graphics target.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalCanvas {
    image: GrayImage,
    orientation: Orientation,
}

impl LogicalCanvas {
    /// Create a white canvas for a panel with the given physical size
    pub fn new(physical: Size, orientation: Orientation) -> Self {
        let logical = orientation.logical_size(physical);
        Self {
            image: GrayImage::from_pixel(logical.width, logical.height, Luma([PAPER])),
            orientation,
        }
    }

    /// Wrap an existing logical image
    pub fn from_image(image: GrayImage, orientation: Orientation) -> Self {
        Self { image, orientation }
    }

    /// Mounting orientation this canvas was created for
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Underlying grayscale image (0 = ink, 255 = paper)
    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    /// Whether the pixel at `(x, y)` is inked
    pub fn is_ink(&self, x: u32, y: u32) -> Option<bool> {
        self.image.get_pixel_checked(x, y).map(|p| p.0[0] < 128)
    }

    /// Map this canvas onto the physical frame buffer
    pub fn to_physical(&self, physical: Size) -> PhysicalFrame {
        PhysicalFrame::from_image(to_physical(&self.image, self.orientation, physical))
    }
}

impl DrawTarget for LogicalCanvas {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) else {
                continue;
            };
            if let Some(px) = self.image.get_pixel_mut_checked(x, y) {
                *px = Luma([if color.is_on() { INK } else { PAPER }]);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        let value = if color.is_on() { INK } else { PAPER };
        self.image.pixels_mut().for_each(|p| *p = Luma([value]));
        Ok(())
    }
}

impl OriginDimensions for LogicalCanvas {
    fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }
}

/// Rotate a logical image for the given orientation and force it to the
/// exact physical size
///
/// Landscape-right turns the image 90° counter-clockwise, landscape-left
/// 270°, portrait leaves it alone. A nearest-neighbour resize follows only
/// when the rotated image does not already match `physical`.
pub fn to_physical(logical: &GrayImage, orientation: Orientation, physical: Size) -> GrayImage {
    let rotated = match orientation {
        Orientation::LandscapeRight => imageops::rotate270(logical),
        Orientation::LandscapeLeft => imageops::rotate90(logical),
        Orientation::Portrait => logical.clone(),
    };
    if rotated.dimensions() == (physical.width, physical.height) {
        rotated
    } else {
        imageops::resize(
            &rotated,
            physical.width,
            physical.height,
            FilterType::Nearest,
        )
    }
}
