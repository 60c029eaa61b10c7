//! Physical frame buffer in the controller's native orientation

use embedded_graphics::geometry::Size;
use image::{GrayImage, Luma};

use crate::{FrameError, INK, PAPER};

/// An image already rotated and sized for the panel
///
/// Converts to the controller's packed 1bpp layout: rows MSB-first, padded
/// to a whole byte, `1` = white.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalFrame {
    image: GrayImage,
}

impl PhysicalFrame {
    /// All-white frame
    pub fn blank(size: Size) -> Self {
        Self {
            image: GrayImage::from_pixel(size.width, size.height, Luma([PAPER])),
        }
    }

    /// Wrap an image that already has physical dimensions
    pub fn from_image(image: GrayImage) -> Self {
        Self { image }
    }

    /// Frame dimensions
    pub fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }

    /// Underlying grayscale image (0 = ink, 255 = paper)
    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    /// Consume the frame, returning the image
    pub fn into_image(self) -> GrayImage {
        self.image
    }

    /// Whether the pixel at `(x, y)` is inked
    pub fn is_ink(&self, x: u32, y: u32) -> Option<bool> {
        self.image.get_pixel_checked(x, y).map(|p| p.0[0] < 128)
    }

    /// Number of inked pixels
    pub fn ink_count(&self) -> usize {
        self.image.pixels().filter(|p| p.0[0] < 128).count()
    }

    /// Bytes per packed row for a frame of `width` pixels
    pub fn bytes_per_row(width: u32) -> usize {
        (width as usize).div_ceil(8)
    }

    /// Pack into the controller's 1bpp layout
    pub fn to_packed(&self) -> Vec<u8> {
        let stride = Self::bytes_per_row(self.image.width());
        // Padding bits stay white.
        let mut out = vec![0xFF_u8; stride * self.image.height() as usize];
        for (x, y, px) in self.image.enumerate_pixels() {
            if px.0[0] < 128 {
                let idx = y as usize * stride + x as usize / 8;
                if let Some(byte) = out.get_mut(idx) {
                    *byte &= !(0x80 >> (x % 8));
                }
            }
        }
        out
    }

    /// Rebuild a frame from a packed 1bpp buffer
    pub fn from_packed(size: Size, packed: &[u8]) -> Result<Self, FrameError> {
        let stride = Self::bytes_per_row(size.width);
        let expected = stride * size.height as usize;
        if packed.len() != expected {
            return Err(FrameError::BufferSize {
                expected,
                actual: packed.len(),
            });
        }
        let image = GrayImage::from_fn(size.width, size.height, |x, y| {
            let byte = packed
                .get(y as usize * stride + x as usize / 8)
                .copied()
                .unwrap_or(0xFF);
            let white = byte & (0x80 >> (x % 8)) != 0;
            Luma([if white { PAPER } else { INK }])
        });
        Ok(Self { image })
    }
}
