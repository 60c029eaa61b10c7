//! Logical canvas and physical frame mapping for e-paper panels
//!
//! Screens are drawn on a [`LogicalCanvas`] whose size depends on how the
//! panel is mounted. Before anything is sent to the controller the canvas is
//! mapped onto the panel's fixed physical buffer with [`to_physical`]:
//! rotated for landscape mountings, then resized if the rotation did not
//! already land on the exact physical size.
//!
//! # Example
//!
//! ```
//! use eink_canvas::{LogicalCanvas, Orientation};
//! use embedded_graphics::prelude::*;
//!
//! let physical = Size::new(122, 250);
//! let canvas = LogicalCanvas::new(physical, Orientation::LandscapeRight);
//! assert_eq!(canvas.size(), Size::new(250, 122));
//!
//! let frame = canvas.to_physical(physical);
//! assert_eq!(frame.size(), physical);
//! assert_eq!(frame.to_packed().len(), 16 * 250);
//! ```

mod canvas;
mod frame;
mod orientation;

pub use canvas::{to_physical, LogicalCanvas};
pub use frame::PhysicalFrame;
pub use orientation::{Orientation, UnknownOrientation};

/// Luma value of an inked (black) pixel
pub const INK: u8 = 0;

/// Luma value of a bare (white) pixel
pub const PAPER: u8 = 255;

/// Errors produced when rebuilding frames from raw controller buffers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// Packed buffer length does not match the frame geometry
    #[error("packed buffer is {actual} bytes, expected {expected}")]
    BufferSize {
        /// Bytes required by the geometry
        expected: usize,
        /// Bytes supplied
        actual: usize,
    },
}
