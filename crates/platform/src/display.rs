//! Panel driver contract
//!
//! The refresh controller talks to the panel exclusively through
//! [`PanelDriver`]. Buffers are packed 1bpp frames in the controller's native
//! orientation (see `eink_canvas::PhysicalFrame::to_packed`).

use embedded_graphics::geometry::Size;

/// What a concrete driver supports, resolved once when the driver is built
///
/// The refresh controller reads this once at construction and never probes
/// the driver again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelCapabilities {
    /// Driver implements `display_set_base` + `display_partial`
    pub partial_refresh: bool,
    /// `init_partial` selects a distinct waveform; when false the controller
    /// uses `init_full` before partial writes as well
    pub partial_init: bool,
}

impl PanelCapabilities {
    /// Full-featured controller (SSD1680 class)
    pub const FULL_AND_PARTIAL: Self = Self {
        partial_refresh: true,
        partial_init: true,
    };

    /// Controller without partial refresh support
    pub const FULL_ONLY: Self = Self {
        partial_refresh: false,
        partial_init: false,
    };
}

impl Default for PanelCapabilities {
    fn default() -> Self {
        Self::FULL_AND_PARTIAL
    }
}

/// Fill pattern for `clear`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClearPattern {
    /// All pixels white (0xFF)
    White,
    /// All pixels black (0x00)
    Black,
}

impl ClearPattern {
    /// Byte value written to every position of the frame buffer
    pub const fn byte(self) -> u8 {
        match self {
            ClearPattern::White => 0xFF,
            ClearPattern::Black => 0x00,
        }
    }
}

/// Panel driver operations
///
/// Every call is synchronous and may fail with [`DisplayError::Busy`] when
/// the controller (or the bus it sits on) is still occupied. After
/// [`release`](PanelDriver::release) the next call re-acquires the
/// transport, which is how the refresh controller recovers from `Busy`.
pub trait PanelDriver: Send {
    /// Capability descriptor, fixed for the lifetime of the driver
    fn capabilities(&self) -> PanelCapabilities;

    /// Physical dimensions (native gate orientation)
    fn size(&self) -> Size;

    /// Level of the BUSY line
    fn is_busy(&self) -> bool;

    /// Initialise the controller for full-refresh waveforms
    fn init_full(&mut self) -> Result<(), DisplayError>;

    /// Initialise the controller for partial-refresh waveforms
    fn init_partial(&mut self) -> Result<(), DisplayError>;

    /// Fill the panel with a solid pattern
    fn clear(&mut self, pattern: ClearPattern) -> Result<(), DisplayError>;

    /// Full refresh of a packed frame
    fn display_full(&mut self, buffer: &[u8]) -> Result<(), DisplayError>;

    /// Show a packed frame and commit it as the base for partial refreshes
    fn display_set_base(&mut self, buffer: &[u8]) -> Result<(), DisplayError>;

    /// Partial refresh against the committed base
    fn display_partial(&mut self, buffer: &[u8]) -> Result<(), DisplayError>;

    /// Enter deep sleep
    fn sleep(&mut self) -> Result<(), DisplayError>;

    /// Release the transport (SPI device, GPIO lines)
    fn release(&mut self) -> Result<(), DisplayError>;

    /// Expected packed buffer length in bytes
    fn buffer_len(&self) -> usize {
        let size = self.size();
        (size.width as usize).div_ceil(8) * size.height as usize
    }
}

/// Display errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DisplayError {
    /// Controller or bus still occupied (EBUSY on the GPIO/SPI handle)
    #[error("display is busy")]
    Busy,
    /// Buffer does not match the panel geometry
    #[error("frame buffer is {actual} bytes, panel expects {expected}")]
    BufferSize {
        /// Bytes the panel expects
        expected: usize,
        /// Bytes supplied
        actual: usize,
    },
    /// Operation not valid in the current controller state
    #[error("display in invalid state: {0}")]
    InvalidState(&'static str),
    /// BUSY line never cleared
    #[error("display operation timeout")]
    Timeout,
}

impl DisplayError {
    /// Whether a release-and-retry may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, DisplayError::Busy)
    }
}

/// Check a buffer against a driver's expected length
pub fn check_buffer_len(expected: usize, buffer: &[u8]) -> Result<(), DisplayError> {
    if buffer.len() == expected {
        Ok(())
    } else {
        Err(DisplayError::BufferSize {
            expected,
            actual: buffer.len(),
        })
    }
}
