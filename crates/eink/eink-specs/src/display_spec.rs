//! Display specification types
//!
//! Describes the characteristics of a panel that matter to the refresh
//! controller and the emulator.

/// Complete specification of an e-paper panel
///
/// `width` and `height` are the *physical* dimensions in the controller's
/// native gate orientation. Logical (rotated) canvases are derived from these
/// by the canvas crate.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DisplaySpec {
    /// Display name (e.g., "Waveshare 2.13\" V4")
    pub name: &'static str,

    /// Physical width in pixels
    pub width: u32,

    /// Physical height in pixels
    pub height: u32,

    /// Display controller chip
    pub controller: Controller,

    /// Full refresh duration in milliseconds (typical: 2000ms)
    pub full_refresh_ms: u32,

    /// Partial refresh duration in milliseconds (typical: 300ms)
    pub partial_refresh_ms: u32,

    /// Ghosting accumulation rate per partial refresh (0.0-1.0)
    pub ghosting_rate_partial: f32,

    /// Whether the controller can diff against a committed base image
    pub supports_partial: bool,

    /// Number of consecutive partial refreshes after which a full refresh is
    /// recommended to clear ghosting
    pub partial_refresh_limit: u32,
}

impl DisplaySpec {
    /// Bytes per packed 1bpp row (rows are padded to a whole byte)
    pub const fn bytes_per_row(&self) -> usize {
        (self.width as usize).div_ceil(8)
    }

    /// Length of a packed 1bpp frame buffer for this panel
    pub const fn buffer_len(&self) -> usize {
        self.bytes_per_row() * self.height as usize
    }
}

/// E-paper controller chips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Controller {
    /// Solomon Systech SSD1680 (Waveshare 2.13" V3/V4)
    SSD1680,
}
