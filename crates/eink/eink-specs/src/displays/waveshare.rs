//! Waveshare e-paper display specifications
//!
//! Pre-configured spec for the Waveshare HAT used on the backup station,
//! based on the official datasheets. Dimensions are given in the native
//! (portrait) gate orientation, exactly as the vendor driver reports them.

use crate::{Controller, DisplaySpec};

/// Waveshare 2.13" V4 (122×250, SSD1680)
///
/// The panel on the backup station.
/// - Full refresh: ~2s with 3 flashes
/// - Partial refresh: 300ms, requires a committed base image
pub const WAVESHARE_2_13_V4: DisplaySpec = DisplaySpec {
    name: "Waveshare 2.13\" V4",
    width: 122,
    height: 250,
    controller: Controller::SSD1680,
    full_refresh_ms: 2000,
    partial_refresh_ms: 300,
    ghosting_rate_partial: 0.15,
    supports_partial: true,
    partial_refresh_limit: 100,
};
