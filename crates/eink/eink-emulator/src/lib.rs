//! E-Ink Display Emulator
//!
//! Headless emulator for SSD1680-class e-paper panels with realistic
//! controller behaviour:
//!
//! - Frame writes are rejected until the controller is initialised
//! - Partial refreshes require a committed base image and the partial
//!   waveform set
//! - Deep sleep and transport release drop controller state
//! - Ghosting accumulates across partial refreshes
//! - Optional simulated refresh timing with a BUSY line
//! - Optional PNG capture of every displayed frame
//!
//! # Example
//!
//! ```
//! use eink_emulator::Emulator;
//! use eink_specs::displays::WAVESHARE_2_13_V4;
//! use platform::{ClearPattern, PanelDriver};
//!
//! let mut panel = Emulator::new(&WAVESHARE_2_13_V4);
//! panel.init_full().unwrap();
//! panel.clear(ClearPattern::White).unwrap();
//! assert_eq!(panel.stats().clear_count, 1);
//! ```

mod controller_state;
mod frame_dump;
mod ghosting;

pub use controller_state::{ControllerState, InitMode};
pub use frame_dump::FrameDump;
pub use ghosting::{Ghosting, Waveform};

use std::path::Path;
use std::time::{Duration, Instant};

use eink_canvas::PhysicalFrame;
use eink_specs::DisplaySpec;
use embedded_graphics::geometry::Size;
use platform::display::check_buffer_len;
use platform::{ClearPattern, DisplayError, PanelCapabilities, PanelDriver};

/// Refresh and lifecycle counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayStats {
    pub full_refresh_count: u64,
    pub partial_refresh_count: u64,
    pub base_commit_count: u64,
    pub clear_count: u64,
    pub sleep_count: u64,
    pub release_count: u64,
    pub total_refresh_time_ms: u64,
    /// Partial refreshes issued past the panel's recommended limit
    pub ghosting_warnings: u32,
}

impl DisplayStats {
    fn record_refresh(&mut self, waveform: Waveform, duration_ms: u32) {
        match waveform {
            Waveform::Full => self.full_refresh_count += 1,
            Waveform::Partial => self.partial_refresh_count += 1,
        }
        self.total_refresh_time_ms += u64::from(duration_ms);
    }
}

/// Headless emulated panel
pub struct Emulator {
    spec: &'static DisplaySpec,
    capabilities: PanelCapabilities,
    state: ControllerState,
    transport_open: bool,
    /// Pending transport opens that fail with EBUSY
    contended_opens: usize,
    base: Option<Vec<u8>>,
    glass: PhysicalFrame,
    ghosting: Ghosting,
    stats: DisplayStats,
    simulate_timing: bool,
    busy_until: Option<Instant>,
    frame_dump: Option<FrameDump>,
}

impl Emulator {
    /// Create an emulator for the given panel
    pub fn new(spec: &'static DisplaySpec) -> Self {
        let capabilities = if spec.supports_partial {
            PanelCapabilities::FULL_AND_PARTIAL
        } else {
            PanelCapabilities::FULL_ONLY
        };
        Self {
            spec,
            capabilities,
            state: ControllerState::Released,
            transport_open: false,
            contended_opens: 0,
            base: None,
            glass: PhysicalFrame::blank(Size::new(spec.width, spec.height)),
            ghosting: Ghosting::new(spec.partial_refresh_limit, spec.ghosting_rate_partial),
            stats: DisplayStats::default(),
            simulate_timing: false,
            busy_until: None,
            frame_dump: None,
        }
    }

    /// Hold the BUSY line high for the panel's refresh duration after every
    /// refresh, and block the next command until it clears
    #[must_use]
    pub fn with_simulated_timing(mut self, enabled: bool) -> Self {
        self.simulate_timing = enabled;
        self
    }

    /// Capture every displayed frame as PNG into `dir`
    pub fn with_frame_dir(mut self, dir: impl AsRef<Path>) -> std::io::Result<Self> {
        self.frame_dump = Some(FrameDump::new(dir.as_ref())?);
        Ok(self)
    }

    /// Override the capability descriptor
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: PanelCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Make the next `opens` transport acquisitions fail with `Busy`, as if
    /// another process still held the GPIO lines
    pub fn contend_transport(&mut self, opens: usize) {
        self.contended_opens = opens;
    }

    /// Get display specification
    pub fn spec(&self) -> &'static DisplaySpec {
        self.spec
    }

    /// Get refresh statistics
    pub fn stats(&self) -> &DisplayStats {
        &self.stats
    }

    /// Controller lifecycle state
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Current ghosting level (0.0 - 1.0)
    pub fn ghosting_level(&self) -> f32 {
        self.ghosting.level()
    }

    /// Whether a base image is committed
    pub fn has_base(&self) -> bool {
        self.base.is_some()
    }

    /// What the glass currently shows
    pub fn glass(&self) -> &PhysicalFrame {
        &self.glass
    }

    /// Save the current glass content as an image
    pub fn screenshot(&self, path: impl AsRef<Path>) -> Result<(), image::ImageError> {
        self.glass.image().save(path)
    }

    fn open_transport(&mut self) -> Result<(), DisplayError> {
        if self.transport_open {
            return Ok(());
        }
        if self.contended_opens > 0 {
            self.contended_opens -= 1;
            tracing::debug!("transport open failed: EBUSY");
            return Err(DisplayError::Busy);
        }
        self.transport_open = true;
        tracing::trace!("transport acquired");
        Ok(())
    }

    fn wait_ready(&mut self) {
        if let Some(until) = self.busy_until.take() {
            let now = Instant::now();
            if until > now {
                std::thread::sleep(until - now);
            }
        }
    }

    fn require_ready(&self, what: &'static str) -> Result<InitMode, DisplayError> {
        self.state
            .init_mode()
            .ok_or(DisplayError::InvalidState(what))
    }

    fn present(&mut self, buffer: &[u8], waveform: Waveform) -> Result<(), DisplayError> {
        let frame = PhysicalFrame::from_packed(self.size(), buffer).map_err(|_| {
            DisplayError::BufferSize {
                expected: self.buffer_len(),
                actual: buffer.len(),
            }
        })?;
        let duration_ms = match waveform {
            Waveform::Full => self.spec.full_refresh_ms,
            Waveform::Partial => self.spec.partial_refresh_ms,
        };
        if self.ghosting.apply(waveform) {
            self.stats.ghosting_warnings += 1;
            tracing::warn!(
                partials = self.ghosting.since_full(),
                ghosting = self.ghosting.level(),
                "partial refresh past recommended limit"
            );
        }
        self.stats.record_refresh(waveform, duration_ms);
        if self.simulate_timing {
            self.busy_until =
                Some(Instant::now() + Duration::from_millis(u64::from(duration_ms)));
        }
        if let Some(dump) = self.frame_dump.as_mut() {
            dump.save(&frame, waveform);
        }
        self.glass = frame;
        Ok(())
    }
}

impl PanelDriver for Emulator {
    fn capabilities(&self) -> PanelCapabilities {
        self.capabilities
    }

    fn size(&self) -> Size {
        Size::new(self.spec.width, self.spec.height)
    }

    fn is_busy(&self) -> bool {
        self.busy_until.is_some_and(|until| Instant::now() < until)
    }

    fn init_full(&mut self) -> Result<(), DisplayError> {
        self.open_transport()?;
        self.wait_ready();
        self.state = ControllerState::Ready(InitMode::Full);
        Ok(())
    }

    fn init_partial(&mut self) -> Result<(), DisplayError> {
        self.open_transport()?;
        self.wait_ready();
        if !self.capabilities.partial_refresh {
            return Err(DisplayError::InvalidState("partial waveform not supported"));
        }
        self.state = ControllerState::Ready(InitMode::Partial);
        Ok(())
    }

    fn clear(&mut self, pattern: ClearPattern) -> Result<(), DisplayError> {
        self.open_transport()?;
        self.require_ready("clear before init")?;
        self.wait_ready();
        let buffer = vec![pattern.byte(); self.buffer_len()];
        self.present(&buffer, Waveform::Full)?;
        self.base = None;
        self.stats.clear_count += 1;
        Ok(())
    }

    fn display_full(&mut self, buffer: &[u8]) -> Result<(), DisplayError> {
        self.open_transport()?;
        self.require_ready("display before init")?;
        check_buffer_len(self.buffer_len(), buffer)?;
        self.wait_ready();
        self.present(buffer, Waveform::Full)?;
        // Only the new-image RAM is written; any earlier base is now stale.
        self.base = None;
        Ok(())
    }

    fn display_set_base(&mut self, buffer: &[u8]) -> Result<(), DisplayError> {
        self.open_transport()?;
        if self.require_ready("base before init")? != InitMode::Full {
            return Err(DisplayError::InvalidState("base requires full waveform"));
        }
        check_buffer_len(self.buffer_len(), buffer)?;
        self.wait_ready();
        self.present(buffer, Waveform::Full)?;
        self.base = Some(buffer.to_vec());
        self.stats.base_commit_count += 1;
        Ok(())
    }

    fn display_partial(&mut self, buffer: &[u8]) -> Result<(), DisplayError> {
        self.open_transport()?;
        let mode = self.require_ready("partial before init")?;
        if self.capabilities.partial_init && mode != InitMode::Partial {
            return Err(DisplayError::InvalidState("partial requires partial waveform"));
        }
        if self.base.is_none() {
            return Err(DisplayError::InvalidState("partial without base image"));
        }
        check_buffer_len(self.buffer_len(), buffer)?;
        self.wait_ready();
        self.present(buffer, Waveform::Partial)
    }

    fn sleep(&mut self) -> Result<(), DisplayError> {
        self.open_transport()?;
        self.wait_ready();
        self.state = ControllerState::Sleeping;
        self.stats.sleep_count += 1;
        Ok(())
    }

    fn release(&mut self) -> Result<(), DisplayError> {
        self.transport_open = false;
        self.state = ControllerState::Released;
        self.base = None;
        self.busy_until = None;
        self.stats.release_count += 1;
        Ok(())
    }
}
