//! Emulated controller lifecycle
//!
//! Real SSD1680-class controllers reject frame writes until they have been
//! initialised, forget their waveform selection in deep sleep, and lose all
//! state when the transport is released. The emulator enforces the same
//! ordering so driver misuse shows up in tests.

/// Waveform set selected by the last init
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitMode {
    /// `init_full`
    Full,
    /// `init_partial`
    Partial,
}

/// Lifecycle state of the emulated controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
    /// Transport closed, controller unpowered
    #[default]
    Released,
    /// Powered and initialised with a waveform set
    Ready(InitMode),
    /// Deep sleep; requires re-init
    Sleeping,
}

impl ControllerState {
    /// Check if frame writes are accepted
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Waveform set, if initialised
    pub fn init_mode(&self) -> Option<InitMode> {
        match self {
            Self::Ready(mode) => Some(*mode),
            _ => None,
        }
    }
}
