//! Waveforms and ghosting build-up on the emulated glass

/// Waveform the controller drove the glass with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    /// Flashing update, wipes residual ghosting
    Full,
    /// Update against the committed base, no flash
    Partial,
}

impl Waveform {
    /// Short label used in frame file names and logs
    pub fn label(self) -> &'static str {
        match self {
            Waveform::Full => "full",
            Waveform::Partial => "partial",
        }
    }
}

/// Residual image left behind by consecutive partial updates
#[derive(Debug, Clone)]
pub struct Ghosting {
    since_full: u32,
    limit: u32,
    rate: f32,
    level: f32,
}

impl Ghosting {
    /// `rate` is added to the level per partial update; `limit` partial
    /// updates are tolerated before a full one is due
    pub fn new(limit: u32, rate: f32) -> Self {
        Self {
            since_full: 0,
            limit,
            rate,
            level: 0.0,
        }
    }

    /// 0.0 (clean) to 1.0
    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn since_full(&self) -> u32 {
        self.since_full
    }

    /// Account for one update; true when a partial update went past the limit
    pub fn apply(&mut self, waveform: Waveform) -> bool {
        match waveform {
            Waveform::Full => {
                self.since_full = 0;
                self.level = 0.0;
                false
            }
            Waveform::Partial => {
                self.since_full = self.since_full.saturating_add(1);
                self.level = (self.level + self.rate).min(1.0);
                self.since_full > self.limit
            }
        }
    }
}
