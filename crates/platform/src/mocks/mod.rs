//! Mock implementations for testing
//!
//! [`MockPanel`] records every driver call into a log shared by all of its
//! clones, so a test can hand one clone to the code under test and inspect
//! the log through another.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use embedded_graphics::geometry::Size;

use crate::display::check_buffer_len;
use crate::{ClearPattern, DisplayError, PanelCapabilities, PanelDriver};

/// One recorded driver call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelCall {
    /// `init_full`
    InitFull,
    /// `init_partial`
    InitPartial,
    /// `clear`
    Clear(ClearPattern),
    /// `display_full`
    DisplayFull,
    /// `display_set_base`
    DisplaySetBase,
    /// `display_partial`
    DisplayPartial,
    /// `sleep`
    Sleep,
    /// `release`
    Release,
}

impl PanelCall {
    /// Whether this call pushes a frame to the glass
    pub fn is_display(self) -> bool {
        matches!(
            self,
            PanelCall::DisplayFull | PanelCall::DisplaySetBase | PanelCall::DisplayPartial
        )
    }
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<PanelCall>,
    busy_failures: HashMap<PanelCall, usize>,
    busy_line: bool,
    display_delay: Duration,
    last_frame: Option<Vec<u8>>,
}

/// Mock panel that records calls and can inject `Busy` failures
#[derive(Debug, Clone)]
pub struct MockPanel {
    size: Size,
    capabilities: PanelCapabilities,
    state: Arc<Mutex<MockState>>,
}

impl MockPanel {
    /// Create a mock panel with the given physical size and full capabilities
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Size::new(width, height),
            capabilities: PanelCapabilities::FULL_AND_PARTIAL,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Replace the capability descriptor
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: PanelCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Make every display call sleep for `delay` (simulated refresh time)
    #[must_use]
    pub fn with_display_delay(self, delay: Duration) -> Self {
        self.lock().display_delay = delay;
        self
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail the next `times` attempts of `call` with `DisplayError::Busy`
    pub fn fail_busy(&self, call: PanelCall, times: usize) {
        *self.lock().busy_failures.entry(call).or_default() += times;
    }

    /// Drive the BUSY line level reported by `is_busy`
    pub fn set_busy_line(&self, busy: bool) {
        self.lock().busy_line = busy;
    }

    /// Snapshot of every recorded call, including failed attempts
    pub fn calls(&self) -> Vec<PanelCall> {
        self.lock().calls.clone()
    }

    /// Number of recorded calls of one kind
    pub fn count(&self, call: PanelCall) -> usize {
        self.lock().calls.iter().filter(|c| **c == call).count()
    }

    /// Number of recorded display calls of any kind
    pub fn display_count(&self) -> usize {
        self.lock().calls.iter().filter(|c| c.is_display()).count()
    }

    /// Display calls in order, other calls filtered out
    pub fn display_calls(&self) -> Vec<PanelCall> {
        self.lock()
            .calls
            .iter()
            .copied()
            .filter(|c| c.is_display())
            .collect()
    }

    /// Last buffer passed to any display call
    pub fn last_frame(&self) -> Option<Vec<u8>> {
        self.lock().last_frame.clone()
    }

    /// Forget recorded calls
    pub fn reset_calls(&self) {
        self.lock().calls.clear();
    }

    fn record(&self, call: PanelCall) -> Result<(), DisplayError> {
        let mut state = self.lock();
        state.calls.push(call);
        if let Some(remaining) = state.busy_failures.get_mut(&call) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(DisplayError::Busy);
            }
        }
        Ok(())
    }

    fn show(&self, call: PanelCall, buffer: &[u8]) -> Result<(), DisplayError> {
        check_buffer_len(self.buffer_len(), buffer)?;
        self.record(call)?;
        let delay = {
            let mut state = self.lock();
            state.last_frame = Some(buffer.to_vec());
            state.display_delay
        };
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        Ok(())
    }
}

impl PanelDriver for MockPanel {
    fn capabilities(&self) -> PanelCapabilities {
        self.capabilities
    }

    fn size(&self) -> Size {
        self.size
    }

    fn is_busy(&self) -> bool {
        self.lock().busy_line
    }

    fn init_full(&mut self) -> Result<(), DisplayError> {
        self.record(PanelCall::InitFull)
    }

    fn init_partial(&mut self) -> Result<(), DisplayError> {
        self.record(PanelCall::InitPartial)
    }

    fn clear(&mut self, pattern: ClearPattern) -> Result<(), DisplayError> {
        self.record(PanelCall::Clear(pattern))
    }

    fn display_full(&mut self, buffer: &[u8]) -> Result<(), DisplayError> {
        self.show(PanelCall::DisplayFull, buffer)
    }

    fn display_set_base(&mut self, buffer: &[u8]) -> Result<(), DisplayError> {
        self.show(PanelCall::DisplaySetBase, buffer)
    }

    fn display_partial(&mut self, buffer: &[u8]) -> Result<(), DisplayError> {
        self.show(PanelCall::DisplayPartial, buffer)
    }

    fn sleep(&mut self) -> Result<(), DisplayError> {
        self.record(PanelCall::Sleep)
    }

    fn release(&mut self) -> Result<(), DisplayError> {
        self.record(PanelCall::Release)
    }
}
