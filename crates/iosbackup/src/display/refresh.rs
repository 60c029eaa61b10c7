//! Refresh-mode state machine
//!
//! The controller owns the panel driver and decides, per frame, whether the
//! glass gets a full refresh (slow, flashes, clears ghosting) or a partial
//! one (fast, diffs against a committed base image).
//!
//! ```text
//! Uninitialized ──first show──▶ Full ──base commit──▶ Partial
//!                                 ▲                      │
//!                                 └── threshold reached ─┘
//! ```

use std::time::{Duration, Instant};

use eink_canvas::PhysicalFrame;
use platform::{ClearPattern, DisplayError, PanelCapabilities, PanelDriver};

/// How the caller wants a frame shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshIntent {
    /// Always a full refresh
    Full,
    /// Partial refresh, establishing the base image first if needed
    Partial,
    /// Partial when a base is already committed, full otherwise
    Auto,
}

/// Hardware waveform currently selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshMode {
    /// Nothing sent to the panel yet (or state lost after a failure)
    #[default]
    Uninitialized,
    /// Full-refresh waveform
    Full,
    /// Partial-refresh waveform with a committed base
    Partial,
}

/// The refresh that was actually performed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshKind {
    /// `display_full`
    Full,
    /// `display_partial`
    Partial,
}

/// Observable controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshState {
    /// Selected waveform
    pub mode: RefreshMode,
    /// A base image is on the panel and partial refreshes may diff against it
    pub partial_base_committed: bool,
    /// Partial refreshes since the last full one
    pub partial_count: u32,
    /// Partial refreshes allowed before a forced full refresh
    pub partial_reset_threshold: u32,
}

/// Controller tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSettings {
    /// Partial refreshes allowed before a forced full refresh
    pub partial_reset_threshold: u32,
    /// Pause between releasing a busy panel and retrying
    pub busy_backoff: Duration,
    /// Longest wait for the BUSY line before a call
    pub busy_timeout: Duration,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            partial_reset_threshold: 100,
            busy_backoff: Duration::from_millis(200),
            busy_timeout: Duration::from_secs(10),
        }
    }
}

const BUSY_POLL: Duration = Duration::from_millis(10);

/// One driver call, replayable after a release
#[derive(Debug, Clone, Copy)]
enum Op<'a> {
    InitFull,
    InitPartial,
    Clear(ClearPattern),
    DisplayFull(&'a [u8]),
    SetBase(&'a [u8]),
    DisplayPartial(&'a [u8]),
}

impl Op<'_> {
    fn name(&self) -> &'static str {
        match self {
            Op::InitFull => "init_full",
            Op::InitPartial => "init_partial",
            Op::Clear(_) => "clear",
            Op::DisplayFull(_) => "display_full",
            Op::SetBase(_) => "display_set_base",
            Op::DisplayPartial(_) => "display_partial",
        }
    }
}

/// Owns a [`PanelDriver`] and runs the refresh state machine on it
pub struct RefreshController<P: PanelDriver> {
    panel: P,
    caps: PanelCapabilities,
    settings: RefreshSettings,
    state: RefreshState,
    shut_down: bool,
}

impl<P: PanelDriver> RefreshController<P> {
    /// Take ownership of `panel`; its capabilities are read once here
    pub fn new(panel: P, settings: RefreshSettings) -> Self {
        let caps = panel.capabilities();
        tracing::debug!(?caps, threshold = settings.partial_reset_threshold, "refresh controller ready");
        Self {
            panel,
            caps,
            settings,
            state: RefreshState {
                mode: RefreshMode::Uninitialized,
                partial_base_committed: false,
                partial_count: 0,
                partial_reset_threshold: settings.partial_reset_threshold.max(1),
            },
            shut_down: false,
        }
    }

    /// Current state machine position
    pub fn state(&self) -> RefreshState {
        self.state
    }

    /// Capabilities captured at construction
    pub fn capabilities(&self) -> PanelCapabilities {
        self.caps
    }

    /// The driven panel
    pub fn panel(&self) -> &P {
        &self.panel
    }

    /// Whether [`shutdown`](Self::shutdown) has run
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Show `frame` on the glass
    ///
    /// On error the state machine drops back to `Uninitialized` so the next
    /// call starts from a clean full initialisation.
    pub fn show(&mut self, frame: &PhysicalFrame, intent: RefreshIntent) -> Result<RefreshKind, DisplayError> {
        if self.shut_down {
            return Err(DisplayError::InvalidState("panel already released"));
        }
        let buffer = frame.to_packed();

        let wants_partial = match intent {
            RefreshIntent::Full => false,
            RefreshIntent::Partial => true,
            RefreshIntent::Auto => self.state.partial_base_committed,
        } && self.caps.partial_refresh;

        let result = if wants_partial && self.state.partial_count >= self.state.partial_reset_threshold {
            tracing::debug!(
                partial_count = self.state.partial_count,
                "partial refresh budget used up; forcing full refresh"
            );
            self.full(&buffer).map(|()| RefreshKind::Full)
        } else if wants_partial {
            self.partial(&buffer).map(|()| RefreshKind::Partial)
        } else {
            self.full(&buffer).map(|()| RefreshKind::Full)
        };

        if let Err(e) = &result {
            tracing::warn!(error = %e, "display refresh failed");
            self.reset_state();
        }
        result
    }

    /// Commit `frame` as the base image and switch to partial mode, so the
    /// next frame can go out as a partial refresh
    pub fn prime_partial_base(&mut self, frame: &PhysicalFrame) -> Result<(), DisplayError> {
        if self.shut_down {
            return Err(DisplayError::InvalidState("panel already released"));
        }
        if !self.caps.partial_refresh {
            return Ok(());
        }
        let buffer = frame.to_packed();
        let result = self.ensure_initialized().and_then(|()| self.commit_base(&buffer));
        if let Err(e) = &result {
            tracing::warn!(error = %e, "priming partial base failed");
            self.reset_state();
        }
        result
    }

    /// Put the panel to sleep and release it
    ///
    /// Runs at most once; later calls are no-ops. Failures are logged and
    /// swallowed.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        if let Err(e) = self.panel.sleep() {
            tracing::warn!(error = %e, "panel sleep failed");
        }
        if let Err(e) = self.panel.release() {
            tracing::warn!(error = %e, "panel release failed");
        }
        self.reset_state();
        tracing::debug!("panel asleep and released");
    }

    fn reset_state(&mut self) {
        self.state.mode = RefreshMode::Uninitialized;
        self.state.partial_base_committed = false;
    }

    fn ensure_initialized(&mut self) -> Result<(), DisplayError> {
        if self.state.mode == RefreshMode::Uninitialized {
            self.call(Op::InitFull)?;
            self.call(Op::Clear(ClearPattern::White))?;
            self.state.mode = RefreshMode::Full;
        }
        Ok(())
    }

    fn full(&mut self, buffer: &[u8]) -> Result<(), DisplayError> {
        self.ensure_initialized()?;
        if self.state.mode != RefreshMode::Full {
            self.call(Op::InitFull)?;
            self.state.mode = RefreshMode::Full;
        }
        self.call(Op::DisplayFull(buffer))?;
        self.state.partial_count = 0;
        self.state.partial_base_committed = false;
        Ok(())
    }

    fn partial(&mut self, buffer: &[u8]) -> Result<(), DisplayError> {
        self.ensure_initialized()?;
        if !self.state.partial_base_committed {
            self.commit_base(buffer)?;
        } else if self.state.mode != RefreshMode::Partial {
            self.enter_partial_waveform()?;
        }
        self.call(Op::DisplayPartial(buffer))?;
        self.state.partial_count += 1;
        Ok(())
    }

    fn commit_base(&mut self, buffer: &[u8]) -> Result<(), DisplayError> {
        if self.state.mode != RefreshMode::Full {
            self.call(Op::InitFull)?;
            self.state.mode = RefreshMode::Full;
        }
        self.call(Op::SetBase(buffer))?;
        self.enter_partial_waveform()?;
        self.state.partial_base_committed = true;
        self.state.partial_count = 0;
        Ok(())
    }

    fn enter_partial_waveform(&mut self) -> Result<(), DisplayError> {
        if self.caps.partial_init {
            self.call(Op::InitPartial)?;
        }
        self.state.mode = RefreshMode::Partial;
        Ok(())
    }

    fn wait_idle(&self) -> Result<(), DisplayError> {
        let deadline = Instant::now() + self.settings.busy_timeout;
        while self.panel.is_busy() {
            if Instant::now() >= deadline {
                return Err(DisplayError::Timeout);
            }
            std::thread::sleep(BUSY_POLL);
        }
        Ok(())
    }

    fn dispatch(&mut self, op: Op<'_>) -> Result<(), DisplayError> {
        self.wait_idle()?;
        match op {
            Op::InitFull => self.panel.init_full(),
            Op::InitPartial => self.panel.init_partial(),
            Op::Clear(pattern) => self.panel.clear(pattern),
            Op::DisplayFull(buf) => self.panel.display_full(buf),
            Op::SetBase(buf) => self.panel.display_set_base(buf),
            Op::DisplayPartial(buf) => self.panel.display_partial(buf),
        }
    }

    /// Run `op`; on `Busy`, release the panel, back off, reacquire and retry
    /// exactly once
    fn call(&mut self, op: Op<'_>) -> Result<(), DisplayError> {
        match self.dispatch(op) {
            Err(e) if e.is_transient() => {
                tracing::info!(op = op.name(), backoff = ?self.settings.busy_backoff, "panel busy; releasing and retrying once");
                if let Err(e) = self.panel.release() {
                    tracing::debug!(error = %e, "release before retry failed");
                }
                std::thread::sleep(self.settings.busy_backoff);
                self.reacquire(op)?;
                self.dispatch(op)
            }
            other => other,
        }
    }

    /// Bring a released panel back to the point where `op` is valid
    fn reacquire(&mut self, op: Op<'_>) -> Result<(), DisplayError> {
        match op {
            Op::InitFull | Op::InitPartial => Ok(()),
            Op::Clear(_) | Op::DisplayFull(_) | Op::SetBase(_) => self.dispatch(Op::InitFull),
            Op::DisplayPartial(buf) => {
                self.dispatch(Op::InitFull)?;
                self.dispatch(Op::SetBase(buf))?;
                if self.caps.partial_init {
                    self.dispatch(Op::InitPartial)?;
                }
                Ok(())
            }
        }
    }
}

impl<P: PanelDriver> Drop for RefreshController<P> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::geometry::Size;
    use platform::mocks::{MockPanel, PanelCall};

    fn frame() -> PhysicalFrame {
        PhysicalFrame::blank(Size::new(16, 4))
    }

    fn controller(threshold: u32) -> (MockPanel, RefreshController<MockPanel>) {
        let panel = MockPanel::new(16, 4);
        let settings = RefreshSettings {
            partial_reset_threshold: threshold,
            busy_backoff: Duration::ZERO,
            ..RefreshSettings::default()
        };
        (panel.clone(), RefreshController::new(panel, settings))
    }

    #[test]
    fn test_first_show_initializes_and_clears() {
        let (panel, mut ctl) = controller(100);
        assert_eq!(ctl.show(&frame(), RefreshIntent::Full), Ok(RefreshKind::Full));
        assert_eq!(
            panel.calls(),
            vec![
                PanelCall::InitFull,
                PanelCall::Clear(ClearPattern::White),
                PanelCall::DisplayFull
            ]
        );
        assert_eq!(ctl.state().mode, RefreshMode::Full);
        assert!(!ctl.state().partial_base_committed);
    }

    #[test]
    fn test_partial_commits_base_once() {
        let (panel, mut ctl) = controller(100);
        ctl.show(&frame(), RefreshIntent::Partial).unwrap();
        ctl.show(&frame(), RefreshIntent::Partial).unwrap();
        assert_eq!(panel.count(PanelCall::DisplaySetBase), 1);
        assert_eq!(panel.count(PanelCall::InitPartial), 1);
        assert_eq!(panel.count(PanelCall::DisplayPartial), 2);
        assert_eq!(ctl.state().partial_count, 2);
        assert!(ctl.state().partial_base_committed);
    }

    #[test]
    fn test_auto_without_base_is_full() {
        let (_, mut ctl) = controller(100);
        assert_eq!(ctl.show(&frame(), RefreshIntent::Auto), Ok(RefreshKind::Full));
        ctl.prime_partial_base(&frame()).unwrap();
        assert_eq!(ctl.show(&frame(), RefreshIntent::Auto), Ok(RefreshKind::Partial));
    }

    #[test]
    fn test_full_drops_the_base() {
        let (_, mut ctl) = controller(100);
        ctl.show(&frame(), RefreshIntent::Partial).unwrap();
        ctl.show(&frame(), RefreshIntent::Full).unwrap();
        let state = ctl.state();
        assert!(!state.partial_base_committed);
        assert_eq!(state.partial_count, 0);
        assert_eq!(state.mode, RefreshMode::Full);
    }

    #[test]
    fn test_full_only_panel_never_goes_partial() {
        let panel = MockPanel::new(16, 4).with_capabilities(PanelCapabilities::FULL_ONLY);
        let mut ctl = RefreshController::new(panel.clone(), RefreshSettings::default());
        assert_eq!(ctl.show(&frame(), RefreshIntent::Partial), Ok(RefreshKind::Full));
        ctl.prime_partial_base(&frame()).unwrap();
        assert_eq!(panel.count(PanelCall::DisplaySetBase), 0);
        assert_eq!(panel.count(PanelCall::DisplayPartial), 0);
    }

    #[test]
    fn test_partial_without_partial_init_uses_full_waveform() {
        let caps = PanelCapabilities {
            partial_refresh: true,
            partial_init: false,
        };
        let panel = MockPanel::new(16, 4).with_capabilities(caps);
        let mut ctl = RefreshController::new(panel.clone(), RefreshSettings::default());
        ctl.show(&frame(), RefreshIntent::Partial).unwrap();
        assert_eq!(panel.count(PanelCall::InitPartial), 0);
        assert_eq!(panel.count(PanelCall::DisplayPartial), 1);
    }

    #[test]
    fn test_busy_init_is_retried_after_release() {
        let (panel, mut ctl) = controller(100);
        panel.fail_busy(PanelCall::InitFull, 1);
        ctl.show(&frame(), RefreshIntent::Full).unwrap();
        assert_eq!(
            panel.calls(),
            vec![
                PanelCall::InitFull,
                PanelCall::Release,
                PanelCall::InitFull,
                PanelCall::Clear(ClearPattern::White),
                PanelCall::DisplayFull
            ]
        );
    }

    #[test]
    fn test_second_busy_propagates_and_resets() {
        let (panel, mut ctl) = controller(100);
        panel.fail_busy(PanelCall::InitFull, 2);
        assert_eq!(ctl.show(&frame(), RefreshIntent::Full), Err(DisplayError::Busy));
        assert_eq!(ctl.state().mode, RefreshMode::Uninitialized);
        assert_eq!(panel.count(PanelCall::InitFull), 2);
        // Recovers on the next call
        assert!(ctl.show(&frame(), RefreshIntent::Full).is_ok());
    }

    #[test]
    fn test_busy_partial_rebuilds_base_before_retry() {
        let (panel, mut ctl) = controller(100);
        ctl.show(&frame(), RefreshIntent::Partial).unwrap();
        panel.reset_calls();
        panel.fail_busy(PanelCall::DisplayPartial, 1);
        ctl.show(&frame(), RefreshIntent::Partial).unwrap();
        assert_eq!(
            panel.calls(),
            vec![
                PanelCall::DisplayPartial,
                PanelCall::Release,
                PanelCall::InitFull,
                PanelCall::DisplaySetBase,
                PanelCall::InitPartial,
                PanelCall::DisplayPartial
            ]
        );
    }

    #[test]
    fn test_busy_line_timeout() {
        let panel = MockPanel::new(16, 4);
        panel.set_busy_line(true);
        let settings = RefreshSettings {
            busy_timeout: Duration::from_millis(30),
            ..RefreshSettings::default()
        };
        let mut ctl = RefreshController::new(panel.clone(), settings);
        assert_eq!(ctl.show(&frame(), RefreshIntent::Full), Err(DisplayError::Timeout));
        assert!(panel.calls().is_empty());
    }

    #[test]
    fn test_shutdown_runs_once() {
        let (panel, mut ctl) = controller(100);
        ctl.show(&frame(), RefreshIntent::Full).unwrap();
        ctl.shutdown();
        ctl.shutdown();
        drop(ctl);
        assert_eq!(panel.count(PanelCall::Sleep), 1);
        assert_eq!(panel.count(PanelCall::Release), 1);
    }

    #[test]
    fn test_shutdown_survives_failures() {
        let (panel, mut ctl) = controller(100);
        panel.fail_busy(PanelCall::Sleep, 1);
        ctl.shutdown();
        assert_eq!(panel.count(PanelCall::Release), 1);
        assert!(ctl.show(&frame(), RefreshIntent::Full).is_err());
    }
}
