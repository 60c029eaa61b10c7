//! Display pipeline: render a [`UiState`] onto a logical canvas, rotate it
//! into the panel's physical frame and hand it to the refresh controller.

pub mod refresh;

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};
use embedded_graphics::geometry::Size;
use eink_canvas::{LogicalCanvas, Orientation, PhysicalFrame};
use platform::{DisplayError, PanelDriver};
use ui::{MonoTextLayout, NoticeScreen, ProgressScreen, UiState};

pub use refresh::{RefreshController, RefreshIntent, RefreshKind, RefreshMode, RefreshSettings, RefreshState};

/// Screen shared by the session driver and the animator
pub type SharedScreen<P> = Arc<Mutex<Screen<P>>>;

/// Header timestamp, e.g. `14:02 / 17 oct 2026`
pub fn header_timestamp(now: DateTime<Local>) -> String {
    now.format("%H:%M / %d %b %Y").to_string().to_lowercase()
}

/// Timestamp used in completion and notice text, e.g. `14:02 / 17 Oct 2026`
pub fn display_timestamp(now: DateTime<Local>) -> String {
    now.format("%H:%M / %d %b %Y").to_string()
}

/// Intent matching a UI snapshot: live progress goes partial, everything
/// else partial only once a base is committed
pub fn intent_for(state: &UiState) -> RefreshIntent {
    if state.prefers_partial() {
        RefreshIntent::Partial
    } else {
        RefreshIntent::Auto
    }
}

type TimestampFn = Box<dyn Fn() -> String + Send>;

/// Renderer, orientation transform and refresh controller in one place
pub struct Screen<P: PanelDriver> {
    controller: RefreshController<P>,
    orientation: Orientation,
    physical: Size,
    layout: MonoTextLayout,
    title: String,
    timestamp: TimestampFn,
}

impl<P: PanelDriver> Screen<P> {
    /// Screen drawing through `controller` in `orientation`
    pub fn new(controller: RefreshController<P>, orientation: Orientation) -> Self {
        let physical = controller.panel().size();
        Self {
            controller,
            orientation,
            physical,
            layout: MonoTextLayout,
            title: platform::config::app_title().to_string(),
            timestamp: Box::new(|| header_timestamp(Local::now())),
        }
    }

    /// Replace the header clock (tests pin it to a fixed string)
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: impl Fn() -> String + Send + 'static) -> Self {
        self.timestamp = Box::new(timestamp);
        self
    }

    /// Wrap in the shared handle used by the animator
    pub fn into_shared(self) -> SharedScreen<P> {
        Arc::new(Mutex::new(self))
    }

    /// Logical canvas dimensions
    pub fn logical_size(&self) -> Size {
        self.orientation.logical_size(self.physical)
    }

    /// Physical frame for `state` without touching the panel
    pub fn render(&self, state: &UiState, phase: u8) -> PhysicalFrame {
        let mut canvas = LogicalCanvas::new(self.physical, self.orientation);
        let timestamp = (self.timestamp)();
        if let Err(never) = ProgressScreen::new(&self.layout, &self.title).render(&mut canvas, state, phase, &timestamp) {
            match never {}
        }
        canvas.to_physical(self.physical)
    }

    /// Physical frame for a notice
    pub fn render_notice(&self, notice: &NoticeScreen) -> PhysicalFrame {
        let mut canvas = LogicalCanvas::new(self.physical, self.orientation);
        if let Err(never) = notice.render(&mut canvas, &self.layout) {
            match never {}
        }
        canvas.to_physical(self.physical)
    }

    /// Render `state` and push it to the panel
    pub fn draw(&mut self, state: &UiState, phase: u8, intent: RefreshIntent) -> Result<RefreshKind, DisplayError> {
        let frame = self.render(state, phase);
        self.controller.show(&frame, intent)
    }

    /// Render a notice and push it with a full refresh
    pub fn draw_notice(&mut self, notice: &NoticeScreen) -> Result<RefreshKind, DisplayError> {
        let frame = self.render_notice(notice);
        self.controller.show(&frame, RefreshIntent::Full)
    }

    /// Commit a blank base so the first content frame can be partial
    pub fn prime_partial_base(&mut self) -> Result<(), DisplayError> {
        self.controller.prime_partial_base(&PhysicalFrame::blank(self.physical))
    }

    /// Sleep and release the panel (once)
    pub fn shutdown(&mut self) {
        self.controller.shutdown();
    }

    /// Refresh controller state
    pub fn refresh_state(&self) -> RefreshState {
        self.controller.state()
    }

    /// The driven panel
    pub fn panel(&self) -> &P {
        self.controller.panel()
    }
}
