//! The live backup screen.
//!
//! Layout on a 250×122 landscape canvas:
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │iOS Backup Machine           14:02 / 17 oct │  header
//! │                                            │
//! │┌──────────────────42%─────────────────────┐│  y = 46
//! │└──────────────────────────────────────────┘│
//! │         Backing up (encrypted)...          │  y = 70
//! │tail line                                   │
//! │                                  ■ □ □ □   │  indicator
//! └────────────────────────────────────────────┘
//! ```

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

use crate::state::UiState;
use crate::text::{visible_lines, FontSize, TextLayout};
use crate::widgets::{ActivityIndicator, ProgressBar};

const MARGIN: i32 = 4;
const BAR_Y: i32 = 46;
const BAR_HEIGHT: u32 = 18;
const HEADER_BOTTOM: i32 = 26;
const TAIL_STEP: i32 = 14;

/// Renders [`UiState`] snapshots
pub struct ProgressScreen<'a, L> {
    layout: &'a L,
    title: &'a str,
}

impl<'a, L: TextLayout> ProgressScreen<'a, L> {
    /// Screen with the given header title
    pub fn new(layout: &'a L, title: &'a str) -> Self {
        Self { layout, title }
    }

    /// Draw `state` onto a cleared `display`
    ///
    /// `phase` drives the activity indicator, `timestamp` is shown in the
    /// header's top-right corner.
    pub fn render<D>(&self, display: &mut D, state: &UiState, phase: u8, timestamp: &str) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let size = display.bounding_box().size;
        let (lw, lh) = (size.width as i32, size.height as i32);
        display.clear(BinaryColor::Off)?;

        // Bottom of the content drawn so far, for placing tail lines.
        let mut content_bottom = BAR_Y;

        if state.show_header {
            self.layout
                .draw(display, self.title, Point::new(MARGIN, 2), FontSize::Large)?;
            let ts = self.layout.measure(timestamp, FontSize::Small);
            self.layout.draw(
                display,
                timestamp,
                Point::new(lw - ts.width as i32 - MARGIN, 2),
                FontSize::Small,
            )?;

            match state.percent {
                None => {
                    let lines: Vec<&str> = visible_lines(&state.subtitle).collect();
                    let sizes: Vec<Size> = lines
                        .iter()
                        .map(|l| self.layout.measure(l, FontSize::Medium))
                        .collect();
                    let total: i32 = sizes.iter().map(|s| s.height as i32).sum::<i32>()
                        + 2 * (lines.len() as i32 - 1).max(0);
                    let bottom = lh - 20;
                    let mut y = HEADER_BOTTOM + ((bottom - HEADER_BOTTOM) - total).max(0) / 2;
                    for (line, s) in lines.iter().zip(&sizes) {
                        self.layout.draw(
                            display,
                            line,
                            Point::new((lw - s.width as i32) / 2, y),
                            FontSize::Medium,
                        )?;
                        y += s.height as i32 + 2;
                    }
                }
                Some(percent) => {
                    let bar_width = (lw - 2 * MARGIN).max(0) as u32;
                    ProgressBar::new(bar_width, BAR_HEIGHT).percent(percent).render(
                        display,
                        self.layout,
                        Point::new(MARGIN, BAR_Y),
                    )?;

                    let mut y = BAR_Y + BAR_HEIGHT as i32 + 6;
                    for line in visible_lines(&state.subtitle) {
                        let s = self.layout.measure(line, FontSize::Medium);
                        self.layout.draw(
                            display,
                            line,
                            Point::new((lw - s.width as i32) / 2, y),
                            FontSize::Medium,
                        )?;
                        y += s.height as i32 + 2;
                    }
                    content_bottom = y;
                }
            }
        } else if !state.subtitle.is_empty() {
            let s = self.layout.measure(&state.subtitle, FontSize::Medium);
            self.layout.draw(
                display,
                &state.subtitle,
                Point::new((lw - s.width as i32) / 2, 6),
                FontSize::Medium,
            )?;
        }

        if let Some(block) = state.center_block.as_deref() {
            let lines: Vec<&str> = visible_lines(block.trim()).collect();
            let heights: i32 = lines
                .iter()
                .map(|l| self.layout.measure(l, FontSize::Small).height as i32)
                .sum();
            let total = heights + 4 * (lines.len() as i32 - 1).max(0);
            let mut y = (lh - total) / 2;
            for line in lines {
                let s = self.layout.measure(line, FontSize::Small);
                self.layout.draw(
                    display,
                    line,
                    Point::new((lw - s.width as i32) / 2, y),
                    FontSize::Small,
                )?;
                y += s.height as i32 + 4;
            }
        }

        if state.show_header && !state.tail_lines.is_empty() {
            for (i, line) in state.tail_lines.iter().enumerate() {
                let y = content_bottom + i as i32 * TAIL_STEP;
                self.layout
                    .draw(display, line, Point::new(MARGIN, y), FontSize::Small)?;
            }
        }

        if state.animate && state.center_block.is_none() && state.show_header {
            let origin = Point::new(lw - 50, lh - 16);
            ActivityIndicator::new(phase).render(display, origin)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::MonoTextLayout;
    use eink_canvas::{LogicalCanvas, Orientation};

    const PANEL: Size = Size::new(122, 250);

    fn render(state: &UiState, phase: u8) -> LogicalCanvas {
        let mut canvas = LogicalCanvas::new(PANEL, Orientation::LandscapeRight);
        ProgressScreen::new(&MonoTextLayout, "iOS Backup Machine")
            .render(&mut canvas, state, phase, "14:02 / 17 oct 2026")
            .unwrap();
        canvas
    }

    fn square_filled(canvas: &LogicalCanvas, index: u32) -> bool {
        // Centre pixel of indicator square `index`; outlines leave it white.
        let x = 250 - 50 + index * 12 + 3;
        canvas.is_ink(x, 122 - 16 + 3) == Some(true)
    }

    #[test]
    fn test_indicator_follows_phase() {
        let state = UiState::progress("Backing up (encrypted)...", 42);
        for phase in 0..4u8 {
            let canvas = render(&state, phase);
            for i in 0..4u32 {
                assert_eq!(square_filled(&canvas, i), u32::from(phase) == i);
            }
        }
    }

    #[test]
    fn test_no_indicator_without_animation() {
        let canvas = render(&UiState::message("Waiting for iPhone..."), 0);
        assert!(!square_filled(&canvas, 0));
    }

    #[test]
    fn test_progress_fill_tracks_percent() {
        // Inside the bar, left of the label: filled at 42%, empty at 0%.
        let probe = (10, 55);
        let full = render(&UiState::progress("x", 42), 0);
        assert_eq!(full.is_ink(probe.0, probe.1), Some(true));
        let empty = render(&UiState::progress("x", 0), 0);
        assert_eq!(empty.is_ink(probe.0, probe.1), Some(false));
    }

    #[test]
    fn test_completion_screen_has_no_header() {
        let state = UiState::centered("Backup completed.\n50% memory usage.");
        let canvas = render(&state, 0);
        // Header row stays blank.
        assert!((0..250).all(|x| canvas.is_ink(x, 5) == Some(false)));
        assert!(canvas.image().pixels().any(|p| p.0[0] == 0));
    }
}
