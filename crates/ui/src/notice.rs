//! Static notices shown outside a backup session (boot, last backup,
//! unplugged).

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyleBuilder, StrokeAlignment};

use crate::text::{FontSize, TextLayout};

/// One centred line of a notice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeLine {
    /// Text; an empty string leaves a gap one line high
    pub text: String,
    /// Font size
    pub font: FontSize,
}

impl NoticeLine {
    /// Line at the given size
    pub fn new(text: impl Into<String>, font: FontSize) -> Self {
        Self {
            text: text.into(),
            font,
        }
    }
}

/// A block of centred lines, optionally framed by a 1 px border
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeScreen {
    lines: Vec<NoticeLine>,
    spacing: u32,
    border: bool,
}

impl NoticeScreen {
    /// Empty notice with 6 px line spacing and no border
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            spacing: 6,
            border: false,
        }
    }

    /// Add a line
    #[must_use]
    pub fn line(mut self, text: impl Into<String>, font: FontSize) -> Self {
        self.lines.push(NoticeLine::new(text, font));
        self
    }

    /// Add several lines at one size, skipping blank ones
    #[must_use]
    pub fn lines<I, S>(mut self, lines: I, font: FontSize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.lines.extend(
            lines
                .into_iter()
                .filter(|l| !l.as_ref().trim().is_empty())
                .map(|l| NoticeLine::new(l.as_ref(), font)),
        );
        self
    }

    /// Vertical gap between lines
    #[must_use]
    pub fn spacing(mut self, spacing: u32) -> Self {
        self.spacing = spacing;
        self
    }

    /// Frame the screen with a 1 px border
    #[must_use]
    pub fn bordered(mut self, border: bool) -> Self {
        self.border = border;
        self
    }

    /// Lines in draw order
    pub fn notice_lines(&self) -> &[NoticeLine] {
        &self.lines
    }

    /// Draw onto a cleared `display`
    pub fn render<D, L>(&self, display: &mut D, layout: &L) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
        L: TextLayout,
    {
        let bounds = display.bounding_box();
        display.clear(BinaryColor::Off)?;

        if self.border {
            let style = PrimitiveStyleBuilder::new()
                .stroke_color(BinaryColor::On)
                .stroke_width(1)
                .stroke_alignment(StrokeAlignment::Inside)
                .build();
            bounds.into_styled(style).draw(display)?;
        }

        let sizes: Vec<Size> = self
            .lines
            .iter()
            .map(|l| layout.measure(&l.text, l.font))
            .collect();
        let gaps = self.spacing as i32 * (self.lines.len() as i32 - 1).max(0);
        let total = sizes.iter().map(|s| s.height as i32).sum::<i32>() + gaps;
        let (lw, lh) = (bounds.size.width as i32, bounds.size.height as i32);
        let mut y = (lh - total) / 2;

        for (line, size) in self.lines.iter().zip(&sizes) {
            if !line.text.is_empty() {
                let x = (lw - size.width as i32) / 2;
                layout.draw(display, &line.text, Point::new(x, y), line.font)?;
            }
            y += size.height as i32 + self.spacing as i32;
        }
        Ok(())
    }
}

impl Default for NoticeScreen {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::MonoTextLayout;
    use eink_canvas::{LogicalCanvas, Orientation};

    fn canvas() -> LogicalCanvas {
        LogicalCanvas::new(Size::new(122, 250), Orientation::LandscapeRight)
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let notice = NoticeScreen::new().lines(["Owner", "  ", "", "call me"], FontSize::Medium);
        assert_eq!(notice.notice_lines().len(), 2);
    }

    #[test]
    fn test_border_frames_the_canvas() {
        let mut c = canvas();
        NoticeScreen::new()
            .bordered(true)
            .line("hi", FontSize::Medium)
            .render(&mut c, &MonoTextLayout)
            .unwrap();
        assert_eq!(c.is_ink(0, 0), Some(true));
        assert_eq!(c.is_ink(249, 121), Some(true));
        assert_eq!(c.is_ink(1, 1), Some(false));
    }

    #[test]
    fn test_block_is_vertically_centred() {
        let mut c = canvas();
        NoticeScreen::new()
            .line("X", FontSize::Medium)
            .render(&mut c, &MonoTextLayout)
            .unwrap();
        let rows: Vec<u32> = (0..122)
            .filter(|y| (0..250).any(|x| c.is_ink(x, *y) == Some(true)))
            .collect();
        let first = rows.first().copied().unwrap();
        let last = rows.last().copied().unwrap();
        // 10 px font cell at y = (122 - 10) / 2 = 56
        assert!(first >= 56 && last < 66, "ink rows {first}..{last}");
    }
}
