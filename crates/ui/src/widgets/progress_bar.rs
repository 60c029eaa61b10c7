//! Progress bar with a centred percent label

use embedded_graphics::{
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, StrokeAlignment},
};

use crate::text::{FontSize, TextLayout};

/// Progress bar component
pub struct ProgressBar {
    width: u32,
    height: u32,
    percent: u8,
    border: u32,
}

impl ProgressBar {
    /// Create a new progress bar
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            percent: 0,
            border: 2,
        }
    }

    /// Set progress (0 to 100)
    #[must_use]
    pub fn percent(mut self, percent: u8) -> Self {
        self.percent = percent.min(100);
        self
    }

    /// Get dimensions
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Width of the filled portion in pixels
    pub fn fill_width(&self) -> u32 {
        let inner = self.width.saturating_sub(2 * self.border);
        inner * u32::from(self.percent) / 100
    }

    /// Render progress bar and label to display
    pub fn render<D, L>(&self, display: &mut D, layout: &L, position: Point) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
        L: TextLayout,
    {
        let outline = PrimitiveStyleBuilder::new()
            .stroke_color(BinaryColor::On)
            .stroke_width(self.border)
            .stroke_alignment(StrokeAlignment::Inside)
            .build();
        Rectangle::new(position, self.size())
            .into_styled(outline)
            .draw(display)?;

        let fill_width = self.fill_width();
        if fill_width > 0 {
            let b = self.border as i32;
            Rectangle::new(
                position + Point::new(b, b),
                Size::new(fill_width, self.height.saturating_sub(2 * self.border)),
            )
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(display)?;
        }

        // Label on a white patch so it stays legible over the fill.
        let label = format!("{}%", self.percent);
        let text = layout.measure(&label, FontSize::Medium);
        let tx = position.x + (self.width as i32 - text.width as i32) / 2;
        let ty = position.y + (self.height as i32 - text.height as i32) / 2;
        Rectangle::new(Point::new(tx - 2, ty - 1), text + Size::new(4, 2))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::Off))
            .draw(display)?;
        layout.draw(display, &label, Point::new(tx, ty), FontSize::Medium)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_creation() {
        let bar = ProgressBar::new(242, 18);
        assert_eq!(bar.size(), Size::new(242, 18));
        assert_eq!(bar.fill_width(), 0);
    }

    #[test]
    fn test_percent_clamping() {
        let bar = ProgressBar::new(104, 18).percent(250);
        assert_eq!(bar.percent, 100);
        assert_eq!(bar.fill_width(), 100);
    }

    #[test]
    fn test_half_fill() {
        let bar = ProgressBar::new(104, 18).percent(50);
        assert_eq!(bar.fill_width(), 50);
    }
}
