//! Four-square activity indicator

use embedded_graphics::{
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, StrokeAlignment},
};

/// Number of phases before the indicator wraps
pub const PHASES: u8 = 4;

const SQUARE: u32 = 6;
const GAP: u32 = 6;

/// Row of four squares, one of them filled according to the phase
pub struct ActivityIndicator {
    phase: u8,
}

impl ActivityIndicator {
    /// Indicator at `phase` (taken modulo 4)
    pub fn new(phase: u8) -> Self {
        Self {
            phase: phase % PHASES,
        }
    }

    /// Total width of the row
    pub const fn width() -> u32 {
        PHASES as u32 * SQUARE + (PHASES as u32 - 1) * GAP
    }

    /// Draw with the first square's top-left at `origin`
    pub fn render<D>(&self, display: &mut D, origin: Point) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let outline = PrimitiveStyleBuilder::new()
            .stroke_color(BinaryColor::On)
            .stroke_width(1)
            .stroke_alignment(StrokeAlignment::Inside)
            .build();
        for i in 0..PHASES {
            let x = origin.x + i32::from(i) * (SQUARE + GAP) as i32;
            let square = Rectangle::new(Point::new(x, origin.y), Size::new(SQUARE, SQUARE));
            if i == self.phase {
                square
                    .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
                    .draw(display)?;
            } else {
                square.into_styled(outline).draw(display)?;
            }
        }
        Ok(())
    }
}
