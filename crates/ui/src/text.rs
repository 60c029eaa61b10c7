//! Text layout: measuring and drawing strings in one of three sizes.
//!
//! Renderers only see the [`TextLayout`] trait. [`MonoTextLayout`] is the
//! built-in implementation on top of the embedded-graphics mono fonts.

use embedded_graphics::mono_font::ascii::{FONT_5X8, FONT_6X10, FONT_7X14_BOLD};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};

/// Font sizes used by the screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontSize {
    /// Header clock, tail lines, completion block
    Small,
    /// Subtitles, percent label, notices
    Medium,
    /// Header title
    Large,
}

/// Measures and draws single lines of text
pub trait TextLayout {
    /// Pixel size of `text` rendered at `font`; `(0, font height)` for an
    /// empty string
    fn measure(&self, text: &str, font: FontSize) -> Size;

    /// Draw `text` with its bounding box's top-left corner at `top_left`
    fn draw<D>(&self, target: &mut D, text: &str, top_left: Point, font: FontSize) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>;
}

/// [`TextLayout`] backed by embedded-graphics mono fonts
#[derive(Debug, Clone, Copy, Default)]
pub struct MonoTextLayout;

impl MonoTextLayout {
    /// Font backing each size
    pub fn font(size: FontSize) -> &'static MonoFont<'static> {
        match size {
            FontSize::Small => &FONT_5X8,
            FontSize::Medium => &FONT_6X10,
            FontSize::Large => &FONT_7X14_BOLD,
        }
    }
}

impl TextLayout for MonoTextLayout {
    fn measure(&self, text: &str, font: FontSize) -> Size {
        let f = Self::font(font);
        let chars = text.chars().count() as u32;
        let width = if chars == 0 {
            0
        } else {
            chars * f.character_size.width + (chars - 1) * f.character_spacing
        };
        Size::new(width, f.character_size.height)
    }

    fn draw<D>(&self, target: &mut D, text: &str, top_left: Point, font: FontSize) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let style = MonoTextStyle::new(Self::font(font), BinaryColor::On);
        Text::with_baseline(text, top_left, style, Baseline::Top).draw(target)?;
        Ok(())
    }
}

/// Non-blank lines of `text`
pub(crate) fn visible_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().filter(|l| !l.trim().is_empty())
}
