//! Application UI layer: screen state, text layout and screen renderers.
//!
//! Everything here draws onto any `DrawTarget<Color = BinaryColor>`; the
//! station draws onto an `eink_canvas::LogicalCanvas` and hands the result to
//! the refresh controller.

#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::expect_used)]
// Rendering code casts display dimensions (u32 from embedded-graphics) to i32
// for coordinate arithmetic. Panel sizes are a few hundred pixels.
#![allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]

pub mod notice;
pub mod progress;
pub mod state;
pub mod text;
pub mod widgets;

pub use notice::{NoticeLine, NoticeScreen};
pub use progress::ProgressScreen;
pub use state::{UiState, MAX_TAIL_CHARS, MAX_TAIL_LINES};
pub use text::{FontSize, MonoTextLayout, TextLayout};
