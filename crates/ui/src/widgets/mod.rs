//! Reusable drawing pieces.

mod indicator;
mod progress_bar;

pub use indicator::{ActivityIndicator, PHASES};
pub use progress_bar::ProgressBar;
