//! UI state snapshot shared between the session and the animator.

/// Maximum number of diagnostic tail lines on screen.
pub const MAX_TAIL_LINES: usize = 3;

/// Tail lines are truncated to this many characters.
pub const MAX_TAIL_CHARS: usize = 44;

/// Everything needed to render one progress-screen frame.
///
/// Writers replace the whole value; readers clone it before rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    /// Status text, may contain `\n`.
    pub subtitle: String,
    /// Backup progress in `0..=100`, `None` before the first percent.
    pub percent: Option<u8>,
    /// Draw the rotating activity indicator.
    pub animate: bool,
    /// Centred multi-line block (completion screen).
    pub center_block: Option<String>,
    /// Diagnostic lines under the progress area.
    pub tail_lines: heapless::Vec<String, MAX_TAIL_LINES>,
    /// Draw the title/time header.
    pub show_header: bool,
}

impl UiState {
    /// Header plus a centred status message, no animation.
    pub fn message(subtitle: impl Into<String>) -> Self {
        Self {
            subtitle: subtitle.into(),
            percent: None,
            animate: false,
            center_block: None,
            tail_lines: heapless::Vec::new(),
            show_header: true,
        }
    }

    /// Header, progress bar and subtitle, animated.
    pub fn progress(subtitle: impl Into<String>, percent: u8) -> Self {
        Self {
            percent: Some(percent.min(100)),
            animate: true,
            ..Self::message(subtitle)
        }
    }

    /// Headerless screen with a centred block.
    pub fn centered(block: impl Into<String>) -> Self {
        Self {
            subtitle: String::new(),
            center_block: Some(block.into()),
            show_header: false,
            ..Self::message("")
        }
    }

    /// Set the animation flag.
    #[must_use]
    pub fn animated(mut self, animate: bool) -> Self {
        self.animate = animate;
        self
    }

    /// Append a tail line, truncated to [`MAX_TAIL_CHARS`]; lines beyond
    /// [`MAX_TAIL_LINES`] are dropped.
    #[must_use]
    pub fn with_tail(mut self, line: &str) -> Self {
        let truncated: String = line.chars().take(MAX_TAIL_CHARS).collect();
        let _ = self.tail_lines.push(truncated);
        self
    }

    /// Set the percent, clamped to 100.
    pub fn set_percent(&mut self, percent: Option<u8>) {
        self.percent = percent.map(|p| p.min(100));
    }

    /// Whether this frame is a live-progress update suited to a partial
    /// refresh.
    pub fn prefers_partial(&self) -> bool {
        self.show_header && self.percent.is_some()
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::message("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_animated_and_clamped() {
        let s = UiState::progress("Backing up", 150);
        assert_eq!(s.percent, Some(100));
        assert!(s.animate);
        assert!(s.prefers_partial());
    }

    #[test]
    fn test_message_prefers_full() {
        let s = UiState::message("Waiting for iPhone...");
        assert!(!s.prefers_partial());
        assert!(!s.animate);
    }

    #[test]
    fn test_centered_has_no_header() {
        let s = UiState::centered("done");
        assert!(!s.show_header);
        assert!(!s.prefers_partial());
        assert_eq!(s.center_block.as_deref(), Some("done"));
    }

    #[test]
    fn test_tail_lines_are_bounded() {
        let long = "x".repeat(80);
        let s = UiState::message("e")
            .with_tail(&long)
            .with_tail("b")
            .with_tail("c")
            .with_tail("d");
        assert_eq!(s.tail_lines.len(), MAX_TAIL_LINES);
        assert_eq!(s.tail_lines[0].chars().count(), MAX_TAIL_CHARS);
        assert_eq!(s.tail_lines[2], "c");
    }

    #[test]
    fn test_set_percent_clamps() {
        let mut s = UiState::default();
        s.set_percent(Some(101));
        assert_eq!(s.percent, Some(100));
        s.set_percent(None);
        assert_eq!(s.percent, None);
    }
}
