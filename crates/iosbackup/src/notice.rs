//! One-shot notices drawn outside a backup session
//!
//! Each is a single full refresh followed by panel sleep.

use std::path::Path;

use chrono::{DateTime, Local};
use platform::{DisplayError, PanelDriver};
use ui::{FontSize, NoticeScreen};

use crate::display::{display_timestamp, header_timestamp, Screen};

/// Owner card shown at boot
pub fn boot_notice(owner_lines: &[String]) -> NoticeScreen {
    NoticeScreen::new()
        .bordered(true)
        .spacing(6)
        .lines(owner_lines, FontSize::Medium)
}

/// "Last backup:" with the time of the newest backup, if any
pub fn last_backup_notice(latest: Option<DateTime<Local>>) -> NoticeScreen {
    let when = latest.map_or_else(|| "No backups found".to_string(), display_timestamp);
    NoticeScreen::new()
        .spacing(8)
        .line("Last backup:", FontSize::Large)
        .line(when, FontSize::Medium)
}

/// Shown when the phone is unplugged mid-backup
///
/// The timestamp goes on its own line; the full sentence does not fit the
/// 250 px landscape width in the large font.
pub fn unplug_notice(now: DateTime<Local>, owner_lines: &[String]) -> NoticeScreen {
    NoticeScreen::new()
        .bordered(true)
        .spacing(6)
        .line("Backup interrupted at", FontSize::Large)
        .line(header_timestamp(now), FontSize::Large)
        .line("", FontSize::Medium)
        .lines(owner_lines, FontSize::Medium)
}

/// Modification time of the most recently modified sub-directory of `root`
///
/// Symlinks are not followed. Unreadable entries are skipped.
pub fn latest_backup_time(root: &Path) -> Option<DateTime<Local>> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(error = %e, dir = %root.display(), "cannot list backup directory");
            return None;
        }
    };
    entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
        .filter_map(|entry| entry.metadata().and_then(|m| m.modified()).ok())
        .max()
        .map(DateTime::<Local>::from)
}

/// Draw `notice` with a full refresh, then sleep and release the panel
pub fn show_notice<P: PanelDriver>(screen: &mut Screen<P>, notice: &NoticeScreen) -> Result<(), DisplayError> {
    let result = screen.draw_notice(notice).map(|_| ());
    screen.shutdown();
    result
}
