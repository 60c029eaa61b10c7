//! Session driver: wait for a phone, run one backup, report the result
//!
//! Every path out of [`Session::run`] goes through the same shutdown
//! sequence: stop the animator, draw the terminal screen, put the panel to
//! sleep and release it.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use backup_stream::{ParserEvent, ParserOptions, StreamParser};
use chrono::Local;
use platform::PanelDriver;
use ui::UiState;

use crate::animator::{Animator, SharedUi, STOP_TIMEOUT};
use crate::context::SessionContext;
use crate::display::{display_timestamp, intent_for, RefreshIntent, SharedScreen};
use crate::lock;
use crate::logging::SessionLog;
use crate::process::{BackupRun, BackupTool, DeviceProbe, DiskUsage};

/// Shown when the tool fails without a recognisable error line
pub const UNKNOWN_FAILURE: &str = "Unknown error.\nCheck logs.";

pub const WAITING_FOR_DEVICE: &str = "Waiting for iPhone...";
pub const DEVICE_DETECTED: &str = "Device detected. Preparing...";
pub const WELCOME: &str = "Welcome.\nEnter device password when prompted.\nBackup will start soon.";
pub const STARTING: &str = "Starting backup...";
pub const PREPARING: &str = "Preparing backup...";
pub const FOLDER_NOT_FOUND: &str = "Backup folder not found.";

const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Progress subtitle for the current encryption flag
pub fn backing_up_subtitle(encrypted: bool) -> &'static str {
    if encrypted {
        "Backing up (encrypted)..."
    } else {
        "Backing up (not encrypted)..."
    }
}

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Tool exited with status 0
    Completed {
        /// Disk usage in percent, if `df` could tell
        usage: Option<u8>,
    },
    /// Tool printed an error line or exited non-zero
    BackupFailed {
        code: Option<i32>,
        message: String,
        tail: String,
        /// Last percent seen before the failure
        percent: Option<u8>,
    },
    /// The destination is not mounted
    PreconditionFailed {
        /// Marker file that was expected
        missing: PathBuf,
    },
    /// SIGINT / SIGTERM
    Interrupted,
}

impl SessionOutcome {
    /// Process exit status
    pub fn exit_code(&self) -> u8 {
        match self {
            SessionOutcome::Completed { .. } => 0,
            SessionOutcome::BackupFailed { .. } => 1,
            SessionOutcome::PreconditionFailed { .. } => 2,
            SessionOutcome::Interrupted => 130,
        }
    }

    /// Screen shown after the session, `None` for a silent exit
    pub fn terminal_screen(&self, timestamp: &str, owner_lines: &[String]) -> Option<UiState> {
        match self {
            SessionOutcome::Completed { usage } => {
                Some(UiState::centered(completion_block(timestamp, *usage, owner_lines)))
            }
            SessionOutcome::BackupFailed {
                message,
                tail,
                percent,
                ..
            } => {
                let mut state = UiState::message(format!("Error: {message}")).with_tail(tail);
                state.set_percent(Some(percent.unwrap_or(0)));
                Some(state)
            }
            SessionOutcome::PreconditionFailed { .. } => Some(UiState::message(FOLDER_NOT_FOUND)),
            SessionOutcome::Interrupted => None,
        }
    }
}

fn usage_text(usage: Option<u8>) -> String {
    usage.map_or_else(|| "n/a".to_string(), |u| format!("{u}%"))
}

/// Centre block of the completion screen
pub fn completion_block(timestamp: &str, usage: Option<u8>, owner_lines: &[String]) -> String {
    let mut block = format!(
        "Backup completed at {timestamp}.\n{} memory usage.\n \n",
        usage_text(usage)
    );
    block.push_str(&owner_lines.join("\n"));
    block
}

/// One backup session
pub struct Session<'a, P, D, T, U>
where
    P: PanelDriver + 'static,
{
    ctx: &'a SessionContext,
    screen: SharedScreen<P>,
    ui: SharedUi,
    animator: Option<Animator<P>>,
    probe: D,
    tool: T,
    disk: U,
    log: SessionLog,
}

impl<'a, P, D, T, U> Session<'a, P, D, T, U>
where
    P: PanelDriver + 'static,
    D: DeviceProbe,
    T: BackupTool,
    U: DiskUsage,
{
    pub fn new(ctx: &'a SessionContext, screen: SharedScreen<P>, probe: D, tool: T, disk: U, log: SessionLog) -> Self {
        Self {
            ctx,
            screen,
            ui: Arc::new(Mutex::new(UiState::default())),
            animator: None,
            probe,
            tool,
            disk,
            log,
        }
    }

    /// Handle on the UI snapshot (the last state drawn)
    pub fn ui(&self) -> SharedUi {
        Arc::clone(&self.ui)
    }

    /// Run to completion and shut the panel down
    pub fn run(mut self) -> SessionOutcome {
        let outcome = self.drive();
        self.finish(&outcome);
        outcome
    }

    fn interrupted(&self) -> bool {
        self.ctx.interrupt.is_set()
    }

    fn phase(&self) -> u8 {
        self.animator.as_ref().map_or(0, Animator::phase)
    }

    /// Replace the shared snapshot and draw it
    fn publish(&self, state: UiState, intent: RefreshIntent) {
        let phase = self.phase();
        let mut screen = lock(&self.screen);
        lock(&self.ui).clone_from(&state);
        if let Err(e) = screen.draw(&state, phase, intent) {
            tracing::warn!(error = %e, subtitle = %state.subtitle, "draw failed");
        }
    }

    fn show(&self, state: UiState) {
        let intent = intent_for(&state);
        self.publish(state, intent);
    }

    /// Sleep up to `total`, waking early on interrupt; false if interrupted
    fn pause(&self, total: Duration) -> bool {
        let deadline = Instant::now() + total;
        loop {
            if self.interrupted() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep(SLEEP_SLICE.min(deadline - now));
        }
    }

    fn wait_for_device(&mut self) -> bool {
        self.show(UiState::message(WAITING_FOR_DEVICE));
        tracing::info!("waiting for device");
        loop {
            if self.interrupted() {
                return false;
            }
            if self.probe.device_present() {
                return true;
            }
            if !self.pause(self.ctx.config.device_poll()) {
                return false;
            }
        }
    }

    fn drive(&mut self) -> SessionOutcome {
        if !self.wait_for_device() {
            return SessionOutcome::Interrupted;
        }
        tracing::info!("device detected");
        self.show(UiState::message(DEVICE_DETECTED));
        self.probe.validate_pairing();
        if self.interrupted() {
            return SessionOutcome::Interrupted;
        }

        let ctx = self.ctx;
        let config = &ctx.config;
        let destination = config.backup_dir.clone();
        if let Err(e) = std::fs::create_dir_all(&destination) {
            tracing::warn!(error = %e, dir = %destination.display(), "cannot create backup directory");
        }
        let marker = config.marker_path();
        if !marker.is_file() {
            return SessionOutcome::PreconditionFailed { missing: marker };
        }

        {
            let mut screen = lock(&self.screen);
            if let Err(e) = screen.prime_partial_base() {
                tracing::warn!(error = %e, "could not prime partial base");
            }
        }
        self.show(UiState::message(WELCOME));

        let command = self.tool.command_line(&destination);
        self.log.marker(&format!("[CMD] {command}"));
        tracing::info!(%command, "starting backup");
        let mut run = match self.tool.spawn(&destination) {
            Ok(run) => run,
            Err(e) => {
                tracing::error!(error = %e, "failed to start backup tool");
                return SessionOutcome::BackupFailed {
                    code: None,
                    message: UNKNOWN_FAILURE.to_string(),
                    tail: e.to_string(),
                    percent: None,
                };
            }
        };

        match Animator::start(Arc::clone(&self.screen), Arc::clone(&self.ui), config.animation_period()) {
            Ok(animator) => self.animator = Some(animator),
            Err(e) => tracing::warn!(error = %e, "animator not started; indicator will only move on output"),
        }

        let (failure, percent) = match run.take_output() {
            Some(output) => self.follow(output),
            None => (None, None),
        };

        if let Some(failure) = failure {
            run.kill();
            return failure;
        }
        if self.interrupted() {
            run.kill();
            return SessionOutcome::Interrupted;
        }

        match run.wait() {
            Ok(Some(0)) => SessionOutcome::Completed {
                usage: self.disk.usage_percent(),
            },
            Ok(status) => {
                if status.is_none() && self.interrupted() {
                    return SessionOutcome::Interrupted;
                }
                let tail = status.map_or_else(|| "terminated by signal".to_string(), |c| format!("exit status {c}"));
                SessionOutcome::BackupFailed {
                    code: None,
                    message: UNKNOWN_FAILURE.to_string(),
                    tail,
                    percent,
                }
            }
            Err(e) => SessionOutcome::BackupFailed {
                code: None,
                message: UNKNOWN_FAILURE.to_string(),
                tail: e.to_string(),
                percent,
            },
        }
    }

    /// Consume tool output until it ends or reports an error
    ///
    /// Returns the failure outcome, if any, and the last percent seen.
    fn follow<R: std::io::Read>(&self, output: R) -> (Option<SessionOutcome>, Option<u8>) {
        let options = ParserOptions {
            idle_threshold: self.ctx.config.idle_threshold(),
        };
        let mut parser = match StreamParser::new(output, self.log.tee(), self.ctx.catalog.clone(), options) {
            Ok(parser) => parser,
            Err(e) => {
                tracing::error!(error = %e, "output parser unavailable");
                return (None, None);
            }
        };

        while let Some(event) = parser.next() {
            if self.interrupted() {
                break;
            }
            let state = match event {
                Ok(ParserEvent::Idle { percent, encrypted }) => match percent {
                    None => UiState::message(STARTING).animated(true),
                    Some(p) => UiState::progress(backing_up_subtitle(encrypted), p),
                },
                Ok(ParserEvent::EncryptionModeChanged(encrypted)) => {
                    tracing::info!(encrypted, "encryption mode reported");
                    continue;
                }
                Ok(ParserEvent::PreparingBackup) => {
                    let mut state = UiState::message(PREPARING).animated(true);
                    state.set_percent(parser.state().percent);
                    state
                }
                Ok(ParserEvent::ProgressUpdate(p)) => {
                    tracing::debug!(percent = p, "progress");
                    UiState::progress(backing_up_subtitle(parser.state().encrypted), p)
                }
                Ok(ParserEvent::ErrorDetected { code, message, tail }) => {
                    let percent = parser.state().percent;
                    return (
                        Some(SessionOutcome::BackupFailed {
                            code,
                            message,
                            tail,
                            percent,
                        }),
                        percent,
                    );
                }
                Err(e) => {
                    tracing::warn!(error = %e, "reading tool output failed");
                    break;
                }
            };
            self.show(state);
        }
        (None, parser.state().percent)
    }

    fn finish(&mut self, outcome: &SessionOutcome) {
        if let Some(mut animator) = self.animator.take() {
            animator.stop(STOP_TIMEOUT);
        }

        let ts = display_timestamp(Local::now());
        match outcome {
            SessionOutcome::Completed { usage } => {
                self.log
                    .marker(&format!("[OK] completed at {ts} usage={}", usage_text(*usage)));
                tracing::info!(usage = ?usage, "backup completed");
            }
            SessionOutcome::BackupFailed {
                code, message, tail, ..
            } => {
                let code_text = code.map_or_else(|| "none".to_string(), |c| c.to_string());
                let one_line = message.replace('\n', " ");
                self.log
                    .marker(&format!("[ERROR] {one_line} code={code_text} tail='{tail}'"));
                tracing::error!(code = %code_text, message = %one_line, "backup failed");
            }
            SessionOutcome::PreconditionFailed { missing } => {
                self.log.marker(&format!(
                    "[ERROR] Backup folder not found or not mounted (missing {})",
                    missing.display()
                ));
                tracing::error!(missing = %missing.display(), "backup folder not mounted");
            }
            SessionOutcome::Interrupted => {
                self.log.marker("[INTERRUPT]");
                tracing::warn!("interrupted");
            }
        }

        if let Some(state) = outcome.terminal_screen(&ts, &self.ctx.config.owner_lines) {
            self.publish(state, RefreshIntent::Full);
        }
        lock(&self.screen).shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(SessionOutcome::Completed { usage: None }.exit_code(), 0);
        assert_eq!(
            SessionOutcome::BackupFailed {
                code: Some(105),
                message: String::new(),
                tail: String::new(),
                percent: None
            }
            .exit_code(),
            1
        );
        assert_eq!(
            SessionOutcome::PreconditionFailed {
                missing: PathBuf::from("/x")
            }
            .exit_code(),
            2
        );
        assert_eq!(SessionOutcome::Interrupted.exit_code(), 130);
    }

    #[test]
    fn test_completion_block() {
        let owner = vec!["Jane Doe".to_string(), "555-0100".to_string()];
        assert_eq!(
            completion_block("10:00 / 01 Jan 2026", Some(42), &owner),
            "Backup completed at 10:00 / 01 Jan 2026.\n42% memory usage.\n \nJane Doe\n555-0100"
        );
        assert!(completion_block("t", None, &[]).contains("n/a memory usage."));
    }

    #[test]
    fn test_error_screen_keeps_last_percent() {
        let outcome = SessionOutcome::BackupFailed {
            code: None,
            message: UNKNOWN_FAILURE.to_string(),
            tail: "exit status 1".to_string(),
            percent: Some(37),
        };
        let state = outcome.terminal_screen("t", &[]).unwrap();
        assert_eq!(state.subtitle, "Error: Unknown error.\nCheck logs.");
        assert_eq!(state.percent, Some(37));
        assert!(!state.animate);
        assert_eq!(state.tail_lines.len(), 1);
    }

    #[test]
    fn test_interrupt_is_silent() {
        assert!(SessionOutcome::Interrupted.terminal_screen("t", &[]).is_none());
    }

    #[test]
    fn test_subtitles() {
        assert_eq!(backing_up_subtitle(true), "Backing up (encrypted)...");
        assert_eq!(backing_up_subtitle(false), "Backing up (not encrypted)...");
    }
}
