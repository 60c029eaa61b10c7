//! Diagnostic tracing and the per-session backup log
//!
//! Two separate streams: `tracing` output goes to stderr for the operator,
//! while the raw backup tool output plus a few bracketed markers go to
//! stdout and to `<log_dir>/backup-YYYYMMDD-HHMMSS.log`.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the stderr subscriber; `RUST_LOG` overrides the `info` default
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_writer(io::stderr).with_target(false);
    if tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Log file name for a session started at `started`
pub fn session_log_name(started: DateTime<Local>) -> String {
    format!("backup-{}.log", started.format("%Y%m%d-%H%M%S"))
}

/// Per-session backup log
///
/// Write failures are logged and never interrupt the session.
#[derive(Debug)]
pub struct SessionLog {
    path: Option<PathBuf>,
    file: Option<File>,
    echo: bool,
}

impl SessionLog {
    /// Create `<dir>/backup-<stamp>.log` and write the opening marker
    ///
    /// With `echo`, the raw tool output is also copied to stdout.
    pub fn open(dir: &Path, started: DateTime<Local>, echo: bool) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(session_log_name(started));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut log = Self {
            path: Some(path.clone()),
            file: Some(file),
            echo,
        };
        log.marker(&format!("[{}] backup started", started.format("%Y%m%d-%H%M%S")));
        log.marker(&format!("[LOG] writing to {}", path.display()));
        tracing::info!(path = %path.display(), "session log opened");
        Ok(log)
    }

    /// Log that keeps nothing, optionally still echoing tool output
    pub fn disabled(echo: bool) -> Self {
        Self {
            path: None,
            file: None,
            echo,
        }
    }

    /// Log file path, if a file is open
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one marker line
    pub fn marker(&mut self, line: &str) {
        if let Some(file) = self.file.as_mut() {
            if let Err(e) = writeln!(file, "{line}").and_then(|()| file.flush()) {
                tracing::warn!(error = %e, "session log write failed");
            }
        }
    }

    /// Sink for the raw tool output
    pub fn tee(&self) -> TeeWriter {
        let file = self.file.as_ref().and_then(|f| match f.try_clone() {
            Ok(clone) => Some(clone),
            Err(e) => {
                tracing::warn!(error = %e, "cannot share session log handle; tool output not logged");
                None
            }
        });
        TeeWriter {
            file,
            stdout: self.echo,
        }
    }
}

/// Copies everything to the session log and optionally stdout
#[derive(Debug)]
pub struct TeeWriter {
    file: Option<File>,
    stdout: bool,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut first_err = None;
        if self.stdout {
            if let Err(e) = io::stdout().write_all(buf) {
                first_err = Some(e);
            }
        }
        if let Some(file) = self.file.as_mut() {
            if let Err(e) = file.write_all(buf) {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.stdout {
            io::stdout().flush()?;
        }
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}
