//! External tools: libimobiledevice commands and `df`
//!
//! Each collaborator is a small trait so the session driver can be tested
//! against scripted fakes; the `Command*` types below are the real thing.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use nix::fcntl::OFlag;
use nix::unistd::pipe2;

use crate::signals::InterruptFlag;

/// Device presence and pairing
pub trait DeviceProbe {
    /// Whether an iOS device is connected
    fn device_present(&mut self) -> bool;

    /// Validate (and if needed establish) pairing; outcome is informational
    fn validate_pairing(&mut self);
}

/// Launches the backup tool
pub trait BackupTool {
    type Run: BackupRun;

    /// Human-readable command line for the session log
    fn command_line(&self, destination: &Path) -> String;

    /// Start a backup into `destination`
    fn spawn(&mut self, destination: &Path) -> io::Result<Self::Run>;
}

/// A running backup
pub trait BackupRun {
    type Output: Read;

    /// Combined stdout/stderr; `None` after the first call
    fn take_output(&mut self) -> Option<Self::Output>;

    /// Wait for exit; `None` when the process died from a signal
    fn wait(&mut self) -> io::Result<Option<i32>>;

    /// Terminate the process, best effort
    fn kill(&mut self);
}

/// Disk usage source for the completion screen
pub trait DiskUsage {
    /// Used space in percent
    fn usage_percent(&mut self) -> Option<u8>;
}

/// `idevice_id -l` / `idevicepair validate`
#[derive(Debug, Clone)]
pub struct CommandDeviceProbe {
    list_command: String,
    pair_command: String,
}

impl CommandDeviceProbe {
    pub fn new(list_command: impl Into<String>, pair_command: impl Into<String>) -> Self {
        Self {
            list_command: list_command.into(),
            pair_command: pair_command.into(),
        }
    }
}

impl DeviceProbe for CommandDeviceProbe {
    fn device_present(&mut self) -> bool {
        match Command::new(&self.list_command).arg("-l").stderr(Stdio::null()).output() {
            Ok(out) => !String::from_utf8_lossy(&out.stdout).trim().is_empty(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(command = %self.list_command, "device list command not found");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, command = %self.list_command, "device list command failed");
                false
            }
        }
    }

    fn validate_pairing(&mut self) {
        let status = Command::new(&self.pair_command)
            .arg("validate")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match status {
            Ok(s) if s.success() => tracing::debug!("pairing validated"),
            Ok(s) => tracing::debug!(code = ?s.code(), "pairing validation reported failure"),
            Err(e) => tracing::debug!(error = %e, "pairing validation could not run"),
        }
    }
}

/// `idevicebackup2 backup <dir>`
#[derive(Debug, Clone)]
pub struct CommandBackupTool {
    program: String,
    interrupt: InterruptFlag,
}

impl CommandBackupTool {
    /// Output readers created by this tool report end of stream once
    /// `interrupt` is set
    pub fn new(program: impl Into<String>, interrupt: InterruptFlag) -> Self {
        Self {
            program: program.into(),
            interrupt,
        }
    }
}

impl BackupTool for CommandBackupTool {
    type Run = ChildRun;

    fn command_line(&self, destination: &Path) -> String {
        format!("{} backup {}", self.program, destination.display())
    }

    /// stdout and stderr share one pipe, so output arrives in the order the
    /// tool wrote it
    fn spawn(&mut self, destination: &Path) -> io::Result<ChildRun> {
        let (read_end, write_end) = pipe2(OFlag::O_CLOEXEC).map_err(io::Error::from)?;
        let stderr_end = write_end.try_clone()?;
        let child = {
            // The Command holds the parent's copies of the write end until
            // dropped; EOF only arrives once they are closed.
            let mut command = Command::new(&self.program);
            command
                .arg("backup")
                .arg(destination)
                .stdin(Stdio::null())
                .stdout(Stdio::from(write_end))
                .stderr(Stdio::from(stderr_end));
            command.spawn()?
        };
        tracing::info!(pid = child.id(), program = %self.program, "backup tool started");

        let (tx, rx) = mpsc::channel();
        pump("tool-output", File::from(read_end), tx)?;
        Ok(ChildRun {
            child,
            output: Some(ChannelReader::new(rx, self.interrupt.clone())),
        })
    }
}

/// Forward everything from `source` into `tx` on a named thread
fn pump<R: Read + Send + 'static>(name: &str, mut source: R, tx: Sender<Vec<u8>>) -> io::Result<()> {
    std::thread::Builder::new().name(name.into()).spawn(move || {
        let mut buf = [0u8; 4096];
        loop {
            match source.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::debug!(error = %e, "tool output pipe closed");
                    break;
                }
            }
        }
    })?;
    Ok(())
}

/// Spawned backup tool
#[derive(Debug)]
pub struct ChildRun {
    child: Child,
    output: Option<ChannelReader>,
}

impl BackupRun for ChildRun {
    type Output = ChannelReader;

    fn take_output(&mut self) -> Option<ChannelReader> {
        self.output.take()
    }

    fn wait(&mut self) -> io::Result<Option<i32>> {
        Ok(self.child.wait()?.code())
    }

    fn kill(&mut self) {
        match self.child.kill() {
            Ok(()) => {
                let _ = self.child.wait();
                tracing::info!("backup tool terminated");
            }
            // Already exited
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => {}
            Err(e) => tracing::warn!(error = %e, "failed to terminate backup tool"),
        }
    }
}

const READ_POLL: Duration = Duration::from_millis(100);

/// The tool's combined output as a [`Read`]
///
/// Reports end of stream when the pipe is closed or when the interrupt flag
/// is raised, whichever comes first.
#[derive(Debug)]
pub struct ChannelReader {
    rx: Receiver<Vec<u8>>,
    pending: Vec<u8>,
    pos: usize,
    interrupt: InterruptFlag,
}

impl ChannelReader {
    pub fn new(rx: Receiver<Vec<u8>>, interrupt: InterruptFlag) -> Self {
        Self {
            rx,
            pending: Vec::new(),
            pos: 0,
            interrupt,
        }
    }
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pos >= self.pending.len() {
            if self.interrupt.is_set() {
                return Ok(0);
            }
            match self.rx.recv_timeout(READ_POLL) {
                Ok(chunk) => {
                    self.pending = chunk;
                    self.pos = 0;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Ok(0),
            }
        }
        let n = buf.len().min(self.pending.len() - self.pos);
        buf[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// `df -P <device>`
#[derive(Debug, Clone)]
pub struct DfDiskUsage {
    device: String,
}

impl DfDiskUsage {
    pub fn new(device: impl Into<String>) -> Self {
        Self { device: device.into() }
    }
}

impl DiskUsage for DfDiskUsage {
    fn usage_percent(&mut self) -> Option<u8> {
        let out = Command::new("df")
            .arg("-P")
            .arg(&self.device)
            .stderr(Stdio::null())
            .output()
            .map_err(|e| tracing::warn!(error = %e, "df failed"))
            .ok()?;
        parse_df_usage(&String::from_utf8_lossy(&out.stdout))
    }
}

/// Capacity column of `df -P` output: the first `NN%` token on the last line
pub fn parse_df_usage(output: &str) -> Option<u8> {
    let lines: Vec<&str> = output.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 2 {
        return None;
    }
    lines
        .last()?
        .split_whitespace()
        .find_map(|token| {
            let digits = token.strip_suffix('%')?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            digits.parse::<u8>().ok()
        })
}
