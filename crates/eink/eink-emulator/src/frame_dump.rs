//! PNG capture of every displayed frame

use std::path::{Path, PathBuf};

use eink_canvas::PhysicalFrame;

use crate::Waveform;

/// Writes `frame-NNNNN-<kind>.png` files into a directory
#[derive(Debug)]
pub struct FrameDump {
    dir: PathBuf,
    next_seq: u32,
}

impl FrameDump {
    /// Create the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, next_seq: 0 })
    }

    /// Output directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save one frame; failures are logged and otherwise ignored
    pub fn save(&mut self, frame: &PhysicalFrame, waveform: Waveform) {
        let path = self
            .dir
            .join(format!("frame-{:05}-{}.png", self.next_seq, waveform.label()));
        self.next_seq = self.next_seq.wrapping_add(1);
        if let Err(e) = frame.image().save(&path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to write frame capture");
        }
    }
}
