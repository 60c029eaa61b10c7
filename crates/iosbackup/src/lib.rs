//! iOS Backup Machine station
//!
//! Waits for an iPhone, runs `idevicebackup2` against a mounted backup
//! drive and mirrors its progress on a Waveshare 2.13" e-paper panel.
//!
//! # Architecture
//!
//! ```text
//! main.rs (CLI, config, signals)
//!         ↓
//! session (device wait → backup → terminal screen)
//!    ↓              ↓
//! backup-stream   animator ──┐
//! (parser)                   ↓
//!                 display::Screen (ui renderers → eink-canvas transform)
//!                            ↓
//!                 display::refresh (full / partial state machine)
//!                            ↓
//!                 platform::PanelDriver (eink-emulator or hardware)
//! ```
//!
//! The session driver and the animator share the screen behind one mutex;
//! the animator is always stopped before the terminal draw.

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![warn(clippy::all)]
#![allow(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod animator;
pub mod config;
pub mod context;
pub mod display;
pub mod logging;
pub mod notice;
pub mod process;
pub mod session;
pub mod signals;

pub use animator::{Animator, SharedUi};
pub use config::{Config, ConfigError, ConfigLocation};
pub use context::SessionContext;
pub use display::{RefreshController, RefreshIntent, RefreshKind, RefreshSettings, Screen, SharedScreen};
pub use session::{Session, SessionOutcome};
pub use signals::InterruptFlag;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock, recovering the guard from a poisoned mutex
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
