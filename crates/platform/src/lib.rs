//! Platform layer for the iOS backup station
//!
//! This crate defines the contract between the display core and the e-paper
//! panel driver, plus the application-wide constants.
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (iosbackup crate: session, animator, refresh controller)
//!         ↓
//! Feature Layers (ui, backup-stream, eink-canvas)
//!         ↓
//! Platform (this crate - PanelDriver contract)
//!         ↓
//! Panel implementation (eink-emulator, or a transport-backed driver)
//! ```
//!
//! # Features
//!
//! - `mocks`: [`mocks::MockPanel`], a recording driver for tests
//!
//! # Example
//!
//! ```no_run
//! use platform::{ClearPattern, DisplayError, PanelDriver};
//!
//! fn blank<P: PanelDriver>(panel: &mut P) -> Result<(), DisplayError> {
//!     panel.init_full()?;
//!     panel.clear(ClearPattern::White)
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod display;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

pub use display::{ClearPattern, DisplayError, PanelCapabilities, PanelDriver};
