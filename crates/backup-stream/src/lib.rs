//! Backup tool output parser
//!
//! `idevicebackup2` reports progress as free-form console text. This crate
//! reassembles that byte stream into lines and turns them into typed
//! [`ParserEvent`]s:
//!
//! ```text
//! bytes ──► LineAccumulator ──► LinePatterns::classify ──► ParseState ──► ParserEvent
//!   │
//!   └──► sink (every byte, verbatim)
//! ```
//!
//! # Example
//!
//! ```
//! use backup_stream::{ErrorCatalog, ParserEvent, ParserOptions, StreamParser};
//!
//! let output = b"Backup will be encrypted.\n42% Finished\n".as_slice();
//! let mut sink = Vec::new();
//! let events: Vec<_> = StreamParser::new(output, &mut sink, ErrorCatalog::new(), ParserOptions::default())
//!     .unwrap()
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//!
//! assert!(events.contains(&ParserEvent::EncryptionModeChanged(true)));
//! assert!(events.contains(&ParserEvent::ProgressUpdate(42)));
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

mod catalog;
mod clock;
mod event;
mod line;
mod parser;
mod patterns;

pub use catalog::{ErrorCatalog, UNKNOWN_ERROR};
pub use clock::{Clock, ManualClock, SystemClock};
pub use event::ParserEvent;
pub use line::LineAccumulator;
pub use parser::{ParseState, ParserOptions, StreamParser, ERROR_TAIL_CHARS};
pub use patterns::{LineFacts, LinePatterns};

/// Errors constructing a parser
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// A built-in pattern failed to compile
    #[error("invalid line pattern: {0}")]
    Pattern(#[from] regex::Error),
}
