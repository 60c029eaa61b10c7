//! The event stream.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::iter::FusedIterator;
use std::time::{Duration, Instant};

use crate::{
    Clock, ErrorCatalog, LineAccumulator, LineFacts, LinePatterns, ParserEvent, StreamError,
    SystemClock,
};

/// Characters of the offending line kept in `ErrorDetected::tail`
pub const ERROR_TAIL_CHARS: usize = 80;

const READ_CHUNK: usize = 4096;

/// Tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Emit `Idle` when this long has passed since the last progress or idle
    /// event and output keeps arriving without a line terminator
    pub idle_threshold: Duration,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            idle_threshold: Duration::from_secs(4),
        }
    }
}

/// What the parser knows about the session so far
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseState {
    /// Last reported percentage
    pub percent: Option<u8>,
    /// Encryption flag, false until a marker says otherwise
    pub encrypted: bool,
    /// When the last `ProgressUpdate` or `Idle` was emitted
    pub last_emit: Option<Instant>,
}

/// Lazy iterator of [`ParserEvent`]s over a byte stream
///
/// Every byte read is written to `sink` before it is interpreted. Sink
/// failures are logged and otherwise ignored. The iterator ends at end of
/// stream (an unterminated last line is discarded) or right after an
/// `ErrorDetected` event.
pub struct StreamParser<R, S, C = SystemClock> {
    reader: R,
    sink: S,
    clock: C,
    patterns: LinePatterns,
    catalog: ErrorCatalog,
    options: ParserOptions,
    line: LineAccumulator,
    state: ParseState,
    pending: VecDeque<ParserEvent>,
    done: bool,
    sink_failed: bool,
}

impl<R: Read, S: Write> StreamParser<R, S, SystemClock> {
    /// Parser using the system clock
    pub fn new(
        reader: R,
        sink: S,
        catalog: ErrorCatalog,
        options: ParserOptions,
    ) -> Result<Self, StreamError> {
        Self::with_clock(reader, sink, catalog, options, SystemClock)
    }
}

impl<R: Read, S: Write, C: Clock> StreamParser<R, S, C> {
    /// Parser with an explicit time source
    pub fn with_clock(
        reader: R,
        sink: S,
        catalog: ErrorCatalog,
        options: ParserOptions,
        clock: C,
    ) -> Result<Self, StreamError> {
        Ok(Self {
            reader,
            sink,
            clock,
            patterns: LinePatterns::new()?,
            catalog,
            options,
            line: LineAccumulator::new(),
            state: ParseState::default(),
            pending: VecDeque::new(),
            done: false,
            sink_failed: false,
        })
    }

    /// Current parse state
    pub fn state(&self) -> &ParseState {
        &self.state
    }

    /// Give back the sink
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn forward(&mut self, chunk: &[u8]) {
        if let Err(e) = self.sink.write_all(chunk).and_then(|()| self.sink.flush()) {
            if self.sink_failed {
                tracing::debug!(error = %e, "output sink still failing");
            } else {
                tracing::warn!(error = %e, "output sink write failed; continuing to parse");
                self.sink_failed = true;
            }
        }
    }

    fn feed(&mut self, byte: u8) {
        if let Some(line) = self.line.push(byte) {
            self.interpret(&line);
        } else if !LineAccumulator::is_terminator(byte) {
            self.check_idle();
        }
    }

    fn check_idle(&mut self) {
        let now = self.clock.now();
        let due = self
            .state
            .last_emit
            .map_or(true, |t| now.saturating_duration_since(t) >= self.options.idle_threshold);
        if due {
            self.state.last_emit = Some(now);
            self.pending.push_back(ParserEvent::Idle {
                percent: self.state.percent,
                encrypted: self.state.encrypted,
            });
        }
    }

    fn interpret(&mut self, line: &str) {
        let LineFacts {
            encryption,
            preparing,
            percent,
            error,
        } = self.patterns.classify(line);

        if let Some(encrypted) = encryption {
            if encrypted != self.state.encrypted {
                self.state.encrypted = encrypted;
                self.pending
                    .push_back(ParserEvent::EncryptionModeChanged(encrypted));
            }
        }

        if preparing {
            self.pending.push_back(ParserEvent::PreparingBackup);
        }

        if let Some(raw) = percent {
            let pct = u8::try_from(raw.min(100)).unwrap_or(100);
            if self.state.percent != Some(pct) {
                self.state.percent = Some(pct);
                self.state.last_emit = Some(self.clock.now());
                self.pending.push_back(ParserEvent::ProgressUpdate(pct));
            }
        }

        if error {
            let code = self.patterns.extract_error_code(line);
            let message = self.catalog.resolve(code).to_string();
            let skip = line.chars().count().saturating_sub(ERROR_TAIL_CHARS);
            let tail: String = line.chars().skip(skip).collect();
            tracing::debug!(?code, %message, "error line detected");
            self.pending.push_back(ParserEvent::ErrorDetected {
                code,
                message,
                tail,
            });
            self.done = true;
        }
    }
}

impl<R: Read, S: Write, C: Clock> Iterator for StreamParser<R, S, C> {
    type Item = io::Result<ParserEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }
            if self.done {
                return None;
            }
            let mut buf = [0u8; READ_CHUNK];
            match self.reader.read(&mut buf) {
                Ok(0) => {
                    if !self.line.pending().is_empty() {
                        tracing::trace!(
                            bytes = self.line.pending().len(),
                            "discarding unterminated last line"
                        );
                    }
                    self.done = true;
                }
                Ok(n) => {
                    let chunk = &buf[..n];
                    self.forward(chunk);
                    for &byte in chunk {
                        self.feed(byte);
                        if self.done {
                            break;
                        }
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl<R: Read, S: Write, C: Clock> FusedIterator for StreamParser<R, S, C> {}
