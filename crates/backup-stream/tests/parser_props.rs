#![allow(clippy::unwrap_used, clippy::expect_used, missing_docs)]
//! Property and scenario tests for the stream parser

use std::time::Duration;

use backup_stream::{
    ErrorCatalog, LinePatterns, ManualClock, ParserEvent, ParserOptions, StreamParser,
    UNKNOWN_ERROR,
};
use proptest::prelude::*;

fn parse(input: &[u8], catalog: ErrorCatalog) -> Vec<ParserEvent> {
    let mut sink = Vec::new();
    StreamParser::new(input, &mut sink, catalog, ParserOptions::default())
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

fn progress(events: &[ParserEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            ParserEvent::ProgressUpdate(p) => Some(*p),
            _ => None,
        })
        .collect()
}

/// Reader that hands out one byte per read, so time can move between bytes
struct Trickle<'a> {
    data: &'a [u8],
    clock: ManualClock,
    step: Duration,
}

impl std::io::Read for Trickle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self.data.split_first() {
            Some((b, rest)) if !buf.is_empty() => {
                buf[0] = *b;
                self.data = rest;
                self.clock.advance(self.step);
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

#[test]
fn catalog_message_is_used_for_known_code() {
    let catalog = ErrorCatalog::with_messages([(14, "Wrong device password.")]);
    let events = parse(b"ERROR: Error Code: 14\n", catalog);
    assert!(events.contains(&ParserEvent::ErrorDetected {
        code: Some(14),
        message: "Wrong device password.".into(),
        tail: "ERROR: Error Code: 14".into(),
    }));
}

#[test]
fn negative_mobilebackup2_code() {
    let events = parse(b"Error: mobilebackup2 (-13)\n", ErrorCatalog::new());
    let last = events.last().unwrap();
    assert_eq!(
        *last,
        ParserEvent::ErrorDetected {
            code: Some(-13),
            message: UNKNOWN_ERROR.into(),
            tail: "Error: mobilebackup2 (-13)".into(),
        }
    );
}

#[test]
fn idle_fires_during_long_unterminated_output() {
    let clock = ManualClock::new();
    let line = b"10% Finished\nxxxxxxxxxx\n";
    let reader = Trickle {
        data: line,
        clock: clock.clone(),
        step: Duration::from_secs(1),
    };
    let mut sink = Vec::new();
    let events: Vec<_> = StreamParser::with_clock(
        reader,
        &mut sink,
        ErrorCatalog::new(),
        ParserOptions::default(),
        clock,
    )
    .unwrap()
    .collect::<Result<_, _>>()
    .unwrap();

    // One second per byte: idles at bytes 1, 5 and 9 of the progress line,
    // the progress update restarts the timer, then two more across the x's.
    let idles = events
        .iter()
        .filter(|e| matches!(e, ParserEvent::Idle { .. }))
        .count();
    assert_eq!(idles, 5);
    assert!(events.contains(&ParserEvent::Idle {
        percent: Some(10),
        encrypted: false
    }));
}

proptest! {
    #[test]
    fn consecutive_repeats_report_once(values in prop::collection::vec((0u8..=100, 1usize..4), 1..20)) {
        let mut input = String::new();
        let mut expected = Vec::new();
        for (pct, repeats) in &values {
            for _ in 0..*repeats {
                input.push_str(&format!("{pct}% Finished\n"));
            }
            if expected.last() != Some(pct) {
                expected.push(*pct);
            }
        }
        let events = parse(input.as_bytes(), ErrorCatalog::new());
        prop_assert_eq!(progress(&events), expected);
    }

    #[test]
    fn extracted_code_equals_literal_digits(
        code in 0i32..1_000_000,
        pattern in 0usize..4,
        prefix in "[a-z ]{0,10}",
    ) {
        let line = match pattern {
            0 => format!("{prefix}Error Code: {code}"),
            1 => format!("{prefix}ErrorCode {code}"),
            2 => format!("{prefix}MBErrorDomain/{code}"),
            _ => format!("{prefix}(Error Code {code})"),
        };
        let patterns = LinePatterns::new().unwrap();
        prop_assert_eq!(patterns.extract_error_code(&line), Some(code));
    }

    #[test]
    fn signed_mobilebackup2_codes(code in -100_000i32..100_000) {
        let patterns = LinePatterns::new().unwrap();
        let line = format!("mobilebackup2 ( {code} )");
        prop_assert_eq!(patterns.extract_error_code(&line), Some(code));
    }

    #[test]
    fn sink_sees_every_byte(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let mut sink = Vec::new();
        let parser = StreamParser::new(bytes.as_slice(), &mut sink, ErrorCatalog::new(), ParserOptions::default()).unwrap();
        let _events: Vec<_> = parser.collect::<Result<_, _>>().unwrap();
        // Chunks are forwarded whole, even past a terminal error line.
        prop_assert_eq!(sink, bytes);
    }
}
