//! Line classification.
//!
//! Every check runs against every line; the parser decides what to do with
//! the combined [`LineFacts`].

use regex::{Regex, RegexBuilder};

const ENCRYPTED_PHRASE: &str = "Backup will be encrypted.";
const NOT_ENCRYPTED_PHRASE: &str = "Backup will not be encrypted.";
const PREPARING_PREFIX: &str = "Sending '";
const PREPARING_FILE: &str = "Status.plist";

/// Error-code patterns, tried in order; the first one that yields a number
/// wins.
const ERROR_CODE_PATTERNS: [&str; 5] = [
    r"Error\s*Code[: ]+(\d+)",
    r"ErrorCode[: ]+(\d+)",
    r"MBErrorDomain/(\d+)",
    r"\(Error\s*Code\s*(\d+)\)",
    r"mobilebackup2\s*\(\s*(-?\d+)\s*\)",
];

/// What a single line says
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineFacts {
    /// Encryption announcement: `Some(true)` enabled, `Some(false)` disabled
    pub encryption: Option<bool>,
    /// Transfer of the status control file
    pub preparing: bool,
    /// Raw percentage from `<digits>% finished`, saturating at `u32::MAX`
    pub percent: Option<u32>,
    /// The word "error" appears
    pub error: bool,
}

/// Compiled patterns for the backup tool's console output
#[derive(Debug, Clone)]
pub struct LinePatterns {
    encryption_enabled: Regex,
    encryption_disabled: Regex,
    percent: Regex,
    error_word: Regex,
    error_codes: Vec<Regex>,
}

fn case_insensitive(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

impl LinePatterns {
    /// Compile all patterns
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            encryption_enabled: case_insensitive(r"\bEncryption enabled\b")?,
            encryption_disabled: case_insensitive(r"\bEncryption disabled\b")?,
            // Only "finished" may vary in case; the phrase is kept narrow.
            percent: Regex::new(r"(\d+)%\s*[Ff]inished")?,
            error_word: case_insensitive(r"\berror\b")?,
            error_codes: ERROR_CODE_PATTERNS
                .iter()
                .map(|p| case_insensitive(p))
                .collect::<Result<_, _>>()?,
        })
    }

    /// Run every check against `line`
    pub fn classify(&self, line: &str) -> LineFacts {
        LineFacts {
            encryption: self.encryption(line),
            preparing: line.starts_with(PREPARING_PREFIX) && line.contains(PREPARING_FILE),
            percent: self
                .percent
                .captures(line)
                .and_then(|c| c.get(1))
                // Only digits were captured, so a failed parse is an overflow
                .map(|m| m.as_str().parse().unwrap_or(u32::MAX)),
            error: self.error_word.is_match(line),
        }
    }

    /// Encryption announcement; the long phrasing is checked before the
    /// short one and the first hit wins
    pub fn encryption(&self, line: &str) -> Option<bool> {
        if line.contains(ENCRYPTED_PHRASE) {
            Some(true)
        } else if line.contains(NOT_ENCRYPTED_PHRASE) {
            Some(false)
        } else if self.encryption_enabled.is_match(line) {
            Some(true)
        } else if self.encryption_disabled.is_match(line) {
            Some(false)
        } else {
            None
        }
    }

    /// Numeric error code from the first matching code pattern
    pub fn extract_error_code(&self, line: &str) -> Option<i32> {
        self.error_codes.iter().find_map(|re| {
            re.captures(line)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse().ok())
        })
    }
}
