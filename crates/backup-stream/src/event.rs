//! Events produced by the parser.

/// One structured observation about the backup tool's output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserEvent {
    /// The tool announced whether the backup is encrypted; emitted only
    /// when the flag actually changes
    EncryptionModeChanged(bool),
    /// The tool started transferring its status control file
    PreparingBackup,
    /// A new completion percentage (repeats are suppressed)
    ProgressUpdate(u8),
    /// An error line; terminal for the stream
    ErrorDetected {
        /// Numeric code extracted from the line, if any
        code: Option<i32>,
        /// Human-readable message resolved from the code
        message: String,
        /// Last characters of the offending line
        tail: String,
    },
    /// No refresh-worthy line for a while; the UI should redraw its
    /// current state
    Idle {
        /// Best known percentage
        percent: Option<u8>,
        /// Current encryption flag
        encrypted: bool,
    },
}
