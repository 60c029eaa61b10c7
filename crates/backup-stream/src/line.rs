//! Line reassembly.

/// Buffers bytes until a `\n` or `\r` terminator
#[derive(Debug, Default, Clone)]
pub struct LineAccumulator {
    buf: Vec<u8>,
}

impl LineAccumulator {
    /// Empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `byte` ends a line
    pub fn is_terminator(byte: u8) -> bool {
        byte == b'\n' || byte == b'\r'
    }

    /// Feed one byte; returns the finished line on a terminator
    ///
    /// Empty lines (e.g. the `\n` of a `\r\n` pair) yield `None`. Invalid
    /// UTF-8 is replaced rather than rejected.
    pub fn push(&mut self, byte: u8) -> Option<String> {
        if Self::is_terminator(byte) {
            if self.buf.is_empty() {
                return None;
            }
            let line = String::from_utf8_lossy(&self.buf).into_owned();
            self.buf.clear();
            Some(line)
        } else {
            self.buf.push(byte);
            None
        }
    }

    /// Bytes of the unterminated line so far
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }
}
