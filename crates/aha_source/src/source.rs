//! Incremental source buffer.
//!
//! Bytes go in, code points come out. The decoded text is an append-only
//! log partitioned into lines; every line except a partial last one ends
//! with a single `'\n'`, whatever the original terminator bytes were.

use std::collections::VecDeque;
use std::fmt;

use log::debug;
use thiserror::Error;

/// Zero-based position of a code point inside a [`Source`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourcePos {
    pub line: usize,
    pub col: usize,
}

impl SourcePos {
    pub fn new(line: usize, col: usize) -> SourcePos {
        SourcePos { line, col }
    }

    /// Position of the following code point.
    pub fn next<S: Source + ?Sized>(self, src: &S) -> SourcePos {
        if self.col + 1 < src.line_size(self.line) {
            SourcePos::new(self.line, self.col + 1)
        } else {
            SourcePos::new(self.line + 1, 0)
        }
    }

    /// Position of the preceding code point.
    pub fn prev<S: Source + ?Sized>(self, src: &S) -> SourcePos {
        if self.col == 0 {
            SourcePos::new(self.line - 1, src.line_size(self.line - 1) - 1)
        } else {
            SourcePos::new(self.line, self.col - 1)
        }
    }
}

impl fmt::Display for SourcePos {
    /// 1-based `line:col`, the form used in diagnostics.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

/// What a consumer can expect from the next [`Source::read_char`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    /// Fed bytes remain that the consumer has not read yet.
    Some,
    /// Every fed byte has been consumed; the producer should feed more.
    Exhausted,
    /// EOF was signaled and nothing remains.
    Eof,
    /// An invalid byte sequence was hit and has not been cleared.
    Error,
}

/// Decoding failure. `pos` is where the decoded character would have landed.
///
/// The source stays in [`SourceState::Error`] until
/// [`ReplSource::clear_buffer`] drops the offending input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name}:{pos}: invalid byte sequence")]
pub struct InvalidByteSequence {
    /// Name of the source that produced the bytes.
    pub name: String,
    pub pos: SourcePos,
}

/// Consumer-side capability set of a source of code points.
pub trait Source {
    /// Decode and consume the next code point, appending it to the text log,
    /// and return it together with the position it now occupies.
    ///
    /// `Ok(None)` means the source is starved ([`SourceState::Exhausted`])
    /// or finished ([`SourceState::Eof`]); check [`state`](Source::state) to
    /// tell the two apart.
    fn read_char(&mut self) -> Result<Option<(char, SourcePos)>, InvalidByteSequence>;

    fn state(&self) -> SourceState;

    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// A code point already in the log. Panics if `pos` is out of range or
    /// the source is in error.
    fn get_char(&self, pos: SourcePos) -> char;

    /// Number of code points on `line`, the terminating `'\n'` included.
    fn line_size(&self, line: usize) -> usize;

    /// Position one past the last logged code point.
    fn endpoint(&self) -> SourcePos;
}

/// A [`Source`] fed interactively, line by line or byte by byte.
pub struct ReplSource {
    name: String,

    /// Decoded log; newlines already canonicalized.
    chars: Vec<char>,
    /// Index into `chars` where each line starts. Never empty.
    line_starts: Vec<usize>,
    prev_was_cr: bool,

    /// Fed, not yet decoded bytes.
    input: VecDeque<u8>,
    input_ended: bool,
    error: bool,
}

impl ReplSource {
    pub fn new(name: impl Into<String>) -> ReplSource {
        ReplSource {
            name: name.into(),
            chars: Vec::new(),
            line_starts: vec![0],
            prev_was_cr: false,
            input: VecDeque::new(),
            input_ended: false,
            error: false,
        }
    }

    /// Append raw input. Chunks may end in the middle of a code point.
    ///
    /// # Panics
    /// Panics if EOF was already signaled or the source is in error.
    pub fn feed_bytes(&mut self, bytes: &[u8]) {
        assert!(!self.error, "source has an error");
        assert!(!self.input_ended, "source was already fed EOF");
        self.input.extend(bytes.iter().copied());
    }

    /// Feed one interactive line; a `'\n'` is appended for the caller.
    pub fn feed_line(&mut self, line: &str) {
        self.feed_bytes(line.as_bytes());
        self.input.push_back(b'\n');
    }

    /// Signal that no further input will arrive.
    ///
    /// # Panics
    /// Panics if EOF was already signaled or the source is in error.
    pub fn feed_eof(&mut self) {
        assert!(!self.error, "source has an error");
        assert!(!self.input_ended, "source was already fed EOF");
        self.input_ended = true;
    }

    /// Drop the undecoded input queue and clear the error state. The decoded
    /// log is append-only and survives.
    pub fn clear_buffer(&mut self) {
        if !self.input.is_empty() || self.error {
            debug!(
                "{}: dropping {} undecoded bytes during recovery",
                self.name,
                self.input.len()
            );
        }
        self.input.clear();
        self.prev_was_cr = false;
        self.error = false;
    }

    /// [`clear_buffer`](ReplSource::clear_buffer), and additionally forget
    /// the EOF signal so the source can be fed again.
    pub fn clear_all(&mut self) {
        self.clear_buffer();
        self.input_ended = false;
    }

    fn fail(&mut self) -> InvalidByteSequence {
        self.error = true;
        let err = InvalidByteSequence {
            name: self.name.clone(),
            pos: self.endpoint(),
        };
        debug!("{err}");
        err
    }
}

impl Default for ReplSource {
    fn default() -> ReplSource {
        ReplSource::new("<repl>")
    }
}

impl Source for ReplSource {
    fn read_char(&mut self) -> Result<Option<(char, SourcePos)>, InvalidByteSequence> {
        assert!(!self.error, "source has an error");

        loop {
            let Some(b0) = self.input.pop_front() else {
                return Ok(None);
            };

            let (mut value, trailing) = match b0 {
                0x00..=0x7f => (u32::from(b0), 0),
                0xc0..=0xdf => (u32::from(b0 & 0x1f), 1),
                0xe0..=0xef => (u32::from(b0 & 0x0f), 2),
                0xf0..=0xf7 => (u32::from(b0 & 0x07), 3),
                _ => {
                    self.input.push_front(b0);
                    return Err(self.fail());
                }
            };

            if self.input.len() < trailing {
                self.input.push_front(b0);
                if self.input_ended {
                    // The sequence can never complete.
                    return Err(self.fail());
                }
                return Ok(None);
            }
            if self.input.iter().take(trailing).any(|&b| b & 0xc0 != 0x80) {
                self.input.push_front(b0);
                return Err(self.fail());
            }
            for b in self.input.drain(..trailing) {
                value = (value << 6) | u32::from(b & 0x3f);
            }

            // Over-long encodings decode to whatever they spell; values that
            // are not Unicode scalars cannot be represented and are refused.
            let Some(ch) = char::from_u32(value) else {
                return Err(self.fail());
            };

            if std::mem::replace(&mut self.prev_was_cr, false) && ch == '\n' {
                // The LF of a CRLF pair; its line was already terminated.
                continue;
            }

            let pos = self.endpoint();
            if is_newline(ch) {
                self.prev_was_cr = ch == '\r';
                self.chars.push('\n');
                self.line_starts.push(self.chars.len());
                return Ok(Some(('\n', pos)));
            }
            self.chars.push(ch);
            return Ok(Some((ch, pos)));
        }
    }

    fn state(&self) -> SourceState {
        if self.error {
            SourceState::Error
        } else if !self.input.is_empty() {
            SourceState::Some
        } else if self.input_ended {
            SourceState::Eof
        } else {
            SourceState::Exhausted
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn get_char(&self, pos: SourcePos) -> char {
        assert!(!self.error, "source has an error");
        assert!(pos.col < self.line_size(pos.line), "column out of range");
        self.chars[self.line_starts[pos.line] + pos.col]
    }

    fn line_size(&self, line: usize) -> usize {
        let end = if line + 1 < self.line_starts.len() {
            self.line_starts[line + 1]
        } else {
            self.chars.len()
        };
        end - self.line_starts[line]
    }

    fn endpoint(&self) -> SourcePos {
        let line = self.line_starts.len() - 1;
        SourcePos::new(line, self.chars.len() - self.line_starts[line])
    }
}

/// Line terminators collapsed to `'\n'` on intake: LF, CR, VT, FF, NEL,
/// LINE SEPARATOR, PARAGRAPH SEPARATOR.
fn is_newline(ch: char) -> bool {
    matches!(
        ch,
        '\n' | '\r' | '\u{000b}' | '\u{000c}' | '\u{0085}' | '\u{2028}' | '\u{2029}'
    )
}
