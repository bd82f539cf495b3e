//! Streaming source layer for the aha front-end.
//!
//! Accepts UTF-8 bytes incrementally, in arbitrary chunks that may split a
//! code point, decodes them, collapses every Unicode line terminator to
//! `'\n'`, and keeps the decoded text addressable by `(line, column)` so
//! diagnostics can point back at any character.

pub mod source;

pub use source::{InvalidByteSequence, ReplSource, Source, SourcePos, SourceState};

#[cfg(test)]
mod adversarial_tests;
