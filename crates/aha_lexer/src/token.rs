//! Token and error types for the aha lexer.

use std::fmt;

use aha_source::{InvalidByteSequence, SourcePos};
use thiserror::Error;

/// A single classified token with its source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Name of the source the token came from.
    pub source_name: String,
    /// Position of the first code point.
    pub beg: SourcePos,
    /// Position where the token ends.
    pub end: SourcePos,
    pub data: TokenData,
}

/// Every kind of token the lexer emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenData {
    /// Start-of-line token carrying the block nesting depth.
    Indent { level: u32 },
    /// End of a logical line.
    Newline,
    Punct { text: String },
    Keyword { text: String },
    /// An identifier matching a caller-installed contextual keyword.
    ContextualKeyword { text: String },
    Identifier { text: String },
    Number(NumberToken),
    /// Quoted literal; outer quotes stripped, escapes not yet decoded.
    NormalString { delimiter: char, text: String },
    /// `@`-quoted literal; may span lines, doubled delimiters kept verbatim.
    RawString { delimiter: char, text: String },
    /// Leading fragment of an interpolated literal, up to the first `${`.
    InterpolStringStart { text: String },
    /// Fragment between a `}` and the next `${`.
    InterpolStringMid { text: String },
    /// Closing fragment of an interpolated literal. A literal without any
    /// `${` emits only this token.
    InterpolStringEnd { text: String },
}

/// Textual pieces of a numeric literal; no numeric interpretation happens
/// at lex time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumberToken {
    pub radix: u32,
    pub integer: String,
    pub fraction: String,
    pub exponent: String,
    pub postfix: String,
    pub is_float: bool,
}

impl fmt::Display for TokenData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenData::Indent { level } => write!(f, "indent {{ {level} }}"),
            TokenData::Newline => write!(f, "newline {{}}"),
            TokenData::Punct { text } => write!(f, "punct {{ '{text}' }}"),
            TokenData::Keyword { text } => write!(f, "keyword {{ '{text}' }}"),
            TokenData::ContextualKeyword { text } => {
                write!(f, "contextual keyword {{ '{text}' }}")
            }
            TokenData::Identifier { text } => write!(f, "identifier {{ '{text}' }}"),
            TokenData::Number(number) => fmt::Display::fmt(number, f),
            TokenData::NormalString { text, .. } => write!(f, "string {{ '{text}' }}"),
            TokenData::RawString { text, .. } => write!(f, "raw string {{ '{text}' }}"),
            TokenData::InterpolStringStart { text } => {
                write!(f, "interpol start {{ '{text}' }}")
            }
            TokenData::InterpolStringMid { text } => write!(f, "interpol mid {{ '{text}' }}"),
            TokenData::InterpolStringEnd { text } => write!(f, "interpol end {{ '{text}' }}"),
        }
    }
}

impl fmt::Display for NumberToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_float {
            write!(
                f,
                "integer [radix:{}] {{ {}{} }}",
                self.radix, self.integer, self.postfix
            )
        } else {
            write!(f, "float [radix:{}] {{ {}", self.radix, self.integer)?;
            if !self.fraction.is_empty() {
                write!(f, ".{}", self.fraction)?;
            }
            if !self.exponent.is_empty() {
                let marker = if self.radix == 10 { 'e' } else { 'p' };
                write!(f, "{}{}", marker, self.exponent)?;
            }
            write!(f, "{} }}", self.postfix)
        }
    }
}

/// The kinds of failure the lexer itself raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexerErrorKind {
    InvalidIndentation,
    UnexpectedCharacter,
    UnexpectedEndOfNumber,
    /// A non-raw string literal contains a separator other than space, or a
    /// newline.
    ForbiddenStringCharacter,
    /// Something other than blanks follows the close of a multi-line block
    /// comment on the same line.
    MultiLineCommentLineNotEmpty,
}

impl fmt::Display for LexerErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LexerErrorKind::InvalidIndentation => "invalid indentation",
            LexerErrorKind::UnexpectedCharacter => "unexpected character",
            LexerErrorKind::UnexpectedEndOfNumber => "unexpected end of number literal",
            LexerErrorKind::ForbiddenStringCharacter => {
                "non-raw string literal cannot contain separator or newline character except space"
            }
            LexerErrorKind::MultiLineCommentLineNotEmpty => {
                "the line which contains the end of a multi-line comment must be empty"
            }
        })
    }
}

/// A lexing failure with its position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{source_name}:{pos}: lexer error: {kind}")]
pub struct LexerError {
    pub source_name: String,
    pub pos: SourcePos,
    pub kind: LexerErrorKind,
}

/// Any failure surfaced by [`crate::Lexer::lex`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error(transparent)]
    Source(#[from] InvalidByteSequence),
    #[error(transparent)]
    Lexer(#[from] LexerError),
}
