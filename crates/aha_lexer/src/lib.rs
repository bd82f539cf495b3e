//! aha lexer — turns a stream of code points into classified tokens.
//!
//! Pull-driven: [`Lexer::lex`] reads from an [`aha_source::Source`] until a
//! token is complete or the source runs dry, and resumes exactly where it
//! stopped once more bytes arrive. Handles:
//! - Layout: indent levels and significant newlines
//! - Identifiers, keywords, caller-installed contextual keywords
//! - Numbers (binary/octal/decimal/hex, floats, postfixes)
//! - Maximal-munch punctuators
//! - Normal, raw, and interpolated strings (`${ … }` splits)
//! - Line and block comments

pub mod lexer;
pub mod token;

pub use lexer::{LexResult, Lexer};
pub use token::{LexError, LexerError, LexerErrorKind, NumberToken, Token, TokenData};
