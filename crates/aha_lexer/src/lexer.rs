//! Core lexer implementation.
//!
//! A layered state machine over a pull-driven [`Source`]: the outer layer
//! tracks line layout (indentation, significant newlines), the inner layer
//! recognizes one token family at a time, and string literals carry their
//! own sub-states for raw bodies and `${ … }` interpolation. The machine
//! suspends whenever the source is starved and resumes on the next call
//! without losing a character.

use std::collections::VecDeque;
use std::mem;

use aha_source::{Source, SourcePos, SourceState};
use log::{debug, trace};
use unicode_general_category::{get_general_category, GeneralCategory};

use crate::token::{LexError, LexerError, LexerErrorKind, NumberToken, Token, TokenData};

/// Characters that may start or continue a punctuator.
const PUNCT_CHARS: &str = "~!@$%^&*()-=+[];:,./<>?|";

/// Punctuator table; maximal munch picks the longest entry matching a
/// prefix of the pending text.
const PUNCTS: &[&str] = &[
    "~", "!", "@", "$", "%", "^", "&", "*", "(", ")", "-", "=", "+",
    "[", "]", ";", ":", ",", ".", "/", "<", ">", "?",
    "++", "--", ">>", "<<", "==", "!=", "<=", ">=", "&&", "||",
    "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<=", ">>=", ":=:",
    "::", "->", "=>", "|>", "&>", "<&", "?.",
];

/// Reserved words.
const KEYWORDS: &[&str] = &[
    "module", "import", "class", "interface", "enum", "static", "final",
    "public", "private", "protected", "internal",
    "func", "in", "let", "var", "this", "event", "curry", "uncurry",
    "byte", "sbyte", "short", "ushort", "int", "uint", "long", "ulong",
    "bool", "object", "string",
];

/// Outcome of the most recent [`Lexer::lex`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexResult {
    /// A token was produced.
    Done,
    /// The source ran dry mid-stream; feed it and call again.
    Exhausted,
    /// The source reached EOF with nothing left in flight.
    Eof,
    /// A lexer error was raised; clear the buffer to recover.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    /// Consuming the blank prefix of a line.
    Indent,
    /// Recognizing token bodies.
    Any,
    /// After a multi-line block comment; only blanks may follow on the line.
    AfterComment,
    /// A lexer error was raised and not yet cleared.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Radix {
    Binary,
    Octal,
    Decimal,
    Hex,
}

impl Radix {
    fn value(self) -> u32 {
        match self {
            Radix::Binary => 2,
            Radix::Octal => 8,
            Radix::Decimal => 10,
            Radix::Hex => 16,
        }
    }

    fn digits(self) -> &'static str {
        match self {
            Radix::Binary => "01",
            Radix::Octal => "01234567",
            Radix::Decimal => "0123456789",
            Radix::Hex => "0123456789ABCDEFabcdef",
        }
    }

    fn exponent_chars(self) -> &'static str {
        match self {
            Radix::Decimal => "eE",
            _ => "pP",
        }
    }

    /// Second character of the literal prefix selecting this radix.
    fn prefix_chars(self) -> &'static str {
        match self {
            Radix::Binary => "bB",
            Radix::Octal => "cC",
            Radix::Decimal => "dD",
            Radix::Hex => "xX",
        }
    }
}

/// The token family being recognized. One family is active at a time, so
/// modeling this as an enum (rather than a bag of booleans) keeps impossible
/// combinations unrepresentable; the one-character ambiguities get their own
/// pending variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Identifier,
    /// `0` seen; radix selection pending on the second character.
    UnknownNumber,
    Number {
        radix: Radix,
        /// Index of the first `.` in the pending text.
        idx_float_sep: Option<usize>,
        /// Index of the exponent marker.
        idx_float_exp: Option<usize>,
        /// Index where the postfix begins.
        idx_postfix: Option<usize>,
    },
    Punct,
    /// `/` seen; punctuator, line comment, or block comment pending.
    Slash,
    /// `@` seen; punctuator, raw string, or interpolated string pending.
    AtSign,
    LineComment,
    BlockComment {
        contains_newline: bool,
        might_close: bool,
    },
    NormalString,
    RawString,
    InterpolString,
}

impl Family {
    fn number(radix: Radix) -> Family {
        Family::Number {
            radix,
            idx_float_sep: None,
            idx_float_exp: None,
            idx_postfix: None,
        }
    }
}

/// The aha lexer.
///
/// Owns no input beyond a push-back queue; the [`Source`] keeps the text.
/// Not thread-safe by construction: both `lex` and the source it drives
/// need exclusive borrows.
pub struct Lexer {
    /// Pushed-back code points, with the position of the first one.
    buf: VecDeque<char>,
    buf_beg: SourcePos,

    /// Text of the in-flight token, with the position of its first code point.
    tok_str: Vec<char>,
    tok_beg: SourcePos,

    state: LexState,
    family: Family,

    /// Blank prefix defining the current nesting.
    indent_str: Vec<char>,
    /// Prefix length per enclosing block; the bottom entry 0 is the top
    /// level, so the emitted level equals the stack depth.
    indent_pos: Vec<usize>,

    /// An interpolated string is in progress (between its `Start` and `End`
    /// tokens).
    interpol_after: bool,
    /// The next `}` resumes the interpolated string.
    enable_interpol_block_end: bool,

    last_result: LexResult,
    contextual_keywords: Vec<String>,
}

impl Lexer {
    pub fn new() -> Lexer {
        Lexer {
            buf: VecDeque::new(),
            buf_beg: SourcePos::new(0, 0),
            tok_str: Vec::new(),
            tok_beg: SourcePos::new(0, 0),
            state: LexState::Indent,
            family: Family::Identifier,
            indent_str: Vec::new(),
            indent_pos: vec![0],
            interpol_after: false,
            enable_interpol_block_end: false,
            last_result: LexResult::Exhausted,
            contextual_keywords: Vec::new(),
        }
    }

    /// Drop the push-back buffer and the in-flight token; the next `lex`
    /// starts at a line boundary. This is the recovery step after a
    /// [`LexerError`].
    pub fn clear_buffer(&mut self) {
        if !self.buf.is_empty() || !self.tok_str.is_empty() {
            debug!(
                "lexer dropped {} buffered and {} in-flight code points",
                self.buf.len(),
                self.tok_str.len()
            );
        }
        self.buf.clear();
        self.tok_str.clear();
        self.state = LexState::Indent;
    }

    /// [`clear_buffer`](Lexer::clear_buffer), and additionally reset the
    /// interpolation flags and the last result.
    pub fn clear_all(&mut self) {
        self.clear_buffer();
        self.interpol_after = false;
        self.enable_interpol_block_end = false;
        self.last_result = LexResult::Exhausted;
    }

    pub fn last_result(&self) -> LexResult {
        self.last_result
    }

    /// Install the identifiers to classify as
    /// [`TokenData::ContextualKeyword`]. Checked before the reserved words.
    pub fn set_contextual_keywords(&mut self, keywords: Vec<String>) {
        self.contextual_keywords = keywords;
    }

    /// Toggle recognition of `}` as the return into an interpolated string.
    /// The parser turns this off while it consumes the embedded expression
    /// and back on once its bracket balance says the next `}` is the
    /// matching one.
    ///
    /// # Panics
    /// Panics when no interpolated string is in progress.
    pub fn enable_interpolated_block_end(&mut self, enable: bool) {
        assert!(
            self.interpol_after,
            "interpolated block end can only be toggled during an interpolated string"
        );
        self.enable_interpol_block_end = enable;
    }

    /// Pull code points from `src` until a token is complete.
    ///
    /// `Ok(None)` means no token could be produced; [`last_result`]
    /// distinguishes a starved source ([`LexResult::Exhausted`], feed it
    /// and call again) from a finished one ([`LexResult::Eof`]). When EOF
    /// arrives mid-token, a synthetic terminator closes the token if the
    /// family allows it.
    ///
    /// On [`LexError::Lexer`] the offending text is parked in the push-back
    /// buffer and the lexer refuses further work until
    /// [`clear_buffer`](Lexer::clear_buffer). A source-side decoding error
    /// does not poison the lexer; clear the source instead.
    ///
    /// [`last_result`]: Lexer::last_result
    ///
    /// # Panics
    /// Panics if a previous lexer error has not been cleared.
    pub fn lex<S: Source>(&mut self, src: &mut S) -> Result<Option<Token>, LexError> {
        assert!(self.state != LexState::Error, "lexer has an error");

        let mut injected_eof = false;

        loop {
            // Next code point: push-back buffer first, then the source.
            let (ch, pos, at_eof) = if let Some(c) = self.buf.pop_front() {
                let p = self.buf_beg;
                self.buf_beg = p.next(src);
                (c, p, false)
            } else {
                match src.read_char()? {
                    Some((c, p)) => (c, p, false),
                    None => {
                        if src.state() != SourceState::Eof {
                            self.last_result = LexResult::Exhausted;
                            return Ok(None);
                        }
                        if self.tok_str.is_empty() || injected_eof {
                            self.last_result = LexResult::Eof;
                            return Ok(None);
                        }
                        // Let the in-flight token close on a synthetic
                        // terminator; at most one per call, so a family
                        // that cannot close (an unterminated string, say)
                        // reports EOF instead of spinning.
                        injected_eof = true;
                        ('\0', src.endpoint().prev(src), true)
                    }
                }
            };

            // The terminator is never part of any token text.
            let mut skip = at_eof;
            let mut done = false;
            let mut emitted: Option<Token> = None;

            if self.tok_str.is_empty() {
                self.tok_beg = pos;
            }

            match self.state {
                LexState::Indent => {
                    if ch == '\n' || at_eof {
                        // Blank line.
                        emitted = Some(self.emit(src, TokenData::Newline, self.tok_beg, pos));
                        done = true;
                        skip = true;
                    } else if !is_separator(ch) {
                        let level = match self.resolve_indent() {
                            Ok(level) => level,
                            Err(kind) => return Err(self.fail(src, ch, skip, pos, kind)),
                        };
                        emitted =
                            Some(self.emit(src, TokenData::Indent { level }, self.tok_beg, pos));
                        done = true;
                        self.state = LexState::Any;
                    }
                }

                LexState::Any => {
                    if self.tok_str.is_empty() {
                        if is_separator(ch) {
                            skip = true;
                        } else if ch == '\n' {
                            emitted =
                                Some(self.emit(src, TokenData::Newline, self.tok_beg, pos));
                            done = true;
                            skip = true;
                            self.state = LexState::Indent;
                        } else {
                            self.family = match self.classify_start(ch) {
                                Some(family) => family,
                                None => {
                                    return Err(self.fail(
                                        src,
                                        ch,
                                        skip,
                                        pos,
                                        LexerErrorKind::UnexpectedCharacter,
                                    ))
                                }
                            };
                        }
                    } else {
                        // One-character ambiguities resolve on the second
                        // character and re-enter the refined family at once.
                        'refine: loop {
                            match self.family {
                                Family::Slash => {
                                    self.family = match ch {
                                        '*' => Family::BlockComment {
                                            contains_newline: false,
                                            might_close: false,
                                        },
                                        '/' => Family::LineComment,
                                        _ => Family::Punct,
                                    };
                                    continue 'refine;
                                }

                                Family::AtSign => {
                                    self.family = match ch {
                                        '\'' | '"' => Family::RawString,
                                        '`' => Family::InterpolString,
                                        _ => Family::Punct,
                                    };
                                    continue 'refine;
                                }

                                Family::UnknownNumber => {
                                    match ch {
                                        'b' | 'B' => self.family = Family::number(Radix::Binary),
                                        'c' | 'C' => self.family = Family::number(Radix::Octal),
                                        'x' | 'X' => self.family = Family::number(Radix::Hex),
                                        'd' | 'D' | '0'..='9' => {
                                            self.family = Family::number(Radix::Decimal)
                                        }
                                        '.' | 'e' => {
                                            // `0.` / `0e…`: a decimal float.
                                            self.family = Family::number(Radix::Decimal);
                                            continue 'refine;
                                        }
                                        c if is_identifier_start(c) => {
                                            self.family = Family::Number {
                                                radix: Radix::Decimal,
                                                idx_float_sep: None,
                                                idx_float_exp: None,
                                                idx_postfix: Some(1),
                                            };
                                        }
                                        _ => {
                                            return Err(self.fail(
                                                src,
                                                ch,
                                                skip,
                                                pos,
                                                LexerErrorKind::UnexpectedCharacter,
                                            ))
                                        }
                                    }
                                }

                                Family::LineComment => {
                                    if ch == '\n' {
                                        emitted = Some(self.emit(
                                            src,
                                            TokenData::Newline,
                                            self.tok_beg,
                                            pos,
                                        ));
                                        done = true;
                                        skip = true;
                                        self.state = LexState::Indent;
                                    }
                                }

                                Family::BlockComment {
                                    contains_newline,
                                    might_close,
                                } => {
                                    // The closing `*` must not be the opening
                                    // one, hence the length check.
                                    if ch == '*' && self.tok_str.len() >= 2 {
                                        self.family = Family::BlockComment {
                                            contains_newline,
                                            might_close: true,
                                        };
                                    } else if might_close && ch == '/' {
                                        if contains_newline {
                                            self.state = LexState::AfterComment;
                                        }
                                        self.tok_str.clear();
                                        self.tok_beg = pos;
                                        skip = true;
                                    } else {
                                        self.family = Family::BlockComment {
                                            contains_newline: contains_newline || ch == '\n',
                                            might_close: false,
                                        };
                                    }
                                }

                                Family::NormalString => {
                                    if ch != ' ' && (is_separator(ch) || ch == '\n') {
                                        return Err(self.fail(
                                            src,
                                            ch,
                                            skip,
                                            pos,
                                            LexerErrorKind::ForbiddenStringCharacter,
                                        ));
                                    }
                                    if ch == self.tok_str[0] && self.tok_str.last() != Some(&'\\')
                                    {
                                        let delimiter = self.tok_str[0];
                                        let text: String = self.tok_str[1..].iter().collect();
                                        emitted = Some(self.emit(
                                            src,
                                            TokenData::NormalString { delimiter, text },
                                            self.tok_beg,
                                            pos,
                                        ));
                                        done = true;
                                        skip = true;
                                    }
                                }

                                Family::RawString => {
                                    if self.tok_str.len() >= 3
                                        && self.tok_str.last() == Some(&self.tok_str[1])
                                        && ch != self.tok_str[1]
                                    {
                                        let delimiter = self.tok_str[1];
                                        let run = self
                                            .tok_str
                                            .iter()
                                            .rev()
                                            .take_while(|&&c| c == delimiter)
                                            .count();
                                        // An odd run means the doubled pairs
                                        // are followed by a lone closer.
                                        if (run + 1) % 2 == 0 {
                                            let text: String = self.tok_str
                                                [2..self.tok_str.len() - 1]
                                                .iter()
                                                .collect();
                                            emitted = Some(self.emit(
                                                src,
                                                TokenData::RawString { delimiter, text },
                                                self.tok_beg,
                                                pos,
                                            ));
                                            done = true;
                                        }
                                    }
                                }

                                Family::InterpolString => {
                                    let len = self.tok_str.len();
                                    let first = self.tok_str[0];
                                    if ch != ' ' && (is_separator(ch) || ch == '\n') {
                                        return Err(self.fail(
                                            src,
                                            ch,
                                            skip,
                                            pos,
                                            LexerErrorKind::ForbiddenStringCharacter,
                                        ));
                                    }
                                    if (len == 1 && (first == '`' || first == '@'))
                                        || (len == 2 && first == '@')
                                    {
                                        // Still inside the opener.
                                    } else if ch == '`' && self.tok_str.last() != Some(&'\\') {
                                        let body = if first == '@' { 2 } else { 1 };
                                        let text: String =
                                            self.tok_str[body..].iter().collect();
                                        emitted = Some(self.emit(
                                            src,
                                            TokenData::InterpolStringEnd { text },
                                            self.tok_beg,
                                            pos,
                                        ));
                                        self.interpol_after = false;
                                        self.enable_interpol_block_end = false;
                                        done = true;
                                        skip = true;
                                    } else if self.tok_str.last() == Some(&'$') && ch == '{' {
                                        let body = if first == '@' { 2 } else { 1 };
                                        let text: String =
                                            self.tok_str[body..len - 1].iter().collect();
                                        let data = if first == '}' {
                                            TokenData::InterpolStringMid { text }
                                        } else {
                                            self.interpol_after = true;
                                            self.enable_interpol_block_end = true;
                                            TokenData::InterpolStringStart { text }
                                        };
                                        emitted =
                                            Some(self.emit(src, data, self.tok_beg, pos));
                                        done = true;
                                        skip = true;
                                    }
                                }

                                Family::Identifier => {
                                    if !is_identifier_char(ch) {
                                        let text: String = self.tok_str.iter().collect();
                                        let data = if self
                                            .contextual_keywords
                                            .iter()
                                            .any(|k| k == &text)
                                        {
                                            TokenData::ContextualKeyword { text }
                                        } else if KEYWORDS.contains(&text.as_str()) {
                                            TokenData::Keyword { text }
                                        } else {
                                            TokenData::Identifier { text }
                                        };
                                        emitted =
                                            Some(self.emit(src, data, self.tok_beg, pos));
                                        done = true;
                                    }
                                }

                                Family::Number {
                                    radix,
                                    mut idx_float_sep,
                                    mut idx_float_exp,
                                    mut idx_postfix,
                                } => {
                                    let len = self.tok_str.len();
                                    if idx_postfix.is_none() {
                                        if radix.digits().contains(ch) {
                                            // Digit for this radix.
                                        } else if ch == '.' {
                                            if idx_float_sep.is_none() && idx_float_exp.is_none()
                                            {
                                                idx_float_sep = Some(len);
                                            } else {
                                                done = true;
                                            }
                                        } else if idx_float_exp.is_none()
                                            && radix.exponent_chars().contains(ch)
                                        {
                                            idx_float_exp = Some(len);
                                        } else if is_identifier_start(ch) {
                                            if idx_float_exp == Some(len - 1) {
                                                // The marker was no exponent
                                                // after all; the postfix
                                                // starts there.
                                                idx_postfix = idx_float_exp;
                                                idx_float_exp = None;
                                            } else {
                                                idx_postfix = Some(len);
                                            }
                                        } else if idx_float_exp == Some(len - 1)
                                            && is_identifier_char(ch)
                                        {
                                            idx_postfix = idx_float_exp;
                                            idx_float_exp = None;
                                        } else {
                                            done = true;
                                        }

                                        if done
                                            && len == 2
                                            && self.tok_str[0] == '0'
                                            && "bBcCdDxX".contains(self.tok_str[1])
                                        {
                                            return Err(self.fail(
                                                src,
                                                ch,
                                                skip,
                                                pos,
                                                LexerErrorKind::UnexpectedEndOfNumber,
                                            ));
                                        }
                                    } else if !is_identifier_char(ch) {
                                        done = true;
                                    }

                                    if done {
                                        let number = self.slice_number(
                                            radix,
                                            idx_float_sep,
                                            idx_float_exp,
                                            idx_postfix,
                                        );
                                        emitted = Some(self.emit(
                                            src,
                                            TokenData::Number(number),
                                            self.tok_beg,
                                            pos,
                                        ));
                                    } else {
                                        self.family = Family::Number {
                                            radix,
                                            idx_float_sep,
                                            idx_float_exp,
                                            idx_postfix,
                                        };
                                    }
                                }

                                Family::Punct => {
                                    if !PUNCT_CHARS.contains(ch) {
                                        done = true;
                                    }

                                    // Longest table entry the pending text
                                    // already covers, and how many entries
                                    // it could still grow into.
                                    let mut matched = 0;
                                    let mut candidates = 0;
                                    for entry in PUNCTS {
                                        let sz = entry.len().min(self.tok_str.len());
                                        if self.tok_str[..sz]
                                            .iter()
                                            .copied()
                                            .eq(entry.chars().take(sz))
                                        {
                                            if self.tok_str.len() >= entry.len() {
                                                matched = matched.max(entry.len());
                                            } else {
                                                candidates += 1;
                                            }
                                        }
                                    }

                                    if done || candidates == 0 {
                                        if matched == 0 {
                                            return Err(self.fail(
                                                src,
                                                ch,
                                                skip,
                                                self.tok_beg,
                                                LexerErrorKind::UnexpectedCharacter,
                                            ));
                                        }

                                        let text: String =
                                            self.tok_str[..matched].iter().collect();
                                        let beg = self.tok_beg;
                                        let mut end = beg;
                                        for _ in 0..matched {
                                            end = end.next(src);
                                        }

                                        trace!("{}: punct {{ '{text}' }} at {beg}", src.name());
                                        self.tok_str.drain(..matched);
                                        self.tok_beg = end;
                                        emitted = Some(Token {
                                            source_name: src.name().to_string(),
                                            beg,
                                            end,
                                            data: TokenData::Punct { text },
                                        });
                                        done = true;
                                    }
                                }
                            }
                            break;
                        }
                    }
                }

                LexState::AfterComment => {
                    if ch == '\n' {
                        emitted = Some(self.emit(src, TokenData::Newline, self.tok_beg, pos));
                        done = true;
                        skip = true;
                        self.state = LexState::Indent;
                    } else if !is_separator(ch) {
                        return Err(self.fail(
                            src,
                            ch,
                            skip,
                            pos,
                            LexerErrorKind::MultiLineCommentLineNotEmpty,
                        ));
                    }
                }

                LexState::Error => unreachable!("checked on entry"),
            }

            if !skip {
                self.tok_str.push(ch);
            }
            if done {
                // Park whatever trails the finished token for the next call.
                self.revert();
            }
            if let Some(token) = emitted {
                self.last_result = LexResult::Done;
                return Ok(Some(token));
            }
        }
    }

    // === Internals ===

    /// Select the token family from the first code point, or `None` when the
    /// character cannot start any token.
    fn classify_start(&self, ch: char) -> Option<Family> {
        if is_identifier_start(ch) {
            Some(Family::Identifier)
        } else if ch == '0' {
            Some(Family::UnknownNumber)
        } else if ch.is_ascii_digit() {
            Some(Family::number(Radix::Decimal))
        } else if PUNCT_CHARS.contains(ch) {
            Some(match ch {
                '/' => Family::Slash,
                '@' => Family::AtSign,
                _ => Family::Punct,
            })
        } else if ch == '#' {
            Some(Family::LineComment)
        } else if ch == '\'' || ch == '"' {
            Some(Family::NormalString)
        } else if ch == '`' {
            Some(Family::InterpolString)
        } else if self.enable_interpol_block_end && ch == '}' {
            Some(Family::InterpolString)
        } else {
            None
        }
    }

    /// Compare the blank prefix just consumed against the current nesting
    /// and return the new indent level.
    fn resolve_indent(&mut self) -> Result<u32, LexerErrorKind> {
        use LexerErrorKind::InvalidIndentation;

        let sz = self.tok_str.len();
        if sz == self.indent_str.len() {
            if self.tok_str != self.indent_str {
                return Err(InvalidIndentation);
            }
        } else if sz < self.indent_str.len() {
            // Pop back to an enclosing level of exactly this width.
            let mut level = self.indent_pos.len();
            let found = loop {
                level -= 1;
                let prefix = self.indent_pos[level];
                if sz > prefix {
                    return Err(InvalidIndentation);
                }
                if sz == prefix {
                    break level;
                }
                // The bottom entry is width 0, so the walk ends above.
            };
            if self.indent_str[..sz] != self.tok_str[..] {
                return Err(InvalidIndentation);
            }
            self.indent_pos.truncate(found + 1);
            self.indent_str = mem::take(&mut self.tok_str);
        } else {
            if self.tok_str[..self.indent_str.len()] != self.indent_str[..] {
                return Err(InvalidIndentation);
            }
            self.indent_pos.push(sz);
            self.indent_str = mem::take(&mut self.tok_str);
        }
        Ok(self.indent_pos.len() as u32)
    }

    /// Cut the pending number text into its integer, fraction, exponent and
    /// postfix pieces.
    fn slice_number(
        &self,
        radix: Radix,
        sep: Option<usize>,
        exp: Option<usize>,
        post: Option<usize>,
    ) -> NumberToken {
        let t = &self.tok_str;
        let mut beg1 = 0;
        let mut end1 = t.len();
        let (mut beg2, mut end2) = (end1, end1);
        let (mut beg3, mut end3) = (end1, end1);
        let mut beg4 = end1;
        let mut is_float = false;

        if t.len() >= 3 && t[0] == '0' && radix.prefix_chars().contains(t[1]) {
            beg1 = 2;
        }
        if let Some(i) = sep {
            is_float = true;
            end1 = i;
            beg2 = i + 1;
        }
        if let Some(i) = exp {
            is_float = true;
            end2 = i;
            beg3 = i + 1;
            if beg2 > end2 {
                end1 = end2;
                beg2 = end2;
            }
        }
        if let Some(i) = post {
            end3 = i;
            beg4 = i;
            if beg3 > end3 {
                end2 = end3;
                beg3 = end3;
                if beg2 > end2 {
                    end1 = end2;
                    beg2 = end2;
                }
            }
        }

        let piece = |b: usize, e: usize| t[b..e].iter().collect::<String>();
        NumberToken {
            radix: radix.value(),
            integer: piece(beg1, end1),
            fraction: piece(beg2, end2),
            exponent: piece(beg3, end3),
            postfix: piece(beg4, t.len()),
            is_float,
        }
    }

    /// Build a token and reset the pending text to start at `end`.
    fn emit<S: Source>(
        &mut self,
        src: &S,
        data: TokenData,
        beg: SourcePos,
        end: SourcePos,
    ) -> Token {
        trace!("{}: {data} at {beg}", src.name());
        self.tok_str.clear();
        self.tok_beg = end;
        Token {
            source_name: src.name().to_string(),
            beg,
            end,
            data,
        }
    }

    /// Move the in-flight text back to the front of the push-back buffer.
    fn revert(&mut self) {
        self.buf_beg = self.tok_beg;
        for c in self.tok_str.drain(..).rev() {
            self.buf.push_front(c);
        }
    }

    /// Revert the in-flight token (plus the current character) and poison
    /// the lexer until the buffer is cleared.
    fn fail<S: Source>(
        &mut self,
        src: &S,
        ch: char,
        skip: bool,
        pos: SourcePos,
        kind: LexerErrorKind,
    ) -> LexError {
        if !skip {
            self.tok_str.push(ch);
        }
        self.revert();
        self.state = LexState::Error;
        self.last_result = LexResult::Error;
        let err = LexerError {
            source_name: src.name().to_string(),
            pos,
            kind,
        };
        debug!("{err}");
        LexError::Lexer(err)
    }
}

impl Default for Lexer {
    fn default() -> Lexer {
        Lexer::new()
    }
}

// === Character classes ===

/// Horizontal blank: TAB or a Unicode space separator.
fn is_separator(ch: char) -> bool {
    ch == '\t' || get_general_category(ch) == GeneralCategory::SpaceSeparator
}

/// May begin an identifier: a letter, a letter-number, or `_`.
fn is_identifier_start(ch: char) -> bool {
    if ch == '_' {
        return true;
    }
    matches!(
        get_general_category(ch),
        GeneralCategory::UppercaseLetter
            | GeneralCategory::LowercaseLetter
            | GeneralCategory::TitlecaseLetter
            | GeneralCategory::ModifierLetter
            | GeneralCategory::OtherLetter
            | GeneralCategory::LetterNumber
    )
}

/// May continue an identifier: starts plus marks, digits, connectors, and
/// format characters.
fn is_identifier_char(ch: char) -> bool {
    is_identifier_start(ch)
        || matches!(
            get_general_category(ch),
            GeneralCategory::NonspacingMark
                | GeneralCategory::SpacingMark
                | GeneralCategory::DecimalNumber
                | GeneralCategory::ConnectorPunctuation
                | GeneralCategory::Format
        )
}
