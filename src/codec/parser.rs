//! Grammar driver with sticky failure.
//!
//! The first mismatch records a [`ParseFailure`]; from then on every
//! `expect_*` call is a no-op that returns a placeholder. Callers build their
//! result unconditionally and check [`Parser::failure`] once at the end.

use std::fmt;

use super::lexer::{Lexer, Position, Token};

/// What the grammar wanted when it gave up.
#[derive(Debug, Clone, PartialEq)]
pub enum Expected {
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// An unsigned integer literal
    Int,
    /// A float or integer literal
    Float,
    /// A quoted string
    Str,
    /// A quoted string or `NULL`
    StrOrNull,
    /// Nothing more
    EndOfInput,
    /// A semantic rule was violated (bad type id, out of range number, ...)
    Valid(String),
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::LeftParen => write!(f, "`(`"),
            Expected::RightParen => write!(f, "`)`"),
            Expected::Int => write!(f, "integer"),
            Expected::Float => write!(f, "number"),
            Expected::Str => write!(f, "string"),
            Expected::StrOrNull => write!(f, "string or NULL"),
            Expected::EndOfInput => write!(f, "end of input"),
            Expected::Valid(what) => write!(f, "{}", what),
        }
    }
}

/// The first grammar error of a message.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseFailure {
    pub expected: Expected,
    pub found: Token,
    pub position: Position,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: expected {}, found {}", self.position, self.expected, self.found)
    }
}

impl std::error::Error for ParseFailure {}

/// Deepest nesting of composite values accepted in one message.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Recursive-descent helper over one message.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    peeked: Option<(Token, Position)>,
    last: (Token, Position),
    failure: Option<ParseFailure>,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Start parsing a message.
    pub fn new(text: &'a str) -> Self {
        Self {
            lexer: Lexer::new(text),
            peeked: None,
            last: (Token::Eof, Position::default()),
            failure: None,
            depth: 0,
        }
    }

    /// Step one level into a nested rule. Past [`MAX_NESTING_DEPTH`] this
    /// records a failure and returns `false`; the caller must not recurse.
    pub fn enter(&mut self) -> bool {
        if self.failed() {
            return false;
        }
        if self.depth >= MAX_NESTING_DEPTH {
            self.fail(format!("nesting depth of at most {}", MAX_NESTING_DEPTH));
            return false;
        }
        self.depth += 1;
        true
    }

    /// Leave a level entered with [`Parser::enter`].
    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Whether a failure has been recorded.
    pub fn failed(&self) -> bool {
        self.failure.is_some()
    }

    /// The recorded failure, if any.
    pub fn failure(&self) -> Option<&ParseFailure> {
        self.failure.as_ref()
    }

    /// Consume the parser, yielding the recorded failure, if any.
    pub fn into_failure(self) -> Option<ParseFailure> {
        self.failure
    }

    /// Look at the next token without consuming it.
    pub fn peek(&mut self) -> &Token {
        let lexer = &mut self.lexer;
        let (tok, _) = self.peeked.get_or_insert_with(|| {
            let tok = lexer.next_token();
            (tok, lexer.token_position())
        });
        tok
    }

    /// Consume the next token.
    pub fn next(&mut self) -> Token {
        let (tok, pos) = match self.peeked.take() {
            Some(peeked) => peeked,
            None => {
                let tok = self.lexer.next_token();
                (tok, self.lexer.token_position())
            }
        };
        self.last = (tok.clone(), pos);
        tok
    }

    /// True when the next token closes the current form, or the parse is dead.
    ///
    /// Loops over open-ended lists use this as their exit condition so that
    /// a failed parse always terminates.
    pub fn at_close(&mut self) -> bool {
        self.failed() || matches!(self.peek(), Token::RightParen | Token::Eof)
    }

    /// True when no more tokens remain (or the parse is dead).
    pub fn at_end(&mut self) -> bool {
        self.failed() || matches!(self.peek(), Token::Eof)
    }

    /// Record a mismatch against the token just consumed.
    fn mismatch(&mut self, expected: Expected) {
        if self.failure.is_none() {
            let (found, position) = self.last.clone();
            self.failure = Some(ParseFailure {
                expected,
                found,
                position,
            });
        }
    }

    /// Record a semantic error at the token just consumed.
    pub fn fail(&mut self, what: impl Into<String>) {
        self.mismatch(Expected::Valid(what.into()));
    }

    /// Consume `(`.
    pub fn expect_open(&mut self) -> bool {
        if self.failed() {
            return false;
        }
        match self.next() {
            Token::LeftParen => true,
            _ => {
                self.mismatch(Expected::LeftParen);
                false
            }
        }
    }

    /// Consume `)`.
    pub fn expect_close(&mut self) -> bool {
        if self.failed() {
            return false;
        }
        match self.next() {
            Token::RightParen => true,
            _ => {
                self.mismatch(Expected::RightParen);
                false
            }
        }
    }

    /// Require that the message is exhausted.
    pub fn expect_end(&mut self) -> bool {
        if self.failed() {
            return false;
        }
        match self.next() {
            Token::Eof => true,
            _ => {
                self.mismatch(Expected::EndOfInput);
                false
            }
        }
    }

    /// Consume an unsigned integer literal. Float literals do not match.
    pub fn expect_uint(&mut self) -> u64 {
        if self.failed() {
            return 0;
        }
        match self.next() {
            Token::Int(v) => v,
            _ => {
                self.mismatch(Expected::Int);
                0
            }
        }
    }

    /// Consume an unsigned integer that must fit `u32`.
    pub fn expect_u32(&mut self) -> u32 {
        let v = self.expect_uint();
        match u32::try_from(v) {
            Ok(v) => v,
            Err(_) => {
                self.fail(format!("integer `{}` to fit 32 bits", v));
                0
            }
        }
    }

    /// Consume an optionally `-`-prefixed integer that must fit `i32`.
    pub fn expect_i32(&mut self) -> i32 {
        let negate = self.check_negate();
        let magnitude = i64::try_from(self.expect_uint()).unwrap_or(i64::MAX);
        let v = if negate { -magnitude } else { magnitude };
        match i32::try_from(v) {
            Ok(v) => v,
            Err(_) => {
                self.fail(format!("integer `{}` to fit 32 bits", v));
                0
            }
        }
    }

    /// Consume an optionally `-`-prefixed number as `f64`.
    ///
    /// Integer literals are coerced; the identifiers `inf` and `nan` are
    /// accepted so that every encoded float can be read back.
    pub fn expect_f64(&mut self) -> f64 {
        let negate = self.check_negate();
        if self.failed() {
            return 0.0;
        }
        let v = match self.next() {
            Token::Float(v) => v,
            Token::Int(v) => v as f64,
            Token::Ident(ref name) if name == "inf" => f64::INFINITY,
            Token::Ident(ref name) if name == "nan" => f64::NAN,
            _ => {
                self.mismatch(Expected::Float);
                return 0.0;
            }
        };
        if negate { -v } else { v }
    }

    /// Consume a quoted string.
    pub fn expect_string(&mut self) -> String {
        if self.failed() {
            return String::new();
        }
        match self.next() {
            Token::Str(s) => s,
            _ => {
                self.mismatch(Expected::Str);
                String::new()
            }
        }
    }

    /// Consume a quoted string or `NULL`.
    pub fn expect_optional_string(&mut self) -> Option<String> {
        if self.failed() {
            return None;
        }
        match self.next() {
            Token::Str(s) => Some(s),
            Token::Null => None,
            _ => {
                self.mismatch(Expected::StrOrNull);
                None
            }
        }
    }

    /// Consume a leading `-` if present.
    fn check_negate(&mut self) -> bool {
        if !self.failed() && matches!(self.peek(), Token::Minus) {
            self.next();
            true
        } else {
            false
        }
    }
}
