//! Tokenizer for the glue text grammar.
//!
//! Produces integers (decimal, octal, hex), floats, quoted strings,
//! case-insensitive identifiers, the `NULL` keyword and the punctuation
//! `(`, `)` and `-`. Whitespace, `#` line comments and `/* */` block
//! comments are skipped. Lexical problems are reported in-band as
//! [`Token::Error`] so the grammar layer can treat them as a mismatch.

use std::fmt;

/// A single lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `-` (sign prefix for numbers)
    Minus,
    /// Unsigned integer literal
    Int(u64),
    /// Floating point literal
    Float(f64),
    /// Quoted string with escapes resolved
    Str(String),
    /// Bare identifier, lower-cased
    Ident(String),
    /// The `NULL` keyword
    Null,
    /// Lexical error with a short description
    Error(String),
    /// End of input
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LeftParen => write!(f, "`(`"),
            Token::RightParen => write!(f, "`)`"),
            Token::Minus => write!(f, "`-`"),
            Token::Int(v) => write!(f, "integer `{}`", v),
            Token::Float(v) => write!(f, "float `{:?}`", v),
            Token::Str(s) => write!(f, "string {:?}", s),
            Token::Ident(s) => write!(f, "identifier `{}`", s),
            Token::Null => write!(f, "`NULL`"),
            Token::Error(msg) => write!(f, "invalid input ({})", msg),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

/// Line/column position inside the message, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Default for Position {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Tokenizer over one message.
pub struct Lexer<'a> {
    text: &'a str,
    pos: usize,
    here: Position,
    token_start: Position,
}

impl<'a> Lexer<'a> {
    /// Create a lexer for the given message text.
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            here: Position::default(),
            token_start: Position::default(),
        }
    }

    /// Position where the most recently returned token started.
    pub fn token_position(&self) -> Position {
        self.token_start
    }

    /// Produce the next token. Returns [`Token::Eof`] forever once the input is exhausted.
    pub fn next_token(&mut self) -> Token {
        if let Some(err) = self.skip_blanks() {
            return err;
        }
        self.token_start = self.here;

        let Some(c) = self.peek_byte() else {
            return Token::Eof;
        };

        match c {
            b'(' => {
                self.bump();
                Token::LeftParen
            }
            b')' => {
                self.bump();
                Token::RightParen
            }
            b'-' => {
                self.bump();
                Token::Minus
            }
            b'"' => self.lex_double_quoted(),
            b'\'' => self.lex_single_quoted(),
            b'0'..=b'9' => self.lex_number(),
            b'.' if self.peek_byte_at(1).is_some_and(|b| b.is_ascii_digit()) => self.lex_number(),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.lex_identifier(),
            _ => {
                let ch = self.text[self.pos..].chars().next().unwrap_or('\u{fffd}');
                for _ in 0..ch.len_utf8() {
                    self.bump();
                }
                Token::Error(format!("unexpected character {:?}", ch))
            }
        }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn peek_byte_at(&self, offset: usize) -> Option<u8> {
        self.text.as_bytes().get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek_byte()?;
        self.pos += 1;
        if b == b'\n' {
            self.here.line += 1;
            self.here.column = 1;
        } else if b & 0xC0 != 0x80 {
            // continuation bytes of a UTF-8 sequence do not advance the column
            self.here.column += 1;
        }
        Some(b)
    }

    /// Skip whitespace and comments. An unterminated block comment is an error token.
    fn skip_blanks(&mut self) -> Option<Token> {
        loop {
            match self.peek_byte() {
                Some(b' ' | b'\t' | b'\r' | b'\n') => {
                    self.bump();
                }
                Some(b'#') => {
                    while let Some(b) = self.bump() {
                        if b == b'\n' {
                            break;
                        }
                    }
                }
                Some(b'/') if self.peek_byte_at(1) == Some(b'*') => {
                    self.token_start = self.here;
                    self.bump();
                    self.bump();
                    loop {
                        match self.bump() {
                            Some(b'*') if self.peek_byte() == Some(b'/') => {
                                self.bump();
                                break;
                            }
                            Some(_) => {}
                            None => return Some(Token::Error("unterminated comment".into())),
                        }
                    }
                }
                _ => return None,
            }
        }
    }

    fn lex_identifier(&mut self) -> Token {
        let start = self.pos;
        while self
            .peek_byte()
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            self.bump();
        }
        let ident = self.text[start..self.pos].to_ascii_lowercase();
        if ident == "null" {
            Token::Null
        } else {
            Token::Ident(ident)
        }
    }

    fn lex_number(&mut self) -> Token {
        let start = self.pos;

        if self.peek_byte() == Some(b'0') && matches!(self.peek_byte_at(1), Some(b'x' | b'X')) {
            self.bump();
            self.bump();
            let digits_start = self.pos;
            while self.peek_byte().is_some_and(|b| b.is_ascii_hexdigit()) {
                self.bump();
            }
            let digits = &self.text[digits_start..self.pos];
            if digits.is_empty() {
                return Token::Error("hex literal without digits".into());
            }
            return match u64::from_str_radix(digits, 16) {
                Ok(v) => Token::Int(v),
                Err(_) => Token::Error(format!("integer literal `0x{}` out of range", digits)),
            };
        }

        while self.peek_byte().is_some_and(|b| b.is_ascii_digit()) {
            self.bump();
        }

        let mut is_float = false;
        if self.peek_byte() == Some(b'.') {
            is_float = true;
            self.bump();
            while self.peek_byte().is_some_and(|b| b.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek_byte(), Some(b'e' | b'E')) {
            let exponent_digit = match self.peek_byte_at(1) {
                Some(b'+' | b'-') => self.peek_byte_at(2),
                other => other,
            };
            if exponent_digit.is_some_and(|b| b.is_ascii_digit()) {
                is_float = true;
                self.bump();
                if matches!(self.peek_byte(), Some(b'+' | b'-')) {
                    self.bump();
                }
                while self.peek_byte().is_some_and(|b| b.is_ascii_digit()) {
                    self.bump();
                }
            }
        }

        let literal = &self.text[start..self.pos];
        if is_float {
            return match literal.parse::<f64>() {
                Ok(v) => Token::Float(v),
                Err(_) => Token::Error(format!("malformed float literal `{}`", literal)),
            };
        }

        let (digits, radix) = if literal.len() > 1 && literal.starts_with('0') {
            (&literal[1..], 8)
        } else {
            (literal, 10)
        };
        match u64::from_str_radix(digits, radix) {
            Ok(v) => Token::Int(v),
            Err(_) if radix == 8 && digits.bytes().any(|b| b > b'7') => {
                Token::Error(format!("invalid octal literal `{}`", literal))
            }
            Err(_) => Token::Error(format!("integer literal `{}` out of range", literal)),
        }
    }

    fn lex_single_quoted(&mut self) -> Token {
        self.bump();
        let start = self.pos;
        loop {
            match self.peek_byte() {
                Some(b'\'') => {
                    let s = self.text[start..self.pos].to_string();
                    self.bump();
                    return Token::Str(s);
                }
                Some(_) => {
                    self.bump();
                }
                None => return Token::Error("unterminated string".into()),
            }
        }
    }

    fn lex_double_quoted(&mut self) -> Token {
        self.bump();
        let mut buf: Vec<u8> = Vec::new();
        loop {
            let Some(b) = self.bump() else {
                return Token::Error("unterminated string".into());
            };
            match b {
                b'"' => break,
                b'\\' => {
                    let Some(esc) = self.bump() else {
                        return Token::Error("unterminated string".into());
                    };
                    match esc {
                        b'\\' => buf.push(b'\\'),
                        b'"' => buf.push(b'"'),
                        b'n' => buf.push(b'\n'),
                        b't' => buf.push(b'\t'),
                        b'r' => buf.push(b'\r'),
                        b'b' => buf.push(0x08),
                        b'f' => buf.push(0x0c),
                        b's' => buf.push(b' '),
                        b'e' => buf.push(0x1b),
                        b'0'..=b'7' => {
                            let mut code = u32::from(esc - b'0');
                            for _ in 0..2 {
                                match self.peek_byte() {
                                    Some(d @ b'0'..=b'7') => {
                                        code = code * 8 + u32::from(d - b'0');
                                        self.bump();
                                    }
                                    _ => break,
                                }
                            }
                            match u8::try_from(code) {
                                Ok(byte) => buf.push(byte),
                                Err(_) => {
                                    return Token::Error(format!("octal escape `\\{:o}` out of range", code));
                                }
                            }
                        }
                        other => {
                            buf.push(b'\\');
                            buf.push(other);
                        }
                    }
                }
                other => buf.push(other),
            }
        }
        match String::from_utf8(buf) {
            Ok(s) => Token::Str(s),
            Err(_) => Token::Error("string is not valid UTF-8".into()),
        }
    }
}
