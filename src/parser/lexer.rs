//! Lexer (tokenizer) for the mechanism description language.
//!
//! Converts source text into a stream of [`Token`]s consumed one at a time
//! by the parser. The lexer is streaming rather than eager: the parser
//! pulls tokens with [`Lexer::next_token`] and looks one token ahead with
//! [`Lexer::peek`]. Pass 2 of the module parser re-scans each procedural
//! block with [`Lexer::resume`], positioned at the byte offset recorded
//! for the block's keyword during pass 1.
//!
//! # Numeric classification
//!
//! The trickiest rule in the scanner is integer vs. real. `3e2` is the
//! real 300.0 and `7E+2` is 700.0 — an exponent marker binds to the
//! digits before it whenever it is followed by a digit (or a sign and a
//! digit). `4E` is the integer 4 followed by the identifier `E`, which is
//! what makes `4E` a legal stoichiometric term while `3e2` is not.

use crate::error::Status;

use super::ast::Location;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use std::fmt;

/// All token variants produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literals
    Integer,
    Real,
    Identifier,
    String,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Assign,
    Prime,
    Tilde,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    Ne,
    /// `->`, recognised so the reaction grammar can reject one-directional
    /// arrows with a sensible message.
    Arrow,
    /// `<->`, the reaction arrow.
    ReactionArrow,

    // Descriptive-block keywords
    Title,
    Neuron,
    Suffix,
    PointProcess,
    NonspecificCurrent,
    UseIon,
    Read,
    Write,
    Valence,
    Range,
    Global,
    State,
    Parameter,
    Assigned,
    Units,

    // Procedural-block keywords
    Procedure,
    Function,
    Initial,
    Breakpoint,
    Kinetic,
    Derivative,
    Linear,
    NetReceive,

    // Statement keywords
    Local,
    Solve,
    Method,
    Conductance,
    Conserve,
    If,
    Else,

    // Intrinsics and solver methods
    Min,
    Max,
    Exp,
    Log,
    Abs,
    Cnexp,
    Sparse,

    // Control
    Eof,
    /// Unrecognised input; the token text carries the diagnostic message.
    Error,
}

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The token's spelling. For [`TokenKind::Error`] this is the
    /// diagnostic message instead.
    pub text: String,
    /// Line and column of the first character.
    pub location: Location,
    /// Byte offset of the first character in the source buffer. Used for
    /// the pass-2 rewind and for slicing unit descriptions out of the
    /// source verbatim.
    pub offset: usize,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Integer => write!(f, "integer '{}'", self.text),
            TokenKind::Real => write!(f, "number '{}'", self.text),
            TokenKind::Identifier => write!(f, "identifier '{}'", self.text),
            TokenKind::String => write!(f, "string \"{}\"", self.text),
            TokenKind::Eof => write!(f, "end of file"),
            TokenKind::Error => write!(f, "invalid input"),
            _ => write!(f, "'{}'", self.text),
        }
    }
}

/// Reserved words, built once at first use and immutable afterwards.
static KEYWORDS: Lazy<FxHashMap<&'static str, TokenKind>> = Lazy::new(|| {
    let mut map = FxHashMap::default();
    map.insert("TITLE", TokenKind::Title);
    map.insert("NEURON", TokenKind::Neuron);
    map.insert("SUFFIX", TokenKind::Suffix);
    map.insert("POINT_PROCESS", TokenKind::PointProcess);
    map.insert("NONSPECIFIC_CURRENT", TokenKind::NonspecificCurrent);
    map.insert("USEION", TokenKind::UseIon);
    map.insert("READ", TokenKind::Read);
    map.insert("WRITE", TokenKind::Write);
    map.insert("VALENCE", TokenKind::Valence);
    map.insert("RANGE", TokenKind::Range);
    map.insert("GLOBAL", TokenKind::Global);
    map.insert("STATE", TokenKind::State);
    map.insert("PARAMETER", TokenKind::Parameter);
    map.insert("ASSIGNED", TokenKind::Assigned);
    map.insert("UNITS", TokenKind::Units);
    map.insert("PROCEDURE", TokenKind::Procedure);
    map.insert("FUNCTION", TokenKind::Function);
    map.insert("INITIAL", TokenKind::Initial);
    map.insert("BREAKPOINT", TokenKind::Breakpoint);
    map.insert("KINETIC", TokenKind::Kinetic);
    map.insert("DERIVATIVE", TokenKind::Derivative);
    map.insert("LINEAR", TokenKind::Linear);
    map.insert("NET_RECEIVE", TokenKind::NetReceive);
    map.insert("LOCAL", TokenKind::Local);
    map.insert("SOLVE", TokenKind::Solve);
    map.insert("METHOD", TokenKind::Method);
    map.insert("CONDUCTANCE", TokenKind::Conductance);
    map.insert("CONSERVE", TokenKind::Conserve);
    map.insert("if", TokenKind::If);
    map.insert("else", TokenKind::Else);
    map.insert("min", TokenKind::Min);
    map.insert("max", TokenKind::Max);
    map.insert("exp", TokenKind::Exp);
    map.insert("log", TokenKind::Log);
    map.insert("abs", TokenKind::Abs);
    map.insert("cnexp", TokenKind::Cnexp);
    map.insert("sparse", TokenKind::Sparse);
    map
});

/// Streaming lexer over an ASCII source buffer.
pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
    lookahead: Option<Token>,
    status: Status,
}

impl<'a> Lexer<'a> {
    /// Create a lexer at the start of the given source.
    pub fn new(source: &'a str) -> Self {
        Self::resume(source, 0, Location::new(1, 1))
    }

    /// Create a lexer positioned mid-source, at the byte offset and
    /// location recorded for a procedural block during pass 1.
    pub fn resume(source: &'a str, offset: usize, location: Location) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: offset,
            line: location.line,
            column: location.column,
            lookahead: None,
            status: Status::Happy,
        }
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Token {
        match self.lookahead.take() {
            Some(tok) => tok,
            None => self.scan_token(),
        }
    }

    /// Return the next token without consuming it.
    pub fn peek(&mut self) -> &Token {
        if self.lookahead.is_none() {
            let tok = self.scan_token();
            self.lookahead = Some(tok);
        }
        match self.lookahead.as_ref() {
            Some(tok) => tok,
            // the option was filled above
            None => unreachable!(),
        }
    }

    /// The scanner's current position.
    pub fn location(&self) -> Location {
        Location::new(self.line, self.column)
    }

    /// Whether the lexer has seen unrecognisable input.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Consume and return the raw remainder of the current line, trimmed.
    /// Used for TITLE, whose text is free-form. Any buffered lookahead is
    /// rewound first so the returned text starts where the parser stopped.
    pub fn take_line(&mut self) -> String {
        if let Some(tok) = self.lookahead.take() {
            self.pos = tok.offset;
            self.line = tok.location.line;
            self.column = tok.location.column;
        }
        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
        // trim() also disposes of the '\r' in a CRLF line ending
        self.source[start..self.pos].trim().to_string()
    }

    // ===== Scanning =====

    fn scan_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let location = self.location();
        let offset = self.pos;

        let ch = match self.peek_char() {
            Some(ch) => ch,
            None => return self.make(TokenKind::Eof, String::new(), location, offset),
        };

        match ch {
            '0'..='9' => self.number(location, offset),
            'a'..='z' | 'A'..='Z' | '_' => self.identifier_or_keyword(location, offset),
            '"' => self.string_literal(location, offset),

            '(' => self.single(TokenKind::LParen, location, offset),
            ')' => self.single(TokenKind::RParen, location, offset),
            '{' => self.single(TokenKind::LBrace, location, offset),
            '}' => self.single(TokenKind::RBrace, location, offset),
            ',' => self.single(TokenKind::Comma, location, offset),
            '+' => self.single(TokenKind::Plus, location, offset),
            '*' => self.single(TokenKind::Star, location, offset),
            '/' => self.single(TokenKind::Slash, location, offset),
            '^' => self.single(TokenKind::Caret, location, offset),
            '~' => self.single(TokenKind::Tilde, location, offset),
            '\'' => self.single(TokenKind::Prime, location, offset),

            '-' => {
                if self.peek_ahead(1) == Some('>') {
                    self.advance();
                    self.advance();
                    self.make(TokenKind::Arrow, "->".to_string(), location, offset)
                } else {
                    self.single(TokenKind::Minus, location, offset)
                }
            }
            '<' => {
                // greedy: '<->' before '<='
                if self.peek_ahead(1) == Some('-') && self.peek_ahead(2) == Some('>') {
                    self.advance();
                    self.advance();
                    self.advance();
                    self.make(TokenKind::ReactionArrow, "<->".to_string(), location, offset)
                } else if self.peek_ahead(1) == Some('=') {
                    self.advance();
                    self.advance();
                    self.make(TokenKind::Le, "<=".to_string(), location, offset)
                } else {
                    self.single(TokenKind::Lt, location, offset)
                }
            }
            '>' => {
                if self.peek_ahead(1) == Some('=') {
                    self.advance();
                    self.advance();
                    self.make(TokenKind::Ge, ">=".to_string(), location, offset)
                } else {
                    self.single(TokenKind::Gt, location, offset)
                }
            }
            '=' => {
                if self.peek_ahead(1) == Some('=') {
                    self.advance();
                    self.advance();
                    self.make(TokenKind::EqEq, "==".to_string(), location, offset)
                } else {
                    self.single(TokenKind::Assign, location, offset)
                }
            }
            '!' => {
                if self.peek_ahead(1) == Some('=') {
                    self.advance();
                    self.advance();
                    self.make(TokenKind::Ne, "!=".to_string(), location, offset)
                } else {
                    self.advance();
                    self.error_token("unexpected character '!'", location, offset)
                }
            }

            _ => {
                self.advance();
                self.error_token(format!("unexpected character '{}'", ch), location, offset)
            }
        }
    }

    /// Scan a numeric literal. See the module docs for the integer/real
    /// classification rule.
    fn number(&mut self, location: Location, offset: usize) -> Token {
        let mut text = String::new();
        let mut is_real = false;

        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if self.peek_char() == Some('.') {
            is_real = true;
            text.push('.');
            self.advance();
            while let Some(ch) = self.peek_char() {
                if ch.is_ascii_digit() {
                    text.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
        }

        if matches!(self.peek_char(), Some('e') | Some('E')) {
            let exponent_follows = match self.peek_ahead(1) {
                Some(ch) if ch.is_ascii_digit() => true,
                Some('+') | Some('-') => {
                    matches!(self.peek_ahead(2), Some(d) if d.is_ascii_digit())
                }
                _ => false,
            };
            if exponent_follows {
                is_real = true;
                if let Some(marker) = self.advance() {
                    text.push(marker);
                }
                if matches!(self.peek_char(), Some('+') | Some('-')) {
                    if let Some(sign) = self.advance() {
                        text.push(sign);
                    }
                }
                while let Some(ch) = self.peek_char() {
                    if ch.is_ascii_digit() {
                        text.push(ch);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }

        if is_real {
            if text.parse::<f64>().is_err() {
                return self.error_token(
                    format!("malformed numeric literal '{}'", text),
                    location,
                    offset,
                );
            }
            self.make(TokenKind::Real, text, location, offset)
        } else {
            if text.parse::<i64>().is_err() {
                return self.error_token(
                    format!("integer literal '{}' is out of range", text),
                    location,
                    offset,
                );
            }
            self.make(TokenKind::Integer, text, location, offset)
        }
    }

    fn identifier_or_keyword(&mut self, location: Location, offset: usize) -> Token {
        let mut text = String::new();
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let kind = KEYWORDS
            .get(text.as_str())
            .copied()
            .unwrap_or(TokenKind::Identifier);
        self.make(kind, text, location, offset)
    }

    /// Scan a double-quoted string. The DSL has no escape sequences; a
    /// string runs to the closing quote on the same line.
    fn string_literal(&mut self, location: Location, offset: usize) -> Token {
        self.advance(); // opening quote
        let mut text = String::new();
        loop {
            match self.peek_char() {
                Some('"') => {
                    self.advance();
                    return self.make(TokenKind::String, text, location, offset);
                }
                Some('\n') | None => {
                    return self.error_token("unterminated string literal", location, offset);
                }
                Some(ch) => {
                    text.push(ch);
                    self.advance();
                }
            }
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(ch) = self.peek_char() {
            match ch {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                // ':' and '?' both open a comment running to end of line
                ':' | '?' => {
                    while let Some(ch) = self.peek_char() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    // ===== Helpers =====

    fn single(&mut self, kind: TokenKind, location: Location, offset: usize) -> Token {
        let ch = self.bytes[self.pos] as char;
        self.advance();
        self.make(kind, ch.to_string(), location, offset)
    }

    fn make(&self, kind: TokenKind, text: String, location: Location, offset: usize) -> Token {
        Token {
            kind,
            text,
            location,
            offset,
        }
    }

    fn error_token(
        &mut self,
        message: impl Into<String>,
        location: Location,
        offset: usize,
    ) -> Token {
        self.status = Status::Error;
        self.make(TokenKind::Error, message.into(), location, offset)
    }

    fn peek_char(&self) -> Option<char> {
        self.bytes.get(self.pos).map(|&b| b as char)
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.bytes.get(self.pos + n).map(|&b| b as char)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token();
            let done = tok.kind == TokenKind::Eof;
            out.push(tok.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn test_simple_tokens() {
        let mut lexer = Lexer::new("SOLVE states METHOD cnexp");
        assert_eq!(lexer.next_token().kind, TokenKind::Solve);
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::Identifier);
        assert_eq!(tok.text, "states");
        assert_eq!(lexer.next_token().kind, TokenKind::Method);
        assert_eq!(lexer.next_token().kind, TokenKind::Cnexp);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn test_locations() {
        let mut lexer = Lexer::new("a = 3\n  b = 4");
        let a = lexer.next_token();
        assert_eq!(a.location, Location::new(1, 1));
        lexer.next_token(); // =
        let three = lexer.next_token();
        assert_eq!(three.location, Location::new(1, 5));
        let b = lexer.next_token();
        assert_eq!(b.location, Location::new(2, 3));
        assert_eq!(b.offset, 8);
    }

    #[test]
    fn test_integer_vs_real() {
        // '3e2' is the real 300.0, never integer-then-identifier
        let mut lexer = Lexer::new("3e2");
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::Real);
        assert_eq!(tok.text, "3e2");

        let mut lexer = Lexer::new("7E+2");
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::Real);
        assert_eq!(tok.text, "7E+2");

        // '4E' is integer 4 then identifier E
        let mut lexer = Lexer::new("4E");
        assert_eq!(lexer.next_token().kind, TokenKind::Integer);
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::Identifier);
        assert_eq!(tok.text, "E");

        // '12A' likewise splits after the digits
        let mut lexer = Lexer::new("12A");
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::Integer);
        assert_eq!(tok.text, "12");
        assert_eq!(lexer.next_token().kind, TokenKind::Identifier);

        for (text, value) in [("1.5", 1.5), ("0.2", 0.2), ("3.", 3.0), ("1.23e-2", 1.23e-2)] {
            let mut lexer = Lexer::new(text);
            let tok = lexer.next_token();
            assert_eq!(tok.kind, TokenKind::Real, "{}", text);
            assert_eq!(tok.text.parse::<f64>().unwrap(), value);
        }
    }

    #[test]
    fn test_reaction_arrow_is_greedy() {
        assert_eq!(
            kinds("a <-> b"),
            vec![
                TokenKind::Identifier,
                TokenKind::ReactionArrow,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
        // '<-' with no '>' is '<' then '-'
        assert_eq!(
            kinds("a <- b"),
            vec![
                TokenKind::Identifier,
                TokenKind::Lt,
                TokenKind::Minus,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
        assert_eq!(
            kinds("a -> b"),
            vec![
                TokenKind::Identifier,
                TokenKind::Arrow,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
        assert_eq!(
            kinds("a <= b >= c == d != e"),
            vec![
                TokenKind::Identifier,
                TokenKind::Le,
                TokenKind::Identifier,
                TokenKind::Ge,
                TokenKind::Identifier,
                TokenKind::EqEq,
                TokenKind::Identifier,
                TokenKind::Ne,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_comments() {
        let toks = kinds("a : comment to end of line\nb ? also a comment\nc");
        assert_eq!(
            toks,
            vec![
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_whitespace_insertion_preserves_kinds() {
        let dense = kinds("x=y+2*z^3");
        let spaced = kinds("x  =\t y +  2 : nothing\n * z ^ 3");
        assert_eq!(dense, spaced);
    }

    #[test]
    fn test_unknown_character() {
        let mut lexer = Lexer::new("a & b");
        assert_eq!(lexer.next_token().kind, TokenKind::Identifier);
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::Error);
        assert!(tok.text.contains('&'));
        assert_eq!(lexer.status(), Status::Error);
    }

    #[test]
    fn test_string_literal() {
        let mut lexer = Lexer::new("\"hello world\"");
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::String);
        assert_eq!(tok.text, "hello world");

        let mut lexer = Lexer::new("\"unterminated");
        assert_eq!(lexer.next_token().kind, TokenKind::Error);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut lexer = Lexer::new("a b");
        assert_eq!(lexer.peek().text, "a");
        assert_eq!(lexer.peek().text, "a");
        assert_eq!(lexer.next_token().text, "a");
        assert_eq!(lexer.peek().text, "b");
        assert_eq!(lexer.next_token().text, "b");
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn test_take_line() {
        let mut lexer = Lexer::new("TITLE  potassium channel from CA3\nNEURON {");
        assert_eq!(lexer.next_token().kind, TokenKind::Title);
        assert_eq!(lexer.take_line(), "potassium channel from CA3");
        assert_eq!(lexer.next_token().kind, TokenKind::Neuron);
    }

    #[test]
    fn test_take_line_rewinds_lookahead() {
        let mut lexer = Lexer::new("TITLE granule cell\nSTATE { m }");
        assert_eq!(lexer.next_token().kind, TokenKind::Title);
        // peeking buffers 'granule'; take_line must still return the
        // whole remainder
        assert_eq!(lexer.peek().text, "granule");
        assert_eq!(lexer.take_line(), "granule cell");
        assert_eq!(lexer.next_token().kind, TokenKind::State);
    }

    #[test]
    fn test_take_line_crlf() {
        let mut lexer = Lexer::new("TITLE hh channel\r\nSTATE { m }");
        lexer.next_token();
        assert_eq!(lexer.take_line(), "hh channel");
    }

    #[test]
    fn test_resume_mid_source() {
        let source = "STATE { m }\nPROCEDURE rates(v) { m = v }";
        let mut lexer = Lexer::new(source);
        let (offset, location) = loop {
            let tok = lexer.next_token();
            if tok.kind == TokenKind::Procedure {
                break (tok.offset, tok.location);
            }
        };
        let mut resumed = Lexer::resume(source, offset, location);
        let tok = resumed.next_token();
        assert_eq!(tok.kind, TokenKind::Procedure);
        assert_eq!(tok.location, Location::new(2, 1));
        assert_eq!(resumed.next_token().text, "rates");
    }

    #[test]
    fn test_prime() {
        assert_eq!(
            kinds("m' = 2"),
            vec![
                TokenKind::Identifier,
                TokenKind::Prime,
                TokenKind::Assign,
                TokenKind::Integer,
                TokenKind::Eof
            ]
        );
    }
}
