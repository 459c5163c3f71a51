//! Error types for the mechanism parser.
//!
//! The whole front end reports failures through a single [`ParseError`]
//! carrying a message and the source [`Location`] it was raised at. The
//! parser stops at the first error inside any construct; pass 1 of the
//! module parser additionally records the error and resynchronises at the
//! next top-level keyword, so [`crate::module::Module::first_error`] is
//! always the first diagnostic in source order.

use std::fmt;

use thiserror::Error;

use crate::parser::ast::Location;

/// Result type alias using [`ParseError`].
pub type Result<T> = std::result::Result<T, ParseError>;

/// Overall health of a lexer, parser or parsed module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Happy,
    Error,
}

/// Broad classification of a diagnostic, used only for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input at the character level (unknown character, unterminated
    /// string, malformed numeric literal).
    Lexical,
    /// Unexpected or missing token.
    Syntax,
    /// Well-tokenised input that violates a shape rule (unbalanced braces,
    /// non-lvalue assignment target, missing rate pair, ...).
    Structural,
    /// Bad declarations (duplicate variable, unknown ion, malformed
    /// VALENCE).
    Declarative,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Lexical => write!(f, "lexical error"),
            ErrorKind::Syntax => write!(f, "parse error"),
            ErrorKind::Structural => write!(f, "parse error"),
            ErrorKind::Declarative => write!(f, "error"),
        }
    }
}

/// A diagnostic produced by the lexer or parser.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind} at {location}: {message}")]
pub struct ParseError {
    pub message: String,
    pub location: Location,
    pub kind: ErrorKind,
}

impl ParseError {
    /// Create a lexical error.
    pub fn lexical(message: impl Into<String>, location: Location) -> Self {
        Self {
            message: message.into(),
            location,
            kind: ErrorKind::Lexical,
        }
    }

    /// Create a syntax error.
    pub fn syntax(message: impl Into<String>, location: Location) -> Self {
        Self {
            message: message.into(),
            location,
            kind: ErrorKind::Syntax,
        }
    }

    /// Create a structural error.
    pub fn structural(message: impl Into<String>, location: Location) -> Self {
        Self {
            message: message.into(),
            location,
            kind: ErrorKind::Structural,
        }
    }

    /// Create a declarative error.
    pub fn declarative(message: impl Into<String>, location: Location) -> Self {
        Self {
            message: message.into(),
            location,
            kind: ErrorKind::Declarative,
        }
    }

    /// The diagnostic message without the location prefix.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Where the error was raised.
    pub fn location(&self) -> Location {
        self.location
    }
}
