//! Mechanism description parser
//!
//! This module transforms mechanism source text into a [`Module`]:
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`]: The two-pass recursive descent parser
//! - [`ast`]: AST node definitions
//!
//! # Language Overview
//!
//! A mechanism file mixes descriptive blocks, which declare what the
//! mechanism is made of, with procedural blocks, which say how it
//! evolves:
//!
//! ```text
//! TITLE       free text
//! NEURON      { SUFFIX | POINT_PROCESS, USEION, NONSPECIFIC_CURRENT,
//!               RANGE, GLOBAL }
//! STATE       { id (unit)? ... }
//! PARAMETER   { id (= literal)? (unit)? (<lo, hi>)? ... }
//! ASSIGNED    { id (unit)? ... }
//! UNITS       { (unit) = (unit) ... }
//!
//! PROCEDURE name(args) { stmt* }      FUNCTION name(args) { stmt* }
//! INITIAL { stmt* }                   BREAKPOINT { stmt* }
//! DERIVATIVE name { stmt* }           KINETIC name { stmt* }
//! LINEAR name { stmt* }               NET_RECEIVE (args) { stmt* }
//! ```
//!
//! Statements are newline-terminated assignments (`x = expr`, `x' =
//! expr`), procedure calls, `LOCAL`, `SOLVE`, `CONDUCTANCE`, `if/else`,
//! and — inside KINETIC blocks — reactions (`~ A + B <-> C (kf, kb)`)
//! and conservation laws (`CONSERVE a + b = 1`).
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent with precedence climbing for binary
//! operators and single-token lookahead. Parsing is two-pass:
//! descriptive blocks are interpreted in pass 1 while procedural blocks
//! are skipped and only registered; pass 2 rewinds the lexer to each
//! registered block and parses its body. No external parser generator
//! dependencies.

pub mod ast;
pub mod lexer;
pub mod parse;

mod declarations;
mod expressions;
mod statements;

pub use parse::Parser;

use crate::error::{ParseError, Result};
use crate::module::Module;

/// Parse a mechanism description, returning the module together with any
/// recorded diagnostics.
pub fn parse_module(source: &str, name: impl Into<String>) -> Module {
    let mut parser = Parser::with_module(source, Module::new(name));
    parser.parse();
    parser.into_module()
}

/// Parse a mechanism description, failing on the first diagnostic.
pub fn parse(source: &str, name: impl Into<String>) -> Result<Module> {
    let module = parse_module(source, name);
    match module.first_error() {
        Some(error) => Err(error.clone()),
        None => Ok(module),
    }
}
