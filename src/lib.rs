//! # Introduction
//!
//! `modparse` is the front end of a compiler for NMODL-style mechanism
//! descriptions: the declarative/imperative language used to model ion
//! channels, synapses and concentration dynamics on neuronal membranes.
//! It turns source text into a [`module::Module`] — a symbol table of
//! variables and procedural blocks with parsed bodies — which numerical
//! back ends and semantic passes consume.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Lexer → Parser (pass 1: declarations, pass 2: bodies) → Module
//! ```
//!
//! 1. [`parser::lexer`] — streaming tokenizer with single-token
//!    lookahead and keyword recognition.
//! 2. [`parser`] — two-pass recursive descent parser: pass 1 interprets
//!    descriptive blocks (NEURON, STATE, PARAMETER, ASSIGNED, UNITS) and
//!    registers procedural blocks; pass 2 rewinds to each registered
//!    block and builds its AST.
//! 3. [`parser::ast`] — the tagged expression tree.
//! 4. [`module`] — the parsed mechanism handed to downstream passes.
//!
//! ## Example
//!
//! ```
//! let source = "
//!     NEURON { SUFFIX leak NONSPECIFIC_CURRENT i }
//!     PARAMETER { g = 0.001 (S/cm2) }
//!     BREAKPOINT { i = g*(v - e) }
//! ";
//! let module = modparse::parse(source, "leak").unwrap();
//! assert_eq!(module.neuron_info().name(), Some("leak"));
//! assert!(module.symbol("breakpoint").is_some());
//! ```

pub mod error;
pub mod module;
pub mod parser;

pub use error::{ParseError, Result, Status};
pub use module::Module;
pub use parser::{parse, parse_module};
