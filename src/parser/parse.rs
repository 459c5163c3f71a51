//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing
//! infrastructure: token plumbing, the `expect` helper that turns token
//! mismatches into diagnostics, and the two-pass driver over a module.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following
//! organization:
//! - This module: Parser struct, helper methods, and the two-pass driver
//! - `declarations`: descriptive blocks (TITLE, NEURON, STATE, PARAMETER,
//!   ASSIGNED, UNITS)
//! - `statements`: blocks, statement dispatch, the mini-grammars, and the
//!   procedural block headers
//! - `expressions`: expression parsing with precedence climbing
//!
//! Parser methods are split across multiple files using `impl Parser`
//! blocks, allowing each module to extend the Parser with related
//! functionality while maintaining access to the shared parser state.
//!
//! # Two-pass parsing
//!
//! Pass 1 scans the top level of the source. Descriptive blocks are
//! interpreted immediately; procedural blocks are skipped with brace
//! counting and registered by name, kind and byte offset. After pass 1
//! the declared variables are installed into the module's symbol table.
//! Pass 2 then revisits each registered block with a fresh [`Lexer`]
//! resumed at the recorded offset and parses its body into an AST. This
//! keeps the lexer single-token and avoids buffering the token stream.

use log::{debug, trace};

use crate::error::{ParseError, Result, Status};
use crate::module::{
    FunctionSymbol, Module, NetReceiveSymbol, ProcedureKind, ProcedureSymbol, Symbol,
    VariableKind, VariableSymbol,
};
use crate::parser::ast::{IonKind, Location};
use crate::parser::lexer::{Lexer, Token, TokenKind};

/// A procedural block registered during pass 1, waiting for its body to
/// be parsed in pass 2.
struct PendingBlock {
    name: String,
    offset: usize,
    location: Location,
}

/// Recursive descent parser for mechanism descriptions
pub struct Parser<'src> {
    pub(crate) source: &'src str,
    pub(crate) lexer: Lexer<'src>,
    /// The token under inspection. Advanced with [`Parser::get_token`].
    pub(crate) current: Token,
    pub(crate) module: Module,
    /// Variables collected from descriptive blocks, installed into the
    /// symbol table after pass 1.
    pub(crate) variables: Vec<VariableSymbol>,
    pending: Vec<PendingBlock>,
}

impl<'src> Parser<'src> {
    /// Create a parser over bare source text. Used by the grammar entry
    /// points; module-level parsing goes through [`Parser::with_module`].
    pub fn new(source: &'src str) -> Self {
        Self::with_module(source, Module::new(""))
    }

    /// Create a parser that populates the given module.
    pub fn with_module(source: &'src str, module: Module) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            source,
            lexer,
            current,
            module,
            variables: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// The module being populated.
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Overall health: errors recorded in the module or seen by the
    /// lexer.
    pub fn status(&self) -> Status {
        if self.module.status() == Status::Error || self.lexer.status() == Status::Error {
            Status::Error
        } else {
            Status::Happy
        }
    }

    /// The lexer's current position.
    pub fn location(&self) -> Location {
        self.lexer.location()
    }

    /// Surrender the module, with any recorded diagnostics.
    pub fn into_module(self) -> Module {
        self.module
    }

    /// Run both passes over the source. Diagnostics are recorded in the
    /// module; the returned status mirrors [`Module::status`].
    pub fn parse(&mut self) -> Status {
        debug!("pass 1: scanning descriptive blocks of '{}'", self.module.name);
        self.first_pass();

        if self.module.status() == Status::Happy {
            if let Err(e) = self.add_variables_to_symbols() {
                self.module.record_error(e);
            }
        }

        if self.module.status() == Status::Happy {
            debug!("pass 2: parsing {} procedural blocks", self.pending.len());
            self.second_pass();
        }

        self.module.status()
    }

    // ===== Pass 1 =====

    fn first_pass(&mut self) {
        loop {
            let result = match self.current.kind {
                TokenKind::Eof => break,
                TokenKind::Title => self.parse_title(),
                TokenKind::Neuron => self.parse_neuron_block(),
                TokenKind::State => self.parse_state_block(),
                TokenKind::Parameter => self.parse_parameter_block(),
                TokenKind::Assigned => self.parse_assigned_block(),
                TokenKind::Units => self.parse_units_block(),
                TokenKind::Procedure
                | TokenKind::Function
                | TokenKind::Initial
                | TokenKind::Breakpoint
                | TokenKind::Kinetic
                | TokenKind::Derivative
                | TokenKind::Linear
                | TokenKind::NetReceive => self.skip_procedural_block(),
                TokenKind::Error => Err(self.lexical_error()),
                _ => Err(ParseError::syntax(
                    format!("unexpected {} at module scope", self.current),
                    self.current.location,
                )),
            };

            if let Err(e) = result {
                self.module.record_error(e);
                self.synchronize();
            }
        }
    }

    /// Skip ahead to the next token that can open a top-level construct.
    /// Only pass 1 resynchronises; everything else aborts on first error.
    fn synchronize(&mut self) {
        loop {
            match self.current.kind {
                TokenKind::Eof
                | TokenKind::Title
                | TokenKind::Neuron
                | TokenKind::State
                | TokenKind::Parameter
                | TokenKind::Assigned
                | TokenKind::Units
                | TokenKind::Procedure
                | TokenKind::Function
                | TokenKind::Initial
                | TokenKind::Breakpoint
                | TokenKind::Kinetic
                | TokenKind::Derivative
                | TokenKind::Linear
                | TokenKind::NetReceive => break,
                _ => self.get_token(),
            }
        }
    }

    /// Register a procedural block and skip over its body, counting
    /// braces. The keyword's byte offset is recorded so pass 2 can resume
    /// a lexer there.
    fn skip_procedural_block(&mut self) -> Result<()> {
        let keyword = self.current.kind;
        let location = self.current.location;
        let offset = self.current.offset;
        self.get_token();

        let name = match keyword {
            TokenKind::Initial => "initial".to_string(),
            TokenKind::Breakpoint => "breakpoint".to_string(),
            TokenKind::NetReceive => "net_receive".to_string(),
            _ => {
                self.expect_identifier("expected a name after block keyword")?
                    .text
            }
        };

        if self.module.symbols.contains_key(&name) {
            return Err(ParseError::declarative(
                format!("'{}' is declared more than once", name),
                location,
            ));
        }

        let placeholder = match keyword {
            TokenKind::Function => Symbol::Function(FunctionSymbol {
                name: name.clone(),
                location,
                args: Vec::new(),
                body: None,
            }),
            TokenKind::NetReceive => Symbol::NetReceive(NetReceiveSymbol {
                name: name.clone(),
                location,
                args: Vec::new(),
                body: None,
            }),
            _ => {
                let kind = match keyword {
                    TokenKind::Initial => ProcedureKind::Initial,
                    TokenKind::Breakpoint => ProcedureKind::Breakpoint,
                    TokenKind::Kinetic => ProcedureKind::Kinetic,
                    TokenKind::Derivative => ProcedureKind::Derivative,
                    TokenKind::Linear => ProcedureKind::Linear,
                    _ => ProcedureKind::Normal,
                };
                Symbol::Procedure(ProcedureSymbol {
                    name: name.clone(),
                    location,
                    kind,
                    args: Vec::new(),
                    body: None,
                })
            }
        };
        trace!("registered procedural block '{}' at {}", name, location);
        self.module.symbols.insert(name.clone(), placeholder);
        self.pending.push(PendingBlock {
            name: name.clone(),
            offset,
            location,
        });

        // skip the argument list, then the braced body
        while self.current.kind != TokenKind::LBrace {
            match self.current.kind {
                TokenKind::Eof => {
                    return Err(ParseError::structural(
                        format!("missing '{{' to open the body of '{}'", name),
                        location,
                    ));
                }
                TokenKind::Error => return Err(self.lexical_error()),
                _ => self.get_token(),
            }
        }

        let mut depth = 0usize;
        loop {
            match self.current.kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        self.get_token();
                        return Ok(());
                    }
                }
                TokenKind::Eof => {
                    return Err(ParseError::structural(
                        format!("unbalanced braces in block '{}'", name),
                        location,
                    ));
                }
                TokenKind::Error => return Err(self.lexical_error()),
                _ => {}
            }
            self.get_token();
        }
    }

    /// Install the variables collected from STATE, PARAMETER and ASSIGNED
    /// into the symbol table, then the variables implied by ion usage.
    /// Duplicate declarations across sections are a declarative error.
    pub(crate) fn add_variables_to_symbols(&mut self) -> Result<()> {
        let variables = std::mem::take(&mut self.variables);
        for var in variables {
            if let Some(existing) = self.module.symbols.get(&var.name) {
                return Err(ParseError::declarative(
                    format!(
                        "'{}' is declared more than once (previous declaration at {})",
                        var.name,
                        existing.location()
                    ),
                    var.location,
                ));
            }
            self.module
                .symbols
                .insert(var.name.clone(), Symbol::Variable(var));
        }

        // Ion read/write variables and nonspecific currents are implicit
        // declarations; they only materialise if nothing else claimed the
        // name (a WRITE target may also be a STATE variable).
        let mut ion_vars: Vec<VariableSymbol> = Vec::new();
        for dep in &self.module.neuron.ions {
            for name in dep.read.iter().chain(dep.write.iter()) {
                if !self.module.symbols.contains_key(name) {
                    ion_vars.push(VariableSymbol {
                        name: name.clone(),
                        location: Location::new(1, 1),
                        kind: VariableKind::Ion(dep.ion),
                        unit: None,
                        value: None,
                        range: None,
                    });
                }
            }
        }
        for name in &self.module.neuron.nonspecific_currents {
            if !self.module.symbols.contains_key(name) {
                ion_vars.push(VariableSymbol {
                    name: name.clone(),
                    location: Location::new(1, 1),
                    kind: VariableKind::Ion(IonKind::Nonspecific),
                    unit: None,
                    value: None,
                    range: None,
                });
            }
        }
        for var in ion_vars {
            self.module
                .symbols
                .insert(var.name.clone(), Symbol::Variable(var));
        }

        Ok(())
    }

    // ===== Pass 2 =====

    fn second_pass(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for block in pending {
            trace!("pass 2: parsing body of '{}'", block.name);
            self.lexer = Lexer::resume(self.source, block.offset, block.location);
            self.get_token();

            let parsed = match self.current.kind {
                TokenKind::Function => self.parse_function(),
                _ => self.parse_procedure(),
            };

            match parsed {
                Ok(symbol) => {
                    // insert() on an existing key keeps its position, so
                    // declaration order survives the replacement
                    self.module.symbols.insert(block.name, symbol);
                }
                Err(e) => {
                    self.module.record_error(e);
                    return;
                }
            }
        }
    }

    // ===== Token plumbing =====

    /// Advance to the next token.
    pub(crate) fn get_token(&mut self) {
        self.current = self.lexer.next_token();
    }

    /// The kind of the token after the current one.
    pub(crate) fn peek_kind(&mut self) -> TokenKind {
        self.lexer.peek().kind
    }

    /// Consume the current token if it has the expected kind, otherwise
    /// fail with `hint`. This is the single point where token mismatches
    /// become diagnostics.
    pub(crate) fn expect(&mut self, kind: TokenKind, hint: &str) -> Result<Token> {
        if self.current.kind == TokenKind::Error {
            return Err(self.lexical_error());
        }
        if self.current.kind == kind {
            let token = std::mem::replace(&mut self.current, self.lexer.next_token());
            Ok(token)
        } else {
            Err(ParseError::syntax(
                format!("{}, found {}", hint, self.current),
                self.current.location,
            ))
        }
    }

    /// Consume an identifier token, or fail with `hint`.
    pub(crate) fn expect_identifier(&mut self, hint: &str) -> Result<Token> {
        self.expect(TokenKind::Identifier, hint)
    }

    /// Build the diagnostic for a lexer error token.
    pub(crate) fn lexical_error(&self) -> ParseError {
        ParseError::lexical(self.current.text.clone(), self.current.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_module;

    #[test]
    fn test_two_pass_skeleton() {
        let source = "
            STATE { m h }
            PROCEDURE rates(v) {
                m = v
            }
        ";
        let module = parse_module(source, "test");
        assert_eq!(module.status(), Status::Happy);
        assert!(module.symbol("m").is_some());
        assert!(module.symbol("h").is_some());

        let rates = module.symbol("rates").unwrap().as_procedure().unwrap();
        assert_eq!(rates.args, vec!["v".to_string()]);
        assert!(rates.body.is_some());
    }

    #[test]
    fn test_symbol_order_is_declaration_order() {
        let source = "
            STATE { zz aa }
            PARAMETER { mm = 1 }
            BREAKPOINT { zz = mm }
        ";
        let module = parse_module(source, "test");
        assert_eq!(module.status(), Status::Happy);
        let names: Vec<&str> = module.symbols().keys().map(String::as_str).collect();
        // breakpoint is registered during pass 1 (before variables are
        // installed), so it leads; the variables keep source order
        assert_eq!(names, vec!["breakpoint", "zz", "aa", "mm"]);
    }

    #[test]
    fn test_duplicate_procedure_is_an_error() {
        let source = "
            PROCEDURE foo() { x = 1 }
            PROCEDURE foo() { x = 2 }
        ";
        let module = parse_module(source, "test");
        assert_eq!(module.status(), Status::Error);
        assert!(module
            .first_error()
            .unwrap()
            .message()
            .contains("more than once"));
    }

    #[test]
    fn test_duplicate_variable_across_sections() {
        let source = "
            STATE { m }
            PARAMETER { m = 3 }
        ";
        let module = parse_module(source, "test");
        assert_eq!(module.status(), Status::Error);
        assert!(module.first_error().unwrap().message().contains("'m'"));
    }

    #[test]
    fn test_unbalanced_braces() {
        let source = "PROCEDURE foo() { if(a<b) { a = 2 }";
        let module = parse_module(source, "test");
        assert_eq!(module.status(), Status::Error);
        assert!(module
            .first_error()
            .unwrap()
            .message()
            .contains("unbalanced braces"));
    }

    #[test]
    fn test_first_pass_resynchronises() {
        // both stray '}' tokens are diagnosed: pass 1 picks up scanning
        // at the STATE keyword after the first one
        let source = "
            }
            STATE { m }
            }
        ";
        let module = parse_module(source, "test");
        assert_eq!(module.status(), Status::Error);
        assert_eq!(module.errors().len(), 2);
        assert_eq!(module.first_error().unwrap().location().line, 2);
    }

    #[test]
    fn test_pass_two_aborts_on_first_error() {
        let source = "
            PROCEDURE foo() { x = }
            PROCEDURE bar() { y = 1 }
        ";
        let module = parse_module(source, "test");
        assert_eq!(module.status(), Status::Error);
        // bar was registered in pass 1 but its body was never parsed
        let bar = module.symbol("bar").unwrap().as_procedure().unwrap();
        assert!(bar.body.is_none());
    }
}
