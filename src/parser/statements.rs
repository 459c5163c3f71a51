//! Statement and block parsing
//!
//! This module handles everything that can appear inside a procedural
//! block: the block grammar itself, the statement dispatch, the LOCAL /
//! SOLVE / CONDUCTANCE / IF / INITIAL forms, the stoichiometric, reaction
//! and conserve mini-grammars of KINETIC blocks, and the procedural block
//! headers (`parse_procedure`, `parse_function`) used by pass 2 and by
//! tests.
//!
//! All parsing methods are implemented as methods on the [`Parser`]
//! struct.

use rustc_hash::FxHashSet;

use crate::error::{ParseError, Result};
use crate::module::{
    FunctionSymbol, NetReceiveSymbol, ProcedureKind, ProcedureSymbol, Symbol,
};
use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::Parser;

impl<'src> Parser<'src> {
    /// Parse `{ stmt* }`. `is_nested` marks blocks that appear inside
    /// another block (if/else branches, nested INITIAL).
    pub(crate) fn parse_block(&mut self, is_nested: bool) -> Result<Expression> {
        let open = self.expect(TokenKind::LBrace, "expected '{' to open a block")?;

        let mut statements = Vec::new();
        while self.current.kind != TokenKind::RBrace {
            if self.current.kind == TokenKind::Eof {
                return Err(ParseError::structural(
                    "unexpected end of file inside a block",
                    open.location,
                ));
            }
            statements.push(self.parse_statement()?);
        }
        self.get_token(); // consume '}'

        Ok(Expression::Block(BlockExpr {
            statements,
            is_nested,
            location: open.location,
        }))
    }

    /// Parse one statement, dispatching on its first token.
    pub(crate) fn parse_statement(&mut self) -> Result<Expression> {
        match self.current.kind {
            TokenKind::Local => self.parse_local(),
            TokenKind::Solve => self.parse_solve(),
            TokenKind::Conductance => self.parse_conductance(),
            TokenKind::If => self.parse_if(),
            TokenKind::Initial => self.parse_initial(),
            TokenKind::Conserve => self.parse_conserve_expression(),
            TokenKind::Tilde => self.parse_reaction_expression(),
            TokenKind::Identifier => self.parse_line_expression(),
            // free-standing blocks are not statements
            TokenKind::LBrace => Err(ParseError::syntax(
                "blocks may only follow if/else",
                self.current.location,
            )),
            TokenKind::Error => Err(self.lexical_error()),
            _ => Err(ParseError::syntax(
                format!("unexpected {} at start of statement", self.current),
                self.current.location,
            )),
        }
    }

    /// Parse `LOCAL id (, id)*`.
    pub fn parse_local(&mut self) -> Result<Expression> {
        let keyword = self.expect(TokenKind::Local, "expected 'LOCAL'")?;

        let mut variables = Vec::new();
        let mut seen = FxHashSet::default();

        loop {
            let name = self.expect_identifier("expected a variable name in LOCAL")?;
            if !seen.insert(name.text.clone()) {
                return Err(ParseError::declarative(
                    format!("'{}' appears twice in LOCAL", name.text),
                    name.location,
                ));
            }
            variables.push(name.text);

            if self.current.kind != TokenKind::Comma {
                break;
            }
            self.get_token(); // a trailing comma fails on the next loop turn
        }

        Ok(Expression::Local(LocalDecl {
            variables,
            location: keyword.location,
        }))
    }

    /// Parse `SOLVE name [METHOD cnexp|sparse]`.
    pub fn parse_solve(&mut self) -> Result<Expression> {
        let keyword = self.expect(TokenKind::Solve, "expected 'SOLVE'")?;
        let name = self.expect_identifier("expected a block name after SOLVE")?;

        let method = if self.current.kind == TokenKind::Method {
            self.get_token();
            let method = match self.current.kind {
                TokenKind::Cnexp => SolveMethod::Cnexp,
                TokenKind::Sparse => SolveMethod::Sparse,
                _ => {
                    return Err(ParseError::syntax(
                        format!("expected 'cnexp' or 'sparse', found {}", self.current),
                        self.current.location,
                    ));
                }
            };
            self.get_token();
            method
        } else {
            SolveMethod::None
        };

        Ok(Expression::Solve(SolveExpr {
            name: name.text,
            method,
            location: keyword.location,
        }))
    }

    /// Parse `CONDUCTANCE g [USEION ion]`. Without a USEION clause the
    /// conductance is for a nonspecific current.
    pub fn parse_conductance(&mut self) -> Result<Expression> {
        let keyword = self.expect(TokenKind::Conductance, "expected 'CONDUCTANCE'")?;
        let name = self.expect_identifier("expected a conductance variable name")?;

        let ion = if self.current.kind == TokenKind::UseIon {
            self.get_token();
            let ion_token = self.expect_identifier("expected an ion name after USEION")?;
            IonKind::from_name(&ion_token.text).ok_or_else(|| {
                ParseError::declarative(
                    format!("unknown ion species '{}'", ion_token.text),
                    ion_token.location,
                )
            })?
        } else {
            IonKind::Nonspecific
        };

        Ok(Expression::Conductance(ConductanceExpr {
            name: name.text,
            ion,
            location: keyword.location,
        }))
    }

    /// Parse `if (cond) block [else (if ... | block)]`. An `else if`
    /// chain nests as an If expression in the false branch.
    pub fn parse_if(&mut self) -> Result<Expression> {
        let keyword = self.expect(TokenKind::If, "expected 'if'")?;
        self.expect(TokenKind::LParen, "expected '(' after 'if'")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen, "expected ')' after the if condition")?;

        let true_branch = self.parse_block(true)?;

        let false_branch = if self.current.kind == TokenKind::Else {
            self.get_token();
            if self.current.kind == TokenKind::If {
                Some(Box::new(self.parse_if()?))
            } else {
                Some(Box::new(self.parse_block(true)?))
            }
        } else {
            None
        };

        Ok(Expression::If(IfExpr {
            condition: Box::new(condition),
            true_branch: Box::new(true_branch),
            false_branch,
            location: keyword.location,
        }))
    }

    /// Parse an INITIAL block nested inside a procedural block.
    pub(crate) fn parse_initial(&mut self) -> Result<Expression> {
        let keyword = self.expect(TokenKind::Initial, "expected 'INITIAL'")?;
        let body = self.parse_block(true)?;
        Ok(Expression::Initial(InitialExpr {
            body: Box::new(body),
            location: keyword.location,
        }))
    }

    // ===== Stoichiometry =====

    /// Parse one stoichiometric term: an optional sign, an optional
    /// integer coefficient, and a species identifier. `2B`, `-A` and
    /// `0A` are terms; `0.2A` and `3e2` are not, because a real can
    /// never be a coefficient.
    pub fn parse_stoich_term(&mut self) -> Result<Expression> {
        Ok(Expression::StoichTerm(self.stoich_term()?))
    }

    fn stoich_term(&mut self) -> Result<StoichTermExpr> {
        let location = self.current.location;

        let mut negative = false;
        while self.current.kind == TokenKind::Minus {
            negative = !negative;
            self.get_token();
        }

        let mut coeff: i64 = 1;
        if self.current.kind == TokenKind::Integer {
            let token = self.expect(TokenKind::Integer, "expected an integer")?;
            coeff = token.text.parse::<i64>().map_err(|_| {
                ParseError::lexical(
                    format!("integer literal '{}' is out of range", token.text),
                    token.location,
                )
            })?;
        } else if self.current.kind == TokenKind::Real {
            return Err(ParseError::structural(
                format!(
                    "stoichiometric coefficients must be integers, found number '{}'",
                    self.current.text
                ),
                self.current.location,
            ));
        }

        let ident = self.expect_identifier("expected a species identifier")?;

        Ok(StoichTermExpr {
            coeff: if negative { -coeff } else { coeff },
            ident: ident.text,
            location,
        })
    }

    /// Parse a possibly empty sum of stoichiometric terms. A `-`
    /// separator is left in place for the following term, which picks it
    /// up as its sign.
    pub fn parse_stoich_expression(&mut self) -> Result<Expression> {
        Ok(Expression::Stoich(self.stoich_expression()?))
    }

    fn stoich_expression(&mut self) -> Result<StoichExpr> {
        let location = self.current.location;
        let mut terms = Vec::new();

        if matches!(
            self.current.kind,
            TokenKind::Integer | TokenKind::Identifier | TokenKind::Minus
        ) {
            terms.push(self.stoich_term()?);
            loop {
                match self.current.kind {
                    TokenKind::Plus => {
                        self.get_token();
                        terms.push(self.stoich_term()?);
                    }
                    TokenKind::Minus => {
                        terms.push(self.stoich_term()?);
                    }
                    _ => break,
                }
            }
        }

        Ok(StoichExpr { terms, location })
    }

    /// Parse `~ stoich <-> stoich (fwd, rev)`. One-directional arrows
    /// and negative terms are rejected; both rates are required.
    pub fn parse_reaction_expression(&mut self) -> Result<Expression> {
        let keyword = self.expect(TokenKind::Tilde, "reaction statements must start with '~'")?;

        let lhs = self.stoich_expression()?;
        Self::reject_negative_terms(&lhs)?;

        self.expect(TokenKind::ReactionArrow, "expected '<->' in reaction")?;

        let rhs = self.stoich_expression()?;
        Self::reject_negative_terms(&rhs)?;

        self.expect(TokenKind::LParen, "expected a '(fwd, rev)' rate pair")?;
        let fwd_rate = self.parse_expression()?;
        self.expect(TokenKind::Comma, "expected ',' between the rates")?;
        let rev_rate = self.parse_expression()?;
        self.expect(TokenKind::RParen, "expected ')' to close the rate pair")?;

        Ok(Expression::Reaction(ReactionExpr {
            lhs,
            rhs,
            fwd_rate: Box::new(fwd_rate),
            rev_rate: Box::new(rev_rate),
            location: keyword.location,
        }))
    }

    fn reject_negative_terms(stoich: &StoichExpr) -> Result<()> {
        for term in &stoich.terms {
            if term.is_negative() {
                return Err(ParseError::structural(
                    format!(
                        "stoichiometric term '{}' in a reaction must have a positive coefficient",
                        term.ident
                    ),
                    term.location,
                ));
            }
        }
        Ok(())
    }

    /// Parse `CONSERVE stoich = expr`. The left side may be empty and
    /// its terms may be negative.
    pub fn parse_conserve_expression(&mut self) -> Result<Expression> {
        let keyword = self.expect(TokenKind::Conserve, "expected 'CONSERVE'")?;
        let lhs = self.stoich_expression()?;
        self.expect(TokenKind::Assign, "expected '=' in CONSERVE")?;
        let rhs = self.parse_expression()?;

        Ok(Expression::Conserve(ConserveExpr {
            lhs,
            rhs: Box::new(rhs),
            location: keyword.location,
        }))
    }

    // ===== Procedural block headers =====

    /// Parse a whole procedural block — PROCEDURE, INITIAL, BREAKPOINT,
    /// KINETIC, DERIVATIVE, LINEAR or NET_RECEIVE — into a symbol with
    /// its body attached.
    pub fn parse_procedure(&mut self) -> Result<Symbol> {
        let location = self.current.location;
        let keyword = self.current.kind;

        let (name, args) = match keyword {
            TokenKind::Procedure
            | TokenKind::Kinetic
            | TokenKind::Derivative
            | TokenKind::Linear => {
                self.get_token();
                self.parse_prototype(None)?
            }
            TokenKind::Initial => {
                self.get_token();
                self.parse_prototype(Some("initial"))?
            }
            TokenKind::Breakpoint => {
                self.get_token();
                self.parse_prototype(Some("breakpoint"))?
            }
            TokenKind::NetReceive => {
                self.get_token();
                let (name, args) = self.parse_prototype(Some("net_receive"))?;
                let body = self.parse_block(false)?;
                return Ok(Symbol::NetReceive(NetReceiveSymbol {
                    name,
                    location,
                    args,
                    body: Some(body),
                }));
            }
            _ => {
                return Err(ParseError::syntax(
                    format!("expected a procedure block, found {}", self.current),
                    self.current.location,
                ));
            }
        };

        let kind = match keyword {
            TokenKind::Kinetic => ProcedureKind::Kinetic,
            TokenKind::Derivative => ProcedureKind::Derivative,
            TokenKind::Linear => ProcedureKind::Linear,
            TokenKind::Initial => ProcedureKind::Initial,
            TokenKind::Breakpoint => ProcedureKind::Breakpoint,
            _ => ProcedureKind::Normal,
        };

        let body = self.parse_block(false)?;

        Ok(Symbol::Procedure(ProcedureSymbol {
            name,
            location,
            kind,
            args,
            body: Some(body),
        }))
    }

    /// Parse a whole FUNCTION block into a symbol with its body attached.
    pub fn parse_function(&mut self) -> Result<Symbol> {
        let location = self.current.location;
        self.expect(TokenKind::Function, "expected 'FUNCTION'")?;
        let (name, args) = self.parse_prototype(None)?;
        let body = self.parse_block(false)?;

        Ok(Symbol::Function(FunctionSymbol {
            name,
            location,
            args,
            body: Some(body),
        }))
    }

    /// Parse a block prototype: a name (taken from the source unless the
    /// block kind fixes it) and an optional parenthesised argument list.
    fn parse_prototype(&mut self, fixed_name: Option<&str>) -> Result<(String, Vec<String>)> {
        let name = match fixed_name {
            Some(name) => name.to_string(),
            None => {
                self.expect_identifier("expected a name for the block")?
                    .text
            }
        };

        let mut args = Vec::new();
        if self.current.kind == TokenKind::LParen {
            self.get_token();
            if self.current.kind != TokenKind::RParen {
                loop {
                    let arg = self.expect_identifier("expected an argument name")?;
                    args.push(arg.text);
                    if self.current.kind != TokenKind::Comma {
                        break;
                    }
                    self.get_token();
                }
            }
            self.expect(TokenKind::RParen, "expected ')' after the argument list")?;
        }

        Ok((name, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse<'s, F, T>(text: &'s str, f: F) -> Result<T>
    where
        F: FnOnce(&mut Parser<'s>) -> Result<T>,
    {
        f(&mut Parser::new(text))
    }

    #[test]
    fn test_parse_local() {
        let e = parse("LOCAL xyz", Parser::parse_local).unwrap();
        assert_eq!(e.as_local().unwrap().variables, vec!["xyz".to_string()]);

        let e = parse("LOCAL x, y, z", Parser::parse_local).unwrap();
        let decl = e.as_local().unwrap();
        assert_eq!(
            decl.variables,
            vec!["x".to_string(), "y".to_string(), "z".to_string()]
        );

        assert!(parse("LOCAL x,", Parser::parse_local).is_err());
        assert!(parse("LOCAL x, x", Parser::parse_local).is_err());
    }

    #[test]
    fn test_parse_solve() {
        let e = parse("SOLVE states METHOD cnexp", Parser::parse_solve).unwrap();
        let solve = e.as_solve().unwrap();
        assert_eq!(solve.name, "states");
        assert_eq!(solve.method, SolveMethod::Cnexp);

        let e = parse("SOLVE states", Parser::parse_solve).unwrap();
        let solve = e.as_solve().unwrap();
        assert_eq!(solve.name, "states");
        assert_eq!(solve.method, SolveMethod::None);

        let e = parse("SOLVE kin METHOD sparse", Parser::parse_solve).unwrap();
        assert_eq!(e.as_solve().unwrap().method, SolveMethod::Sparse);

        assert!(parse("SOLVE states METHOD euler", Parser::parse_solve).is_err());
    }

    #[test]
    fn test_parse_conductance() {
        let e = parse("CONDUCTANCE g USEION na", Parser::parse_conductance).unwrap();
        let c = e.as_conductance().unwrap();
        assert_eq!(c.name, "g");
        assert_eq!(c.ion, IonKind::Na);

        let e = parse("CONDUCTANCE gnda", Parser::parse_conductance).unwrap();
        let c = e.as_conductance().unwrap();
        assert_eq!(c.name, "gnda");
        assert_eq!(c.ion, IonKind::Nonspecific);

        assert!(parse("CONDUCTANCE g USEION zn", Parser::parse_conductance).is_err());
    }

    #[test]
    fn test_parse_if() {
        let e = parse(
            "if(a<b) {\n    a = 2+b\n    b = 4^b\n}\n",
            Parser::parse_if,
        )
        .unwrap();
        let s = e.as_if().unwrap();
        assert!(s.condition.as_binary().is_some());
        assert!(s.true_branch.as_block().is_some());
        assert!(s.false_branch.is_none());

        let e = parse(
            "if(a<b) { a = 2+b } else { a = 2+b }",
            Parser::parse_if,
        )
        .unwrap();
        let s = e.as_if().unwrap();
        assert!(s.false_branch.as_deref().unwrap().as_block().is_some());
    }

    #[test]
    fn test_parse_else_if_chain() {
        let e = parse(
            "if(abs(a-b)) { a = 2+b } else if(b>a){ a = 2+b }",
            Parser::parse_if,
        )
        .unwrap();
        let s = e.as_if().unwrap();
        assert!(s.condition.as_unary().is_some());
        assert!(s.true_branch.as_block().is_some());
        let chained = s.false_branch.as_deref().unwrap().as_if().unwrap();
        assert!(chained.false_branch.is_none());
    }

    #[test]
    fn test_if_blocks_are_nested() {
        let e = parse("if(a<b){a=2+b}else if(b>a){a=2+b}", Parser::parse_if).unwrap();
        let s = e.as_if().unwrap();
        assert!(s.true_branch.as_block().unwrap().is_nested);
    }

    #[test]
    fn test_parse_stoich_term() {
        for text in ["B", "B3", "3B3", "0A", "12A", "4E"] {
            let e = parse(text, Parser::parse_stoich_term).unwrap();
            assert!(!e.as_stoich_term().unwrap().is_negative(), "{}", text);
        }

        for text in ["-3B3", "-A", "-12A"] {
            let e = parse(text, Parser::parse_stoich_term).unwrap();
            assert!(e.as_stoich_term().unwrap().is_negative(), "{}", text);
        }

        // '3e2' lexes as the real 300.0, so it cannot be a coefficient
        for text in ["0.2A", "5", "3e2"] {
            assert!(parse(text, Parser::parse_stoich_term).is_err(), "{}", text);
        }
    }

    #[test]
    fn test_parse_stoich_expression() {
        for text in ["B", "B3", "3xy"] {
            let e = parse(text, Parser::parse_stoich_expression).unwrap();
            assert_eq!(e.as_stoich().unwrap().terms.len(), 1, "{}", text);
        }

        for text in ["B+A", "a1 + 2bn", "4c+d"] {
            let e = parse(text, Parser::parse_stoich_expression).unwrap();
            assert_eq!(e.as_stoich().unwrap().terms.len(), 2, "{}", text);
        }

        for text in ["", "a+b+c", "1a-2b+3c+4d"] {
            assert!(parse(text, Parser::parse_stoich_expression).is_ok(), "{}", text);
        }

        let e = parse("-3a+2b-c+d", Parser::parse_stoich_expression).unwrap();
        let terms = &e.as_stoich().unwrap().terms;
        assert_eq!(terms.len(), 4);
        let coeffs: Vec<i64> = terms.iter().map(|t| t.coeff).collect();
        assert_eq!(coeffs, vec![-3, 2, -1, 1]);

        for text in ["A+B+", "A+5+B"] {
            assert!(parse(text, Parser::parse_stoich_expression).is_err(), "{}", text);
        }
    }

    #[test]
    fn test_stoich_coefficient_magnitudes() {
        // sum of |coeff| equals the number of species tokens when every
        // coefficient is 1
        let e = parse("a+b+c", Parser::parse_stoich_expression).unwrap();
        let total: i64 = e
            .as_stoich()
            .unwrap()
            .terms
            .iter()
            .map(|t| t.coeff.abs())
            .sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_parse_reaction_expression() {
        let good = [
            "~ A + B <-> C + D (k1, k2)",
            "~ 2B <-> C + D + E (k1(3,v), k2)",
            "~ <-> C + D + 7 E (k1, f(a,b)-2)",
            "~ <-> C + D + 7E+F (k1, f(a,b)-2)",
            "~ <-> (f,g)",
            "~ A + 3B + C<-> (f,g)",
        ];
        for text in good {
            assert!(parse(text, Parser::parse_reaction_expression).is_ok(), "{}", text);
        }

        let bad = [
            "~ A + B <-> C + D (k1, k2, k3)",
            "~ A + B <-> C + (k1, k2)",
            "~ 2.3B <-> C + D + E (k1(3,v), k2)",
            "~ <-> C + D + 7E",
            "~ <-> C + D + 7E+2F (k1, f(a,b)-2)", // '7E+2' lexes as a real
            "~ <-> (,g)",
            "~ A - 3B + C<-> (f,g)", // negative terms are not reactions
            "  A <-> B (k1, k2)",    // missing '~'
            "~ A <- B (k1)",
            "~ A -> B (k2)",
        ];
        for text in bad {
            assert!(parse(text, Parser::parse_reaction_expression).is_err(), "{}", text);
        }
    }

    #[test]
    fn test_reaction_structure() {
        let e = parse("~ A + B <-> C + D (k1, k2)", Parser::parse_reaction_expression).unwrap();
        let r = e.as_reaction().unwrap();
        assert_eq!(r.lhs.terms.len(), 2);
        assert_eq!(r.lhs.terms[0].coeff, 1);
        assert_eq!(r.lhs.terms[0].ident, "A");
        assert_eq!(r.rhs.terms[1].ident, "D");
        assert_eq!(r.fwd_rate.as_identifier().unwrap().name, "k1");
        assert_eq!(r.rev_rate.as_identifier().unwrap().name, "k2");
    }

    #[test]
    fn test_parse_conserve() {
        let e = parse("CONSERVE a + b = 1", Parser::parse_conserve_expression).unwrap();
        let c = e.as_conserve().unwrap();
        assert!(c.rhs.as_number_value().is_some());
        assert_eq!(c.lhs.terms.len(), 2);

        let e = parse("CONSERVE a = 1.23e-2", Parser::parse_conserve_expression).unwrap();
        let c = e.as_conserve().unwrap();
        assert_eq!(c.rhs.as_number_value(), Some(1.23e-2));
        assert_eq!(c.lhs.terms.len(), 1);

        // an empty left side is allowed
        let e = parse("CONSERVE = 0", Parser::parse_conserve_expression).unwrap();
        assert_eq!(e.as_conserve().unwrap().lhs.terms.len(), 0);

        let e = parse(
            "CONSERVE -2a + b -c = foo*2.3-bar",
            Parser::parse_conserve_expression,
        )
        .unwrap();
        let c = e.as_conserve().unwrap();
        assert!(c.rhs.as_binary().is_some());
        let coeffs: Vec<i64> = c.lhs.terms.iter().map(|t| t.coeff).collect();
        assert_eq!(coeffs, vec![-2, 1, -1]);

        let bad = [
            "CONSERVE a + 3*b -c = 1",
            "CONSERVE a + 3b -c = ",
            "a+b+c = 2",
            "CONSERVE a + 3b +c",
        ];
        for text in bad {
            assert!(parse(text, Parser::parse_conserve_expression).is_err(), "{}", text);
        }
    }

    #[test]
    fn test_parse_procedure() {
        let sources = [
            "PROCEDURE foo(x, y) {\n\
               LOCAL a\n\
               LOCAL b\n\
               LOCAL c\n\
               a = 3\n\
               b = x * y + 2\n\
               y = x + y * 2\n\
               y = a + b +c + a + b\n\
               y = a + b *c + a + b\n\
             }",
            "PROCEDURE trates(v) {\n\
                 LOCAL qt\n\
                 qt=q10^((celsius-22)/10)\n\
                 minf=1-1/(1+exp((v-vhalfm)/km))\n\
                 hinf=1/(1+exp((v-vhalfh)/kh))\n\
                 mtau = 0.6\n\
                 htau = 1500\n\
             }",
        ];
        for text in sources {
            let sym = parse(text, Parser::parse_procedure).unwrap();
            let proc = sym.as_procedure().unwrap();
            assert_eq!(proc.kind, ProcedureKind::Normal);
            assert!(proc.body.is_some());
        }
    }

    #[test]
    fn test_parse_net_receive() {
        let text = "NET_RECEIVE (x, y) {   \n\
                      LOCAL a              \n\
                      a = 3                \n\
                      x = a+3              \n\
                      y = x+a              \n\
                    }";
        let sym = parse(text, Parser::parse_procedure).unwrap();
        let nr = sym.as_net_receive().unwrap();
        assert_eq!(nr.args.len(), 2);
        assert!(nr.body.is_some());
    }

    #[test]
    fn test_parse_function() {
        let text = "FUNCTION foo(x, y) {\n\
                      LOCAL a\n\
                      a = 3\n\
                      b = x * y + 2\n\
                      y = x + y * 2\n\
                      foo = a * x + y\n\
                    }";
        let sym = parse(text, Parser::parse_function).unwrap();
        let func = sym.as_function().unwrap();
        assert_eq!(func.name, "foo");
        assert_eq!(func.args, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_parse_kinetic() {
        let text = "KINETIC kin {\n\
                        rates(v)             \n\
                        ~ s1 <-> s2 (f1, r1) \n\
                        ~ s2 <-> s3 (f2, r2) \n\
                        ~ s2 <-> s4 (f3, r3) \n\
                        CONSERVE s1 + s3 + s4 - s2 = 2.3\n\
                    }";
        let sym = parse(text, Parser::parse_procedure).unwrap();
        let proc = sym.as_procedure().unwrap();
        assert_eq!(proc.kind, ProcedureKind::Kinetic);
        assert_eq!(proc.name, "kin");

        let body = proc.body.as_ref().unwrap().as_block().unwrap();
        assert_eq!(body.statements.len(), 5);
        assert!(body.statements[0].as_call().is_some());
        assert!(body.statements[1].as_reaction().is_some());
        assert!(body.statements[4].as_conserve().is_some());
    }

    #[test]
    fn test_nested_initial_in_kinetic() {
        let text = "KINETIC kin {\n\
                        INITIAL { s1 = 1 }\n\
                        ~ s1 <-> s2 (f, r)\n\
                    }";
        let sym = parse(text, Parser::parse_procedure).unwrap();
        let body = sym.body().unwrap().as_block().unwrap();
        assert!(body.statements[0].as_initial().is_some());
    }

    #[test]
    fn test_block_statements_are_all_present() {
        let text = "PROCEDURE p() {\n\
                        a = 1\n\
                        if(a<2) { a = 2 }\n\
                        b = a\n\
                    }";
        let sym = parse(text, Parser::parse_procedure).unwrap();
        let body = sym.body().unwrap().as_block().unwrap();
        assert_eq!(body.statements.len(), 3);
        assert!(!body.is_nested);
    }

    #[test]
    fn test_reparse_is_structurally_equal() {
        let text = "DERIVATIVE states {\n\
                        m' = (minf-m)/mtau\n\
                        h' = (hinf-h)/htau\n\
                    }";
        let a = parse(text, Parser::parse_procedure).unwrap();
        let b = parse(text, Parser::parse_procedure).unwrap();
        assert_eq!(a, b);
    }
}
