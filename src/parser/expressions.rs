//! Expression parsing implementation
//!
//! This module handles expression parsing using precedence climbing for
//! binary operators and recursive descent for unary and primary forms.
//!
//! # Precedence
//!
//! From loosest to tightest: comparisons (`< <= > >= == !=`), additive
//! (`+ -`), multiplicative (`* /`), and power (`^`, the one
//! right-associative operator). Unary `+ - exp log abs` bind tighter
//! still, and `min`/`max` are two-argument primaries producing binary
//! nodes. Assignment is not an expression operator: it is handled at
//! statement level by [`Parser::parse_line_expression`], and anything
//! like `(x=3)` is rejected.
//!
//! All parsing methods are implemented as methods on the [`Parser`]
//! struct.

use crate::error::{ParseError, Result};
use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::Parser;

/// Binding power of a binary operator token, or `None` for everything
/// else. `^` is the only right-associative level.
fn binary_precedence(kind: TokenKind) -> Option<u8> {
    let prec = match kind {
        TokenKind::Assign => 1,
        TokenKind::Lt
        | TokenKind::Le
        | TokenKind::Gt
        | TokenKind::Ge
        | TokenKind::EqEq
        | TokenKind::Ne => 2,
        TokenKind::Plus | TokenKind::Minus => 3,
        TokenKind::Star | TokenKind::Slash => 4,
        TokenKind::Caret => 5,
        _ => return None,
    };
    Some(prec)
}

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Caret => BinaryOp::Pow,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::Le => BinaryOp::Le,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::Ge => BinaryOp::Ge,
        TokenKind::EqEq => BinaryOp::Eq,
        TokenKind::Ne => BinaryOp::Ne,
        _ => return None,
    };
    Some(op)
}

impl<'src> Parser<'src> {
    /// Parse an expression (rvalue context).
    pub fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_expression_prec(0)
    }

    /// Precedence climbing: parse a unary-prefixed primary, then fold in
    /// binary operators of at least `min_prec`, recursing at `prec + 1`
    /// for left-associative operators and `prec` for the
    /// right-associative `^`.
    fn parse_expression_prec(&mut self, min_prec: u8) -> Result<Expression> {
        let mut lhs = self.parse_unaryop()?;

        while let Some(prec) = binary_precedence(self.current.kind) {
            if self.current.kind == TokenKind::Assign {
                return Err(ParseError::structural(
                    "assignment '=' is not allowed inside an expression",
                    self.current.location,
                ));
            }
            if prec < min_prec {
                break;
            }

            let location = self.current.location;
            let op = match binary_op(self.current.kind) {
                Some(op) => op,
                None => break,
            };
            self.get_token();

            let next_min = if op == BinaryOp::Pow { prec } else { prec + 1 };
            let rhs = self.parse_expression_prec(next_min)?;

            lhs = Expression::Binary(BinaryExpr {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                location,
            });
        }

        Ok(lhs)
    }

    /// Parse a statement-level expression: a procedure call, an
    /// assignment, or an ODE assignment `x' = expr`. The statement must
    /// be the last thing on its line.
    pub fn parse_line_expression(&mut self) -> Result<Expression> {
        let line = self.current.location.line;

        let expr = if self.current.kind == TokenKind::Identifier
            && self.peek_kind() == TokenKind::LParen
        {
            let call = self.parse_call()?;
            if self.current.kind == TokenKind::Assign {
                return Err(ParseError::structural(
                    "the left hand side of an assignment must be a variable",
                    self.current.location,
                ));
            }
            call
        } else {
            let id = self.parse_identifier()?;
            let lhs = if self.current.kind == TokenKind::Prime {
                self.get_token();
                match id {
                    Expression::Identifier(id) => Expression::Derivative(DerivativeExpr {
                        name: id.name,
                        location: id.location,
                    }),
                    _ => unreachable!(),
                }
            } else {
                id
            };

            let eq = self.expect(
                TokenKind::Assign,
                "expected an assignment '=' or a function call",
            )?;
            let rhs = self.parse_expression()?;
            Expression::Assignment(AssignmentExpr {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                location: eq.location,
            })
        };

        // a line expression is terminated by the end of its line
        if self.current.location.line == line
            && !matches!(self.current.kind, TokenKind::Eof | TokenKind::RBrace)
        {
            return Err(ParseError::syntax(
                format!("expected a new line after statement, found {}", self.current),
                self.current.location,
            ));
        }

        Ok(expr)
    }

    /// Parse a unary-prefixed expression, falling through to a primary.
    pub fn parse_unaryop(&mut self) -> Result<Expression> {
        let location = self.current.location;
        let op = match self.current.kind {
            TokenKind::Plus => UnaryOp::Pos,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Exp => UnaryOp::Exp,
            TokenKind::Log => UnaryOp::Log,
            TokenKind::Abs => UnaryOp::Abs,
            _ => return self.parse_primary(),
        };
        self.get_token();
        let operand = self.parse_unaryop()?;
        Ok(Expression::Unary(UnaryExpr {
            op,
            operand: Box::new(operand),
            location,
        }))
    }

    /// Parse a primary: literal, parenthesised expression, identifier,
    /// call, or a `min`/`max` intrinsic.
    fn parse_primary(&mut self) -> Result<Expression> {
        match self.current.kind {
            TokenKind::Integer => self.parse_integer(),
            TokenKind::Real => self.parse_real(),
            TokenKind::LParen => self.parse_parenthesis_expression(),
            TokenKind::Identifier => {
                if self.peek_kind() == TokenKind::LParen {
                    self.parse_call()
                } else {
                    self.parse_identifier()
                }
            }
            TokenKind::Min | TokenKind::Max => self.parse_minmax(),
            TokenKind::Eof => Err(ParseError::syntax(
                "unexpected end of input in expression",
                self.current.location,
            )),
            TokenKind::Error => Err(self.lexical_error()),
            _ => Err(ParseError::syntax(
                format!("unexpected {} in expression", self.current),
                self.current.location,
            )),
        }
    }

    /// Parse `( expression )`. Assignments inside parentheses are
    /// rejected by [`Parser::parse_expression`].
    pub fn parse_parenthesis_expression(&mut self) -> Result<Expression> {
        self.expect(TokenKind::LParen, "expected '('")?;
        let expr = self.parse_expression()?;
        self.expect(TokenKind::RParen, "missing closing ')'")?;
        Ok(expr)
    }

    /// Parse an integer literal.
    pub(crate) fn parse_integer(&mut self) -> Result<Expression> {
        let token = self.expect(TokenKind::Integer, "expected an integer")?;
        let value = token.text.parse::<i64>().map_err(|_| {
            ParseError::lexical(
                format!("integer literal '{}' is out of range", token.text),
                token.location,
            )
        })?;
        Ok(Expression::Integer(IntegerExpr {
            value,
            location: token.location,
        }))
    }

    /// Parse a real literal.
    pub(crate) fn parse_real(&mut self) -> Result<Expression> {
        let token = self.expect(TokenKind::Real, "expected a number")?;
        let value = token.text.parse::<f64>().map_err(|_| {
            ParseError::lexical(
                format!("malformed numeric literal '{}'", token.text),
                token.location,
            )
        })?;
        Ok(Expression::Real(RealExpr {
            value,
            location: token.location,
        }))
    }

    /// Parse a bare identifier.
    pub(crate) fn parse_identifier(&mut self) -> Result<Expression> {
        let token = self.expect_identifier("expected an identifier")?;
        Ok(Expression::Identifier(IdentifierExpr {
            name: token.text,
            location: token.location,
        }))
    }

    /// Parse `name(arg, ...)`.
    pub(crate) fn parse_call(&mut self) -> Result<Expression> {
        let name = self.expect_identifier("expected a function name")?;
        self.expect(TokenKind::LParen, "expected '(' after function name")?;

        let mut args = Vec::new();
        if self.current.kind != TokenKind::RParen {
            loop {
                args.push(self.parse_expression()?);
                if self.current.kind != TokenKind::Comma {
                    break;
                }
                self.get_token();
            }
        }
        self.expect(TokenKind::RParen, "expected ')' to close the call")?;

        Ok(Expression::Call(CallExpr {
            function: name.text,
            args,
            location: name.location,
        }))
    }

    /// Parse the two-argument intrinsics `min(a, b)` / `max(a, b)`,
    /// which produce binary nodes.
    fn parse_minmax(&mut self) -> Result<Expression> {
        let token = self.current.clone();
        let op = match token.kind {
            TokenKind::Min => BinaryOp::Min,
            _ => BinaryOp::Max,
        };
        self.get_token();

        self.expect(TokenKind::LParen, "expected '(' after min/max")?;
        let lhs = self.parse_expression()?;
        self.expect(TokenKind::Comma, "min/max take exactly two arguments")?;
        let rhs = self.parse_expression()?;
        self.expect(TokenKind::RParen, "expected ')' to close min/max")?;

        Ok(Expression::Binary(BinaryExpr {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            location: token.location,
        }))
    }
}
