//! Descriptive block parsing
//!
//! This module handles the blocks interpreted during pass 1: TITLE,
//! NEURON, STATE, PARAMETER, ASSIGNED and UNITS. None of them build AST
//! nodes; they populate the module's NEURON metadata, the UNITS table,
//! and the variable buffer that [`Parser::add_variables_to_symbols`]
//! installs after the pass.
//!
//! All parsing methods are implemented as methods on the [`Parser`]
//! struct.

use crate::error::{ParseError, Result};
use crate::module::{IonDep, MechanismKind, UnitDef, VariableKind, VariableSymbol};
use crate::parser::ast::IonKind;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::Parser;

impl<'src> Parser<'src> {
    /// Parse `TITLE <free text to end of line>`.
    pub(crate) fn parse_title(&mut self) -> Result<()> {
        // current is the TITLE keyword; the rest of the line is free text
        let title = self.lexer.take_line();
        self.module.title = title;
        self.get_token();
        Ok(())
    }

    /// Parse the NEURON block into [`crate::module::NeuronInfo`].
    pub(crate) fn parse_neuron_block(&mut self) -> Result<()> {
        self.expect(TokenKind::Neuron, "expected 'NEURON'")?;
        self.expect(TokenKind::LBrace, "expected '{' to open the NEURON block")?;

        loop {
            match self.current.kind {
                TokenKind::RBrace => break,
                TokenKind::Suffix => {
                    self.get_token();
                    let name = self
                        .expect_identifier("expected a mechanism name after SUFFIX")?
                        .text;
                    self.module.neuron.kind = Some(MechanismKind::Density { suffix: name });
                }
                TokenKind::PointProcess => {
                    self.get_token();
                    let name = self
                        .expect_identifier("expected a mechanism name after POINT_PROCESS")?
                        .text;
                    self.module.neuron.kind = Some(MechanismKind::PointProcess { name });
                }
                TokenKind::NonspecificCurrent => {
                    self.get_token();
                    let names = self.comma_separated_identifiers(
                        "expected a current name after NONSPECIFIC_CURRENT",
                    )?;
                    self.module.neuron.nonspecific_currents.extend(names);
                }
                TokenKind::UseIon => {
                    let dep = self.parse_useion_clause()?;
                    self.module.neuron.ions.push(dep);
                }
                TokenKind::Range => {
                    self.get_token();
                    let names =
                        self.comma_separated_identifiers("expected a variable name after RANGE")?;
                    self.module.neuron.range.extend(names);
                }
                TokenKind::Global => {
                    self.get_token();
                    let names =
                        self.comma_separated_identifiers("expected a variable name after GLOBAL")?;
                    self.module.neuron.globals.extend(names);
                }
                TokenKind::Eof => {
                    return Err(ParseError::structural(
                        "unexpected end of file in NEURON block",
                        self.current.location,
                    ));
                }
                TokenKind::Error => return Err(self.lexical_error()),
                _ => {
                    return Err(ParseError::syntax(
                        format!("unexpected {} in NEURON block", self.current),
                        self.current.location,
                    ));
                }
            }
        }

        self.expect(TokenKind::RBrace, "expected '}' to close the NEURON block")?;
        Ok(())
    }

    /// Parse `USEION <ion> [READ list] [WRITE list] [VALENCE int]`.
    fn parse_useion_clause(&mut self) -> Result<IonDep> {
        self.get_token(); // consume USEION
        let ion_token = self.expect_identifier("expected an ion name after USEION")?;
        let ion = IonKind::from_name(&ion_token.text).ok_or_else(|| {
            ParseError::declarative(
                format!("unknown ion species '{}'", ion_token.text),
                ion_token.location,
            )
        })?;

        let mut dep = IonDep {
            ion,
            read: Vec::new(),
            write: Vec::new(),
            valence: None,
        };

        if self.current.kind == TokenKind::Read {
            self.get_token();
            dep.read = self.comma_separated_identifiers("expected a variable name after READ")?;
        }
        if self.current.kind == TokenKind::Write {
            self.get_token();
            dep.write = self.comma_separated_identifiers("expected a variable name after WRITE")?;
        }
        if self.current.kind == TokenKind::Valence {
            self.get_token();
            dep.valence = Some(self.integer_literal()?);
        }

        Ok(dep)
    }

    /// Parse the STATE block: `STATE { id (unit)? ... }`.
    pub fn parse_state_block(&mut self) -> Result<()> {
        self.expect(TokenKind::State, "expected 'STATE'")?;
        self.expect(TokenKind::LBrace, "expected '{' to open the STATE block")?;

        while self.current.kind != TokenKind::RBrace {
            let name = self.expect_identifier("expected a state variable name")?;
            let unit = if self.current.kind == TokenKind::LParen {
                Some(self.unit_description()?)
            } else {
                None
            };
            self.variables.push(VariableSymbol {
                name: name.text,
                location: name.location,
                kind: VariableKind::State,
                unit,
                value: None,
                range: None,
            });
        }

        self.expect(TokenKind::RBrace, "expected '}' to close the STATE block")?;
        Ok(())
    }

    /// Parse the PARAMETER block:
    /// `PARAMETER { id (= literal)? (unit)? (<lo, hi>)? ... }`.
    pub(crate) fn parse_parameter_block(&mut self) -> Result<()> {
        self.expect(TokenKind::Parameter, "expected 'PARAMETER'")?;
        self.expect(TokenKind::LBrace, "expected '{' to open the PARAMETER block")?;

        while self.current.kind != TokenKind::RBrace {
            let name = self.expect_identifier("expected a parameter name")?;

            let value = if self.current.kind == TokenKind::Assign {
                self.get_token();
                Some(self.value_literal()?)
            } else {
                None
            };

            let unit = if self.current.kind == TokenKind::LParen {
                Some(self.unit_description()?)
            } else {
                None
            };

            let range = if self.current.kind == TokenKind::Lt {
                Some(self.range_description()?)
            } else {
                None
            };

            self.variables.push(VariableSymbol {
                name: name.text,
                location: name.location,
                kind: VariableKind::Parameter,
                unit,
                value,
                range,
            });
        }

        self.expect(TokenKind::RBrace, "expected '}' to close the PARAMETER block")?;
        Ok(())
    }

    /// Parse the ASSIGNED block: `ASSIGNED { id (unit)? ... }`.
    pub(crate) fn parse_assigned_block(&mut self) -> Result<()> {
        self.expect(TokenKind::Assigned, "expected 'ASSIGNED'")?;
        self.expect(TokenKind::LBrace, "expected '{' to open the ASSIGNED block")?;

        while self.current.kind != TokenKind::RBrace {
            let name = self.expect_identifier("expected an assigned variable name")?;
            let unit = if self.current.kind == TokenKind::LParen {
                Some(self.unit_description()?)
            } else {
                None
            };
            self.variables.push(VariableSymbol {
                name: name.text,
                location: name.location,
                kind: VariableKind::Assigned,
                unit,
                value: None,
                range: None,
            });
        }

        self.expect(TokenKind::RBrace, "expected '}' to close the ASSIGNED block")?;
        Ok(())
    }

    /// Parse the UNITS block: `UNITS { (unit) = (unit) ... }`. Entries
    /// are stored verbatim and never interpreted.
    pub(crate) fn parse_units_block(&mut self) -> Result<()> {
        self.expect(TokenKind::Units, "expected 'UNITS'")?;
        self.expect(TokenKind::LBrace, "expected '{' to open the UNITS block")?;

        while self.current.kind != TokenKind::RBrace {
            let location = self.current.location;
            let lhs = self.unit_description()?;
            self.expect(TokenKind::Assign, "expected '=' in UNITS entry")?;
            let rhs = self.unit_description()?;
            self.module.units.push(UnitDef { lhs, rhs, location });
        }

        self.expect(TokenKind::RBrace, "expected '}' to close the UNITS block")?;
        Ok(())
    }

    // ===== Shared declaration helpers =====

    /// Parse `id (, id)*`.
    pub(crate) fn comma_separated_identifiers(&mut self, hint: &str) -> Result<Vec<String>> {
        let mut names = vec![self.expect_identifier(hint)?.text];
        while self.current.kind == TokenKind::Comma {
            self.get_token();
            names.push(self.expect_identifier(hint)?.text);
        }
        Ok(names)
    }

    /// Parse a parenthesised unit description and return the text between
    /// the parentheses exactly as written, e.g. `S/cm2`.
    pub(crate) fn unit_description(&mut self) -> Result<String> {
        let open = self.expect(TokenKind::LParen, "expected '(' to open a unit description")?;
        let start = self.current.offset;
        let mut end = start;
        while self.current.kind != TokenKind::RParen {
            match self.current.kind {
                TokenKind::Eof | TokenKind::LBrace | TokenKind::RBrace => {
                    return Err(ParseError::structural(
                        "unterminated unit description",
                        open.location,
                    ));
                }
                TokenKind::Error => return Err(self.lexical_error()),
                _ => {
                    end = self.current.offset + self.current.text.len();
                    self.get_token();
                }
            }
        }
        self.get_token(); // consume ')'
        Ok(self.source[start..end].to_string())
    }

    /// Parse a numeric literal with an optional leading minus, as used
    /// for parameter defaults and range bounds.
    pub(crate) fn value_literal(&mut self) -> Result<f64> {
        let negative = if self.current.kind == TokenKind::Minus {
            self.get_token();
            true
        } else {
            false
        };

        let token = self.current.clone();
        let value = match token.kind {
            TokenKind::Integer | TokenKind::Real => {
                self.get_token();
                token.text.parse::<f64>().map_err(|_| {
                    ParseError::lexical(
                        format!("malformed numeric literal '{}'", token.text),
                        token.location,
                    )
                })?
            }
            TokenKind::Error => return Err(self.lexical_error()),
            _ => {
                return Err(ParseError::syntax(
                    format!("expected a numeric literal, found {}", token),
                    token.location,
                ));
            }
        };

        Ok(if negative { -value } else { value })
    }

    /// Parse a `<lo, hi>` range constraint.
    pub(crate) fn range_description(&mut self) -> Result<(f64, f64)> {
        self.expect(TokenKind::Lt, "expected '<' to open a range")?;
        let lo = self.value_literal()?;
        self.expect(TokenKind::Comma, "expected ',' between range bounds")?;
        let hi = self.value_literal()?;
        self.expect(TokenKind::Gt, "expected '>' to close a range")?;
        Ok((lo, hi))
    }

    /// Parse a signed integer, as used for VALENCE.
    fn integer_literal(&mut self) -> Result<i64> {
        let negative = if self.current.kind == TokenKind::Minus {
            self.get_token();
            true
        } else {
            false
        };
        let token = self.expect(TokenKind::Integer, "malformed VALENCE, expected an integer")?;
        let value = token.text.parse::<i64>().map_err(|_| {
            ParseError::declarative(
                format!("malformed VALENCE '{}'", token.text),
                token.location,
            )
        })?;
        Ok(if negative { -value } else { value })
    }
}
