//! Arithmetic correctness of the expression grammar.
//!
//! Rvalue expressions over numeric atoms are parsed and then evaluated
//! by walking the tree; the result must match ordinary floating point
//! arithmetic with the grammar's precedence and associativity rules.

use modparse::parser::ast::{BinaryOp, Expression, UnaryOp};
use modparse::parser::Parser;

/// Evaluate a parsed expression tree of numeric atoms.
fn eval(e: &Expression) -> f64 {
    if let Some(value) = e.as_number_value() {
        return value;
    }
    if let Some(b) = e.as_binary() {
        let lhs = eval(&b.lhs);
        let rhs = eval(&b.rhs);
        return match b.op {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => lhs / rhs,
            BinaryOp::Pow => lhs.powf(rhs),
            BinaryOp::Min => lhs.min(rhs),
            BinaryOp::Max => lhs.max(rhs),
            _ => f64::NAN,
        };
    }
    if let Some(u) = e.as_unary() {
        let value = eval(&u.operand);
        return match u.op {
            UnaryOp::Pos => value,
            UnaryOp::Neg => -value,
            _ => f64::NAN,
        };
    }
    f64::NAN
}

fn check(text: &str, expected: f64) {
    let parsed = Parser::new(text)
        .parse_expression()
        .unwrap_or_else(|e| panic!("failed to parse '{}': {}", text, e));
    let value = eval(&parsed);
    assert!(
        (value - expected).abs() <= 1e-10 * expected.abs().max(1.0),
        "'{}' evaluated to {}, expected {}",
        text,
        value,
        expected
    );
}

#[test]
fn test_simple_binops() {
    check("2+3", 2. + 3.);
    check("2-3", 2. - 3.);
    check("2*3", 2. * 3.);
    check("2/3", 2. / 3.);
    check("2^3", 8.);
    check("min(2,3)", 2.);
    check("min(3,2)", 2.);
    check("max(2,3)", 3.);
    check("max(3,2)", 3.);
}

#[test]
fn test_precedence() {
    check("2+3*2", 2. + (3. * 2.));
    check("2*3-5", (2. * 3.) - 5.);
    check("2+3*(-2)", 2. + (3. * -2.));
    check("2+3*(-+2)", 2. + (3. * -2.));
    check("2/3*4", (2. / 3.) * 4.);
    check("min(2+3, 4/2)", 2.);
    check("max(2+3, 4/2)", 5.);
    check("max(2+3, min(12, 24))", 12.);
    check("max(min(12, 24), 2+3)", 12.);
    check("2 * 7 - 3 * 11 + 4 * 13", 2. * 7. - 3. * 11. + 4. * 13.);
}

#[test]
fn test_power_is_right_associative() {
    check("2^3^2", 512.);
    check("(2^2)^3", 64.);
    check("2^3^1.5", 2f64.powf(3f64.powf(1.5)));
    check("2^3^1.5^2", 2f64.powf(3f64.powf(1.5f64.powf(2.))));
    check("2^2^3", 2f64.powf(8.));
    check("3./2^7.", 3. / 2f64.powf(7.));
    check("3^2*5.", 45.);
}

#[test]
fn test_multilevel() {
    check(
        "1-2*3^4*5^2^3-3^2^3/4/8-5",
        1. - 2. * 3f64.powf(4.) * 5f64.powf(2f64.powf(3.))
            - 3f64.powf(2f64.powf(3.)) / 4. / 8.
            - 5.,
    );
}

#[test]
fn test_unary_binds_tighter_than_power() {
    // the climbing loop applies '^' to the already-parsed unary operand
    check("-2^2", 4.);
}
