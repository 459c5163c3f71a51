// AST definitions for the mechanism description language.
//
// A single tagged [`Expression`] enum covers every node the parser can
// build, from numeric atoms up to whole procedure bodies. Downstream
// passes discriminate with the `as_*` accessors, which return a reference
// to the variant payload or `None`.

use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    // Comparison
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    // Two-argument intrinsics
    Min,
    Max,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Pos,
    Neg,
    Exp,
    Log,
    Abs,
}

/// Integration method named in a SOLVE statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveMethod {
    Cnexp,
    Sparse,
    /// No METHOD clause was given.
    None,
}

/// Ion species a mechanism can depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IonKind {
    Na,
    K,
    Ca,
    /// A current not attributed to a specific species.
    Nonspecific,
}

impl IonKind {
    /// Resolve an ion name as written in USEION. Unknown names are a
    /// declarative error at the use site.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "na" => Some(IonKind::Na),
            "k" => Some(IonKind::K),
            "ca" => Some(IonKind::Ca),
            _ => None,
        }
    }
}

impl fmt::Display for IonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IonKind::Na => write!(f, "na"),
            IonKind::K => write!(f, "k"),
            IonKind::Ca => write!(f, "ca"),
            IonKind::Nonspecific => write!(f, "nonspecific"),
        }
    }
}

/// Integer literal
#[derive(Debug, Clone, PartialEq)]
pub struct IntegerExpr {
    pub value: i64,
    pub location: Location,
}

/// Real literal
#[derive(Debug, Clone, PartialEq)]
pub struct RealExpr {
    pub value: f64,
    pub location: Location,
}

/// A name; binding to a symbol is a later pass's job.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierExpr {
    pub name: String,
    pub location: Location,
}

/// Call of a user procedure or function
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub function: String,
    pub args: Vec<Expression>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Box<Expression>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub lhs: Box<Expression>,
    pub rhs: Box<Expression>,
    pub location: Location,
}

/// Assignment statement. The parser guarantees `lhs` is an lvalue: an
/// identifier or a derivative (`x'`).
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentExpr {
    pub lhs: Box<Expression>,
    pub rhs: Box<Expression>,
    pub location: Location,
}

/// The `x'` form on the left of an ODE statement in a DERIVATIVE block
#[derive(Debug, Clone, PartialEq)]
pub struct DerivativeExpr {
    pub name: String,
    pub location: Location,
}

/// `{ stmt* }`. `is_nested` is true for blocks that appear inside another
/// block (if/else branches, nested INITIAL), false for procedure bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockExpr {
    pub statements: Vec<Expression>,
    pub is_nested: bool,
    pub location: Location,
}

/// `if (cond) { ... } else ...`; an `else if` chain is represented by an
/// If expression in `false_branch`.
#[derive(Debug, Clone, PartialEq)]
pub struct IfExpr {
    pub condition: Box<Expression>,
    pub true_branch: Box<Expression>,
    pub false_branch: Option<Box<Expression>>,
    pub location: Location,
}

/// `LOCAL a, b, c` — declared names in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct LocalDecl {
    pub variables: Vec<String>,
    pub location: Location,
}

/// `SOLVE name [METHOD cnexp|sparse]`
#[derive(Debug, Clone, PartialEq)]
pub struct SolveExpr {
    pub name: String,
    pub method: SolveMethod,
    pub location: Location,
}

/// `CONDUCTANCE g [USEION ion]`
#[derive(Debug, Clone, PartialEq)]
pub struct ConductanceExpr {
    pub name: String,
    pub ion: IonKind,
    pub location: Location,
}

/// One signed term of a stoichiometric expression, e.g. `2B` or `-A`.
/// The sign lives in the coefficient.
#[derive(Debug, Clone, PartialEq)]
pub struct StoichTermExpr {
    pub coeff: i64,
    pub ident: String,
    pub location: Location,
}

impl StoichTermExpr {
    pub fn is_negative(&self) -> bool {
        self.coeff < 0
    }
}

/// A possibly empty sum of stoichiometric terms
#[derive(Debug, Clone, PartialEq)]
pub struct StoichExpr {
    pub terms: Vec<StoichTermExpr>,
    pub location: Location,
}

/// `~ lhs <-> rhs (fwd, rev)`
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionExpr {
    pub lhs: StoichExpr,
    pub rhs: StoichExpr,
    pub fwd_rate: Box<Expression>,
    pub rev_rate: Box<Expression>,
    pub location: Location,
}

/// `CONSERVE stoich = expr`
#[derive(Debug, Clone, PartialEq)]
pub struct ConserveExpr {
    pub lhs: StoichExpr,
    pub rhs: Box<Expression>,
    pub location: Location,
}

/// An INITIAL block nested inside a procedural block (typically KINETIC)
#[derive(Debug, Clone, PartialEq)]
pub struct InitialExpr {
    pub body: Box<Expression>,
    pub location: Location,
}

/// AST nodes representing statements and expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Integer(IntegerExpr),
    Real(RealExpr),
    Identifier(IdentifierExpr),
    Call(CallExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Assignment(AssignmentExpr),
    Derivative(DerivativeExpr),
    Block(BlockExpr),
    If(IfExpr),
    Local(LocalDecl),
    Solve(SolveExpr),
    Conductance(ConductanceExpr),
    StoichTerm(StoichTermExpr),
    Stoich(StoichExpr),
    Reaction(ReactionExpr),
    Conserve(ConserveExpr),
    Initial(InitialExpr),
}

impl Expression {
    /// Get the source location of this node
    pub fn location(&self) -> Location {
        match self {
            Expression::Integer(e) => e.location,
            Expression::Real(e) => e.location,
            Expression::Identifier(e) => e.location,
            Expression::Call(e) => e.location,
            Expression::Unary(e) => e.location,
            Expression::Binary(e) => e.location,
            Expression::Assignment(e) => e.location,
            Expression::Derivative(e) => e.location,
            Expression::Block(e) => e.location,
            Expression::If(e) => e.location,
            Expression::Local(e) => e.location,
            Expression::Solve(e) => e.location,
            Expression::Conductance(e) => e.location,
            Expression::StoichTerm(e) => e.location,
            Expression::Stoich(e) => e.location,
            Expression::Reaction(e) => e.location,
            Expression::Conserve(e) => e.location,
            Expression::Initial(e) => e.location,
        }
    }

    pub fn as_integer(&self) -> Option<&IntegerExpr> {
        match self {
            Expression::Integer(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<&RealExpr> {
        match self {
            Expression::Real(e) => Some(e),
            _ => None,
        }
    }

    /// The numeric value of an integer or real literal.
    pub fn as_number_value(&self) -> Option<f64> {
        match self {
            Expression::Integer(e) => Some(e.value as f64),
            Expression::Real(e) => Some(e.value),
            _ => None,
        }
    }

    pub fn as_identifier(&self) -> Option<&IdentifierExpr> {
        match self {
            Expression::Identifier(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&CallExpr> {
        match self {
            Expression::Call(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_unary(&self) -> Option<&UnaryExpr> {
        match self {
            Expression::Unary(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&BinaryExpr> {
        match self {
            Expression::Binary(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_assignment(&self) -> Option<&AssignmentExpr> {
        match self {
            Expression::Assignment(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_derivative(&self) -> Option<&DerivativeExpr> {
        match self {
            Expression::Derivative(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&BlockExpr> {
        match self {
            Expression::Block(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_if(&self) -> Option<&IfExpr> {
        match self {
            Expression::If(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_local(&self) -> Option<&LocalDecl> {
        match self {
            Expression::Local(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_solve(&self) -> Option<&SolveExpr> {
        match self {
            Expression::Solve(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_conductance(&self) -> Option<&ConductanceExpr> {
        match self {
            Expression::Conductance(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_stoich_term(&self) -> Option<&StoichTermExpr> {
        match self {
            Expression::StoichTerm(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_stoich(&self) -> Option<&StoichExpr> {
        match self {
            Expression::Stoich(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_reaction(&self) -> Option<&ReactionExpr> {
        match self {
            Expression::Reaction(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_conserve(&self) -> Option<&ConserveExpr> {
        match self {
            Expression::Conserve(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_initial(&self) -> Option<&InitialExpr> {
        match self {
            Expression::Initial(e) => Some(e),
            _ => None,
        }
    }

    /// Whether this expression may stand on the left of an assignment.
    pub fn is_lvalue(&self) -> bool {
        matches!(self, Expression::Identifier(_) | Expression::Derivative(_))
    }
}
