//! The parsed representation of one mechanism description.
//!
//! A [`Module`] is what the parser hands to downstream passes: the NEURON
//! block metadata, every declared symbol in declaration order, the raw
//! UNITS table, and any diagnostics. The symbol map is an
//! [`IndexMap`] so that code generation downstream emits variables and
//! procedures in the order the author wrote them.

use indexmap::IndexMap;

use crate::error::{ParseError, Status};
use crate::parser::ast::{Expression, IonKind, Location};

/// How a mechanism attaches to the cell membrane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MechanismKind {
    /// A density mechanism, named by `SUFFIX`.
    Density { suffix: String },
    /// A point process (synapse), named by `POINT_PROCESS`.
    PointProcess { name: String },
}

/// One `USEION` clause from the NEURON block.
#[derive(Debug, Clone, PartialEq)]
pub struct IonDep {
    pub ion: IonKind,
    /// Variables read from the ion pool (e.g. `ena`, `cai`).
    pub read: Vec<String>,
    /// Variables written to the ion pool (e.g. `ina`).
    pub write: Vec<String>,
    /// Explicit valence, if a `VALENCE` clause was given.
    pub valence: Option<i64>,
}

/// Everything extracted from the NEURON block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeuronInfo {
    pub kind: Option<MechanismKind>,
    pub nonspecific_currents: Vec<String>,
    pub ions: Vec<IonDep>,
    pub range: Vec<String>,
    pub globals: Vec<String>,
}

impl NeuronInfo {
    /// The mechanism's name, whichever way it was declared.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            Some(MechanismKind::Density { suffix }) => Some(suffix),
            Some(MechanismKind::PointProcess { name }) => Some(name),
            None => None,
        }
    }

    /// Whether the mechanism is a point process.
    pub fn is_point_process(&self) -> bool {
        matches!(self.kind, Some(MechanismKind::PointProcess { .. }))
    }
}

/// One entry of the UNITS block, stored but not interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitDef {
    pub lhs: String,
    pub rhs: String,
    pub location: Location,
}

/// Which declarative section a variable came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    State,
    Parameter,
    Assigned,
    /// A variable implied by a USEION or NONSPECIFIC_CURRENT clause.
    Ion(IonKind),
}

/// A variable declared in STATE, PARAMETER or ASSIGNED, or implied by ion
/// usage.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSymbol {
    pub name: String,
    pub location: Location,
    pub kind: VariableKind,
    pub unit: Option<String>,
    /// Default value, for PARAMETER entries with an initialiser.
    pub value: Option<f64>,
    /// `<lo, hi>` range constraint, for PARAMETER entries.
    pub range: Option<(f64, f64)>,
}

/// Which flavour of procedural block a procedure symbol came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureKind {
    Normal,
    Initial,
    Breakpoint,
    Kinetic,
    Derivative,
    Linear,
}

/// A PROCEDURE, INITIAL, BREAKPOINT, KINETIC, DERIVATIVE or LINEAR block.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureSymbol {
    pub name: String,
    pub location: Location,
    pub kind: ProcedureKind,
    pub args: Vec<String>,
    /// The block body, attached by pass 2.
    pub body: Option<Expression>,
}

/// A FUNCTION block.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSymbol {
    pub name: String,
    pub location: Location,
    pub args: Vec<String>,
    pub body: Option<Expression>,
}

/// A NET_RECEIVE block with its declared event arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct NetReceiveSymbol {
    pub name: String,
    pub location: Location,
    pub args: Vec<String>,
    pub body: Option<Expression>,
}

/// A named entity in the module's symbol table.
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    Variable(VariableSymbol),
    Procedure(ProcedureSymbol),
    Function(FunctionSymbol),
    NetReceive(NetReceiveSymbol),
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Variable(s) => &s.name,
            Symbol::Procedure(s) => &s.name,
            Symbol::Function(s) => &s.name,
            Symbol::NetReceive(s) => &s.name,
        }
    }

    pub fn location(&self) -> Location {
        match self {
            Symbol::Variable(s) => s.location,
            Symbol::Procedure(s) => s.location,
            Symbol::Function(s) => s.location,
            Symbol::NetReceive(s) => s.location,
        }
    }

    pub fn as_variable(&self) -> Option<&VariableSymbol> {
        match self {
            Symbol::Variable(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_procedure(&self) -> Option<&ProcedureSymbol> {
        match self {
            Symbol::Procedure(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionSymbol> {
        match self {
            Symbol::Function(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_net_receive(&self) -> Option<&NetReceiveSymbol> {
        match self {
            Symbol::NetReceive(s) => Some(s),
            _ => None,
        }
    }

    /// The parsed body, for procedural symbols.
    pub fn body(&self) -> Option<&Expression> {
        match self {
            Symbol::Variable(_) => None,
            Symbol::Procedure(s) => s.body.as_ref(),
            Symbol::Function(s) => s.body.as_ref(),
            Symbol::NetReceive(s) => s.body.as_ref(),
        }
    }
}

/// A fully parsed mechanism description.
#[derive(Debug, Clone, Default)]
pub struct Module {
    /// Name of the module, normally the source file stem.
    pub name: String,
    pub(crate) title: String,
    pub(crate) neuron: NeuronInfo,
    pub(crate) symbols: IndexMap<String, Symbol>,
    pub(crate) units: Vec<UnitDef>,
    pub(crate) errors: Vec<ParseError>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Whether parsing completed without diagnostics.
    pub fn status(&self) -> Status {
        if self.errors.is_empty() {
            Status::Happy
        } else {
            Status::Error
        }
    }

    /// The first diagnostic in source order, if any.
    pub fn first_error(&self) -> Option<&ParseError> {
        self.errors.first()
    }

    /// All recorded diagnostics.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// The TITLE line, or an empty string.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Metadata extracted from the NEURON block.
    pub fn neuron_info(&self) -> &NeuronInfo {
        &self.neuron
    }

    /// All symbols, keyed by name, in declaration order.
    pub fn symbols(&self) -> &IndexMap<String, Symbol> {
        &self.symbols
    }

    /// Look up one symbol by name.
    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// The UNITS table, uninterpreted.
    pub fn units(&self) -> &[UnitDef] {
        &self.units
    }

    /// STATE variables, in declaration order.
    pub fn state_vars(&self) -> impl Iterator<Item = &VariableSymbol> {
        self.variables_of_kind(VariableKind::State)
    }

    /// PARAMETER variables, in declaration order.
    pub fn parameters(&self) -> impl Iterator<Item = &VariableSymbol> {
        self.variables_of_kind(VariableKind::Parameter)
    }

    /// ASSIGNED variables, in declaration order.
    pub fn assigned(&self) -> impl Iterator<Item = &VariableSymbol> {
        self.variables_of_kind(VariableKind::Assigned)
    }

    /// PROCEDURE, INITIAL, BREAKPOINT, KINETIC, DERIVATIVE and LINEAR
    /// blocks, in declaration order.
    pub fn procedures(&self) -> impl Iterator<Item = &ProcedureSymbol> {
        self.symbols.values().filter_map(Symbol::as_procedure)
    }

    fn variables_of_kind(&self, kind: VariableKind) -> impl Iterator<Item = &VariableSymbol> {
        self.symbols
            .values()
            .filter_map(Symbol::as_variable)
            .filter(move |v| v.kind == kind)
    }

    pub(crate) fn record_error(&mut self, error: ParseError) {
        self.errors.push(error);
    }
}
