use crate::diagnostics::Span;

// ============================================================================
// Expressions
// ============================================================================

/// Expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(f64),
    Var(String),
    UnaryMinus(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        func: FuncName,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// The value of a plain (possibly negated) literal, if that is all this is
    pub fn as_literal(&self) -> Option<f64> {
        match self {
            Expr::Literal(v) => Some(*v),
            Expr::UnaryMinus(inner) => inner.as_literal().map(|v| -v),
            _ => None,
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Built-in function names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncName {
    Sin,
    Cos,
    Sqrt,
    Clamp,
}

impl FuncName {
    pub fn arity(self) -> usize {
        match self {
            FuncName::Clamp => 3,
            _ => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FuncName::Sin => "sin",
            FuncName::Cos => "cos",
            FuncName::Sqrt => "sqrt",
            FuncName::Clamp => "clamp",
        }
    }
}

/// Three expressions making up a vector literal `(x, y, z)`
pub type VecExpr = (Expr, Expr, Expr);

// ============================================================================
// Declarations
// ============================================================================

/// A parsed scenario file
#[derive(Debug, Clone)]
pub struct Scenario {
    pub lets: Vec<LetDecl>,
    pub system: SystemDecl,
    pub bodies: Vec<BodyDecl>,
    pub simulate: Option<SimulateDecl>,
    pub detectors: Vec<DetectorDecl>,
}

/// `let name = expr`
#[derive(Debug, Clone)]
pub struct LetDecl {
    pub name: String,
    pub expr: Expr,
    pub span: Option<Span>,
}

/// `system G = expr dt = expr softening = expr`
#[derive(Debug, Clone)]
pub struct SystemDecl {
    pub g: Expr,
    pub dt: Expr,
    pub softening: Expr,
    pub span: Option<Span>,
}

/// `body name at (x, y, z) velocity (vx, vy, vz) mass m`
#[derive(Debug, Clone)]
pub struct BodyDecl {
    pub name: String,
    pub position: VecExpr,
    pub velocity: Option<VecExpr>,
    pub mass: Expr,
    pub span: Option<Span>,
}

/// `simulate steps = n`
#[derive(Debug, Clone)]
pub struct SimulateDecl {
    pub steps: Expr,
    pub span: Option<Span>,
}

/// `detect name = kind(...)`
#[derive(Debug, Clone)]
pub struct DetectorDecl {
    pub name: String,
    pub kind: DetectorKind,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Detector kinds
#[derive(Debug, Clone, PartialEq)]
pub enum DetectorKind {
    Position { body: String, axis: Axis },
    Distance { a: String, b: String },
    Speed(String),
    Energy,
    Momentum,
}

impl DetectorKind {
    /// Body names this detector reads
    pub fn referenced_bodies(&self) -> Vec<&str> {
        match self {
            DetectorKind::Position { body, .. } | DetectorKind::Speed(body) => vec![body.as_str()],
            DetectorKind::Distance { a, b } => vec![a.as_str(), b.as_str()],
            DetectorKind::Energy | DetectorKind::Momentum => Vec::new(),
        }
    }
}
