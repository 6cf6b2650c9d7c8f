//! Expression evaluation for scenario files
//!
//! Expressions are folded to concrete f64 values before the integrator is
//! built; nothing is evaluated during stepping.

use crate::ast::{BinaryOp, Expr, FuncName, LetDecl, VecExpr};
use crate::diagnostics::Diagnostic;
use glam::DVec3;
use std::collections::HashMap;
use thiserror::Error;

/// Evaluation context storing variable values
pub struct EvalContext {
    /// Values of let-bindings after evaluation, plus predefined constants
    pub values: HashMap<String, f64>,
}

impl EvalContext {
    pub fn new() -> Self {
        let mut values = HashMap::new();
        values.insert("pi".to_string(), std::f64::consts::PI);
        Self { values }
    }

    pub fn lookup(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluation error
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvalError {
    #[error("unknown variable '{0}'")]
    UnknownVar(String),
    #[error("division by zero")]
    DivByZero,
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("expression evaluates to {0}")]
    NonFinite(f64),
}

/// Evaluate all let-bindings in order
/// Returns the evaluation context and any diagnostics
pub fn evaluate_lets(lets: &[LetDecl]) -> (EvalContext, Vec<Diagnostic>) {
    let mut ctx = EvalContext::new();
    let mut diagnostics = Vec::new();

    for let_decl in lets {
        match eval_finite(&let_decl.expr, &ctx) {
            Ok(value) => {
                ctx.values.insert(let_decl.name.clone(), value);
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("error evaluating let binding '{}': {}", let_decl.name, e),
                    let_decl.span,
                ));
            }
        }
    }

    (ctx, diagnostics)
}

/// Evaluate an expression and reject NaN or infinite results
pub fn eval_finite(expr: &Expr, ctx: &EvalContext) -> Result<f64, EvalError> {
    let value = eval_expr(expr, ctx)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalError::NonFinite(value))
    }
}

pub fn eval_vec3(v: &VecExpr, ctx: &EvalContext) -> Result<DVec3, EvalError> {
    Ok(DVec3::new(
        eval_finite(&v.0, ctx)?,
        eval_finite(&v.1, ctx)?,
        eval_finite(&v.2, ctx)?,
    ))
}

/// Evaluate an expression to an f64 value
pub fn eval_expr(expr: &Expr, ctx: &EvalContext) -> Result<f64, EvalError> {
    match expr {
        Expr::Literal(v) => Ok(*v),
        Expr::Var(name) => ctx
            .lookup(name)
            .ok_or_else(|| EvalError::UnknownVar(name.clone())),
        Expr::UnaryMinus(inner) => Ok(-eval_expr(inner, ctx)?),
        Expr::Binary { op, left, right } => {
            let l = eval_expr(left, ctx)?;
            let r = eval_expr(right, ctx)?;
            match op {
                BinaryOp::Add => Ok(l + r),
                BinaryOp::Sub => Ok(l - r),
                BinaryOp::Mul => Ok(l * r),
                BinaryOp::Div => {
                    if r == 0.0 {
                        Err(EvalError::DivByZero)
                    } else {
                        Ok(l / r)
                    }
                }
            }
        }
        Expr::Call { func, args } => {
            if args.len() != func.arity() {
                return Err(EvalError::InvalidArgs(format!(
                    "{}() takes {} argument(s), got {}",
                    func.name(),
                    func.arity(),
                    args.len()
                )));
            }
            let values = args
                .iter()
                .map(|a| eval_expr(a, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            match func {
                FuncName::Sin => Ok(values[0].sin()),
                FuncName::Cos => Ok(values[0].cos()),
                FuncName::Sqrt => {
                    if values[0] < 0.0 {
                        Err(EvalError::InvalidArgs(format!(
                            "sqrt() of negative value {}",
                            values[0]
                        )))
                    } else {
                        Ok(values[0].sqrt())
                    }
                }
                FuncName::Clamp => {
                    let (x, lo, hi) = (values[0], values[1], values[2]);
                    if lo > hi {
                        return Err(EvalError::InvalidArgs(format!(
                            "clamp() lower bound {} exceeds upper bound {}",
                            lo, hi
                        )));
                    }
                    Ok(x.clamp(lo, hi))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    fn eval(src: &str) -> Result<f64, EvalError> {
        eval_expr(&parse_expr(src, None).unwrap(), &EvalContext::new())
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(eval("1 + 2 * 3").unwrap(), 7.0);
        assert_eq!(eval("10 - 4 - 3").unwrap(), 3.0);
        assert_eq!(eval("8 / 4 / 2").unwrap(), 1.0);
        assert_eq!(eval("-(1 + 2) * 2").unwrap(), -6.0);
    }

    #[test]
    fn builtins() {
        assert_eq!(eval("sqrt(16)").unwrap(), 4.0);
        assert_eq!(eval("clamp(5, 0, 2)").unwrap(), 2.0);
        assert_eq!(eval("cos(0)").unwrap(), 1.0);
        assert!((eval("2 * pi").unwrap() - std::f64::consts::TAU).abs() < 1e-15);
    }

    #[test]
    fn errors() {
        assert_eq!(eval("1 / 0"), Err(EvalError::DivByZero));
        assert_eq!(eval("nope"), Err(EvalError::UnknownVar("nope".into())));
        assert!(matches!(eval("sqrt(-1)"), Err(EvalError::InvalidArgs(_))));
        assert!(matches!(eval("sqrt(1, 2)"), Err(EvalError::InvalidArgs(_))));
    }

    #[test]
    fn lets_can_refer_to_earlier_lets() {
        let lets = vec![
            LetDecl {
                name: "g".into(),
                expr: parse_expr("39.5", None).unwrap(),
                span: None,
            },
            LetDecl {
                name: "v".into(),
                expr: parse_expr("sqrt(g / 1)", None).unwrap(),
                span: None,
            },
        ];
        let (ctx, diagnostics) = evaluate_lets(&lets);
        assert!(diagnostics.is_empty());
        assert_eq!(ctx.lookup("v"), Some(39.5_f64.sqrt()));
    }
}
