//! Static checks for parsed scenarios
//!
//! This module catches mistakes before anything is evaluated or integrated:
//! name clashes, dangling references and literal values that can never form
//! a valid system.

use crate::ast::{Expr, Scenario};
use crate::diagnostics::{Diagnostic, Diagnostics, Span};
use std::collections::{HashMap, HashSet};

/// Analyze a scenario and return diagnostics
pub fn analyze_scenario(scenario: &Scenario) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();

    // Let bindings: duplicates, and every variable defined before use
    let mut known_vars: HashSet<&str> = HashSet::from(["pi"]);
    let mut let_names = HashMap::new();
    for let_decl in &scenario.lets {
        if let_names.insert(let_decl.name.as_str(), let_decl.span).is_some() {
            diagnostics.push(Diagnostic::error(
                format!("duplicate let binding '{}'", let_decl.name),
                let_decl.span,
            ));
        }
        check_expr(&let_decl.expr, &known_vars, let_decl.span, &mut diagnostics);
        known_vars.insert(let_decl.name.as_str());
    }

    // System parameters
    let system = &scenario.system;
    for expr in [&system.g, &system.dt, &system.softening] {
        check_expr(expr, &known_vars, system.span, &mut diagnostics);
    }
    if let Some(softening) = system.softening.as_literal() {
        if softening < 0.0 {
            diagnostics.push(Diagnostic::error(
                format!("softening must be >= 0, got {}", softening),
                system.span,
            ));
        }
    }
    if system.dt.as_literal() == Some(0.0) {
        diagnostics.push(Diagnostic::warning(
            "dt = 0 means the system never moves",
            system.span,
        ));
    }

    // Bodies: unique names, valid expressions, positive literal masses
    let mut body_names: HashMap<&str, Option<Span>> = HashMap::new();
    for body in &scenario.bodies {
        if body_names.insert(body.name.as_str(), body.span).is_some() {
            diagnostics.push(Diagnostic::error(
                format!("duplicate body name '{}'", body.name),
                body.span,
            ));
        }

        let (x, y, z) = &body.position;
        for expr in [x, y, z, &body.mass] {
            check_expr(expr, &known_vars, body.span, &mut diagnostics);
        }
        if let Some((vx, vy, vz)) = &body.velocity {
            for expr in [vx, vy, vz] {
                check_expr(expr, &known_vars, body.span, &mut diagnostics);
            }
        }

        if let Some(mass) = body.mass.as_literal() {
            if mass <= 0.0 {
                diagnostics.push(Diagnostic::error(
                    format!("body '{}' must have positive mass, got {}", body.name, mass),
                    body.span,
                ));
            }
        }
    }

    if scenario.bodies.is_empty() {
        diagnostics.push(Diagnostic::warning("scenario declares no bodies", None));
    }

    if let Some(simulate) = &scenario.simulate {
        check_expr(&simulate.steps, &known_vars, simulate.span, &mut diagnostics);
        if let Some(steps) = simulate.steps.as_literal() {
            if steps < 0.0 || steps.fract() != 0.0 || steps >= usize::MAX as f64 {
                diagnostics.push(Diagnostic::error(
                    format!("steps must be a non-negative integer, got {}", steps),
                    simulate.span,
                ));
            }
        }
    }

    // Detectors: unique names, existing bodies
    let mut detector_names = HashSet::new();
    for detector in &scenario.detectors {
        if !detector_names.insert(detector.name.as_str()) {
            diagnostics.push(Diagnostic::error(
                format!("duplicate detector name '{}'", detector.name),
                detector.span,
            ));
        }
        for name in detector.kind.referenced_bodies() {
            if !body_names.contains_key(name) {
                diagnostics.push(Diagnostic::error(
                    format!("unknown body '{}' in detector '{}'", name, detector.name),
                    detector.span,
                ));
            }
        }
    }

    diagnostics
}

/// Report every variable in `expr` that is not yet defined
fn check_expr(
    expr: &Expr,
    known_vars: &HashSet<&str>,
    span: Option<Span>,
    diagnostics: &mut Diagnostics,
) {
    match expr {
        Expr::Literal(_) => {}
        Expr::Var(name) => {
            if !known_vars.contains(name.as_str()) {
                diagnostics.push(Diagnostic::error(
                    format!("unknown variable '{}'", name),
                    span,
                ));
            }
        }
        Expr::UnaryMinus(inner) => check_expr(inner, known_vars, span, diagnostics),
        Expr::Binary { left, right, .. } => {
            check_expr(left, known_vars, span, diagnostics);
            check_expr(right, known_vars, span, diagnostics);
        }
        Expr::Call { func, args } => {
            if args.len() != func.arity() {
                diagnostics.push(Diagnostic::error(
                    format!(
                        "{}() expects {} argument(s), got {}",
                        func.name(),
                        func.arity(),
                        args.len()
                    ),
                    span,
                ));
            }
            for arg in args {
                check_expr(arg, known_vars, span, diagnostics);
            }
        }
    }
}
