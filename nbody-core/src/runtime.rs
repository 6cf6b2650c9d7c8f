use crate::analyzer::analyze_scenario;
use crate::ast::{Axis, DetectorDecl, DetectorKind, Scenario};
use crate::diagnostics::Diagnostics;
use crate::engine::{Body, Params};
use crate::eval::{eval_finite, eval_vec3, evaluate_lets, EvalContext};
use crate::integrator::{DivergenceError, Integrator};
use crate::observables;
use crate::parser::parse_scenario;
use glam::DVec3;
use log::{debug, trace, warn};
use std::collections::HashMap;

/// Result of a detector evaluation
#[derive(Debug, Clone)]
pub struct DetectorResult {
    pub name: String,
    pub value: f64,
}

/// Final result of a headless run
#[derive(Debug)]
pub struct SimulationResult {
    pub steps: usize,
    pub detectors: Vec<DetectorResult>,
}

/// Snapshot of one body for renderers
#[derive(Debug, Clone)]
pub struct BodyState {
    pub index: usize,
    pub label: Option<String>,
    pub pos: DVec3,
    pub mass: f64,
}

/// A built simulation plus the bookkeeping a driver needs to step it
#[derive(Debug, Clone)]
pub struct SimulationContext {
    pub integrator: Integrator,
    pub detectors: Vec<DetectorDecl>,
    pub current_step: usize,
    pub max_steps: Option<usize>,
    /// Run [`Integrator::check_finite`] after every step
    pub check_divergence: bool,
}

/// Parse, analyze and evaluate a scenario, returning a context ready to step
pub fn build_simulation_context_from_source(
    source: &str,
) -> Result<(SimulationContext, Diagnostics), Box<dyn std::error::Error>> {
    let scenario = parse_scenario(source)?;
    let diagnostics = analyze_scenario(&scenario);

    if let Some(first) = diagnostics.errors().next() {
        return Err(first.message.clone().into());
    }

    let ctx = build_simulation_context(&scenario)?;
    Ok((ctx, diagnostics))
}

/// Build a context from an already parsed scenario
pub fn build_simulation_context(
    scenario: &Scenario,
) -> Result<SimulationContext, Box<dyn std::error::Error>> {
    let (env, let_diagnostics) = evaluate_lets(&scenario.lets);
    if let Some(first) = let_diagnostics.first() {
        return Err(first.message.clone().into());
    }

    let params = build_params(scenario, &env)?;
    let bodies = build_bodies(scenario, &env)?;

    let max_steps = match &scenario.simulate {
        Some(simulate) => Some(eval_steps(eval_finite(&simulate.steps, &env)?)?),
        None => None,
    };

    let integrator = Integrator::new(params, &bodies)?;
    debug!(
        "built simulation with {} bodies, G = {}, dt = {}, softening = {}",
        bodies.len(),
        params.gravitational_constant,
        params.timestep,
        params.softening_constant
    );

    Ok(SimulationContext {
        integrator,
        detectors: scenario.detectors.clone(),
        current_step: 0,
        max_steps,
        check_divergence: false,
    })
}

fn build_params(
    scenario: &Scenario,
    env: &EvalContext,
) -> Result<Params, Box<dyn std::error::Error>> {
    let system = &scenario.system;
    let g = eval_finite(&system.g, env).map_err(|e| format!("system G: {}", e))?;
    let dt = eval_finite(&system.dt, env).map_err(|e| format!("system dt: {}", e))?;
    let softening =
        eval_finite(&system.softening, env).map_err(|e| format!("system softening: {}", e))?;
    Ok(Params::new(g, dt, softening)?)
}

fn build_bodies(
    scenario: &Scenario,
    env: &EvalContext,
) -> Result<Vec<Body>, Box<dyn std::error::Error>> {
    let mut bodies = Vec::with_capacity(scenario.bodies.len());

    for decl in &scenario.bodies {
        let context = |e: crate::eval::EvalError| format!("body '{}': {}", decl.name, e);
        let pos = eval_vec3(&decl.position, env).map_err(context)?;
        let vel = match &decl.velocity {
            Some(v) => eval_vec3(v, env).map_err(context)?,
            None => DVec3::ZERO,
        };
        let mass = eval_finite(&decl.mass, env).map_err(context)?;

        bodies.push(Body::new(mass, pos, vel).with_label(decl.name.clone()));
    }

    Ok(bodies)
}

fn eval_steps(value: f64) -> Result<usize, Box<dyn std::error::Error>> {
    if value < 0.0 || value.fract() != 0.0 || value >= usize::MAX as f64 {
        return Err(format!("steps must be a non-negative integer, got {}", value).into());
    }
    Ok(value as usize)
}

/// Advance one timestep.
///
/// Returns `Ok(true)` once the context has reached `max_steps`. With
/// `check_divergence` set, a non-finite state is reported as an error.
pub fn step_simulation(ctx: &mut SimulationContext) -> Result<bool, DivergenceError> {
    if let Some(max) = ctx.max_steps {
        if ctx.current_step >= max {
            return Ok(true);
        }
    }

    ctx.integrator.step();
    ctx.current_step += 1;
    trace!("step {}", ctx.current_step);

    if ctx.check_divergence {
        if let Err(e) = ctx.integrator.check_finite() {
            warn!("step {}: {}", ctx.current_step, e);
            return Err(e);
        }
    }

    Ok(ctx.max_steps.is_some_and(|max| ctx.current_step >= max))
}

/// Restore the initial bodies and rewind the step counter
pub fn reset_simulation(ctx: &mut SimulationContext) {
    ctx.integrator.reset();
    ctx.current_step = 0;
    debug!("simulation reset");
}

/// Get the current body states for rendering
pub fn get_body_states(ctx: &SimulationContext) -> Vec<BodyState> {
    ctx.integrator
        .bodies()
        .iter()
        .enumerate()
        .map(|(index, b)| BodyState {
            index,
            label: b.label.clone(),
            pos: b.pos,
            mass: b.mass,
        })
        .collect()
}

/// Parse and run a scenario for the step count it declares
pub fn run_program(source: &str) -> Result<SimulationResult, Box<dyn std::error::Error>> {
    run_program_with_options(source, None, false)
}

/// Parse and run a scenario for an explicit number of steps
pub fn run_program_with_steps(
    source: &str,
    steps: usize,
) -> Result<SimulationResult, Box<dyn std::error::Error>> {
    run_program_with_options(source, Some(steps), false)
}

/// Headless run. `steps` overrides the scenario's `simulate` declaration.
pub fn run_program_with_options(
    source: &str,
    steps: Option<usize>,
    check_divergence: bool,
) -> Result<SimulationResult, Box<dyn std::error::Error>> {
    let (mut ctx, _diagnostics) = build_simulation_context_from_source(source)?;
    if steps.is_some() {
        ctx.max_steps = steps;
    }
    if ctx.max_steps.is_none() {
        return Err("Missing step count: add 'simulate steps = N' or pass a step count".into());
    }
    ctx.check_divergence = check_divergence;

    while !step_simulation(&mut ctx)? {}

    let detectors = evaluate_detectors(&ctx)?;
    Ok(SimulationResult {
        steps: ctx.current_step,
        detectors,
    })
}

/// Evaluate all detectors on the current state
pub fn evaluate_detectors(
    ctx: &SimulationContext,
) -> Result<Vec<DetectorResult>, Box<dyn std::error::Error>> {
    let bodies = ctx.integrator.bodies();
    let by_name: HashMap<&str, &Body> = bodies
        .iter()
        .filter_map(|b| b.label.as_deref().map(|l| (l, b)))
        .collect();

    let mut results = Vec::with_capacity(ctx.detectors.len());
    for detector in &ctx.detectors {
        let value = match &detector.kind {
            DetectorKind::Position { body, axis } => {
                let pos = find_body(&by_name, body)?.pos;
                match axis {
                    Axis::X => pos.x,
                    Axis::Y => pos.y,
                    Axis::Z => pos.z,
                }
            }
            DetectorKind::Distance { a, b } => {
                find_body(&by_name, a)?.pos.distance(find_body(&by_name, b)?.pos)
            }
            DetectorKind::Speed(body) => find_body(&by_name, body)?.speed(),
            DetectorKind::Energy => observables::total_energy(bodies, ctx.integrator.params()),
            DetectorKind::Momentum => observables::total_momentum(bodies).length(),
        };

        results.push(DetectorResult {
            name: detector.name.clone(),
            value,
        });
    }

    Ok(results)
}

fn find_body<'a>(
    by_name: &HashMap<&str, &'a Body>,
    name: &str,
) -> Result<&'a Body, Box<dyn std::error::Error>> {
    by_name
        .get(name)
        .copied()
        .ok_or_else(|| format!("Body '{}' not found for detector", name).into())
}
