//! Building, stepping and resetting simulation contexts

use nbody_core::tests::test_helpers::{approx_eq, detector, run_scenario_source};
use nbody_core::{
    build_simulation_context_from_source, get_body_states, reset_simulation,
    run_program_with_options, run_program_with_steps, step_simulation,
};

const PAIR: &str = r#"
system G = 39.5 dt = 0.008 softening = 0
body sun at (0, 0, 0) mass 1
body probe at (1, 0, 0) mass 1e-6
simulate steps = 1
detect px = position(probe)
detect vx = speed(probe)
"#;

#[test]
fn test_headless_run_reports_detectors() {
    let result = run_scenario_source(PAIR).expect("run");
    assert_eq!(result.steps, 1);
    assert_eq!(detector(&result, "px"), Some(1.0));
    assert!(approx_eq(detector(&result, "vx").unwrap(), 39.5 * 0.008, 1e-12));
}

#[test]
fn test_step_count_override() {
    let result = run_program_with_steps(PAIR, 25).expect("run");
    assert_eq!(result.steps, 25);
    assert!(detector(&result, "px").unwrap() < 1.0);
}

#[test]
fn test_zero_steps_leaves_state_untouched() {
    let result = run_program_with_steps(PAIR, 0).expect("run");
    assert_eq!(result.steps, 0);
    assert_eq!(detector(&result, "px"), Some(1.0));
    assert_eq!(detector(&result, "vx"), Some(0.0));
}

#[test]
fn test_missing_step_count_is_an_error() {
    let source = "system G = 1 dt = 0.01 softening = 0\nbody a at (0, 0, 0) mass 1\n";
    let err = run_scenario_source(source).unwrap_err();
    assert!(err.to_string().contains("Missing step count"));
}

#[test]
fn test_step_simulation_reports_completion() {
    let (mut ctx, _) = build_simulation_context_from_source(PAIR).unwrap();
    ctx.max_steps = Some(3);

    assert_eq!(step_simulation(&mut ctx), Ok(false));
    assert_eq!(step_simulation(&mut ctx), Ok(false));
    assert_eq!(step_simulation(&mut ctx), Ok(true));
    // Further calls do not advance a finished context
    assert_eq!(step_simulation(&mut ctx), Ok(true));
    assert_eq!(ctx.current_step, 3);
}

#[test]
fn test_unbounded_context_keeps_running() {
    let (mut ctx, _) = build_simulation_context_from_source(PAIR).unwrap();
    ctx.max_steps = None;
    for _ in 0..100 {
        assert_eq!(step_simulation(&mut ctx), Ok(false));
    }
    assert_eq!(ctx.current_step, 100);
}

#[test]
fn test_reset_restores_initial_bodies() {
    let (mut ctx, _) = build_simulation_context_from_source(PAIR).unwrap();
    ctx.max_steps = None;
    let initial = ctx.integrator.bodies().to_vec();

    for _ in 0..40 {
        step_simulation(&mut ctx).unwrap();
    }
    assert_ne!(ctx.integrator.bodies(), initial.as_slice());

    reset_simulation(&mut ctx);
    assert_eq!(ctx.current_step, 0);
    assert_eq!(ctx.integrator.bodies(), initial.as_slice());
}

#[test]
fn test_body_states_keep_order_and_labels() {
    let (ctx, _) = build_simulation_context_from_source(PAIR).unwrap();
    let states = get_body_states(&ctx);

    assert_eq!(states.len(), 2);
    assert_eq!(states[0].index, 0);
    assert_eq!(states[0].label.as_deref(), Some("sun"));
    assert_eq!(states[1].label.as_deref(), Some("probe"));
    assert_eq!(states[1].pos.x, 1.0);
    assert_eq!(states[1].mass, 1e-6);
}

#[test]
fn test_divergence_check_is_opt_in() {
    // Two coincident bodies without softening blow up on the first step
    let source = r#"
system G = 1 dt = 0.01 softening = 0
body a at (0, 0, 0) mass 1
body b at (0, 0, 0) mass 1
simulate steps = 5
detect ax = position(a)
"#;

    let silent = run_program_with_options(source, None, false).expect("silent run");
    assert!(detector(&silent, "ax").unwrap().is_nan());

    let err = run_program_with_options(source, None, true).unwrap_err();
    assert!(err.to_string().contains("diverged"));
}

#[test]
fn test_lets_feed_initial_conditions() {
    let source = r#"
let r = 2
let m = 0.25
system G = 1 dt = 0.01 softening = 0
body a at (-r / 2, 0, 0) mass m
body b at (r / 2, 0, 0) mass m * 2
simulate steps = 0
detect gap = distance(a, b)
"#;
    let result = run_scenario_source(source).unwrap();
    assert_eq!(detector(&result, "gap"), Some(2.0));
}

#[test]
fn test_huge_step_count_is_rejected() {
    let literal = "system G = 1 dt = 0.01 softening = 0\nbody a at (0, 0, 0) mass 1\n\
                   simulate steps = 1e300\n";
    let err = run_scenario_source(literal).unwrap_err();
    assert!(err.to_string().contains("steps must be a non-negative integer"));

    let computed = "let n = 1e300\nsystem G = 1 dt = 0.01 softening = 0\n\
                    body a at (0, 0, 0) mass 1\nsimulate steps = n\n";
    let err = run_scenario_source(computed).unwrap_err();
    assert!(err.to_string().contains("steps must be a non-negative integer"));
}
