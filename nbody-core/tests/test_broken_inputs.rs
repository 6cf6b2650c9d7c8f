//! Tests for broken/invalid scenario files

use nbody_core::{analyze_scenario, parse_scenario, run_program};
use std::path::PathBuf;

fn broken_data_path(filename: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("data");
    path.push("broken");
    path.push(filename);
    path
}

fn read(filename: &str) -> String {
    std::fs::read_to_string(broken_data_path(filename)).expect("Failed to read file")
}

#[test]
fn test_missing_system_produces_parse_error() {
    let source = read("missing_system.nbody");
    assert!(parse_scenario(&source).is_err());
    assert!(run_program(&source).is_err());
}

#[test]
fn test_syntax_error_produces_parse_error() {
    let source = read("syntax_error.nbody");

    match parse_scenario(&source) {
        Err(e) => {
            assert!(!e.to_string().is_empty(), "Error message should not be empty");
            assert!(e.span().is_some());
        }
        Ok(_) => panic!("Should have failed"),
    }
}

#[test]
fn test_unknown_body_is_caught_by_analyzer() {
    let source = read("unknown_body.nbody");
    let scenario = parse_scenario(&source).expect("Should parse");
    assert!(analyze_scenario(&scenario).has_errors());

    let err = run_program(&source).unwrap_err();
    assert!(err.to_string().contains("ghost"));
}

#[test]
fn test_duplicate_body_is_caught_by_analyzer() {
    let source = read("duplicate_body.nbody");
    let scenario = parse_scenario(&source).expect("Should parse");
    assert!(analyze_scenario(&scenario).has_errors());
    assert!(run_program(&source).is_err());
}

#[test]
fn test_negative_mass_fails_before_running() {
    let source = read("negative_mass.nbody");
    let err = run_program(&source).unwrap_err();
    assert!(err.to_string().contains("positive mass"));
}

#[test]
fn test_computed_zero_mass_fails_at_construction() {
    // Not a literal, so only construction can catch it
    let source = read("computed_zero_mass.nbody");
    let scenario = parse_scenario(&source).expect("Should parse");
    assert!(!analyze_scenario(&scenario).has_errors());

    let err = run_program(&source).unwrap_err();
    assert!(err.to_string().contains("non-positive mass"));
}

#[test]
fn test_negative_softening_fails() {
    let source = read("negative_softening.nbody");
    assert!(run_program(&source).is_err());
}

#[test]
fn test_broken_inputs_do_not_panic() {
    let broken_files = [
        "missing_system.nbody",
        "syntax_error.nbody",
        "unknown_body.nbody",
        "duplicate_body.nbody",
        "negative_mass.nbody",
        "computed_zero_mass.nbody",
        "negative_softening.nbody",
    ];

    for filename in &broken_files {
        let source = read(filename);
        let _ = parse_scenario(&source);
        assert!(run_program(&source).is_err(), "{} should fail", filename);
    }
}
