//! Static checks on parsed scenarios

use nbody_core::{analyze_scenario, parse_scenario};

fn errors(source: &str) -> Vec<String> {
    let scenario = parse_scenario(source).expect("should parse");
    analyze_scenario(&scenario)
        .errors()
        .map(|d| d.message.clone())
        .collect()
}

#[test]
fn test_valid_scenario_has_no_errors() {
    let source = r#"
let m = 0.5
system G = 39.5 dt = 0.01 softening = 0.15
body a at (0, 0, 0) mass m
body b at (1, 0, 0) velocity (0, 1, 0) mass 2 * m
detect gap = distance(a, b)
"#;
    assert!(errors(source).is_empty());
}

#[test]
fn test_duplicate_body_name() {
    let source = r#"
system G = 1 dt = 0.01 softening = 0
body a at (0, 0, 0) mass 1
body a at (5, 0, 0) mass 2
"#;
    let errs = errors(source);
    assert!(errs.iter().any(|e| e.contains("duplicate body name 'a'")));
}

#[test]
fn test_unknown_body_in_detector() {
    let source = r#"
system G = 1 dt = 0.01 softening = 0
body a at (0, 0, 0) mass 1
detect d = distance(a, ghost)
"#;
    let errs = errors(source);
    assert_eq!(errs.len(), 1);
    assert!(errs[0].contains("unknown body 'ghost'"));
}

#[test]
fn test_non_positive_literal_mass() {
    let source = r#"
system G = 1 dt = 0.01 softening = 0
body a at (0, 0, 0) mass 0
body b at (1, 0, 0) mass -3
"#;
    let errs = errors(source);
    assert_eq!(errs.len(), 2);
    assert!(errs.iter().all(|e| e.contains("positive mass")));
}

#[test]
fn test_negative_softening() {
    let source = "system G = 1 dt = 0.01 softening = -1\n";
    let errs = errors(source);
    assert!(errs.iter().any(|e| e.contains("softening must be >= 0")));
}

#[test]
fn test_variable_used_before_definition() {
    let source = r#"
let a = b + 1
let b = 2
system G = 1 dt = 0.01 softening = 0
"#;
    let errs = errors(source);
    assert!(errs.iter().any(|e| e.contains("unknown variable 'b'")));
}

#[test]
fn test_duplicate_let_and_detector() {
    let source = r#"
let a = 1
let a = 2
system G = 1 dt = 0.01 softening = 0
body x at (0, 0, 0) mass a
detect e = energy()
detect e = momentum()
"#;
    let errs = errors(source);
    assert!(errs.iter().any(|e| e.contains("duplicate let binding 'a'")));
    assert!(errs.iter().any(|e| e.contains("duplicate detector name 'e'")));
}

#[test]
fn test_empty_scenario_only_warns() {
    let scenario = parse_scenario("system G = 1 dt = 0.01 softening = 0\n").unwrap();
    let diagnostics = analyze_scenario(&scenario);
    assert!(!diagnostics.has_errors());
    assert_eq!(diagnostics.warnings().count(), 1);
}

#[test]
fn test_wrong_builtin_arity() {
    let source = r#"
let a = clamp(1, 2)
system G = 1 dt = 0.01 softening = 0
"#;
    let errs = errors(source);
    assert!(errs.iter().any(|e| e.contains("clamp() expects 3 argument(s), got 2")));
}
