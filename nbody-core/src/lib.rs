pub mod analyzer;
pub mod ast;
pub mod diagnostics;
pub mod engine;
pub mod eval;
pub mod integrator;
pub mod observables;
pub mod parser;
pub mod presets;
pub mod runtime;

pub use analyzer::analyze_scenario;
pub use diagnostics::{Diagnostic, DiagnosticSeverity, Diagnostics, SourceLocation, Span};
pub use engine::{Body, ConfigError, Params};
pub use integrator::{DivergenceError, Integrator};
pub use parser::{parse_scenario, ParseError};
pub use runtime::{
    build_simulation_context, build_simulation_context_from_source, evaluate_detectors,
    get_body_states, reset_simulation, run_program, run_program_with_options,
    run_program_with_steps, step_simulation, BodyState, DetectorResult, SimulationContext,
    SimulationResult,
};
