mod trails;
mod viewer;
mod viewport;

use clap::{Args, Parser, Subcommand};
use log::info;
use nbody_core::diagnostics::{format_diagnostic, format_parse_error};
use nbody_core::{analyze_scenario, parse_scenario, presets, run_program_with_options};
use std::fs;
use std::path::PathBuf;
use viewer::{ScenarioSource, ViewerApp};

const DEFAULT_PRESET: &str = "inner-solar-system";

#[derive(Parser)]
#[command(name = "nbody")]
#[command(about = "Softened-gravity N-body simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ScenarioArgs {
    /// Path to a scenario file
    file: Option<PathBuf>,

    /// Use a built-in scenario instead of a file
    #[arg(long, conflicts_with = "file")]
    preset: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario headlessly and print its detectors
    Run {
        #[command(flatten)]
        scenario: ScenarioArgs,

        /// Override the scenario's step count
        #[arg(long)]
        steps: Option<usize>,

        /// Stop with an error as soon as the state stops being finite
        #[arg(long)]
        check_finite: bool,
    },
    /// Report parse errors and diagnostics without running
    Check {
        #[command(flatten)]
        scenario: ScenarioArgs,
    },
    /// Open the interactive viewer
    View {
        #[command(flatten)]
        scenario: ScenarioArgs,

        /// Trail length in frames
        #[arg(long, default_value_t = 35)]
        trail_length: usize,

        /// Pixels per length unit
        #[arg(long, default_value_t = 70.0)]
        scale: f32,
    },
    /// List the built-in scenarios
    Presets,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            scenario,
            steps,
            check_finite,
        } => run(&scenario, steps, check_finite),
        Commands::Check { scenario } => check(&scenario),
        Commands::View {
            scenario,
            trail_length,
            scale,
        } => view(&scenario, trail_length, scale),
        Commands::Presets => {
            for name in presets::NAMES {
                println!("{}", name);
            }
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn resolve(args: &ScenarioArgs) -> Result<ScenarioSource, Box<dyn std::error::Error>> {
    if let Some(file) = &args.file {
        return Ok(ScenarioSource::File(file.clone()));
    }

    let name = args.preset.as_deref().unwrap_or(DEFAULT_PRESET);
    let text = presets::by_name(name).ok_or_else(|| {
        format!(
            "unknown preset '{}' (available: {})",
            name,
            presets::NAMES.join(", ")
        )
    })?;
    Ok(ScenarioSource::Preset {
        name: name.to_string(),
        text,
    })
}

fn read_source(source: &ScenarioSource) -> Result<String, Box<dyn std::error::Error>> {
    match source {
        ScenarioSource::File(path) => Ok(fs::read_to_string(path)?),
        ScenarioSource::Preset { text, .. } => Ok(text.to_string()),
    }
}

fn run(
    args: &ScenarioArgs,
    steps: Option<usize>,
    check_finite: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = read_source(&resolve(args)?)?;
    let result = run_program_with_options(&source, steps, check_finite)?;
    info!("ran {} steps", result.steps);

    for detector in result.detectors {
        println!("{} = {}", detector.name, detector.value);
    }

    Ok(())
}

fn check(args: &ScenarioArgs) -> Result<(), Box<dyn std::error::Error>> {
    let source = read_source(&resolve(args)?)?;

    let scenario = match parse_scenario(&source) {
        Ok(scenario) => scenario,
        Err(e) => return Err(format_parse_error(&e, &source).into()),
    };

    let diagnostics = analyze_scenario(&scenario);
    for diagnostic in diagnostics.iter() {
        println!("{}", format_diagnostic(diagnostic, &source));
    }

    let errors = diagnostics.errors().count();
    if errors > 0 {
        return Err(format!("{} error(s) found", errors).into());
    }

    println!(
        "ok: {} bodies, {} detectors",
        scenario.bodies.len(),
        scenario.detectors.len()
    );
    Ok(())
}

fn view(
    args: &ScenarioArgs,
    trail_length: usize,
    scale: f32,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = resolve(args)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 800.0])
            .with_title("nbody"),
        ..Default::default()
    };

    eframe::run_native(
        "nbody",
        options,
        Box::new(move |cc| Ok(Box::new(ViewerApp::new(source, trail_length, scale, cc)))),
    )?;

    Ok(())
}
