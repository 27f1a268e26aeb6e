//! Circuit Quest - level tooling
//!
//! Validates generated levels and replays their optimal solutions.
//!
//! # Usage
//!
//! ```bash
//! circuit-quest validate levels/*.json
//! circuit-quest validate levels/*.json --check energy --json > report.json
//! circuit-quest simulate levels/level_001.json
//! ```
//!
//! `validate` exits with a non-zero status when any level fails or breaks
//! conservation of energy. Logging goes to stderr and follows `RUST_LOG`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use circuit_quest_core::{
    error::{CircuitError, Result},
    level::{self, LevelDefinition},
    validation::{CheckType, CorpusReport, LevelTestRunner, ValidationConfig, ValidationStatus},
    CircuitSimulator,
};

/// Level validation and replay for Circuit Quest
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log engine decisions (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the validation suite over level files
    Validate {
        /// Level files (.json)
        #[arg(value_name = "LEVEL_FILE", required = true)]
        files: Vec<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Run only one validator
        #[arg(long, value_enum)]
        check: Option<Check>,

        /// Similarity above which two levels are duplicates
        #[arg(long, default_value_t = 0.95)]
        duplicate_threshold: f64,

        /// Similarity above which two levels are reported as near duplicates
        #[arg(long, default_value_t = 0.8)]
        similarity_warning: f64,

        /// Allowed gap between simulated and expected score, in points
        #[arg(long, default_value_t = 5.0)]
        score_tolerance: f64,
    },

    /// Apply a level's optimal solution and print the outcome
    Simulate {
        /// Level file (.json)
        #[arg(value_name = "LEVEL_FILE")]
        file: PathBuf,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Check {
    Duplicate,
    Energy,
    SweetSpot,
}

impl From<Check> for CheckType {
    fn from(check: Check) -> Self {
        match check {
            Check::Duplicate => CheckType::Duplicate,
            Check::Energy => CheckType::Energy,
            Check::SweetSpot => CheckType::SweetSpot,
        }
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Validate {
            files,
            json,
            check,
            duplicate_threshold,
            similarity_warning,
            score_tolerance,
        } => {
            let config = ValidationConfig::new()
                .with_duplicate_threshold(duplicate_threshold)
                .with_similarity_warning_threshold(similarity_warning)
                .with_score_tolerance(score_tolerance);
            let levels = load_levels(&files)?;
            let report = validate(config, &levels, check.map(CheckType::from));

            if json {
                println!("{}", report.to_json()?);
            } else {
                print_report(&report);
            }
            Ok(if report.has_failures() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Command::Simulate { file, json } => {
            let level = level::parse_file(&file)?;
            level.check_solution_references()?;

            let mut simulator = CircuitSimulator::new();
            simulator.load_level(&level)?;
            let applied = simulator.load_optimal_solution();
            let outcome = simulator.simulate();

            if json {
                let text = serde_json::to_string_pretty(&outcome).map_err(|e| CircuitError::ReportWriteError {
                    message: e.to_string(),
                })?;
                println!("{text}");
            } else {
                println!("{}: {}", level.id(), outcome.message);
                println!("  score: {:.2}%", outcome.score);
                for (target, energy) in &outcome.result.energy_distribution {
                    let state = if outcome.result.is_lit(target) { "lit" } else { "unlit" };
                    println!("  {target}: {energy:.3} EU ({state})");
                }
                for error in &outcome.result.errors {
                    println!("  note: {error}");
                }
            }
            Ok(if applied {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "circuit_quest_core=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_levels(files: &[PathBuf]) -> Result<Vec<LevelDefinition>> {
    files.iter().map(|path| level::parse_file(path)).collect()
}

fn validate(config: ValidationConfig, levels: &[LevelDefinition], check: Option<CheckType>) -> CorpusReport {
    let mut runner = LevelTestRunner::new(config);
    match check {
        None => runner.run_all(levels),
        Some(check) => {
            for level in levels {
                runner.register(level);
            }
            let reports = levels.iter().map(|level| runner.run_check(level, check)).collect();
            CorpusReport::from_reports(reports)
        }
    }
}

fn print_report(report: &CorpusReport) {
    for level in &report.levels {
        println!(
            "{}: {} ({}/{} passed, {} warning(s))",
            level.level_id, level.status, level.summary.passed, level.summary.total, level.summary.warnings
        );
        for result in level.results.iter().filter(|r| !r.passed || r.is_warning()) {
            println!("  [{}] {}: {}", result.severity, result.name, result.message);
            if let Some(details) = &result.details {
                println!("      {details}");
            }
        }
        for advice in &level.recommendations {
            println!("  -> {advice}");
        }
    }
    println!(
        "\n{} level(s): {} {}, {} {}, {} {}, {} {}",
        report.total_levels,
        report.passed,
        ValidationStatus::Passed,
        report.warning,
        ValidationStatus::Warning,
        report.failed,
        ValidationStatus::Failed,
        report.critical,
        ValidationStatus::Critical
    );
}
