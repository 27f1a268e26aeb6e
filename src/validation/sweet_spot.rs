//! Sweet spot boundary and scoring checks.

use serde::Serialize;
use tracing::{debug, warn};

use super::{range_problem, TestCategory, TestResult, ValidationConfig};
use crate::circuit::ComponentId;
use crate::level::{LevelDefinition, OptimalSolution, TargetDef};
use crate::solver::{CircuitSimulator, SimulationOutcome};

const CATEGORY: TestCategory = TestCategory::SweetSpot;

/// One probe energy and whether it should light the target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundaryCase {
    pub label: &'static str,
    pub energy: f64,
    pub expect_lit: bool,
}

impl BoundaryCase {
    /// The five probes for an inclusive range: both bounds, just outside
    /// each bound, and the midpoint. Probes at or below zero are dropped.
    pub fn for_range(min: f64, max: f64, epsilon: f64) -> Vec<Self> {
        let cases = [
            ("minimum", min, true),
            ("maximum", max, true),
            ("below minimum", min - epsilon, false),
            ("above maximum", max + epsilon, false),
            ("midpoint", (min + max) / 2.0, true),
        ];
        cases
            .into_iter()
            .filter(|(_, energy, _)| *energy > 0.0)
            .map(|(label, energy, expect_lit)| Self {
                label,
                energy,
                expect_lit,
            })
            .collect()
    }
}

/// Checks that targets light exactly inside their ranges and that scores
/// follow from where the energy went.
#[derive(Debug, Clone)]
pub struct SweetSpotValidator {
    config: ValidationConfig,
    simulator: CircuitSimulator,
}

impl Default for SweetSpotValidator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

impl SweetSpotValidator {
    pub fn new(config: ValidationConfig) -> Self {
        let simulator = CircuitSimulator::with_config(config.simulator.clone());
        Self { config, simulator }
    }

    /// Run every sweet spot check on `level`.
    pub fn validate(&mut self, level: &LevelDefinition) -> Vec<TestResult> {
        let mut results = vec![Self::check_range_format(level), self.check_boundaries(level)];

        if let Err(err) = self.simulator.load_level(level) {
            warn!(level = level.id(), error = %err, "level could not be loaded for sweet spot checks");
            results.push(
                TestResult::error(CATEGORY, "simulation_setup", "Level could not be loaded into a simulator")
                    .with_details(err.to_string()),
            );
            return results;
        }

        results.push(self.check_heat_loss(level));
        results.push(self.check_efficiency(level));
        results.push(self.check_empty_circuit());

        debug!(
            level = level.id(),
            failed = results.iter().filter(|r| !r.passed).count(),
            "sweet spot checks finished"
        );
        results
    }

    fn check_range_format(level: &LevelDefinition) -> TestResult {
        let problems: Vec<_> = level
            .targets()
            .iter()
            .filter_map(|t| range_problem(&t.energy_range).map(|p| format!("{}: {p}", t.id)))
            .collect();
        if problems.is_empty() {
            TestResult::pass(CATEGORY, "range_format", "Every range is a positive, increasing pair")
        } else {
            TestResult::error(CATEGORY, "range_format", format!("{} malformed range(s)", problems.len()))
                .with_details(problems.join("; "))
        }
    }

    /// Feed each well-formed target exactly the probe energy through a
    /// lossless wire and compare the outcome with the expectation.
    fn check_boundaries(&mut self, level: &LevelDefinition) -> TestResult {
        let mut probed = 0;
        let mut failures = Vec::new();
        for target in level.targets() {
            if range_problem(&target.energy_range).is_some() {
                continue;
            }
            let Some((min, max)) = target.range() else {
                continue;
            };
            for case in BoundaryCase::for_range(min, max, self.config.boundary_epsilon) {
                probed += 1;
                match self.probe(level, target, case.energy) {
                    Some(lit) if lit == case.expect_lit => {}
                    Some(lit) => failures.push(format!(
                        "{} at {} ({}): expected {}, got {}",
                        target.id,
                        case.energy,
                        case.label,
                        lit_word(case.expect_lit),
                        lit_word(lit)
                    )),
                    None => failures.push(format!("{}: probe circuit could not be built", target.id)),
                }
            }
        }
        if failures.is_empty() {
            TestResult::pass(
                CATEGORY,
                "boundary_cases",
                format!("{probed} boundary probe(s) classified correctly"),
            )
        } else {
            TestResult::error(
                CATEGORY,
                "boundary_cases",
                format!("{} of {probed} boundary probe(s) misclassified", failures.len()),
            )
            .with_details(failures.join("; "))
        }
    }

    /// Whether `target` lights when the source sends it exactly `energy`.
    fn probe(&mut self, level: &LevelDefinition, target: &TargetDef, energy: f64) -> Option<bool> {
        let mut probe = level.clone();
        probe.circuit_definition.source.energy_output = energy;
        probe.circuit_definition.targets = vec![target.clone()];
        probe.circuit_definition.available_components.clear();
        probe.solution_data.optimal_solution = OptimalSolution::default();

        self.simulator.load_level(&probe).ok()?;
        if !self.simulator.connect_components(&probe.source().id, &target.id) {
            return None;
        }
        let result = self.simulator.simulate().result;
        Some(result.is_lit(&ComponentId::new(target.id.clone())))
    }

    /// A target whose range excludes the full output must not earn score
    /// when wired straight to the source.
    fn check_heat_loss(&mut self, level: &LevelDefinition) -> TestResult {
        let output = level.source().energy_output;
        let Some(target) = level.targets().iter().find(|t| {
            range_problem(&t.energy_range).is_none()
                && t.range().is_some_and(|(min, max)| output < min || output > max)
        }) else {
            return TestResult::pass(
                CATEGORY,
                "heat_loss",
                "Skipped: every target accepts the full source output",
            );
        };

        self.simulator.clear_all();
        if !self.simulator.connect_components(&level.source().id, &target.id) {
            return TestResult::error(CATEGORY, "heat_loss", "Direct wire could not be made");
        }
        let outcome = self.simulator.simulate();
        self.simulator.clear_all();

        if outcome.score <= self.config.heat_loss_allowance {
            TestResult::pass(
                CATEGORY,
                "heat_loss",
                format!("Out-of-range delivery to {} scores {:.2}%", target.id, outcome.score),
            )
        } else {
            TestResult::error(
                CATEGORY,
                "heat_loss",
                format!(
                    "Out-of-range delivery to {} scores {:.2}%, above {}%",
                    target.id, outcome.score, self.config.heat_loss_allowance
                ),
            )
            .with_details(format!("heat loss {:.3} EU", outcome.result.heat_loss))
        }
    }

    /// Recompute the optimal solution's score from where its energy went.
    fn check_efficiency(&mut self, level: &LevelDefinition) -> TestResult {
        let solution = level.optimal_solution();
        if solution.connections.is_empty() {
            return TestResult::warning(
                CATEGORY,
                "efficiency_calculation",
                "Level has no recorded optimal solution",
            );
        }
        if let Err(err) = level.check_solution_references() {
            return TestResult::error(CATEGORY, "efficiency_calculation", "Optimal solution cannot be built")
                .with_details(err.to_string());
        }
        if !self.simulator.load_optimal_solution() {
            return TestResult::error(
                CATEGORY,
                "efficiency_calculation",
                "Optimal solution could not be applied",
            );
        }
        let outcome = self.simulator.simulate();
        self.simulator.clear_all();

        self.efficiency_finding(level, &outcome)
    }

    /// Compare a simulated score with the one recomputed from its energy.
    fn efficiency_finding(&self, level: &LevelDefinition, outcome: &SimulationOutcome) -> TestResult {
        if outcome.result.energy_distribution.is_empty() {
            return TestResult::error(
                CATEGORY,
                "efficiency_calculation",
                "Optimal solution reaches no target",
            );
        }
        let expected = recompute_efficiency(level, outcome);
        let gap = (expected - outcome.score).abs();
        if gap <= self.config.efficiency_tolerance {
            TestResult::pass(
                CATEGORY,
                "efficiency_calculation",
                format!("Score {:.2}% matches the energy delivered", outcome.score),
            )
        } else {
            TestResult::error(
                CATEGORY,
                "efficiency_calculation",
                format!(
                    "Score {:.2}% differs from recomputed {expected:.2}% by {gap:.2} points",
                    outcome.score
                ),
            )
        }
    }

    fn check_empty_circuit(&mut self) -> TestResult {
        self.simulator.clear_all();
        let outcome = self.simulator.simulate();
        let result = &outcome.result;
        let stored_all = (result.supercapacitor_energy - result.source_output).abs()
            <= 1e-9 * result.source_output.abs().max(1.0);
        if stored_all && (outcome.score - 100.0).abs() <= 1e-9 {
            TestResult::pass(
                CATEGORY,
                "empty_circuit",
                "Empty circuit stores all energy and scores 100%",
            )
        } else {
            TestResult::critical(
                CATEGORY,
                "empty_circuit",
                format!(
                    "Empty circuit stored {:.3} of {:.3} EU and scored {:.2}%",
                    result.supercapacitor_energy, result.source_output, outcome.score
                ),
            )
        }
    }
}

fn lit_word(lit: bool) -> &'static str {
    if lit {
        "lit"
    } else {
        "unlit"
    }
}

/// In-range deliveries plus undrawn energy, as a percentage of the output.
fn recompute_efficiency(level: &LevelDefinition, outcome: &SimulationOutcome) -> f64 {
    let result = &outcome.result;
    if result.source_output <= 0.0 {
        return 0.0;
    }
    let in_range: f64 = result
        .energy_distribution
        .iter()
        .filter(|(id, delivered)| {
            level
                .targets()
                .iter()
                .find(|t| **id == t.id.as_str())
                .and_then(TargetDef::range)
                .is_some_and(|(min, max)| **delivered >= min && **delivered <= max)
        })
        .map(|(_, delivered)| delivered)
        .sum();
    (in_range + result.unused_energy) / result.source_output * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{resistor_def, solved_level, LevelBuilder};
    use crate::validation::Severity;

    fn find<'a>(results: &'a [TestResult], name: &str) -> &'a TestResult {
        results
            .iter()
            .find(|r| r.name == name)
            .unwrap_or_else(|| panic!("no result named {name}"))
    }

    #[test]
    fn test_boundary_cases_for_range() {
        let cases = BoundaryCase::for_range(13.5, 16.5, 0.01);
        assert_eq!(cases.len(), 5);
        assert!(cases.iter().any(|c| c.energy == 13.5 && c.expect_lit));
        let above = cases.iter().find(|c| c.label == "above maximum").unwrap();
        assert!(!above.expect_lit);
        approx::assert_relative_eq!(above.energy, 16.51);
        assert!(cases.iter().any(|c| c.energy == 15.0 && c.expect_lit));

        // min - epsilon <= 0 is not a usable probe
        assert_eq!(BoundaryCase::for_range(0.005, 1.0, 0.01).len(), 4);
    }

    #[test]
    fn test_solved_level_passes() {
        let results = SweetSpotValidator::default().validate(&solved_level("L1"));
        assert_eq!(results.len(), 5);
        for result in &results {
            assert!(result.passed, "{} failed: {}", result.name, result.message);
        }
        assert_eq!(find(&results, "boundary_cases").message, "5 boundary probe(s) classified correctly");
    }

    #[test]
    fn test_reversed_range_is_reported() {
        let mut level = solved_level("L1");
        level.circuit_definition.targets[0].energy_range = vec![16.5, 13.5];
        let results = SweetSpotValidator::default().validate(&level);
        let format = find(&results, "range_format");
        assert_eq!(format.severity, Severity::Error);
        assert!(format.details.as_deref().unwrap().contains("TARGET"));
    }

    #[test]
    fn test_heat_loss_scores_nothing() {
        let results = SweetSpotValidator::default().validate(&solved_level("L1"));
        let heat = find(&results, "heat_loss");
        assert!(heat.passed);
        assert_eq!(heat.message, "Out-of-range delivery to TARGET scores 0.00%");
    }

    #[test]
    fn test_heat_loss_skipped_when_output_fits() {
        let level = LevelBuilder::new("L1").target("T", 100.0, 130.0).build();
        let results = SweetSpotValidator::default().validate(&level);
        assert!(find(&results, "heat_loss").message.starts_with("Skipped"));
    }

    #[test]
    fn test_solution_reaching_no_target() {
        let level = LevelBuilder::new("L1")
            .target("T", 13.5, 16.5)
            .component(resistor_def("R1", 1.0))
            .solution(&["R1"], &[("SOURCE", "R1")], 0.0)
            .build();
        let results = SweetSpotValidator::default().validate(&level);
        let efficiency = find(&results, "efficiency_calculation");
        assert!(!efficiency.passed);
        assert_eq!(efficiency.message, "Optimal solution reaches no target");
    }

    #[test]
    fn test_empty_circuit_scores_full() {
        let results = SweetSpotValidator::default().validate(&solved_level("L1"));
        assert!(find(&results, "empty_circuit").passed);
    }

    #[test]
    fn test_recompute_efficiency_matches_simulator() {
        let level = solved_level("L1");
        let mut sim = CircuitSimulator::new();
        sim.load_level(&level).unwrap();
        assert!(sim.load_optimal_solution());
        let outcome = sim.simulate();
        approx::assert_relative_eq!(recompute_efficiency(&level, &outcome), outcome.score, epsilon = 1e-9);
        approx::assert_relative_eq!(outcome.score, 12.5, epsilon = 1e-9);
    }

    #[test]
    fn test_tampered_score_is_an_error() {
        let level = solved_level("L1");
        let mut sim = CircuitSimulator::new();
        sim.load_level(&level).unwrap();
        assert!(sim.load_optimal_solution());
        let mut outcome = sim.simulate();
        let validator = SweetSpotValidator::default();
        assert!(validator.efficiency_finding(&level, &outcome).passed);

        outcome.score = 40.0;
        let check = validator.efficiency_finding(&level, &outcome);
        assert!(!check.passed);
        assert_eq!(check.severity, Severity::Error);
        assert_eq!(
            check.message,
            "Score 40.00% differs from recomputed 12.50% by 27.50 points"
        );
    }

    #[test]
    fn test_misclassified_boundaries_are_errors() {
        // a negative step moves the "outside" energies inside the range
        let config = ValidationConfig {
            boundary_epsilon: -0.01,
            ..ValidationConfig::default()
        };
        let results = SweetSpotValidator::new(config).validate(&solved_level("L1"));
        let boundaries = find(&results, "boundary_cases");
        assert!(!boundaries.passed);
        assert_eq!(boundaries.severity, Severity::Error);
        assert_eq!(boundaries.message, "2 of 5 boundary probe(s) misclassified");
        let details = boundaries.details.as_deref().unwrap();
        assert!(details.contains("(below minimum): expected unlit, got lit"), "{details}");
        assert!(details.contains("(above maximum): expected unlit, got lit"), "{details}");
    }
}
