//! Energy sanity and conservation checks.

use tracing::{debug, warn};

use super::{range_problem, TestCategory, TestResult, ValidationConfig};
use crate::circuit::Position;
use crate::level::LevelDefinition;
use crate::solver::{CircuitSimulator, SimulationOutcome, SimulationResult};

const CATEGORY: TestCategory = TestCategory::Energy;

/// Checks that a level's numbers make sense and that simulating it neither
/// creates nor destroys energy.
#[derive(Debug, Clone)]
pub struct EnergyValidator {
    config: ValidationConfig,
    simulator: CircuitSimulator,
}

impl Default for EnergyValidator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

impl EnergyValidator {
    pub fn new(config: ValidationConfig) -> Self {
        let simulator = CircuitSimulator::with_config(config.simulator.clone());
        Self { config, simulator }
    }

    /// Run every energy check on `level`.
    pub fn validate(&mut self, level: &LevelDefinition) -> Vec<TestResult> {
        let mut results = vec![
            Self::check_source(level),
            Self::check_target_ranges(level),
            Self::check_total_demand(level),
        ];

        if let Err(err) = self.simulator.load_level(level) {
            warn!(level = level.id(), error = %err, "level could not be loaded for energy checks");
            results.push(
                TestResult::error(CATEGORY, "simulation_setup", "Level could not be loaded into a simulator")
                    .with_details(err.to_string()),
            );
            return results;
        }

        results.extend(self.check_optimal_solution(level));
        results.push(self.check_component_conservation(level));
        results.push(self.check_empty_circuit());

        debug!(
            level = level.id(),
            failed = results.iter().filter(|r| !r.passed).count(),
            "energy checks finished"
        );
        results
    }

    fn check_source(level: &LevelDefinition) -> TestResult {
        let source = level.source();
        let mut problems = Vec::new();
        if !(source.energy_output > 0.0 && source.energy_output.is_finite()) {
            problems.push(format!("energy output {} must be positive", source.energy_output));
        }
        if !(source.voltage > 0.0 && source.voltage.is_finite()) {
            problems.push(format!("voltage {} must be positive", source.voltage));
        }
        if problems.is_empty() {
            TestResult::pass(
                CATEGORY,
                "source_validity",
                format!("Source provides {} EU at {} V", source.energy_output, source.voltage),
            )
        } else {
            TestResult::error(CATEGORY, "source_validity", "Source is unusable").with_details(problems.join("; "))
        }
    }

    fn check_target_ranges(level: &LevelDefinition) -> TestResult {
        let output = level.source().energy_output;
        let mut problems = Vec::new();
        if level.targets().is_empty() {
            problems.push("level has no targets".to_string());
        }
        for target in level.targets() {
            if let Some(problem) = range_problem(&target.energy_range) {
                problems.push(format!("{}: {problem}", target.id));
            } else if let Some((_, max)) = target.range() {
                if max > output {
                    problems.push(format!(
                        "{}: range maximum {max} exceeds source output {output}",
                        target.id
                    ));
                }
            }
        }
        if problems.is_empty() {
            TestResult::pass(CATEGORY, "target_ranges", "Every target range is reachable")
        } else {
            TestResult::error(CATEGORY, "target_ranges", format!("{} target range problem(s)", problems.len()))
                .with_details(problems.join("; "))
        }
    }

    fn check_total_demand(level: &LevelDefinition) -> TestResult {
        let output = level.source().energy_output;
        let demand: f64 = level.targets().iter().filter_map(|t| t.range()).map(|(_, max)| max).sum();
        if demand > output {
            TestResult::warning(
                CATEGORY,
                "total_demand",
                format!("Targets can absorb up to {demand} EU, more than the source's {output} EU"),
            )
        } else {
            TestResult::pass(
                CATEGORY,
                "total_demand",
                format!("Targets absorb at most {demand} of {output} EU"),
            )
        }
    }

    /// Conservation and score checks on the recorded optimal solution.
    fn check_optimal_solution(&mut self, level: &LevelDefinition) -> Vec<TestResult> {
        let solution = level.optimal_solution();
        if solution.connections.is_empty() {
            return vec![TestResult::warning(
                CATEGORY,
                "optimal_solution_conservation",
                "Level has no recorded optimal solution",
            )];
        }
        if let Err(err) = level.check_solution_references() {
            return vec![TestResult::error(
                CATEGORY,
                "optimal_solution_conservation",
                "Optimal solution cannot be built",
            )
            .with_details(err.to_string())];
        }
        if !self.simulator.load_optimal_solution() {
            return vec![TestResult::error(
                CATEGORY,
                "optimal_solution_conservation",
                "Optimal solution could not be applied",
            )];
        }

        let outcome = self.simulator.simulate();
        let mut results = Vec::with_capacity(2);
        results.push(self.solution_conservation(level.id(), &outcome));

        let gap = (outcome.score - solution.expected_score).abs();
        if gap > self.config.score_tolerance {
            results.push(TestResult::warning(
                CATEGORY,
                "expected_score",
                format!(
                    "Simulated score {:.2}% differs from expected {:.2}% by {gap:.2} points",
                    outcome.score, solution.expected_score
                ),
            ));
        } else {
            results.push(TestResult::pass(
                CATEGORY,
                "expected_score",
                format!("Simulated score {:.2}% matches the expected score", outcome.score),
            ));
        }
        results
    }

    /// Score bound, energy limit and balance of one simulated solution.
    fn solution_conservation(&self, level_id: &str, outcome: &SimulationOutcome) -> TestResult {
        let result = &outcome.result;
        let limit = result.source_output * (1.0 + self.config.conservation_tolerance);
        let mut violations = Vec::new();
        if outcome.score > 100.0 + 1e-9 {
            violations.push(format!("score {:.2}% exceeds 100%", outcome.score));
        }
        if result.total_energy_used > limit {
            violations.push(format!(
                "energy used {:.3} exceeds source output {:.3}",
                result.total_energy_used, result.source_output
            ));
        }
        if let Some(violation) = self.conservation_violation(result) {
            violations.push(violation);
        }
        if violations.is_empty() {
            TestResult::pass(
                CATEGORY,
                "optimal_solution_conservation",
                format!("Optimal solution conserves energy and scores {:.2}%", outcome.score),
            )
        } else {
            warn!(level = level_id, ?violations, "optimal solution breaks conservation");
            TestResult::critical(
                CATEGORY,
                "optimal_solution_conservation",
                "Optimal solution violates conservation of energy",
            )
            .with_details(violations.join("; "))
        }
    }

    /// Wire every part alone between the source and the first target and
    /// re-derive the energy balance.
    fn check_component_conservation(&mut self, level: &LevelDefinition) -> TestResult {
        let Some(target) = level.targets().first() else {
            return TestResult::warning(
                CATEGORY,
                "component_conservation",
                "Skipped: level has no target to wire against",
            );
        };
        self.simulator.clear_all();
        let ids: Vec<String> = self
            .simulator
            .game_state()
            .map(|s| s.available().iter().map(|c| c.id().to_string()).collect())
            .unwrap_or_default();

        let source = level.source().id.as_str();
        let mut violations = Vec::new();
        for id in &ids {
            self.simulator.clear_all();
            let wired = self.simulator.place_component(id, Position::default())
                && self.simulator.connect_components(source, id)
                && self.simulator.connect_components(id, &target.id);
            if !wired {
                violations.push(format!("{id}: could not be wired"));
                continue;
            }
            let result = self.simulator.simulate().result;
            if let Some(violation) = self.conservation_violation(&result) {
                violations.push(format!("{id}: {violation}"));
            }
        }
        self.simulator.clear_all();

        if violations.is_empty() {
            TestResult::pass(
                CATEGORY,
                "component_conservation",
                format!("{} part(s) conserve energy", ids.len()),
            )
        } else {
            TestResult::critical(
                CATEGORY,
                "component_conservation",
                format!("{} part(s) break conservation of energy", violations.len()),
            )
            .with_details(violations.join("; "))
        }
    }

    fn check_empty_circuit(&mut self) -> TestResult {
        self.simulator.clear_all();
        let result = self.simulator.simulate().result;
        if result.total_energy_used == 0.0 && result.targets_lit.is_empty() {
            TestResult::pass(CATEGORY, "empty_circuit", "Empty circuit consumes no energy")
        } else {
            TestResult::error(
                CATEGORY,
                "empty_circuit",
                format!(
                    "Empty circuit consumed {:.3} EU and lit {} target(s)",
                    result.total_energy_used,
                    result.targets_lit.len()
                ),
            )
        }
    }

    /// Losses, deliveries and undrawn energy must add up to the source
    /// output. Once energy reaches a target, losses, heat and the
    /// supercapacitor must also add up to it.
    fn conservation_violation(&self, result: &SimulationResult) -> Option<String> {
        let output = result.source_output;
        let allowed = output.abs() * self.config.conservation_tolerance;
        let balance = result.energy_balance();
        if (balance - output).abs() > allowed {
            return Some(format!("accounted for {balance:.3} EU of {output:.3} EU"));
        }
        if !result.energy_distribution.is_empty() {
            let banked = result.total_energy_used + result.heat_loss + result.supercapacitor_energy;
            if (banked - output).abs() > allowed {
                return Some(format!(
                    "losses, heat and storage hold {banked:.3} EU of {output:.3} EU"
                ));
            }
        }
        None
    }
}
