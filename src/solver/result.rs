//! Simulation results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::circuit::ComponentId;

/// Error reported when no target can be reached from the source.
pub const NO_PATH_MESSAGE: &str = "No valid path from source to any target";

/// Error reported when nothing is wired at all.
pub const EMPTY_CIRCUIT_MESSAGE: &str = "Circuit is empty: all source energy stored in the supercapacitor";

/// Outcome of one run of the energy calculator.
///
/// Every EU of the source is accounted for exactly once:
/// `total_energy_used + Σ energy_distribution + unused_energy == source_output`.
/// The supercapacitor banks the undrawn energy plus whatever landed inside a
/// sweet spot; energy delivered outside a sweet spot is `heat_loss`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Every target is lit
    pub is_valid: bool,
    pub targets_lit: Vec<ComponentId>,
    /// Sum of path losses
    pub total_energy_used: f64,
    /// Energy delivered to each reachable target
    pub energy_distribution: BTreeMap<ComponentId, f64>,
    /// Energy delivered outside a sweet spot
    pub heat_loss: f64,
    /// Energy no path drew from the source
    pub unused_energy: f64,
    pub supercapacitor_energy: f64,
    /// Score in EU; equal to the supercapacitor's stored energy
    pub final_score: f64,
    pub source_output: f64,
    pub errors: Vec<String>,
}

impl SimulationResult {
    /// An invalid result: nothing was drawn and nothing is scored.
    pub fn failed(source_output: f64, error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            targets_lit: Vec::new(),
            total_energy_used: 0.0,
            energy_distribution: BTreeMap::new(),
            heat_loss: 0.0,
            unused_energy: source_output,
            supercapacitor_energy: 0.0,
            final_score: 0.0,
            source_output,
            errors: vec![error.into()],
        }
    }

    /// Score as a percentage of the source output.
    pub fn efficiency(&self) -> f64 {
        if self.source_output > 0.0 {
            self.final_score / self.source_output * 100.0
        } else {
            0.0
        }
    }

    /// Total energy delivered to targets, in or out of their sweet spots.
    pub fn delivered_energy(&self) -> f64 {
        self.energy_distribution.values().sum()
    }

    /// Everything the result accounts for; equals `source_output` when
    /// energy is conserved.
    pub fn energy_balance(&self) -> f64 {
        self.total_energy_used + self.delivered_energy() + self.unused_energy
    }

    /// Whether the balance matches the source output within `tolerance`
    /// (a fraction of the output).
    pub fn is_balanced(&self, tolerance: f64) -> bool {
        (self.energy_balance() - self.source_output).abs() <= self.source_output.abs() * tolerance
    }

    /// Whether `target` was lit.
    pub fn is_lit(&self, target: &ComponentId) -> bool {
        self.targets_lit.contains(target)
    }

    /// Energy delivered to `target`, zero if it was unreachable.
    pub fn delivered_to(&self, target: &ComponentId) -> f64 {
        self.energy_distribution.get(target).copied().unwrap_or(0.0)
    }
}
