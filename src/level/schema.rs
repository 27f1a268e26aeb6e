//! Level definition records.
//!
//! These mirror the JSON emitted by the level generator. Everything here is
//! plain data; the engine turns it into components through the
//! [`factory`](crate::components::factory).

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::circuit::{ComponentType, Position};
use crate::components::Supercapacitor;
use crate::error::{CircuitError, Result};

/// A complete level as produced by the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDefinition {
    pub metadata: LevelMetadata,
    pub circuit_definition: CircuitDefinition,
    #[serde(default)]
    pub solution_data: SolutionData,
}

impl LevelDefinition {
    /// The level's stable identifier.
    pub fn id(&self) -> &str {
        &self.metadata.level_id
    }

    pub fn source(&self) -> &SourceDef {
        &self.circuit_definition.source
    }

    pub fn targets(&self) -> &[TargetDef] {
        &self.circuit_definition.targets
    }

    pub fn available_components(&self) -> &[AvailableComponentDef] {
        &self.circuit_definition.available_components
    }

    pub fn optimal_solution(&self) -> &OptimalSolution {
        &self.solution_data.optimal_solution
    }

    /// Every id the optimal solution mentions must exist in the level.
    ///
    /// Parts must come from the bin; wire ends may also be the source, a
    /// target or the supercapacitor.
    pub fn check_solution_references(&self) -> Result<()> {
        let bin: HashSet<String> = self
            .available_components()
            .iter()
            .flat_map(AvailableComponentDef::instance_ids)
            .collect();
        let solution = self.optimal_solution();
        for id in &solution.components_used {
            if !bin.contains(id) {
                return Err(CircuitError::unknown_component(id, "optimal solution parts"));
            }
        }

        let wireable = |id: &str| {
            id == self.source().id
                || id == Supercapacitor::DEFAULT_ID
                || self.targets().iter().any(|t| t.id == id)
                || solution.components_used.iter().any(|c| c == id)
        };
        for connection in &solution.connections {
            for end in [&connection.from, &connection.to] {
                if !wireable(end) {
                    return Err(CircuitError::unknown_component(
                        end,
                        format!("optimal solution wire {} -> {}", connection.from, connection.to),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Descriptive data about a level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelMetadata {
    pub level_id: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub archetype_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator_version: Option<String>,
}

/// The physical puzzle: source, targets and the player's parts bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitDefinition {
    pub source: SourceDef,
    pub targets: Vec<TargetDef>,
    #[serde(default)]
    pub available_components: Vec<AvailableComponentDef>,
    #[serde(default)]
    pub board_layout: BoardLayout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDef {
    pub id: String,
    pub voltage: f64,
    /// Total EU available per simulation
    pub energy_output: f64,
    #[serde(default = "default_true")]
    pub is_stable: bool,
    #[serde(default)]
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetDef {
    pub id: String,
    #[serde(rename = "type", default = "default_target_type")]
    pub component_type: ComponentType,
    /// Inclusive sweet spot `[min, max]`, kept as a list so malformed ranges
    /// survive loading and can be reported by the validators
    pub energy_range: Vec<f64>,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub position: Position,
}

impl TargetDef {
    /// The range as `(min, max)` if it has exactly two entries.
    pub fn range(&self) -> Option<(f64, f64)> {
        match self.energy_range.as_slice() {
            [min, max] => Some((*min, *max)),
            _ => None,
        }
    }

    /// Lower bound used for ordering; malformed ranges sort first.
    pub fn range_min(&self) -> f64 {
        self.energy_range.first().copied().unwrap_or(f64::NEG_INFINITY)
    }
}

/// An entry in the player's parts bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableComponentDef {
    pub id: String,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    #[serde(default)]
    pub nominal_value: f64,
    #[serde(default)]
    pub actual_value: Option<f64>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub is_red_herring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resistance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_closed: Option<bool>,
}

impl AvailableComponentDef {
    /// The measured value, falling back to the nominal one.
    pub fn effective_value(&self) -> f64 {
        self.actual_value.unwrap_or(self.nominal_value)
    }

    /// Ids of the physical parts this entry stands for.
    ///
    /// The first part keeps the record's id; further ones get `-2`, `-3`
    /// and so on appended.
    pub fn instance_ids(&self) -> Vec<String> {
        (1..=self.quantity)
            .map(|n| {
                if n == 1 {
                    self.id.clone()
                } else {
                    format!("{}-{}", self.id, n)
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardLayout {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolutionData {
    #[serde(default)]
    pub optimal_solution: OptimalSolution,
    #[serde(default)]
    pub validation_results: ValidationResults,
}

/// The author's reference answer for a level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimalSolution {
    #[serde(default)]
    pub components_used: Vec<String>,
    #[serde(default)]
    pub connections: Vec<ConnectionDef>,
    /// Efficiency percentage the generator computed for this solution
    #[serde(default)]
    pub expected_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulation_result: Option<RecordedSimulation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDef {
    pub from: String,
    pub to: String,
}

impl ConnectionDef {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// The generator's own simulation of the optimal solution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedSimulation {
    #[serde(default)]
    pub targets_lit: Vec<String>,
    #[serde(default)]
    pub energy_distribution: BTreeMap<String, f64>,
    #[serde(default)]
    pub total_energy_used: f64,
    #[serde(default)]
    pub final_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResults {
    #[serde(default)]
    pub validation_performed: bool,
}

fn default_true() -> bool {
    true
}

fn default_quantity() -> u32 {
    1
}

fn default_target_type() -> ComponentType {
    ComponentType::LedTarget
}
