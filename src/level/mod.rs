//! Level definitions.
//!
//! Levels arrive as JSON documents written by the level generator:
//!
//! ```text
//! {
//!   "metadata":           { "level_id", "difficulty", "archetype_tags", ... },
//!   "circuit_definition": { "source", "targets", "available_components", "board_layout" },
//!   "solution_data":      { "optimal_solution": { "components_used", "connections",
//!                                                 "expected_score", "simulation_result" },
//!                           "validation_results": { "validation_performed" } }
//! }
//! ```
//!
//! Component types are kebab-case strings (`"led-target"`, `"resistor"`, ...).
//! Parsing checks only the JSON shape; semantic checks happen when the level
//! is loaded into a [`CircuitSimulator`](crate::solver::CircuitSimulator) or
//! run through the [`validation`](crate::validation) suite.

mod progress;
mod schema;

pub use progress::LevelProgress;
pub use schema::*;

use crate::error::{CircuitError, Result};

/// Parse a level from a JSON string.
pub fn parse(input: &str) -> Result<LevelDefinition> {
    Ok(serde_json::from_str(input)?)
}

/// Parse a level file.
pub fn parse_file(path: &std::path::Path) -> Result<LevelDefinition> {
    let content = std::fs::read_to_string(path).map_err(|e| CircuitError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse(&content)
}
