//! # Circuit Quest Core
//!
//! The energy engine behind a circuit-building puzzle game.
//!
//! A level gives the player an energy source, one or more LED targets with an
//! energy sweet spot, and a bin of parts. The player places parts, wires them
//! up and runs a simulation. Targets light when the energy arriving at them
//! lands inside their sweet spot, and the score is the energy banked in the
//! supercapacitor.
//!
//! ## Architecture
//!
//! - [`level`] - Level definition records and JSON parsing
//! - [`circuit`] - Identifiers, board geometry and the connection graph
//! - [`components`] - Component kinds and the level-to-component factory
//! - [`solver`] - Energy calculator and the game-facing simulator
//! - [`validation`] - Offline checks over generated levels
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! circuit-quest validate levels/*.json --json > report.json
//! circuit-quest simulate levels/level_001.json
//! ```
//!
//! ### Library
//!
//! ```no_run
//! use circuit_quest_core::{circuit::Position, level, CircuitSimulator};
//!
//! let level = level::parse_file("level_001.json".as_ref())?;
//! let mut sim = CircuitSimulator::new();
//! sim.load_level(&level)?;
//! sim.place_component("R1", Position::new(2, 3));
//! sim.connect_components("SOURCE", "R1");
//! sim.connect_components("R1", "TARGET");
//! let outcome = sim.simulate();
//! println!("{} ({:.1}%)", outcome.message, outcome.score);
//! # Ok::<(), circuit_quest_core::CircuitError>(())
//! ```
//!
//! ### WASM
//!
//! ```javascript
//! import { WasmCircuitGame } from 'circuit_quest_core';
//!
//! const game = new WasmCircuitGame(levelJson);
//! game.place_component("R1", 2, 3);
//! const outcome = JSON.parse(game.simulate());
//! ```

pub mod circuit;
pub mod components;
pub mod error;
pub mod level;
pub mod solver;
pub mod validation;

// Re-export main types for convenience
pub use error::{CircuitError, Result};
pub use level::LevelDefinition;
pub use solver::{CircuitSimulator, SimulationOutcome, SimulationResult};
pub use validation::LevelTestRunner;

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::WasmCircuitGame;

#[cfg(test)]
mod test_utils;
