//! Energy-flow solver.
//!
//! This module turns a wired board into a score.
//!
//! ## Energy model
//!
//! For every LED target the solver looks for a route from the source with a
//! depth-first search over the wiring, in the order wires were added. The
//! first route found is used. Open switches cannot be entered.
//!
//! The source output is split evenly between the targets that have a route.
//! Along each route the energy loses:
//!
//! ```text
//! resistor              (flow / 10)² × R
//! capacitor, inductor   1% of flow
//! anything else         nothing
//! ```
//!
//! A target lights when what arrives lies inside its sweet spot, bounds
//! included. Energy inside a sweet spot and energy nobody drew are banked in
//! the supercapacitor, which is the score. Energy arriving outside a sweet
//! spot is lost as heat.

mod energy;
mod result;
mod simulator;

pub use energy::{CalculatorParts, EnergyCalculator, EnergyPath};
pub use result::{SimulationResult, EMPTY_CIRCUIT_MESSAGE, NO_PATH_MESSAGE};
pub use simulator::{CircuitSimulator, GameState, SimulationOutcome, SimulatorConfig};
