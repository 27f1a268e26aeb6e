//! WASM bindings for Circuit Quest Core.
//!
//! The browser front end drives one [`WasmCircuitGame`] per open level.
//! Player actions return booleans like the native simulator; simulation
//! results cross the boundary as JSON strings.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmCircuitGame } from 'circuit_quest_core';
//!
//! await init();
//!
//! const game = new WasmCircuitGame(levelJson);
//! game.place_component("R1", 2, 3);
//! game.connect_components("SOURCE", "R1");
//! game.connect_components("R1", "TARGET");
//!
//! const outcome = JSON.parse(game.simulate());
//! console.log(outcome.message, outcome.score);
//! ```

use wasm_bindgen::prelude::*;

use crate::circuit::Position;
use crate::components::{DEFAULT_CURRENT_DIVISOR, DEFAULT_REACTIVE_LOSS};
use crate::error::CircuitError;
use crate::level;
use crate::solver::{CircuitSimulator, SimulatorConfig};

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn to_js(err: CircuitError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| {
        to_js(CircuitError::WasmError {
            message: e.to_string(),
        })
    })
}

/// WASM-compatible game session.
///
/// Wraps the native [`CircuitSimulator`] with a level already loaded.
#[wasm_bindgen]
pub struct WasmCircuitGame {
    simulator: CircuitSimulator,
}

#[wasm_bindgen]
impl WasmCircuitGame {
    /// Create a session from a level JSON document.
    ///
    /// # Example
    /// ```javascript
    /// const game = new WasmCircuitGame(await (await fetch("level_001.json")).text());
    /// ```
    #[wasm_bindgen(constructor)]
    pub fn new(level_json: &str) -> Result<WasmCircuitGame, JsValue> {
        Self::with_loss_model(level_json, DEFAULT_CURRENT_DIVISOR, DEFAULT_REACTIVE_LOSS)
    }

    /// Create a session with a custom loss model.
    ///
    /// # Arguments
    /// * `level_json` - The level definition
    /// * `current_divisor` - Divisor of the resistor current proxy (default: 10)
    /// * `reactive_loss` - Fraction lost in capacitors and inductors (default: 0.01)
    #[wasm_bindgen]
    pub fn with_loss_model(
        level_json: &str,
        current_divisor: f64,
        reactive_loss: f64,
    ) -> Result<WasmCircuitGame, JsValue> {
        let level = level::parse(level_json).map_err(to_js)?;
        let config = SimulatorConfig::new()
            .with_current_divisor(current_divisor)
            .with_reactive_loss(reactive_loss);
        let mut simulator = CircuitSimulator::with_config(config);
        simulator.load_level(&level).map_err(to_js)?;
        Ok(WasmCircuitGame { simulator })
    }

    /// Id of the loaded level.
    #[wasm_bindgen(getter)]
    pub fn level_id(&self) -> String {
        self.simulator
            .game_state()
            .map(|s| s.level().id().to_string())
            .unwrap_or_default()
    }

    #[wasm_bindgen]
    pub fn place_component(&mut self, id: &str, x: i32, y: i32) -> bool {
        self.simulator.place_component(id, Position::new(x, y))
    }

    #[wasm_bindgen]
    pub fn remove_component(&mut self, id: &str) -> bool {
        self.simulator.remove_component(id)
    }

    #[wasm_bindgen]
    pub fn connect_components(&mut self, from: &str, to: &str) -> bool {
        self.simulator.connect_components(from, to)
    }

    #[wasm_bindgen]
    pub fn disconnect_components(&mut self, from: &str, to: &str) -> bool {
        self.simulator.disconnect_components(from, to)
    }

    #[wasm_bindgen]
    pub fn rotate_component(&mut self, id: &str) -> bool {
        self.simulator.rotate_component(id)
    }

    #[wasm_bindgen]
    pub fn toggle_switch(&mut self, id: &str) -> bool {
        self.simulator.toggle_switch(id)
    }

    /// Return every placed part to the bin.
    #[wasm_bindgen]
    pub fn clear_all(&mut self) {
        self.simulator.clear_all();
    }

    /// Reset the board to the level's optimal solution (used by hints).
    #[wasm_bindgen]
    pub fn load_optimal_solution(&mut self) -> bool {
        self.simulator.load_optimal_solution()
    }

    /// Run a simulation and return the outcome as JSON.
    #[wasm_bindgen]
    pub fn simulate(&mut self) -> Result<String, JsValue> {
        let outcome = self.simulator.simulate();
        to_json(&outcome)
    }

    /// Ids of the parts still in the bin, as a JSON array.
    #[wasm_bindgen]
    pub fn available_components(&self) -> Result<String, JsValue> {
        let ids: Vec<String> = self
            .simulator
            .game_state()
            .map(|s| s.available().iter().map(|c| c.id().to_string()).collect())
            .unwrap_or_default();
        to_json(&ids)
    }

    /// Current wiring as a JSON array of `[from, to]` pairs.
    #[wasm_bindgen]
    pub fn connections(&self) -> Result<String, JsValue> {
        let edges: Vec<(String, String)> = self
            .simulator
            .game_state()
            .map(|s| {
                s.calculator()
                    .connections()
                    .iter()
                    .map(|(a, b)| (a.to_string(), b.to_string()))
                    .collect()
            })
            .unwrap_or_default();
        to_json(&edges)
    }
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
