//! Main simulator interface.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::energy::EnergyCalculator;
use super::result::SimulationResult;
use crate::circuit::{ComponentId, Position};
use crate::components::{Component, ComponentFactory, EnergySource, LedTarget, LossModel, Supercapacitor};
use crate::error::Result;
use crate::level::LevelDefinition;

/// Configuration for the simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    /// Where [`CircuitSimulator::load_optimal_solution`] puts every part.
    pub default_position: Position,
    /// Loss model handed to every energy calculator.
    pub loss_model: LossModel,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            default_position: Position::new(0, 0),
            loss_model: LossModel::default(),
        }
    }
}

impl SimulatorConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the position used when placing an optimal solution.
    pub fn with_default_position(mut self, position: Position) -> Self {
        self.default_position = position;
        self
    }

    /// Set the divisor for the resistor current proxy.
    pub fn with_current_divisor(mut self, divisor: f64) -> Self {
        self.loss_model.current_divisor = divisor;
        self
    }

    /// Set the fractional loss of capacitors and inductors.
    ///
    /// - 0.01 (default): 1% per reactive part
    /// - 0.0: reactive parts are plain wires
    pub fn with_reactive_loss(mut self, fraction: f64) -> Self {
        self.loss_model.reactive_loss = fraction;
        self
    }
}

/// A simulation result as presented to the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub result: SimulationResult,
    /// Every target is lit
    pub is_complete: bool,
    /// Efficiency percentage, 0 to 100
    pub score: f64,
    pub message: String,
}

impl SimulationOutcome {
    fn from_result(result: SimulationResult, target_count: usize) -> Self {
        let lit = result.targets_lit.len();
        let is_complete = target_count > 0 && lit == target_count;
        let message = if is_complete {
            "Level completed!".to_string()
        } else if lit == 0 {
            "No targets are lit. Try adjusting your circuit.".to_string()
        } else {
            format!("{lit}/{target_count} targets lit. Keep trying!")
        };
        Self {
            score: result.efficiency(),
            result,
            is_complete,
            message,
        }
    }
}

/// Everything about the level currently being played.
#[derive(Debug, Clone)]
pub struct GameState {
    level: LevelDefinition,
    /// Parts not yet on the board
    available: Vec<Component>,
    /// Ids of parts on the board, in placement order
    placed: Vec<ComponentId>,
    calculator: EnergyCalculator,
}

impl GameState {
    pub fn level(&self) -> &LevelDefinition {
        &self.level
    }

    pub fn source(&self) -> &EnergySource {
        self.calculator.source()
    }

    pub fn targets(&self) -> &[LedTarget] {
        self.calculator.targets()
    }

    pub fn supercapacitor(&self) -> &Supercapacitor {
        self.calculator.supercapacitor()
    }

    /// Parts still in the bin.
    pub fn available(&self) -> &[Component] {
        &self.available
    }

    /// Parts on the board, in placement order.
    pub fn placed(&self) -> impl Iterator<Item = &Component> {
        self.placed.iter().filter_map(|id| self.calculator.component(id))
    }

    pub fn placed_ids(&self) -> &[ComponentId] {
        &self.placed
    }

    pub fn calculator(&self) -> &EnergyCalculator {
        &self.calculator
    }

    pub fn is_placed(&self, id: &ComponentId) -> bool {
        self.placed.contains(id)
    }
}

/// The engine's facade: loads levels, applies player actions and runs
/// simulations.
///
/// Mutating calls return `false` instead of failing when a precondition does
/// not hold (unknown id, part already placed, self-connection).
#[derive(Debug, Clone, Default)]
pub struct CircuitSimulator {
    config: SimulatorConfig,
    state: Option<GameState>,
}

impl CircuitSimulator {
    /// Create a simulator with default configuration and no level.
    pub fn new() -> Self {
        Self::with_config(SimulatorConfig::default())
    }

    /// Create a simulator with custom configuration.
    pub fn with_config(config: SimulatorConfig) -> Self {
        Self { config, state: None }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// The current game state, if a level is loaded.
    pub fn game_state(&self) -> Option<&GameState> {
        self.state.as_ref()
    }

    /// Load `level`, replacing whatever was loaded before.
    pub fn load_level(&mut self, level: &LevelDefinition) -> Result<()> {
        let parts = ComponentFactory::build(level)?;
        let calculator = EnergyCalculator::new(parts.source, parts.targets, parts.supercapacitor)
            .with_loss_model(self.config.loss_model);
        info!(
            level = level.id(),
            available = parts.available.len(),
            "level loaded"
        );
        self.state = Some(GameState {
            level: level.clone(),
            available: parts.available,
            placed: Vec::new(),
            calculator,
        });
        Ok(())
    }

    /// Move a part from the bin onto the board at `position`.
    pub fn place_component(&mut self, id: &str, position: Position) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        let Some(index) = state.available.iter().position(|c| c.id() == id) else {
            debug!(id, "place rejected: not available");
            return false;
        };
        let mut component = state.available.remove(index);
        component.set_position(position);
        let component_id = component.id().clone();
        if !state.calculator.add_component(component.clone()) {
            state.available.insert(index, component);
            return false;
        }
        state.placed.push(component_id);
        true
    }

    /// Take a part off the board and back into the bin, dropping its wires.
    pub fn remove_component(&mut self, id: &str) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        let id = ComponentId::from(id);
        let Some(index) = state.placed.iter().position(|p| *p == id) else {
            debug!(%id, "remove rejected: not placed");
            return false;
        };
        state.calculator.remove_connections(&id);
        let Some(component) = state.calculator.remove_component(&id) else {
            return false;
        };
        state.placed.remove(index);
        state.available.push(component);
        true
    }

    /// Wire two parts together.
    pub fn connect_components(&mut self, from: &str, to: &str) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        if from == to {
            return false;
        }
        state
            .calculator
            .add_connection(&ComponentId::from(from), &ComponentId::from(to))
    }

    /// Remove the wire between two parts.
    pub fn disconnect_components(&mut self, from: &str, to: &str) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        if from == to {
            return false;
        }
        state
            .calculator
            .remove_connection(&ComponentId::from(from), &ComponentId::from(to))
    }

    /// Turn a placed part a quarter turn clockwise.
    pub fn rotate_component(&mut self, id: &str) -> bool {
        match self.placed_component_mut(id) {
            Some(component) => {
                component.rotate();
                true
            }
            None => false,
        }
    }

    /// Flip a placed switch.
    pub fn toggle_switch(&mut self, id: &str) -> bool {
        match self.placed_component_mut(id).and_then(Component::as_switch_mut) {
            Some(switch) => {
                switch.toggle();
                true
            }
            None => false,
        }
    }

    fn placed_component_mut(&mut self, id: &str) -> Option<&mut Component> {
        self.state
            .as_mut()?
            .calculator
            .component_mut(&ComponentId::from(id))
    }

    /// Run the energy calculator and derive the player-facing outcome.
    pub fn simulate(&mut self) -> SimulationOutcome {
        let Some(state) = self.state.as_mut() else {
            return SimulationOutcome::from_result(SimulationResult::failed(0.0, "No level loaded"), 0);
        };
        let result = state.calculator.simulate();
        let outcome = SimulationOutcome::from_result(result, state.calculator.targets().len());
        debug!(
            level = state.level.id(),
            complete = outcome.is_complete,
            score = outcome.score,
            "simulated"
        );
        outcome
    }

    /// Reset the board and apply the level's recorded optimal solution.
    ///
    /// Every part goes to the configured default position. Returns `true`
    /// only if every placement and connection succeeded.
    pub fn load_optimal_solution(&mut self) -> bool {
        let Some(solution) = self
            .state
            .as_ref()
            .map(|s| s.level.optimal_solution().clone())
        else {
            return false;
        };
        self.clear_all();

        let position = self.config.default_position;
        let mut ok = true;
        for id in &solution.components_used {
            if !self.place_component(id, position) {
                warn!(id = id.as_str(), "optimal solution part could not be placed");
                ok = false;
            }
        }
        for connection in &solution.connections {
            if !self.connect_components(&connection.from, &connection.to) {
                warn!(
                    from = connection.from.as_str(),
                    to = connection.to.as_str(),
                    "optimal solution connection could not be made"
                );
                ok = false;
            }
        }
        ok
    }

    /// Return every placed part to the bin and rebuild the calculator.
    pub fn clear_all(&mut self) {
        let Some(state) = self.state.take() else {
            return;
        };
        let GameState {
            level,
            mut available,
            placed,
            calculator,
        } = state;

        let mut parts = calculator.into_parts();
        for id in &placed {
            if let Some(index) = parts.components.iter().position(|c| c.id() == id) {
                available.push(parts.components.swap_remove(index));
            }
        }
        for target in &mut parts.targets {
            target.current_energy = 0.0;
        }

        let supercapacitor = Supercapacitor::new(ComponentId::from(Supercapacitor::DEFAULT_ID));
        let calculator = EnergyCalculator::new(parts.source, parts.targets, supercapacitor)
            .with_loss_model(self.config.loss_model);
        self.state = Some(GameState {
            level,
            available,
            placed: Vec::new(),
            calculator,
        });
    }

    /// Look a component up by id: source, then targets, then the
    /// supercapacitor, then placed parts.
    pub fn find_component(&self, id: &str) -> Option<Component> {
        let calculator = &self.state.as_ref()?.calculator;
        if calculator.source().id == id {
            return Some(Component::Source(calculator.source().clone()));
        }
        if let Some(target) = calculator.targets().iter().find(|t| t.id == id) {
            return Some(Component::LedTarget(target.clone()));
        }
        if calculator.supercapacitor().id == id {
            return Some(Component::Supercapacitor(calculator.supercapacitor().clone()));
        }
        calculator.component(&ComponentId::from(id)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::ConnectionDef;
    use crate::test_utils::{resistor_def, switch_def, LevelBuilder};
    use approx::assert_relative_eq;

    fn loaded(level: &LevelDefinition) -> CircuitSimulator {
        let mut sim = CircuitSimulator::new();
        sim.load_level(level).unwrap();
        sim
    }

    fn single_target_level() -> LevelDefinition {
        LevelBuilder::new("L1")
            .target("TARGET", 13.5, 16.5)
            .component(resistor_def("R1", 105.0 / 144.0))
            .component(resistor_def("R2", 0.5))
            .component(switch_def("SW1", true))
            .build()
    }

    #[test]
    fn test_place_moves_available_to_placed() {
        let mut sim = loaded(&single_target_level());
        assert!(sim.place_component("R1", Position::new(2, 3)));
        assert!(!sim.place_component("R1", Position::new(4, 4)));
        assert!(!sim.place_component("NOPE", Position::new(0, 0)));

        let state = sim.game_state().unwrap();
        assert_eq!(state.placed_ids(), &[ComponentId::from("R1")]);
        assert_eq!(state.available().len(), 2);
        assert_eq!(sim.find_component("R1").unwrap().position(), Position::new(2, 3));
    }

    #[test]
    fn test_connections_are_symmetric() {
        let mut sim = loaded(&single_target_level());
        sim.place_component("R1", Position::new(1, 1));
        assert!(sim.connect_components("SOURCE", "R1"));
        let calc = sim.game_state().unwrap().calculator();
        assert_eq!(calc.neighbors(&ComponentId::from("SOURCE")), &[ComponentId::from("R1")]);
        assert_eq!(calc.neighbors(&ComponentId::from("R1")), &[ComponentId::from("SOURCE")]);

        assert!(sim.disconnect_components("R1", "SOURCE"));
        let calc = sim.game_state().unwrap().calculator();
        assert!(calc.neighbors(&ComponentId::from("SOURCE")).is_empty());
        assert!(calc.neighbors(&ComponentId::from("R1")).is_empty());
    }

    #[test]
    fn test_connect_rejects_bad_requests() {
        let mut sim = loaded(&single_target_level());
        assert!(!sim.connect_components("SOURCE", "SOURCE"));
        // R1 is still in the bin
        assert!(!sim.connect_components("SOURCE", "R1"));
        assert!(!sim.connect_components("SOURCE", "GHOST"));
        assert!(sim.connect_components("SOURCE", "TARGET"));
    }

    #[test]
    fn test_remove_component_drops_its_wires() {
        let mut sim = loaded(&single_target_level());
        sim.place_component("R1", Position::new(1, 1));
        sim.connect_components("SOURCE", "R1");
        sim.connect_components("R1", "TARGET");

        assert!(sim.remove_component("R1"));
        assert!(!sim.remove_component("R1"));
        let state = sim.game_state().unwrap();
        assert!(state.calculator().connections().is_empty());
        assert!(state.available().iter().any(|c| c.id() == "R1"));
        assert!(state.placed_ids().is_empty());
    }

    #[test]
    fn test_preinstalled_cannot_be_removed() {
        let mut sim = loaded(&single_target_level());
        sim.connect_components("SOURCE", "TARGET");
        assert!(!sim.remove_component("SOURCE"));
        assert!(!sim.remove_component("TARGET"));
        assert!(!sim.remove_component(Supercapacitor::DEFAULT_ID));
        assert_eq!(sim.game_state().unwrap().calculator().connections().len(), 1);
    }

    #[test]
    fn test_simulate_completion_message() {
        let mut sim = loaded(&single_target_level());
        sim.place_component("R1", Position::new(1, 1));
        sim.connect_components("SOURCE", "R1");
        sim.connect_components("R1", "TARGET");
        let outcome = sim.simulate();

        assert!(outcome.is_complete);
        assert_eq!(outcome.message, "Level completed!");
        assert_relative_eq!(outcome.score, 12.5, epsilon = 1e-9);
    }

    #[test]
    fn test_simulate_messages_for_partial_and_none() {
        let level = LevelBuilder::new("L2")
            .target("T1", 100.0, 130.0)
            .target("T2", 1.0, 2.0)
            .build();
        let mut sim = loaded(&level);
        assert_eq!(
            sim.simulate().message,
            "No targets are lit. Try adjusting your circuit."
        );
        sim.connect_components("SOURCE", "T1");
        let outcome = sim.simulate();
        assert!(!outcome.is_complete);
        assert_eq!(outcome.message, "1/2 targets lit. Keep trying!");
    }

    #[test]
    fn test_simulate_without_level() {
        let mut sim = CircuitSimulator::new();
        let outcome = sim.simulate();
        assert!(!outcome.result.is_valid);
        assert_eq!(outcome.result.errors, vec!["No level loaded".to_string()]);
        assert!(!sim.place_component("R1", Position::default()));
    }

    #[test]
    fn test_toggle_and_rotate_placed_parts() {
        let mut sim = loaded(&single_target_level());
        assert!(!sim.toggle_switch("SW1"));
        sim.place_component("SW1", Position::new(0, 1));
        sim.place_component("R2", Position::new(0, 2));
        sim.connect_components("SOURCE", "SW1");
        sim.connect_components("SW1", "TARGET");

        assert!(sim.toggle_switch("SW1"));
        let outcome = sim.simulate();
        assert!(outcome.result.errors.iter().any(|e| e.contains("No valid path")));

        assert!(!sim.toggle_switch("R2"));
        assert!(sim.rotate_component("R2"));
        assert_eq!(
            sim.find_component("R2").unwrap().rotation(),
            crate::circuit::Rotation::Deg90
        );
    }

    #[test]
    fn test_clear_all_returns_everything() {
        let mut sim = loaded(&single_target_level());
        sim.place_component("R1", Position::new(1, 1));
        sim.place_component("R2", Position::new(1, 2));
        sim.connect_components("SOURCE", "R1");
        sim.connect_components("R1", "TARGET");
        sim.simulate();

        sim.clear_all();
        let state = sim.game_state().unwrap();
        assert!(state.placed_ids().is_empty());
        assert_eq!(state.available().len(), 3);
        assert!(state.calculator().connections().is_empty());
        assert_eq!(state.supercapacitor().stored_energy, 0.0);
        assert_eq!(state.targets()[0].current_energy, 0.0);
    }

    #[test]
    fn test_load_optimal_solution() {
        let level = LevelBuilder::new("L1")
            .target("TARGET", 13.5, 16.5)
            .component(resistor_def("R1", 105.0 / 144.0))
            .component(resistor_def("R2", 0.5))
            .solution(
                &["R1"],
                &[("SOURCE", "R1"), ("R1", "TARGET")],
                12.5,
            )
            .build();
        let mut sim = CircuitSimulator::with_config(
            SimulatorConfig::new().with_default_position(Position::new(4, 4)),
        );
        sim.load_level(&level).unwrap();
        sim.place_component("R2", Position::new(0, 0));

        assert!(sim.load_optimal_solution());
        let state = sim.game_state().unwrap();
        assert_eq!(state.placed_ids(), &[ComponentId::from("R1")]);
        assert_eq!(sim.find_component("R1").unwrap().position(), Position::new(4, 4));
        assert!(sim.simulate().is_complete);
    }

    #[test]
    fn test_optimal_solution_with_bad_reference() {
        let mut level = single_target_level();
        level.solution_data.optimal_solution.components_used = vec!["R9".to_string()];
        level.solution_data.optimal_solution.connections = vec![ConnectionDef::new("SOURCE", "R9")];
        let mut sim = loaded(&level);
        assert!(!sim.load_optimal_solution());
    }

    #[test]
    fn test_find_component_priority() {
        let sim = loaded(&single_target_level());
        assert!(matches!(sim.find_component("SOURCE"), Some(Component::Source(_))));
        assert!(matches!(sim.find_component("TARGET"), Some(Component::LedTarget(_))));
        assert!(matches!(
            sim.find_component(Supercapacitor::DEFAULT_ID),
            Some(Component::Supercapacitor(_))
        ));
        // Parts still in the bin are not on the board
        assert!(sim.find_component("R1").is_none());
    }

    #[test]
    fn test_reload_replaces_state() {
        let mut sim = loaded(&single_target_level());
        sim.place_component("R1", Position::new(1, 1));
        let other = LevelBuilder::new("L9").target("T9", 1.0, 2.0).build();
        sim.load_level(&other).unwrap();
        let state = sim.game_state().unwrap();
        assert_eq!(state.level().id(), "L9");
        assert!(state.placed_ids().is_empty());
        assert!(state.available().is_empty());
    }

    #[test]
    fn test_custom_loss_model() {
        let config = SimulatorConfig::new().with_current_divisor(20.0).with_reactive_loss(0.0);
        assert_eq!(config.loss_model.current_divisor, 20.0);
        let mut sim = CircuitSimulator::with_config(config);
        sim.load_level(&single_target_level()).unwrap();
        sim.place_component("R2", Position::new(1, 1));
        sim.connect_components("SOURCE", "R2");
        sim.connect_components("R2", "TARGET");
        // (120 / 20)² × 0.5 = 18
        let result = sim.simulate().result;
        assert_relative_eq!(result.total_energy_used, 18.0);
    }
}
