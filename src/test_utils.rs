//! Level fixtures shared by the test modules.

use crate::circuit::{ComponentType, Position};
use crate::level::{
    AvailableComponentDef, BoardLayout, CircuitDefinition, ConnectionDef, LevelDefinition,
    LevelMetadata, OptimalSolution, SolutionData, SourceDef, TargetDef, ValidationResults,
};

/// Builds levels in code. The source is `SOURCE`, 12 V, 120 EU unless
/// changed.
pub(crate) struct LevelBuilder {
    level: LevelDefinition,
}

impl LevelBuilder {
    pub(crate) fn new(level_id: &str) -> Self {
        Self {
            level: LevelDefinition {
                metadata: LevelMetadata {
                    level_id: level_id.to_string(),
                    difficulty: "medium".to_string(),
                    archetype_tags: vec!["series".to_string()],
                    title: Some(format!("Level {level_id}")),
                    description: None,
                    generated_at: Some("2024-01-01T00:00:00Z".to_string()),
                    generator_version: Some("1.0.0".to_string()),
                },
                circuit_definition: CircuitDefinition {
                    source: SourceDef {
                        id: "SOURCE".to_string(),
                        voltage: 12.0,
                        energy_output: 120.0,
                        is_stable: true,
                        position: Position::new(0, 0),
                    },
                    targets: Vec::new(),
                    available_components: Vec::new(),
                    board_layout: BoardLayout { width: 8, height: 6 },
                },
                solution_data: SolutionData {
                    optimal_solution: OptimalSolution::default(),
                    validation_results: ValidationResults {
                        validation_performed: true,
                    },
                },
            },
        }
    }

    pub(crate) fn source(mut self, voltage: f64, energy_output: f64) -> Self {
        self.level.circuit_definition.source.voltage = voltage;
        self.level.circuit_definition.source.energy_output = energy_output;
        self
    }

    pub(crate) fn target(mut self, id: &str, min: f64, max: f64) -> Self {
        let n = self.level.circuit_definition.targets.len() as i32;
        self.level.circuit_definition.targets.push(TargetDef {
            id: id.to_string(),
            component_type: ComponentType::LedTarget,
            energy_range: vec![min, max],
            color: "red".to_string(),
            position: Position::new(7, n),
        });
        self
    }

    pub(crate) fn component(mut self, def: AvailableComponentDef) -> Self {
        self.level.circuit_definition.available_components.push(def);
        self
    }

    pub(crate) fn solution(
        mut self,
        components: &[&str],
        connections: &[(&str, &str)],
        expected_score: f64,
    ) -> Self {
        self.level.solution_data.optimal_solution = OptimalSolution {
            components_used: components.iter().map(|c| c.to_string()).collect(),
            connections: connections
                .iter()
                .map(|(from, to)| ConnectionDef::new(*from, *to))
                .collect(),
            expected_score,
            simulation_result: None,
        };
        self
    }

    pub(crate) fn build(self) -> LevelDefinition {
        self.level
    }
}

pub(crate) fn resistor_def(id: &str, resistance: f64) -> AvailableComponentDef {
    AvailableComponentDef {
        id: id.to_string(),
        component_type: ComponentType::Resistor,
        nominal_value: resistance,
        actual_value: None,
        quantity: 1,
        is_red_herring: false,
        resistance: Some(resistance),
        is_closed: None,
    }
}

pub(crate) fn capacitor_def(id: &str, value: f64) -> AvailableComponentDef {
    AvailableComponentDef {
        id: id.to_string(),
        component_type: ComponentType::Capacitor,
        nominal_value: value,
        actual_value: Some(value),
        quantity: 1,
        is_red_herring: false,
        resistance: None,
        is_closed: None,
    }
}

pub(crate) fn switch_def(id: &str, closed: bool) -> AvailableComponentDef {
    AvailableComponentDef {
        id: id.to_string(),
        component_type: ComponentType::Switch,
        nominal_value: 0.0,
        actual_value: None,
        quantity: 1,
        is_red_herring: false,
        resistance: None,
        is_closed: Some(closed),
    }
}

/// The 120 EU / [13.5, 16.5] puzzle solved by one resistor losing 105 EU.
pub(crate) fn solved_level(level_id: &str) -> LevelDefinition {
    LevelBuilder::new(level_id)
        .target("TARGET", 13.5, 16.5)
        .component(resistor_def("R1", 105.0 / 144.0))
        .component(capacitor_def("C1", 100.0))
        .solution(&["R1"], &[("SOURCE", "R1"), ("R1", "TARGET")], 12.5)
        .build()
}
