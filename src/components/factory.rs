//! Builds component instances from level records.

use std::collections::HashSet;

use tracing::debug;

use super::{Capacitor, Component, EnergySource, Inductor, LedTarget, Resistor, Supercapacitor, Switch};
use crate::circuit::{ComponentId, ComponentType};
use crate::error::{CircuitError, Result};
use crate::level::{AvailableComponentDef, LevelDefinition, SourceDef, TargetDef};

/// Every component instance a level needs.
#[derive(Debug, Clone)]
pub struct LevelComponents {
    pub source: EnergySource,
    pub targets: Vec<LedTarget>,
    /// The player's parts bin, one entry per physical part
    pub available: Vec<Component>,
    pub supercapacitor: Supercapacitor,
}

/// Turns level definition records into components.
pub struct ComponentFactory;

impl ComponentFactory {
    /// Build all components for `level`.
    ///
    /// Fails if two components end up with the same id or a record cannot be
    /// turned into a component.
    pub fn build(level: &LevelDefinition) -> Result<LevelComponents> {
        let mut seen = HashSet::new();
        let mut claim = |id: &ComponentId| -> Result<()> {
            if seen.insert(id.clone()) {
                Ok(())
            } else {
                Err(CircuitError::duplicate_component(level.id(), id.as_str()))
            }
        };

        let source = Self::source(level.source());
        claim(&source.id)?;

        let mut targets = Vec::with_capacity(level.targets().len());
        for def in level.targets() {
            let target = Self::target(def)?;
            claim(&target.id)?;
            targets.push(target);
        }

        let supercapacitor = Supercapacitor::new(ComponentId::from(Supercapacitor::DEFAULT_ID));
        claim(&supercapacitor.id)?;

        let mut available = Vec::new();
        for def in level.available_components() {
            for component in Self::available(def)? {
                claim(component.id())?;
                available.push(component);
            }
        }

        debug!(
            level = level.id(),
            targets = targets.len(),
            available = available.len(),
            "built level components"
        );

        Ok(LevelComponents {
            source,
            targets,
            available,
            supercapacitor,
        })
    }

    /// Build the source.
    pub fn source(def: &SourceDef) -> EnergySource {
        let mut source = EnergySource::new(
            ComponentId::new(def.id.clone()),
            def.voltage,
            def.energy_output,
            def.is_stable,
        );
        source.position = def.position;
        source
    }

    /// Build an LED target. The range must have exactly two entries.
    pub fn target(def: &TargetDef) -> Result<LedTarget> {
        if def.component_type != ComponentType::LedTarget {
            return Err(CircuitError::invalid_component(
                &def.id,
                format!("targets must be led-target, got {}", def.component_type),
            ));
        }
        let range = def.range().ok_or_else(|| {
            CircuitError::invalid_component(
                &def.id,
                format!("energy range needs two values, got {}", def.energy_range.len()),
            )
        })?;
        let mut target = LedTarget::new(ComponentId::new(def.id.clone()), range, def.color.clone());
        target.position = def.position;
        Ok(target)
    }

    /// Build every instance of a parts-bin entry, named as in
    /// [`AvailableComponentDef::instance_ids`].
    pub fn available(def: &AvailableComponentDef) -> Result<Vec<Component>> {
        def.instance_ids()
            .into_iter()
            .map(|id| Self::from_def(ComponentId::new(id), def))
            .collect()
    }

    fn from_def(id: ComponentId, def: &AvailableComponentDef) -> Result<Component> {
        let value = def.effective_value();
        match def.component_type {
            ComponentType::Resistor => {
                let resistance = def.resistance.unwrap_or(value);
                Ok(Component::Resistor(Resistor::new(id, def.nominal_value, resistance)))
            }
            ComponentType::Capacitor => Ok(Component::Capacitor(Capacitor::new(
                id,
                def.nominal_value,
                value,
            ))),
            ComponentType::Inductor => Ok(Component::Inductor(Inductor::new(
                id,
                def.nominal_value,
                value,
            ))),
            ComponentType::Switch => {
                let closed = def.is_closed.unwrap_or(true);
                Ok(Component::Switch(Switch::new(id, closed)))
            }
            ComponentType::Source | ComponentType::LedTarget | ComponentType::Supercapacitor => {
                Err(CircuitError::invalid_component(
                    id.as_str(),
                    format!("{} cannot be placed by the player", def.component_type),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{resistor_def, LevelBuilder};

    #[test]
    fn test_build_level_components() {
        let level = LevelBuilder::new("L1")
            .target("T1", 13.5, 16.5)
            .component(resistor_def("R1", 0.5))
            .build();
        let parts = ComponentFactory::build(&level).unwrap();
        assert_eq!(parts.source.energy_output, 120.0);
        assert_eq!(parts.targets.len(), 1);
        assert_eq!(parts.targets[0].energy_range, (13.5, 16.5));
        assert_eq!(parts.available.len(), 1);
        assert_eq!(parts.supercapacitor.stored_energy, 0.0);
    }

    #[test]
    fn test_quantity_expands_ids() {
        let mut def = resistor_def("R1", 2.0);
        def.quantity = 3;
        let parts = ComponentFactory::available(&def).unwrap();
        let ids: Vec<_> = parts.iter().map(|c| c.id().to_string()).collect();
        assert_eq!(ids, vec!["R1", "R1-2", "R1-3"]);

        def.quantity = 0;
        assert!(ComponentFactory::available(&def).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let level = LevelBuilder::new("L1")
            .target("T1", 1.0, 2.0)
            .component(resistor_def("T1", 1.0))
            .build();
        let err = ComponentFactory::build(&level).unwrap_err();
        assert!(matches!(err, CircuitError::DuplicateComponent { .. }));
    }

    #[test]
    fn test_malformed_range_rejected() {
        let mut level = LevelBuilder::new("L1").target("T1", 1.0, 2.0).build();
        level.circuit_definition.targets[0].energy_range = vec![1.0];
        assert!(ComponentFactory::build(&level).is_err());
    }

    #[test]
    fn test_switch_defaults_closed() {
        let def = AvailableComponentDef {
            id: "SW1".to_string(),
            component_type: ComponentType::Switch,
            nominal_value: 0.0,
            actual_value: None,
            quantity: 1,
            is_red_herring: false,
            resistance: None,
            is_closed: None,
        };
        let parts = ComponentFactory::available(&def).unwrap();
        assert!(parts[0].conducts());
    }

    #[test]
    fn test_player_cannot_own_source() {
        let mut def = resistor_def("S2", 1.0);
        def.component_type = ComponentType::Source;
        assert!(ComponentFactory::available(&def).is_err());
    }
}
