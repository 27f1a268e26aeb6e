//! Component models for the puzzle board.
//!
//! This module provides every kind of part that can appear in a level:
//! - Preinstalled: Energy Source, LED Target, Supercapacitor
//! - Passive: Resistor, Capacitor, Inductor
//! - Controls: Switch
//!
//! Each component knows how much energy it loses when energy flows through
//! it, and whether it lets energy through at all.

mod controls;
pub mod factory;
mod linear;
mod sources;

pub use controls::Switch;
pub use factory::{ComponentFactory, LevelComponents};
pub use linear::{Capacitor, Inductor, Resistor};
pub use sources::{EnergySource, LedTarget, Supercapacitor};

use crate::circuit::{ComponentId, ComponentType, Position, Rotation};
use crate::error::{CircuitError, Result};

/// Divisor turning energy flow into the current proxy used for resistors.
pub const DEFAULT_CURRENT_DIVISOR: f64 = 10.0;

/// Fraction of the flow lost in a capacitor or inductor.
pub const DEFAULT_REACTIVE_LOSS: f64 = 0.01;

/// Parameters of the path loss model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossModel {
    /// Resistor loss is `(flow / current_divisor)² × R`
    pub current_divisor: f64,
    /// Capacitor and inductor loss is `flow × reactive_loss`
    pub reactive_loss: f64,
}

impl Default for LossModel {
    fn default() -> Self {
        Self {
            current_divisor: DEFAULT_CURRENT_DIVISOR,
            reactive_loss: DEFAULT_REACTIVE_LOSS,
        }
    }
}

/// A circuit component.
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    Source(EnergySource),
    LedTarget(LedTarget),
    Resistor(Resistor),
    Capacitor(Capacitor),
    Inductor(Inductor),
    Switch(Switch),
    Supercapacitor(Supercapacitor),
}

impl Component {
    /// Get the component ID.
    pub fn id(&self) -> &ComponentId {
        match self {
            Component::Source(s) => &s.id,
            Component::LedTarget(t) => &t.id,
            Component::Resistor(r) => &r.id,
            Component::Capacitor(c) => &c.id,
            Component::Inductor(l) => &l.id,
            Component::Switch(s) => &s.id,
            Component::Supercapacitor(s) => &s.id,
        }
    }

    /// Get the component type tag.
    pub fn component_type(&self) -> ComponentType {
        match self {
            Component::Source(_) => ComponentType::Source,
            Component::LedTarget(_) => ComponentType::LedTarget,
            Component::Resistor(_) => ComponentType::Resistor,
            Component::Capacitor(_) => ComponentType::Capacitor,
            Component::Inductor(_) => ComponentType::Inductor,
            Component::Switch(_) => ComponentType::Switch,
            Component::Supercapacitor(_) => ComponentType::Supercapacitor,
        }
    }

    /// Human-readable label for the parts bin.
    pub fn display_name(&self) -> String {
        match self {
            Component::Source(s) => format!("Power Source ({}V)", s.voltage),
            Component::LedTarget(t) => {
                let (min, max) = t.energy_range;
                if t.color.is_empty() {
                    format!("LED ({min}-{max} EU)")
                } else {
                    format!("{} LED ({min}-{max} EU)", t.color)
                }
            }
            Component::Resistor(r) => format!("Resistor ({}Ω)", r.nominal_value),
            Component::Capacitor(c) => format!("Capacitor ({}µF)", c.nominal_value),
            Component::Inductor(l) => format!("Inductor ({}mH)", l.nominal_value),
            Component::Switch(s) => {
                format!("Switch ({})", if s.closed { "closed" } else { "open" })
            }
            Component::Supercapacitor(_) => "Supercapacitor".to_string(),
        }
    }

    pub fn position(&self) -> Position {
        match self {
            Component::Source(s) => s.position,
            Component::LedTarget(t) => t.position,
            Component::Resistor(r) => r.position,
            Component::Capacitor(c) => c.position,
            Component::Inductor(l) => l.position,
            Component::Switch(s) => s.position,
            Component::Supercapacitor(s) => s.position,
        }
    }

    pub fn set_position(&mut self, position: Position) {
        match self {
            Component::Source(s) => s.position = position,
            Component::LedTarget(t) => t.position = position,
            Component::Resistor(r) => r.position = position,
            Component::Capacitor(c) => c.position = position,
            Component::Inductor(l) => l.position = position,
            Component::Switch(s) => s.position = position,
            Component::Supercapacitor(s) => s.position = position,
        }
    }

    pub fn rotation(&self) -> Rotation {
        match self {
            Component::Source(s) => s.rotation,
            Component::LedTarget(t) => t.rotation,
            Component::Resistor(r) => r.rotation,
            Component::Capacitor(c) => c.rotation,
            Component::Inductor(l) => l.rotation,
            Component::Switch(s) => s.rotation,
            Component::Supercapacitor(s) => s.rotation,
        }
    }

    /// Turn the component a quarter turn clockwise.
    pub fn rotate(&mut self) {
        let rotation = match self {
            Component::Source(s) => &mut s.rotation,
            Component::LedTarget(t) => &mut t.rotation,
            Component::Resistor(r) => &mut r.rotation,
            Component::Capacitor(c) => &mut c.rotation,
            Component::Inductor(l) => &mut l.rotation,
            Component::Switch(s) => &mut s.rotation,
            Component::Supercapacitor(s) => &mut s.rotation,
        };
        *rotation = rotation.clockwise();
    }

    /// Whether this part belongs to the level design rather than the player.
    pub fn is_preinstalled(&self) -> bool {
        self.component_type().is_preinstalled()
    }

    /// Whether a path may pass through this component.
    pub fn conducts(&self) -> bool {
        match self {
            Component::Switch(s) => s.conducts(),
            Component::Source(_)
            | Component::LedTarget(_)
            | Component::Resistor(_)
            | Component::Capacitor(_)
            | Component::Inductor(_)
            | Component::Supercapacitor(_) => true,
        }
    }

    /// Energy lost when `flow` EU passes through this component on a path.
    pub fn path_loss(&self, flow: f64, model: &LossModel) -> f64 {
        match self {
            Component::Resistor(r) => r.loss(flow, model.current_divisor),
            Component::Capacitor(c) => c.loss(flow, model.reactive_loss),
            Component::Inductor(l) => l.loss(flow, model.reactive_loss),
            Component::Switch(_)
            | Component::Source(_)
            | Component::LedTarget(_)
            | Component::Supercapacitor(_) => 0.0,
        }
    }

    /// Reject NaN and infinite electrical values.
    pub fn check_finite(&self) -> Result<()> {
        let fields: Vec<(&'static str, f64)> = match self {
            Component::Source(s) => vec![("voltage", s.voltage), ("energy output", s.energy_output)],
            Component::LedTarget(t) => vec![
                ("energy range minimum", t.energy_range.0),
                ("energy range maximum", t.energy_range.1),
            ],
            Component::Resistor(r) => vec![("resistance", r.resistance)],
            Component::Capacitor(c) => vec![("value", c.actual_value)],
            Component::Inductor(l) => vec![("value", l.actual_value)],
            Component::Switch(_) | Component::Supercapacitor(_) => Vec::new(),
        };
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(CircuitError::NonFiniteValue {
                    id: self.id().to_string(),
                    field,
                });
            }
        }
        Ok(())
    }

    pub fn as_switch_mut(&mut self) -> Option<&mut Switch> {
        match self {
            Component::Switch(s) => Some(s),
            _ => None,
        }
    }
}
