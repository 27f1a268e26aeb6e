//! Passive components: Resistor, Capacitor, Inductor.

use crate::circuit::{ComponentId, Position, Rotation};

/// A resistor.
///
/// The puzzle loss model uses `flow / 10` as a stand-in for current, so a
/// resistor burns `(flow / 10)² × R` of the energy passing through it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resistor {
    pub id: ComponentId,
    pub position: Position,
    pub rotation: Rotation,
    /// Value printed on the part
    pub nominal_value: f64,
    /// Resistance used by the loss model (ohms)
    pub resistance: f64,
}

impl Resistor {
    /// Create a new resistor.
    pub fn new(id: ComponentId, nominal_value: f64, resistance: f64) -> Self {
        Self {
            id,
            position: Position::default(),
            rotation: Rotation::default(),
            nominal_value,
            // NaN passes through so `check_finite` can report it
            resistance: if resistance < 0.0 { 0.0 } else { resistance },
        }
    }

    /// Energy lost by `flow` EU passing through this resistor.
    ///
    /// Never more than `flow` itself.
    pub fn loss(&self, flow: f64, current_divisor: f64) -> f64 {
        let current = flow / current_divisor;
        (current * current * self.resistance).min(flow)
    }
}

/// A capacitor.
///
/// Stored energy is tracked for display only; in the loss model a capacitor
/// passes energy through with a flat fractional loss.
#[derive(Debug, Clone, PartialEq)]
pub struct Capacitor {
    pub id: ComponentId,
    pub position: Position,
    pub rotation: Rotation,
    pub nominal_value: f64,
    pub actual_value: f64,
    pub stored_energy: f64,
}

impl Capacitor {
    /// Create a new capacitor.
    pub fn new(id: ComponentId, nominal_value: f64, actual_value: f64) -> Self {
        Self {
            id,
            position: Position::default(),
            rotation: Rotation::default(),
            nominal_value,
            actual_value,
            stored_energy: 0.0,
        }
    }

    /// Energy lost by `flow` EU passing through.
    pub fn loss(&self, flow: f64, fraction: f64) -> f64 {
        flow * fraction
    }
}

/// An inductor. Same flat pass-through loss as the capacitor.
#[derive(Debug, Clone, PartialEq)]
pub struct Inductor {
    pub id: ComponentId,
    pub position: Position,
    pub rotation: Rotation,
    pub nominal_value: f64,
    pub actual_value: f64,
}

impl Inductor {
    /// Create a new inductor.
    pub fn new(id: ComponentId, nominal_value: f64, actual_value: f64) -> Self {
        Self {
            id,
            position: Position::default(),
            rotation: Rotation::default(),
            nominal_value,
            actual_value,
        }
    }

    pub fn loss(&self, flow: f64, fraction: f64) -> f64 {
        flow * fraction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_resistor_loss() {
        let r = Resistor::new(ComponentId::from("R1"), 0.5, 0.5);
        // (120 / 10)² × 0.5 = 72
        assert_relative_eq!(r.loss(120.0, 10.0), 72.0);
        assert_relative_eq!(r.loss(0.0, 10.0), 0.0);
    }

    #[test]
    fn test_resistor_loss_capped_at_flow() {
        let r = Resistor::new(ComponentId::from("R1"), 100.0, 100.0);
        assert_relative_eq!(r.loss(120.0, 10.0), 120.0);
    }

    #[test]
    fn test_negative_resistance_clamped() {
        let r = Resistor::new(ComponentId::from("R1"), -3.0, -3.0);
        assert_eq!(r.resistance, 0.0);
        assert_eq!(r.loss(50.0, 10.0), 0.0);
    }

    #[test]
    fn test_reactive_loss_is_flat_fraction() {
        let c = Capacitor::new(ComponentId::from("C1"), 100.0, 98.0);
        let l = Inductor::new(ComponentId::from("L1"), 10.0, 10.0);
        assert_relative_eq!(c.loss(120.0, 0.01), 1.2);
        assert_relative_eq!(l.loss(50.0, 0.01), 0.5);
        assert_eq!(c.stored_energy, 0.0);
    }
}
