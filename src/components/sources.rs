//! Preinstalled components: energy source, LED targets and the supercapacitor.

use crate::circuit::{ComponentId, Position, Rotation};

/// The level's energy source.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergySource {
    pub id: ComponentId,
    pub position: Position,
    pub rotation: Rotation,
    pub voltage: f64,
    /// Total EU available to one simulation
    pub energy_output: f64,
    pub is_stable: bool,
}

impl EnergySource {
    /// Create a new source.
    pub fn new(id: ComponentId, voltage: f64, energy_output: f64, is_stable: bool) -> Self {
        Self {
            id,
            position: Position::default(),
            rotation: Rotation::default(),
            voltage,
            energy_output,
            is_stable,
        }
    }
}

/// An LED the player has to light.
#[derive(Debug, Clone, PartialEq)]
pub struct LedTarget {
    pub id: ComponentId,
    pub position: Position,
    pub rotation: Rotation,
    /// Inclusive sweet spot `[min, max]` in EU
    pub energy_range: (f64, f64),
    pub color: String,
    /// Energy delivered by the last simulation
    pub current_energy: f64,
}

impl LedTarget {
    /// Create a new LED target.
    pub fn new(id: ComponentId, energy_range: (f64, f64), color: impl Into<String>) -> Self {
        Self {
            id,
            position: Position::default(),
            rotation: Rotation::default(),
            energy_range,
            color: color.into(),
            current_energy: 0.0,
        }
    }

    /// Whether `energy` lies in the sweet spot. Both bounds are inclusive.
    pub fn is_in_sweet_spot(&self, energy: f64) -> bool {
        let (min, max) = self.energy_range;
        energy >= min && energy <= max
    }

    /// Whether the last simulation lit this target.
    pub fn is_lit(&self) -> bool {
        self.is_in_sweet_spot(self.current_energy)
    }
}

/// The energy sink whose stored amount is the player's score.
#[derive(Debug, Clone, PartialEq)]
pub struct Supercapacitor {
    pub id: ComponentId,
    pub position: Position,
    pub rotation: Rotation,
    pub stored_energy: f64,
}

impl Supercapacitor {
    /// Id given to the supercapacitor every level gets.
    pub const DEFAULT_ID: &'static str = "SUPERCAPACITOR";

    /// Create an empty supercapacitor.
    pub fn new(id: ComponentId) -> Self {
        Self {
            id,
            position: Position::default(),
            rotation: Rotation::default(),
            stored_energy: 0.0,
        }
    }

    /// Bank `energy`; non-positive amounts are ignored.
    pub fn store(&mut self, energy: f64) {
        if energy > 0.0 {
            self.stored_energy += energy;
        }
    }

    /// Empty the supercapacitor.
    pub fn reset(&mut self) {
        self.stored_energy = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweet_spot_bounds_inclusive() {
        let led = LedTarget::new(ComponentId::from("T"), (13.5, 16.5), "red");
        assert!(led.is_in_sweet_spot(13.5));
        assert!(led.is_in_sweet_spot(16.5));
        assert!(led.is_in_sweet_spot(15.0));
        assert!(!led.is_in_sweet_spot(13.499));
        assert!(!led.is_in_sweet_spot(16.501));
    }

    #[test]
    fn test_supercapacitor_ignores_negative_store() {
        let mut cap = Supercapacitor::new(ComponentId::from(Supercapacitor::DEFAULT_ID));
        cap.store(-5.0);
        assert_eq!(cap.stored_energy, 0.0);
        cap.store(12.0);
        cap.store(3.0);
        assert_eq!(cap.stored_energy, 15.0);
        cap.reset();
        assert_eq!(cap.stored_energy, 0.0);
    }
}
