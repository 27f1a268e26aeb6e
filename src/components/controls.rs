//! Control components: Switch.

use crate::circuit::{ComponentId, Position, Rotation};

/// A switch component.
///
/// A closed switch is a lossless wire. An open switch cannot be entered by any
/// path, so it is a gate rather than a lossy element.
#[derive(Debug, Clone, PartialEq)]
pub struct Switch {
    pub id: ComponentId,
    pub position: Position,
    pub rotation: Rotation,
    pub closed: bool,
}

impl Switch {
    /// Create a new switch.
    pub fn new(id: ComponentId, closed: bool) -> Self {
        Self {
            id,
            position: Position::default(),
            rotation: Rotation::default(),
            closed,
        }
    }

    /// Whether energy can pass through.
    pub fn conducts(&self) -> bool {
        self.closed
    }

    /// Set the switch state.
    pub fn set_state(&mut self, closed: bool) {
        self.closed = closed;
    }

    /// Toggle the switch state.
    pub fn toggle(&mut self) {
        self.closed = !self.closed;
    }
}
