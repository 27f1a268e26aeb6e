//! Core types for circuit representation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A unique identifier for a component within a loaded level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(pub String);

impl ComponentId {
    /// Create an id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ComponentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl PartialEq<str> for ComponentId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ComponentId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A cell on the game board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Orientation of a component on the board, in quarter turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Rotation angle in degrees.
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// The next orientation, a quarter turn clockwise.
    pub fn clockwise(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }
}

impl TryFrom<u16> for Rotation {
    type Error = String;

    fn try_from(degrees: u16) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            other => Err(format!("rotation must be 0, 90, 180 or 270 degrees, got {other}")),
        }
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

/// Discriminant for the kinds of component that can appear in a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentType {
    Source,
    LedTarget,
    Resistor,
    Capacitor,
    Inductor,
    Switch,
    Supercapacitor,
}

impl ComponentType {
    /// Whether the level designer places this component (source, targets,
    /// supercapacitor) rather than the player.
    pub fn is_preinstalled(self) -> bool {
        matches!(
            self,
            ComponentType::Source | ComponentType::LedTarget | ComponentType::Supercapacitor
        )
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComponentType::Source => "source",
            ComponentType::LedTarget => "led-target",
            ComponentType::Resistor => "resistor",
            ComponentType::Capacitor => "capacitor",
            ComponentType::Inductor => "inductor",
            ComponentType::Switch => "switch",
            ComponentType::Supercapacitor => "supercapacitor",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_cycles_clockwise() {
        let mut rotation = Rotation::default();
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(rotation.degrees());
            rotation = rotation.clockwise();
        }
        assert_eq!(seen, vec![0, 90, 180, 270]);
        assert_eq!(rotation, Rotation::Deg0);
    }

    #[test]
    fn test_rotation_rejects_odd_angles() {
        assert!(Rotation::try_from(45).is_err());
        let parsed: Rotation = serde_json::from_str("180").unwrap();
        assert_eq!(parsed, Rotation::Deg180);
    }

    #[test]
    fn test_component_type_serde_names() {
        let parsed: ComponentType = serde_json::from_str("\"led-target\"").unwrap();
        assert_eq!(parsed, ComponentType::LedTarget);
        assert_eq!(ComponentType::Supercapacitor.to_string(), "supercapacitor");
        assert!(ComponentType::Source.is_preinstalled());
        assert!(!ComponentType::Switch.is_preinstalled());
    }
}
