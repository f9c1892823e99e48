//! Opaque identifiers assigned by the game compiler.
//!
//! The kernel never interprets these ids. Definitions assign meaning:
//! a `ZoneId` maps to a `ZoneDef`, an `ActionId` to an `ActionDef`, and
//! so on. Keeping them as small newtypes makes state snapshots compact
//! and comparisons trivial.

use serde::{Deserialize, Serialize};

/// Zone identifier. Definitions declare what zones exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZoneId(pub u16);

impl ZoneId {
    /// Create a new zone ID.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Zone({})", self.0)
    }
}

/// Phase identifier within the turn structure.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PhaseId(pub u16);

impl PhaseId {
    /// Create a new phase ID.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for PhaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Phase({})", self.0)
    }
}

/// Action identifier. Definitions declare the action table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActionId(pub u16);

impl ActionId {
    /// Create a new action ID.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Action({})", self.0)
    }
}

/// Token type identifier (piece kind, chip denomination, card back).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenTypeId(pub u16);

impl TokenTypeId {
    /// Create a new token type ID.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for TokenTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TokenType({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip() {
        assert_eq!(ZoneId::new(7).raw(), 7);
        assert_eq!(PhaseId::new(2).raw(), 2);
        assert_eq!(ActionId::new(9).raw(), 9);
        assert_eq!(TokenTypeId::new(3).raw(), 3);
    }

    #[test]
    fn test_id_ordering() {
        assert!(ZoneId::new(1) < ZoneId::new(2));
        assert!(ActionId::new(0) < ActionId::new(10));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ZoneId::new(4)), "Zone(4)");
        assert_eq!(format!("{}", ActionId::new(1)), "Action(1)");
    }

    #[test]
    fn test_serialization() {
        let id = ZoneId::new(123);
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: ZoneId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
