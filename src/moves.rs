//! Moves: an action id plus a parameter map.
//!
//! Parameters cover both declared action parameters and synthetic
//! decision keys bound by the decision-sequence resolver. The map is a
//! `BTreeMap` so parameter iteration (and therefore move comparison and
//! display) is canonical.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{ActionId, Value, ZoneId};
use crate::turnflow::ActionClass;

/// Parameter map of a move.
pub type MoveParams = BTreeMap<String, Value>;

/// A proposed or validated move.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Move {
    /// Action to take.
    pub action: ActionId,
    /// Parameter assignment, including synthetic decision keys.
    pub params: MoveParams,
}

impl Move {
    /// Create a move with no parameters.
    #[must_use]
    pub fn new(action: ActionId) -> Self {
        Self {
            action,
            params: MoveParams::new(),
        }
    }

    /// Add a parameter, builder style.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    /// Get a parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// All zone references among the parameter values, in parameter
    /// order. Used by free-operation zone filters. Most moves touch at
    /// most a couple of zones, so this stays off the heap.
    #[must_use]
    pub fn zone_params(&self) -> SmallVec<[ZoneId; 4]> {
        self.params
            .values()
            .filter_map(|v| match v {
                Value::Zone(z) => Some(*z),
                _ => None,
            })
            .collect()
    }
}

/// An enumerated move with its turn-flow classification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalMove {
    /// The move itself.
    pub mv: Move,
    /// Turn-flow class admitted by the option matrix.
    pub class: ActionClass,
    /// True when this variant is covered by a free-operation grant.
    pub free_operation: bool,
}

impl LegalMove {
    /// Wrap a move with its class.
    #[must_use]
    pub fn new(mv: Move, class: ActionClass) -> Self {
        Self {
            mv,
            class,
            free_operation: false,
        }
    }

    /// Mark as a free-operation variant.
    #[must_use]
    pub fn as_free_operation(mut self) -> Self {
        self.free_operation = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_builder() {
        let mv = Move::new(ActionId::new(2))
            .with_param("zone", Value::Zone(ZoneId::new(1)))
            .with_param("amount", Value::Int(3));

        assert_eq!(mv.param("amount"), Some(&Value::Int(3)));
        assert_eq!(mv.param("missing"), None);
    }

    #[test]
    fn test_zone_params() {
        let mv = Move::new(ActionId::new(2))
            .with_param("from", Value::Zone(ZoneId::new(1)))
            .with_param("to", Value::Zone(ZoneId::new(4)))
            .with_param("amount", Value::Int(3));

        assert_eq!(
            mv.zone_params().as_slice(),
            &[ZoneId::new(1), ZoneId::new(4)]
        );
    }

    #[test]
    fn test_moves_order_canonically() {
        let a = Move::new(ActionId::new(1)).with_param("x", Value::Int(1));
        let b = Move::new(ActionId::new(1)).with_param("x", Value::Int(2));
        let c = Move::new(ActionId::new(2));

        let mut moves = vec![c.clone(), b.clone(), a.clone()];
        moves.sort();
        assert_eq!(moves, vec![a, b, c]);
    }

    #[test]
    fn test_free_operation_flag() {
        let legal = LegalMove::new(Move::new(ActionId::new(1)), ActionClass::Operation)
            .as_free_operation();
        assert!(legal.free_operation);
    }
}
