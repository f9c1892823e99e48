//! Turn structure configuration.
//!
//! Declares the phase cycle, the seat eligibility order, and the
//! option matrix constraining what the second eligible seat may do
//! given the first seat's choice.

use serde::{Deserialize, Serialize};

use crate::core::{PhaseId, PlayerId};
use crate::turnflow::{ActionClass, OptionMatrixRow};

/// A declared phase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDef {
    /// Phase id.
    pub id: PhaseId,
    /// Human-readable name (diagnostics only).
    pub name: String,
}

impl PhaseDef {
    /// Declare a phase.
    #[must_use]
    pub fn new(id: PhaseId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Turn-order configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnConfig {
    /// Phase cycle, in order. The first entry is the opening phase.
    pub phases: Vec<PhaseDef>,
    /// Seats in eligibility order for each round; the first two
    /// currently-eligible seats become first/second eligible.
    pub eligibility_order: Vec<PlayerId>,
    /// Classes open to the first eligible seat.
    pub first_allowed: Vec<ActionClass>,
    /// Option matrix rows for the second eligible seat.
    pub option_matrix: Vec<OptionMatrixRow>,
}

impl TurnConfig {
    /// Phase following `current` in the cycle, wrapping at the end.
    #[must_use]
    pub fn next_phase(&self, current: PhaseId) -> Option<PhaseId> {
        let idx = self.phases.iter().position(|p| p.id == current)?;
        let next = (idx + 1) % self.phases.len();
        Some(self.phases[next].id)
    }

    /// First two seats in eligibility order that `eligible` admits.
    #[must_use]
    pub fn leading_eligible(
        &self,
        eligible: impl Fn(PlayerId) -> bool,
    ) -> (Option<PlayerId>, Option<PlayerId>) {
        let mut leading = self
            .eligibility_order
            .iter()
            .copied()
            .filter(|&seat| eligible(seat));
        (leading.next(), leading.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TurnConfig {
        TurnConfig {
            phases: vec![
                PhaseDef::new(PhaseId::new(0), "deal"),
                PhaseDef::new(PhaseId::new(1), "act"),
                PhaseDef::new(PhaseId::new(2), "cleanup"),
            ],
            eligibility_order: vec![PlayerId::new(2), PlayerId::new(0), PlayerId::new(1)],
            first_allowed: vec![ActionClass::Event, ActionClass::Operation],
            option_matrix: Vec::new(),
        }
    }

    #[test]
    fn test_next_phase_cycles() {
        let turn = config();
        assert_eq!(turn.next_phase(PhaseId::new(0)), Some(PhaseId::new(1)));
        assert_eq!(turn.next_phase(PhaseId::new(2)), Some(PhaseId::new(0)));
        assert_eq!(turn.next_phase(PhaseId::new(9)), None);
    }

    #[test]
    fn test_leading_eligible_respects_order() {
        let turn = config();
        let (first, second) = turn.leading_eligible(|_| true);
        assert_eq!(first, Some(PlayerId::new(2)));
        assert_eq!(second, Some(PlayerId::new(0)));
    }

    #[test]
    fn test_leading_eligible_skips_ineligible() {
        let turn = config();
        let (first, second) = turn.leading_eligible(|seat| seat != PlayerId::new(2));
        assert_eq!(first, Some(PlayerId::new(0)));
        assert_eq!(second, Some(PlayerId::new(1)));
    }
}
