//! Action definitions: the verbs of a game.
//!
//! An action declares who may take it (actor/executor selectors), when
//! (phases, limits, precondition), with what parameters (each a query
//! domain), and what happens (an effect list, or per-branch effect
//! lists for card events). The enumerator turns these declarations into
//! concrete legal moves.

use serde::{Deserialize, Serialize};

use crate::core::{ActionId, PhaseId, PlayerId};
use crate::effects::Effect;
use crate::eval::{CondExpr, Query};
use crate::turnflow::ActionClass;

use super::pipeline::PipelineId;

/// Selector resolving to a seat.
///
/// `Param`/`Binding` selectors may be unresolvable mid-enumeration
/// (the referenced name is bound later in the cross product); that
/// raises a *deferred* unbound-selector error, fatal only at execution
/// boundaries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerSelector {
    /// The seat whose turn it is.
    Active,
    /// A fixed seat.
    Seat(PlayerId),
    /// Seat named by a move parameter.
    Param(String),
    /// Seat named by an effect binding.
    Binding(String),
}

/// Scope of an action limit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LimitScope {
    /// Per turn.
    Turn,
    /// Per round/card.
    Round,
    /// Per phase visit.
    Phase,
    /// Per game.
    Game,
}

impl LimitScope {
    /// Stable key fragment for usage counters.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            LimitScope::Turn => "turn",
            LimitScope::Round => "round",
            LimitScope::Phase => "phase",
            LimitScope::Game => "game",
        }
    }
}

/// How often an action may be taken within a scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLimit {
    /// Counting scope.
    pub scope: LimitScope,
    /// Maximum uses within the scope.
    pub max: u32,
}

/// A declared action parameter with its value domain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDef {
    /// Parameter name (key in the move's parameter map).
    pub name: String,
    /// Domain query; evaluated against the partial binding built so
    /// far, so later parameters may reference earlier ones.
    pub domain: Query,
}

impl ParamDef {
    /// Declare a parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, domain: Query) -> Self {
        Self {
            name: name.into(),
            domain,
        }
    }
}

/// One side/branch of a card event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventBranch {
    /// Branch id, stored in the move's synthetic branch parameter.
    pub id: String,
    /// Effects replacing the action's base effect list.
    pub effects: Vec<Effect>,
}

impl EventBranch {
    /// Declare a branch.
    #[must_use]
    pub fn new(id: impl Into<String>, effects: Vec<Effect>) -> Self {
        Self {
            id: id.into(),
            effects,
        }
    }
}

/// Synthetic move-parameter key holding the chosen event branch.
pub const BRANCH_PARAM: &str = "event-branch";

/// A complete action definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDef {
    /// Action id.
    pub id: ActionId,
    /// Human-readable name (diagnostics only).
    pub name: String,
    /// Phases the action is available in; empty means any phase.
    pub phases: Vec<PhaseId>,
    /// Who initiates the action.
    pub actor: PlayerSelector,
    /// Who executes the effects, when different from the actor.
    pub executor: Option<PlayerSelector>,
    /// Candidate turn-flow classes; the option matrix admits a subset.
    pub classes: Vec<ActionClass>,
    /// Declared parameters, in cross-product order.
    pub params: Vec<ParamDef>,
    /// Precondition over a full parameter assignment, checked at the
    /// leaf of the cross product.
    pub precondition: Option<CondExpr>,
    /// Effect list run on execution.
    pub effects: Vec<Effect>,
    /// Per-scope usage limit.
    pub limit: Option<ActionLimit>,
    /// Pipeline the action dispatches through.
    pub pipeline: Option<PipelineId>,
    /// Card-event branches; non-empty marks this action as a card
    /// event with per-branch effect lists.
    pub event_branches: Vec<EventBranch>,
}

impl ActionDef {
    /// Create an action available to the active seat in any phase.
    #[must_use]
    pub fn new(id: ActionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            phases: Vec::new(),
            actor: PlayerSelector::Active,
            executor: None,
            classes: vec![ActionClass::Operation],
            params: Vec::new(),
            precondition: None,
            effects: Vec::new(),
            limit: None,
            pipeline: None,
            event_branches: Vec::new(),
        }
    }

    /// Restrict to specific phases.
    #[must_use]
    pub fn in_phases(mut self, phases: impl IntoIterator<Item = PhaseId>) -> Self {
        self.phases = phases.into_iter().collect();
        self
    }

    /// Set candidate turn-flow classes.
    #[must_use]
    pub fn with_classes(mut self, classes: impl IntoIterator<Item = ActionClass>) -> Self {
        self.classes = classes.into_iter().collect();
        self
    }

    /// Add a parameter.
    #[must_use]
    pub fn with_param(mut self, param: ParamDef) -> Self {
        self.params.push(param);
        self
    }

    /// Set the precondition.
    #[must_use]
    pub fn with_precondition(mut self, cond: CondExpr) -> Self {
        self.precondition = Some(cond);
        self
    }

    /// Set the effect list.
    #[must_use]
    pub fn with_effects(mut self, effects: Vec<Effect>) -> Self {
        self.effects = effects;
        self
    }

    /// Set the usage limit.
    #[must_use]
    pub fn with_limit(mut self, scope: LimitScope, max: u32) -> Self {
        self.limit = Some(ActionLimit { scope, max });
        self
    }

    /// Route through a pipeline.
    #[must_use]
    pub fn with_pipeline(mut self, pipeline: PipelineId) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Add card-event branches.
    #[must_use]
    pub fn with_branches(mut self, branches: Vec<EventBranch>) -> Self {
        self.event_branches = branches;
        self
    }

    /// Is this action a card event?
    #[must_use]
    pub fn is_event(&self) -> bool {
        !self.event_branches.is_empty()
    }

    /// Is the action available in `phase`?
    #[must_use]
    pub fn available_in(&self, phase: PhaseId) -> bool {
        self.phases.is_empty() || self.phases.contains(&phase)
    }

    /// The effect list for a chosen branch, or the base list.
    #[must_use]
    pub fn effects_for_branch(&self, branch: Option<&str>) -> Option<&[Effect]> {
        match branch {
            Some(id) => self
                .event_branches
                .iter()
                .find(|b| b.id == id)
                .map(|b| b.effects.as_slice()),
            None => Some(self.effects.as_slice()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let action = ActionDef::new(ActionId::new(1), "march")
            .in_phases([PhaseId::new(0)])
            .with_classes([ActionClass::Operation, ActionClass::LimitedOperation])
            .with_limit(LimitScope::Turn, 2);

        assert!(action.available_in(PhaseId::new(0)));
        assert!(!action.available_in(PhaseId::new(1)));
        assert_eq!(action.classes.len(), 2);
        assert_eq!(
            action.limit,
            Some(ActionLimit {
                scope: LimitScope::Turn,
                max: 2
            })
        );
    }

    #[test]
    fn test_any_phase_when_unrestricted() {
        let action = ActionDef::new(ActionId::new(1), "pass");
        assert!(action.available_in(PhaseId::new(7)));
    }

    #[test]
    fn test_branch_effects() {
        let action = ActionDef::new(ActionId::new(1), "card").with_branches(vec![
            EventBranch::new("unshaded", vec![]),
            EventBranch::new("shaded", vec![]),
        ]);

        assert!(action.is_event());
        assert!(action.effects_for_branch(Some("shaded")).is_some());
        assert!(action.effects_for_branch(Some("missing")).is_none());
        assert!(action.effects_for_branch(None).is_some());
    }

    #[test]
    fn test_limit_scope_keys() {
        assert_eq!(LimitScope::Turn.key(), "turn");
        assert_eq!(LimitScope::Game.key(), "game");
    }
}
