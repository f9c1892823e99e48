//! Effect application results and pending choices.

use serde::{Deserialize, Serialize};

use crate::core::{GameState, RngState, Value};
use crate::eval::Bindings;

use super::trace::EngineEvent;

/// What kind of widget a pending choice renders as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChoiceKind {
    /// Pick exactly one option.
    One,
    /// Pick between `min` and `max` options.
    Many,
}

/// One option in a pending choice's evaluated domain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    /// The option value; binding it at the decision id continues the
    /// sequence.
    pub value: Value,
    /// Speculative legality: whether the option passed the decision's
    /// per-option condition when the domain was listed. Listing never
    /// mutates state, so this is a prediction, not a guarantee.
    pub legal: bool,
}

/// A decision request surfaced in discovery mode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingChoice {
    /// Fully-substituted decision id; bind the selection at this key.
    pub decision: String,
    /// Widget kind.
    pub kind: ChoiceKind,
    /// Evaluated option domain, in evaluation order.
    pub options: Vec<ChoiceOption>,
    /// Minimum selections (`Many` only; 1 for `One`).
    pub min: usize,
    /// Maximum selections (`Many` only; 1 for `One`).
    pub max: usize,
}

impl PendingChoice {
    /// First legal option, if any.
    #[must_use]
    pub fn first_legal(&self) -> Option<&Value> {
        self.options.iter().find(|o| o.legal).map(|o| &o.value)
    }

    /// Is `value` in the evaluated domain (legal or not)?
    #[must_use]
    pub fn in_domain(&self, value: &Value) -> bool {
        self.options.iter().any(|o| &o.value == value)
    }
}

/// Result of applying one effect (or effect list).
#[derive(Clone, Debug)]
pub struct EffectResult {
    /// State after application.
    pub state: GameState,
    /// RNG after application.
    pub rng: RngState,
    /// Bindings after application. Changes only for binder-introducing
    /// effects; enclosing scopes reabsorb only the exported subset.
    pub bindings: Bindings,
    /// Events emitted, in order.
    pub events: Vec<EngineEvent>,
    /// Set when discovery reached an unbound decision; the walk stopped
    /// there and `state`/`rng` are untouched by the decision itself.
    pub pending: Option<PendingChoice>,
}

impl EffectResult {
    /// A result that leaves everything unchanged.
    #[must_use]
    pub fn unchanged(state: GameState, rng: RngState, bindings: Bindings) -> Self {
        Self {
            state,
            rng,
            bindings,
            events: Vec::new(),
            pending: None,
        }
    }
}

/// Filter a scope's final bindings down to its exported subset.
///
/// A scope introduced by `binder` exports exactly the names prefixed
/// with the binder, excluding the binder's own name. Everything else
/// the scope bound stays local, so nested scopes cannot leak
/// conflicting bindings upward. The result is `outer` plus the exports.
#[must_use]
pub fn export_scoped(outer: &Bindings, inner: &Bindings, binder: &str) -> Bindings {
    let mut result = outer.clone();
    for (name, value) in inner.iter() {
        if name != binder && name.starts_with(binder) {
            result.insert(name.clone(), value.clone());
        }
    }
    result
}
