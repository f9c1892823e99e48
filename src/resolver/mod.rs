//! Decision-sequence resolver.
//!
//! Multi-step player choices are resolved incrementally: run the action
//! in discovery mode, surface the next unresolved decision, bind a
//! selection at its decision id, repeat. No pending choice means the
//! move is complete. Satisfiability is the boolean projection of the
//! same walk with the default chooser.
//!
//! The resolver only reads turn-flow state; it never mutates anything.

use tracing::debug;

use crate::core::{Budgets, GameState, Value};
use crate::definition::{action::BRANCH_PARAM, GameDefinition};
use crate::effects::{
    apply_list, EffectContext, EffectResult, ExecMode, PendingChoice, TraceLog,
};
use crate::error::{EngineError, EngineResult, ErrorContext, IllegalMoveReason};
use crate::eval::{resolve_selector, Bindings, EvalCtx};
use crate::moves::Move;

/// Options for [`resolve`].
pub struct ResolveOptions<'a> {
    /// Picks an option for a surfaced decision. `None` falls back to
    /// the first legal option. Returning `None` from the chooser
    /// reports the sequence incomplete with the decision surfaced.
    pub choose: Option<&'a dyn Fn(&PendingChoice) -> Option<Value>>,
    /// Step ceiling; crossing it is a typed error, not a truncation.
    pub max_steps: Option<u32>,
}

impl Default for ResolveOptions<'_> {
    fn default() -> Self {
        Self {
            choose: None,
            max_steps: None,
        }
    }
}

/// Outcome of walking a decision sequence.
#[derive(Clone, Debug)]
pub struct Resolution {
    /// True when discovery finished with no pending choice.
    pub complete: bool,
    /// The move with every decision bound so far.
    pub mv: Move,
    /// The decision still unresolved when incomplete.
    pub next_decision: Option<PendingChoice>,
}

/// Walk a move's decision sequence to completion or to the next
/// unresolved decision.
///
/// Decision ids may be template-instantiated per loop iteration inside
/// the effects; each instantiation is discovered and bound
/// independently, in the deterministic order the tree walk visits them.
pub fn resolve(
    def: &GameDefinition,
    state: &GameState,
    mv: &Move,
    opts: &ResolveOptions<'_>,
) -> EngineResult<Resolution> {
    let mut budget = Budgets::default();
    let max_steps = opts.max_steps.unwrap_or(budget.max_decision_steps);
    let mut mv = mv.clone();

    for step in 0..max_steps {
        let result = discover_once(def, state, &mv, &mut budget)?;

        let Some(pending) = result.pending else {
            debug!(action = %mv.action, steps = step, "decision sequence complete");
            return Ok(Resolution {
                complete: true,
                mv,
                next_decision: None,
            });
        };

        let picked = match opts.choose {
            Some(choose) => choose(&pending),
            None => pending.first_legal().cloned(),
        };

        match picked {
            Some(value) => {
                debug!(decision = %pending.decision, %value, "bound decision");
                mv.params.insert(pending.decision.clone(), value);
            }
            // No resolvable option: incomplete, not an error.
            None => {
                return Ok(Resolution {
                    complete: false,
                    mv,
                    next_decision: Some(pending),
                })
            }
        }
    }

    Err(EngineError::MaxDecisionSteps { max_steps })
}

/// Can this move's decision sequence be completed at all?
#[must_use]
pub fn is_satisfiable(def: &GameDefinition, state: &GameState, mv: &Move) -> bool {
    matches!(
        resolve(def, state, mv, &ResolveOptions::default()),
        Ok(Resolution { complete: true, .. })
    )
}

/// One discovery pass over the move's effect list.
///
/// Shared with the enumerator's card-event probing. State and RNG in
/// the result are scratch; only `pending` and success matter to
/// callers.
pub(crate) fn discover_once(
    def: &GameDefinition,
    state: &GameState,
    mv: &Move,
    budget: &mut Budgets,
) -> EngineResult<EffectResult> {
    let action = def.action(mv.action).ok_or(EngineError::Illegal {
        action: mv.action,
        reason: IllegalMoveReason::UnknownAction,
    })?;

    let branch = match mv.param(BRANCH_PARAM) {
        Some(Value::Str(id)) => Some(id.as_str()),
        Some(other) => {
            return Err(EngineError::Type {
                ctx: ErrorContext::new("resolver", "event-branch"),
                expected: "str",
                got: other.kind().to_string(),
            })
        }
        None => None,
    };
    let effects = action
        .effects_for_branch(branch)
        .ok_or_else(|| EngineError::Definition {
            ctx: ErrorContext::new("resolver", "event-branch"),
            detail: format!(
                "action {} has no branch `{}`",
                action.id,
                branch.unwrap_or_default()
            ),
        })?;

    let bindings = Bindings::new();
    let probe = EvalCtx {
        def,
        state,
        bindings: &bindings,
        params: &mv.params,
        active: state.active_player,
        actor: state.active_player,
        strict: false,
    };
    let actor = match &action.executor {
        Some(selector) => resolve_selector(&probe, selector)?,
        None => resolve_selector(&probe, &action.actor)?,
    };

    let ctx = EffectContext {
        def,
        action: action.id,
        state: state.clone(),
        rng: state.rng,
        active: state.active_player,
        actor,
        bindings,
        params: &mv.params,
        mode: ExecMode::Discover,
    };

    let mut log = TraceLog::new();
    apply_list(effects, &ctx, budget, &mut log)
}
