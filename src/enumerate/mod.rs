//! Legal-move enumerator.
//!
//! Exhaustively (but budget-bounded) discovers which moves are
//! currently legal. Per action: turn-flow eligibility gate,
//! applicability preflight with reason-tagged failures, card-event
//! branch probing, then a depth-first cross product over parameter
//! domains with the precondition checked at the leaf. Accepted
//! templates fan through the option matrix into class-tagged variants;
//! a post-pass applies turn-flow window filters and free-operation
//! expansion.
//!
//! Two independent budgets bound the search: total emitted templates
//! and total cross-product nodes visited. Either exhaustion truncates
//! the remainder deterministically and emits exactly one stable warning
//! per budget.

use tracing::debug;

use crate::core::{Budgets, GameState, PlayerId, Value, Warning};
use crate::definition::{action::BRANCH_PARAM, ActionDef, GameDefinition};
use crate::error::{EngineError, EngineResult, IllegalMoveReason};
use crate::eval::{eval_cond, eval_query, resolve_selector, Bindings, EvalCtx};
use crate::moves::{LegalMove, Move, MoveParams};
use crate::resolver;
use crate::turnflow::ActionClass;

/// Result of one enumeration pass.
#[derive(Clone, Debug)]
pub struct Enumeration {
    /// Legal moves, in deterministic discovery order.
    pub moves: Vec<LegalMove>,
    /// Warnings recorded during the pass (budget truncations).
    pub warnings: Vec<Warning>,
}

/// Usage-counter key for an action's limit scope.
///
/// Keys embed the current scope instance (turn/round/phase numbers), so
/// counters never need resetting: a new turn simply reads a fresh key.
#[must_use]
pub fn usage_key(action: &ActionDef, state: &GameState) -> Option<String> {
    let limit = action.limit?;
    let key = match limit.scope {
        crate::definition::LimitScope::Turn => {
            format!("a{}:turn:{}", action.id.raw(), state.turn_number)
        }
        crate::definition::LimitScope::Round => {
            format!("a{}:round:{}", action.id.raw(), state.round_number)
        }
        crate::definition::LimitScope::Phase => format!(
            "a{}:phase:{}:{}",
            action.id.raw(),
            state.phase.raw(),
            state.turn_number
        ),
        crate::definition::LimitScope::Game => format!("a{}:game", action.id.raw()),
    };
    Some(key)
}

/// Enumerate every currently-legal move for the active seat.
pub fn enumerate(
    def: &GameDefinition,
    state: &GameState,
    budgets: &mut Budgets,
) -> EngineResult<Enumeration> {
    let active = state.active_player;
    let round = state.round_number;

    // (1) Turn-flow eligibility gate: an ineligible active seat has no
    // moves at all.
    if !state.turn_flow.is_eligible(active, round) {
        return Ok(Enumeration {
            moves: Vec::new(),
            warnings: budgets.take_warnings(),
        });
    }

    let allowed = state.turn_flow.allowed_classes(
        active,
        &def.turn.first_allowed,
        &def.turn.option_matrix,
    );

    let mut moves: Vec<LegalMove> = Vec::new();
    let mut truncated = false;

    for action in &def.actions {
        if truncated {
            break;
        }

        // (2) Applicability preflight, each failure a distinct reason.
        match preflight(def, state, action) {
            Ok(()) => {}
            Err(reason) => {
                debug!(action = %action.id, %reason, "preflight rejected");
                continue;
            }
        }

        // (3) Card events: branch variants probed for decision-sequence
        // satisfiability before generic enumeration, because branch
        // effects may reference decision bindings that would otherwise
        // raise false missing-binding errors.
        let templates = if action.is_event() {
            let mut out = Vec::new();
            for branch in &action.event_branches {
                let mv = Move::new(action.id)
                    .with_param(BRANCH_PARAM, Value::Str(branch.id.clone()));
                if resolver::is_satisfiable(def, state, &mv) {
                    out.push(mv);
                }
            }
            out
        } else {
            // (4) Parameter-domain cross product.
            let mut out = Vec::new();
            expand_params(
                def,
                state,
                action,
                0,
                MoveParams::new(),
                &mut out,
                budgets,
                &mut truncated,
            )?;
            out
        };

        // Option-matrix fan-out; each variant independently
        // budget-checked.
        for template in templates {
            for class in admitted_classes(action, &allowed) {
                if !budgets.charge_template() {
                    truncated = true;
                    break;
                }
                moves.push(LegalMove::new(template.clone(), class));
            }
            if truncated {
                break;
            }
        }
    }

    // Post-pass: turn-flow window filters, then free-operation
    // expansion.
    let moves = window_filter(state, moves);
    let moves = expand_free_operations(state, moves, active, round);

    Ok(Enumeration {
        moves,
        warnings: budgets.take_warnings(),
    })
}

/// Applicability preflight. Distinct reason per failure because
/// downstream diagnostics branch on it.
fn preflight(
    def: &GameDefinition,
    state: &GameState,
    action: &ActionDef,
) -> Result<(), IllegalMoveReason> {
    // Phase match.
    if !action.available_in(state.phase) {
        return Err(IllegalMoveReason::PhaseMismatch);
    }

    let bindings = Bindings::new();
    let params = MoveParams::new();
    let ctx = EvalCtx {
        def,
        state,
        bindings: &bindings,
        params: &params,
        active: state.active_player,
        actor: state.active_player,
        strict: false,
    };

    // Actor selector: a deferred resolution failure is tolerated here
    // (the seat may come from a parameter); a resolved wrong seat is
    // conclusive.
    match resolve_selector(&ctx, &action.actor) {
        Ok(seat) if seat != state.active_player => {
            return Err(IllegalMoveReason::ActorNotApplicable)
        }
        Ok(_) => {}
        Err(err) if err.is_deferred() => {}
        Err(_) => return Err(IllegalMoveReason::ActorNotApplicable),
    }

    // Per-scope action limit.
    if let (Some(limit), Some(key)) = (action.limit, usage_key(action, state)) {
        if state.action_usage.get(&key).copied().unwrap_or(0) >= i64::from(limit.max) {
            return Err(IllegalMoveReason::ActionLimitExceeded);
        }
    }

    // Pipeline dispatch match.
    if let Some(pipeline_id) = action.pipeline {
        let Some(pipeline) = def.pipeline(pipeline_id) else {
            return Err(IllegalMoveReason::PipelineDispatchMismatch);
        };
        if let Some(dispatch) = &pipeline.dispatch {
            match eval_cond(&ctx, dispatch) {
                Ok(true) => {}
                // False, deferred, or structurally unevaluable here all
                // classify as a dispatch mismatch for this preflight.
                _ => return Err(IllegalMoveReason::PipelineDispatchMismatch),
            }
        }
    }

    Ok(())
}

/// Depth-first product over declared parameter domains.
///
/// Each partial binding re-resolves the execution player: tolerant of
/// an unbound executor selector mid-product, strict once fully bound.
/// The precondition is checked only at the leaf.
#[allow(clippy::too_many_arguments)]
fn expand_params(
    def: &GameDefinition,
    state: &GameState,
    action: &ActionDef,
    index: usize,
    partial: MoveParams,
    out: &mut Vec<Move>,
    budgets: &mut Budgets,
    truncated: &mut bool,
) -> EngineResult<()> {
    if *truncated || !budgets.charge_param_expansion() {
        *truncated = true;
        return Ok(());
    }

    let bindings = Bindings::new();
    let ctx = EvalCtx {
        def,
        state,
        bindings: &bindings,
        params: &partial,
        active: state.active_player,
        actor: state.active_player,
        strict: false,
    };

    let at_leaf = index == action.params.len();

    // Re-resolve the execution player against the partial binding.
    if let Some(executor) = &action.executor {
        match resolve_selector(&ctx, executor) {
            Ok(_) => {}
            // Unbound mid-product: the selector may reference a
            // not-yet-assigned parameter. Strict once fully bound.
            Err(err) if err.is_deferred() && !at_leaf => {}
            Err(err) if err.is_deferred() => return Ok(()),
            Err(err) => return Err(err),
        }
    }

    if at_leaf {
        // Conclusive actor check at the leaf.
        match resolve_selector(&ctx, &action.actor) {
            Ok(seat) if seat == state.active_player => {}
            Ok(_) => return Ok(()),
            Err(err) if err.is_deferred() => return Ok(()),
            Err(err) => return Err(err),
        }

        if let Some(precondition) = &action.precondition {
            match eval_cond(&ctx, precondition) {
                Ok(true) => {}
                Ok(false) => return Ok(()),
                // A precondition that cannot resolve yet is "not yet
                // applicable", a documented deferral.
                Err(err) if err.is_deferred() => return Ok(()),
                Err(err) => return Err(err),
            }
        }

        out.push(Move {
            action: action.id,
            params: partial,
        });
        return Ok(());
    }

    let param = &action.params[index];
    let domain = match eval_query(&ctx, &param.domain) {
        Ok(domain) => domain,
        // Domain referencing a later binding: nothing to expand yet.
        Err(err) if err.is_deferred() => return Ok(()),
        Err(err) => return Err(err),
    };

    for value in domain {
        if *truncated {
            return Ok(());
        }
        let mut next = partial.clone();
        next.insert(param.name.clone(), value);
        expand_params(def, state, action, index + 1, next, out, budgets, truncated)?;
    }

    Ok(())
}

/// Classes of `action` admitted by the option matrix for this seat.
///
/// Pass is always open to an eligible seat that has a pass-classed
/// action available.
fn admitted_classes(action: &ActionDef, allowed: &[ActionClass]) -> Vec<ActionClass> {
    let mut admitted: Vec<ActionClass> = action
        .classes
        .iter()
        .copied()
        .filter(|class| allowed.contains(class))
        .collect();
    if action.classes.contains(&ActionClass::Pass) && !admitted.contains(&ActionClass::Pass) {
        admitted.push(ActionClass::Pass);
    }
    admitted
}

/// Turn-flow window filter: once two seats have taken non-pass actions
/// this round, only pass-classed moves remain open.
fn window_filter(state: &GameState, moves: Vec<LegalMove>) -> Vec<LegalMove> {
    if state.turn_flow.non_pass_count < 2 {
        return moves;
    }
    moves
        .into_iter()
        .filter(|legal| legal.class == ActionClass::Pass)
        .collect()
}

/// Duplicate moves covered by a pending free-operation grant, flagged
/// free-operation.
fn expand_free_operations(
    state: &GameState,
    moves: Vec<LegalMove>,
    seat: PlayerId,
    round: u32,
) -> Vec<LegalMove> {
    let mut out = Vec::with_capacity(moves.len());
    for legal in moves {
        let covered = state
            .turn_flow
            .covering_grant(seat, legal.mv.action, &legal.mv.zone_params(), round)
            .is_some();
        let duplicate = covered.then(|| legal.clone().as_free_operation());
        out.push(legal);
        out.extend(duplicate);
    }
    out
}

/// Classify why a specific proposed move is not applicable right now.
///
/// Used at the validation boundary; returns the typed illegal-move
/// error so callers branch on the reason, not on message text.
pub fn classify_proposed(
    def: &GameDefinition,
    state: &GameState,
    mv: &Move,
) -> EngineResult<()> {
    let action = def.action(mv.action).ok_or(EngineError::Illegal {
        action: mv.action,
        reason: IllegalMoveReason::UnknownAction,
    })?;

    if !state
        .turn_flow
        .is_eligible(state.active_player, state.round_number)
    {
        return Err(EngineError::Illegal {
            action: mv.action,
            reason: IllegalMoveReason::TurnFlowIneligible,
        });
    }

    preflight(def, state, action).map_err(|reason| EngineError::Illegal {
        action: mv.action,
        reason,
    })?;

    // Conclusive actor check with the full parameter map.
    let bindings = Bindings::new();
    let ctx = EvalCtx {
        def,
        state,
        bindings: &bindings,
        params: &mv.params,
        active: state.active_player,
        actor: state.active_player,
        strict: true,
    };
    match resolve_selector(&ctx, &action.actor) {
        Ok(seat) if seat == state.active_player => {}
        Ok(_) => {
            return Err(EngineError::Illegal {
                action: mv.action,
                reason: IllegalMoveReason::ActorNotApplicable,
            })
        }
        Err(err) => return Err(err),
    }
    if let Some(executor) = &action.executor {
        match resolve_selector(&ctx, executor) {
            Ok(_) => {}
            Err(err) if matches!(err, EngineError::UnboundSelector { .. }) => {
                return Err(EngineError::Illegal {
                    action: mv.action,
                    reason: IllegalMoveReason::ExecutorNotApplicable,
                })
            }
            Err(err) => return Err(err),
        }
    }

    if let Some(precondition) = &action.precondition {
        if !eval_cond(&ctx, precondition)? {
            return Err(EngineError::Illegal {
                action: mv.action,
                reason: IllegalMoveReason::PreconditionFailed,
            });
        }
    }

    Ok(())
}
