//! Move validation and application: the execution boundary.
//!
//! `apply_move` is the only place turn-flow state is written. It
//! re-validates applicability with typed illegal-move reasons, checks
//! decision parameters against their evaluated domains (inside the
//! interpreter), runs pipeline stages then effects in execution mode,
//! and performs the turn-flow transitions that applying a move implies.

use tracing::debug;

use crate::core::{Budgets, GameState, StateHash, Warning};
use crate::definition::{action::BRANCH_PARAM, GameDefinition};
use crate::effects::{
    apply_list, EffectContext, EngineEvent, ExecMode, TraceLog,
};
use crate::enumerate::{classify_proposed, usage_key};
use crate::error::{EngineError, EngineResult, ErrorContext, IllegalMoveReason};
use crate::eval::{eval_cond, resolve_selector, Bindings, EvalCtx};
use crate::moves::{LegalMove, Move};
use crate::resolver::{self, ResolveOptions};
use crate::turnflow::ActionClass;

/// Result of applying a move.
#[derive(Clone, Debug)]
pub struct Applied {
    /// The new state snapshot.
    pub state: GameState,
    /// Events emitted by the effects, in order.
    pub events: Vec<EngineEvent>,
    /// Structured trace of the application.
    pub trace: TraceLog,
    /// Warnings recorded during the application.
    pub warnings: Vec<Warning>,
    /// Content hash of the new state.
    pub hash: StateHash,
}

/// Validate and apply a classified legal move, producing a new state.
pub fn apply_move(
    def: &GameDefinition,
    state: &GameState,
    legal: &LegalMove,
) -> EngineResult<Applied> {
    let mv = &legal.mv;
    let action = def.action(mv.action).ok_or(EngineError::Illegal {
        action: mv.action,
        reason: IllegalMoveReason::UnknownAction,
    })?;

    // Applicability re-validation with typed reasons.
    classify_proposed(def, state, mv)?;

    // Turn-flow class check. Free operations bypass the option matrix
    // but must name a class the action actually carries and be covered
    // by a pending grant.
    if !action.classes.contains(&legal.class) {
        return Err(EngineError::Illegal {
            action: mv.action,
            reason: IllegalMoveReason::ClassMismatch,
        });
    }
    let grant_index = if legal.free_operation {
        let covering = state.turn_flow.covering_grant(
            state.active_player,
            mv.action,
            &mv.zone_params(),
            state.round_number,
        );
        match covering {
            Some(index) => Some(index),
            None => {
                return Err(EngineError::Illegal {
                    action: mv.action,
                    reason: IllegalMoveReason::FreeOperationNotGranted,
                })
            }
        }
    } else {
        let allowed = state.turn_flow.allowed_classes(
            state.active_player,
            &def.turn.first_allowed,
            &def.turn.option_matrix,
        );
        let class_open = allowed.contains(&legal.class)
            || (legal.class == ActionClass::Pass
                && action.classes.contains(&ActionClass::Pass));
        if !class_open {
            return Err(EngineError::Illegal {
                action: mv.action,
                reason: IllegalMoveReason::ClassMismatch,
            });
        }
        None
    };

    // Strict actor/executor resolution for the effect context.
    let bindings = Bindings::new();
    let strict = EvalCtx {
        def,
        state,
        bindings: &bindings,
        params: &mv.params,
        active: state.active_player,
        actor: state.active_player,
        strict: true,
    };
    let actor = match &action.executor {
        Some(selector) => resolve_selector(&strict, selector)?,
        None => resolve_selector(&strict, &action.actor)?,
    };

    let mut budget = Budgets::default();
    let mut log = TraceLog::new();

    let mut ctx = EffectContext {
        def,
        action: action.id,
        state: state.clone(),
        rng: state.rng,
        active: state.active_player,
        actor,
        bindings: Bindings::new(),
        params: &mv.params,
        mode: ExecMode::Execute,
    };

    let mut events = Vec::new();

    // Pipeline stages: legality, affordability, cost effects.
    if let Some(pipeline_id) = action.pipeline {
        let pipeline = def.pipeline(pipeline_id).ok_or_else(|| {
            EngineError::Definition {
                ctx: ErrorContext::new("kernel", "pipeline"),
                detail: format!("action {} names unknown {pipeline_id}", action.id),
            }
        })?;

        if let Some(legality) = &pipeline.legality {
            if !eval_cond(&strict, legality)? {
                return Err(EngineError::Illegal {
                    action: mv.action,
                    reason: IllegalMoveReason::PipelineLegalityFailed,
                });
            }
        }
        if let Some(affordable) = &pipeline.affordable {
            if !eval_cond(&strict, affordable)? {
                return Err(EngineError::Illegal {
                    action: mv.action,
                    reason: IllegalMoveReason::PipelineCostFailed,
                });
            }
        }

        if !pipeline.cost.is_empty() {
            let result = apply_list(&pipeline.cost, &ctx, &mut budget, &mut log)?;
            events.extend(result.events);
            ctx = ctx.advanced(result.state, result.rng, result.bindings);
        }
    }

    // The action's (or chosen branch's) effect list.
    let branch = match mv.param(BRANCH_PARAM) {
        Some(crate::core::Value::Str(id)) => Some(id.as_str()),
        Some(other) => {
            return Err(EngineError::Type {
                ctx: ErrorContext::new("kernel", "event-branch"),
                expected: "str",
                got: other.kind().to_string(),
            })
        }
        None => None,
    };
    let effects = action
        .effects_for_branch(branch)
        .ok_or_else(|| EngineError::Definition {
            ctx: ErrorContext::new("kernel", "event-branch"),
            detail: format!(
                "action {} has no branch `{}`",
                action.id,
                branch.unwrap_or_default()
            ),
        })?;

    let result = apply_list(effects, &ctx, &mut budget, &mut log)?;
    if let Some(pending) = result.pending {
        // Execution requires a fully-bound move; a pending choice here
        // means a decision key was never bound.
        return Err(EngineError::MissingBinding {
            decision: pending.decision,
            deferred: false,
        });
    }
    events.extend(result.events);

    // Bookkeeping on the new snapshot: usage counters and turn-flow
    // transitions. This is the only writer of turn-flow state.
    let mut new_state = result.state;
    new_state.rng = result.rng;

    if let Some(key) = usage_key(action, state) {
        let used = new_state.action_usage.get(&key).copied().unwrap_or(0);
        new_state.action_usage.insert(key, used + 1);
    }

    match grant_index {
        Some(index) => new_state.turn_flow.consume_grant(index),
        None => new_state
            .turn_flow
            .record_acted(state.active_player, legal.class),
    }
    new_state.turn_flow.expire_windows(new_state.round_number);

    let hash = new_state.content_hash();
    debug!(action = %mv.action, class = %legal.class, %hash, "applied move");

    Ok(Applied {
        state: new_state,
        events,
        trace: log,
        warnings: budget.take_warnings(),
        hash,
    })
}

/// Advance to the next round/card: reset the per-round eligibility
/// record, expire closed windows, and hand the turn to the first
/// eligible seat.
#[must_use]
pub fn advance_round(def: &GameDefinition, state: &GameState) -> GameState {
    let mut next = state.clone();
    next.round_number += 1;
    next.turn_flow.begin_round(None, None);
    next.turn_flow.expire_windows(next.round_number);

    let flow = next.turn_flow.clone();
    let round = next.round_number;
    let (first, second) = def
        .turn
        .leading_eligible(|seat| flow.is_eligible(seat, round));
    next.turn_flow.first_eligible = first;
    next.turn_flow.second_eligible = second;
    if let Some(first) = first {
        next.active_player = first;
    }
    next
}

/// Advance to the next turn: bump the counter and return to the first
/// declared phase.
#[must_use]
pub fn advance_turn(def: &GameDefinition, state: &GameState) -> GameState {
    let mut next = state.clone();
    next.turn_number += 1;
    if let Some(phase) = def.turn.phases.first() {
        next.phase = phase.id;
    }
    next
}

/// Replay a move sequence from a fresh seed, returning the final state
/// and the hash after each applied move.
///
/// Moves with unresolved decisions are completed with the default
/// chooser first, mirroring how a recorded game replays.
pub fn replay(
    def: &GameDefinition,
    seed: u64,
    moves: &[LegalMove],
) -> EngineResult<(GameState, Vec<StateHash>)> {
    let mut state = def.initial_state(seed);
    let mut hashes = Vec::with_capacity(moves.len());

    for legal in moves {
        let resolution =
            resolver::resolve(def, &state, &legal.mv, &ResolveOptions::default())?;
        let completed = LegalMove {
            mv: resolution.mv,
            class: legal.class,
            free_operation: legal.free_operation,
        };
        let applied = apply_move(def, &state, &completed)?;
        hashes.push(applied.hash);
        state = applied.state;
    }

    Ok((state, hashes))
}

/// Validate a bare proposed move without applying it.
///
/// Convenience projection of the validation half of [`apply_move`];
/// returns the typed illegal-move error on failure.
pub fn validate(def: &GameDefinition, state: &GameState, mv: &Move) -> EngineResult<()> {
    classify_proposed(def, state, mv)
}
