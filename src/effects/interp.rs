//! The effect interpreter: a single dual-mode tree walk.
//!
//! `apply` is pure with respect to its context: identical inputs always
//! produce identical outputs, which is what makes replay deterministic.
//! The only mutable arguments are the budget counters and the trace
//! log, both owned by the top-level call tree.
//!
//! ## Failure model
//!
//! Structural and type errors abort the entire enclosing effect-list
//! application; the already-computed prefix is discarded by the caller
//! simply because the new state is never returned. Budget exhaustion is
//! not an error: the walk truncates deterministically and records one
//! warning.

use tracing::trace;

use crate::core::{Budgets, GameState, Value};
use crate::definition::VarDef;
use crate::error::{EngineError, EngineResult, ErrorContext, IllegalMoveReason};
use crate::eval::{eval_cond, eval_int, eval_query, eval_token, eval_value, eval_zone, Bindings};

use super::ast::{Effect, RemovalGroup, VarTarget};
use super::context::{EffectContext, ExecMode};
use super::result::{export_scoped, ChoiceKind, ChoiceOption, EffectResult, PendingChoice};
use super::subst;
use super::trace::{EngineEvent, TraceEntry, TraceLog, VarHandle};

/// Apply a list of effects in order, threading state, RNG, and
/// bindings.
///
/// Stops at the first pending choice; a hard error discards the whole
/// list's work.
pub fn apply_list(
    effects: &[Effect],
    ctx: &EffectContext,
    budget: &mut Budgets,
    log: &mut TraceLog,
) -> EngineResult<EffectResult> {
    let mut acc = EffectResult::unchanged(ctx.state.clone(), ctx.rng, ctx.bindings.clone());

    for effect in effects {
        let child = ctx.advanced(acc.state.clone(), acc.rng, acc.bindings.clone());
        let step = apply(effect, &child, budget, log)?;

        acc.state = step.state;
        acc.rng = step.rng;
        acc.bindings = step.bindings;
        acc.events.extend(step.events);

        if step.pending.is_some() {
            acc.pending = step.pending;
            return Ok(acc);
        }
    }

    Ok(acc)
}

/// Apply one effect.
///
/// Every visited node charges the shared effect-node budget; once the
/// counter refuses, the walk terminates with the context passed through
/// unchanged rather than running one more uncharged step.
pub fn apply(
    effect: &Effect,
    ctx: &EffectContext,
    budget: &mut Budgets,
    log: &mut TraceLog,
) -> EngineResult<EffectResult> {
    if !budget.charge_effect_node() {
        return Ok(EffectResult::unchanged(
            ctx.state.clone(),
            ctx.rng,
            ctx.bindings.clone(),
        ));
    }

    match effect {
        Effect::Seq(effects) => apply_list(effects, ctx, budget, log),

        Effect::SetVar { target, value } => {
            let (handle, decl) = resolve_target(ctx, target)?;
            let new = decl.clamp(eval_int(&ctx.eval(), value, "setVar.value")?);
            write_if_changed(ctx, handle, decl, new, log)
        }

        Effect::AddVar { target, delta } => {
            let (handle, decl) = resolve_target(ctx, target)?;
            let delta = eval_int(&ctx.eval(), delta, "addVar.delta")?;
            let old = read_var(&ctx.state, &handle, decl.default);
            let new = decl.clamp(old.wrapping_add(delta));
            write_if_changed(ctx, handle, decl, new, log)
        }

        Effect::TransferVar {
            from,
            to,
            amount,
            window,
        } => apply_transfer(ctx, from, to, amount, window.as_ref(), log),

        Effect::MoveToken {
            token,
            to,
            position,
        } => {
            let id = eval_token(&ctx.eval(), token)?;
            let dest = eval_zone(&ctx.eval(), to)?;
            let old = ctx.state.zone_of(id).ok_or_else(|| EngineError::Type {
                ctx: ErrorContext::new("effect", "moveToken"),
                expected: "token in a zone",
                got: format!("{id}"),
            })?;

            if old == dest {
                return Ok(EffectResult::unchanged(
                    ctx.state.clone(),
                    ctx.rng,
                    ctx.bindings.clone(),
                ));
            }

            let mut state = ctx.state.clone();
            state.move_token(id, dest, *position);
            log.push(TraceEntry::TokenMoved {
                token: id,
                from: old,
                to: dest,
            });

            let mut result = EffectResult::unchanged(state, ctx.rng, ctx.bindings.clone());
            result.events.push(EngineEvent::TokenMoved {
                token: id,
                from: old,
                to: dest,
            });
            Ok(result)
        }

        Effect::DrawTokens { from, to, count } => {
            let src = eval_zone(&ctx.eval(), from)?;
            let dest = eval_zone(&ctx.eval(), to)?;
            let count = eval_int(&ctx.eval(), count, "drawTokens.count")?;
            if count < 0 {
                return Err(EngineError::Type {
                    ctx: ErrorContext::new("effect", "drawTokens.count"),
                    expected: "non-negative int",
                    got: count.to_string(),
                });
            }

            let mut state = ctx.state.clone();
            let mut events = Vec::new();
            for _ in 0..count {
                let Some(top) = state.top_of_zone(src) else {
                    break;
                };
                state.move_token(top, dest, None);
                log.push(TraceEntry::TokenMoved {
                    token: top,
                    from: src,
                    to: dest,
                });
                events.push(EngineEvent::TokenMoved {
                    token: top,
                    from: src,
                    to: dest,
                });
            }

            let mut result = EffectResult::unchanged(state, ctx.rng, ctx.bindings.clone());
            result.events = events;
            Ok(result)
        }

        Effect::If {
            cond,
            then,
            otherwise,
        } => {
            let branch = if eval_cond(&ctx.eval(), cond)? {
                then
            } else {
                otherwise
            };
            apply_list(branch, ctx, budget, log)
        }

        Effect::Let {
            binder,
            value,
            body,
        } => {
            let bound = eval_value(&ctx.eval(), value)?;
            let mut inner_bindings = ctx.bindings.clone();
            inner_bindings.insert(binder.clone(), bound);

            let inner_ctx = ctx.advanced(ctx.state.clone(), ctx.rng, inner_bindings);
            let mut result = apply_list(body, &inner_ctx, budget, log)?;
            result.bindings = export_scoped(&ctx.bindings, &result.bindings, binder);
            Ok(result)
        }

        Effect::BindValue { name, value } => {
            let bound = eval_value(&ctx.eval(), value)?;
            let mut bindings = ctx.bindings.clone();
            bindings.insert(name.clone(), bound);
            Ok(EffectResult::unchanged(
                ctx.state.clone(),
                ctx.rng,
                bindings,
            ))
        }

        Effect::ForEach {
            binder,
            source,
            limit,
            body,
            count_binder,
            then,
        } => apply_for_each(ctx, binder, source, limit.as_ref(), body, count_binder.as_deref(), then, budget, log),

        Effect::Reduce {
            binder,
            acc_binder,
            source,
            init,
            body,
            then,
        } => apply_reduce(ctx, binder, acc_binder, source, init, body, then, budget, log),

        Effect::RemoveByPriority {
            budget: removal_budget,
            groups,
            remaining_binder,
        } => apply_remove_by_priority(
            ctx,
            removal_budget,
            groups,
            remaining_binder.as_deref(),
            log,
        ),

        Effect::ChooseOne {
            decision,
            options,
            legal_if,
            binder,
            body,
        } => apply_choose_one(ctx, decision, options, legal_if.as_ref(), binder, body, budget, log),

        Effect::ChooseN {
            decision,
            options,
            min,
            max,
            legal_if,
            binder,
            body,
        } => apply_choose_n(
            ctx,
            decision,
            options,
            min,
            max,
            legal_if.as_ref(),
            binder,
            body,
            budget,
            log,
        ),

        Effect::RollRandom { binder, sides } => {
            let sides = eval_int(&ctx.eval(), sides, "rollRandom.sides")?;
            if sides <= 0 {
                return Err(EngineError::Type {
                    ctx: ErrorContext::new("effect", "rollRandom.sides"),
                    expected: "positive int",
                    got: sides.to_string(),
                });
            }

            let (value, rng) = ctx.rng.roll(sides as u64);
            log.push(TraceEntry::RandomRolled {
                binder: binder.clone(),
                value,
            });
            trace!(binder = %binder, value, "rolled");

            let mut bindings = ctx.bindings.clone();
            bindings.insert(binder.clone(), Value::Int(value));
            Ok(EffectResult::unchanged(ctx.state.clone(), rng, bindings))
        }

        Effect::EvaluateSubset {
            binder,
            source,
            body,
        } => {
            let items = eval_query(&ctx.eval(), source)?;
            let mut inner_bindings = ctx.bindings.clone();
            inner_bindings.insert(binder.clone(), Value::List(items));

            let inner_ctx = ctx.advanced(ctx.state.clone(), ctx.rng, inner_bindings);
            let mut result = apply_list(body, &inner_ctx, budget, log)?;
            result.bindings = export_scoped(&ctx.bindings, &result.bindings, binder);
            Ok(result)
        }

        Effect::PlaceMarker { zone, marker } => {
            let z = eval_zone(&ctx.eval(), zone)?;
            if ctx.state.has_marker(z, marker) {
                return Ok(EffectResult::unchanged(
                    ctx.state.clone(),
                    ctx.rng,
                    ctx.bindings.clone(),
                ));
            }
            let mut state = ctx.state.clone();
            state.place_marker(z, marker.clone());
            let mut result = EffectResult::unchanged(state, ctx.rng, ctx.bindings.clone());
            result.events.push(EngineEvent::MarkerPlaced {
                zone: z,
                marker: marker.clone(),
            });
            Ok(result)
        }

        Effect::RemoveMarker { zone, marker } => {
            let z = eval_zone(&ctx.eval(), zone)?;
            if !ctx.state.has_marker(z, marker) {
                return Ok(EffectResult::unchanged(
                    ctx.state.clone(),
                    ctx.rng,
                    ctx.bindings.clone(),
                ));
            }
            let mut state = ctx.state.clone();
            state.remove_marker(z, marker);
            let mut result = EffectResult::unchanged(state, ctx.rng, ctx.bindings.clone());
            result.events.push(EngineEvent::MarkerRemoved {
                zone: z,
                marker: marker.clone(),
            });
            Ok(result)
        }

        Effect::SetPhase(phase) => {
            if ctx.state.phase == *phase {
                return Ok(EffectResult::unchanged(
                    ctx.state.clone(),
                    ctx.rng,
                    ctx.bindings.clone(),
                ));
            }
            let old = ctx.state.phase;
            let mut state = ctx.state.clone();
            state.phase = *phase;
            let mut result = EffectResult::unchanged(state, ctx.rng, ctx.bindings.clone());
            result.events.push(EngineEvent::PhaseChanged {
                from: old,
                to: *phase,
            });
            Ok(result)
        }

        Effect::AdvancePhase => {
            let old = ctx.state.phase;
            let next = ctx.def.turn.next_phase(old).ok_or_else(|| {
                EngineError::Definition {
                    ctx: ErrorContext::new("effect", "advancePhase"),
                    detail: format!("phase {old} is not in the declared cycle"),
                }
            })?;
            let mut state = ctx.state.clone();
            state.phase = next;
            let mut result = EffectResult::unchanged(state, ctx.rng, ctx.bindings.clone());
            result.events.push(EngineEvent::PhaseChanged {
                from: old,
                to: next,
            });
            Ok(result)
        }
    }
}

// === Variables ===

fn resolve_target<'d>(
    ctx: &EffectContext<'d>,
    target: &VarTarget,
) -> EngineResult<(VarHandle, &'d VarDef)> {
    use crate::definition::VarScope;

    match target {
        VarTarget::Global { name } => {
            let decl = ctx.def.var(VarScope::Global, name).ok_or_else(|| {
                EngineError::UndeclaredVariable {
                    ctx: ErrorContext::new("effect", "var.global"),
                    name: name.clone(),
                }
            })?;
            Ok((VarHandle::Global(name.clone()), decl))
        }
        VarTarget::Player { player, name } => {
            let decl = ctx.def.var(VarScope::PerPlayer, name).ok_or_else(|| {
                EngineError::UndeclaredVariable {
                    ctx: ErrorContext::new("effect", "var.player"),
                    name: name.clone(),
                }
            })?;
            let seat = crate::eval::eval_player(&ctx.eval(), player)?;
            Ok((VarHandle::Player(seat, name.clone()), decl))
        }
        VarTarget::Zone { zone, name } => {
            let decl = ctx.def.var(VarScope::PerZone, name).ok_or_else(|| {
                EngineError::UndeclaredVariable {
                    ctx: ErrorContext::new("effect", "var.zone"),
                    name: name.clone(),
                }
            })?;
            let z = eval_zone(&ctx.eval(), zone)?;
            Ok((VarHandle::Zone(z, name.clone()), decl))
        }
    }
}

fn read_var(state: &GameState, handle: &VarHandle, default: i64) -> i64 {
    match handle {
        VarHandle::Global(name) => state.global(name, default),
        VarHandle::Player(player, name) => state.player_var(*player, name, default),
        VarHandle::Zone(zone, name) => state.zone_var(*zone, name, default),
    }
}

fn write_var(state: &mut GameState, handle: &VarHandle, value: i64) {
    match handle {
        VarHandle::Global(name) => state.set_global(name.clone(), value),
        VarHandle::Player(player, name) => state.set_player_var(*player, name.clone(), value),
        VarHandle::Zone(zone, name) => state.set_zone_var(*zone, name.clone(), value),
    }
}

/// Write `new` if it differs from the stored value; otherwise a
/// complete no-op: no state change, no event, no trace.
fn write_if_changed(
    ctx: &EffectContext,
    handle: VarHandle,
    decl: &VarDef,
    new: i64,
    log: &mut TraceLog,
) -> EngineResult<EffectResult> {
    let old = read_var(&ctx.state, &handle, decl.default);
    if old == new {
        return Ok(EffectResult::unchanged(
            ctx.state.clone(),
            ctx.rng,
            ctx.bindings.clone(),
        ));
    }

    let mut state = ctx.state.clone();
    write_var(&mut state, &handle, new);
    log.push(TraceEntry::VarChanged {
        var: handle.clone(),
        old,
        new,
    });
    trace!(var = %handle, old, new, "variable changed");

    let mut result = EffectResult::unchanged(state, ctx.rng, ctx.bindings.clone());
    result.events.push(EngineEvent::VarChanged {
        var: handle,
        old,
        new,
    });
    Ok(result)
}

fn apply_transfer(
    ctx: &EffectContext,
    from: &VarTarget,
    to: &VarTarget,
    amount: &crate::eval::ValueExpr,
    window: Option<&crate::eval::ValueExpr>,
    log: &mut TraceLog,
) -> EngineResult<EffectResult> {
    let (from_handle, from_decl) = resolve_target(ctx, from)?;
    let (to_handle, to_decl) = resolve_target(ctx, to)?;

    let unchanged = || {
        Ok(EffectResult::unchanged(
            ctx.state.clone(),
            ctx.rng,
            ctx.bindings.clone(),
        ))
    };

    // Identical endpoints: complete no-op before any evaluation of the
    // stored values.
    if from_handle == to_handle {
        return unchanged();
    }

    let requested = eval_int(&ctx.eval(), amount, "transfer.amount")?;
    let old_from = read_var(&ctx.state, &from_handle, from_decl.default);
    let old_to = read_var(&ctx.state, &to_handle, to_decl.default);

    let source_available = old_from - from_decl.min;
    let dest_headroom = to_decl.max - old_to;
    let mut actual = requested.clamp(0, source_available.min(dest_headroom).max(0));
    if let Some(window) = window {
        let cap = eval_int(&ctx.eval(), window, "transfer.window")?;
        actual = actual.min(cap.max(0));
    }

    if actual == 0 {
        return unchanged();
    }

    let mut state = ctx.state.clone();
    write_var(&mut state, &from_handle, old_from - actual);
    write_var(&mut state, &to_handle, old_to + actual);

    log.push(TraceEntry::ResourceTransferred {
        from: from_handle.clone(),
        to: to_handle.clone(),
        amount: actual,
    });
    trace!(from = %from_handle, to = %to_handle, amount = actual, "transferred");

    let mut result = EffectResult::unchanged(state, ctx.rng, ctx.bindings.clone());
    result.events.push(EngineEvent::VarChanged {
        var: from_handle,
        old: old_from,
        new: old_from - actual,
    });
    result.events.push(EngineEvent::VarChanged {
        var: to_handle,
        old: old_to,
        new: old_to + actual,
    });
    Ok(result)
}

// === Loops ===

#[allow(clippy::too_many_arguments)]
fn apply_for_each(
    ctx: &EffectContext,
    binder: &str,
    source: &crate::eval::Query,
    limit: Option<&crate::eval::ValueExpr>,
    body: &[Effect],
    count_binder: Option<&str>,
    then: &[Effect],
    budget: &mut Budgets,
    log: &mut TraceLog,
) -> EngineResult<EffectResult> {
    // Eager evaluation into a concrete ordered sequence.
    let items = eval_query(&ctx.eval(), source)?;
    let matched = items.len();

    let cap = match limit {
        None => matched,
        Some(expr) => {
            let n = eval_int(&ctx.eval(), expr, "forEach.limit")?;
            if n < 0 {
                return Err(EngineError::Type {
                    ctx: ErrorContext::new("effect", "forEach.limit"),
                    expected: "non-negative int",
                    got: n.to_string(),
                });
            }
            n as usize
        }
    };

    let truncated: Vec<Value> = items.into_iter().take(cap).collect();
    if matched > 0 && truncated.is_empty() {
        budget.warn(
            crate::core::budget::codes::ZERO_ITERATION,
            format!("forEach over `{binder}` matched {matched} but iterated none"),
        );
    }
    log.push(TraceEntry::LoopIteration {
        matched,
        iterated: truncated.len(),
    });

    let mut acc = EffectResult::unchanged(ctx.state.clone(), ctx.rng, ctx.bindings.clone());

    for item in &truncated {
        let mut iter_bindings = ctx.bindings.clone();
        iter_bindings.insert(binder.to_string(), item.clone());

        let iter_ctx = ctx.advanced(acc.state.clone(), acc.rng, iter_bindings);
        let step = apply_list(body, &iter_ctx, budget, log)?;

        acc.state = step.state;
        acc.rng = step.rng;
        acc.events.extend(step.events);
        // Per-iteration bindings stay local to the iteration.

        if step.pending.is_some() {
            acc.pending = step.pending;
            return Ok(acc);
        }
    }

    // Bind the truncated count before continuing.
    let mut out_bindings = ctx.bindings.clone();
    if let Some(cb) = count_binder {
        out_bindings.insert(cb.to_string(), Value::Int(truncated.len() as i64));
    }

    if then.is_empty() {
        acc.bindings = out_bindings;
        return Ok(acc);
    }

    let then_ctx = ctx.advanced(acc.state.clone(), acc.rng, out_bindings.clone());
    let step = apply_list(then, &then_ctx, budget, log)?;
    acc.state = step.state;
    acc.rng = step.rng;
    acc.events.extend(step.events);
    acc.pending = step.pending;
    acc.bindings = export_scoped(&out_bindings, &step.bindings, binder);
    Ok(acc)
}

#[allow(clippy::too_many_arguments)]
fn apply_reduce(
    ctx: &EffectContext,
    binder: &str,
    acc_binder: &str,
    source: &crate::eval::Query,
    init: &crate::eval::ValueExpr,
    body: &[Effect],
    then: &[Effect],
    budget: &mut Budgets,
    log: &mut TraceLog,
) -> EngineResult<EffectResult> {
    let items = eval_query(&ctx.eval(), source)?;
    let mut acc_value = eval_value(&ctx.eval(), init)?;

    let mut acc = EffectResult::unchanged(ctx.state.clone(), ctx.rng, ctx.bindings.clone());

    for item in &items {
        let mut iter_bindings = ctx.bindings.clone();
        iter_bindings.insert(acc_binder.to_string(), acc_value.clone());
        iter_bindings.insert(binder.to_string(), item.clone());

        let iter_ctx = ctx.advanced(acc.state.clone(), acc.rng, iter_bindings);
        let step = apply_list(body, &iter_ctx, budget, log)?;

        acc.state = step.state;
        acc.rng = step.rng;
        acc.events.extend(step.events);

        // The body updates the accumulator by rebinding it.
        if let Some(updated) = step.bindings.get(acc_binder) {
            acc_value = updated.clone();
        }

        if step.pending.is_some() {
            acc.pending = step.pending;
            return Ok(acc);
        }
    }

    let mut out_bindings = ctx.bindings.clone();
    out_bindings.insert(acc_binder.to_string(), acc_value);

    if then.is_empty() {
        acc.bindings = export_scoped(&ctx.bindings, &out_bindings, binder);
        return Ok(acc);
    }

    let then_ctx = ctx.advanced(acc.state.clone(), acc.rng, out_bindings.clone());
    let step = apply_list(then, &then_ctx, budget, log)?;
    acc.state = step.state;
    acc.rng = step.rng;
    acc.events.extend(step.events);
    acc.pending = step.pending;
    acc.bindings = export_scoped(&ctx.bindings, &step.bindings, binder);
    Ok(acc)
}

fn apply_remove_by_priority(
    ctx: &EffectContext,
    budget_expr: &crate::eval::ValueExpr,
    groups: &[RemovalGroup],
    remaining_binder: Option<&str>,
    log: &mut TraceLog,
) -> EngineResult<EffectResult> {
    let total = eval_int(&ctx.eval(), budget_expr, "removeByPriority.budget")?;
    if total < 0 {
        return Err(EngineError::Type {
            ctx: ErrorContext::new("effect", "removeByPriority.budget"),
            expected: "non-negative int",
            got: total.to_string(),
        });
    }

    let mut remaining = total;
    let mut acc = EffectResult::unchanged(ctx.state.clone(), ctx.rng, ctx.bindings.clone());
    let mut out_bindings = ctx.bindings.clone();

    for (index, group) in groups.iter().enumerate() {
        // Candidates are queried against the state after prior groups.
        let group_ctx = ctx.advanced(acc.state.clone(), acc.rng, out_bindings.clone());
        let candidates = eval_query(&group_ctx.eval(), &group.candidates)?;
        let dest = eval_zone(&group_ctx.eval(), &group.to)?;

        let mut removed = 0usize;
        let mut from_zones = Vec::new();

        for candidate in candidates {
            if remaining == 0 {
                break;
            }
            let Some(token) = candidate.as_token() else {
                return Err(EngineError::Type {
                    ctx: ErrorContext::new("effect", "removeByPriority.candidate"),
                    expected: "token",
                    got: candidate.kind().to_string(),
                });
            };
            let Some(current_zone) = acc.state.zone_of(token) else {
                return Err(EngineError::Type {
                    ctx: ErrorContext::new("effect", "removeByPriority.candidate"),
                    expected: "token in a zone",
                    got: format!("{token}"),
                });
            };
            if current_zone == dest {
                continue;
            }

            // Synthesized move, keyed by the token's current zone.
            acc.state.move_token(token, dest, None);
            log.push(TraceEntry::TokenMoved {
                token,
                from: current_zone,
                to: dest,
            });
            acc.events.push(EngineEvent::TokenMoved {
                token,
                from: current_zone,
                to: dest,
            });
            from_zones.push(current_zone);
            removed += 1;
            remaining -= 1;
        }

        log.push(TraceEntry::RemovalGroup {
            group: index,
            removed,
            from_zones,
        });

        if let Some(binder) = &group.removed_binder {
            out_bindings.insert(binder.clone(), Value::Int(removed as i64));
        }
    }

    if let Some(binder) = remaining_binder {
        out_bindings.insert(binder.to_string(), Value::Int(remaining));
    }

    acc.bindings = out_bindings;
    Ok(acc)
}

// === Decisions ===

#[allow(clippy::too_many_arguments)]
fn apply_choose_one(
    ctx: &EffectContext,
    decision: &str,
    options: &crate::eval::Query,
    legal_if: Option<&crate::eval::CondExpr>,
    binder: &str,
    body: &[Effect],
    budget: &mut Budgets,
    log: &mut TraceLog,
) -> EngineResult<EffectResult> {
    let strict = ctx.mode == ExecMode::Execute;
    let key = subst::instantiate(decision, &ctx.bindings, strict)?;

    match ctx.params.get(&key) {
        Some(choice) => {
            let domain = eval_query(&ctx.eval(), options)?;
            if !domain.contains(choice) {
                return Err(EngineError::Illegal {
                    action: ctx.action,
                    reason: IllegalMoveReason::ChoiceOutsideDomain { decision: key },
                });
            }
            if let Some(cond) = legal_if {
                if !option_is_legal(ctx, binder, choice, cond)? {
                    return Err(EngineError::Illegal {
                        action: ctx.action,
                        reason: IllegalMoveReason::PreconditionFailed,
                    });
                }
            }

            let mut inner_bindings = ctx.bindings.clone();
            inner_bindings.insert(binder.to_string(), choice.clone());
            let inner_ctx = ctx.advanced(ctx.state.clone(), ctx.rng, inner_bindings);
            let mut result = apply_list(body, &inner_ctx, budget, log)?;
            result.bindings = export_scoped(&ctx.bindings, &result.bindings, binder);
            Ok(result)
        }
        None if strict => Err(EngineError::MissingBinding {
            decision: key,
            deferred: false,
        }),
        None => {
            // Discovery: list the domain without touching state or RNG.
            let domain = eval_query(&ctx.eval(), options)?;
            let mut listed = Vec::with_capacity(domain.len());
            for value in domain {
                let legal = match legal_if {
                    Some(cond) => option_is_legal(ctx, binder, &value, cond)?,
                    None => true,
                };
                listed.push(ChoiceOption { value, legal });
            }

            let mut result = EffectResult::unchanged(
                ctx.state.clone(),
                ctx.rng,
                ctx.bindings.clone(),
            );
            result.pending = Some(PendingChoice {
                decision: key,
                kind: ChoiceKind::One,
                options: listed,
                min: 1,
                max: 1,
            });
            Ok(result)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_choose_n(
    ctx: &EffectContext,
    decision: &str,
    options: &crate::eval::Query,
    min: &crate::eval::ValueExpr,
    max: &crate::eval::ValueExpr,
    legal_if: Option<&crate::eval::CondExpr>,
    binder: &str,
    body: &[Effect],
    budget: &mut Budgets,
    log: &mut TraceLog,
) -> EngineResult<EffectResult> {
    let strict = ctx.mode == ExecMode::Execute;
    let key = subst::instantiate(decision, &ctx.bindings, strict)?;

    let min = eval_int(&ctx.eval(), min, "chooseN.min")?.max(0) as usize;
    let max = eval_int(&ctx.eval(), max, "chooseN.max")?.max(0) as usize;

    match ctx.params.get(&key) {
        Some(selection) => {
            let Some(chosen) = selection.as_list() else {
                return Err(EngineError::Type {
                    ctx: ErrorContext::new("effect", "chooseN.selection"),
                    expected: "list",
                    got: selection.kind().to_string(),
                });
            };
            let domain = eval_query(&ctx.eval(), options)?;
            if chosen.len() < min || chosen.len() > max {
                return Err(EngineError::Illegal {
                    action: ctx.action,
                    reason: IllegalMoveReason::ChoiceOutsideDomain { decision: key },
                });
            }
            for value in chosen {
                if !domain.contains(value) {
                    return Err(EngineError::Illegal {
                        action: ctx.action,
                        reason: IllegalMoveReason::ChoiceOutsideDomain { decision: key },
                    });
                }
                if let Some(cond) = legal_if {
                    if !option_is_legal(ctx, binder, value, cond)? {
                        return Err(EngineError::Illegal {
                            action: ctx.action,
                            reason: IllegalMoveReason::PreconditionFailed,
                        });
                    }
                }
            }

            let mut inner_bindings = ctx.bindings.clone();
            inner_bindings.insert(binder.to_string(), selection.clone());
            let inner_ctx = ctx.advanced(ctx.state.clone(), ctx.rng, inner_bindings);
            let mut result = apply_list(body, &inner_ctx, budget, log)?;
            result.bindings = export_scoped(&ctx.bindings, &result.bindings, binder);
            Ok(result)
        }
        None if strict => Err(EngineError::MissingBinding {
            decision: key,
            deferred: false,
        }),
        None => {
            let domain = eval_query(&ctx.eval(), options)?;
            let mut listed = Vec::with_capacity(domain.len());
            for value in domain {
                let legal = match legal_if {
                    Some(cond) => option_is_legal(ctx, binder, &value, cond)?,
                    None => true,
                };
                listed.push(ChoiceOption { value, legal });
            }

            let mut result = EffectResult::unchanged(
                ctx.state.clone(),
                ctx.rng,
                ctx.bindings.clone(),
            );
            result.pending = Some(PendingChoice {
                decision: key,
                kind: ChoiceKind::Many,
                options: listed,
                min,
                max,
            });
            Ok(result)
        }
    }
}

/// Speculative per-option legality: evaluated read-only with the option
/// bound to the decision's binder.
fn option_is_legal(
    ctx: &EffectContext,
    binder: &str,
    option: &Value,
    cond: &crate::eval::CondExpr,
) -> EngineResult<bool> {
    let mut scoped = ctx.bindings.clone();
    scoped.insert(binder.to_string(), option.clone());
    let probe_ctx = ctx.advanced(ctx.state.clone(), ctx.rng, scoped);
    eval_cond(&probe_ctx.eval(), cond)
}
