//! Pure evaluators over `(definition, state, bindings, params)`.
//!
//! The same evaluators back preconditions, parameter domains, decision
//! option domains, and effect operands. They never mutate anything.
//!
//! ## Strictness
//!
//! `EvalCtx::strict` marks an execution boundary. A lookup of a binding
//! or parameter that is not in scope raises `UnboundSelector`; the
//! `deferred` flag on that error is `!strict`, so mid-enumeration
//! probing can classify the failure as "not yet applicable" while
//! execution treats it as fatal.

use crate::core::{GameState, PlayerId, TokenId, Value, ZoneId};
use crate::definition::{GameDefinition, VarScope};
use crate::error::{EngineError, EngineResult, ErrorContext};
use crate::moves::MoveParams;

use super::expr::{CmpOp, CondExpr, Query, ValueExpr};
use super::Bindings;

/// Read-only evaluation context.
#[derive(Clone, Copy)]
pub struct EvalCtx<'a> {
    /// The loaded definition.
    pub def: &'a GameDefinition,
    /// The snapshot being evaluated against.
    pub state: &'a GameState,
    /// Bindings in scope.
    pub bindings: &'a Bindings,
    /// Move parameters in scope.
    pub params: &'a MoveParams,
    /// Seat whose turn it is.
    pub active: PlayerId,
    /// Seat executing the current action.
    pub actor: PlayerId,
    /// True at execution boundaries: unbound names are fatal.
    pub strict: bool,
}

impl<'a> EvalCtx<'a> {
    fn lookup_binding(&self, name: &str) -> EngineResult<Value> {
        match self.bindings.get(name) {
            Some(value) => Ok(value.clone()),
            None => Err(EngineError::UnboundSelector {
                name: name.to_string(),
                deferred: !self.strict,
            }),
        }
    }

    fn lookup_param(&self, name: &str) -> EngineResult<Value> {
        match self.params.get(name) {
            Some(value) => Ok(value.clone()),
            None => Err(EngineError::UnboundSelector {
                name: name.to_string(),
                deferred: !self.strict,
            }),
        }
    }
}

fn type_error(subject: &str, expected: &'static str, got: &Value) -> EngineError {
    EngineError::Type {
        ctx: ErrorContext::new("eval", subject),
        expected,
        got: got.kind().to_string(),
    }
}

/// Evaluate a value expression.
pub fn eval_value(ctx: &EvalCtx, expr: &ValueExpr) -> EngineResult<Value> {
    match expr {
        ValueExpr::Const(value) => Ok(value.clone()),

        ValueExpr::GlobalVar(name) => {
            let var = ctx.def.var(VarScope::Global, name).ok_or_else(|| {
                EngineError::UndeclaredVariable {
                    ctx: ErrorContext::new("eval", "global"),
                    name: name.clone(),
                }
            })?;
            Ok(Value::Int(ctx.state.global(name, var.default)))
        }

        ValueExpr::PlayerVar { player, name } => {
            let var = ctx.def.var(VarScope::PerPlayer, name).ok_or_else(|| {
                EngineError::UndeclaredVariable {
                    ctx: ErrorContext::new("eval", "player-var"),
                    name: name.clone(),
                }
            })?;
            let seat = eval_player(ctx, player)?;
            Ok(Value::Int(ctx.state.player_var(seat, name, var.default)))
        }

        ValueExpr::ZoneVar { zone, name } => {
            let var = ctx.def.var(VarScope::PerZone, name).ok_or_else(|| {
                EngineError::UndeclaredVariable {
                    ctx: ErrorContext::new("eval", "zone-var"),
                    name: name.clone(),
                }
            })?;
            let z = eval_zone(ctx, zone)?;
            Ok(Value::Int(ctx.state.zone_var(z, name, var.default)))
        }

        ValueExpr::TokenProp {
            token,
            prop,
            default,
        } => {
            let id = eval_token(ctx, token)?;
            let tok = ctx.state.token(id).ok_or_else(|| EngineError::Type {
                ctx: ErrorContext::new("eval", "token-prop"),
                expected: "known token",
                got: format!("{id}"),
            })?;
            Ok(Value::Int(tok.prop(prop, *default)))
        }

        ValueExpr::ZoneOfToken(token) => {
            let id = eval_token(ctx, token)?;
            match ctx.state.zone_of(id) {
                Some(zone) => Ok(Value::Zone(zone)),
                None => Err(EngineError::Type {
                    ctx: ErrorContext::new("eval", "zone-of-token"),
                    expected: "token in a zone",
                    got: format!("{id}"),
                }),
            }
        }

        ValueExpr::ActivePlayer => Ok(Value::Player(ctx.active)),
        ValueExpr::ActorPlayer => Ok(Value::Player(ctx.actor)),
        ValueExpr::Binding(name) => ctx.lookup_binding(name),
        ValueExpr::Param(name) => ctx.lookup_param(name),

        ValueExpr::Count(query) => {
            let items = eval_query(ctx, query)?;
            Ok(Value::Int(items.len() as i64))
        }

        ValueExpr::Len(inner) => {
            let value = eval_value(ctx, inner)?;
            match value.as_list() {
                Some(items) => Ok(Value::Int(items.len() as i64)),
                None => Err(type_error("len", "list", &value)),
            }
        }

        ValueExpr::Add(a, b) => arith(ctx, a, b, "add", |x, y| x.wrapping_add(y)),
        ValueExpr::Sub(a, b) => arith(ctx, a, b, "sub", |x, y| x.wrapping_sub(y)),
        ValueExpr::Mul(a, b) => arith(ctx, a, b, "mul", |x, y| x.wrapping_mul(y)),
        ValueExpr::Min(a, b) => arith(ctx, a, b, "min", i64::min),
        ValueExpr::Max(a, b) => arith(ctx, a, b, "max", i64::max),

        ValueExpr::Neg(inner) => {
            let n = eval_int(ctx, inner, "neg")?;
            Ok(Value::Int(n.wrapping_neg()))
        }
    }
}

fn arith(
    ctx: &EvalCtx,
    a: &ValueExpr,
    b: &ValueExpr,
    subject: &'static str,
    op: impl Fn(i64, i64) -> i64,
) -> EngineResult<Value> {
    let x = eval_int(ctx, a, subject)?;
    let y = eval_int(ctx, b, subject)?;
    Ok(Value::Int(op(x, y)))
}

/// Evaluate an expression expecting an integer.
pub fn eval_int(ctx: &EvalCtx, expr: &ValueExpr, subject: &str) -> EngineResult<i64> {
    let value = eval_value(ctx, expr)?;
    value
        .as_int()
        .ok_or_else(|| type_error(subject, "int", &value))
}

/// Evaluate an expression expecting a seat.
pub fn eval_player(ctx: &EvalCtx, expr: &ValueExpr) -> EngineResult<PlayerId> {
    let value = eval_value(ctx, expr)?;
    value
        .as_player()
        .ok_or_else(|| type_error("player", "player", &value))
}

/// Evaluate an expression expecting a zone.
pub fn eval_zone(ctx: &EvalCtx, expr: &ValueExpr) -> EngineResult<ZoneId> {
    let value = eval_value(ctx, expr)?;
    value
        .as_zone()
        .ok_or_else(|| type_error("zone", "zone", &value))
}

/// Evaluate an expression expecting a token.
pub fn eval_token(ctx: &EvalCtx, expr: &ValueExpr) -> EngineResult<TokenId> {
    let value = eval_value(ctx, expr)?;
    value
        .as_token()
        .ok_or_else(|| type_error("token", "token", &value))
}

/// Resolve an actor/executor selector to a seat.
///
/// `Param`/`Binding` selectors go through the context's lookup rules,
/// so an unbound name defers or fails according to `ctx.strict`.
pub fn resolve_selector(
    ctx: &EvalCtx,
    selector: &crate::definition::PlayerSelector,
) -> EngineResult<PlayerId> {
    use crate::definition::PlayerSelector;

    match selector {
        PlayerSelector::Active => Ok(ctx.active),
        PlayerSelector::Seat(seat) => Ok(*seat),
        PlayerSelector::Param(name) => {
            let value = ctx.lookup_param(name)?;
            value
                .as_player()
                .ok_or_else(|| type_error("selector", "player", &value))
        }
        PlayerSelector::Binding(name) => {
            let value = ctx.lookup_binding(name)?;
            value
                .as_player()
                .ok_or_else(|| type_error("selector", "player", &value))
        }
    }
}

/// Evaluate a condition.
pub fn eval_cond(ctx: &EvalCtx, cond: &CondExpr) -> EngineResult<bool> {
    match cond {
        CondExpr::Const(b) => Ok(*b),

        CondExpr::Cmp { op, lhs, rhs } => {
            let a = eval_value(ctx, lhs)?;
            let b = eval_value(ctx, rhs)?;
            match (a.as_int(), b.as_int()) {
                (Some(x), Some(y)) => Ok(match op {
                    CmpOp::Eq => x == y,
                    CmpOp::Ne => x != y,
                    CmpOp::Lt => x < y,
                    CmpOp::Le => x <= y,
                    CmpOp::Gt => x > y,
                    CmpOp::Ge => x >= y,
                }),
                // Non-numeric values only support (in)equality.
                _ => match op {
                    CmpOp::Eq => Ok(a == b),
                    CmpOp::Ne => Ok(a != b),
                    _ => Err(EngineError::Type {
                        ctx: ErrorContext::new("eval", "cmp"),
                        expected: "int operands for ordering",
                        got: format!("{} vs {}", a.kind(), b.kind()),
                    }),
                },
            }
        }

        CondExpr::All(conds) => {
            for c in conds {
                if !eval_cond(ctx, c)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }

        CondExpr::Any(conds) => {
            for c in conds {
                if eval_cond(ctx, c)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }

        CondExpr::Not(inner) => Ok(!eval_cond(ctx, inner)?),

        CondExpr::PhaseIs(phase) => Ok(ctx.state.phase == *phase),

        CondExpr::HasMarker { zone, marker } => {
            let z = eval_zone(ctx, zone)?;
            Ok(ctx.state.has_marker(z, marker))
        }
    }
}

/// Evaluate a query into an ordered list of values.
///
/// Ordering is deterministic: zone contents bottom-to-top, zones in
/// definition order, seats by index, ranges ascending.
pub fn eval_query(ctx: &EvalCtx, query: &Query) -> EngineResult<Vec<Value>> {
    match query {
        Query::TokensIn(zone) => {
            let z = eval_zone(ctx, zone)?;
            Ok(ctx
                .state
                .tokens_in_zone(z)
                .iter()
                .map(|&t| Value::Token(t))
                .collect())
        }

        Query::TokensOfType { token_type, zone } => {
            let zones: Vec<ZoneId> = match zone {
                Some(expr) => vec![eval_zone(ctx, expr)?],
                None => ctx.def.zones.iter().map(|z| z.id).collect(),
            };
            let mut out = Vec::new();
            for z in zones {
                for t in ctx.state.tokens_in_zone(z) {
                    let matches = ctx
                        .state
                        .token(t)
                        .is_some_and(|tok| tok.token_type == *token_type);
                    if matches {
                        out.push(Value::Token(t));
                    }
                }
            }
            Ok(out)
        }

        Query::Zones => Ok(ctx.def.zones.iter().map(|z| Value::Zone(z.id)).collect()),

        Query::AdjacentZones(zone) => {
            let z = eval_zone(ctx, zone)?;
            Ok(ctx
                .def
                .cache()
                .adjacent(z)
                .iter()
                .map(|&n| Value::Zone(n))
                .collect())
        }

        Query::Players => Ok(PlayerId::all(ctx.def.player_count)
            .map(Value::Player)
            .collect()),

        Query::IntRange { from, to } => {
            let lo = eval_int(ctx, from, "range.from")?;
            let hi = eval_int(ctx, to, "range.to")?;
            Ok((lo..=hi).map(Value::Int).collect())
        }

        Query::Explicit(exprs) => exprs.iter().map(|e| eval_value(ctx, e)).collect(),

        Query::Filter { base, binder, cond } => {
            let items = eval_query(ctx, base)?;
            let mut out = Vec::new();
            for item in items {
                let mut scoped = ctx.bindings.clone();
                scoped.insert(binder.clone(), item.clone());
                let child = EvalCtx {
                    bindings: &scoped,
                    ..*ctx
                };
                if eval_cond(&child, cond)? {
                    out.push(item);
                }
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Token, TokenTypeId, ZonePosition};
    use crate::definition::{VarDef, ZoneDef};

    fn fixture() -> (GameDefinition, GameState) {
        let mut def = GameDefinition::new("eval-test", 2);
        def.zones = vec![
            ZoneDef::new(ZoneId::new(0), "north").with_adjacent([ZoneId::new(1)]),
            ZoneDef::new(ZoneId::new(1), "south"),
        ];
        def.vars = vec![
            VarDef::new("pot", VarScope::Global, 0, 1000, 0),
            VarDef::new("chips", VarScope::PerPlayer, 0, 1000, 100),
            VarDef::new("control", VarScope::PerZone, -5, 5, 0),
        ];
        def.rebuild_cache();

        let mut state = def.initial_state(42);
        state.set_global("pot", 60);
        state.set_player_var(PlayerId::new(1), "chips", 70);
        state.set_zone_var(ZoneId::new(1), "control", 3);
        state.add_token(
            Token::new(TokenId::new(10), TokenTypeId::new(0)).with_prop("strength", 2),
            ZoneId::new(0),
            Some(ZonePosition::Top),
        );
        state.add_token(
            Token::new(TokenId::new(11), TokenTypeId::new(1)),
            ZoneId::new(0),
            Some(ZonePosition::Top),
        );

        (def, state)
    }

    fn ctx<'a>(
        def: &'a GameDefinition,
        state: &'a GameState,
        bindings: &'a Bindings,
        params: &'a MoveParams,
    ) -> EvalCtx<'a> {
        EvalCtx {
            def,
            state,
            bindings,
            params,
            active: PlayerId::new(0),
            actor: PlayerId::new(1),
            strict: false,
        }
    }

    #[test]
    fn test_variable_reads() {
        let (def, state) = fixture();
        let bindings = Bindings::new();
        let params = MoveParams::new();
        let ctx = ctx(&def, &state, &bindings, &params);

        assert_eq!(
            eval_value(&ctx, &ValueExpr::global("pot")).unwrap(),
            Value::Int(60)
        );
        assert_eq!(
            eval_value(&ctx, &ValueExpr::actor_var("chips")).unwrap(),
            Value::Int(70)
        );
        assert_eq!(
            eval_value(
                &ctx,
                &ValueExpr::ZoneVar {
                    zone: Box::new(ValueExpr::zone(ZoneId::new(1))),
                    name: "control".into(),
                }
            )
            .unwrap(),
            Value::Int(3)
        );
    }

    #[test]
    fn test_undeclared_variable_is_fatal() {
        let (def, state) = fixture();
        let bindings = Bindings::new();
        let params = MoveParams::new();
        let ctx = ctx(&def, &state, &bindings, &params);

        let err = eval_value(&ctx, &ValueExpr::global("nope")).unwrap_err();
        assert!(matches!(err, EngineError::UndeclaredVariable { .. }));
        assert!(!err.is_deferred());
    }

    #[test]
    fn test_unbound_selector_deferred_flag_tracks_strictness() {
        let (def, state) = fixture();
        let bindings = Bindings::new();
        let params = MoveParams::new();

        let lax = ctx(&def, &state, &bindings, &params);
        let err = eval_value(&lax, &ValueExpr::param("target")).unwrap_err();
        assert!(err.is_deferred());

        let strict = EvalCtx { strict: true, ..lax };
        let err = eval_value(&strict, &ValueExpr::param("target")).unwrap_err();
        assert!(!err.is_deferred());
    }

    #[test]
    fn test_arithmetic_and_cmp() {
        let (def, state) = fixture();
        let bindings = Bindings::new();
        let params = MoveParams::new();
        let ctx = ctx(&def, &state, &bindings, &params);

        let sum = ValueExpr::add(ValueExpr::global("pot"), ValueExpr::int(4));
        assert_eq!(eval_value(&ctx, &sum).unwrap(), Value::Int(64));

        assert!(eval_cond(
            &ctx,
            &CondExpr::at_least(ValueExpr::global("pot"), ValueExpr::int(60))
        )
        .unwrap());
        assert!(!eval_cond(
            &ctx,
            &CondExpr::cmp(CmpOp::Gt, ValueExpr::global("pot"), ValueExpr::int(60))
        )
        .unwrap());
    }

    #[test]
    fn test_ordering_on_non_int_is_type_error() {
        let (def, state) = fixture();
        let bindings = Bindings::new();
        let params = MoveParams::new();
        let ctx = ctx(&def, &state, &bindings, &params);

        let cond = CondExpr::cmp(
            CmpOp::Lt,
            ValueExpr::Const(Value::Zone(ZoneId::new(0))),
            ValueExpr::Const(Value::Zone(ZoneId::new(1))),
        );
        assert!(matches!(
            eval_cond(&ctx, &cond).unwrap_err(),
            EngineError::Type { .. }
        ));
    }

    #[test]
    fn test_token_queries() {
        let (def, state) = fixture();
        let bindings = Bindings::new();
        let params = MoveParams::new();
        let ctx = ctx(&def, &state, &bindings, &params);

        let all = eval_query(&ctx, &Query::tokens_in(ZoneId::new(0))).unwrap();
        assert_eq!(all.len(), 2);
        // Bottom-to-top: token 10 was added first.
        assert_eq!(all[0], Value::Token(TokenId::new(10)));

        let typed = eval_query(
            &ctx,
            &Query::TokensOfType {
                token_type: TokenTypeId::new(1),
                zone: None,
            },
        )
        .unwrap();
        assert_eq!(typed, vec![Value::Token(TokenId::new(11))]);
    }

    #[test]
    fn test_filter_query_binds_item() {
        let (def, state) = fixture();
        let bindings = Bindings::new();
        let params = MoveParams::new();
        let ctx = ctx(&def, &state, &bindings, &params);

        let strong = Query::tokens_in(ZoneId::new(0)).filtered(
            "t",
            CondExpr::at_least(
                ValueExpr::TokenProp {
                    token: Box::new(ValueExpr::binding("t")),
                    prop: "strength".into(),
                    default: 0,
                },
                ValueExpr::int(1),
            ),
        );

        let matches = eval_query(&ctx, &strong).unwrap();
        assert_eq!(matches, vec![Value::Token(TokenId::new(10))]);
    }

    #[test]
    fn test_adjacency_query_uses_cache() {
        let (def, state) = fixture();
        let bindings = Bindings::new();
        let params = MoveParams::new();
        let ctx = ctx(&def, &state, &bindings, &params);

        let adj = eval_query(
            &ctx,
            &Query::AdjacentZones(ValueExpr::zone(ZoneId::new(1))),
        )
        .unwrap();
        assert_eq!(adj, vec![Value::Zone(ZoneId::new(0))]);
    }

    #[test]
    fn test_int_range() {
        let (def, state) = fixture();
        let bindings = Bindings::new();
        let params = MoveParams::new();
        let ctx = ctx(&def, &state, &bindings, &params);

        let range = eval_query(&ctx, &Query::int_range(2, 4)).unwrap();
        assert_eq!(range, vec![Value::Int(2), Value::Int(3), Value::Int(4)]);

        let empty = eval_query(&ctx, &Query::int_range(4, 2)).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_evaluation_never_mutates() {
        let (def, state) = fixture();
        let bindings = Bindings::new();
        let params = MoveParams::new();
        let before = state.content_hash();

        let ctx = ctx(&def, &state, &bindings, &params);
        let _ = eval_query(&ctx, &Query::Zones).unwrap();
        let _ = eval_value(&ctx, &ValueExpr::global("pot")).unwrap();

        assert_eq!(state.content_hash(), before);
    }
}
