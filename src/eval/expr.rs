//! Expression syntax: values, conditions, queries.
//!
//! These are closed tagged unions produced by the game compiler. The
//! kernel evaluates them; it never builds them at runtime except in
//! tests. Constructor helpers keep test definitions readable.

use serde::{Deserialize, Serialize};

use crate::core::{PhaseId, TokenTypeId, Value, ZoneId};

/// Comparison operators for [`CondExpr::Cmp`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater or equal.
    Ge,
}

/// A value-producing expression.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueExpr {
    /// Literal value.
    Const(Value),

    // === State reads ===
    /// Global variable by name.
    GlobalVar(String),
    /// Per-player variable; `player` must evaluate to a player.
    PlayerVar {
        /// Seat owning the variable.
        player: Box<ValueExpr>,
        /// Variable name.
        name: String,
    },
    /// Per-zone variable; `zone` must evaluate to a zone.
    ZoneVar {
        /// Zone owning the variable.
        zone: Box<ValueExpr>,
        /// Variable name.
        name: String,
    },
    /// Property of a token, with default when absent.
    TokenProp {
        /// Token to read; must evaluate to a token.
        token: Box<ValueExpr>,
        /// Property key.
        prop: String,
        /// Default when the property is unset.
        default: i64,
    },
    /// Zone currently holding a token.
    ZoneOfToken(Box<ValueExpr>),

    // === Context reads ===
    /// The seat whose turn it is.
    ActivePlayer,
    /// The seat executing the current action.
    ActorPlayer,
    /// An effect-introduced binding.
    Binding(String),
    /// A move parameter.
    Param(String),

    // === Aggregates ===
    /// Number of items a query matches.
    Count(Box<Query>),
    /// Length of a list value.
    Len(Box<ValueExpr>),

    // === Arithmetic (integer operands) ===
    /// Sum of two values.
    Add(Box<ValueExpr>, Box<ValueExpr>),
    /// Difference of two values.
    Sub(Box<ValueExpr>, Box<ValueExpr>),
    /// Product of two values.
    Mul(Box<ValueExpr>, Box<ValueExpr>),
    /// Negation.
    Neg(Box<ValueExpr>),
    /// Smaller of two values.
    Min(Box<ValueExpr>, Box<ValueExpr>),
    /// Larger of two values.
    Max(Box<ValueExpr>, Box<ValueExpr>),
}

impl ValueExpr {
    /// Integer literal.
    #[must_use]
    pub fn int(n: i64) -> Self {
        Self::Const(Value::Int(n))
    }

    /// Zone literal.
    #[must_use]
    pub fn zone(z: ZoneId) -> Self {
        Self::Const(Value::Zone(z))
    }

    /// Global variable read.
    #[must_use]
    pub fn global(name: impl Into<String>) -> Self {
        Self::GlobalVar(name.into())
    }

    /// Binding read.
    #[must_use]
    pub fn binding(name: impl Into<String>) -> Self {
        Self::Binding(name.into())
    }

    /// Move parameter read.
    #[must_use]
    pub fn param(name: impl Into<String>) -> Self {
        Self::Param(name.into())
    }

    /// Per-player variable of the active seat.
    #[must_use]
    pub fn active_var(name: impl Into<String>) -> Self {
        Self::PlayerVar {
            player: Box::new(Self::ActivePlayer),
            name: name.into(),
        }
    }

    /// Per-player variable of the acting seat.
    #[must_use]
    pub fn actor_var(name: impl Into<String>) -> Self {
        Self::PlayerVar {
            player: Box::new(Self::ActorPlayer),
            name: name.into(),
        }
    }

    /// `a + b`.
    #[must_use]
    pub fn add(a: ValueExpr, b: ValueExpr) -> Self {
        Self::Add(Box::new(a), Box::new(b))
    }

    /// `a - b`.
    #[must_use]
    pub fn sub(a: ValueExpr, b: ValueExpr) -> Self {
        Self::Sub(Box::new(a), Box::new(b))
    }

    /// Count of a query's matches.
    #[must_use]
    pub fn count(query: Query) -> Self {
        Self::Count(Box::new(query))
    }
}

/// A boolean condition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CondExpr {
    /// Literal truth value.
    Const(bool),
    /// Compare two values. Integers compare numerically; other values
    /// compare by canonical order and only for `Eq`/`Ne`.
    Cmp {
        /// Operator.
        op: CmpOp,
        /// Left operand.
        lhs: ValueExpr,
        /// Right operand.
        rhs: ValueExpr,
    },
    /// All conditions hold (true when empty).
    All(Vec<CondExpr>),
    /// At least one condition holds (false when empty).
    Any(Vec<CondExpr>),
    /// Condition does not hold.
    Not(Box<CondExpr>),
    /// The current phase is exactly this phase.
    PhaseIs(PhaseId),
    /// A marker is present in a zone.
    HasMarker {
        /// Zone to inspect.
        zone: ValueExpr,
        /// Marker name.
        marker: String,
    },
}

impl CondExpr {
    /// `lhs op rhs` comparison.
    #[must_use]
    pub fn cmp(op: CmpOp, lhs: ValueExpr, rhs: ValueExpr) -> Self {
        Self::Cmp { op, lhs, rhs }
    }

    /// `lhs >= rhs`.
    #[must_use]
    pub fn at_least(lhs: ValueExpr, rhs: ValueExpr) -> Self {
        Self::cmp(CmpOp::Ge, lhs, rhs)
    }

    /// `lhs == rhs`.
    #[must_use]
    pub fn equals(lhs: ValueExpr, rhs: ValueExpr) -> Self {
        Self::cmp(CmpOp::Eq, lhs, rhs)
    }

    /// Conjunction.
    #[must_use]
    pub fn all(conds: impl IntoIterator<Item = CondExpr>) -> Self {
        Self::All(conds.into_iter().collect())
    }
}

/// A query producing an ordered list of values.
///
/// Queries are the source of `ForEach` iteration, parameter domains,
/// and decision option domains. Evaluation order is always
/// deterministic: zone contents bottom-to-top, zones by id, seats by
/// index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Query {
    /// Tokens in one zone, bottom-to-top.
    TokensIn(ValueExpr),
    /// Tokens of a type; in one zone if given, else across all zones
    /// in zone-id order.
    TokensOfType {
        /// The token type.
        token_type: TokenTypeId,
        /// Optional containing zone.
        zone: Option<ValueExpr>,
    },
    /// All declared zones, in definition order.
    Zones,
    /// Zones adjacent to a zone, from the runtime cache, in id order.
    AdjacentZones(ValueExpr),
    /// All seats, in seat order.
    Players,
    /// Integers `from..=to` (empty when `from > to`).
    IntRange {
        /// Lower bound, inclusive.
        from: ValueExpr,
        /// Upper bound, inclusive.
        to: ValueExpr,
    },
    /// Explicit list of values.
    Explicit(Vec<ValueExpr>),
    /// Keep only items where `cond` holds with the item bound to
    /// `binder`.
    Filter {
        /// Source query.
        base: Box<Query>,
        /// Name the item is bound to while testing `cond`.
        binder: String,
        /// Per-item condition.
        cond: Box<CondExpr>,
    },
}

impl Query {
    /// Tokens in a literal zone.
    #[must_use]
    pub fn tokens_in(zone: ZoneId) -> Self {
        Self::TokensIn(ValueExpr::zone(zone))
    }

    /// Integer range domain.
    #[must_use]
    pub fn int_range(from: i64, to: i64) -> Self {
        Self::IntRange {
            from: ValueExpr::int(from),
            to: ValueExpr::int(to),
        }
    }

    /// Filter this query with a per-item condition.
    #[must_use]
    pub fn filtered(self, binder: impl Into<String>, cond: CondExpr) -> Self {
        Self::Filter {
            base: Box::new(self),
            binder: binder.into(),
            cond: Box::new(cond),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert_eq!(ValueExpr::int(3), ValueExpr::Const(Value::Int(3)));
        assert_eq!(
            ValueExpr::zone(ZoneId::new(1)),
            ValueExpr::Const(Value::Zone(ZoneId::new(1)))
        );

        match Query::int_range(1, 6) {
            Query::IntRange { from, to } => {
                assert_eq!(from, ValueExpr::int(1));
                assert_eq!(to, ValueExpr::int(6));
            }
            _ => panic!("Expected IntRange"),
        }
    }

    #[test]
    fn test_filtered_wraps_base() {
        let q = Query::tokens_in(ZoneId::new(0)).filtered(
            "t",
            CondExpr::at_least(
                ValueExpr::TokenProp {
                    token: Box::new(ValueExpr::binding("t")),
                    prop: "strength".into(),
                    default: 0,
                },
                ValueExpr::int(2),
            ),
        );

        match q {
            Query::Filter { binder, .. } => assert_eq!(binder, "t"),
            _ => panic!("Expected Filter"),
        }
    }

    #[test]
    fn test_serialization() {
        let expr = ValueExpr::add(ValueExpr::global("pot"), ValueExpr::int(5));
        let json = serde_json::to_string(&expr).unwrap();
        let deserialized: ValueExpr = serde_json::from_str(&json).unwrap();
        assert_eq!(expr, deserialized);
    }
}
