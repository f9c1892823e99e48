//! Effect syntax tree.
//!
//! A closed tagged union with one variant per effect kind and a single
//! exhaustive dispatcher in `interp`. Adding a kind means updating
//! both; the compiler's exhaustiveness check enforces it. Nesting is
//! tree-shaped, never cyclic.

use serde::{Deserialize, Serialize};

use crate::core::{PhaseId, ZonePosition};
use crate::eval::{CondExpr, Query, ValueExpr};

/// A variable write target in one of the three scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarTarget {
    /// Global variable.
    Global {
        /// Variable name.
        name: String,
    },
    /// Per-player variable; `player` must evaluate to a seat.
    Player {
        /// Owning seat.
        player: ValueExpr,
        /// Variable name.
        name: String,
    },
    /// Per-zone variable; `zone` must evaluate to a zone.
    Zone {
        /// Owning zone.
        zone: ValueExpr,
        /// Variable name.
        name: String,
    },
}

impl VarTarget {
    /// Global target.
    #[must_use]
    pub fn global(name: impl Into<String>) -> Self {
        Self::Global { name: name.into() }
    }

    /// Per-player target for the acting seat.
    #[must_use]
    pub fn actor(name: impl Into<String>) -> Self {
        Self::Player {
            player: ValueExpr::ActorPlayer,
            name: name.into(),
        }
    }

    /// Per-player target.
    #[must_use]
    pub fn player(player: ValueExpr, name: impl Into<String>) -> Self {
        Self::Player {
            player,
            name: name.into(),
        }
    }

    /// Per-zone target.
    #[must_use]
    pub fn zone(zone: ValueExpr, name: impl Into<String>) -> Self {
        Self::Zone {
            zone,
            name: name.into(),
        }
    }
}

/// One ordered group of a `RemoveByPriority` effect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalGroup {
    /// Candidate tokens, queried when the group is reached.
    pub candidates: Query,
    /// Destination zone for removed tokens.
    pub to: ValueExpr,
    /// Binding receiving the number removed from this group.
    pub removed_binder: Option<String>,
}

/// An atomic or composite game effect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    // === Composition ===
    /// Apply effects in order, threading state, RNG, and bindings.
    Seq(Vec<Effect>),

    // === Variable mutation ===
    /// Set a variable, clamped to its declared bounds. A write that
    /// does not change the stored value is a complete no-op.
    SetVar {
        /// Target variable.
        target: VarTarget,
        /// New value.
        value: ValueExpr,
    },
    /// Add a delta to a variable, clamped to its declared bounds. A
    /// clamped delta of zero is a complete no-op.
    AddVar {
        /// Target variable.
        target: VarTarget,
        /// Delta to add.
        delta: ValueExpr,
    },
    /// Move quantity between two variables, conserving the total.
    ///
    /// `actual = clamp(requested, 0, min(source available, destination
    /// headroom))`, further bounded by `window` when present. Identical
    /// endpoints or a zero actual are complete no-ops.
    TransferVar {
        /// Source variable.
        from: VarTarget,
        /// Destination variable.
        to: VarTarget,
        /// Requested amount.
        amount: ValueExpr,
        /// Optional extra cap on the transferred amount.
        window: Option<ValueExpr>,
    },

    // === Token movement ===
    /// Move a token to a zone.
    MoveToken {
        /// Token to move.
        token: ValueExpr,
        /// Destination zone.
        to: ValueExpr,
        /// Insertion position.
        position: Option<ZonePosition>,
    },
    /// Draw tokens off the top of one zone into another, stopping
    /// early when the source empties.
    DrawTokens {
        /// Source zone.
        from: ValueExpr,
        /// Destination zone.
        to: ValueExpr,
        /// Number to draw.
        count: ValueExpr,
    },

    // === Control flow ===
    /// Run `then` or `otherwise` depending on the condition.
    If {
        /// Condition.
        cond: CondExpr,
        /// Effects when true.
        then: Vec<Effect>,
        /// Effects when false.
        otherwise: Vec<Effect>,
    },
    /// Bind a value for the scope of `body`, exporting only
    /// binder-prefixed names afterwards.
    Let {
        /// Binder name.
        binder: String,
        /// Bound value.
        value: ValueExpr,
        /// Scoped effects.
        body: Vec<Effect>,
    },
    /// Bind or rebind a name visible to subsequent effects in the
    /// enclosing list.
    BindValue {
        /// Binding name.
        name: String,
        /// Bound value.
        value: ValueExpr,
    },
    /// Iterate a query's matches in order.
    ///
    /// The source is evaluated eagerly into a concrete sequence, then
    /// truncated to `limit` (when present). Per iteration the item is
    /// bound to `binder` for `body`. When `count_binder` is present the
    /// truncated count is bound before `then` runs.
    ForEach {
        /// Per-item binder.
        binder: String,
        /// Source query.
        source: Query,
        /// Iteration cap; must evaluate to a non-negative integer.
        limit: Option<ValueExpr>,
        /// Per-item effects.
        body: Vec<Effect>,
        /// Binding receiving the truncated iteration count.
        count_binder: Option<String>,
        /// Continuation after the loop.
        then: Vec<Effect>,
    },
    /// Fold over a query's matches.
    ///
    /// The accumulator starts at `init` and is visible to `body` under
    /// `acc_binder`; `body` updates it with `BindValue`. After the fold
    /// the final accumulator stays bound for `then`. Exports follow the
    /// `Let` rule with `binder`.
    Reduce {
        /// Per-item binder.
        binder: String,
        /// Accumulator binder.
        acc_binder: String,
        /// Source query.
        source: Query,
        /// Initial accumulator value.
        init: ValueExpr,
        /// Per-item effects (update the accumulator via `BindValue`).
        body: Vec<Effect>,
        /// Continuation with the final accumulator bound.
        then: Vec<Effect>,
    },
    /// Remove tokens by group priority under one shared budget.
    RemoveByPriority {
        /// Total removal budget.
        budget: ValueExpr,
        /// Ordered groups, highest priority first.
        groups: Vec<RemovalGroup>,
        /// Binding receiving the unspent budget after all groups.
        remaining_binder: Option<String>,
    },

    // === Decisions ===
    /// A single choice from an evaluated option domain.
    ///
    /// The decision id may contain `{binding}` placeholders,
    /// substituted before lookup. Execution requires the move parameter
    /// to exist; discovery surfaces a pending choice instead.
    ChooseOne {
        /// Decision id template.
        decision: String,
        /// Option domain.
        options: Query,
        /// Per-option legality, evaluated with the option bound to
        /// `binder`.
        legal_if: Option<CondExpr>,
        /// Binder carrying the chosen option through `body`.
        binder: String,
        /// Effects applied with the choice bound.
        body: Vec<Effect>,
    },
    /// A multi-select choice from an evaluated option domain.
    ChooseN {
        /// Decision id template.
        decision: String,
        /// Option domain.
        options: Query,
        /// Minimum selections.
        min: ValueExpr,
        /// Maximum selections.
        max: ValueExpr,
        /// Per-option legality, evaluated with the option bound to
        /// `binder`.
        legal_if: Option<CondExpr>,
        /// Binder carrying the chosen list through `body`.
        binder: String,
        /// Effects applied with the choices bound.
        body: Vec<Effect>,
    },

    // === Randomness ===
    /// Roll `1..=sides`, advancing the threaded RNG, and bind the
    /// result.
    RollRandom {
        /// Binding receiving the roll.
        binder: String,
        /// Die size; must evaluate to a positive integer.
        sides: ValueExpr,
    },

    // === Subset evaluation ===
    /// Evaluate a query eagerly and bind the matched list for `body`.
    EvaluateSubset {
        /// Binding receiving the list.
        binder: String,
        /// Source query.
        source: Query,
        /// Scoped effects.
        body: Vec<Effect>,
    },

    // === Markers and phases ===
    /// Place a marker in a zone (no-op if already present).
    PlaceMarker {
        /// Target zone.
        zone: ValueExpr,
        /// Marker name.
        marker: String,
    },
    /// Remove a marker from a zone (no-op if absent).
    RemoveMarker {
        /// Target zone.
        zone: ValueExpr,
        /// Marker name.
        marker: String,
    },
    /// Jump to a specific phase.
    SetPhase(PhaseId),
    /// Advance to the next phase in the declared cycle.
    AdvancePhase,
}

impl Effect {
    /// Add to a global variable.
    #[must_use]
    pub fn add_global(name: impl Into<String>, delta: i64) -> Self {
        Self::AddVar {
            target: VarTarget::global(name),
            delta: ValueExpr::int(delta),
        }
    }

    /// Set a global variable.
    #[must_use]
    pub fn set_global(name: impl Into<String>, value: ValueExpr) -> Self {
        Self::SetVar {
            target: VarTarget::global(name),
            value,
        }
    }

    /// Transfer between two variables with no window.
    #[must_use]
    pub fn transfer(from: VarTarget, to: VarTarget, amount: ValueExpr) -> Self {
        Self::TransferVar {
            from,
            to,
            amount,
            window: None,
        }
    }

    /// Conditional with no else branch.
    #[must_use]
    pub fn when(cond: CondExpr, then: Vec<Effect>) -> Self {
        Self::If {
            cond,
            then,
            otherwise: Vec::new(),
        }
    }

    /// Bind a value for subsequent effects.
    #[must_use]
    pub fn bind(name: impl Into<String>, value: ValueExpr) -> Self {
        Self::BindValue {
            name: name.into(),
            value,
        }
    }
}
