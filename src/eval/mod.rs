//! Pure evaluation subsystem: value, condition, and query expressions.
//!
//! Everything here is read-only over `(definition, state, bindings,
//! move params)`. Evaluators never mutate state and never touch the
//! RNG; randomness is an effect, not an expression.

pub mod engine;
pub mod expr;

use crate::core::Value;

/// Effect-introduced bindings in scope for evaluation.
///
/// Ordered so that nested scopes merge and iterate canonically.
pub type Bindings = im::OrdMap<String, Value>;

pub use engine::{
    eval_cond, eval_int, eval_player, eval_query, eval_token, eval_value, eval_zone,
    resolve_selector, EvalCtx,
};
pub use expr::{CmpOp, CondExpr, Query, ValueExpr};
