//! Effect application context.
//!
//! The context is a read-only view passed down the tree; effects never
//! mutate it, they return a new [`super::EffectResult`]. The execution
//! mode is a flag carried here, not a separate code path.

use crate::core::{ActionId, GameState, PlayerId, RngState};
use crate::definition::GameDefinition;
use crate::eval::{Bindings, EvalCtx};
use crate::moves::MoveParams;

/// Interpreter execution mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecMode {
    /// Every decision must be pre-bound in the move parameters; a
    /// missing binding is fatal.
    Execute,
    /// An unbound decision surfaces a pending choice instead of
    /// failing; state and RNG are untouched while options are listed.
    Discover,
}

/// Read-only view threaded through one effect application.
#[derive(Clone)]
pub struct EffectContext<'a> {
    /// The loaded definition.
    pub def: &'a GameDefinition,
    /// Action whose effects are being applied.
    pub action: ActionId,
    /// Snapshot the effect reads from (persistent; cloning is cheap).
    pub state: GameState,
    /// RNG state, explicitly threaded.
    pub rng: RngState,
    /// Seat whose turn it is.
    pub active: PlayerId,
    /// Seat executing the action's effects.
    pub actor: PlayerId,
    /// Bindings in scope.
    pub bindings: Bindings,
    /// The move's parameter map (declared params + decision keys).
    pub params: &'a MoveParams,
    /// Execution mode.
    pub mode: ExecMode,
}

impl<'a> EffectContext<'a> {
    /// Evaluation view of this context.
    ///
    /// Strict lookups at the execution boundary; lax (deferred) during
    /// discovery.
    #[must_use]
    pub fn eval(&self) -> EvalCtx<'_> {
        EvalCtx {
            def: self.def,
            state: &self.state,
            bindings: &self.bindings,
            params: self.params,
            active: self.active,
            actor: self.actor,
            strict: self.mode == ExecMode::Execute,
        }
    }

    /// Child context continuing from an intermediate result.
    #[must_use]
    pub fn advanced(&self, state: GameState, rng: RngState, bindings: Bindings) -> Self {
        Self {
            state,
            rng,
            bindings,
            ..self.clone()
        }
    }
}
