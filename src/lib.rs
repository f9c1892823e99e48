//! # tabula
//!
//! A deterministic rules-engine kernel for turn-based multi-player
//! games. A separate compiler lowers a declarative game specification
//! into a static [`definition::GameDefinition`]; this crate interprets
//! it.
//!
//! ## Design Principles
//!
//! 1. **Deterministic replay**: the same `(definition, seed, move
//!    list)` always reproduces bit-identical state hashes and traces.
//!    RNG state is explicitly threaded and every state collection
//!    iterates in canonical order.
//!
//! 2. **Immutable snapshots**: `GameState` is backed by persistent
//!    data structures; effects return new state instead of mutating.
//!    The only in-place mutation anywhere is budget counters and trace
//!    collectors owned by one call tree.
//!
//! 3. **One tree walk, two modes**: the effect interpreter runs the
//!    same code in execution mode (decisions pre-bound) and discovery
//!    mode (surfacing the next pending choice).
//!
//! 4. **Budgets fail closed**: combinatorial search truncates
//!    deterministically with a one-time warning per budget, never an
//!    error.
//!
//! ## Modules
//!
//! - `core`: ids, players, tokens, state snapshots, RNG, budgets
//! - `definition`: the compiler hand-off (zones, variables, actions,
//!   pipelines, turn configuration, runtime cache)
//! - `eval`: pure value/condition/query evaluators
//! - `effects`: effect syntax tree and the dual-mode interpreter
//! - `turnflow`: eligibility, option matrix, free-operation grants
//! - `enumerate`: budget-bounded legal-move enumeration
//! - `resolver`: incremental decision-sequence resolution
//! - `kernel`: move validation, application, round/turn advancement

pub mod core;
pub mod definition;
pub mod effects;
pub mod enumerate;
pub mod error;
pub mod eval;
pub mod kernel;
pub mod moves;
pub mod resolver;
pub mod turnflow;

// Re-export commonly used types
pub use crate::core::{
    ActionId, Budgets, GameState, PhaseId, PlayerId, PlayerMap, RngState, StateHash, Token,
    TokenId, TokenTypeId, Value, Warning, ZoneId, ZonePosition,
};

pub use crate::definition::{
    ActionDef, ActionLimit, EventBranch, GameDefinition, LimitScope, ParamDef, PhaseDef,
    PipelineDef, PipelineId, PlayerSelector, RuntimeCache, TokenTypeDef, TurnConfig, VarDef,
    VarScope, ZoneDef,
};

pub use crate::eval::{Bindings, CmpOp, CondExpr, Query, ValueExpr};

pub use crate::effects::{
    ChoiceKind, ChoiceOption, Effect, EffectContext, EffectResult, EngineEvent, ExecMode,
    PendingChoice, RemovalGroup, TraceEntry, TraceLog, VarHandle, VarTarget,
};

pub use crate::turnflow::{
    ActionClass, EligibilityOverride, FreeOpGrant, OptionMatrixRow, TurnFlowState,
};

pub use crate::enumerate::{enumerate, Enumeration};

pub use crate::resolver::{is_satisfiable, resolve, Resolution, ResolveOptions};

pub use crate::kernel::{advance_round, advance_turn, apply_move, replay, validate, Applied};

pub use crate::error::{EngineError, EngineResult, ErrorContext, IllegalMoveReason};

pub use crate::moves::{LegalMove, Move, MoveParams};
