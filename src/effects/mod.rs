//! Effect system: syntax tree, dual-mode interpreter, traces.
//!
//! Effects are the only way game rules change state. The interpreter is
//! a single tree walk parameterized by an execution mode: `Execute`
//! requires every decision pre-bound in the move's parameters;
//! `Discover` surfaces the next unresolved decision as a
//! [`PendingChoice`] instead. The walk itself is never duplicated.

pub mod ast;
pub mod context;
pub mod interp;
pub mod result;
pub mod subst;
pub mod trace;

pub use ast::{Effect, RemovalGroup, VarTarget};
pub use context::{EffectContext, ExecMode};
pub use interp::{apply, apply_list};
pub use result::{ChoiceKind, ChoiceOption, EffectResult, PendingChoice};
pub use trace::{EngineEvent, TraceEntry, TraceLog, VarHandle};
