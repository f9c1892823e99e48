//! Kernel error taxonomy.
//!
//! Three families, per the failure model:
//! - structural/type failures during evaluation or effect application:
//!   always fatal, carrying a machine-readable [`ErrorContext`];
//! - selector/binding resolution failures: carry a structured
//!   `deferred` flag — deferred when raised mid-enumeration ("not yet
//!   applicable"), fatal at execution boundaries. Callers branch on the
//!   flag, never on message text;
//! - illegal-move classification: a closed [`IllegalMoveReason`] set so
//!   callers branch on the reason.
//!
//! Budget exhaustion is intentionally absent: budgets truncate with a
//! warning and never produce an error.

use thiserror::Error;

use crate::core::ActionId;

/// Machine-readable location of a failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorContext {
    /// Component that raised the error (`eval`, `effect`, `enumerate`,
    /// `resolver`, `kernel`, `definition`).
    pub component: &'static str,
    /// Subject within the component (effect kind, variable name,
    /// decision id).
    pub subject: String,
}

impl ErrorContext {
    /// Create a new error context.
    #[must_use]
    pub fn new(component: &'static str, subject: impl Into<String>) -> Self {
        Self {
            component,
            subject: subject.into(),
        }
    }
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.component, self.subject)
    }
}

/// Closed set of reasons a move is illegal.
///
/// Diagnostics and callers branch on these variants; the reason is the
/// contract, not the message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IllegalMoveReason {
    /// The action is not available in the current phase.
    PhaseMismatch,
    /// The actor selector does not resolve to the acting seat.
    ActorNotApplicable,
    /// The executor selector cannot be resolved or is not the executor.
    ExecutorNotApplicable,
    /// The per-scope action limit is spent.
    ActionLimitExceeded,
    /// The action's pipeline dispatch condition does not match.
    PipelineDispatchMismatch,
    /// The pipeline legality stage rejected the move.
    PipelineLegalityFailed,
    /// The pipeline cost stage could not be paid.
    PipelineCostFailed,
    /// The acting seat is not turn-flow eligible.
    TurnFlowIneligible,
    /// The move's action class is not open under the option matrix.
    ClassMismatch,
    /// The move was flagged free-operation but no pending grant covers it.
    FreeOperationNotGranted,
    /// The action's precondition rejected the parameter assignment.
    PreconditionFailed,
    /// A decision parameter lies outside its evaluated option domain.
    ChoiceOutsideDomain {
        /// Decision id whose domain was violated.
        decision: String,
    },
    /// The action id is not in the definition's action table.
    UnknownAction,
}

impl std::fmt::Display for IllegalMoveReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IllegalMoveReason::PhaseMismatch => write!(f, "phase mismatch"),
            IllegalMoveReason::ActorNotApplicable => write!(f, "actor not applicable"),
            IllegalMoveReason::ExecutorNotApplicable => write!(f, "executor not applicable"),
            IllegalMoveReason::ActionLimitExceeded => write!(f, "action limit exceeded"),
            IllegalMoveReason::PipelineDispatchMismatch => write!(f, "pipeline dispatch mismatch"),
            IllegalMoveReason::PipelineLegalityFailed => write!(f, "pipeline legality failed"),
            IllegalMoveReason::PipelineCostFailed => write!(f, "pipeline cost failed"),
            IllegalMoveReason::TurnFlowIneligible => write!(f, "turn-flow ineligible"),
            IllegalMoveReason::ClassMismatch => write!(f, "turn-flow class mismatch"),
            IllegalMoveReason::FreeOperationNotGranted => write!(f, "free operation not granted"),
            IllegalMoveReason::PreconditionFailed => write!(f, "precondition failed"),
            IllegalMoveReason::ChoiceOutsideDomain { decision } => {
                write!(f, "choice `{decision}` outside evaluated domain")
            }
            IllegalMoveReason::UnknownAction => write!(f, "unknown action"),
        }
    }
}

/// Kernel error type.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Structural/type failure. Always fatal, never retried.
    #[error("type error at {ctx}: expected {expected}, got {got}")]
    Type {
        /// Where the failure happened.
        ctx: ErrorContext,
        /// Expected shape.
        expected: &'static str,
        /// What was found.
        got: String,
    },

    /// A variable was referenced that the definition does not declare.
    #[error("undeclared variable `{name}` at {ctx}")]
    UndeclaredVariable {
        /// Where the reference happened.
        ctx: ErrorContext,
        /// The undeclared name.
        name: String,
    },

    /// A selector referenced a binding that is not in scope.
    ///
    /// `deferred` distinguishes "not yet applicable" (raised
    /// mid-enumeration before the binding could exist) from a genuine
    /// structural failure at an execution boundary.
    #[error("unbound selector `{name}` (deferred: {deferred})")]
    UnboundSelector {
        /// The missing binding or parameter name.
        name: String,
        /// True when the enumerator may treat this as "not yet applicable".
        deferred: bool,
    },

    /// A decision effect found no move parameter for its decision id.
    #[error("missing decision binding `{decision}` (deferred: {deferred})")]
    MissingBinding {
        /// The (substituted) decision id.
        decision: String,
        /// True when raised during discovery probing rather than execution.
        deferred: bool,
    },

    /// A move failed validation for a classified reason.
    #[error("illegal move on {action}: {reason}")]
    Illegal {
        /// The action the move named.
        action: ActionId,
        /// Classified reason.
        reason: IllegalMoveReason,
    },

    /// The decision-sequence resolver hit its step ceiling.
    #[error("decision resolution exceeded {max_steps} steps")]
    MaxDecisionSteps {
        /// The configured ceiling.
        max_steps: u32,
    },

    /// The game definition itself is malformed (unknown ids, bad
    /// references). Raised at load or on first use.
    #[error("definition error at {ctx}: {detail}")]
    Definition {
        /// Where the failure happened.
        ctx: ErrorContext,
        /// What is wrong.
        detail: String,
    },
}

impl EngineError {
    /// Is this error a reason-tagged deferral ("not yet applicable")
    /// rather than a hard failure?
    #[must_use]
    pub fn is_deferred(&self) -> bool {
        matches!(
            self,
            EngineError::UnboundSelector { deferred: true, .. }
                | EngineError::MissingBinding { deferred: true, .. }
        )
    }

    /// The illegal-move reason, if this is an `Illegal` error.
    #[must_use]
    pub fn illegal_reason(&self) -> Option<&IllegalMoveReason> {
        match self {
            EngineError::Illegal { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// Kernel result alias.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deferred_flag() {
        let deferred = EngineError::UnboundSelector {
            name: "target".into(),
            deferred: true,
        };
        let fatal = EngineError::UnboundSelector {
            name: "target".into(),
            deferred: false,
        };

        assert!(deferred.is_deferred());
        assert!(!fatal.is_deferred());

        let missing = EngineError::MissingBinding {
            decision: "pick".into(),
            deferred: true,
        };
        assert!(missing.is_deferred());
    }

    #[test]
    fn test_illegal_reason_accessor() {
        let err = EngineError::Illegal {
            action: ActionId::new(2),
            reason: IllegalMoveReason::PhaseMismatch,
        };
        assert_eq!(err.illegal_reason(), Some(&IllegalMoveReason::PhaseMismatch));

        let other = EngineError::MaxDecisionSteps { max_steps: 8 };
        assert_eq!(other.illegal_reason(), None);
    }

    #[test]
    fn test_display_carries_context() {
        let err = EngineError::Type {
            ctx: ErrorContext::new("effect", "forEach.limit"),
            expected: "non-negative int",
            got: "bool".into(),
        };
        let text = err.to_string();
        assert!(text.contains("effect:forEach.limit"));
        assert!(text.contains("non-negative int"));
    }
}
