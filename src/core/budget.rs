//! Search budgets and structured warnings.
//!
//! Budgets are the only bound on combinatorial search in the kernel.
//! They fail closed: exhaustion deterministically truncates the
//! remaining work and emits exactly one warning per budget, never an
//! error. Counters are plain mutable state owned by the top-level call
//! tree that created them and must not be shared across invocations.

use serde::Serialize;

/// Stable warning codes surfaced to observability collaborators.
pub mod codes {
    /// A `ForEach` matched items but its truncated set was empty.
    pub const ZERO_ITERATION: &str = "zero-iteration";
    /// Enumeration stopped early: emitted-template budget crossed.
    pub const TEMPLATE_BUDGET: &str = "template-budget-exceeded";
    /// Enumeration stopped early: cross-product node budget crossed.
    pub const PARAM_EXPANSION_BUDGET: &str = "param-expansion-budget-exceeded";
    /// Effect walk stopped early: effect-node budget crossed.
    pub const EFFECT_BUDGET: &str = "effect-budget-exceeded";
}

/// A warning keyed by a stable string code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Warning {
    /// Stable machine-readable code (see [`codes`]).
    pub code: &'static str,
    /// Human-readable detail.
    pub message: String,
}

impl Warning {
    /// Create a new warning.
    #[must_use]
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Monotonically-decrementing search bounds, threaded through one call
/// tree.
///
/// Each `charge_*` method decrements its counter and reports whether the
/// caller may proceed. The first refusal per budget records its warning;
/// later refusals are silent, so truncation emits exactly one warning no
/// matter how much work was skipped.
#[derive(Debug)]
pub struct Budgets {
    templates_left: u32,
    param_expansions_left: u32,
    effect_nodes_left: u32,
    /// Step ceiling for the decision-sequence resolver. Crossing it is a
    /// typed error there, not a truncation, so it is read directly.
    pub max_decision_steps: u32,

    templates_warned: bool,
    param_expansions_warned: bool,
    effect_nodes_warned: bool,

    warnings: Vec<Warning>,
}

impl Budgets {
    /// Create budgets with explicit limits.
    #[must_use]
    pub fn new(
        max_templates: u32,
        max_param_expansions: u32,
        max_effect_nodes: u32,
        max_decision_steps: u32,
    ) -> Self {
        Self {
            templates_left: max_templates,
            param_expansions_left: max_param_expansions,
            effect_nodes_left: max_effect_nodes,
            max_decision_steps,
            templates_warned: false,
            param_expansions_warned: false,
            effect_nodes_warned: false,
            warnings: Vec::new(),
        }
    }

    /// Charge one emitted move template. Returns false once the budget
    /// is exhausted, recording the warning on the first refusal.
    pub fn charge_template(&mut self) -> bool {
        if self.templates_left == 0 {
            if !self.templates_warned {
                self.templates_warned = true;
                self.warnings.push(Warning::new(
                    codes::TEMPLATE_BUDGET,
                    "move enumeration truncated: template budget exhausted",
                ));
            }
            return false;
        }
        self.templates_left -= 1;
        true
    }

    /// Charge one parameter cross-product node.
    pub fn charge_param_expansion(&mut self) -> bool {
        if self.param_expansions_left == 0 {
            if !self.param_expansions_warned {
                self.param_expansions_warned = true;
                self.warnings.push(Warning::new(
                    codes::PARAM_EXPANSION_BUDGET,
                    "move enumeration truncated: parameter expansion budget exhausted",
                ));
            }
            return false;
        }
        self.param_expansions_left -= 1;
        true
    }

    /// Charge one visited effect node. Control-flow effects call this
    /// before every sub-walk; a refusal terminates the walk rather than
    /// running one more uncharged step.
    pub fn charge_effect_node(&mut self) -> bool {
        if self.effect_nodes_left == 0 {
            if !self.effect_nodes_warned {
                self.effect_nodes_warned = true;
                self.warnings.push(Warning::new(
                    codes::EFFECT_BUDGET,
                    "effect walk truncated: effect node budget exhausted",
                ));
            }
            return false;
        }
        self.effect_nodes_left -= 1;
        true
    }

    /// Record a non-budget warning (e.g. `zero-iteration`).
    pub fn warn(&mut self, code: &'static str, message: impl Into<String>) {
        self.warnings.push(Warning::new(code, message));
    }

    /// Warnings recorded so far.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Drain recorded warnings.
    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    /// Remaining template budget.
    #[must_use]
    pub fn templates_left(&self) -> u32 {
        self.templates_left
    }

    /// Remaining parameter-expansion budget.
    #[must_use]
    pub fn param_expansions_left(&self) -> u32 {
        self.param_expansions_left
    }
}

impl Default for Budgets {
    /// Generous defaults for interactive use.
    fn default() -> Self {
        Self::new(512, 20_000, 100_000, 64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charge_template_until_exhausted() {
        let mut budgets = Budgets::new(2, 10, 10, 10);

        assert!(budgets.charge_template());
        assert!(budgets.charge_template());
        assert!(!budgets.charge_template());
        assert!(!budgets.charge_template());
    }

    #[test]
    fn test_exactly_one_warning_per_budget() {
        let mut budgets = Budgets::new(0, 0, 10, 10);

        for _ in 0..5 {
            assert!(!budgets.charge_template());
            assert!(!budgets.charge_param_expansion());
        }

        let codes: Vec<_> = budgets.warnings().iter().map(|w| w.code).collect();
        assert_eq!(
            codes,
            vec![codes::TEMPLATE_BUDGET, codes::PARAM_EXPANSION_BUDGET]
        );
    }

    #[test]
    fn test_effect_node_budget() {
        let mut budgets = Budgets::new(10, 10, 3, 10);

        assert!(budgets.charge_effect_node());
        assert!(budgets.charge_effect_node());
        assert!(budgets.charge_effect_node());
        assert!(!budgets.charge_effect_node());
        assert_eq!(budgets.warnings().len(), 1);
        assert_eq!(budgets.warnings()[0].code, codes::EFFECT_BUDGET);
    }

    #[test]
    fn test_non_budget_warnings_not_deduplicated() {
        let mut budgets = Budgets::default();
        budgets.warn(codes::ZERO_ITERATION, "first");
        budgets.warn(codes::ZERO_ITERATION, "second");
        assert_eq!(budgets.warnings().len(), 2);
    }

    #[test]
    fn test_take_warnings_drains() {
        let mut budgets = Budgets::new(0, 10, 10, 10);
        let _ = budgets.charge_template();

        let taken = budgets.take_warnings();
        assert_eq!(taken.len(), 1);
        assert!(budgets.warnings().is_empty());
    }
}
