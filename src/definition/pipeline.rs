//! Action pipelines: shared legality and cost stages.
//!
//! A pipeline is a reusable dispatch gate plus staged checks that
//! several actions route through (e.g. every "operation" pays from the
//! same resource pool). Stages run at the execution boundary in order:
//! dispatch match (preflight), legality, affordability, cost effects.

use serde::{Deserialize, Serialize};

use crate::effects::Effect;
use crate::eval::CondExpr;

/// Pipeline identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PipelineId(pub u16);

impl PipelineId {
    /// Create a new pipeline ID.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for PipelineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Pipeline({})", self.0)
    }
}

/// A pipeline definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDef {
    /// Pipeline id.
    pub id: PipelineId,
    /// Human-readable name (diagnostics only).
    pub name: String,
    /// Dispatch gate: the action only matches this pipeline when the
    /// condition holds. Checked during preflight; a mismatch is its own
    /// not-applicable reason.
    pub dispatch: Option<CondExpr>,
    /// Legality stage: must hold at execution or the move fails with a
    /// pipeline-legality reason.
    pub legality: Option<CondExpr>,
    /// Affordability stage: must hold or the move fails with a
    /// pipeline-cost reason.
    pub affordable: Option<CondExpr>,
    /// Cost effects, run before the action's own effects.
    pub cost: Vec<Effect>,
}

impl PipelineDef {
    /// Create an empty pipeline.
    #[must_use]
    pub fn new(id: PipelineId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            dispatch: None,
            legality: None,
            affordable: None,
            cost: Vec::new(),
        }
    }

    /// Set the dispatch gate.
    #[must_use]
    pub fn with_dispatch(mut self, cond: CondExpr) -> Self {
        self.dispatch = Some(cond);
        self
    }

    /// Set the legality stage.
    #[must_use]
    pub fn with_legality(mut self, cond: CondExpr) -> Self {
        self.legality = Some(cond);
        self
    }

    /// Set the affordability stage and cost effects.
    #[must_use]
    pub fn with_cost(mut self, affordable: CondExpr, cost: Vec<Effect>) -> Self {
        self.affordable = Some(affordable);
        self.cost = cost;
        self
    }
}
