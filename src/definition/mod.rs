//! Static game definition: the compiler hand-off.
//!
//! A separate compiler lowers a declarative game specification into the
//! types here. The kernel treats a loaded definition as read-only; the
//! only derived data is the [`RuntimeCache`], rebuilt after
//! deserialization.

pub mod action;
pub mod pipeline;
pub mod turn;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{ActionId, PlayerId, TokenTypeId, ZoneId};

pub use action::{ActionDef, ActionLimit, EventBranch, LimitScope, ParamDef, PlayerSelector};
pub use pipeline::{PipelineDef, PipelineId};
pub use turn::{PhaseDef, TurnConfig};

/// Scope of a declared variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarScope {
    /// One value for the whole game.
    Global,
    /// One value per seat.
    PerPlayer,
    /// One value per zone.
    PerZone,
}

/// A declared numeric variable with bounds.
///
/// The interpreter clamps every write to `[min, max]`; a snapshot never
/// holds an out-of-bounds value for a declared variable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarDef {
    /// Variable name.
    pub name: String,
    /// Scope the variable lives in.
    pub scope: VarScope,
    /// Lower bound, inclusive.
    pub min: i64,
    /// Upper bound, inclusive.
    pub max: i64,
    /// Initial value.
    pub default: i64,
}

impl VarDef {
    /// Declare a variable.
    #[must_use]
    pub fn new(name: impl Into<String>, scope: VarScope, min: i64, max: i64, default: i64) -> Self {
        Self {
            name: name.into(),
            scope,
            min,
            max,
            default,
        }
    }

    /// Clamp a value to this variable's bounds.
    #[must_use]
    pub fn clamp(&self, value: i64) -> i64 {
        value.clamp(self.min, self.max)
    }
}

/// A declared zone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneDef {
    /// Zone id.
    pub id: ZoneId,
    /// Human-readable name (diagnostics only).
    pub name: String,
    /// Owning seat, if any.
    pub owner: Option<PlayerId>,
    /// Adjacent zones (undirected edges; the cache symmetrizes).
    pub adjacent: Vec<ZoneId>,
}

impl ZoneDef {
    /// Declare a zone.
    #[must_use]
    pub fn new(id: ZoneId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            owner: None,
            adjacent: Vec::new(),
        }
    }

    /// Set the owning seat.
    #[must_use]
    pub fn with_owner(mut self, owner: PlayerId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Add adjacency edges.
    #[must_use]
    pub fn with_adjacent(mut self, adjacent: impl IntoIterator<Item = ZoneId>) -> Self {
        self.adjacent.extend(adjacent);
        self
    }
}

/// A declared token type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTypeDef {
    /// Type id.
    pub id: TokenTypeId,
    /// Human-readable name (diagnostics only).
    pub name: String,
}

impl TokenTypeDef {
    /// Declare a token type.
    #[must_use]
    pub fn new(id: TokenTypeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Precomputed read-only lookups derived from a definition.
///
/// Rebuilt (never serialized) so deserialized definitions stay
/// self-consistent.
#[derive(Clone, Debug, Default)]
pub struct RuntimeCache {
    /// Symmetrized adjacency, each neighbor list sorted by id.
    adjacency: FxHashMap<ZoneId, Vec<ZoneId>>,
    action_index: FxHashMap<ActionId, usize>,
    zone_index: FxHashMap<ZoneId, usize>,
    pipeline_index: FxHashMap<PipelineId, usize>,
}

impl RuntimeCache {
    /// Zones adjacent to `zone`, sorted by id.
    #[must_use]
    pub fn adjacent(&self, zone: ZoneId) -> &[ZoneId] {
        self.adjacency.get(&zone).map_or(&[], Vec::as_slice)
    }
}

/// A complete compiled game definition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameDefinition {
    /// Game name (diagnostics only).
    pub name: String,
    /// Number of seats.
    pub player_count: usize,
    /// Declared zones.
    pub zones: Vec<ZoneDef>,
    /// Declared token types.
    pub token_types: Vec<TokenTypeDef>,
    /// Declared variables.
    pub vars: Vec<VarDef>,
    /// Action table.
    pub actions: Vec<ActionDef>,
    /// Action pipelines.
    pub pipelines: Vec<PipelineDef>,
    /// Turn structure and option matrix.
    pub turn: TurnConfig,

    /// Derived lookups; rebuild after mutation or deserialization.
    #[serde(skip)]
    cache: RuntimeCache,
}

impl GameDefinition {
    /// Create an empty definition.
    #[must_use]
    pub fn new(name: impl Into<String>, player_count: usize) -> Self {
        Self {
            name: name.into(),
            player_count,
            zones: Vec::new(),
            token_types: Vec::new(),
            vars: Vec::new(),
            actions: Vec::new(),
            pipelines: Vec::new(),
            turn: TurnConfig::default(),
            cache: RuntimeCache::default(),
        }
    }

    /// Rebuild the runtime cache from the declared tables.
    ///
    /// Call after constructing or deserializing a definition.
    pub fn rebuild_cache(&mut self) {
        let mut cache = RuntimeCache::default();

        for (i, zone) in self.zones.iter().enumerate() {
            cache.zone_index.insert(zone.id, i);
        }
        for (i, action) in self.actions.iter().enumerate() {
            cache.action_index.insert(action.id, i);
        }
        for (i, pipeline) in self.pipelines.iter().enumerate() {
            cache.pipeline_index.insert(pipeline.id, i);
        }

        // Symmetrize adjacency and sort each neighbor list.
        for zone in &self.zones {
            for &other in &zone.adjacent {
                cache.adjacency.entry(zone.id).or_default().push(other);
                cache.adjacency.entry(other).or_default().push(zone.id);
            }
        }
        for neighbors in cache.adjacency.values_mut() {
            neighbors.sort();
            neighbors.dedup();
        }

        self.cache = cache;
    }

    /// The runtime cache.
    #[must_use]
    pub fn cache(&self) -> &RuntimeCache {
        &self.cache
    }

    /// Look up an action by id.
    #[must_use]
    pub fn action(&self, id: ActionId) -> Option<&ActionDef> {
        self.cache
            .action_index
            .get(&id)
            .map(|&i| &self.actions[i])
    }

    /// Look up a zone by id.
    #[must_use]
    pub fn zone(&self, id: ZoneId) -> Option<&ZoneDef> {
        self.cache.zone_index.get(&id).map(|&i| &self.zones[i])
    }

    /// Look up a pipeline by id.
    #[must_use]
    pub fn pipeline(&self, id: PipelineId) -> Option<&PipelineDef> {
        self.cache
            .pipeline_index
            .get(&id)
            .map(|&i| &self.pipelines[i])
    }

    /// Look up a variable declaration by scope and name.
    #[must_use]
    pub fn var(&self, scope: VarScope, name: &str) -> Option<&VarDef> {
        self.vars
            .iter()
            .find(|v| v.scope == scope && v.name == name)
    }

    /// Initialize a fresh state: declared defaults for globals and
    /// per-player variables, empty zones, the first declared phase.
    #[must_use]
    pub fn initial_state(&self, seed: u64) -> crate::core::GameState {
        let mut state = crate::core::GameState::new(self.player_count, seed);

        if let Some(phase) = self.turn.phases.first() {
            state.phase = phase.id;
        }

        for var in &self.vars {
            match var.scope {
                VarScope::Global => state.set_global(var.name.clone(), var.default),
                VarScope::PerPlayer => {
                    for player in PlayerId::all(self.player_count) {
                        state.set_player_var(player, var.name.clone(), var.default);
                    }
                }
                VarScope::PerZone => {
                    for zone in &self.zones {
                        state.set_zone_var(zone.id, var.name.clone(), var.default);
                    }
                }
            }
        }

        let order = &self.turn.eligibility_order;
        state.turn_flow.begin_round(
            order.first().copied(),
            order.get(1).copied(),
        );

        state
    }
}
