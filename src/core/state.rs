//! Game state: one immutable snapshot of everything the rules can see.
//!
//! ## Snapshot model
//!
//! `GameState` is backed by `im` persistent collections, so cloning is
//! O(1) and "mutation" during effect application is clone-then-update on
//! a working copy. All collections are the *ordered* variants: canonical
//! iteration order is what keeps the content hash and replay bit-stable.
//!
//! ## Content hash
//!
//! `content_hash()` folds the canonical byte serialization of the
//! snapshot into blake3. It is a pure function of state content; two
//! replays of the same `(definition, seed, move list)` must produce
//! identical hashes.

use im::{OrdMap, OrdSet, Vector};
use serde::{Deserialize, Serialize};

use crate::turnflow::TurnFlowState;

use super::ids::{PhaseId, ZoneId};
use super::player::{PlayerId, PlayerMap};
use super::rng::RngState;
use super::token::{Token, TokenId};

/// Insertion position for ordered zones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZonePosition {
    /// Top of the zone (end of the sequence; where draws come from).
    Top,
    /// Bottom of the zone (start of the sequence).
    Bottom,
    /// Specific index, clamped to the sequence length.
    Index(usize),
}

/// A 32-byte state content hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateHash(pub [u8; 32]);

impl std::fmt::Debug for StateHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StateHash({})", self)
    }
}

impl std::fmt::Display for StateHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Immutable game state snapshot.
///
/// All numeric variables live in one of three scopes: global,
/// per-player, per-zone. Bounds clamping is the interpreter's job (it
/// knows the declarations); the snapshot only stores values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    player_count: usize,

    // === Progression ===
    /// Current phase (definition-specific, opaque to the kernel).
    pub phase: PhaseId,
    /// Turn number (starts at 1).
    pub turn_number: u32,
    /// Round/card number within the turn structure (starts at 1).
    /// Turn-flow windows are keyed to this counter.
    pub round_number: u32,
    /// Seat whose turn it is.
    pub active_player: PlayerId,

    // === Variables ===
    /// Global variables.
    globals: OrdMap<String, i64>,
    /// Per-player variables.
    player_vars: PlayerMap<OrdMap<String, i64>>,
    /// Per-zone variables.
    zone_vars: OrdMap<ZoneId, OrdMap<String, i64>>,

    // === Tokens and zones ===
    /// Token table.
    tokens: OrdMap<TokenId, Token>,
    /// Zone contents, ordered bottom-to-top.
    zones: OrdMap<ZoneId, Vector<TokenId>>,
    /// Token location index: token -> owning zone.
    locations: OrdMap<TokenId, ZoneId>,
    /// Markers placed per zone.
    markers: OrdMap<ZoneId, OrdSet<String>>,

    // === Bookkeeping ===
    /// Action-usage counters, keyed by the kernel (`action:scope`).
    pub action_usage: OrdMap<String, i64>,
    /// Turn-flow runtime state.
    pub turn_flow: TurnFlowState,
    /// Deterministic RNG state, explicitly threaded.
    pub rng: RngState,
}

impl GameState {
    /// Create an empty state for `player_count` seats and a seed.
    #[must_use]
    pub fn new(player_count: usize, seed: u64) -> Self {
        assert!(player_count > 0, "Must have at least 1 player");
        assert!(player_count <= 255, "At most 255 players supported");

        Self {
            player_count,
            phase: PhaseId::default(),
            turn_number: 1,
            round_number: 1,
            active_player: PlayerId::new(0),
            globals: OrdMap::new(),
            player_vars: PlayerMap::with_default(player_count),
            zone_vars: OrdMap::new(),
            tokens: OrdMap::new(),
            zones: OrdMap::new(),
            locations: OrdMap::new(),
            markers: OrdMap::new(),
            action_usage: OrdMap::new(),
            turn_flow: TurnFlowState::new(),
            rng: RngState::new(seed),
        }
    }

    /// Get player count.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.player_count
    }

    /// Iterate over all player IDs.
    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> {
        PlayerId::all(self.player_count)
    }

    // === Variables ===

    /// Get a global variable with default.
    #[must_use]
    pub fn global(&self, name: &str, default: i64) -> i64 {
        self.globals.get(name).copied().unwrap_or(default)
    }

    /// Set a global variable.
    pub fn set_global(&mut self, name: impl Into<String>, value: i64) {
        self.globals.insert(name.into(), value);
    }

    /// Get a per-player variable with default.
    #[must_use]
    pub fn player_var(&self, player: PlayerId, name: &str, default: i64) -> i64 {
        self.player_vars[player].get(name).copied().unwrap_or(default)
    }

    /// Set a per-player variable.
    pub fn set_player_var(&mut self, player: PlayerId, name: impl Into<String>, value: i64) {
        self.player_vars[player].insert(name.into(), value);
    }

    /// Get a per-zone variable with default.
    #[must_use]
    pub fn zone_var(&self, zone: ZoneId, name: &str, default: i64) -> i64 {
        self.zone_vars
            .get(&zone)
            .and_then(|vars| vars.get(name))
            .copied()
            .unwrap_or(default)
    }

    /// Set a per-zone variable.
    pub fn set_zone_var(&mut self, zone: ZoneId, name: impl Into<String>, value: i64) {
        self.zone_vars
            .entry(zone)
            .or_insert_with(OrdMap::new)
            .insert(name.into(), value);
    }

    /// Sum a per-player variable across all seats plus the same-named
    /// global and per-zone variables. Used by conservation checks.
    #[must_use]
    pub fn var_total(&self, name: &str) -> i64 {
        let mut total = self.global(name, 0);
        for (_, vars) in self.player_vars.iter() {
            total += vars.get(name).copied().unwrap_or(0);
        }
        for (_, vars) in self.zone_vars.iter() {
            total += vars.get(name).copied().unwrap_or(0);
        }
        total
    }

    // === Tokens ===

    /// Add a token to a zone. Panics if the token id already exists.
    pub fn add_token(&mut self, token: Token, zone: ZoneId, position: Option<ZonePosition>) {
        let id = token.id;
        assert!(
            !self.tokens.contains_key(&id),
            "Token {id} already exists in state"
        );
        self.tokens.insert(id, token);
        self.locations.insert(id, zone);
        let mut seq = self.zones.get(&zone).cloned().unwrap_or_default();
        Self::insert_at(&mut seq, id, position);
        self.zones.insert(zone, seq);
    }

    /// Get a token by id.
    #[must_use]
    pub fn token(&self, id: TokenId) -> Option<&Token> {
        self.tokens.get(&id)
    }

    /// Update a token in place on this working copy.
    pub fn update_token(&mut self, token: Token) {
        self.tokens.insert(token.id, token);
    }

    /// The zone currently holding a token.
    #[must_use]
    pub fn zone_of(&self, id: TokenId) -> Option<ZoneId> {
        self.locations.get(&id).copied()
    }

    /// Move a token to a new zone. Returns the old zone, or `None` if
    /// the token is unknown. Moving a token to its current zone is a
    /// no-op that still returns the zone.
    pub fn move_token(
        &mut self,
        id: TokenId,
        dest: ZoneId,
        position: Option<ZonePosition>,
    ) -> Option<ZoneId> {
        let old = self.locations.get(&id).copied()?;
        if old == dest {
            return Some(old);
        }

        if let Some(seq) = self.zones.get(&old) {
            let mut seq = seq.clone();
            seq.retain(|&t| t != id);
            self.zones.insert(old, seq);
        }

        self.locations.insert(id, dest);
        let mut seq = self.zones.get(&dest).cloned().unwrap_or_default();
        Self::insert_at(&mut seq, id, position);
        self.zones.insert(dest, seq);

        Some(old)
    }

    /// Tokens in a zone, bottom-to-top.
    #[must_use]
    pub fn tokens_in_zone(&self, zone: ZoneId) -> Vector<TokenId> {
        self.zones.get(&zone).cloned().unwrap_or_default()
    }

    /// Number of tokens in a zone.
    #[must_use]
    pub fn zone_size(&self, zone: ZoneId) -> usize {
        self.zones.get(&zone).map_or(0, Vector::len)
    }

    /// Top token of a zone (last in the sequence).
    #[must_use]
    pub fn top_of_zone(&self, zone: ZoneId) -> Option<TokenId> {
        self.zones.get(&zone).and_then(|seq| seq.last().copied())
    }

    fn insert_at(seq: &mut Vector<TokenId>, id: TokenId, position: Option<ZonePosition>) {
        match position.unwrap_or(ZonePosition::Top) {
            ZonePosition::Top => seq.push_back(id),
            ZonePosition::Bottom => seq.push_front(id),
            ZonePosition::Index(i) => {
                let idx = i.min(seq.len());
                seq.insert(idx, id);
            }
        }
    }

    // === Markers ===

    /// Is a marker present in a zone?
    #[must_use]
    pub fn has_marker(&self, zone: ZoneId, marker: &str) -> bool {
        self.markers
            .get(&zone)
            .is_some_and(|set| set.contains(marker))
    }

    /// Place a marker in a zone. Returns false if already present.
    pub fn place_marker(&mut self, zone: ZoneId, marker: impl Into<String>) -> bool {
        let mut set = self.markers.get(&zone).cloned().unwrap_or_default();
        let inserted = set.insert(marker.into()).is_none();
        self.markers.insert(zone, set);
        inserted
    }

    /// Remove a marker from a zone. Returns true if it was present.
    pub fn remove_marker(&mut self, zone: ZoneId, marker: &str) -> bool {
        let Some(set) = self.markers.get(&zone) else {
            return false;
        };
        let mut set = set.clone();
        let removed = set.remove(marker).is_some();
        self.markers.insert(zone, set);
        removed
    }

    // === Hashing ===

    /// Compute the content hash of this snapshot.
    ///
    /// Pure: depends only on state content. All collections iterate in
    /// canonical order, so the serialized bytes are stable.
    #[must_use]
    pub fn content_hash(&self) -> StateHash {
        let bytes =
            bincode::serialize(self).expect("state snapshot serialization is infallible");
        StateHash(*blake3::hash(&bytes).as_bytes())
    }
}
