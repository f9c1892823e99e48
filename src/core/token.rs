//! Tokens: the physical pieces of a game.
//!
//! A token is an id, a type, and a property bag. Tokens are owned by at
//! most one zone at a time; zone membership lives in `GameState`, not on
//! the token, so moving a token never touches the token itself.
//!
//! Properties use an ordered map so that snapshots hash canonically.

use im::OrdMap;
use serde::{Deserialize, Serialize};

use super::ids::TokenTypeId;
use super::player::PlayerId;

/// Unique identifier for a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenId(pub u32);

impl TokenId {
    /// Create a new token ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token({})", self.0)
    }
}

/// A game piece: id + type + property bag.
///
/// The kernel does not interpret properties; definitions give keys
/// meaning (face value, suit, strength). All values are `i64`, matching
/// the variable model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Unique id, allocated by the definition loader.
    pub id: TokenId,

    /// Token type (piece kind, chip denomination, card identity).
    pub token_type: TokenTypeId,

    /// Owning player, if the token belongs to a seat.
    pub owner: Option<PlayerId>,

    /// Property bag. Ordered for canonical hashing.
    props: OrdMap<String, i64>,
}

impl Token {
    /// Create a new token with an empty property bag.
    #[must_use]
    pub fn new(id: TokenId, token_type: TokenTypeId) -> Self {
        Self {
            id,
            token_type,
            owner: None,
            props: OrdMap::new(),
        }
    }

    /// Set the owning player.
    #[must_use]
    pub fn with_owner(mut self, owner: PlayerId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Set a property, builder style.
    #[must_use]
    pub fn with_prop(mut self, key: impl Into<String>, value: i64) -> Self {
        self.props.insert(key.into(), value);
        self
    }

    /// Get a property value with default.
    #[must_use]
    pub fn prop(&self, key: &str, default: i64) -> i64 {
        self.props.get(key).copied().unwrap_or(default)
    }

    /// Set a property value.
    pub fn set_prop(&mut self, key: impl Into<String>, value: i64) {
        self.props.insert(key.into(), value);
    }

    /// Iterate over properties in canonical (key) order.
    pub fn props(&self) -> impl Iterator<Item = (&String, &i64)> {
        self.props.iter()
    }
}
