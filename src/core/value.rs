//! Runtime values flowing through expressions, bindings, and move
//! parameters.
//!
//! All state variables are integers with declared bounds; `Value` exists
//! for the richer data that moves through bindings and decision domains:
//! token references, zone references, lists harvested by queries.
//!
//! `Value` is totally ordered so that option domains, binding maps, and
//! parameter maps iterate in one canonical order everywhere.

use serde::{Deserialize, Serialize};

use super::ids::{TokenTypeId, ZoneId};
use super::player::PlayerId;
use super::token::TokenId;

/// A runtime value.
///
/// The ordering across variants is by discriminant first, then by
/// payload. It has no game meaning; it only pins a canonical sort.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Value {
    /// Signed integer (all variables, counters, amounts).
    Int(i64),
    /// Boolean.
    Bool(bool),
    /// String (marker names, identifiers surfaced to choices).
    Str(String),
    /// Player reference.
    Player(PlayerId),
    /// Zone reference.
    Zone(ZoneId),
    /// Token reference.
    Token(TokenId),
    /// Token type reference.
    TokenType(TokenTypeId),
    /// Ordered list of values.
    List(Vec<Value>),
}

impl Value {
    /// View as integer, if this is an `Int`.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// View as boolean, if this is a `Bool`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// View as player, if this is a `Player`.
    #[must_use]
    pub fn as_player(&self) -> Option<PlayerId> {
        match self {
            Value::Player(p) => Some(*p),
            _ => None,
        }
    }

    /// View as zone, if this is a `Zone`.
    #[must_use]
    pub fn as_zone(&self) -> Option<ZoneId> {
        match self {
            Value::Zone(z) => Some(*z),
            _ => None,
        }
    }

    /// View as token, if this is a `Token`.
    #[must_use]
    pub fn as_token(&self) -> Option<TokenId> {
        match self {
            Value::Token(t) => Some(*t),
            _ => None,
        }
    }

    /// View as list slice, if this is a `List`.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Truthiness: `Bool` is itself, `Int` is nonzero, lists are
    /// nonempty, references are true.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Player(_) | Value::Zone(_) | Value::Token(_) | Value::TokenType(_) => true,
        }
    }

    /// Short name of the variant for error contexts.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::Str(_) => "str",
            Value::Player(_) => "player",
            Value::Zone(_) => "zone",
            Value::Token(_) => "token",
            Value::TokenType(_) => "token-type",
            Value::List(_) => "list",
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<PlayerId> for Value {
    fn from(p: PlayerId) -> Self {
        Value::Player(p)
    }
}

impl From<ZoneId> for Value {
    fn from(z: ZoneId) -> Self {
        Value::Zone(z)
    }
}

impl From<TokenId> for Value {
    fn from(t: TokenId) -> Self {
        Value::Token(t)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Player(p) => write!(f, "{p}"),
            Value::Zone(z) => write!(f, "{z}"),
            Value::Token(t) => write!(f, "{t}"),
            Value::TokenType(t) => write!(f, "{t}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}
