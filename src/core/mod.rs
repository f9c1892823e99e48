//! Core kernel types: identifiers, players, tokens, state, RNG, budgets.
//!
//! This module contains the fundamental building blocks that are
//! game-agnostic. Compiled game definitions give meaning to the opaque
//! identifiers declared here; the kernel never hardcodes zones, phases,
//! or action kinds.

pub mod budget;
pub mod ids;
pub mod player;
pub mod rng;
pub mod state;
pub mod token;
pub mod value;

pub use budget::{Budgets, Warning};
pub use ids::{ActionId, PhaseId, TokenTypeId, ZoneId};
pub use player::{PlayerId, PlayerMap};
pub use rng::RngState;
pub use state::{GameState, StateHash, ZonePosition};
pub use token::{Token, TokenId};
pub use value::Value;
