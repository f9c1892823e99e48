//! Deterministic counter-based random number generation.
//!
//! ## Design
//!
//! The kernel threads RNG state explicitly: every draw is a pure
//! function `state -> (value, next_state)`. State is just a seed plus a
//! draw counter; the generator is ChaCha8 positioned at the counter's
//! word offset, so capture/restore is O(1) regardless of how many draws
//! have happened.
//!
//! Replaying the same `(seed, draw sequence)` always reproduces the same
//! values, which is what makes whole-game replay bit-stable.
//!
//! ```
//! use tabula::RngState;
//!
//! let s0 = RngState::new(42);
//!
//! // Drawing is pure: the same state always yields the same value.
//! let (a, s1) = s0.next_u64();
//! let (b, _) = s0.next_u64();
//! assert_eq!(a, b);
//! assert_eq!(s1.counter, 1);
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Words of ChaCha8 output consumed per 64-bit draw.
const WORDS_PER_DRAW: u128 = 2;

/// Pure, counter-based deterministic RNG state.
///
/// `RngState` is `Copy`; drawing returns a fresh state rather than
/// mutating. Two states with equal `(seed, counter)` always produce
/// identical draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RngState {
    /// Original seed for the run.
    pub seed: u64,
    /// Number of draws taken so far.
    pub counter: u64,
}

impl RngState {
    /// Create a fresh state for a seed, with no draws taken.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { seed, counter: 0 }
    }

    /// Draw a raw 64-bit value. Pure: returns the advanced state.
    #[must_use]
    pub fn next_u64(self) -> (u64, Self) {
        let mut chacha = ChaCha8Rng::seed_from_u64(self.seed);
        chacha.set_word_pos(u128::from(self.counter) * WORDS_PER_DRAW);
        let value = chacha.gen::<u64>();
        (
            value,
            Self {
                seed: self.seed,
                counter: self.counter + 1,
            },
        )
    }

    /// Draw a value in `0..bound`. Pure: returns the advanced state.
    ///
    /// `bound` must be positive; a zero bound is a caller bug.
    #[must_use]
    pub fn next_below(self, bound: u64) -> (u64, Self) {
        assert!(bound > 0, "RNG bound must be positive");
        let mut chacha = ChaCha8Rng::seed_from_u64(self.seed);
        chacha.set_word_pos(u128::from(self.counter) * WORDS_PER_DRAW);
        let value = chacha.gen_range(0..bound);
        (
            value,
            Self {
                seed: self.seed,
                counter: self.counter + 1,
            },
        )
    }

    /// Roll an n-sided die, yielding `1..=sides`.
    #[must_use]
    pub fn roll(self, sides: u64) -> (i64, Self) {
        let (value, next) = self.next_below(sides);
        (value as i64 + 1, next)
    }
}
