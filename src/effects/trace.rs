//! Structured traces and events emitted during effect application.
//!
//! Events go to downstream consumers with the applied move's result;
//! trace entries go to an observability collaborator. Both are owned by
//! the top-level call tree, never shared across invocations.

use serde::{Deserialize, Serialize};

use crate::core::{PhaseId, PlayerId, TokenId, ZoneId};

/// A resolved variable location.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VarHandle {
    /// Global variable.
    Global(String),
    /// Per-player variable.
    Player(PlayerId, String),
    /// Per-zone variable.
    Zone(ZoneId, String),
}

impl VarHandle {
    /// The variable name, without its scope.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            VarHandle::Global(name) => name,
            VarHandle::Player(_, name) => name,
            VarHandle::Zone(_, name) => name,
        }
    }
}

impl std::fmt::Display for VarHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VarHandle::Global(name) => write!(f, "global.{name}"),
            VarHandle::Player(p, name) => write!(f, "{p}.{name}"),
            VarHandle::Zone(z, name) => write!(f, "{z}.{name}"),
        }
    }
}

/// An event emitted by effect application, consumed by downstream
/// collaborators (UI, observers).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// A variable changed value.
    VarChanged {
        /// Which variable.
        var: VarHandle,
        /// Value before.
        old: i64,
        /// Value after.
        new: i64,
    },
    /// A token changed zones.
    TokenMoved {
        /// Which token.
        token: TokenId,
        /// Zone it left.
        from: ZoneId,
        /// Zone it entered.
        to: ZoneId,
    },
    /// A marker was placed.
    MarkerPlaced {
        /// Target zone.
        zone: ZoneId,
        /// Marker name.
        marker: String,
    },
    /// A marker was removed.
    MarkerRemoved {
        /// Target zone.
        zone: ZoneId,
        /// Marker name.
        marker: String,
    },
    /// The phase changed.
    PhaseChanged {
        /// Phase before.
        from: PhaseId,
        /// Phase after.
        to: PhaseId,
    },
}

/// A structured trace entry for observability.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceEntry {
    /// A variable changed value.
    VarChanged {
        /// Which variable.
        var: VarHandle,
        /// Value before.
        old: i64,
        /// Value after.
        new: i64,
    },
    /// A conserved quantity moved between two variables.
    ResourceTransferred {
        /// Source variable.
        from: VarHandle,
        /// Destination variable.
        to: VarHandle,
        /// Amount actually moved after clamping.
        amount: i64,
    },
    /// A token changed zones.
    TokenMoved {
        /// Which token.
        token: TokenId,
        /// Zone it left.
        from: ZoneId,
        /// Zone it entered.
        to: ZoneId,
    },
    /// Summary of one loop execution.
    LoopIteration {
        /// Untruncated match count of the source query.
        matched: usize,
        /// Iterations actually run after truncation.
        iterated: usize,
    },
    /// Summary of one removal group.
    RemovalGroup {
        /// Group position, highest priority first.
        group: usize,
        /// Tokens removed from this group.
        removed: usize,
        /// Zones the removed tokens occupied at removal time, in
        /// removal order.
        from_zones: Vec<ZoneId>,
    },
    /// A random roll.
    RandomRolled {
        /// Binder the roll was bound to.
        binder: String,
        /// Rolled value.
        value: i64,
    },
}

/// Ordered trace collector for one top-level application.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceLog {
    entries: Vec<TraceEntry>,
}

impl TraceLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&mut self, entry: TraceEntry) {
        self.entries.push(entry);
    }

    /// Entries in emission order.
    #[must_use]
    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Is the log empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_handle_display() {
        assert_eq!(VarHandle::Global("pot".into()).to_string(), "global.pot");
        assert_eq!(
            VarHandle::Player(PlayerId::new(1), "chips".into()).to_string(),
            "Player 1.chips"
        );
    }

    #[test]
    fn test_trace_log_ordering() {
        let mut log = TraceLog::new();
        log.push(TraceEntry::LoopIteration {
            matched: 5,
            iterated: 3,
        });
        log.push(TraceEntry::RandomRolled {
            binder: "d".into(),
            value: 4,
        });

        assert_eq!(log.len(), 2);
        assert!(matches!(
            log.entries()[0],
            TraceEntry::LoopIteration { matched: 5, .. }
        ));
    }

    #[test]
    fn test_serialization() {
        let entry = TraceEntry::ResourceTransferred {
            from: VarHandle::Player(PlayerId::new(0), "chips".into()),
            to: VarHandle::Global("pot".into()),
            amount: 20,
        };
        let json = serde_json::to_string(&entry).unwrap();
        let deserialized: TraceEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, deserialized);
    }
}
