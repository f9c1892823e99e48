//! Turn-flow state machine: eligibility, option matrix, free-operation
//! grants.
//!
//! Per active round/card the machine tracks which seats have acted or
//! passed, which seat is first/second eligible, time-boxed eligibility
//! overrides, and pending free-operation grants. The enumerator and
//! resolver only *read* this state; transitions happen exclusively as
//! side effects of successfully applied moves (see `kernel`).

use im::{OrdSet, Vector};
use serde::{Deserialize, Serialize};

use crate::core::{ActionId, PlayerId, ZoneId};

/// Classification of a move for option-matrix purposes.
///
/// A single action definition may carry several candidate classes; the
/// matrix decides which are open to the acting seat, fanning one
/// template into one variant per admitted class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActionClass {
    /// Play the current card for its event.
    Event,
    /// Full operation.
    Operation,
    /// Operation restricted in scope.
    LimitedOperation,
    /// Special activity accompanying an operation.
    SpecialActivity,
    /// Decline to act this round.
    Pass,
}

impl std::fmt::Display for ActionClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ActionClass::Event => "event",
            ActionClass::Operation => "operation",
            ActionClass::LimitedOperation => "limited-operation",
            ActionClass::SpecialActivity => "special-activity",
            ActionClass::Pass => "pass",
        };
        write!(f, "{name}")
    }
}

/// One row of the option matrix: what the second eligible seat may do
/// given the class the first eligible seat chose.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionMatrixRow {
    /// Class chosen by the first eligible seat.
    pub first_chose: ActionClass,
    /// Classes open to the second eligible seat in response.
    pub second_allowed: Vec<ActionClass>,
}

/// A time-boxed eligibility override.
///
/// Later entries shadow earlier ones for the same seat. Expired entries
/// are ignored by readers and dropped by `expire_windows`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityOverride {
    /// Seat whose eligibility is overridden.
    pub seat: PlayerId,
    /// Forced eligibility while the window is open.
    pub eligible: bool,
    /// Last round number this override applies to.
    pub expires_after_round: u32,
}

/// A pending free-operation grant.
///
/// Covered moves may be taken without consuming eligibility; each use
/// decrements the counter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeOpGrant {
    /// Seat the grant belongs to.
    pub seat: PlayerId,
    /// Actions the grant covers.
    pub actions: OrdSet<ActionId>,
    /// If set, only moves whose zone parameters all fall inside the
    /// filter are covered.
    pub zone_filter: Option<OrdSet<ZoneId>>,
    /// Remaining uses.
    pub remaining_uses: u32,
    /// Last round number this grant applies to.
    pub expires_after_round: u32,
}

impl FreeOpGrant {
    /// Does this grant cover a move on `action` touching `zones`?
    #[must_use]
    pub fn covers(&self, action: ActionId, zones: &[ZoneId], round: u32) -> bool {
        if self.remaining_uses == 0 || round > self.expires_after_round {
            return false;
        }
        if !self.actions.contains(&action) {
            return false;
        }
        match &self.zone_filter {
            Some(filter) => zones.iter().all(|z| filter.contains(z)),
            None => true,
        }
    }
}

/// Per-round turn-flow runtime state, embedded in `GameState`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnFlowState {
    /// Seats that have taken their action this round.
    pub acted: OrdSet<PlayerId>,
    /// Seats that have passed this round.
    pub passed: OrdSet<PlayerId>,
    /// First eligible seat for the current card, in eligibility order.
    pub first_eligible: Option<PlayerId>,
    /// Second eligible seat for the current card.
    pub second_eligible: Option<PlayerId>,
    /// Class the first eligible seat chose, once it has acted.
    pub first_chosen_class: Option<ActionClass>,
    /// Non-pass actions taken this round.
    pub non_pass_count: u32,
    /// Pending eligibility overrides, oldest first.
    pub overrides: Vector<EligibilityOverride>,
    /// Pending free-operation grants, oldest first.
    pub grants: Vector<FreeOpGrant>,
}

impl TurnFlowState {
    /// Create an empty record with no eligibility assignments.
    #[must_use]
    pub fn new() -> Self {
        Self {
            acted: OrdSet::new(),
            passed: OrdSet::new(),
            first_eligible: None,
            second_eligible: None,
            first_chosen_class: None,
            non_pass_count: 0,
            overrides: Vector::new(),
            grants: Vector::new(),
        }
    }

    // === Read side (enumerator / resolver) ===

    /// Is `seat` eligible to act in `round`?
    ///
    /// The newest unexpired override for the seat wins; otherwise a seat
    /// is eligible unless it has already acted or passed this round.
    #[must_use]
    pub fn is_eligible(&self, seat: PlayerId, round: u32) -> bool {
        for ov in self.overrides.iter().rev() {
            if ov.seat == seat && round <= ov.expires_after_round {
                return ov.eligible;
            }
        }
        !self.acted.contains(&seat) && !self.passed.contains(&seat)
    }

    /// Classes open to `seat` under the option matrix.
    ///
    /// The first eligible seat picks from `first_allowed`; the second
    /// eligible seat picks from the matrix row matching the first seat's
    /// chosen class. A seat that is neither first nor second eligible
    /// (but still eligible, e.g. via override) may only pass.
    #[must_use]
    pub fn allowed_classes(
        &self,
        seat: PlayerId,
        first_allowed: &[ActionClass],
        matrix: &[OptionMatrixRow],
    ) -> Vec<ActionClass> {
        if self.first_eligible == Some(seat) && self.first_chosen_class.is_none() {
            return first_allowed.to_vec();
        }
        if self.second_eligible == Some(seat) {
            match self.first_chosen_class {
                Some(first) => {
                    for row in matrix {
                        if row.first_chose == first {
                            return row.second_allowed.clone();
                        }
                    }
                    // No row for the chosen class: second may only pass.
                    vec![ActionClass::Pass]
                }
                // First has not acted yet; the second seat's options are
                // ambiguous, so every matrix outcome stays open.
                None => {
                    let mut open: Vec<ActionClass> = Vec::new();
                    for row in matrix {
                        for class in &row.second_allowed {
                            if !open.contains(class) {
                                open.push(*class);
                            }
                        }
                    }
                    if !open.contains(&ActionClass::Pass) {
                        open.push(ActionClass::Pass);
                    }
                    open
                }
            }
        } else {
            vec![ActionClass::Pass]
        }
    }

    /// Grants of `seat` covering a move, if any. Returns the index of
    /// the first covering grant.
    #[must_use]
    pub fn covering_grant(
        &self,
        seat: PlayerId,
        action: ActionId,
        zones: &[ZoneId],
        round: u32,
    ) -> Option<usize> {
        self.grants
            .iter()
            .position(|g| g.seat == seat && g.covers(action, zones, round))
    }

    // === Write side (kernel only) ===

    /// Record that a seat acted with the given class.
    pub fn record_acted(&mut self, seat: PlayerId, class: ActionClass) {
        if class == ActionClass::Pass {
            self.passed.insert(seat);
        } else {
            self.acted.insert(seat);
            self.non_pass_count += 1;
            if self.first_eligible == Some(seat) && self.first_chosen_class.is_none() {
                self.first_chosen_class = Some(class);
            }
        }
    }

    /// Consume one use of the grant at `index`.
    pub fn consume_grant(&mut self, index: usize) {
        if let Some(grant) = self.grants.get(index) {
            let mut grant = grant.clone();
            grant.remaining_uses = grant.remaining_uses.saturating_sub(1);
            self.grants.set(index, grant);
        }
    }

    /// Add a free-operation grant.
    pub fn add_grant(&mut self, grant: FreeOpGrant) {
        self.grants.push_back(grant);
    }

    /// Add an eligibility override.
    pub fn add_override(&mut self, ov: EligibilityOverride) {
        self.overrides.push_back(ov);
    }

    /// Drop overrides and spent/expired grants whose window closed
    /// before `round`.
    pub fn expire_windows(&mut self, round: u32) {
        self.overrides.retain(|ov| round <= ov.expires_after_round);
        self.grants
            .retain(|g| g.remaining_uses > 0 && round <= g.expires_after_round);
    }

    /// Reset the per-round record for a new card, keeping unexpired
    /// windows.
    pub fn begin_round(&mut self, first: Option<PlayerId>, second: Option<PlayerId>) {
        self.acted = OrdSet::new();
        self.passed = OrdSet::new();
        self.first_eligible = first;
        self.second_eligible = second;
        self.first_chosen_class = None;
        self.non_pass_count = 0;
    }
}

impl Default for TurnFlowState {
    fn default() -> Self {
        Self::new()
    }
}
