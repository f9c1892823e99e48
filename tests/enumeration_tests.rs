//! Legal-move enumeration over the fixture game: matrix fan-out,
//! budget monotonicity, free-operation expansion.

mod common;

use common::{chip_game, ANTE, BET, PASS};
use proptest::prelude::*;
use tabula::{
    ActionClass, ActionId, Budgets, EligibilityOverride, FreeOpGrant, PlayerId, Value,
};

#[test]
fn initial_state_enumerates_every_action_once() {
    let def = chip_game();
    let state = def.initial_state(1);

    let mut budgets = Budgets::default();
    let result = tabula::enumerate(&def, &state, &mut budgets).unwrap();

    // One operation-classed template per action for the first seat
    // (bet's limited-operation class is not open to the first seat).
    let actions: Vec<ActionId> = result.moves.iter().map(|m| m.mv.action).collect();
    assert_eq!(actions.len(), 5);
    assert!(result.warnings.is_empty());
    assert!(result
        .moves
        .iter()
        .all(|m| m.class == ActionClass::Operation || m.class == ActionClass::Pass));
}

#[test]
fn second_seat_is_narrowed_by_the_matrix() {
    let def = chip_game();
    let mut state = def.initial_state(1);

    state
        .turn_flow
        .record_acted(PlayerId::new(0), ActionClass::Operation);
    state.active_player = PlayerId::new(1);

    let mut budgets = Budgets::default();
    let result = tabula::enumerate(&def, &state, &mut budgets).unwrap();

    // Bet survives as a limited operation; ante (operation-only) is
    // closed; pass stays open.
    let bet_classes: Vec<ActionClass> = result
        .moves
        .iter()
        .filter(|m| m.mv.action == BET)
        .map(|m| m.class)
        .collect();
    assert_eq!(bet_classes, vec![ActionClass::LimitedOperation]);
    assert!(result.moves.iter().all(|m| m.mv.action != ANTE));
    assert!(result.moves.iter().any(|m| m.mv.action == PASS));
}

#[test]
fn ineligible_seat_enumerates_nothing() {
    let def = chip_game();
    let mut state = def.initial_state(1);
    state.turn_flow.add_override(EligibilityOverride {
        seat: PlayerId::new(0),
        eligible: false,
        expires_after_round: 5,
    });

    let mut budgets = Budgets::default();
    let result = tabula::enumerate(&def, &state, &mut budgets).unwrap();
    assert!(result.moves.is_empty());

    // The window closes: round 6 enumerates normally again.
    state.round_number = 6;
    let mut budgets = Budgets::default();
    let result = tabula::enumerate(&def, &state, &mut budgets).unwrap();
    assert!(!result.moves.is_empty());
}

#[test]
fn free_operation_grant_duplicates_covered_moves() {
    let def = chip_game();
    let mut state = def.initial_state(1);
    state.turn_flow.add_grant(FreeOpGrant {
        seat: PlayerId::new(0),
        actions: im::OrdSet::from(vec![ANTE]),
        zone_filter: None,
        remaining_uses: 2,
        expires_after_round: 9,
    });

    let mut budgets = Budgets::default();
    let result = tabula::enumerate(&def, &state, &mut budgets).unwrap();

    let free: Vec<_> = result.moves.iter().filter(|m| m.free_operation).collect();
    assert_eq!(free.len(), 1);
    assert_eq!(free[0].mv.action, ANTE);

    // The free variant applies without consuming eligibility.
    let applied = tabula::apply_move(&def, &state, free[0]).unwrap();
    assert!(!applied.state.turn_flow.acted.contains(&PlayerId::new(0)));
    assert_eq!(applied.state.turn_flow.grants[0].remaining_uses, 1);
}

#[test]
fn enumerated_moves_all_apply() {
    let def = chip_game();
    let state = def.initial_state(1);

    let mut budgets = Budgets::default();
    let result = tabula::enumerate(&def, &state, &mut budgets).unwrap();

    for legal in &result.moves {
        // Complete any decision sequence first, as a caller would.
        let resolution = tabula::resolve(
            &def,
            &state,
            &legal.mv,
            &tabula::ResolveOptions::default(),
        )
        .unwrap();
        assert!(resolution.complete, "move {:?} must resolve", legal.mv);

        let completed = tabula::LegalMove {
            mv: resolution.mv,
            class: legal.class,
            free_operation: legal.free_operation,
        };
        tabula::apply_move(&def, &state, &completed)
            .unwrap_or_else(|e| panic!("enumerated move failed to apply: {e}"));
    }
}

#[test]
fn pass_remains_after_the_window_closes() {
    let def = chip_game();
    let mut state = def.initial_state(1);
    state
        .turn_flow
        .record_acted(PlayerId::new(1), ActionClass::Operation);
    state
        .turn_flow
        .record_acted(PlayerId::new(2), ActionClass::Operation);

    let mut budgets = Budgets::default();
    let result = tabula::enumerate(&def, &state, &mut budgets).unwrap();

    assert!(!result.moves.is_empty());
    assert!(result.moves.iter().all(|m| m.class == ActionClass::Pass));
}

proptest! {
    #[test]
    fn template_budget_is_monotonic(cap in 0u32..12) {
        let def = chip_game();
        let state = def.initial_state(1);

        let mut budgets = Budgets::new(cap, 10_000, 100_000, 64);
        let result = tabula::enumerate(&def, &state, &mut budgets).unwrap();

        prop_assert!(result.moves.len() <= cap as usize);

        let budget_warnings = result
            .warnings
            .iter()
            .filter(|w| w.code == "template-budget-exceeded")
            .count();
        // Exactly one warning when truncation happened, none otherwise.
        if result.moves.len() < 5 {
            prop_assert_eq!(budget_warnings, 1);
        } else {
            prop_assert_eq!(budget_warnings, 0);
        }
    }

    #[test]
    fn enumeration_is_deterministic_for_any_stack(chips in 0i64..5000) {
        let def = chip_game();
        let mut state = def.initial_state(1);
        state.set_player_var(PlayerId::new(0), "chips", chips);

        let mut b1 = Budgets::default();
        let mut b2 = Budgets::default();
        let r1 = tabula::enumerate(&def, &state, &mut b1).unwrap();
        let r2 = tabula::enumerate(&def, &state, &mut b2).unwrap();

        prop_assert_eq!(r1.moves, r2.moves);
    }

    #[test]
    fn applied_bets_never_overdraw(amount in 1i64..100, chips in 0i64..200) {
        let def = chip_game();
        let mut state = def.initial_state(1);
        state.set_player_var(PlayerId::new(0), "chips", chips);

        let legal = tabula::LegalMove::new(
            tabula::Move::new(BET).with_param("amount", Value::Int(amount)),
            ActionClass::Operation,
        );

        match tabula::apply_move(&def, &state, &legal) {
            Ok(applied) => {
                // A legal bet moved exactly `amount` and left a
                // non-negative stack.
                prop_assert!(amount <= chips);
                prop_assert_eq!(applied.state.global("pot", 0), amount);
                prop_assert!(applied.state.player_var(PlayerId::new(0), "chips", 0) >= 0);
            }
            Err(err) => {
                // Only the per-option legality can reject here.
                prop_assert!(amount > chips, "unexpected rejection: {err}");
            }
        }
    }
}
