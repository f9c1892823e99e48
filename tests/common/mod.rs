//! Shared fixture: a small chip-betting game exercising every kernel
//! surface — variables in all three scopes, decisions, randomness,
//! schedules, and turn-flow.

#![allow(dead_code)]

use tabula::{
    ActionClass, ActionDef, ActionId, CmpOp, CondExpr, Effect, GameDefinition, LegalMove,
    LimitScope, Move, OptionMatrixRow, PhaseDef, PhaseId, PlayerId, Query, TokenTypeDef,
    TokenTypeId, TurnConfig, Value, ValueExpr, VarDef, VarScope, VarTarget, ZoneDef, ZoneId,
};

pub const TABLE: ZoneId = ZoneId(0);
pub const DISCARD: ZoneId = ZoneId(1);
pub const BAG: ZoneId = ZoneId(2);

pub const ANTE: ActionId = ActionId(0);
pub const BET: ActionId = ActionId(1);
pub const PASS: ActionId = ActionId(2);
pub const END_HAND: ActionId = ActionId(3);
pub const ROLL: ActionId = ActionId(4);

/// Build the fixture definition: three seats around a chip game.
///
/// - `ante` transfers `blind_level * 10` chips into the pot;
/// - `bet` asks for an amount (decision) capped by the actor's chips;
/// - `end_hand` advances the hand counter and raises the blind level
///   exactly when the counter crosses its threshold;
/// - `roll` adds a die roll to the pot.
pub fn chip_game() -> GameDefinition {
    let mut def = GameDefinition::new("chip-game", 3);

    def.zones = vec![
        ZoneDef::new(TABLE, "table"),
        ZoneDef::new(DISCARD, "discard"),
        ZoneDef::new(BAG, "bag"),
    ];
    def.token_types = vec![TokenTypeDef::new(TokenTypeId::new(0), "card")];

    def.vars = vec![
        VarDef::new("chips", VarScope::PerPlayer, 0, 10_000, 1000),
        VarDef::new("pot", VarScope::Global, 0, 30_000, 0),
        VarDef::new("blind_level", VarScope::Global, 1, 10, 1),
        VarDef::new("hands_played", VarScope::Global, 0, 1000, 0),
        VarDef::new("heat", VarScope::PerZone, 0, 100, 0),
    ];

    def.turn = TurnConfig {
        phases: vec![
            PhaseDef::new(PhaseId::new(0), "betting"),
            PhaseDef::new(PhaseId::new(1), "showdown"),
        ],
        eligibility_order: vec![PlayerId::new(0), PlayerId::new(1), PlayerId::new(2)],
        first_allowed: vec![ActionClass::Event, ActionClass::Operation],
        option_matrix: vec![
            OptionMatrixRow {
                first_chose: ActionClass::Operation,
                second_allowed: vec![ActionClass::LimitedOperation, ActionClass::Pass],
            },
            OptionMatrixRow {
                first_chose: ActionClass::Event,
                second_allowed: vec![ActionClass::Operation, ActionClass::Pass],
            },
        ],
    };

    def.actions = vec![
        ActionDef::new(ANTE, "ante").with_effects(vec![Effect::TransferVar {
            from: VarTarget::actor("chips"),
            to: VarTarget::global("pot"),
            amount: ValueExpr::Mul(
                Box::new(ValueExpr::global("blind_level")),
                Box::new(ValueExpr::int(10)),
            ),
            window: None,
        }]),
        ActionDef::new(BET, "bet")
            .with_classes([ActionClass::Operation, ActionClass::LimitedOperation])
            .with_effects(vec![Effect::ChooseOne {
                decision: "amount".into(),
                options: Query::int_range(1, 100),
                legal_if: Some(CondExpr::cmp(
                    CmpOp::Le,
                    ValueExpr::binding("n"),
                    ValueExpr::actor_var("chips"),
                )),
                binder: "n".into(),
                body: vec![Effect::TransferVar {
                    from: VarTarget::actor("chips"),
                    to: VarTarget::global("pot"),
                    amount: ValueExpr::binding("n"),
                    window: None,
                }],
            }]),
        ActionDef::new(PASS, "pass").with_classes([ActionClass::Pass]),
        ActionDef::new(END_HAND, "end-hand")
            .with_limit(LimitScope::Round, 1)
            .with_effects(vec![
                Effect::AddVar {
                    target: VarTarget::global("hands_played"),
                    delta: ValueExpr::int(1),
                },
                // Blind schedule: the level rises exactly when the hand
                // counter crosses its trigger, never mid-hand.
                Effect::when(
                    CondExpr::equals(ValueExpr::global("hands_played"), ValueExpr::int(4)),
                    vec![Effect::AddVar {
                        target: VarTarget::global("blind_level"),
                        delta: ValueExpr::int(1),
                    }],
                ),
            ]),
        ActionDef::new(ROLL, "roll").with_effects(vec![
            Effect::RollRandom {
                binder: "d".into(),
                sides: ValueExpr::int(6),
            },
            Effect::AddVar {
                target: VarTarget::global("pot"),
                delta: ValueExpr::binding("d"),
            },
        ]),
    ];

    def.rebuild_cache();
    def
}

/// Wrap an action as an operation-classed legal move.
pub fn op(action: ActionId) -> LegalMove {
    LegalMove::new(Move::new(action), ActionClass::Operation)
}

/// Wrap an action with one parameter as an operation-classed move.
pub fn op_with(action: ActionId, key: &str, value: Value) -> LegalMove {
    LegalMove::new(
        Move::new(action).with_param(key, value),
        ActionClass::Operation,
    )
}

/// Total chips in play: every stack plus the pot. Conserved by every
/// transfer in the fixture.
pub fn total_chips(state: &tabula::GameState) -> i64 {
    state.var_total("chips") + state.global("pot", 0)
}

/// Apply one move per round from a fresh seed, advancing the round
/// between moves so the first seat stays eligible. Returns the final
/// state plus the hash and trace of every application.
pub fn play_rounds(
    def: &GameDefinition,
    seed: u64,
    moves: &[LegalMove],
) -> (
    tabula::GameState,
    Vec<tabula::StateHash>,
    Vec<tabula::TraceLog>,
) {
    let mut state = def.initial_state(seed);
    let mut hashes = Vec::new();
    let mut traces = Vec::new();

    for legal in moves {
        let resolution =
            tabula::resolve(def, &state, &legal.mv, &tabula::ResolveOptions::default())
                .expect("resolvable move");
        let completed = LegalMove {
            mv: resolution.mv,
            class: legal.class,
            free_operation: legal.free_operation,
        };
        let applied = tabula::apply_move(def, &state, &completed).expect("legal move");
        hashes.push(applied.hash);
        traces.push(applied.trace);
        state = tabula::advance_round(def, &applied.state);
    }

    (state, hashes, traces)
}
