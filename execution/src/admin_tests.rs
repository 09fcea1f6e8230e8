//! Privileged instructions: owner gating, pricing bounds, the multiplier
//! hierarchy, pausing, leaderboard seeding, and fee withdrawal.

use crate::mocks::{create_account_keypair, set_owner, verify_account};
use crate::state::{Memory, State};
use crate::{queries, Layer};
use commonware_runtime::deterministic::Runner;
use commonware_runtime::Runner as _;
use reflex_types::economy::{
    GameMode, LeaderboardEntry, VerificationLevel, ERROR_HIERARCHY_VIOLATION, ERROR_PAUSED,
    ERROR_PRICING_OUT_OF_BOUNDS, ERROR_UNAUTHORIZED, MAX_TURN_COST, UNIT,
};
use reflex_types::execution::{Event, Instruction, Key, Output, Transaction, Value};

async fn run(state: &mut Memory, view: u64, txs: Vec<Transaction>) -> Vec<Output> {
    let mut layer = Layer::new(&*state, view);
    let (outputs, _) = layer.execute(txs).await.unwrap();
    let changes = layer.commit();
    state.apply(changes).await.unwrap();
    outputs
}

fn error_codes(outputs: &[Output]) -> Vec<u8> {
    outputs
        .iter()
        .filter_map(|output| match output {
            Output::Event(Event::EconomyError { code, .. }) => Some(*code),
            _ => None,
        })
        .collect()
}

#[test]
fn privileged_instructions_reject_non_owners() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut state = Memory::default();
        let (_, owner_public) = create_account_keypair(999);
        set_owner(&owner_public);
        let (stranger_signer, stranger_public) = create_account_keypair(7);

        let outputs = run(
            &mut state,
            1,
            vec![
                Transaction::sign(
                    &stranger_signer,
                    0,
                    Instruction::SetAuthorizedSubmitter {
                        submitter: stranger_public.clone(),
                        authorized: true,
                    },
                ),
                Transaction::sign(
                    &stranger_signer,
                    1,
                    Instruction::UpdatePricing {
                        tokens_per_point: UNIT / 10,
                        turn_cost: UNIT / 2,
                        weekly_pass_cost: 10 * UNIT,
                    },
                ),
                Transaction::sign(&stranger_signer, 2, Instruction::SetPaused { paused: true }),
                Transaction::sign(&stranger_signer, 3, Instruction::WithdrawFees),
                Transaction::sign(
                    &stranger_signer,
                    4,
                    Instruction::SeedLeaderboard {
                        mode: GameMode::Classic,
                        entries: Vec::new(),
                    },
                ),
            ],
        )
        .await;
        assert_eq!(error_codes(&outputs), vec![ERROR_UNAUTHORIZED; 5]);
    });
}

#[test]
fn pricing_updates_enforce_bounds() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut state = Memory::default();
        let (owner_signer, owner_public) = create_account_keypair(999);
        set_owner(&owner_public);

        let outputs = run(
            &mut state,
            1,
            vec![Transaction::sign(
                &owner_signer,
                0,
                Instruction::UpdatePricing {
                    tokens_per_point: UNIT / 10,
                    turn_cost: MAX_TURN_COST + 1,
                    weekly_pass_cost: 10 * UNIT,
                },
            )],
        )
        .await;
        assert_eq!(error_codes(&outputs), vec![ERROR_PRICING_OUT_OF_BOUNDS]);

        let outputs = run(
            &mut state,
            2,
            vec![Transaction::sign(
                &owner_signer,
                1,
                Instruction::UpdatePricing {
                    tokens_per_point: UNIT / 5,
                    turn_cost: UNIT,
                    weekly_pass_cost: 20 * UNIT,
                },
            )],
        )
        .await;
        assert!(outputs.iter().any(|output| matches!(
            output,
            Output::Event(Event::PricingUpdated { .. })
        )));

        let pricing = queries::current_pricing(&state).await.unwrap();
        assert_eq!(pricing.tokens_per_point, UNIT / 5);
        assert_eq!(pricing.turn_cost, UNIT);
        assert_eq!(pricing.weekly_pass_cost, 20 * UNIT);
    });
}

#[test]
fn multiplier_updates_enforce_the_hierarchy() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut state = Memory::default();
        let (owner_signer, owner_public) = create_account_keypair(999);
        set_owner(&owner_public);

        // A lower tier may not out-multiply a higher one.
        let outputs = run(
            &mut state,
            1,
            vec![Transaction::sign(
                &owner_signer,
                0,
                Instruction::UpdateMultipliers {
                    orb_plus: 110,
                    orb: 120,
                    secure_document: 100,
                    document: 100,
                },
            )],
        )
        .await;
        assert_eq!(error_codes(&outputs), vec![ERROR_HIERARCHY_VIOLATION]);

        let outputs = run(
            &mut state,
            2,
            vec![Transaction::sign(
                &owner_signer,
                1,
                Instruction::UpdateMultipliers {
                    orb_plus: 150,
                    orb: 130,
                    secure_document: 115,
                    document: 105,
                },
            )],
        )
        .await;
        assert!(outputs.iter().any(|output| matches!(
            output,
            Output::Event(Event::MultipliersUpdated { .. })
        )));

        let table = queries::verification_multipliers(&state).await.unwrap();
        assert_eq!(table.orb_plus, 150);
        assert_eq!(table.document, 105);
    });
}

#[test]
fn pause_blocks_play_until_resumed() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut state = Memory::default();
        let (owner_signer, owner_public) = create_account_keypair(999);
        set_owner(&owner_public);
        let (player_signer, player_public) = create_account_keypair(1);
        verify_account(&mut state, &player_public, VerificationLevel::Document).await;

        run(
            &mut state,
            1,
            vec![Transaction::sign(
                &owner_signer,
                0,
                Instruction::SetPaused { paused: true },
            )],
        )
        .await;
        let outputs = run(
            &mut state,
            2,
            vec![Transaction::sign(&player_signer, 0, Instruction::StartGame)],
        )
        .await;
        assert_eq!(error_codes(&outputs), vec![ERROR_PAUSED]);

        run(
            &mut state,
            3,
            vec![Transaction::sign(
                &owner_signer,
                1,
                Instruction::SetPaused { paused: false },
            )],
        )
        .await;
        let outputs = run(
            &mut state,
            4,
            vec![Transaction::sign(&player_signer, 1, Instruction::StartGame)],
        )
        .await;
        assert!(error_codes(&outputs).is_empty());
    });
}

#[test]
fn submitter_can_assert_verification_tiers() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut state = Memory::default();
        let (owner_signer, owner_public) = create_account_keypair(999);
        set_owner(&owner_public);
        let (relay_signer, relay_public) = create_account_keypair(50);
        let (player_signer, player_public) = create_account_keypair(1);

        run(
            &mut state,
            1,
            vec![Transaction::sign(
                &owner_signer,
                0,
                Instruction::SetAuthorizedSubmitter {
                    submitter: relay_public,
                    authorized: true,
                },
            )],
        )
        .await;
        run(
            &mut state,
            2,
            vec![Transaction::sign(
                &relay_signer,
                0,
                Instruction::SetVerification {
                    player: player_public,
                    level: VerificationLevel::Orb,
                    verified: true,
                },
            )],
        )
        .await;

        let outputs = run(
            &mut state,
            3,
            vec![Transaction::sign(&player_signer, 0, Instruction::StartGame)],
        )
        .await;
        assert!(outputs.iter().any(|output| matches!(
            output,
            Output::Event(Event::GameStarted { .. })
        )));
    });
}

#[test]
fn seeded_leaderboard_replaces_the_board() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut state = Memory::default();
        let (owner_signer, owner_public) = create_account_keypair(999);
        set_owner(&owner_public);
        let (_, alice) = create_account_keypair(1);
        let (_, bob) = create_account_keypair(2);

        let entries = vec![
            LeaderboardEntry {
                player: alice.clone(),
                score: 5_000,
                timestamp: 100,
                round: 3,
                game_mode: GameMode::Blitz,
                game_id: 1,
            },
            LeaderboardEntry {
                player: bob,
                score: 2_500,
                timestamp: 101,
                round: 2,
                game_mode: GameMode::Blitz,
                game_id: 2,
            },
        ];
        let outputs = run(
            &mut state,
            1,
            vec![Transaction::sign(
                &owner_signer,
                0,
                Instruction::SeedLeaderboard {
                    mode: GameMode::Blitz,
                    entries,
                },
            )],
        )
        .await;
        assert!(outputs.iter().any(|output| matches!(
            output,
            Output::Event(Event::LeaderboardSeeded { mode: GameMode::Blitz, count: 2 })
        )));

        let top = queries::top_scores(&state, GameMode::Blitz, 10).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].player, alice);
        assert_eq!(top[0].score, 5_000);
    });
}

#[test]
fn withdraw_fees_drains_the_pool_into_the_owner() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut state = Memory::default();
        let (owner_signer, owner_public) = create_account_keypair(999);
        set_owner(&owner_public);
        let (player_signer, player_public) = create_account_keypair(1);
        verify_account(&mut state, &player_public, VerificationLevel::Document).await;

        // Fund the player and let a purchase feed the pool.
        match state.get(&Key::Player(player_public.clone())).await.unwrap() {
            Some(Value::Player(mut player)) => {
                player.balance = 5 * UNIT;
                state
                    .insert(Key::Player(player_public), Value::Player(player))
                    .await
                    .unwrap();
            }
            other => panic!("unexpected player state: {other:?}"),
        }
        run(
            &mut state,
            1,
            vec![Transaction::sign(&player_signer, 0, Instruction::PurchaseTurns)],
        )
        .await;

        let outputs = run(
            &mut state,
            2,
            vec![Transaction::sign(&owner_signer, 0, Instruction::WithdrawFees)],
        )
        .await;
        assert!(outputs.iter().any(|output| matches!(
            output,
            Output::Event(Event::FeesWithdrawn { to, amount })
                if to == &owner_public && *amount == UNIT / 2
        )));

        match state.get(&Key::Player(owner_public)).await.unwrap() {
            Some(Value::Player(owner)) => assert_eq!(owner.balance, UNIT / 2),
            other => panic!("unexpected owner state: {other:?}"),
        }
        let stats = queries::contract_stats(&state).await.unwrap();
        assert_eq!(stats.fee_pool, 0);
    });
}
