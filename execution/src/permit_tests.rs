//! Relay score submission under signed permits: authorization, signature and
//! session binding, deadlines, and permanent nonce consumption.

use crate::mocks::{create_account_keypair, set_owner, verify_account};
use crate::state::{Memory, State};
use crate::{Layer, SECONDS_PER_VIEW};
use commonware_cryptography::{ed25519::PrivateKey, Signer as _};
use commonware_runtime::deterministic::Runner;
use commonware_runtime::Runner as _;
use reflex_types::economy::{
    GameMode, LedgerState, VerificationLevel, ERROR_NO_ACTIVE_SESSION, ERROR_PERMIT_EXPIRED,
    ERROR_PERMIT_INVALID, ERROR_PERMIT_USED, ERROR_SUPPLY_EXCEEDED, ERROR_UNAUTHORIZED,
    MAX_SUPPLY, UNIT,
};
use reflex_types::execution::{
    Event, Instruction, Key, Output, ScorePermit, Transaction, Value,
};

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

struct Fixture {
    state: Memory,
    relay_signer: PrivateKey,
    player_signer: PrivateKey,
}

/// A verified player with an open session (game id 1) and an authorized relay.
async fn fixture() -> Fixture {
    let mut state = Memory::default();
    let (owner_signer, owner_public) = create_account_keypair(999);
    set_owner(&owner_public);
    let (relay_signer, relay_public) = create_account_keypair(50);
    let (player_signer, player_public) = create_account_keypair(1);
    verify_account(&mut state, &player_public, VerificationLevel::Document).await;

    run(
        &mut state,
        1,
        vec![
            Transaction::sign(
                &owner_signer,
                0,
                Instruction::SetAuthorizedSubmitter {
                    submitter: relay_public,
                    authorized: true,
                },
            ),
            Transaction::sign(&player_signer, 0, Instruction::StartGame),
        ],
    )
    .await;

    Fixture {
        state,
        relay_signer,
        player_signer,
    }
}

fn permit(player_signer: &PrivateKey, nonce: u64, deadline: u64) -> ScorePermit {
    ScorePermit {
        player: player_signer.public_key(),
        score: 100,
        round: 1,
        mode: GameMode::Classic,
        session_id: 1,
        nonce,
        deadline,
    }
}

#[test]
fn relay_submits_on_the_players_behalf() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut fx = fixture().await;
        let player_public = fx.player_signer.public_key();

        let permit = permit(&fx.player_signer, 1, 1_000);
        let signature = permit.sign(&fx.player_signer);
        let outputs = run(
            &mut fx.state,
            2,
            vec![Transaction::sign(
                &fx.relay_signer,
                0,
                Instruction::SubmitScoreWithPermit {
                    permit: permit.clone(),
                    signature,
                },
            )],
        )
        .await;

        // The reward lands on the permit's player, not the relay.
        assert!(outputs.iter().any(|output| matches!(
            output,
            Output::Event(Event::ScoreSubmitted { player, reward, .. })
                if player == &player_public && *reward == 10 * UNIT
        )));
        match fx.state.get(&Key::Player(player_public.clone())).await.unwrap() {
            Some(Value::Player(player)) => {
                assert_eq!(player.balance, 10 * UNIT);
                assert!(player.active_session.is_none());
            }
            other => panic!("unexpected player state: {other:?}"),
        }

        // The nonce marker is permanent.
        assert!(fx
            .state
            .get(&Key::PermitNonce(player_public, 1))
            .await
            .unwrap()
            .is_some());
    });
}

#[test]
fn replayed_permit_is_rejected() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut fx = fixture().await;
        let player_public = fx.player_signer.public_key();

        let permit = permit(&fx.player_signer, 7, 1_000);
        let signature = permit.sign(&fx.player_signer);
        run(
            &mut fx.state,
            2,
            vec![Transaction::sign(
                &fx.relay_signer,
                0,
                Instruction::SubmitScoreWithPermit {
                    permit: permit.clone(),
                    signature: signature.clone(),
                },
            )],
        )
        .await;

        // Reopen a session so only the nonce check can fail.
        run(
            &mut fx.state,
            3,
            vec![Transaction::sign(&fx.player_signer, 1, Instruction::StartGame)],
        )
        .await;

        let outputs = run(
            &mut fx.state,
            4,
            vec![Transaction::sign(
                &fx.relay_signer,
                1,
                Instruction::SubmitScoreWithPermit { permit, signature },
            )],
        )
        .await;
        assert_eq!(error_codes(&outputs), vec![ERROR_PERMIT_USED]);

        match fx.state.get(&Key::Player(player_public)).await.unwrap() {
            Some(Value::Player(player)) => assert_eq!(player.balance, 10 * UNIT),
            other => panic!("unexpected player state: {other:?}"),
        }
    });
}

#[test]
fn expired_permit_is_rejected() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut fx = fixture().await;

        let deadline = 10 * SECONDS_PER_VIEW;
        let permit = permit(&fx.player_signer, 1, deadline);
        let signature = permit.sign(&fx.player_signer);

        // At the deadline the permit is still good; past it, rejected.
        let outputs = run(
            &mut fx.state,
            11,
            vec![Transaction::sign(
                &fx.relay_signer,
                0,
                Instruction::SubmitScoreWithPermit { permit, signature },
            )],
        )
        .await;
        assert_eq!(error_codes(&outputs), vec![ERROR_PERMIT_EXPIRED]);
    });
}

#[test]
fn deadline_boundary_is_inclusive() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut fx = fixture().await;

        let deadline = 10 * SECONDS_PER_VIEW;
        let permit = permit(&fx.player_signer, 1, deadline);
        let signature = permit.sign(&fx.player_signer);

        let outputs = run(
            &mut fx.state,
            10,
            vec![Transaction::sign(
                &fx.relay_signer,
                0,
                Instruction::SubmitScoreWithPermit { permit, signature },
            )],
        )
        .await;
        assert!(error_codes(&outputs).is_empty());
    });
}

#[test]
fn rejected_settlement_leaves_the_permit_unconsumed() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut fx = fixture().await;
        let player_public = fx.player_signer.public_key();

        // No mint headroom, so settlement must reject.
        fx.state
            .insert(
                Key::Ledger,
                Value::Ledger(LedgerState {
                    total_supply: MAX_SUPPLY,
                    ..LedgerState::default()
                }),
            )
            .await
            .unwrap();

        let permit = permit(&fx.player_signer, 1, 1_000);
        let signature = permit.sign(&fx.player_signer);
        let outputs = run(
            &mut fx.state,
            2,
            vec![Transaction::sign(
                &fx.relay_signer,
                0,
                Instruction::SubmitScoreWithPermit {
                    permit: permit.clone(),
                    signature: signature.clone(),
                },
            )],
        )
        .await;
        assert_eq!(error_codes(&outputs), vec![ERROR_SUPPLY_EXCEEDED]);

        // The nonce is not burned and the session stays open.
        assert!(fx
            .state
            .get(&Key::PermitNonce(player_public.clone(), 1))
            .await
            .unwrap()
            .is_none());
        match fx.state.get(&Key::Player(player_public.clone())).await.unwrap() {
            Some(Value::Player(player)) => assert_eq!(player.active_session, Some(1)),
            other => panic!("unexpected player state: {other:?}"),
        }

        // With headroom restored, the very same permit settles.
        fx.state
            .insert(Key::Ledger, Value::Ledger(LedgerState::default()))
            .await
            .unwrap();
        let outputs = run(
            &mut fx.state,
            3,
            vec![Transaction::sign(
                &fx.relay_signer,
                1,
                Instruction::SubmitScoreWithPermit { permit, signature },
            )],
        )
        .await;
        assert!(error_codes(&outputs).is_empty());
        assert!(fx
            .state
            .get(&Key::PermitNonce(player_public, 1))
            .await
            .unwrap()
            .is_some());
    });
}

#[test]
fn unauthorized_sender_is_rejected() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut fx = fixture().await;
        let (outsider_signer, _) = create_account_keypair(77);

        let permit = permit(&fx.player_signer, 1, 1_000);
        let signature = permit.sign(&fx.player_signer);
        let outputs = run(
            &mut fx.state,
            2,
            vec![Transaction::sign(
                &outsider_signer,
                0,
                Instruction::SubmitScoreWithPermit { permit, signature },
            )],
        )
        .await;
        assert_eq!(error_codes(&outputs), vec![ERROR_UNAUTHORIZED]);
    });
}

#[test]
fn forged_or_mismatched_permits_are_rejected() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut fx = fixture().await;
        let (stranger_signer, _) = create_account_keypair(88);

        // Signature from the wrong key.
        let forged = permit(&fx.player_signer, 1, 1_000);
        let bad_signature = forged.sign(&stranger_signer);
        let outputs = run(
            &mut fx.state,
            2,
            vec![Transaction::sign(
                &fx.relay_signer,
                0,
                Instruction::SubmitScoreWithPermit {
                    permit: forged,
                    signature: bad_signature,
                },
            )],
        )
        .await;
        assert_eq!(error_codes(&outputs), vec![ERROR_PERMIT_INVALID]);

        // Valid signature but bound to a different session.
        let mut mismatched = permit(&fx.player_signer, 2, 1_000);
        mismatched.session_id = 99;
        let signature = mismatched.sign(&fx.player_signer);
        let outputs = run(
            &mut fx.state,
            3,
            vec![Transaction::sign(
                &fx.relay_signer,
                1,
                Instruction::SubmitScoreWithPermit {
                    permit: mismatched,
                    signature,
                },
            )],
        )
        .await;
        assert_eq!(error_codes(&outputs), vec![ERROR_PERMIT_INVALID]);
    });
}

#[test]
fn permit_without_open_session_is_rejected() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut state = Memory::default();
        let (owner_signer, owner_public) = create_account_keypair(999);
        set_owner(&owner_public);
        let (relay_signer, relay_public) = create_account_keypair(50);
        let (player_signer, player_public) = create_account_keypair(1);
        verify_account(&mut state, &player_public, VerificationLevel::Document).await;
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

        let permit = permit(&player_signer, 1, 1_000);
        let signature = permit.sign(&player_signer);
        let outputs = run(
            &mut state,
            2,
            vec![Transaction::sign(
                &relay_signer,
                0,
                Instruction::SubmitScoreWithPermit { permit, signature },
            )],
        )
        .await;
        assert_eq!(error_codes(&outputs), vec![ERROR_NO_ACTIVE_SESSION]);
    });
}
