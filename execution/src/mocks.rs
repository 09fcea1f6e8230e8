//! Test fixtures: deterministic keypairs, pre-verified accounts, and a
//! disposable state database.

use crate::state::State;
use crate::Adb;
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    Signer,
};
use commonware_math::algebra::Random;
use commonware_runtime::{buffer::PoolRef, Clock, Metrics, Spawner, Storage};
use commonware_storage::{qmdb::any::VariableConfig, translator::EightCap};
use commonware_utils::{hex, NZUsize, NZU64};
use rand::{rngs::StdRng, SeedableRng};
use reflex_types::economy::{Player, PlayerVerification, VerificationLevel};
use reflex_types::execution::{Key, Value};

/// Creates an account keypair for Ed25519 signatures used by players
pub fn create_account_keypair(seed: u64) -> (PrivateKey, PublicKey) {
    let mut rng = StdRng::seed_from_u64(seed);
    let private = PrivateKey::random(&mut rng);
    let public = private.public_key();
    (private, public)
}

/// Marks `public` as the owner for privileged instructions.
pub fn set_owner(public: &PublicKey) {
    std::env::set_var(crate::OWNER_PUBLIC_KEY_ENV, hex(public.as_ref()));
}

/// Stores a player record verified at `level` so play gating passes.
pub async fn verify_account<S: State>(state: &mut S, public: &PublicKey, level: VerificationLevel) {
    let player = Player {
        verification: PlayerVerification {
            level,
            is_verified: true,
        },
        ..Player::default()
    };
    state
        .insert(Key::Player(public.clone()), Value::Player(player))
        .await
        .expect("insert player");
}

/// Creates a state database for testing
pub async fn create_state_db<E: Spawner + Metrics + Storage + Clock>(
    context: &E,
) -> Adb<E, EightCap> {
    let buffer_pool = PoolRef::new(NZUsize!(1024), NZUsize!(1024));

    Adb::init(
        context.with_label("state"),
        VariableConfig {
            mmr_journal_partition: String::from("state-mmr-journal"),
            mmr_metadata_partition: String::from("state-mmr-metadata"),
            mmr_items_per_blob: NZU64!(1024),
            mmr_write_buffer: NZUsize!(1024),
            log_partition: String::from("state-log-journal"),
            log_items_per_blob: NZU64!(1024),
            log_write_buffer: NZUsize!(1024),
            log_compression: None,
            log_codec_config: (),
            translator: EightCap,
            thread_pool: None,
            buffer_pool,
        },
    )
    .await
    .expect("Failed to initialize state ADB")
}
