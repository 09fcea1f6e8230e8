use anyhow::{Context as _, Result};
use commonware_cryptography::ed25519::PublicKey;
use reflex_types::{
    economy::{EconomyState, GameMode, Leaderboard, LedgerState, Player},
    execution::{Event, Instruction, Key, Output, Transaction, Value},
};
use std::collections::BTreeMap;
use tracing::debug;

use crate::state::{load_account, validate_and_increment_nonce, PrepareError, State, Status};

mod handlers;

pub use handlers::OWNER_PUBLIC_KEY_ENV;

/// Seconds of wall time represented by one view of the execution environment.
pub const SECONDS_PER_VIEW: u64 = 3;

/// Buffered execution overlay: all reads see pending writes, and nothing
/// touches the backing state until [`Layer::commit`].
pub struct Layer<'a, S: State> {
    state: &'a S,
    pending: BTreeMap<Key, Status>,

    view: u64,
    /// Guards the migration pull against re-entry through its external debits.
    migration_in_flight: bool,
}

impl<'a, S: State> Layer<'a, S> {
    pub fn new(state: &'a S, view: u64) -> Self {
        Self {
            state,
            pending: BTreeMap::new(),

            view,
            migration_in_flight: false,
        }
    }

    fn insert(&mut self, key: Key, value: Value) {
        self.pending.insert(key, Status::Update(value));
    }

    fn remove(&mut self, key: Key) {
        self.pending.insert(key, Status::Delete);
    }

    pub fn view(&self) -> u64 {
        self.view
    }

    /// Coarse execution-environment clock. All window logic (quota reset,
    /// claim cooldown, permit deadlines) is keyed on this, never wall time.
    pub(crate) fn now_secs(&self) -> u64 {
        self.view.saturating_mul(SECONDS_PER_VIEW)
    }

    async fn prepare(&mut self, transaction: &Transaction) -> Result<(), PrepareError> {
        let mut account = load_account(self, &transaction.public)
            .await
            .map_err(PrepareError::State)?;
        validate_and_increment_nonce(&mut account, transaction.nonce)?;
        self.insert(
            Key::Account(transaction.public.clone()),
            Value::Account(account),
        );

        Ok(())
    }

    async fn apply(&mut self, transaction: &Transaction) -> Result<Vec<Event>> {
        let public = &transaction.public;

        match &transaction.instruction {
            Instruction::StartGame => self.handle_start_game(public).await,
            Instruction::SubmitScore { score, round, mode } => {
                self.handle_submit_score(public, *score, *round, *mode).await
            }
            Instruction::SubmitScoreWithPermit { permit, signature } => {
                self.handle_submit_score_with_permit(public, permit, signature)
                    .await
            }
            Instruction::PurchaseTurns => self.handle_purchase_turns(public).await,
            Instruction::PurchaseWeeklyPass => self.handle_purchase_weekly_pass(public).await,
            Instruction::ClaimDailyReward => self.handle_claim_daily_reward(public).await,
            Instruction::MigrateTokens => self.handle_migrate_tokens(public).await,

            Instruction::SetVerification {
                player,
                level,
                verified,
            } => {
                self.handle_set_verification(public, player, *level, *verified)
                    .await
            }
            Instruction::SetAuthorizedSubmitter {
                submitter,
                authorized,
            } => {
                self.handle_set_authorized_submitter(public, submitter, *authorized)
                    .await
            }
            Instruction::UpdatePricing {
                tokens_per_point,
                turn_cost,
                weekly_pass_cost,
            } => {
                self.handle_update_pricing(public, *tokens_per_point, *turn_cost, *weekly_pass_cost)
                    .await
            }
            Instruction::UpdateMultipliers {
                orb_plus,
                orb,
                secure_document,
                document,
            } => {
                self.handle_update_multipliers(
                    public,
                    *orb_plus,
                    *orb,
                    *secure_document,
                    *document,
                )
                .await
            }
            Instruction::SetPaused { paused } => self.handle_set_paused(public, *paused).await,
            Instruction::SeedLeaderboard { mode, entries } => {
                self.handle_seed_leaderboard(public, *mode, entries).await
            }
            Instruction::WithdrawFees => self.handle_withdraw_fees(public).await,
            Instruction::SeedLegacyBalance {
                source,
                player,
                amount,
            } => {
                self.handle_seed_legacy_balance(public, *source, player, *amount)
                    .await
            }
        }
    }

    async fn get_or_init_player(&mut self, public: &PublicKey) -> Result<Player> {
        Ok(match self.get(&Key::Player(public.clone())).await? {
            Some(Value::Player(player)) => player,
            _ => Player::default(),
        })
    }

    async fn get_or_init_economy(&mut self) -> Result<EconomyState> {
        Ok(match self.get(&Key::Economy).await? {
            Some(Value::Economy(economy)) => economy,
            _ => EconomyState::default(),
        })
    }

    async fn get_or_init_ledger(&mut self) -> Result<LedgerState> {
        Ok(match self.get(&Key::Ledger).await? {
            Some(Value::Ledger(ledger)) => ledger,
            _ => LedgerState::default(),
        })
    }

    async fn get_or_init_leaderboard(&mut self, mode: GameMode) -> Result<Leaderboard> {
        Ok(match self.get(&Key::Leaderboard(mode)).await? {
            Some(Value::Leaderboard(board)) => board,
            _ => Leaderboard::new(),
        })
    }

    pub async fn execute(
        &mut self,
        transactions: Vec<Transaction>,
    ) -> Result<(Vec<Output>, BTreeMap<PublicKey, u64>)> {
        let mut processed_nonces = BTreeMap::new();
        let mut outputs = Vec::new();

        for tx in transactions {
            match self.prepare(&tx).await {
                Ok(()) => {}
                Err(PrepareError::NonceMismatch { expected, got }) => {
                    debug!(
                        public = ?tx.public,
                        expected,
                        got,
                        "nonce mismatch; dropping transaction"
                    );
                    continue;
                }
                Err(PrepareError::State(err)) => {
                    return Err(err).context("state error during prepare");
                }
            }
            processed_nonces.insert(tx.public.clone(), tx.nonce.saturating_add(1));
            outputs.extend(self.apply(&tx).await?.into_iter().map(Output::Event));
            outputs.push(Output::Transaction(tx));
        }

        Ok((outputs, processed_nonces))
    }

    pub fn commit(self) -> Vec<(Key, Status)> {
        self.pending.into_iter().collect()
    }
}

impl<'a, S: State> State for Layer<'a, S> {
    async fn get(&self, key: &Key) -> Result<Option<Value>> {
        Ok(match self.pending.get(key) {
            Some(Status::Update(value)) => Some(value.clone()),
            Some(Status::Delete) => None,
            None => self.state.get(key).await?,
        })
    }

    async fn insert(&mut self, key: Key, value: Value) -> Result<()> {
        self.pending.insert(key, Status::Update(value));
        Ok(())
    }

    async fn delete(&mut self, key: &Key) -> Result<()> {
        self.pending.insert(key.clone(), Status::Delete);
        Ok(())
    }
}
