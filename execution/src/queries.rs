//! Read-only query surface over stored economy state.
//!
//! Queries never mutate: lazy windows (quota reset, claim cooldown) are
//! evaluated against the supplied `now` without writing the reset back. All
//! list-returning queries are capped per call to bound cost.

use commonware_cryptography::ed25519::PublicKey;
use reflex_types::economy::{
    DailyClaimStatus, EconomyState, GameMode, LeaderboardEntry, LedgerState, MultiplierTable,
    Player, PlayerStats, PricingConfig, TurnAvailability, VerificationLevel, MAX_BATCH_STATS,
    MAX_QUERY_LIMIT,
};
use reflex_types::execution::{Key, Value};

use crate::state::State;

/// Error during economy queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Requested more items than a single call may return.
    QueryTooLarge { requested: usize, max: usize },
    /// State access error.
    StateError(String),
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QueryTooLarge { requested, max } => {
                write!(f, "query too large (requested {requested}, max {max})")
            }
            Self::StateError(msg) => write!(f, "state error: {msg}"),
        }
    }
}

impl std::error::Error for QueryError {}

fn state_err(err: anyhow::Error) -> QueryError {
    QueryError::StateError(err.to_string())
}

/// Per-player summary exposed to clients.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerSummary {
    pub player: PublicKey,
    pub balance: u128,
    pub verification_level: VerificationLevel,
    pub is_verified: bool,
    pub stats: PlayerStats,
    pub daily_streak: u32,
    pub has_migrated: bool,
}

impl PlayerSummary {
    fn from_player(public: &PublicKey, player: &Player) -> Self {
        Self {
            player: public.clone(),
            balance: player.balance,
            verification_level: player.verification.level,
            is_verified: player.verification.is_verified,
            stats: player.stats,
            daily_streak: player.daily.streak,
            has_migrated: player.has_migrated,
        }
    }
}

/// Global economy counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContractStats {
    pub total_supply: u128,
    pub max_supply: u128,
    pub fee_pool: u128,
    pub games_started: u64,
    pub paused: bool,
}

async fn load_player<S: State>(state: &S, public: &PublicKey) -> Result<Player, QueryError> {
    Ok(
        match state
            .get(&Key::Player(public.clone()))
            .await
            .map_err(state_err)?
        {
            Some(Value::Player(player)) => player,
            _ => Player::default(),
        },
    )
}

async fn load_economy<S: State>(state: &S) -> Result<EconomyState, QueryError> {
    Ok(match state.get(&Key::Economy).await.map_err(state_err)? {
        Some(Value::Economy(economy)) => economy,
        _ => EconomyState::default(),
    })
}

async fn load_ledger<S: State>(state: &S) -> Result<LedgerState, QueryError> {
    Ok(match state.get(&Key::Ledger).await.map_err(state_err)? {
        Some(Value::Ledger(ledger)) => ledger,
        _ => LedgerState::default(),
    })
}

/// Turns the player could start at `now`, including a pending lazy reset.
pub async fn available_turns<S: State>(
    state: &S,
    player: &PublicKey,
    now: u64,
) -> Result<TurnAvailability, QueryError> {
    let economy = load_economy(state).await?;
    let player = load_player(state, player).await?;
    Ok(player
        .quota
        .available(now, economy.pricing.free_turns_per_day))
}

/// The top `n` entries of a mode's leaderboard.
pub async fn top_scores<S: State>(
    state: &S,
    mode: GameMode,
    n: usize,
) -> Result<Vec<LeaderboardEntry>, QueryError> {
    if n > MAX_QUERY_LIMIT {
        return Err(QueryError::QueryTooLarge {
            requested: n,
            max: MAX_QUERY_LIMIT,
        });
    }
    let board = match state
        .get(&Key::Leaderboard(mode))
        .await
        .map_err(state_err)?
    {
        Some(Value::Leaderboard(board)) => board,
        _ => return Ok(Vec::new()),
    };
    Ok(board.top(n).to_vec())
}

/// A page of a mode's leaderboard, `limit` capped per call.
pub async fn leaderboard_page<S: State>(
    state: &S,
    mode: GameMode,
    offset: usize,
    limit: usize,
) -> Result<Vec<LeaderboardEntry>, QueryError> {
    if limit > MAX_QUERY_LIMIT {
        return Err(QueryError::QueryTooLarge {
            requested: limit,
            max: MAX_QUERY_LIMIT,
        });
    }
    let board = match state
        .get(&Key::Leaderboard(mode))
        .await
        .map_err(state_err)?
    {
        Some(Value::Leaderboard(board)) => board,
        _ => return Ok(Vec::new()),
    };
    Ok(board.page(offset, limit).to_vec())
}

/// 1-based rank of a player within a mode, or 0 when absent.
pub async fn player_rank<S: State>(
    state: &S,
    player: &PublicKey,
    mode: GameMode,
) -> Result<u32, QueryError> {
    let board = match state
        .get(&Key::Leaderboard(mode))
        .await
        .map_err(state_err)?
    {
        Some(Value::Leaderboard(board)) => board,
        _ => return Ok(0),
    };
    Ok(board
        .position_of(player)
        .map_or(0, |pos| pos.saturating_add(1) as u32))
}

pub async fn player_stats<S: State>(
    state: &S,
    player: &PublicKey,
) -> Result<PlayerSummary, QueryError> {
    let record = load_player(state, player).await?;
    Ok(PlayerSummary::from_player(player, &record))
}

/// Daily claim preview for `now`: claimability, streak, and next reward.
pub async fn daily_claim_status<S: State>(
    state: &S,
    player: &PublicKey,
    now: u64,
) -> Result<DailyClaimStatus, QueryError> {
    let player = load_player(state, player).await?;
    Ok(player.daily.status(now))
}

pub async fn current_pricing<S: State>(state: &S) -> Result<PricingConfig, QueryError> {
    Ok(load_economy(state).await?.pricing)
}

pub async fn verification_multipliers<S: State>(
    state: &S,
) -> Result<MultiplierTable, QueryError> {
    Ok(load_economy(state).await?.multipliers)
}

pub async fn contract_stats<S: State>(state: &S) -> Result<ContractStats, QueryError> {
    let economy = load_economy(state).await?;
    let ledger = load_ledger(state).await?;
    Ok(ContractStats {
        total_supply: ledger.total_supply,
        max_supply: ledger.max_supply,
        fee_pool: ledger.fee_pool,
        games_started: economy.game_counter,
        paused: economy.paused,
    })
}

/// Summaries for a bounded batch of players.
pub async fn batch_player_stats<S: State>(
    state: &S,
    players: &[PublicKey],
) -> Result<Vec<PlayerSummary>, QueryError> {
    if players.len() > MAX_BATCH_STATS {
        return Err(QueryError::QueryTooLarge {
            requested: players.len(),
            max: MAX_BATCH_STATS,
        });
    }
    let mut summaries = Vec::with_capacity(players.len());
    for player in players {
        summaries.push(player_stats(state, player).await?);
    }
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::create_account_keypair;
    use crate::state::Memory;
    use commonware_runtime::deterministic::Runner;
    use commonware_runtime::Runner as _;
    use reflex_types::economy::{Leaderboard, TURN_RESET_PERIOD_SECS};

    async fn seed_board(state: &mut Memory, count: usize) {
        let mut board = Leaderboard::new();
        for i in 0..count {
            let (_, public) = create_account_keypair(100 + i as u64);
            board.record(LeaderboardEntry {
                player: public,
                score: 1_000 - i as u64,
                timestamp: i as u64,
                round: 1,
                game_mode: GameMode::Classic,
                game_id: i as u64,
            });
        }
        state
            .insert(Key::Leaderboard(GameMode::Classic), Value::Leaderboard(board))
            .await
            .unwrap();
    }

    #[test]
    fn list_queries_reject_oversized_limits() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let state = Memory::default();

            assert_eq!(
                top_scores(&state, GameMode::Classic, MAX_QUERY_LIMIT + 1).await,
                Err(QueryError::QueryTooLarge {
                    requested: MAX_QUERY_LIMIT + 1,
                    max: MAX_QUERY_LIMIT,
                })
            );
            assert_eq!(
                leaderboard_page(&state, GameMode::Classic, 0, MAX_QUERY_LIMIT + 1).await,
                Err(QueryError::QueryTooLarge {
                    requested: MAX_QUERY_LIMIT + 1,
                    max: MAX_QUERY_LIMIT,
                })
            );

            let players: Vec<_> = (0..MAX_BATCH_STATS as u64 + 1)
                .map(|seed| create_account_keypair(seed).1)
                .collect();
            assert_eq!(
                batch_player_stats(&state, &players).await,
                Err(QueryError::QueryTooLarge {
                    requested: MAX_BATCH_STATS + 1,
                    max: MAX_BATCH_STATS,
                })
            );
        });
    }

    #[test]
    fn list_queries_serve_exactly_the_cap() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut state = Memory::default();
            seed_board(&mut state, 3).await;

            let top = top_scores(&state, GameMode::Classic, MAX_QUERY_LIMIT)
                .await
                .unwrap();
            assert_eq!(top.len(), 3);
            assert_eq!(top[0].score, 1_000);

            let page = leaderboard_page(&state, GameMode::Classic, 1, MAX_QUERY_LIMIT)
                .await
                .unwrap();
            assert_eq!(page.len(), 2);
            assert_eq!(page[0].score, 999);

            let players: Vec<_> = (0..MAX_BATCH_STATS as u64)
                .map(|seed| create_account_keypair(seed).1)
                .collect();
            let summaries = batch_player_stats(&state, &players).await.unwrap();
            assert_eq!(summaries.len(), MAX_BATCH_STATS);
        });
    }

    #[test]
    fn available_turns_sees_a_pending_lazy_reset() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut state = Memory::default();
            let (_, public) = create_account_keypair(1);

            // Fresh players get the full free allotment.
            assert_eq!(
                available_turns(&state, &public, 0).await.unwrap(),
                TurnAvailability::Count(3)
            );

            let mut player = Player::default();
            player.quota.last_reset_ts = 1_000;
            player.quota.turns_used_today = 3;
            state
                .insert(Key::Player(public.clone()), Value::Player(player))
                .await
                .unwrap();

            // Exhausted within the window, replenished once it elapses. The
            // query itself writes nothing back.
            assert_eq!(
                available_turns(&state, &public, 1_500).await.unwrap(),
                TurnAvailability::Count(0)
            );
            assert_eq!(
                available_turns(&state, &public, 1_000 + TURN_RESET_PERIOD_SECS)
                    .await
                    .unwrap(),
                TurnAvailability::Count(3)
            );
            match state.get(&Key::Player(public)).await.unwrap() {
                Some(Value::Player(player)) => {
                    assert_eq!(player.quota.turns_used_today, 3);
                    assert_eq!(player.quota.last_reset_ts, 1_000);
                }
                other => panic!("unexpected player state: {other:?}"),
            }
        });
    }
}
