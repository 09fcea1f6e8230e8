use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use super::{
    GameMode, VerificationLevel, BASE_DAILY_REWARD, DAILY_CLAIM_COOLDOWN_SECS, MAX_DAILY_STREAK,
    STREAK_BONUS_PER_DAY, STREAK_WINDOW_SECS, TURN_RESET_PERIOD_SECS, WEEKLY_PASS_DURATION_SECS,
};

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum PlayerInvariantError {
    #[error("daily streak out of range (got={got}, max={max})")]
    StreakOutOfRange { got: u32, max: u32 },
}

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum QuotaError {
    #[error("no turns available")]
    NoTurnsAvailable,
}

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum ClaimError {
    #[error("daily claim cooldown not met ({remaining_secs}s remaining)")]
    CooldownNotMet { remaining_secs: u64 },
}

/// Turns a player may start right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnAvailability {
    /// Weekly pass active; the quota check is bypassed entirely.
    Unlimited,
    Count(u64),
}

impl TurnAvailability {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, TurnAvailability::Count(0))
    }
}

/// Read-only view of the daily claim state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyClaimStatus {
    pub can_claim: bool,
    pub current_streak: u32,
    /// Streak the next successful claim would record.
    pub next_streak: u32,
    /// Reward the next successful claim would mint.
    pub next_reward: u128,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PlayerVerification {
    pub level: VerificationLevel,
    pub is_verified: bool,
}

/// Daily turn budget. All reset logic is lazy: a window that has elapsed is
/// observed as reset on read and applied on the next consuming call, so no
/// background timer exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PlayerQuota {
    pub last_reset_ts: u64,
    pub turns_used_today: u32,
    pub extra_goes: u32,
    pub weekly_pass_expiry: u64,
}

impl PlayerQuota {
    fn reset_due(&self, now: u64) -> bool {
        now.saturating_sub(self.last_reset_ts) >= TURN_RESET_PERIOD_SECS
    }

    pub fn pass_active(&self, now: u64) -> bool {
        self.weekly_pass_expiry > now
    }

    /// Turns available at `now`, without mutating anything.
    pub fn available(&self, now: u64, free_per_day: u32) -> TurnAvailability {
        if self.pass_active(now) {
            return TurnAvailability::Unlimited;
        }
        let used = if self.reset_due(now) {
            0
        } else {
            self.turns_used_today
        };
        let free_left = free_per_day.saturating_sub(used) as u64;
        TurnAvailability::Count(free_left.saturating_add(self.extra_goes as u64))
    }

    /// Consume one turn: free allotment first, then extra goes. An active
    /// pass bypasses consumption and leaves all counters untouched.
    pub fn consume(&mut self, now: u64, free_per_day: u32) -> Result<(), QuotaError> {
        if self.pass_active(now) {
            return Ok(());
        }
        if self.reset_due(now) {
            self.turns_used_today = 0;
            self.last_reset_ts = now;
        }
        if self.turns_used_today < free_per_day {
            self.turns_used_today += 1;
            Ok(())
        } else if self.extra_goes > 0 {
            self.extra_goes -= 1;
            Ok(())
        } else {
            Err(QuotaError::NoTurnsAvailable)
        }
    }

    pub fn grant_extra(&mut self, batch: u32) {
        self.extra_goes = self.extra_goes.saturating_add(batch);
    }

    /// Extend the pass by a week from `max(now, current expiry)` so stacked
    /// purchases never lose time.
    pub fn extend_pass(&mut self, now: u64) {
        self.weekly_pass_expiry = self
            .weekly_pass_expiry
            .max(now)
            .saturating_add(WEEKLY_PASS_DURATION_SECS);
    }
}

/// Daily login bonus state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PlayerDaily {
    pub last_claim_ts: u64,
    pub streak: u32,
}

impl PlayerDaily {
    pub fn can_claim(&self, now: u64) -> bool {
        self.last_claim_ts == 0
            || now.saturating_sub(self.last_claim_ts) >= DAILY_CLAIM_COOLDOWN_SECS
    }

    /// Streak the next successful claim would record: +1 within the 48h
    /// window (capped), reset to 1 otherwise.
    pub fn next_streak(&self, now: u64) -> u32 {
        if self.last_claim_ts != 0
            && now.saturating_sub(self.last_claim_ts) < STREAK_WINDOW_SECS
        {
            self.streak.saturating_add(1).min(MAX_DAILY_STREAK)
        } else {
            1
        }
    }

    pub fn reward_for_streak(streak: u32) -> u128 {
        let bonus_days = streak.saturating_sub(1).min(MAX_DAILY_STREAK - 1) as u128;
        BASE_DAILY_REWARD.saturating_add(STREAK_BONUS_PER_DAY.saturating_mul(bonus_days))
    }

    pub fn status(&self, now: u64) -> DailyClaimStatus {
        let next_streak = self.next_streak(now);
        DailyClaimStatus {
            can_claim: self.can_claim(now),
            current_streak: self.streak,
            next_streak,
            next_reward: Self::reward_for_streak(next_streak),
        }
    }

    /// Apply a claim at `now`, returning the reward to mint.
    pub fn claim(&mut self, now: u64) -> Result<u128, ClaimError> {
        if !self.can_claim(now) {
            let remaining_secs = self
                .last_claim_ts
                .saturating_add(DAILY_CLAIM_COOLDOWN_SECS)
                .saturating_sub(now);
            return Err(ClaimError::CooldownNotMet { remaining_secs });
        }
        self.streak = self.next_streak(now);
        self.last_claim_ts = now;
        Ok(Self::reward_for_streak(self.streak))
    }
}

/// Lifetime play statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PlayerStats {
    pub high_scores: [u64; GameMode::COUNT],
    pub total_games: u64,
    pub total_points: u64,
}

impl PlayerStats {
    pub fn high_score(&self, mode: GameMode) -> u64 {
        self.high_scores[mode as usize]
    }

    /// Record a completed game, returning true when a new high score was set.
    pub fn record_game(&mut self, mode: GameMode, score: u64) -> bool {
        self.total_games = self.total_games.saturating_add(1);
        self.total_points = self.total_points.saturating_add(score);
        let slot = &mut self.high_scores[mode as usize];
        if score > *slot {
            *slot = score;
            true
        } else {
            false
        }
    }
}

/// Per-player ledger record. Created lazily with zero defaults on first
/// interaction; never deleted.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Player {
    pub balance: u128,
    pub verification: PlayerVerification,
    pub quota: PlayerQuota,
    pub daily: PlayerDaily,
    pub stats: PlayerStats,
    /// Game id of the session between start and score submission.
    pub active_session: Option<u64>,
    /// Write-once-true migration marker.
    pub has_migrated: bool,
}

impl Player {
    pub fn validate_invariants(&self) -> Result<(), PlayerInvariantError> {
        if self.daily.streak > MAX_DAILY_STREAK {
            return Err(PlayerInvariantError::StreakOutOfRange {
                got: self.daily.streak,
                max: MAX_DAILY_STREAK,
            });
        }
        Ok(())
    }
}

impl Write for Player {
    fn write(&self, writer: &mut impl BufMut) {
        self.balance.write(writer);
        self.verification.level.write(writer);
        self.verification.is_verified.write(writer);
        self.quota.last_reset_ts.write(writer);
        self.quota.turns_used_today.write(writer);
        self.quota.extra_goes.write(writer);
        self.quota.weekly_pass_expiry.write(writer);
        self.daily.last_claim_ts.write(writer);
        self.daily.streak.write(writer);
        for high_score in &self.stats.high_scores {
            high_score.write(writer);
        }
        self.stats.total_games.write(writer);
        self.stats.total_points.write(writer);
        self.active_session.write(writer);
        self.has_migrated.write(writer);
    }
}

impl Read for Player {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let balance = u128::read(reader)?;
        let level = VerificationLevel::read(reader)?;
        let is_verified = bool::read(reader)?;
        let last_reset_ts = u64::read(reader)?;
        let turns_used_today = u32::read(reader)?;
        let extra_goes = u32::read(reader)?;
        let weekly_pass_expiry = u64::read(reader)?;
        let last_claim_ts = u64::read(reader)?;
        let streak = u32::read(reader)?;
        let mut high_scores = [0u64; GameMode::COUNT];
        for high_score in &mut high_scores {
            *high_score = u64::read(reader)?;
        }
        let total_games = u64::read(reader)?;
        let total_points = u64::read(reader)?;
        let active_session = Option::<u64>::read(reader)?;
        let has_migrated = bool::read(reader)?;

        let player = Self {
            balance,
            verification: PlayerVerification { level, is_verified },
            quota: PlayerQuota {
                last_reset_ts,
                turns_used_today,
                extra_goes,
                weekly_pass_expiry,
            },
            daily: PlayerDaily {
                last_claim_ts,
                streak,
            },
            stats: PlayerStats {
                high_scores,
                total_games,
                total_points,
            },
            active_session,
            has_migrated,
        };
        if player.validate_invariants().is_err() {
            return Err(Error::Invalid("Player", "streak out of range"));
        }
        Ok(player)
    }
}

impl EncodeSize for Player {
    fn encode_size(&self) -> usize {
        self.balance.encode_size()
            + self.verification.level.encode_size()
            + self.verification.is_verified.encode_size()
            + self.quota.last_reset_ts.encode_size()
            + self.quota.turns_used_today.encode_size()
            + self.quota.extra_goes.encode_size()
            + self.quota.weekly_pass_expiry.encode_size()
            + self.daily.last_claim_ts.encode_size()
            + self.daily.streak.encode_size()
            + self
                .stats
                .high_scores
                .iter()
                .map(|high_score| high_score.encode_size())
                .sum::<usize>()
            + self.stats.total_games.encode_size()
            + self.stats.total_points.encode_size()
            + self.active_session.encode_size()
            + self.has_migrated.encode_size()
    }
}
