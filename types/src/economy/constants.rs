/// Fixed-point scale for token amounts (18 fractional decimal digits).
pub const UNIT: u128 = 1_000_000_000_000_000_000;

/// Hard supply ceiling: one billion whole tokens.
pub const MAX_SUPPLY: u128 = 1_000_000_000 * UNIT;

/// Turn quota window. Resets are applied lazily on the next consuming call.
pub const TURN_RESET_PERIOD_SECS: u64 = 24 * 60 * 60;

/// Extra goes granted per top-up purchase.
pub const TURN_TOPUP_BATCH: u32 = 3;

/// Weekly pass duration added per purchase.
pub const WEEKLY_PASS_DURATION_SECS: u64 = 7 * 24 * 60 * 60;

/// Minimum gap between daily claims.
pub const DAILY_CLAIM_COOLDOWN_SECS: u64 = 24 * 60 * 60;

/// A claim later than this after the previous one resets the streak.
pub const STREAK_WINDOW_SECS: u64 = 48 * 60 * 60;

/// Streak ceiling for the daily bonus.
pub const MAX_DAILY_STREAK: u32 = 30;

/// Base daily login reward.
pub const BASE_DAILY_REWARD: u128 = 100 * UNIT;

/// Additional reward per consecutive day of streak.
pub const STREAK_BONUS_PER_DAY: u128 = 10 * UNIT;

/// Entries retained per game mode.
pub const MAX_LEADERBOARD_SIZE: usize = 100;

/// Hard maximum item count per leaderboard query.
pub const MAX_QUERY_LIMIT: usize = 50;

/// Hard maximum addresses per batch stats query.
pub const MAX_BATCH_STATS: usize = 20;

// Error codes for EconomyError events.
//
// Grouped by taxonomy: validation (1x), state (2x), authorization (3x),
// supply (4x), paused (5x).

/// Score must be strictly positive.
pub const ERROR_INVALID_SCORE: u8 = 10;
/// Round must be strictly positive.
pub const ERROR_INVALID_ROUND: u8 = 11;
/// Pricing update outside the allowed bounds.
pub const ERROR_PRICING_OUT_OF_BOUNDS: u8 = 12;
/// Multiplier update violates the tier hierarchy.
pub const ERROR_HIERARCHY_VIOLATION: u8 = 13;
/// Amount must be strictly positive.
pub const ERROR_INVALID_AMOUNT: u8 = 14;

/// No free turns or extra goes remaining.
pub const ERROR_NO_TURNS: u8 = 20;
/// Daily claim attempted before the cooldown elapsed.
pub const ERROR_COOLDOWN_NOT_MET: u8 = 21;
/// Migration already completed for this player.
pub const ERROR_ALREADY_MIGRATED: u8 = 22;
/// Both predecessor balances are zero.
pub const ERROR_NOTHING_TO_MIGRATE: u8 = 23;
/// Score submitted without an active session.
pub const ERROR_NO_ACTIVE_SESSION: u8 = 24;
/// Session already active for this player.
pub const ERROR_SESSION_ACTIVE: u8 = 25;
/// Permit deadline has passed.
pub const ERROR_PERMIT_EXPIRED: u8 = 26;
/// Permit nonce already consumed.
pub const ERROR_PERMIT_USED: u8 = 27;
/// Permit signature does not verify.
pub const ERROR_PERMIT_INVALID: u8 = 28;
/// Migration re-entered while in progress.
pub const ERROR_MIGRATION_BUSY: u8 = 29;

/// Caller lacks the required privilege.
pub const ERROR_UNAUTHORIZED: u8 = 30;
/// Player does not meet the verification requirement.
pub const ERROR_VERIFICATION_REQUIRED: u8 = 31;

/// Mint would exceed the maximum supply.
pub const ERROR_SUPPLY_EXCEEDED: u8 = 40;
/// Balance insufficient for the requested debit.
pub const ERROR_INSUFFICIENT_FUNDS: u8 = 41;

/// Operation attempted while the economy is paused.
pub const ERROR_PAUSED: u8 = 50;
