use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, ReadRangeExt, Write};
use commonware_cryptography::ed25519::PublicKey;
use serde::{Deserialize, Serialize};

use super::{MultiplierTable, UNIT};

/// Most authorized submitters the economy will track.
pub const MAX_AUTHORIZED_SUBMITTERS: usize = 32;

// Owner-settable pricing bounds. Updates outside these ranges are rejected.
pub const MIN_TOKENS_PER_POINT: u128 = UNIT / 1_000;
pub const MAX_TOKENS_PER_POINT: u128 = 10 * UNIT;
pub const MIN_TURN_COST: u128 = UNIT / 100;
pub const MAX_TURN_COST: u128 = 100 * UNIT;
pub const MIN_WEEKLY_PASS_COST: u128 = UNIT / 10;
pub const MAX_WEEKLY_PASS_COST: u128 = 1_000 * UNIT;

/// Economy pricing knobs, all in fixed-point token units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Tokens minted per score point (before the tier multiplier).
    pub tokens_per_point: u128,
    /// Price of one extra-goes top-up batch.
    pub turn_cost: u128,
    /// Price of seven days of unlimited play.
    pub weekly_pass_cost: u128,
    /// Free turns replenished each quota window.
    pub free_turns_per_day: u32,
}

impl PricingConfig {
    /// The metered economy: a small free allotment with cheap top-ups.
    pub fn standard() -> Self {
        Self {
            tokens_per_point: UNIT / 10,
            turn_cost: UNIT / 2,
            weekly_pass_cost: 10 * UNIT,
            free_turns_per_day: 3,
        }
    }

    /// The flat economy: a large daily allotment with a one-unit point rate.
    pub fn flat() -> Self {
        Self {
            tokens_per_point: UNIT,
            turn_cost: UNIT,
            weekly_pass_cost: 25 * UNIT,
            free_turns_per_day: 100,
        }
    }

    /// Reward for a submitted score under a tier multiplier percentage.
    ///
    /// `floor(score * tokens_per_point * multiplier / 100)`, exact in
    /// fixed-point units. `None` when the product overflows `u128`.
    pub fn reward_for(&self, score: u64, multiplier: u16) -> Option<u128> {
        (score as u128)
            .checked_mul(self.tokens_per_point)?
            .checked_mul(multiplier as u128)
            .map(|raw| raw / 100)
    }

    pub fn in_bounds(
        tokens_per_point: u128,
        turn_cost: u128,
        weekly_pass_cost: u128,
    ) -> bool {
        (MIN_TOKENS_PER_POINT..=MAX_TOKENS_PER_POINT).contains(&tokens_per_point)
            && (MIN_TURN_COST..=MAX_TURN_COST).contains(&turn_cost)
            && (MIN_WEEKLY_PASS_COST..=MAX_WEEKLY_PASS_COST).contains(&weekly_pass_cost)
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl Write for PricingConfig {
    fn write(&self, writer: &mut impl BufMut) {
        self.tokens_per_point.write(writer);
        self.turn_cost.write(writer);
        self.weekly_pass_cost.write(writer);
        self.free_turns_per_day.write(writer);
    }
}

impl Read for PricingConfig {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            tokens_per_point: u128::read(reader)?,
            turn_cost: u128::read(reader)?,
            weekly_pass_cost: u128::read(reader)?,
            free_turns_per_day: u32::read(reader)?,
        })
    }
}

impl EncodeSize for PricingConfig {
    fn encode_size(&self) -> usize {
        self.tokens_per_point.encode_size()
            + self.turn_cost.encode_size()
            + self.weekly_pass_cost.encode_size()
            + self.free_turns_per_day.encode_size()
    }
}

/// Global mutable configuration, initialized at first use and mutated only
/// through owner-gated instructions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EconomyState {
    pub pricing: PricingConfig,
    pub multipliers: MultiplierTable,
    pub paused: bool,
    /// Sorted set of relay keys allowed to submit permits and assert
    /// verification tiers.
    pub authorized_submitters: Vec<PublicKey>,
    /// Monotonically increasing game session id.
    pub game_counter: u64,
}

impl Default for EconomyState {
    fn default() -> Self {
        Self {
            pricing: PricingConfig::standard(),
            multipliers: MultiplierTable::default(),
            paused: false,
            authorized_submitters: Vec::new(),
            game_counter: 0,
        }
    }
}

impl EconomyState {
    pub fn is_authorized_submitter(&self, public: &PublicKey) -> bool {
        self.authorized_submitters.binary_search(public).is_ok()
    }

    /// Add or remove a submitter, keeping the set sorted and deduplicated.
    pub fn set_authorized_submitter(&mut self, public: &PublicKey, authorized: bool) {
        match self.authorized_submitters.binary_search(public) {
            Ok(idx) if !authorized => {
                self.authorized_submitters.remove(idx);
            }
            Err(idx) if authorized && self.authorized_submitters.len() < MAX_AUTHORIZED_SUBMITTERS => {
                self.authorized_submitters.insert(idx, public.clone());
            }
            _ => {}
        }
    }

    pub fn next_game_id(&mut self) -> u64 {
        self.game_counter = self.game_counter.saturating_add(1);
        self.game_counter
    }
}

impl Write for EconomyState {
    fn write(&self, writer: &mut impl BufMut) {
        self.pricing.write(writer);
        self.multipliers.write(writer);
        self.paused.write(writer);
        self.authorized_submitters.write(writer);
        self.game_counter.write(writer);
    }
}

impl Read for EconomyState {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let pricing = PricingConfig::read(reader)?;
        let multipliers = MultiplierTable::read(reader)?;
        let paused = bool::read(reader)?;
        let authorized_submitters =
            Vec::<PublicKey>::read_range(reader, 0..=MAX_AUTHORIZED_SUBMITTERS)?;
        if !authorized_submitters.windows(2).all(|w| w[0] < w[1]) {
            return Err(Error::Invalid("EconomyState", "submitters not sorted"));
        }
        let game_counter = u64::read(reader)?;

        Ok(Self {
            pricing,
            multipliers,
            paused,
            authorized_submitters,
            game_counter,
        })
    }
}

impl EncodeSize for EconomyState {
    fn encode_size(&self) -> usize {
        self.pricing.encode_size()
            + self.multipliers.encode_size()
            + self.paused.encode_size()
            + self.authorized_submitters.encode_size()
            + self.game_counter.encode_size()
    }
}
