use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};
use thiserror::Error as ThisError;

use super::MAX_SUPPLY;

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum LedgerError {
    #[error("mint of {amount} would exceed max supply ({total_supply}/{max_supply})")]
    SupplyExceeded {
        amount: u128,
        total_supply: u128,
        max_supply: u128,
    },
    #[error("insufficient balance (have {balance}, need {amount})")]
    InsufficientBalance { balance: u128, amount: u128 },
}

/// Supply and fee bookkeeping for the reward token.
///
/// Balances live on the player records; this state owns the global counters
/// and is the only mutation path for them, so `total_supply <= max_supply`
/// holds after every operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerState {
    pub total_supply: u128,
    pub max_supply: u128,
    /// Purchases accumulate here until the owner withdraws them.
    pub fee_pool: u128,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            total_supply: 0,
            max_supply: MAX_SUPPLY,
            fee_pool: 0,
        }
    }
}

impl LedgerState {
    /// Credit `amount` to `balance`, growing the supply.
    pub fn mint(&mut self, balance: &mut u128, amount: u128) -> Result<(), LedgerError> {
        let total = self
            .total_supply
            .checked_add(amount)
            .filter(|total| *total <= self.max_supply)
            .ok_or(LedgerError::SupplyExceeded {
                amount,
                total_supply: self.total_supply,
                max_supply: self.max_supply,
            })?;
        self.total_supply = total;
        *balance = balance.saturating_add(amount);
        Ok(())
    }

    /// Debit `amount` from `balance`, shrinking the supply.
    pub fn burn(&mut self, balance: &mut u128, amount: u128) -> Result<(), LedgerError> {
        if *balance < amount {
            return Err(LedgerError::InsufficientBalance {
                balance: *balance,
                amount,
            });
        }
        *balance -= amount;
        self.total_supply = self.total_supply.saturating_sub(amount);
        Ok(())
    }

    /// Move `amount` between two balances. Supply is unchanged.
    pub fn transfer(from: &mut u128, to: &mut u128, amount: u128) -> Result<(), LedgerError> {
        if *from < amount {
            return Err(LedgerError::InsufficientBalance {
                balance: *from,
                amount,
            });
        }
        *from -= amount;
        *to = to.saturating_add(amount);
        Ok(())
    }

    /// Debit `amount` from `balance` into the fee pool.
    pub fn collect_fee(&mut self, balance: &mut u128, amount: u128) -> Result<(), LedgerError> {
        if *balance < amount {
            return Err(LedgerError::InsufficientBalance {
                balance: *balance,
                amount,
            });
        }
        *balance -= amount;
        self.fee_pool = self.fee_pool.saturating_add(amount);
        Ok(())
    }

    /// Drain the fee pool into `balance`, returning the amount moved.
    pub fn withdraw_fees(&mut self, balance: &mut u128) -> u128 {
        let amount = self.fee_pool;
        self.fee_pool = 0;
        *balance = balance.saturating_add(amount);
        amount
    }

    /// Whether a mint of `amount` would fit under the ceiling.
    pub fn can_mint(&self, amount: u128) -> bool {
        self.total_supply
            .checked_add(amount)
            .is_some_and(|total| total <= self.max_supply)
    }
}

impl Write for LedgerState {
    fn write(&self, writer: &mut impl BufMut) {
        self.total_supply.write(writer);
        self.max_supply.write(writer);
        self.fee_pool.write(writer);
    }
}

impl Read for LedgerState {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let state = Self {
            total_supply: u128::read(reader)?,
            max_supply: u128::read(reader)?,
            fee_pool: u128::read(reader)?,
        };
        if state.total_supply > state.max_supply {
            return Err(Error::Invalid("LedgerState", "supply above ceiling"));
        }
        Ok(state)
    }
}

impl EncodeSize for LedgerState {
    fn encode_size(&self) -> usize {
        self.total_supply.encode_size()
            + self.max_supply.encode_size()
            + self.fee_pool.encode_size()
    }
}
