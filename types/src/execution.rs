use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, ReadRangeExt, Write};
use commonware_cryptography::ed25519::{self, PublicKey};
use commonware_cryptography::{Signer, Verifier};
use commonware_utils::union;

use crate::economy::{
    EconomyState, GameMode, Leaderboard, LeaderboardEntry, LedgerState, Player,
    VerificationLevel, MAX_LEADERBOARD_SIZE,
};

pub const NAMESPACE: &[u8] = b"_REFLEX";
pub const TRANSACTION_SUFFIX: &[u8] = b"_TX";
pub const PERMIT_SUFFIX: &[u8] = b"_PERMIT";

/// Maximum length of an error event message.
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 256;

#[inline]
pub fn transaction_namespace(namespace: &[u8]) -> Vec<u8> {
    union(namespace, TRANSACTION_SUFFIX)
}

#[inline]
pub fn permit_namespace(namespace: &[u8]) -> Vec<u8> {
    union(namespace, PERMIT_SUFFIX)
}

/// The two predecessor ledgers whose balances migrate here exactly once.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LegacySource {
    V1 = 0,
    V2 = 1,
}

impl TryFrom<u8> for LegacySource {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::V1),
            1 => Ok(Self::V2),
            _ => Err(()),
        }
    }
}

impl Write for LegacySource {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for LegacySource {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = u8::read(reader)?;
        LegacySource::try_from(value).map_err(|_| Error::InvalidEnum(value))
    }
}

impl EncodeSize for LegacySource {
    fn encode_size(&self) -> usize {
        u8::SIZE
    }
}

/// A player-signed authorization for a relay to submit one score on the
/// player's behalf. Bound to a session, a nonce (consumed forever on use),
/// and a deadline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScorePermit {
    pub player: PublicKey,
    pub score: u64,
    pub round: u32,
    pub mode: GameMode,
    pub session_id: u64,
    pub nonce: u64,
    pub deadline: u64,
}

impl ScorePermit {
    fn payload(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        self.player.write(&mut payload);
        self.score.write(&mut payload);
        self.round.write(&mut payload);
        self.mode.write(&mut payload);
        self.session_id.write(&mut payload);
        self.nonce.write(&mut payload);
        self.deadline.write(&mut payload);
        payload
    }

    /// Sign the permit payload with the player's key.
    pub fn sign(&self, private: &ed25519::PrivateKey) -> ed25519::Signature {
        private.sign(&permit_namespace(NAMESPACE), &self.payload())
    }

    /// Verify `signature` against the permit's own player key.
    pub fn verify(&self, signature: &ed25519::Signature) -> bool {
        self.player
            .verify(&permit_namespace(NAMESPACE), &self.payload(), signature)
    }
}

impl Write for ScorePermit {
    fn write(&self, writer: &mut impl BufMut) {
        self.player.write(writer);
        self.score.write(writer);
        self.round.write(writer);
        self.mode.write(writer);
        self.session_id.write(writer);
        self.nonce.write(writer);
        self.deadline.write(writer);
    }
}

impl Read for ScorePermit {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            player: PublicKey::read(reader)?,
            score: u64::read(reader)?,
            round: u32::read(reader)?,
            mode: GameMode::read(reader)?,
            session_id: u64::read(reader)?,
            nonce: u64::read(reader)?,
            deadline: u64::read(reader)?,
        })
    }
}

impl EncodeSize for ScorePermit {
    fn encode_size(&self) -> usize {
        self.player.encode_size()
            + self.score.encode_size()
            + self.round.encode_size()
            + self.mode.encode_size()
            + self.session_id.encode_size()
            + self.nonce.encode_size()
            + self.deadline.encode_size()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub nonce: u64,
    pub instruction: Instruction,

    pub public: ed25519::PublicKey,
    pub signature: ed25519::Signature,
}

impl Transaction {
    fn payload(nonce: &u64, instruction: &Instruction) -> Vec<u8> {
        let mut payload = Vec::new();
        nonce.write(&mut payload);
        instruction.write(&mut payload);

        payload
    }

    pub fn sign(private: &ed25519::PrivateKey, nonce: u64, instruction: Instruction) -> Self {
        let signature = private.sign(
            &transaction_namespace(NAMESPACE),
            &Self::payload(&nonce, &instruction),
        );

        Self {
            nonce,
            instruction,
            public: private.public_key(),
            signature,
        }
    }

    pub fn verify(&self) -> bool {
        self.public.verify(
            &transaction_namespace(NAMESPACE),
            &Self::payload(&self.nonce, &self.instruction),
            &self.signature,
        )
    }
}

impl Write for Transaction {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
        self.instruction.write(writer);
        self.public.write(writer);
        self.signature.write(writer);
    }
}

impl Read for Transaction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            nonce: u64::read(reader)?,
            instruction: Instruction::read(reader)?,
            public: ed25519::PublicKey::read(reader)?,
            signature: ed25519::Signature::read(reader)?,
        })
    }
}

impl EncodeSize for Transaction {
    fn encode_size(&self) -> usize {
        self.nonce.encode_size()
            + self.instruction.encode_size()
            + self.public.encode_size()
            + self.signature.encode_size()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)]
pub enum Instruction {
    // Player instructions (tags 10-16)
    /// Start a play session, consuming one turn.
    /// Binary: [10]
    StartGame,

    /// Submit a score for the caller's active session.
    /// Binary: [11] [score:u64 BE] [round:u32 BE] [mode:u8]
    SubmitScore {
        score: u64,
        round: u32,
        mode: GameMode,
    },

    /// Submit a score for another player under a signed permit. Sender must
    /// be an authorized submitter.
    /// Binary: [12] [permit...] [signature:64]
    SubmitScoreWithPermit {
        permit: ScorePermit,
        signature: ed25519::Signature,
    },

    /// Buy a batch of extra goes at the configured turn cost.
    /// Binary: [13]
    PurchaseTurns,

    /// Buy seven days of unlimited play.
    /// Binary: [14]
    PurchaseWeeklyPass,

    /// Claim the daily login bonus.
    /// Binary: [15]
    ClaimDailyReward,

    /// Pull both predecessor-ledger balances into this ledger, exactly once.
    /// Binary: [16]
    MigrateTokens,

    // Privileged instructions (tags 20-27)
    /// Assert a player's trust tier (verification service or owner).
    /// Binary: [20] [player:32] [level:u8] [verified:u8]
    SetVerification {
        player: PublicKey,
        level: VerificationLevel,
        verified: bool,
    },

    /// Grant or revoke relay submission rights (owner only).
    /// Binary: [21] [submitter:32] [authorized:u8]
    SetAuthorizedSubmitter {
        submitter: PublicKey,
        authorized: bool,
    },

    /// Update pricing within the allowed bounds (owner only).
    /// Binary: [22] [tokensPerPoint:u128 BE] [turnCost:u128 BE] [passCost:u128 BE]
    UpdatePricing {
        tokens_per_point: u128,
        turn_cost: u128,
        weekly_pass_cost: u128,
    },

    /// Update the tier multiplier table; must stay monotone (owner only).
    /// Binary: [23] [orbPlus:u16 BE] [orb:u16 BE] [secureDocument:u16 BE] [document:u16 BE]
    UpdateMultipliers {
        orb_plus: u16,
        orb: u16,
        secure_document: u16,
        document: u16,
    },

    /// Pause or resume all player-facing operations (owner only).
    /// Binary: [24] [paused:u8]
    SetPaused { paused: bool },

    /// Replace a mode's leaderboard wholesale (owner only).
    /// Binary: [25] [mode:u8] [count:u32 BE] [entries...]
    SeedLeaderboard {
        mode: GameMode,
        entries: Vec<LeaderboardEntry>,
    },

    /// Drain the fee pool into the owner's balance (owner only).
    /// Binary: [26]
    WithdrawFees,

    /// Ingest a predecessor-ledger balance snapshot (owner only).
    /// Binary: [27] [source:u8] [player:32] [amount:u128 BE]
    SeedLegacyBalance {
        source: LegacySource,
        player: PublicKey,
        amount: u128,
    },
}

impl Write for Instruction {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            // Player instructions (tags 10-16)
            Self::StartGame => 10u8.write(writer),
            Self::SubmitScore { score, round, mode } => {
                11u8.write(writer);
                score.write(writer);
                round.write(writer);
                mode.write(writer);
            }
            Self::SubmitScoreWithPermit { permit, signature } => {
                12u8.write(writer);
                permit.write(writer);
                signature.write(writer);
            }
            Self::PurchaseTurns => 13u8.write(writer),
            Self::PurchaseWeeklyPass => 14u8.write(writer),
            Self::ClaimDailyReward => 15u8.write(writer),
            Self::MigrateTokens => 16u8.write(writer),

            // Privileged instructions (tags 20-27)
            Self::SetVerification {
                player,
                level,
                verified,
            } => {
                20u8.write(writer);
                player.write(writer);
                level.write(writer);
                verified.write(writer);
            }
            Self::SetAuthorizedSubmitter {
                submitter,
                authorized,
            } => {
                21u8.write(writer);
                submitter.write(writer);
                authorized.write(writer);
            }
            Self::UpdatePricing {
                tokens_per_point,
                turn_cost,
                weekly_pass_cost,
            } => {
                22u8.write(writer);
                tokens_per_point.write(writer);
                turn_cost.write(writer);
                weekly_pass_cost.write(writer);
            }
            Self::UpdateMultipliers {
                orb_plus,
                orb,
                secure_document,
                document,
            } => {
                23u8.write(writer);
                orb_plus.write(writer);
                orb.write(writer);
                secure_document.write(writer);
                document.write(writer);
            }
            Self::SetPaused { paused } => {
                24u8.write(writer);
                paused.write(writer);
            }
            Self::SeedLeaderboard { mode, entries } => {
                25u8.write(writer);
                mode.write(writer);
                entries.write(writer);
            }
            Self::WithdrawFees => 26u8.write(writer),
            Self::SeedLegacyBalance {
                source,
                player,
                amount,
            } => {
                27u8.write(writer);
                source.write(writer);
                player.write(writer);
                amount.write(writer);
            }
        }
    }
}

impl Read for Instruction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let instruction = match reader.get_u8() {
            // Player instructions (tags 10-16)
            10 => Self::StartGame,
            11 => Self::SubmitScore {
                score: u64::read(reader)?,
                round: u32::read(reader)?,
                mode: GameMode::read(reader)?,
            },
            12 => Self::SubmitScoreWithPermit {
                permit: ScorePermit::read(reader)?,
                signature: ed25519::Signature::read(reader)?,
            },
            13 => Self::PurchaseTurns,
            14 => Self::PurchaseWeeklyPass,
            15 => Self::ClaimDailyReward,
            16 => Self::MigrateTokens,

            // Privileged instructions (tags 20-27)
            20 => Self::SetVerification {
                player: PublicKey::read(reader)?,
                level: VerificationLevel::read(reader)?,
                verified: bool::read(reader)?,
            },
            21 => Self::SetAuthorizedSubmitter {
                submitter: PublicKey::read(reader)?,
                authorized: bool::read(reader)?,
            },
            22 => Self::UpdatePricing {
                tokens_per_point: u128::read(reader)?,
                turn_cost: u128::read(reader)?,
                weekly_pass_cost: u128::read(reader)?,
            },
            23 => Self::UpdateMultipliers {
                orb_plus: u16::read(reader)?,
                orb: u16::read(reader)?,
                secure_document: u16::read(reader)?,
                document: u16::read(reader)?,
            },
            24 => Self::SetPaused {
                paused: bool::read(reader)?,
            },
            25 => Self::SeedLeaderboard {
                mode: GameMode::read(reader)?,
                entries: Vec::<LeaderboardEntry>::read_range(
                    reader,
                    0..=MAX_LEADERBOARD_SIZE,
                )?,
            },
            26 => Self::WithdrawFees,
            27 => Self::SeedLegacyBalance {
                source: LegacySource::read(reader)?,
                player: PublicKey::read(reader)?,
                amount: u128::read(reader)?,
            },

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(instruction)
    }
}

impl EncodeSize for Instruction {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::StartGame
                | Self::PurchaseTurns
                | Self::PurchaseWeeklyPass
                | Self::ClaimDailyReward
                | Self::MigrateTokens
                | Self::WithdrawFees => 0,
                Self::SubmitScore { score, round, mode } => {
                    score.encode_size() + round.encode_size() + mode.encode_size()
                }
                Self::SubmitScoreWithPermit { permit, signature } => {
                    permit.encode_size() + signature.encode_size()
                }
                Self::SetVerification {
                    player,
                    level,
                    verified,
                } => player.encode_size() + level.encode_size() + verified.encode_size(),
                Self::SetAuthorizedSubmitter {
                    submitter,
                    authorized,
                } => submitter.encode_size() + authorized.encode_size(),
                Self::UpdatePricing {
                    tokens_per_point,
                    turn_cost,
                    weekly_pass_cost,
                } => {
                    tokens_per_point.encode_size()
                        + turn_cost.encode_size()
                        + weekly_pass_cost.encode_size()
                }
                Self::UpdateMultipliers {
                    orb_plus,
                    orb,
                    secure_document,
                    document,
                } => {
                    orb_plus.encode_size()
                        + orb.encode_size()
                        + secure_document.encode_size()
                        + document.encode_size()
                }
                Self::SetPaused { paused } => paused.encode_size(),
                Self::SeedLeaderboard { mode, entries } => {
                    mode.encode_size() + entries.encode_size()
                }
                Self::SeedLegacyBalance {
                    source,
                    player,
                    amount,
                } => source.encode_size() + player.encode_size() + amount.encode_size(),
            }
    }
}

/// Minimal account structure for transaction nonce tracking.
/// Used for replay protection across all transaction types.
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct Account {
    pub nonce: u64,
}

impl Write for Account {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
    }
}

impl Read for Account {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            nonce: u64::read(reader)?,
        })
    }
}

impl EncodeSize for Account {
    fn encode_size(&self) -> usize {
        self.nonce.encode_size()
    }
}

#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Clone, Debug)]
pub enum Key {
    /// Account for nonce tracking (tag 0)
    Account(PublicKey),

    // Economy keys (tags 10-15)
    Player(PublicKey),
    Economy,
    Ledger,
    Leaderboard(GameMode),
    LegacyBalance(LegacySource, PublicKey),
    /// Consumed permit nonce marker; written once, never deleted.
    PermitNonce(PublicKey, u64),
}

impl Write for Key {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(pk) => {
                0u8.write(writer);
                pk.write(writer);
            }

            Self::Player(pk) => {
                10u8.write(writer);
                pk.write(writer);
            }
            Self::Economy => 11u8.write(writer),
            Self::Ledger => 12u8.write(writer),
            Self::Leaderboard(mode) => {
                13u8.write(writer);
                mode.write(writer);
            }
            Self::LegacyBalance(source, pk) => {
                14u8.write(writer);
                source.write(writer);
                pk.write(writer);
            }
            Self::PermitNonce(pk, nonce) => {
                15u8.write(writer);
                pk.write(writer);
                nonce.write(writer);
            }
        }
    }
}

impl Read for Key {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let key = match reader.get_u8() {
            0 => Self::Account(PublicKey::read(reader)?),

            10 => Self::Player(PublicKey::read(reader)?),
            11 => Self::Economy,
            12 => Self::Ledger,
            13 => Self::Leaderboard(GameMode::read(reader)?),
            14 => Self::LegacyBalance(LegacySource::read(reader)?, PublicKey::read(reader)?),
            15 => Self::PermitNonce(PublicKey::read(reader)?, u64::read(reader)?),

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(key)
    }
}

impl EncodeSize for Key {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Account(_) => PublicKey::SIZE,

                Self::Player(_) => PublicKey::SIZE,
                Self::Economy => 0,
                Self::Ledger => 0,
                Self::Leaderboard(_) => u8::SIZE,
                Self::LegacyBalance(_, _) => u8::SIZE + PublicKey::SIZE,
                Self::PermitNonce(_, _) => PublicKey::SIZE + u64::SIZE,
            }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
#[allow(clippy::large_enum_variant)]
pub enum Value {
    /// Account for nonce tracking (tag 0)
    Account(Account),

    // Economy values (tags 10-15)
    Player(Player),
    Economy(EconomyState),
    Ledger(LedgerState),
    Leaderboard(Leaderboard),
    LegacyBalance(u128),
    PermitUsed,
}

impl Write for Value {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(account) => {
                0u8.write(writer);
                account.write(writer);
            }

            Self::Player(player) => {
                10u8.write(writer);
                player.write(writer);
            }
            Self::Economy(economy) => {
                11u8.write(writer);
                economy.write(writer);
            }
            Self::Ledger(ledger) => {
                12u8.write(writer);
                ledger.write(writer);
            }
            Self::Leaderboard(board) => {
                13u8.write(writer);
                board.write(writer);
            }
            Self::LegacyBalance(amount) => {
                14u8.write(writer);
                amount.write(writer);
            }
            Self::PermitUsed => 15u8.write(writer),
        }
    }
}

impl Read for Value {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = match reader.get_u8() {
            0 => Self::Account(Account::read(reader)?),

            10 => Self::Player(Player::read(reader)?),
            11 => Self::Economy(EconomyState::read(reader)?),
            12 => Self::Ledger(LedgerState::read(reader)?),
            13 => Self::Leaderboard(Leaderboard::read(reader)?),
            14 => Self::LegacyBalance(u128::read(reader)?),
            15 => Self::PermitUsed,

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(value)
    }
}

impl EncodeSize for Value {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Account(account) => account.encode_size(),

                Self::Player(player) => player.encode_size(),
                Self::Economy(economy) => economy.encode_size(),
                Self::Ledger(ledger) => ledger.encode_size(),
                Self::Leaderboard(board) => board.encode_size(),
                Self::LegacyBalance(amount) => amount.encode_size(),
                Self::PermitUsed => 0,
            }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)]
pub enum Event {
    // Session events (tags 30-33)
    GameStarted {
        player: PublicKey,
        game_id: u64,
        /// True while a weekly pass bypasses metering.
        unlimited: bool,
        turns_remaining: u64,
    },
    ScoreSubmitted {
        player: PublicKey,
        mode: GameMode,
        score: u64,
        round: u32,
        game_id: u64,
        reward: u128,
        new_balance: u128,
    },
    LeaderboardUpdated {
        mode: GameMode,
        player: PublicKey,
        /// 1-based position after the update.
        rank: u32,
        score: u64,
    },
    HighScoreUpdated {
        player: PublicKey,
        mode: GameMode,
        score: u64,
    },

    // Purchase/claim events (tags 34-36)
    TurnsPurchased {
        player: PublicKey,
        batch: u32,
        cost: u128,
        extra_goes: u32,
    },
    WeeklyPassPurchased {
        player: PublicKey,
        cost: u128,
        expiry: u64,
    },
    DailyRewardClaimed {
        player: PublicKey,
        reward: u128,
        streak: u32,
    },

    // Migration event (tag 37)
    TokensMigrated {
        player: PublicKey,
        from_v1: u128,
        from_v2: u128,
        total: u128,
    },

    // Administrative events (tags 38-45)
    VerificationUpdated {
        player: PublicKey,
        level: VerificationLevel,
        verified: bool,
    },
    SubmitterAuthorized {
        submitter: PublicKey,
        authorized: bool,
    },
    PricingUpdated {
        tokens_per_point: u128,
        turn_cost: u128,
        weekly_pass_cost: u128,
    },
    MultipliersUpdated {
        orb_plus: u16,
        orb: u16,
        secure_document: u16,
        document: u16,
    },
    PausedSet {
        paused: bool,
    },
    LeaderboardSeeded {
        mode: GameMode,
        count: u32,
    },
    FeesWithdrawn {
        to: PublicKey,
        amount: u128,
    },
    LegacyBalanceSeeded {
        source: LegacySource,
        player: PublicKey,
        amount: u128,
    },

    // Error event (tag 49)
    EconomyError {
        player: PublicKey,
        code: u8,
        message: String,
    },
}

impl Write for Event {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::GameStarted {
                player,
                game_id,
                unlimited,
                turns_remaining,
            } => {
                30u8.write(writer);
                player.write(writer);
                game_id.write(writer);
                unlimited.write(writer);
                turns_remaining.write(writer);
            }
            Self::ScoreSubmitted {
                player,
                mode,
                score,
                round,
                game_id,
                reward,
                new_balance,
            } => {
                31u8.write(writer);
                player.write(writer);
                mode.write(writer);
                score.write(writer);
                round.write(writer);
                game_id.write(writer);
                reward.write(writer);
                new_balance.write(writer);
            }
            Self::LeaderboardUpdated {
                mode,
                player,
                rank,
                score,
            } => {
                32u8.write(writer);
                mode.write(writer);
                player.write(writer);
                rank.write(writer);
                score.write(writer);
            }
            Self::HighScoreUpdated {
                player,
                mode,
                score,
            } => {
                33u8.write(writer);
                player.write(writer);
                mode.write(writer);
                score.write(writer);
            }
            Self::TurnsPurchased {
                player,
                batch,
                cost,
                extra_goes,
            } => {
                34u8.write(writer);
                player.write(writer);
                batch.write(writer);
                cost.write(writer);
                extra_goes.write(writer);
            }
            Self::WeeklyPassPurchased {
                player,
                cost,
                expiry,
            } => {
                35u8.write(writer);
                player.write(writer);
                cost.write(writer);
                expiry.write(writer);
            }
            Self::DailyRewardClaimed {
                player,
                reward,
                streak,
            } => {
                36u8.write(writer);
                player.write(writer);
                reward.write(writer);
                streak.write(writer);
            }
            Self::TokensMigrated {
                player,
                from_v1,
                from_v2,
                total,
            } => {
                37u8.write(writer);
                player.write(writer);
                from_v1.write(writer);
                from_v2.write(writer);
                total.write(writer);
            }
            Self::VerificationUpdated {
                player,
                level,
                verified,
            } => {
                38u8.write(writer);
                player.write(writer);
                level.write(writer);
                verified.write(writer);
            }
            Self::SubmitterAuthorized {
                submitter,
                authorized,
            } => {
                39u8.write(writer);
                submitter.write(writer);
                authorized.write(writer);
            }
            Self::PricingUpdated {
                tokens_per_point,
                turn_cost,
                weekly_pass_cost,
            } => {
                40u8.write(writer);
                tokens_per_point.write(writer);
                turn_cost.write(writer);
                weekly_pass_cost.write(writer);
            }
            Self::MultipliersUpdated {
                orb_plus,
                orb,
                secure_document,
                document,
            } => {
                41u8.write(writer);
                orb_plus.write(writer);
                orb.write(writer);
                secure_document.write(writer);
                document.write(writer);
            }
            Self::PausedSet { paused } => {
                42u8.write(writer);
                paused.write(writer);
            }
            Self::LeaderboardSeeded { mode, count } => {
                43u8.write(writer);
                mode.write(writer);
                count.write(writer);
            }
            Self::FeesWithdrawn { to, amount } => {
                44u8.write(writer);
                to.write(writer);
                amount.write(writer);
            }
            Self::LegacyBalanceSeeded {
                source,
                player,
                amount,
            } => {
                45u8.write(writer);
                source.write(writer);
                player.write(writer);
                amount.write(writer);
            }
            Self::EconomyError {
                player,
                code,
                message,
            } => {
                49u8.write(writer);
                player.write(writer);
                code.write(writer);
                crate::economy::write_string(message, writer);
            }
        }
    }
}

impl Read for Event {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let event = match reader.get_u8() {
            30 => Self::GameStarted {
                player: PublicKey::read(reader)?,
                game_id: u64::read(reader)?,
                unlimited: bool::read(reader)?,
                turns_remaining: u64::read(reader)?,
            },
            31 => Self::ScoreSubmitted {
                player: PublicKey::read(reader)?,
                mode: GameMode::read(reader)?,
                score: u64::read(reader)?,
                round: u32::read(reader)?,
                game_id: u64::read(reader)?,
                reward: u128::read(reader)?,
                new_balance: u128::read(reader)?,
            },
            32 => Self::LeaderboardUpdated {
                mode: GameMode::read(reader)?,
                player: PublicKey::read(reader)?,
                rank: u32::read(reader)?,
                score: u64::read(reader)?,
            },
            33 => Self::HighScoreUpdated {
                player: PublicKey::read(reader)?,
                mode: GameMode::read(reader)?,
                score: u64::read(reader)?,
            },
            34 => Self::TurnsPurchased {
                player: PublicKey::read(reader)?,
                batch: u32::read(reader)?,
                cost: u128::read(reader)?,
                extra_goes: u32::read(reader)?,
            },
            35 => Self::WeeklyPassPurchased {
                player: PublicKey::read(reader)?,
                cost: u128::read(reader)?,
                expiry: u64::read(reader)?,
            },
            36 => Self::DailyRewardClaimed {
                player: PublicKey::read(reader)?,
                reward: u128::read(reader)?,
                streak: u32::read(reader)?,
            },
            37 => Self::TokensMigrated {
                player: PublicKey::read(reader)?,
                from_v1: u128::read(reader)?,
                from_v2: u128::read(reader)?,
                total: u128::read(reader)?,
            },
            38 => Self::VerificationUpdated {
                player: PublicKey::read(reader)?,
                level: VerificationLevel::read(reader)?,
                verified: bool::read(reader)?,
            },
            39 => Self::SubmitterAuthorized {
                submitter: PublicKey::read(reader)?,
                authorized: bool::read(reader)?,
            },
            40 => Self::PricingUpdated {
                tokens_per_point: u128::read(reader)?,
                turn_cost: u128::read(reader)?,
                weekly_pass_cost: u128::read(reader)?,
            },
            41 => Self::MultipliersUpdated {
                orb_plus: u16::read(reader)?,
                orb: u16::read(reader)?,
                secure_document: u16::read(reader)?,
                document: u16::read(reader)?,
            },
            42 => Self::PausedSet {
                paused: bool::read(reader)?,
            },
            43 => Self::LeaderboardSeeded {
                mode: GameMode::read(reader)?,
                count: u32::read(reader)?,
            },
            44 => Self::FeesWithdrawn {
                to: PublicKey::read(reader)?,
                amount: u128::read(reader)?,
            },
            45 => Self::LegacyBalanceSeeded {
                source: LegacySource::read(reader)?,
                player: PublicKey::read(reader)?,
                amount: u128::read(reader)?,
            },
            49 => Self::EconomyError {
                player: PublicKey::read(reader)?,
                code: u8::read(reader)?,
                message: crate::economy::read_string(reader, MAX_ERROR_MESSAGE_LENGTH)?,
            },

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(event)
    }
}

impl EncodeSize for Event {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::GameStarted {
                    player,
                    game_id,
                    unlimited,
                    turns_remaining,
                } => {
                    player.encode_size()
                        + game_id.encode_size()
                        + unlimited.encode_size()
                        + turns_remaining.encode_size()
                }
                Self::ScoreSubmitted {
                    player,
                    mode,
                    score,
                    round,
                    game_id,
                    reward,
                    new_balance,
                } => {
                    player.encode_size()
                        + mode.encode_size()
                        + score.encode_size()
                        + round.encode_size()
                        + game_id.encode_size()
                        + reward.encode_size()
                        + new_balance.encode_size()
                }
                Self::LeaderboardUpdated {
                    mode,
                    player,
                    rank,
                    score,
                } => {
                    mode.encode_size()
                        + player.encode_size()
                        + rank.encode_size()
                        + score.encode_size()
                }
                Self::HighScoreUpdated {
                    player,
                    mode,
                    score,
                } => player.encode_size() + mode.encode_size() + score.encode_size(),
                Self::TurnsPurchased {
                    player,
                    batch,
                    cost,
                    extra_goes,
                } => {
                    player.encode_size()
                        + batch.encode_size()
                        + cost.encode_size()
                        + extra_goes.encode_size()
                }
                Self::WeeklyPassPurchased {
                    player,
                    cost,
                    expiry,
                } => player.encode_size() + cost.encode_size() + expiry.encode_size(),
                Self::DailyRewardClaimed {
                    player,
                    reward,
                    streak,
                } => player.encode_size() + reward.encode_size() + streak.encode_size(),
                Self::TokensMigrated {
                    player,
                    from_v1,
                    from_v2,
                    total,
                } => {
                    player.encode_size()
                        + from_v1.encode_size()
                        + from_v2.encode_size()
                        + total.encode_size()
                }
                Self::VerificationUpdated {
                    player,
                    level,
                    verified,
                } => player.encode_size() + level.encode_size() + verified.encode_size(),
                Self::SubmitterAuthorized {
                    submitter,
                    authorized,
                } => submitter.encode_size() + authorized.encode_size(),
                Self::PricingUpdated {
                    tokens_per_point,
                    turn_cost,
                    weekly_pass_cost,
                } => {
                    tokens_per_point.encode_size()
                        + turn_cost.encode_size()
                        + weekly_pass_cost.encode_size()
                }
                Self::MultipliersUpdated {
                    orb_plus,
                    orb,
                    secure_document,
                    document,
                } => {
                    orb_plus.encode_size()
                        + orb.encode_size()
                        + secure_document.encode_size()
                        + document.encode_size()
                }
                Self::PausedSet { paused } => paused.encode_size(),
                Self::LeaderboardSeeded { mode, count } => {
                    mode.encode_size() + count.encode_size()
                }
                Self::FeesWithdrawn { to, amount } => to.encode_size() + amount.encode_size(),
                Self::LegacyBalanceSeeded {
                    source,
                    player,
                    amount,
                } => source.encode_size() + player.encode_size() + amount.encode_size(),
                Self::EconomyError {
                    player,
                    code,
                    message,
                } => {
                    player.encode_size()
                        + code.encode_size()
                        + crate::economy::string_encode_size(message)
                }
            }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Event(Event),
    Transaction(Transaction),
}

impl Write for Output {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Event(event) => {
                0u8.write(writer);
                event.write(writer);
            }
            Self::Transaction(transaction) => {
                1u8.write(writer);
                transaction.write(writer);
            }
        }
    }
}

impl Read for Output {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(Self::Event(Event::read(reader)?)),
            1 => Ok(Self::Transaction(Transaction::read(reader)?)),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for Output {
    fn encode_size(&self) -> usize {
        1 + match self {
            Self::Event(event) => event.encode_size(),
            Self::Transaction(transaction) => transaction.encode_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use commonware_codec::DecodeExt as _;
    use commonware_cryptography::ed25519::PrivateKey;

    fn permit(player: &PrivateKey) -> ScorePermit {
        ScorePermit {
            player: player.public_key(),
            score: 150,
            round: 3,
            mode: GameMode::Blitz,
            session_id: 7,
            nonce: 1,
            deadline: 2_000,
        }
    }

    #[test]
    fn transaction_signature_covers_nonce_and_instruction() {
        let signer = PrivateKey::from_seed(1);
        let tx = Transaction::sign(
            &signer,
            5,
            Instruction::SubmitScore {
                score: 100,
                round: 1,
                mode: GameMode::Classic,
            },
        );
        assert!(tx.verify());

        let mut tampered = tx.clone();
        tampered.nonce = 6;
        assert!(!tampered.verify());

        let mut forged = tx.clone();
        forged.public = PrivateKey::from_seed(2).public_key();
        assert!(!forged.verify());
    }

    #[test]
    fn transaction_roundtrips_through_codec() {
        let signer = PrivateKey::from_seed(3);
        let instructions = [
            Instruction::StartGame,
            Instruction::SubmitScore {
                score: 42,
                round: 2,
                mode: GameMode::Marathon,
            },
            Instruction::PurchaseTurns,
            Instruction::PurchaseWeeklyPass,
            Instruction::ClaimDailyReward,
            Instruction::MigrateTokens,
            Instruction::SetVerification {
                player: signer.public_key(),
                level: VerificationLevel::Orb,
                verified: true,
            },
            Instruction::SetAuthorizedSubmitter {
                submitter: signer.public_key(),
                authorized: true,
            },
            Instruction::UpdatePricing {
                tokens_per_point: 1,
                turn_cost: 2,
                weekly_pass_cost: 3,
            },
            Instruction::UpdateMultipliers {
                orb_plus: 150,
                orb: 125,
                secure_document: 110,
                document: 100,
            },
            Instruction::SetPaused { paused: true },
            Instruction::SeedLeaderboard {
                mode: GameMode::Classic,
                entries: vec![],
            },
            Instruction::WithdrawFees,
            Instruction::SeedLegacyBalance {
                source: LegacySource::V2,
                player: signer.public_key(),
                amount: 1_000,
            },
        ];

        for (nonce, instruction) in instructions.into_iter().enumerate() {
            let tx = Transaction::sign(&signer, nonce as u64, instruction);
            let mut bytes = BytesMut::new();
            tx.write(&mut bytes);
            assert_eq!(bytes.len(), tx.encode_size());
            let decoded = Transaction::decode(bytes.as_ref()).unwrap();
            assert_eq!(decoded, tx);
            assert!(decoded.verify());
        }
    }

    #[test]
    fn unknown_instruction_tag_rejected() {
        assert!(Instruction::decode(&[17u8][..]).is_err());
        assert!(Instruction::decode(&[28u8][..]).is_err());
    }

    #[test]
    fn permit_verifies_only_against_its_own_player() {
        let player = PrivateKey::from_seed(10);
        let permit = permit(&player);
        let signature = permit.sign(&player);
        assert!(permit.verify(&signature));

        // Any field change invalidates the signature.
        let mut tampered = permit.clone();
        tampered.score += 1;
        assert!(!tampered.verify(&signature));
        let mut tampered = permit.clone();
        tampered.deadline += 1;
        assert!(!tampered.verify(&signature));

        // A signature from another key does not verify.
        let other = PrivateKey::from_seed(11);
        let forged = permit.sign(&other);
        assert!(!permit.verify(&forged));
    }

    #[test]
    fn permit_and_transaction_namespaces_differ() {
        // A permit signature can never double as a transaction signature.
        assert_ne!(transaction_namespace(NAMESPACE), permit_namespace(NAMESPACE));
    }

    #[test]
    fn keys_and_values_roundtrip_through_codec() {
        let pk = PrivateKey::from_seed(20).public_key();
        let keys = [
            Key::Account(pk.clone()),
            Key::Player(pk.clone()),
            Key::Economy,
            Key::Ledger,
            Key::Leaderboard(GameMode::Blitz),
            Key::LegacyBalance(LegacySource::V1, pk.clone()),
            Key::PermitNonce(pk.clone(), 9),
        ];
        for key in keys {
            let mut bytes = BytesMut::new();
            key.write(&mut bytes);
            assert_eq!(bytes.len(), key.encode_size());
            assert_eq!(Key::decode(bytes.as_ref()).unwrap(), key);
        }

        let values = [
            Value::Account(Account { nonce: 4 }),
            Value::Player(Player::default()),
            Value::Economy(EconomyState::default()),
            Value::Ledger(LedgerState::default()),
            Value::Leaderboard(Leaderboard::new()),
            Value::LegacyBalance(123),
            Value::PermitUsed,
        ];
        for value in values {
            let mut bytes = BytesMut::new();
            value.write(&mut bytes);
            assert_eq!(bytes.len(), value.encode_size());
            assert_eq!(Value::decode(bytes.as_ref()).unwrap(), value);
        }
    }

    #[test]
    fn events_roundtrip_through_codec() {
        let pk = PrivateKey::from_seed(21).public_key();
        let events = [
            Event::GameStarted {
                player: pk.clone(),
                game_id: 1,
                unlimited: false,
                turns_remaining: 2,
            },
            Event::ScoreSubmitted {
                player: pk.clone(),
                mode: GameMode::Classic,
                score: 100,
                round: 1,
                game_id: 1,
                reward: 10,
                new_balance: 10,
            },
            Event::LeaderboardUpdated {
                mode: GameMode::Classic,
                player: pk.clone(),
                rank: 1,
                score: 100,
            },
            Event::TokensMigrated {
                player: pk.clone(),
                from_v1: 5,
                from_v2: 7,
                total: 12,
            },
            Event::EconomyError {
                player: pk.clone(),
                code: 20,
                message: "No turns available".into(),
            },
        ];
        for event in events {
            let mut bytes = BytesMut::new();
            event.write(&mut bytes);
            assert_eq!(bytes.len(), event.encode_size());
            assert_eq!(Event::decode(bytes.as_ref()).unwrap(), event);
        }
    }
}
